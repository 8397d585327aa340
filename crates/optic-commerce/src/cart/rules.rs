//! Cart business rule settings.

use serde::{Deserialize, Serialize};

use crate::cart::{
    DonationRule, FirstTimeDiscount, DEFAULT_CONTACT_LENS_THRESHOLD,
    DEFAULT_FIRST_TIME_DISCOUNT_PERCENT,
};
use crate::ids::MerchandiseId;

/// Settings for the derived cart rules, as read from the `[cart]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartRules {
    /// Merchandise of the donation line. The donation rule is off without one.
    pub donation_merchandise_id: Option<MerchandiseId>,
    pub contact_lens_threshold: i64,
    pub first_time_discount_percent: u32,
}

impl Default for CartRules {
    fn default() -> Self {
        Self {
            donation_merchandise_id: None,
            contact_lens_threshold: DEFAULT_CONTACT_LENS_THRESHOLD,
            first_time_discount_percent: DEFAULT_FIRST_TIME_DISCOUNT_PERCENT,
        }
    }
}

impl CartRules {
    pub fn with_donation(mut self, merchandise_id: MerchandiseId) -> Self {
        self.donation_merchandise_id = Some(merchandise_id);
        self
    }

    pub fn donation_rule(&self) -> Option<DonationRule> {
        self.donation_merchandise_id
            .clone()
            .map(|id| DonationRule::new(id).with_threshold(self.contact_lens_threshold))
    }

    pub fn first_time_discount(&self) -> FirstTimeDiscount {
        FirstTimeDiscount::new(self.first_time_discount_percent)
    }
}
