//! Conditional donation line.
//!
//! A cart qualifies for the donation when it holds any eyeglasses line or at
//! least `contact_lens_threshold` boxes of contact lenses. The rule only ever
//! removes the donation line; adding it is left to the caller.

use serde::Serialize;

use crate::attributes::FocalProductType;
use crate::cart::{Cart, CartLine};
use crate::ids::{LineId, MerchandiseId};

pub const DEFAULT_CONTACT_LENS_THRESHOLD: i64 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonationRule {
    pub merchandise_id: MerchandiseId,
    pub contact_lens_threshold: i64,
}

/// Result of evaluating the rule against a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DonationEvaluation {
    pub qualifying: bool,
    pub eyeglasses_lines: usize,
    pub contact_lens_quantity: i64,
    /// Donation lines currently in the cart.
    pub donation_lines: Vec<LineId>,
}

impl DonationEvaluation {
    /// Lines to remove in a single call; empty when nothing must change.
    pub fn removals(&self) -> &[LineId] {
        if self.qualifying {
            &self.donation_lines[..0]
        } else {
            &self.donation_lines
        }
    }

    /// The cart qualifies but carries no donation line.
    pub fn should_offer_donation(&self) -> bool {
        self.qualifying && self.donation_lines.is_empty()
    }
}

impl DonationRule {
    pub fn new(merchandise_id: MerchandiseId) -> Self {
        Self {
            merchandise_id,
            contact_lens_threshold: DEFAULT_CONTACT_LENS_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: i64) -> Self {
        self.contact_lens_threshold = threshold;
        self
    }

    pub fn is_donation(&self, line: &CartLine) -> bool {
        line.merchandise_id == self.merchandise_id
    }

    /// Classify every non-donation line and decide whether the cart qualifies.
    pub fn evaluate(&self, cart: &Cart) -> DonationEvaluation {
        let mut eyeglasses_lines = 0;
        let mut contact_lens_quantity = 0;
        let mut donation_lines = Vec::new();

        for line in &cart.lines {
            if self.is_donation(line) {
                donation_lines.push(line.id.clone());
                continue;
            }
            match line.focal_product_type() {
                Some(FocalProductType::Eyeglasses) => eyeglasses_lines += 1,
                Some(FocalProductType::ContactLenses) => contact_lens_quantity += line.quantity,
                None => {}
            }
        }

        DonationEvaluation {
            qualifying: eyeglasses_lines > 0 || contact_lens_quantity >= self.contact_lens_threshold,
            eyeglasses_lines,
            contact_lens_quantity,
            donation_lines,
        }
    }
}
