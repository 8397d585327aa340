//! Remote cart engine.
//!
//! Snapshot types, the backend port, the derived donation and discount rules,
//! and [`CartService`], which ties them together.

mod backend;
mod discount;
mod donation;
mod memory;
mod model;
mod persist;
mod rules;
mod service;

pub use backend::{
    normalize, BuyerIdentityInput, CommerceBackend, MutationOutcome, UserError, GENERIC_CART_ERROR,
};
pub use discount::{DisplayTotals, FirstTimeDiscount, DEFAULT_FIRST_TIME_DISCOUNT_PERCENT};
pub use donation::{DonationEvaluation, DonationRule, DEFAULT_CONTACT_LENS_THRESHOLD};
pub use memory::{BackendCall, MemoryBackend};
pub use model::{
    BuyerIdentity, Cart, CartCost, CartLine, LineItemRequest, LineUpdate, MAX_LINE_QUANTITY,
};
#[cfg(feature = "storage")]
pub use persist::CacheCartIdStore;
pub use persist::{CartIdStore, MemoryCartIdStore};
pub use rules::CartRules;
pub use service::CartService;
