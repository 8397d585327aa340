//! Eyewear commerce domain for Optic.
//!
//! - **Options**: the lens option tree and the configurator that walks and prices it
//! - **Prescription**: eyeglasses and contact lens wizards, uploads, stored prescriptions
//! - **Attributes**: the cart line attribute contract
//! - **Cart**: the remote cart engine and its derived rules
//!
//! # Example
//!
//! ```rust,ignore
//! use optic_commerce::prelude::*;
//!
//! let engine = ConfiguratorEngine::new(
//!     Arc::new(OptionTree::eyeglasses()?),
//!     Money::from_major(95, Currency::USD),
//! );
//! let path: ConfigurationPath = ["single-vision", "standard", "classic", "classic"]
//!     .into_iter()
//!     .collect();
//! let lens = engine.finish(&path)?;
//!
//! let wizard = EyeglassesWizard::for_lens(&lens)
//!     .apply(EyeglassesEvent::Choose(EntryMethod::Deferred))?;
//! let request = wizard.line_request(&lens, MerchandiseId::new("variant-frame"))?;
//!
//! let cart = service.add_request(request).await?;
//! println!("Subtotal: {}", cart.cost.subtotal);
//! ```

pub mod attributes;
pub mod cart;
pub mod error;
pub mod ids;
pub mod money;
pub mod options;
pub mod prescription;
pub mod session;

pub use error::CommerceError;
pub use ids::*;
pub use money::{Currency, Money};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{CommerceError, FieldError, ValidationErrors};
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};

    // Options
    pub use crate::options::{
        ConfigurationPath, ConfiguratorEngine, ConfiguredLens, OptionNode, OptionTree, Selection,
        Step,
    };

    // Attributes
    pub use crate::attributes::{Attribute, AttributeList, AttributeSerializer, FocalProductType};

    // Prescription
    pub use crate::prescription::{
        ArtifactUploader, ContactLensProduct, ContactsEvent, ContactsStep, ContactsWizard,
        EntryMethod, Eye, EyeRx, EyeglassesEvent, EyeglassesStep, EyeglassesWizard,
        PatientInfo, PrescriptionCategory, PrescriptionReference, PrescriptionStore,
        PupillaryDistance, StoredArtifact, UploadFile, VerificationChoice,
    };

    // Cart
    pub use crate::cart::{
        Cart, CartIdStore, CartLine, CartRules, CartService, CommerceBackend, DisplayTotals,
        DonationRule, LineItemRequest,
    };
    pub use crate::session::BuyerSession;
}
