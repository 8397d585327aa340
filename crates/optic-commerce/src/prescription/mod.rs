//! Prescription capture.
//!
//! Values and references ([`record`]), uploaded files and stored prescriptions
//! ([`artifacts`]), and the two entry wizards.

mod artifacts;
pub mod contacts;
pub mod eyeglasses;
mod memory;
mod record;

pub use artifacts::{
    upload_and_register, upload_artifact, ArtifactUploader, NewPrescription, PrescriptionStore,
    ProvisionalArtifact, StoredArtifact, StoredPrescription, UploadFile,
};
pub use contacts::{
    ContactLensProduct, ContactsEvent, ContactsStep, ContactsWizard, EyeOrder, VerificationChoice,
};
pub use eyeglasses::{EntryMethod, EyeglassesEvent, EyeglassesStep, EyeglassesWizard};
pub use memory::{MemoryPrescriptionStore, MemoryUploader};
pub use record::{
    validate_eye, Eye, EyeRx, InlinePrescription, PatientInfo, PrescriptionCategory,
    PrescriptionReference, PupillaryDistance, RxFieldRules,
};
