//! Contact lens prescription wizard.
//!
//! One sub-form per eye, shaped by the product: astigmatic lenses show
//! cylinder and axis, multifocal lenses show an addition, and base curve or
//! diameter appear only when the product lists values for them. A list with a
//! single value is filled in for the buyer.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::attributes::AttributeSerializer;
use crate::cart::{LineItemRequest, MAX_LINE_QUANTITY};
use crate::error::{CommerceError, ValidationErrors};
use crate::ids::{CustomerId, MerchandiseId, PrescriptionId};
use crate::prescription::{
    upload_and_register, upload_artifact, validate_eye, ArtifactUploader, Eye, EyeRx,
    PrescriptionCategory, PrescriptionReference, PrescriptionStore, RxFieldRules, StoredArtifact,
    StoredPrescription, UploadFile,
};

/// Product metadata that drives which fields are shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactLensProduct {
    pub title: String,
    pub merchandise_id: MerchandiseId,
    #[serde(default)]
    pub astigmatism: bool,
    #[serde(default)]
    pub multifocal: bool,
    #[serde(default)]
    pub base_curves: Vec<String>,
    #[serde(default)]
    pub diameters: Vec<String>,
}

impl ContactLensProduct {
    pub fn rules(&self) -> RxFieldRules {
        RxFieldRules {
            cylinder: self.astigmatism,
            add_required: self.multifocal,
            base_curves: self.base_curves.clone(),
            diameters: self.diameters.clone(),
        }
    }
}

/// One eye's sub-form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EyeOrder {
    pub enabled: bool,
    /// Boxes ordered for this eye.
    pub quantity: i64,
    pub rx: EyeRx,
}

impl Default for EyeOrder {
    fn default() -> Self {
        Self {
            enabled: true,
            quantity: 1,
            rx: EyeRx::default(),
        }
    }
}

impl EyeOrder {
    /// Enabled with at least one box.
    pub fn is_ordered(&self) -> bool {
        self.enabled && self.quantity > 0
    }
}

/// How the prescription will be verified. Exactly one can be held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationChoice {
    /// A prescription already on file.
    Existing(PrescriptionId),
    /// A new upload; `None` until the file is stored.
    Upload(Option<StoredArtifact>),
    /// Send the prescription after checkout.
    Deferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactsStep {
    Prescription,
    Verification,
    Complete,
}

impl ContactsStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactsStep::Prescription => "prescription",
            ContactsStep::Verification => "verification",
            ContactsStep::Complete => "complete",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContactsEvent {
    SetEnabled(Eye, bool),
    SetQuantity(Eye, i64),
    SetRx(Eye, EyeRx),
    Verify(VerificationChoice),
    UploadSucceeded(StoredArtifact),
    Next,
    Back,
}

impl ContactsEvent {
    fn name(&self) -> &'static str {
        match self {
            ContactsEvent::SetEnabled(..) => "set_enabled",
            ContactsEvent::SetQuantity(..) => "set_quantity",
            ContactsEvent::SetRx(..) => "set_rx",
            ContactsEvent::Verify(_) => "verify",
            ContactsEvent::UploadSucceeded(_) => "upload_succeeded",
            ContactsEvent::Next => "next",
            ContactsEvent::Back => "back",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContactsWizard {
    pub product: ContactLensProduct,
    pub step: ContactsStep,
    pub od: EyeOrder,
    pub os: EyeOrder,
    pub verification: Option<VerificationChoice>,
}

impl ContactsWizard {
    pub fn new(product: ContactLensProduct) -> Self {
        let mut od = EyeOrder::default();
        let mut os = EyeOrder::default();
        autofill(&product, &mut od.rx);
        autofill(&product, &mut os.rx);
        Self {
            product,
            step: ContactsStep::Prescription,
            od,
            os,
            verification: None,
        }
    }

    pub fn eye(&self, eye: Eye) -> &EyeOrder {
        match eye {
            Eye::Right => &self.od,
            Eye::Left => &self.os,
        }
    }

    fn eye_mut(&mut self, eye: Eye) -> &mut EyeOrder {
        match eye {
            Eye::Right => &mut self.od,
            Eye::Left => &mut self.os,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.step == ContactsStep::Complete
    }

    pub fn apply(self, event: ContactsEvent) -> Result<Self, CommerceError> {
        transition(&self, event)
    }

    /// The shared prescription reference, once complete.
    pub fn reference(&self) -> Option<PrescriptionReference> {
        if !self.is_complete() {
            return None;
        }
        match self.verification.as_ref()? {
            VerificationChoice::Existing(id) => Some(PrescriptionReference::Existing(id.clone())),
            VerificationChoice::Upload(Some(artifact)) => {
                Some(PrescriptionReference::Uploaded(artifact.clone()))
            }
            VerificationChoice::Upload(None) => None,
            VerificationChoice::Deferred => Some(PrescriptionReference::Deferred),
        }
    }

    /// One add request per ordered eye, right eye first.
    pub fn line_requests(&self) -> Result<Vec<LineItemRequest>, CommerceError> {
        let reference = self
            .reference()
            .ok_or_else(|| CommerceError::PrescriptionIncomplete(self.step.as_str().to_string()))?;
        let rules = self.product.rules();
        Ok(Eye::BOTH
            .into_iter()
            .filter(|eye| self.eye(*eye).is_ordered())
            .map(|eye| {
                let order = self.eye(eye);
                LineItemRequest::new(
                    self.product.merchandise_id.clone(),
                    order.quantity,
                    AttributeSerializer::contact_lens_line(eye, &order.rx, &rules, &reference),
                )
            })
            .collect())
    }

    fn refuse(&self, event: &ContactsEvent) -> CommerceError {
        CommerceError::InvalidTransition {
            state: self.step.as_str().to_string(),
            event: event.name().to_string(),
        }
    }
}

fn autofill(product: &ContactLensProduct, rx: &mut EyeRx) {
    if let [only] = product.base_curves.as_slice() {
        if rx.bc.trim().is_empty() {
            rx.bc = only.clone();
        }
    }
    if let [only] = product.diameters.as_slice() {
        if rx.dia.trim().is_empty() {
            rx.dia = only.clone();
        }
    }
}

/// Compute the state after `event`.
pub fn transition(state: &ContactsWizard, event: ContactsEvent) -> Result<ContactsWizard, CommerceError> {
    use ContactsEvent as Ev;
    use ContactsStep as St;

    let mut next = state.clone();
    match (state.step, event) {
        (St::Prescription, Ev::SetEnabled(eye, enabled)) => next.eye_mut(eye).enabled = enabled,
        (St::Prescription, Ev::SetQuantity(eye, quantity)) => next.eye_mut(eye).quantity = quantity,
        (St::Prescription, Ev::SetRx(eye, mut rx)) => {
            autofill(&state.product, &mut rx);
            next.eye_mut(eye).rx = rx;
        }
        (St::Prescription, Ev::Next) => {
            validate_orders(state).into_result()?;
            next.step = St::Verification;
        }

        // a stored file only arrives through UploadSucceeded
        (St::Verification, Ev::Verify(choice))
            if !matches!(choice, VerificationChoice::Upload(Some(_))) =>
        {
            next.verification = Some(choice)
        }
        (St::Verification, Ev::UploadSucceeded(artifact)) => {
            next.verification = Some(VerificationChoice::Upload(Some(artifact)));
        }
        (St::Verification, Ev::Next) => {
            let mut errors = ValidationErrors::new();
            match &state.verification {
                None => errors.push("verification", "choose how to verify your prescription"),
                Some(VerificationChoice::Upload(None)) => {
                    errors.push("verification", "upload your prescription file")
                }
                Some(_) => {}
            }
            errors.into_result()?;
            next.step = St::Complete;
        }

        (St::Verification, Ev::Back) => next.step = St::Prescription,
        (St::Complete, Ev::Back) => next.step = St::Verification,

        (_, event) => return Err(state.refuse(&event)),
    }

    debug!(from = state.step.as_str(), to = next.step.as_str(), "contacts wizard");
    Ok(next)
}

/// At least one eye ordered; every ordered eye within limits and valid.
pub fn validate_orders(state: &ContactsWizard) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    let rules = state.product.rules();

    if !Eye::BOTH.iter().any(|eye| state.eye(*eye).is_ordered()) {
        errors.push("eyes", "order lenses for at least one eye");
    }

    for eye in Eye::BOTH {
        let order = state.eye(eye);
        if !order.is_ordered() {
            continue;
        }
        if order.quantity > MAX_LINE_QUANTITY {
            errors.push(
                format!("{}.quantity", eye.field_prefix()),
                format!("at most {} boxes per eye", MAX_LINE_QUANTITY),
            );
        }
        validate_eye(eye, &order.rx, &rules, &mut errors);
    }
    errors
}

/// Stored contact lens prescriptions for the signed-in customer.
pub async fn stored_prescriptions(
    store: &dyn PrescriptionStore,
    customer_id: &CustomerId,
) -> Result<Vec<StoredPrescription>, CommerceError> {
    store.list(customer_id, PrescriptionCategory::ContactLenses).await
}

/// Upload a prescription for the verification step.
///
/// For a signed-in customer the file is also registered in the prescription
/// store, with the upload rolled back if registration fails.
pub async fn upload_verification(
    wizard: &ContactsWizard,
    uploader: &dyn ArtifactUploader,
    registration: Option<(&dyn PrescriptionStore, &CustomerId)>,
    file: UploadFile,
) -> Result<ContactsWizard, CommerceError> {
    if wizard.step != ContactsStep::Verification {
        return Err(CommerceError::InvalidTransition {
            state: wizard.step.as_str().to_string(),
            event: "upload".to_string(),
        });
    }
    let artifact = match registration {
        Some((store, customer_id)) => {
            let name = wizard.product.title.clone();
            let record = upload_and_register(
                uploader,
                store,
                file,
                customer_id,
                PrescriptionCategory::ContactLenses,
                name,
            )
            .await?;
            info!(prescription = %record.id, "contact lens prescription saved to account");
            record.file
        }
        None => upload_artifact(uploader, file).await?,
    };
    transition(wizard, ContactsEvent::UploadSucceeded(artifact))
}
