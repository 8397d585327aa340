//! Eyeglasses prescription wizard.
//!
//! ```text
//! InitialChoice ─ manual ──> PatientInfo ─> EyeRx ─> PupillaryDistance ─> Complete
//!               ─ upload ──> UploadFile ─────────────────────────────────> Complete
//!               ─ deferred ──────────────────────────────────────────────> Complete
//! ```
//!
//! [`transition`] is a pure reducer: it never touches the network and returns a
//! new state or the reason the event was refused.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::attributes::AttributeSerializer;
use crate::cart::LineItemRequest;
use crate::error::{CommerceError, ValidationErrors};
use crate::ids::MerchandiseId;
use crate::options::ConfiguredLens;
use crate::prescription::{
    upload_artifact, validate_eye, ArtifactUploader, Eye, EyeRx, InlinePrescription, PatientInfo,
    PrescriptionReference, PupillaryDistance, RxFieldRules, StoredArtifact, UploadFile,
};

/// Steps of the eyeglasses wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EyeglassesStep {
    InitialChoice,
    PatientInfo,
    EyeRx,
    PupillaryDistance,
    UploadFile,
    Complete,
}

impl EyeglassesStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            EyeglassesStep::InitialChoice => "initial_choice",
            EyeglassesStep::PatientInfo => "patient_info",
            EyeglassesStep::EyeRx => "eye_rx",
            EyeglassesStep::PupillaryDistance => "pupillary_distance",
            EyeglassesStep::UploadFile => "upload_file",
            EyeglassesStep::Complete => "complete",
        }
    }
}

/// How the buyer supplies the prescription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryMethod {
    Manual,
    Upload,
    Deferred,
}

/// Input to the wizard.
#[derive(Debug, Clone, PartialEq)]
pub enum EyeglassesEvent {
    Choose(EntryMethod),
    SetPatient(PatientInfo),
    SetEye(Eye, EyeRx),
    SetPd(PupillaryDistance),
    SetConfirmed(bool),
    Next,
    Back,
    UploadSucceeded(StoredArtifact),
    UploadFailed(String),
}

impl EyeglassesEvent {
    fn name(&self) -> &'static str {
        match self {
            EyeglassesEvent::Choose(_) => "choose",
            EyeglassesEvent::SetPatient(_) => "set_patient",
            EyeglassesEvent::SetEye(..) => "set_eye",
            EyeglassesEvent::SetPd(_) => "set_pd",
            EyeglassesEvent::SetConfirmed(_) => "set_confirmed",
            EyeglassesEvent::Next => "next",
            EyeglassesEvent::Back => "back",
            EyeglassesEvent::UploadSucceeded(_) => "upload_succeeded",
            EyeglassesEvent::UploadFailed(_) => "upload_failed",
        }
    }
}

/// Wizard state. Values entered on a branch survive back navigation.
#[derive(Debug, Clone, PartialEq)]
pub struct EyeglassesWizard {
    pub step: EyeglassesStep,
    pub method: Option<EntryMethod>,
    /// The chosen lens needs an addition power.
    pub multifocal: bool,
    pub patient: PatientInfo,
    pub od: EyeRx,
    pub os: EyeRx,
    pub pd: PupillaryDistance,
    /// Buyer confirmed the values match their prescription.
    pub confirmed: bool,
    /// Set once the wizard reaches [`EyeglassesStep::Complete`].
    pub reference: Option<PrescriptionReference>,
    /// Message from the last failed upload.
    pub upload_error: Option<String>,
    today: NaiveDate,
}

impl EyeglassesWizard {
    pub fn new(multifocal: bool) -> Self {
        Self::with_today(multifocal, chrono::Local::now().date_naive())
    }

    /// Start a wizard for a configured lens.
    pub fn for_lens(lens: &ConfiguredLens) -> Self {
        Self::new(lens.multifocal)
    }

    /// Start a wizard that judges dates of birth against `today`.
    pub fn with_today(multifocal: bool, today: NaiveDate) -> Self {
        Self {
            step: EyeglassesStep::InitialChoice,
            method: None,
            multifocal,
            patient: PatientInfo::default(),
            od: EyeRx::default(),
            os: EyeRx::default(),
            pd: PupillaryDistance::default(),
            confirmed: false,
            reference: None,
            upload_error: None,
            today,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.step == EyeglassesStep::Complete
    }

    /// Apply `event`, consuming the current state.
    pub fn apply(self, event: EyeglassesEvent) -> Result<Self, CommerceError> {
        transition(&self, event)
    }

    /// Build the single add request for the configured lens.
    ///
    /// Attributes: lens choices, prescription, focal product type, price override.
    pub fn line_request(
        &self,
        lens: &ConfiguredLens,
        merchandise_id: MerchandiseId,
    ) -> Result<LineItemRequest, CommerceError> {
        let reference = match (&self.step, &self.reference) {
            (EyeglassesStep::Complete, Some(reference)) => reference,
            _ => return Err(CommerceError::PrescriptionIncomplete(self.step.as_str().to_string())),
        };
        if let PrescriptionReference::Inline(rx) = reference {
            if lens.multifocal && !self.multifocal {
                let mut errors = ValidationErrors::new();
                let rules = RxFieldRules::eyeglasses(true);
                validate_eye(Eye::Right, &rx.od, &rules, &mut errors);
                validate_eye(Eye::Left, &rx.os, &rules, &mut errors);
                errors.into_result()?;
            }
        }
        let attributes = AttributeSerializer::eyeglasses_line(lens, reference);
        Ok(LineItemRequest::new(merchandise_id, 1, attributes))
    }

    fn refuse(&self, event: &EyeglassesEvent) -> CommerceError {
        CommerceError::InvalidTransition {
            state: self.step.as_str().to_string(),
            event: event.name().to_string(),
        }
    }
}

/// Compute the state after `event`.
pub fn transition(
    state: &EyeglassesWizard,
    event: EyeglassesEvent,
) -> Result<EyeglassesWizard, CommerceError> {
    use EyeglassesEvent as Ev;
    use EyeglassesStep as St;

    let mut next = state.clone();
    match (state.step, event) {
        (St::InitialChoice, Ev::Choose(method)) => {
            next.method = Some(method);
            next.reference = None;
            next.step = match method {
                EntryMethod::Manual => St::PatientInfo,
                EntryMethod::Upload => St::UploadFile,
                EntryMethod::Deferred => {
                    next.reference = Some(PrescriptionReference::Deferred);
                    St::Complete
                }
            };
        }

        (St::PatientInfo, Ev::SetPatient(patient)) => next.patient = patient,
        (St::EyeRx, Ev::SetEye(Eye::Right, rx)) => next.od = rx,
        (St::EyeRx, Ev::SetEye(Eye::Left, rx)) => next.os = rx,
        (St::PupillaryDistance, Ev::SetPd(pd)) => next.pd = pd,
        (St::PupillaryDistance, Ev::SetConfirmed(confirmed)) => next.confirmed = confirmed,

        (St::PatientInfo, Ev::Next) => {
            validate_patient(&state.patient, state.today).into_result()?;
            next.step = St::EyeRx;
        }
        (St::EyeRx, Ev::Next) => {
            let rules = RxFieldRules::eyeglasses(state.multifocal);
            let mut errors = ValidationErrors::new();
            for eye in Eye::BOTH {
                let rx = match eye {
                    Eye::Right => &state.od,
                    Eye::Left => &state.os,
                };
                validate_eye(eye, rx, &rules, &mut errors);
            }
            errors.into_result()?;
            next.step = St::PupillaryDistance;
        }
        (St::PupillaryDistance, Ev::Next) => {
            let mut errors = ValidationErrors::new();
            if !state.pd.is_complete() {
                errors.push("pd", "enter one PD or a PD for each eye");
            }
            if !state.confirmed {
                errors.push("confirmed", "confirm your prescription details");
            }
            errors.into_result()?;
            next.reference = Some(PrescriptionReference::Inline(InlinePrescription {
                patient: state.patient.clone(),
                od: state.od.clone(),
                os: state.os.clone(),
                pd: state.pd.clone(),
            }));
            next.step = St::Complete;
        }

        (St::UploadFile, Ev::UploadSucceeded(artifact)) => {
            next.upload_error = None;
            next.reference = Some(PrescriptionReference::Uploaded(artifact));
            next.step = St::Complete;
        }
        (St::UploadFile, Ev::UploadFailed(message)) => {
            warn!(error = %message, "prescription upload failed");
            next.upload_error = Some(message);
        }

        (St::PatientInfo, Ev::Back) | (St::UploadFile, Ev::Back) => {
            next.step = St::InitialChoice;
        }
        (St::EyeRx, Ev::Back) => next.step = St::PatientInfo,
        (St::PupillaryDistance, Ev::Back) => next.step = St::EyeRx,
        (St::Complete, Ev::Back) => {
            next.reference = None;
            next.step = match state.method {
                Some(EntryMethod::Manual) => St::PupillaryDistance,
                Some(EntryMethod::Upload) => St::UploadFile,
                Some(EntryMethod::Deferred) | None => St::InitialChoice,
            };
        }

        (_, event) => return Err(state.refuse(&event)),
    }

    debug!(from = state.step.as_str(), to = next.step.as_str(), "eyeglasses wizard");
    Ok(next)
}

/// Name, shipping state and a past date of birth.
pub fn validate_patient(patient: &PatientInfo, today: NaiveDate) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    if patient.name.trim().is_empty() {
        errors.push("patient.name", "name is required");
    }
    if patient.shipping_state.trim().is_empty() {
        errors.push("patient.shipping_state", "shipping state is required");
    }
    let dob = patient.date_of_birth.trim();
    if dob.is_empty() {
        errors.push("patient.date_of_birth", "date of birth is required");
    } else {
        match NaiveDate::parse_from_str(dob, "%Y-%m-%d") {
            Ok(date) if date > today => {
                errors.push("patient.date_of_birth", "date of birth cannot be in the future")
            }
            Ok(_) => {}
            Err(_) => errors.push("patient.date_of_birth", "date of birth must be YYYY-MM-DD"),
        }
    }
    errors
}

/// Upload `file` and advance to [`EyeglassesStep::Complete`].
///
/// On failure the caller's state is untouched and the upload error is returned.
pub async fn upload_prescription(
    wizard: &EyeglassesWizard,
    uploader: &dyn ArtifactUploader,
    file: UploadFile,
) -> Result<EyeglassesWizard, CommerceError> {
    if wizard.step != EyeglassesStep::UploadFile {
        return Err(CommerceError::InvalidTransition {
            state: wizard.step.as_str().to_string(),
            event: "upload".to_string(),
        });
    }
    let artifact = upload_artifact(uploader, file).await?;
    transition(wizard, EyeglassesEvent::UploadSucceeded(artifact))
}
