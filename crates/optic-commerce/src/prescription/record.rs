//! Prescription values and references.

use serde::{Deserialize, Serialize};

use crate::error::ValidationErrors;
use crate::ids::PrescriptionId;
use crate::prescription::StoredArtifact;

/// Which eye a set of values belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Eye {
    /// Oculus dexter.
    Right,
    /// Oculus sinister.
    Left,
}

impl Eye {
    pub const BOTH: [Eye; 2] = [Eye::Right, Eye::Left];

    /// Clinical abbreviation.
    pub fn code(&self) -> &'static str {
        match self {
            Eye::Right => "OD",
            Eye::Left => "OS",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Eye::Right => "Right (OD)",
            Eye::Left => "Left (OS)",
        }
    }

    /// Field prefix used in validation errors.
    pub fn field_prefix(&self) -> &'static str {
        match self {
            Eye::Right => "od",
            Eye::Left => "os",
        }
    }
}

/// Values for one eye, as entered. Empty strings mean "not entered".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EyeRx {
    /// Sphere power.
    pub sph: String,
    /// Cylinder power.
    #[serde(default)]
    pub cyl: String,
    /// Cylinder axis in degrees.
    #[serde(default)]
    pub axis: String,
    /// Addition power (multifocal).
    #[serde(default)]
    pub add: String,
    /// Base curve (contact lenses).
    #[serde(default)]
    pub bc: String,
    /// Diameter (contact lenses).
    #[serde(default)]
    pub dia: String,
}

impl EyeRx {
    pub fn with_sph(mut self, sph: impl Into<String>) -> Self {
        self.sph = sph.into();
        self
    }

    pub fn with_cyl_axis(mut self, cyl: impl Into<String>, axis: impl Into<String>) -> Self {
        self.cyl = cyl.into();
        self.axis = axis.into();
        self
    }

    pub fn with_add(mut self, add: impl Into<String>) -> Self {
        self.add = add.into();
        self
    }

    /// A cylinder counts as set unless blank or numerically zero.
    pub fn has_cylinder(&self) -> bool {
        let cyl = self.cyl.trim();
        if cyl.is_empty() {
            return false;
        }
        match cyl.parse::<f64>() {
            Ok(value) => value != 0.0,
            Err(_) => true,
        }
    }

    /// Sphere entered, and an axis for any non-zero cylinder.
    pub fn is_step_complete(&self) -> bool {
        !self.sph.trim().is_empty() && !(self.has_cylinder() && self.axis.trim().is_empty())
    }
}

/// Which optional fields an eye form shows and requires.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RxFieldRules {
    /// Show cylinder and axis.
    pub cylinder: bool,
    /// Require an addition power.
    pub add_required: bool,
    /// Allowed base curves; empty hides the field.
    pub base_curves: Vec<String>,
    /// Allowed diameters; empty hides the field.
    pub diameters: Vec<String>,
}

impl RxFieldRules {
    /// Eyeglass prescriptions always collect cylinder/axis.
    pub fn eyeglasses(multifocal: bool) -> Self {
        Self {
            cylinder: true,
            add_required: multifocal,
            ..Self::default()
        }
    }
}

/// Check one eye against `rules`, recording failures as `<eye>.<field>`.
pub fn validate_eye(eye: Eye, rx: &EyeRx, rules: &RxFieldRules, errors: &mut ValidationErrors) {
    let prefix = eye.field_prefix();
    let field = |name: &str| format!("{}.{}", prefix, name);

    if rx.sph.trim().is_empty() {
        errors.push(field("sph"), "sphere is required");
    } else if !is_number(&rx.sph) {
        errors.push(field("sph"), "sphere must be a number");
    }

    if rules.cylinder {
        if !rx.cyl.trim().is_empty() && !is_number(&rx.cyl) {
            errors.push(field("cyl"), "cylinder must be a number");
        }
        if rx.has_cylinder() {
            match rx.axis.trim() {
                "" => errors.push(field("axis"), "axis is required when cylinder is set"),
                axis if !is_axis(axis) => {
                    errors.push(field("axis"), "axis must be a whole number from 0 to 180")
                }
                _ => {}
            }
        }
    }

    if rules.add_required {
        if rx.add.trim().is_empty() {
            errors.push(field("add"), "addition is required for multifocal lenses");
        } else if !is_number(&rx.add) {
            errors.push(field("add"), "addition must be a number");
        }
    }

    check_listed(&rx.bc, &rules.base_curves, field("bc"), "base curve", errors);
    check_listed(&rx.dia, &rules.diameters, field("dia"), "diameter", errors);
}

fn check_listed(
    value: &str,
    options: &[String],
    field: String,
    name: &str,
    errors: &mut ValidationErrors,
) {
    if options.is_empty() {
        return;
    }
    let value = value.trim();
    if value.is_empty() {
        errors.push(field, format!("{} is required", name));
    } else if !options.iter().any(|o| o == value) {
        errors.push(field, format!("{} must be one of {}", name, options.join(", ")));
    }
}

pub(crate) fn is_number(value: &str) -> bool {
    value.trim().parse::<f64>().map(|v| v.is_finite()).unwrap_or(false)
}

fn is_axis(value: &str) -> bool {
    value.parse::<u16>().map(|a| a <= 180).unwrap_or(false)
}

/// Patient details collected before manual entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientInfo {
    pub name: String,
    /// US state (or province) the order ships to.
    pub shipping_state: String,
    /// `YYYY-MM-DD`.
    pub date_of_birth: String,
}

/// Pupillary distance: one binocular value or a value per eye.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PupillaryDistance {
    #[serde(default)]
    pub single: String,
    #[serde(default)]
    pub right: String,
    #[serde(default)]
    pub left: String,
}

impl PupillaryDistance {
    pub fn single(value: impl Into<String>) -> Self {
        Self {
            single: value.into(),
            ..Self::default()
        }
    }

    pub fn dual(right: impl Into<String>, left: impl Into<String>) -> Self {
        Self {
            single: String::new(),
            right: right.into(),
            left: left.into(),
        }
    }

    /// A numeric single value, or numeric values for both eyes.
    pub fn is_complete(&self) -> bool {
        self.uses_single() || (is_number(&self.right) && is_number(&self.left))
    }

    /// Whether the single value is the one that satisfies [`is_complete`](Self::is_complete).
    pub fn uses_single(&self) -> bool {
        is_number(&self.single)
    }
}

/// A manually entered eyeglass prescription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlinePrescription {
    pub patient: PatientInfo,
    pub od: EyeRx,
    pub os: EyeRx,
    pub pd: PupillaryDistance,
}

/// How the prescription for a line is supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum PrescriptionReference {
    /// Values typed in by the buyer.
    Inline(InlinePrescription),
    /// A file the buyer uploaded.
    Uploaded(StoredArtifact),
    /// A prescription already on file for the customer.
    Existing(PrescriptionId),
    /// The buyer will send it after checkout.
    Deferred,
}

impl PrescriptionReference {
    pub fn kind(&self) -> &'static str {
        match self {
            PrescriptionReference::Inline(_) => "inline",
            PrescriptionReference::Uploaded(_) => "uploaded",
            PrescriptionReference::Existing(_) => "existing",
            PrescriptionReference::Deferred => "deferred",
        }
    }
}

/// Product category a stored prescription applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrescriptionCategory {
    Eyeglasses,
    ContactLenses,
}

impl PrescriptionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrescriptionCategory::Eyeglasses => "Eyeglasses",
            PrescriptionCategory::ContactLenses => "ContactLenses",
        }
    }
}
