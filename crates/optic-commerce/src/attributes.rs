//! Cart line attributes.
//!
//! The storefront has no schema for lens customization, so every choice and
//! every prescription value travels as an ordered list of string pairs on the
//! cart line. This module is the only place those keys are spelled.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::options::ConfiguredLens;
use crate::prescription::{Eye, EyeRx, InlinePrescription, PrescriptionReference, RxFieldRules};

/// Attribute keys shared with the storefront and fulfilment.
pub mod keys {
    pub const FOCAL_PRODUCT_TYPE: &str = "FocalProductType";
    /// Hidden override; the backend catalog price ignores lens options.
    pub const PRICE_OVERRIDE: &str = "_price_override";
    pub const EYE: &str = "Eye";
    pub const PRESCRIPTION: &str = "Prescription";
    pub const PRESCRIPTION_FILE: &str = "Prescription File";
    pub const PRESCRIPTION_ID: &str = "Prescription ID";
    pub const PATIENT_NAME: &str = "Patient Name";
    pub const PATIENT_DOB: &str = "Patient Date of Birth";
    pub const SHIPPING_STATE: &str = "Shipping State";
    pub const PD: &str = "PD";
    pub const PD_RIGHT: &str = "PD (OD)";
    pub const PD_LEFT: &str = "PD (OS)";
}

/// A single key/value pair on a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

impl Attribute {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Ordered attribute list. Order is preserved end to end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeList(Vec<Attribute>);

impl AttributeList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push(Attribute::new(key, value));
    }

    /// Push only when `value` is non-blank.
    pub fn push_present(&mut self, key: impl Into<String>, value: &str) {
        let value = value.trim();
        if !value.is_empty() {
            self.push(key, value);
        }
    }

    pub fn extend(&mut self, other: AttributeList) {
        self.0.extend(other.0);
    }

    /// First value recorded for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.0.iter()
    }

    pub fn keys(&self) -> Vec<&str> {
        self.0.iter().map(|a| a.key.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Attribute] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Attribute> {
        self.0
    }

    /// The product family this line belongs to, if tagged.
    pub fn focal_product_type(&self) -> Option<FocalProductType> {
        self.get(keys::FOCAL_PRODUCT_TYPE)
            .and_then(FocalProductType::from_str)
    }
}

impl From<Vec<Attribute>> for AttributeList {
    fn from(v: Vec<Attribute>) -> Self {
        Self(v)
    }
}

impl FromIterator<Attribute> for AttributeList {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Product family used by the cart rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FocalProductType {
    Eyeglasses,
    ContactLenses,
}

impl FocalProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FocalProductType::Eyeglasses => "Eyeglasses",
            FocalProductType::ContactLenses => "ContactLenses",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Eyeglasses" => Some(FocalProductType::Eyeglasses),
            "ContactLenses" => Some(FocalProductType::ContactLenses),
            _ => None,
        }
    }
}

/// Converts configurations and prescriptions into line attributes.
pub struct AttributeSerializer;

impl AttributeSerializer {
    /// One attribute per configured step: step name to chosen label.
    pub fn lens(lens: &ConfiguredLens) -> AttributeList {
        lens.steps
            .iter()
            .map(|s| Attribute::new(s.step.clone(), s.label.clone()))
            .collect()
    }

    pub fn price_override(total: Money) -> Attribute {
        Attribute::new(keys::PRICE_OVERRIDE, total.display_amount())
    }

    pub fn focal_product_type(kind: FocalProductType) -> Attribute {
        Attribute::new(keys::FOCAL_PRODUCT_TYPE, kind.as_str())
    }

    /// Values of one eye, prefixed with the eye code (`OD SPH`).
    pub fn eyeglass_eye(eye: Eye, rx: &EyeRx, list: &mut AttributeList) {
        let code = eye.code();
        list.push_present(format!("{} SPH", code), &rx.sph);
        if rx.has_cylinder() {
            list.push_present(format!("{} CYL", code), &rx.cyl);
            list.push_present(format!("{} AXIS", code), &rx.axis);
        }
        list.push_present(format!("{} ADD", code), &rx.add);
    }

    pub fn inline(rx: &InlinePrescription) -> AttributeList {
        let mut list = AttributeList::new();
        list.push(keys::PRESCRIPTION, "Entered manually");
        list.push_present(keys::PATIENT_NAME, &rx.patient.name);
        list.push_present(keys::PATIENT_DOB, &rx.patient.date_of_birth);
        list.push_present(keys::SHIPPING_STATE, &rx.patient.shipping_state);
        Self::eyeglass_eye(Eye::Right, &rx.od, &mut list);
        Self::eyeglass_eye(Eye::Left, &rx.os, &mut list);
        if rx.pd.uses_single() {
            list.push_present(keys::PD, &rx.pd.single);
        } else {
            list.push_present(keys::PD_RIGHT, &rx.pd.right);
            list.push_present(keys::PD_LEFT, &rx.pd.left);
        }
        list
    }

    pub fn reference(reference: &PrescriptionReference) -> AttributeList {
        match reference {
            PrescriptionReference::Inline(rx) => Self::inline(rx),
            PrescriptionReference::Uploaded(artifact) => {
                let mut list = AttributeList::new();
                list.push(keys::PRESCRIPTION, "Uploaded");
                list.push(keys::PRESCRIPTION_FILE, artifact.url.clone());
                list
            }
            PrescriptionReference::Existing(id) => {
                let mut list = AttributeList::new();
                list.push(keys::PRESCRIPTION, "On file");
                list.push(keys::PRESCRIPTION_ID, id.as_str());
                list
            }
            PrescriptionReference::Deferred => {
                let mut list = AttributeList::new();
                list.push(keys::PRESCRIPTION, "Send later");
                list
            }
        }
    }

    /// Lens choices, prescription, product type, then price override.
    pub fn eyeglasses_line(lens: &ConfiguredLens, reference: &PrescriptionReference) -> AttributeList {
        let mut list = Self::lens(lens);
        list.extend(Self::reference(reference));
        list.0.push(Self::focal_product_type(FocalProductType::Eyeglasses));
        list.0.push(Self::price_override(lens.total));
        list
    }

    /// Eye, that eye's visible values, shared prescription reference, product type.
    ///
    /// Fields hidden by `rules` are never emitted, even when a value is held.
    pub fn contact_lens_line(
        eye: Eye,
        rx: &EyeRx,
        rules: &RxFieldRules,
        reference: &PrescriptionReference,
    ) -> AttributeList {
        let mut list = AttributeList::new();
        list.push(keys::EYE, eye.display_name());
        list.push_present("SPH", &rx.sph);
        if rules.cylinder && rx.has_cylinder() {
            list.push_present("CYL", &rx.cyl);
            list.push_present("AXIS", &rx.axis);
        }
        if rules.add_required {
            list.push_present("ADD", &rx.add);
        }
        if !rules.base_curves.is_empty() {
            list.push_present("BC", &rx.bc);
        }
        if !rules.diameters.is_empty() {
            list.push_present("DIA", &rx.dia);
        }
        list.extend(Self::reference(reference));
        list.0.push(Self::focal_product_type(FocalProductType::ContactLenses));
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::PrescriptionId;
    use crate::money::Currency;
    use crate::options::{ConfigurationPath, ConfiguratorEngine, OptionTree};
    use crate::prescription::{PatientInfo, PupillaryDistance};
    use std::sync::Arc;

    fn lens(keys: &[&str]) -> ConfiguredLens {
        let engine = ConfiguratorEngine::new(
            Arc::new(OptionTree::eyeglasses().unwrap()),
            Money::from_major(95, Currency::USD),
        );
        let path: ConfigurationPath = keys.iter().copied().collect();
        engine.finish(&path).unwrap()
    }

    #[test]
    fn test_eyeglasses_line_order() {
        let lens = lens(&["single-vision", "standard", "light-responsive", "transitions-xtractive", "grey"]);
        let attrs = AttributeSerializer::eyeglasses_line(&lens, &PrescriptionReference::Deferred);
        assert_eq!(
            attrs.keys(),
            [
                "Lens Type",
                "Lens Material",
                "Lens Treatment",
                "Light-responsive Lens",
                "Final Option",
                "Prescription",
                "FocalProductType",
                "_price_override",
            ]
        );
        assert_eq!(attrs.get(keys::PRICE_OVERRIDE), Some("270.00"));
        assert_eq!(attrs.focal_product_type(), Some(FocalProductType::Eyeglasses));
    }

    #[test]
    fn test_inline_prescription_skips_blank_fields() {
        let rx = InlinePrescription {
            patient: PatientInfo {
                name: "Ada Lovelace".into(),
                shipping_state: "NY".into(),
                date_of_birth: "1990-12-10".into(),
            },
            od: EyeRx::default().with_sph("-1.25").with_cyl_axis("0.00", ""),
            os: EyeRx::default().with_sph("-1.50").with_cyl_axis("-0.50", "170"),
            pd: PupillaryDistance::dual("31", "32"),
        };
        let attrs = AttributeSerializer::inline(&rx);
        assert_eq!(attrs.get("OD SPH"), Some("-1.25"));
        assert!(!attrs.contains_key("OD CYL"));
        assert_eq!(attrs.get("OS AXIS"), Some("170"));
        assert_eq!(attrs.get(keys::PD_LEFT), Some("32"));
        assert!(!attrs.contains_key(keys::PD));
    }

    #[test]
    fn test_non_numeric_single_pd_falls_back_to_per_eye_values() {
        let rx = InlinePrescription {
            od: EyeRx::default().with_sph("-1.00"),
            os: EyeRx::default().with_sph("-1.00"),
            pd: PupillaryDistance {
                single: "n/a".into(),
                right: "31".into(),
                left: "32".into(),
            },
            ..InlinePrescription::default()
        };
        assert!(rx.pd.is_complete());

        let attrs = AttributeSerializer::inline(&rx);
        assert_eq!(attrs.get(keys::PD_RIGHT), Some("31"));
        assert_eq!(attrs.get(keys::PD_LEFT), Some("32"));
        assert!(!attrs.contains_key(keys::PD));
    }

    #[test]
    fn test_existing_reference() {
        let attrs =
            AttributeSerializer::reference(&PrescriptionReference::Existing(PrescriptionId::new("rx-1")));
        assert_eq!(attrs.get(keys::PRESCRIPTION), Some("On file"));
        assert_eq!(attrs.get(keys::PRESCRIPTION_ID), Some("rx-1"));
    }

    #[test]
    fn test_contact_line_hides_fields_the_product_does_not_show() {
        let rules = RxFieldRules {
            cylinder: false,
            add_required: false,
            base_curves: vec!["8.6".into()],
            diameters: Vec::new(),
        };
        let rx = EyeRx {
            sph: "-3.00".into(),
            cyl: "-0.75".into(),
            axis: "90".into(),
            add: "+1.00".into(),
            bc: "8.6".into(),
            dia: "14.2".into(),
        };
        let attrs =
            AttributeSerializer::contact_lens_line(Eye::Left, &rx, &rules, &PrescriptionReference::Deferred);
        assert_eq!(
            attrs.keys(),
            ["Eye", "SPH", "BC", "Prescription", "FocalProductType"]
        );
        assert_eq!(attrs.get(keys::EYE), Some("Left (OS)"));
    }

    #[test]
    fn test_attribute_list_wire_shape() {
        let mut attrs = AttributeList::new();
        attrs.push("Eye", "Right (OD)");
        let json = serde_json::to_value(&attrs).unwrap();
        assert_eq!(json, serde_json::json!([{"key": "Eye", "value": "Right (OD)"}]));
    }
}
