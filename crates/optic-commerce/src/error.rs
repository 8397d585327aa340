//! Commerce error types.

use std::fmt;

use thiserror::Error;

use crate::cart::Cart;

/// A single failed validation check, tied to the field that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field identifier (e.g. `od.axis`, `patient.name`).
    pub field: String,
    /// Human readable message.
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every field that blocked a step transition.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check whether a given field failed.
    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|e| e.field.as_str())
    }

    /// `Ok(())` when nothing failed, otherwise a [`CommerceError::Validation`].
    pub fn into_result(self) -> Result<(), CommerceError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CommerceError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Errors that can occur in configuration, prescription capture and cart operations.
#[derive(Error, Debug)]
pub enum CommerceError {
    /// Wizard or configurator input failed step gating. Never reaches the network.
    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    /// A commerce backend call failed. The held cart snapshot is unchanged.
    #[error("{message}")]
    RemoteOperation { message: String },

    /// Some of several independent line adds succeeded.
    #[error("Only {succeeded} of {attempted} items were added to your cart: {message}")]
    PartialCompletion {
        succeeded: usize,
        attempted: usize,
        message: String,
        /// Snapshot reflecting the lines that did succeed.
        cart: Box<Cart>,
    },

    /// Prescription artifact upload failed.
    #[error("Upload failed: {0}")]
    Upload(String),

    /// Stored prescription collaborator failed.
    #[error("Prescription store error: {0}")]
    PrescriptionStore(String),

    /// Option key not available at this step.
    #[error("Unknown option '{key}' at step {step}")]
    UnknownOption { step: usize, key: String },

    /// Option catalog source is malformed.
    #[error("Invalid option catalog: {0}")]
    InvalidCatalog(String),

    /// Wizard event not valid in the current state.
    #[error("Invalid wizard transition: {event} while in {state}")]
    InvalidTransition { state: String, event: String },

    /// Wizard has not reached its terminal state.
    #[error("Prescription incomplete: {0}")]
    PrescriptionIncomplete(String),

    /// Invalid quantity.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// No cart loaded yet.
    #[error("No cart is loaded")]
    NoCart,

    /// Arithmetic overflow.
    #[error("Arithmetic overflow in money calculation")]
    Overflow,

    /// Local cart id persistence failed.
    #[error("Cache error: {0}")]
    CacheError(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl CommerceError {
    /// Build a remote error from a plain message.
    pub fn remote(message: impl Into<String>) -> Self {
        CommerceError::RemoteOperation {
            message: message.into(),
        }
    }

    /// Whether the error was produced before any network call.
    pub fn is_validation(&self) -> bool {
        matches!(self, CommerceError::Validation(_))
    }

    /// Validation details, if this is a validation error.
    pub fn validation(&self) -> Option<&ValidationErrors> {
        match self {
            CommerceError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

#[cfg(feature = "storage")]
impl From<optic_cache::CacheError> for CommerceError {
    fn from(e: optic_cache::CacheError) -> Self {
        CommerceError::CacheError(e.to_string())
    }
}

impl From<serde_json::Error> for CommerceError {
    fn from(e: serde_json::Error) -> Self {
        CommerceError::SerializationError(e.to_string())
    }
}
