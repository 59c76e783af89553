//! Errors raised while editing and submitting forms.
//!
//! - [`ValidationErrors`] collects every failing field of a form.
//! - [`FormError`] covers cascade and reference-data misuse.
//! - [`BackendError`] is what a [`Backend`] reports at the transport boundary.
//! - [`SubmitError`] is the result of a failed submission.
//!
//!  [`Backend`]: crate::Backend
use std::fmt;

use thiserror::Error;

/// One failing field and the message shown next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// First message reported for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|err| err.field == field)
            .map(|err| err.message.as_str())
    }

    /// Messages only, in the order they were reported.
    pub fn messages(&self) -> String {
        self.0
            .iter()
            .map(|err| err.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", err.field, err.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Errors raised by a [`Backend`](crate::Backend).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("server unreachable: {0}")]
    Transport(String),
    #[error("request failed with status {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("unexpected response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("{level}: \"{key}\" is not an available option")]
    NotAnOption { level: &'static str, key: String },
    #[error("{level} is disabled: {reason}")]
    Disabled { level: &'static str, reason: String },
    #[error("expense mapping {0} not found")]
    MappingNotFound(String),
    #[error("{0}")]
    Mapping(String),
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
    #[error(transparent)]
    Form(FormError),
    /// The backend answered with a status that does not count as success.
    ///
    /// `field` names the payload field the server complained about, when
    /// the detail was taken from a field error.
    #[error("{}", .detail.as_deref().unwrap_or("request rejected"))]
    Rejected {
        status: u16,
        field: Option<&'static str>,
        detail: Option<String>,
    },
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl From<FormError> for SubmitError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::Invalid(errors) => Self::Invalid(errors),
            FormError::Backend(err) => Self::Backend(err),
            other => Self::Form(other),
        }
    }
}
