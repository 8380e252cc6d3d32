//! Error taxonomy shared by the whole crate.

use thiserror::Error;

/// Errors produced by the tuner.
#[derive(Debug, Error)]
pub enum TunerError {
    /// Descriptor construction with an empty domain.
    #[error("invalid domain for {param}: min {min} > max {max}")]
    InvalidDomain { param: String, min: String, max: String },

    /// Configuration value which can not be parsed into the expected type.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    /// The cluster has no slots of a kind the job needs.
    #[error("cluster has no {kind} slots")]
    MissingSlots { kind: &'static str },

    /// The profile lacks a task kind the operation needs.
    #[error("profile has no {kind} profile")]
    MissingProfile { kind: &'static str },

    /// Unknown search strategy name.
    #[error("unknown search strategy {0:?}, expected full, smart_full, rrs or smart_rrs")]
    UnknownStrategy(String),

    /// Unreadable or unparsable document.
    #[error("can't process document {path}: {message}")]
    Document { path: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TunerError {
    pub(crate) fn document(path: impl AsRef<std::path::Path>, message: impl ToString) -> Self {
        TunerError::Document {
            path: path.as_ref().display().to_string(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TunerError>;
