//! # Error Handling
//!
//! `AppError` is returned by every fallible operation of the generator, the
//! loader and the CLI. A failed dump never yields a partial document.

use derive_more::{Display, From};

/// Errors raised while loading schemas or producing JSON Schema.
///
/// `String` converts into `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// A field kind, validator or schema option that has no JSON Schema mapping.
    #[from(ignore)]
    #[display("Unsupported type for '{subject}': {reason}")]
    UnsupportedType {
        /// The offending field or schema.
        subject: String,
        /// What could not be mapped.
        reason: String,
    },

    /// A nested schema referenced by name that the registry cannot provide.
    #[from(ignore)]
    #[display("Unresolved reference '{name}' (field '{field}')")]
    UnresolvedReference {
        /// The schema name that was looked up.
        name: String,
        /// The field holding the reference.
        field: String,
    },

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

impl AppError {
    /// Shorthand for [`AppError::UnsupportedType`].
    pub fn unsupported(subject: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::UnsupportedType {
            subject: subject.into(),
            reason: reason.into(),
        }
    }
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;
