//! Errors raised by the roster store.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// One or more fields failed validation; nothing was written.
    /// `field` is the first of `fields`.
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
        fields: Vec<&'static str>,
    },

    #[error("student not found: '{id}'")]
    NotFound { id: String },

    /// The persisted blob could not be parsed as a dataset.
    #[error("persisted state is corrupt: {message}")]
    CorruptState { message: String },

    /// The storage backend failed to read or write.
    #[error("persistence failed: {message}")]
    Persistence { message: String },
}

impl StoreError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
            fields: vec![field],
        }
    }

    /// Folds the validation failures of one submission into a single error.
    /// Returns `None` when there were none.
    pub fn merge_validation(errors: Vec<StoreError>) -> Option<Self> {
        let mut fields = Vec::new();
        let mut messages = Vec::new();
        for e in errors {
            if let Self::Validation {
                fields: f, message, ..
            } = e
            {
                fields.extend(f);
                messages.push(message);
            }
        }
        let field = *fields.first()?;
        Some(Self::Validation {
            field,
            message: messages.join("; "),
            fields,
        })
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn persistence(e: anyhow::Error) -> Self {
        Self::Persistence {
            message: format!("{e:#}"),
        }
    }

    /// Stable code used on the IPC wire.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_failed",
            Self::NotFound { .. } => "not_found",
            Self::CorruptState { .. } => "corrupt_state",
            Self::Persistence { .. } => "persistence_failed",
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
