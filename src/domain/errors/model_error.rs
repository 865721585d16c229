//! Errors raised while building or querying the local model.

use thiserror::Error;

/// Which positional list an index was resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Guild,
    Channel,
    PrivateChannel,
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Guild => write!(f, "guild"),
            Self::Channel => write!(f, "channel"),
            Self::PrivateChannel => write!(f, "private channel"),
        }
    }
}

/// Model error variants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("missing required field `{field}` in {entity}")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },

    #[error("invalid value for `{field}` in {entity}: {reason}")]
    InvalidField {
        entity: &'static str,
        field: &'static str,
        reason: String,
    },

    #[error("incorrect {kind} index")]
    IndexOutOfRange { kind: IndexKind },

    #[error("not ready yet")]
    NotReady,
}

impl ModelError {
    #[must_use]
    pub const fn missing(entity: &'static str, field: &'static str) -> Self {
        Self::MissingField { entity, field }
    }

    #[must_use]
    pub fn invalid(entity: &'static str, field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            entity,
            field,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub const fn index(kind: IndexKind) -> Self {
        Self::IndexOutOfRange { kind }
    }
}
