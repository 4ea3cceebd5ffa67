//! Association error types.

use crate::kv::KvError;

/// Errors raised when configuring a [`super::SessionNegotiator`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum NegotiatorError {
    /// The association type is unknown and admits no session types.
    #[error("no session available for association type {0:?}")]
    UnknownAssocType(String),

    /// The session type cannot carry the association type.
    #[error("session type {session_type:?} not valid for association type {assoc_type:?}")]
    InvalidSessionType {
        assoc_type: String,
        session_type: String,
    },

    /// A negotiator must allow at least one pair.
    #[error("negotiator has no allowed association types")]
    Empty,
}

/// Errors raised when building or decoding an [`super::Association`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum AssociationError {
    /// The secret does not match the digest size of the association type.
    #[error("secret for {assoc_type} must be {expected} bytes, got {actual}")]
    SecretLength {
        assoc_type: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The association type is not recognised.
    #[error("unknown association type {0:?}")]
    UnknownAssocType(String),

    /// The serialized form does not have the expected shape.
    #[error("malformed serialized association: {0}")]
    Malformed(String),

    /// A numeric field could not be parsed.
    #[error("invalid number in field {field}")]
    InvalidNumber { field: &'static str },

    /// Key-value encoding failed.
    #[error(transparent)]
    Kv(#[from] KvError),
}
