//! Protocol error types.

/// A provider reply that cannot be turned into an association.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// A required field is absent.
    #[error("missing required field {0}")]
    MissingField(&'static str),

    /// A field is not valid base64.
    #[error("field {field} is not valid base64")]
    InvalidBase64 { field: &'static str },

    /// A numeric field could not be parsed.
    #[error("invalid {field} field: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    /// The encrypted secret does not match the digest length.
    #[error("secret must be {expected} bytes, got {actual}")]
    SecretLength { expected: usize, actual: usize },

    /// The provider answered with a different session type.
    #[error("session type mismatch: expected {expected:?}, got {actual:?}")]
    SessionMismatch { expected: String, actual: String },

    /// The association type cannot be carried by the session.
    #[error("unsupported assoc_type for session {session_type} returned: {assoc_type:?}")]
    UnsupportedAssocType {
        session_type: &'static str,
        assoc_type: String,
    },
}
