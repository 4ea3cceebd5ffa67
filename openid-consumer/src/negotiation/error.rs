//! Negotiation error types.

use openid_auth::dh::ProtocolError;

use super::endpoint::TransportError;

/// Why no association was established with a provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum NegotiationError {
    /// No allowed pair can be used with the endpoint's protocol version.
    #[error("no allowed association type is usable with {server_url}")]
    NoCompatibleType { server_url: String },

    /// The request never produced a reply.
    #[error("associate request to {server_url} failed: {source}")]
    Transport {
        server_url: String,
        source: TransportError,
    },

    /// The success reply could not be turned into an association.
    #[error("undecipherable association reply from {server_url}: {source}")]
    Protocol {
        server_url: String,
        source: ProtocolError,
    },

    /// The provider answered with an error that does not permit a retry.
    #[error("server error when requesting an association from {server_url}: {error}")]
    ServerError {
        server_url: String,
        error_code: Option<String>,
        error: String,
    },

    /// The provider rejected the type but did not say which one it wants.
    #[error("{server_url} rejected the association type without proposing a fallback")]
    NoFallback { server_url: String },

    /// The provider proposed a pair the negotiator does not allow.
    #[error(
        "{server_url} proposed unsupported session/association type: \
         session_type={session_type}, assoc_type={assoc_type}"
    )]
    PolicyViolation {
        server_url: String,
        assoc_type: String,
        session_type: String,
    },

    /// The provider also rejected the pair it proposed itself.
    #[error(
        "{server_url} refused its suggested association type: \
         session_type={session_type}, assoc_type={assoc_type}"
    )]
    RetryRefused {
        server_url: String,
        assoc_type: String,
        session_type: String,
    },
}

impl NegotiationError {
    /// Provider URL the failure relates to.
    #[must_use]
    pub fn server_url(&self) -> &str {
        match self {
            Self::NoCompatibleType { server_url }
            | Self::Transport { server_url, .. }
            | Self::Protocol { server_url, .. }
            | Self::ServerError { server_url, .. }
            | Self::NoFallback { server_url }
            | Self::PolicyViolation { server_url, .. }
            | Self::RetryRefused { server_url, .. } => server_url,
        }
    }
}
