//! Provider endpoints and the transport used to reach them.

use std::fmt;

use openid_auth::kv::KvFields;

/// Namespace URI sent with OpenID 2 requests.
pub const OPENID2_NS: &str = "http://specs.openid.net/auth/2.0";

/// Protocol version spoken by a provider endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolVersion {
    /// OpenID 1.x
    V1,
    /// OpenID 2.0
    V2,
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => f.write_str("OpenID 1"),
            Self::V2 => f.write_str("OpenID 2"),
        }
    }
}

/// A discovered OpenID provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoint {
    pub server_url: String,
    pub version: ProtocolVersion,
}

impl ProviderEndpoint {
    #[must_use]
    pub fn new(server_url: impl Into<String>, version: ProtocolVersion) -> Self {
        Self {
            server_url: server_url.into(),
            version,
        }
    }

    #[must_use]
    pub fn is_openid1(&self) -> bool {
        self.version == ProtocolVersion::V1
    }
}

/// A provider's answer to an associate request.
///
/// Fields are bare OpenID argument names (`assoc_handle`, not
/// `openid.assoc_handle`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderReply {
    /// The provider issued an association.
    Success(KvFields),
    /// The provider answered with an error message (HTTP 400 in practice).
    Error(KvFields),
}

/// Failure to obtain any reply from the provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum TransportError {
    /// The request could not be delivered.
    #[error("request failed: {0}")]
    Unreachable(String),

    /// The provider answered with a status that carries no OpenID message.
    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),

    /// The body is not a key-value form message.
    #[error("malformed reply: {0}")]
    MalformedReply(String),
}

/// Sends associate requests to a provider.
///
/// Implementations own encoding (adding the `openid.` prefix, form
/// encoding), timeouts and cancellation. Exactly one request is sent per call.
pub trait AssociationTransport: Send + Sync {
    /// POST `fields` to the endpoint and return the decoded reply.
    fn send_association_request(
        &self,
        endpoint: &ProviderEndpoint,
        fields: &KvFields,
    ) -> Result<ProviderReply, TransportError>;
}

impl<T: AssociationTransport + ?Sized> AssociationTransport for &T {
    fn send_association_request(
        &self,
        endpoint: &ProviderEndpoint,
        fields: &KvFields,
    ) -> Result<ProviderReply, TransportError> {
        (**self).send_association_request(endpoint, fields)
    }
}
