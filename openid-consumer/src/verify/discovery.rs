//! Relying-party discovery seam.

/// Service type advertising a relying party's return URLs.
pub const RP_RETURN_TO_URL_TYPE: &str = "http://specs.openid.net/auth/2.0/return_to";

/// One service element of a discovery document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceEntry {
    /// Type URIs in document order.
    pub type_uris: Vec<String>,
    pub uri: Option<String>,
}

impl ServiceEntry {
    #[must_use]
    pub fn new(type_uris: Vec<String>, uri: Option<String>) -> Self {
        Self { type_uris, uri }
    }

    /// Whether the service advertises `type_uri`.
    #[must_use]
    pub fn has_type(&self, type_uri: &str) -> bool {
        self.type_uris.iter().any(|t| t == type_uri)
    }
}

/// Result of discovering a URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredServices {
    /// URL the discovery document was finally fetched from.
    pub final_url: String,
    /// Services in priority order.
    pub services: Vec<ServiceEntry>,
}

/// Discovery could not produce a document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum DiscoveryError {
    /// The URL could not be fetched.
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// The fetched document is not a usable discovery document.
    #[error("invalid discovery document at {url}: {reason}")]
    InvalidDocument { url: String, reason: String },
}

/// Fetches and parses discovery documents (Yadis/XRDS in practice).
///
/// Implementations follow redirects themselves and report where they ended
/// up in [`DiscoveredServices::final_url`].
pub trait Discovery: Send + Sync {
    fn discover(&self, url: &str) -> Result<DiscoveredServices, DiscoveryError>;
}

impl<T: Discovery + ?Sized> Discovery for &T {
    fn discover(&self, url: &str) -> Result<DiscoveredServices, DiscoveryError> {
        (**self).discover(url)
    }
}
