//! Verification error types.

use super::discovery::DiscoveryError;

/// Why a return URL was not verified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum VerificationError {
    /// The realm is not a valid realm URL.
    #[error("invalid realm {realm:?}")]
    InvalidRealm { realm: String },

    /// The realm is too broad to be trusted (for example `*.co.uk`).
    #[error("realm {realm:?} is not sane")]
    InsaneRealm { realm: String },

    /// Discovery of the realm ended at a different URL.
    #[error("discovery of {requested} was redirected to {final_url}")]
    Redirected { requested: String, final_url: String },

    /// Discovery failed outright.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// None of the discovered return URLs covers the return URL.
    #[error("return_to {return_to} does not match any discovered return URL")]
    NoMatch {
        return_to: String,
        allowed: Vec<String>,
    },
}
