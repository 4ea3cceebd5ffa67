//! Association negotiation with OpenID providers.
//!
//! - [`ProviderEndpoint`] - where to associate and which protocol version to speak
//! - [`AssociationTransport`] - injected request/response channel
//! - [`negotiate`] - the two-attempt negotiation protocol
//! - [`get_association`] - store-backed retrieval

mod endpoint;
mod error;
mod negotiate;
pub mod request;

pub use endpoint::{
    AssociationTransport, ProtocolVersion, ProviderEndpoint, ProviderReply, TransportError,
    OPENID2_NS,
};
pub use error::NegotiationError;
pub use negotiate::{
    get_association, negotiate, negotiate_association, negotiate_with_rng, usable_with,
};
