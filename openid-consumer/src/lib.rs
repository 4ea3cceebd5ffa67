//! # OpenID Consumer
//!
//! Relying-party orchestration on top of `openid-auth`.
//!
//! ## Design Principles
//!
//! Network access stays outside this crate. Collaborators are injected via
//! traits:
//! - [`negotiation::AssociationTransport`] - sends associate requests
//! - [`verify::Discovery`] - fetches a realm's discovery document
//! - [`store::AssociationStore`], [`store::NonceStore`] - persistence
//!
//! Protocol failures never panic. They are returned as tagged errors, or as
//! `None`/`false` from the convenience wrappers, and logged through `tracing`.
//!
//! ## Modules
//!
//! - [`negotiation`] - association negotiation with one retry on `unsupported-type`
//! - [`verify`] - return URL verification against realm discovery
//! - [`store`] - association and nonce stores
//! - [`config`] - TOML configuration

pub mod config;
pub mod negotiation;
pub mod store;
pub mod verify;

pub use config::{ConfigError, ConsumerConfig};
pub use negotiation::{
    get_association, negotiate, negotiate_association, AssociationTransport, NegotiationError,
    ProtocolVersion, ProviderEndpoint, ProviderReply, TransportError,
};
pub use store::{
    check_response_nonce, AssociationStore, MemoryAssociationStore, MemoryNonceStore, NonceStore,
};
pub use verify::{verify_return_to, Discovery, DiscoverySource, ReturnToSource, VerificationError};
