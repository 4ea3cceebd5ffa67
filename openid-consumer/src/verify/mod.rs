//! Return URL verification.
//!
//! - [`Discovery`] - injected discovery of a realm's services
//! - [`ReturnToSource`] - allowed return URLs, from discovery or a closure
//! - [`verify_return_to`] - the fail-closed check

mod discovery;
mod error;
mod return_to;

pub use discovery::{
    DiscoveredServices, Discovery, DiscoveryError, ServiceEntry, RP_RETURN_TO_URL_TYPE,
};
pub use error::VerificationError;
pub use return_to::{
    check_return_to, get_allowed_return_urls, verify_return_to, DiscoverySource, ReturnToSource,
};
