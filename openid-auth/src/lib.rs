//! Pure OpenID relying-party primitives.
//!
//! This crate is intentionally IO-free:
//! - No filesystem operations
//! - No network calls
//! - No logging
//!
//! Talking to providers, running discovery and remembering associations or
//! nonces is left to the caller (see the `openid-consumer` crate).
//!
//! # Example
//!
//! ```
//! use openid_auth::realm::TrustRoot;
//!
//! let realm = TrustRoot::parse("http://*.example.com/").unwrap();
//! assert!(realm.is_sane());
//! assert_eq!(realm.build_discovery_url(), "http://www.example.com/");
//! assert!(realm.validate_url("http://app.example.com/return"));
//! ```

pub mod association;
pub mod dh;
pub mod kv;
pub mod nonce;
pub mod realm;

pub use association::{
    AssocType, Association, AssociationError, NegotiatorError, SessionNegotiator, SessionType,
};
pub use dh::{ConsumerSession, DiffieHellman, ProtocolError};
pub use kv::{KvError, KvFields};
pub use nonce::NonceError;
pub use realm::{return_to_matches, TrustRoot};
