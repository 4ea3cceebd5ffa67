//! Association and nonce storage.
//!
//! - [`AssociationStore`] - associations keyed by provider URL and handle
//! - [`NonceStore`] - one-time use of response nonces
//! - [`MemoryAssociationStore`], [`MemoryNonceStore`] - in-process implementations
//! - [`check_response_nonce`] - decode, window check and replay check in one step

mod memory;
mod nonce;

pub use memory::{MemoryAssociationStore, MemoryNonceStore, DEFAULT_MAX_NONCES};
pub use nonce::{check_response_nonce, NonceCheckError};

use openid_auth::association::Association;

/// Storage for associations.
///
/// # Thread Safety
///
/// Uses `&self` to allow concurrent access. Implementations should use
/// interior mutability (e.g., `Mutex`, `DashMap`).
pub trait AssociationStore: Send + Sync {
    /// Store an association, replacing one with the same handle.
    fn store_association(&self, server_url: &str, association: Association);

    /// Look up an association.
    ///
    /// With a handle, returns exactly that association. Without one, returns
    /// the most recently issued association for the provider. Expiry is the
    /// caller's concern.
    fn get_association(&self, server_url: &str, handle: Option<&str>) -> Option<Association>;

    /// Remove an association. Returns `true` if it was present.
    fn remove_association(&self, server_url: &str, handle: &str) -> bool;

    /// Drop expired associations. Returns the number removed.
    fn cleanup_associations(&self) -> usize;
}

/// Storage for used response nonces.
///
/// # Atomicity
///
/// `use_nonce` **must be atomic**: two concurrent calls with the same
/// `(server_url, timestamp, salt)` must not both return `true`.
pub trait NonceStore: Send + Sync {
    /// Widest distance, in seconds, between a nonce timestamp and `now` that
    /// the store accepts. Nonces are only remembered for this long.
    fn skew(&self) -> i64;

    /// Record a nonce seen at `now`.
    ///
    /// Returns `true` if the nonce is within [`NonceStore::skew`] of `now`
    /// and was not seen before. Returns `false` for stale, future or
    /// replayed nonces.
    fn use_nonce(&self, server_url: &str, timestamp: i64, salt: &str, now: i64) -> bool;

    /// Drop nonces that fell out of the skew window at `now`. Returns the
    /// number removed.
    fn cleanup_nonces(&self, now: i64) -> usize;
}
