//! Response nonce checking.

use openid_auth::nonce::{self, NonceError};

use super::NonceStore;

/// Why a response nonce was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum NonceCheckError {
    /// The nonce does not start with a valid timestamp.
    #[error("malformed nonce: {0}")]
    Malformed(#[from] NonceError),

    /// The timestamp is outside the allowed skew.
    #[error("nonce timestamp {timestamp} is outside the allowed window")]
    OutOfWindow { timestamp: i64 },

    /// The store has already seen this nonce.
    #[error("nonce already used")]
    Replayed,
}

/// Accept a response nonce at most once.
///
/// Decodes the nonce, checks its timestamp against `now` with the narrower
/// of `allowed_skew` and the store's own skew, then records it in `store`.
/// A nonce the store would no longer remember is never accepted.
///
/// # Errors
///
/// Returns a [`NonceCheckError`] if the nonce is malformed, stale or
/// from the future, or already used.
pub fn check_response_nonce<S>(
    store: &S,
    server_url: &str,
    response_nonce: &str,
    allowed_skew: i64,
    now: i64,
) -> Result<(), NonceCheckError>
where
    S: NonceStore + ?Sized,
{
    let (timestamp, salt) = nonce::split(response_nonce)?;

    let skew = allowed_skew.min(store.skew());
    if !nonce::check_timestamp(response_nonce, skew, now) {
        tracing::info!(server_url, timestamp, now, skew, "Response nonce outside allowed window");
        return Err(NonceCheckError::OutOfWindow { timestamp });
    }

    if !store.use_nonce(server_url, timestamp, salt, now) {
        tracing::warn!(server_url, nonce = response_nonce, "Response nonce already used");
        return Err(NonceCheckError::Replayed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryNonceStore;
    use chrono::Utc;

    const SERVER: &str = "http://op.example.com/server";
    const NOW: i64 = 1_700_000_000;

    fn nonce_at(timestamp: i64) -> String {
        nonce::mk_nonce(Some(timestamp)).unwrap()
    }

    #[test]
    fn test_fresh_nonce_accepted_once() {
        let store = MemoryNonceStore::default();
        let now = Utc::now().timestamp();
        let fresh = nonce_at(now);

        assert_eq!(check_response_nonce(&store, SERVER, &fresh, nonce::SKEW, now), Ok(()));
        assert_eq!(
            check_response_nonce(&store, SERVER, &fresh, nonce::SKEW, now),
            Err(NonceCheckError::Replayed)
        );
    }

    #[test]
    fn test_explicit_now_is_used_by_store() {
        let store = MemoryNonceStore::default();
        let fresh = nonce_at(NOW);

        assert_eq!(check_response_nonce(&store, SERVER, &fresh, nonce::SKEW, NOW), Ok(()));
        assert_eq!(store.len(), 1);
        assert_eq!(
            check_response_nonce(&store, SERVER, &fresh, nonce::SKEW, NOW),
            Err(NonceCheckError::Replayed)
        );
    }

    #[test]
    fn test_narrower_store_skew_reports_out_of_window() {
        let store = MemoryNonceStore::new(60);
        let old = nonce_at(NOW - 120);

        assert_eq!(
            check_response_nonce(&store, SERVER, &old, nonce::SKEW, NOW),
            Err(NonceCheckError::OutOfWindow {
                timestamp: NOW - 120
            })
        );
        assert!(store.is_empty());

        let recent = nonce_at(NOW - 30);
        assert_eq!(check_response_nonce(&store, SERVER, &recent, nonce::SKEW, NOW), Ok(()));
    }

    #[test]
    fn test_narrower_argument_skew_reports_out_of_window() {
        let store = MemoryNonceStore::new(nonce::SKEW);
        let old = nonce_at(NOW - 120);

        assert_eq!(
            check_response_nonce(&store, SERVER, &old, 60, NOW),
            Err(NonceCheckError::OutOfWindow {
                timestamp: NOW - 120
            })
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_malformed_nonce() {
        let store = MemoryNonceStore::default();
        assert_eq!(
            check_response_nonce(&store, SERVER, "not-a-date-blah", nonce::SKEW, 0),
            Err(NonceCheckError::Malformed(NonceError::MalformedTimestamp))
        );
        assert!(store.is_empty());
    }
}
