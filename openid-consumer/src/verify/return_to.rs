//! Return URL verification against a realm's discovered endpoints.
//!
//! A relying party publishes the URLs it accepts assertions at as
//! `return_to` services in the discovery document of its realm. A provider
//! (or a consumer checking itself) discovers the realm and refuses any
//! return URL not covered by one of them.

use openid_auth::realm::{return_to_matches, TrustRoot};
use url::Url;

use super::discovery::{Discovery, RP_RETURN_TO_URL_TYPE};
use super::error::VerificationError;

/// Source of the return URLs allowed for a realm.
///
/// Implemented for closures and for [`DiscoverySource`].
pub trait ReturnToSource {
    /// Allowed return URLs advertised at `discovery_url`.
    fn allowed_return_urls(&self, discovery_url: &str) -> Result<Vec<String>, VerificationError>;
}

impl<F> ReturnToSource for F
where
    F: Fn(&str) -> Result<Vec<String>, VerificationError>,
{
    fn allowed_return_urls(&self, discovery_url: &str) -> Result<Vec<String>, VerificationError> {
        self(discovery_url)
    }
}

/// [`ReturnToSource`] that runs discovery.
#[derive(Debug, Clone)]
pub struct DiscoverySource<D> {
    discovery: D,
}

impl<D: Discovery> DiscoverySource<D> {
    #[must_use]
    pub fn new(discovery: D) -> Self {
        Self { discovery }
    }

    pub fn into_inner(self) -> D {
        self.discovery
    }
}

impl<D: Discovery> ReturnToSource for DiscoverySource<D> {
    fn allowed_return_urls(&self, discovery_url: &str) -> Result<Vec<String>, VerificationError> {
        get_allowed_return_urls(&self.discovery, discovery_url)
    }
}

/// Discover `relying_party_url` and collect its return URLs.
///
/// Redirects are not followed for verification purposes: if discovery ends
/// at a different URL (after normalization) the result is
/// [`VerificationError::Redirected`]. Services without the return_to type,
/// and return_to services without a URI, are ignored.
///
/// # Errors
///
/// - [`VerificationError::Discovery`] if discovery fails
/// - [`VerificationError::Redirected`] if the final URL differs
pub fn get_allowed_return_urls<D>(
    discovery: &D,
    relying_party_url: &str,
) -> Result<Vec<String>, VerificationError>
where
    D: Discovery + ?Sized,
{
    let discovered = discovery.discover(relying_party_url)?;

    if normalize(&discovered.final_url) != normalize(relying_party_url) {
        return Err(VerificationError::Redirected {
            requested: relying_party_url.to_string(),
            final_url: discovered.final_url,
        });
    }

    Ok(discovered
        .services
        .into_iter()
        .filter(|service| service.has_type(RP_RETURN_TO_URL_TYPE))
        .filter_map(|service| service.uri)
        .collect())
}

/// Verify `return_to` against the return URLs discovered for `realm`.
///
/// Unparseable and insane realms are refused before any discovery. Otherwise
/// exactly one lookup is made, at the realm's discovery URL.
///
/// # Errors
///
/// Returns the [`VerificationError`] explaining the refusal.
pub fn check_return_to<S>(realm: &str, return_to: &str, source: &S) -> Result<(), VerificationError>
where
    S: ReturnToSource + ?Sized,
{
    let root = TrustRoot::parse(realm).ok_or_else(|| VerificationError::InvalidRealm {
        realm: realm.to_string(),
    })?;
    if !root.is_sane() {
        return Err(VerificationError::InsaneRealm {
            realm: realm.to_string(),
        });
    }

    let allowed = source.allowed_return_urls(&root.build_discovery_url())?;
    if return_to_matches(&allowed, return_to) {
        Ok(())
    } else {
        Err(VerificationError::NoMatch {
            return_to: return_to.to_string(),
            allowed,
        })
    }
}

/// [`check_return_to`] reduced to a decision. Refusals are logged at INFO.
#[must_use]
pub fn verify_return_to<S>(realm: &str, return_to: &str, source: &S) -> bool
where
    S: ReturnToSource + ?Sized,
{
    let err = match check_return_to(realm, return_to, source) {
        Ok(()) => return true,
        Err(err) => err,
    };

    match &err {
        VerificationError::Redirected { final_url, .. } => tracing::info!(
            realm,
            return_to,
            %final_url,
            "Attempting to verify return_to URL resulted in redirect"
        ),
        VerificationError::NoMatch { allowed, .. } => tracing::info!(
            realm,
            return_to,
            ?allowed,
            "Failed to validate return_to against discovered return URLs"
        ),
        _ => tracing::info!(realm, return_to, error = %err, "Could not verify return_to"),
    }
    false
}

/// Compare URLs the way the url crate serializes them, so that
/// `http://example.com:80` and `http://example.com/` are the same.
fn normalize(url: &str) -> String {
    Url::parse(url).map_or_else(|_| url.to_string(), String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("http://example.com:80"), "http://example.com/");
        assert_eq!(normalize("HTTP://Example.com/a"), "http://example.com/a");
        assert_eq!(normalize("not a url"), "not a url");
    }

    #[test]
    fn test_closure_source() {
        let source = |url: &str| -> Result<Vec<String>, VerificationError> {
            assert_eq!(url, "http://example.com/");
            Ok(vec!["http://example.com/return".to_string()])
        };

        assert!(check_return_to("http://example.com/", "http://example.com/return", &source).is_ok());
        assert_eq!(
            check_return_to("http://example.com/", "http://example.com/other", &source),
            Err(VerificationError::NoMatch {
                return_to: "http://example.com/other".to_string(),
                allowed: vec!["http://example.com/return".to_string()],
            })
        );
    }

    #[test]
    fn test_bad_realms_skip_lookup() {
        let source = |_: &str| -> Result<Vec<String>, VerificationError> {
            panic!("lookup must not happen");
        };

        assert_eq!(
            check_return_to("not a realm", "http://example.com/", &source),
            Err(VerificationError::InvalidRealm {
                realm: "not a realm".to_string()
            })
        );
        assert_eq!(
            check_return_to("http://*.co.uk/", "http://www.example.co.uk/", &source),
            Err(VerificationError::InsaneRealm {
                realm: "http://*.co.uk/".to_string()
            })
        );
    }
}
