//! Realm (trust root) parsing, sanity checks and return URL matching.

use std::fmt;

use url::Url;

use super::tld::is_top_level_domain;

/// A realm URL, possibly with a `*.` wildcard in front of the host.
///
/// Hosts are lowercased and default ports dropped. The path includes the
/// query string, so `http://example.com/a?b` has path `/a?b`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustRoot {
    unparsed: String,
    scheme: String,
    wildcard: bool,
    host: String,
    port: Option<u16>,
    path: String,
}

/// Normalized pieces of an http(s) URL.
struct UrlParts {
    scheme: String,
    host: String,
    port: Option<u16>,
    path: String,
}

/// Split an http(s) URL. The path carries the query and any `#fragment`.
fn parse_url(input: &str) -> Option<UrlParts> {
    let url = Url::parse(input).ok()?;
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return None;
    }
    let host = url.host_str()?.to_ascii_lowercase();

    let mut path = url.path().to_string();
    if let Some(query) = url.query() {
        path.push('?');
        path.push_str(query);
    }
    if let Some(fragment) = url.fragment() {
        path.push('#');
        path.push_str(fragment);
    }

    Some(UrlParts {
        scheme: scheme.to_string(),
        host,
        port: url.port(),
        path,
    })
}

impl TrustRoot {
    /// Parse a realm.
    ///
    /// Returns `None` for anything that is not an absolute http(s) URL, for
    /// realms with a fragment, and for misplaced wildcards: `*` is only
    /// allowed as the first host character and must be followed by `.`
    /// (or be the whole host).
    #[must_use]
    pub fn parse(realm: &str) -> Option<Self> {
        let parts = parse_url(realm)?;
        if parts.path.contains('#') {
            return None;
        }

        let mut host = parts.host;
        if host.get(1..).is_some_and(|rest| rest.contains('*')) {
            return None;
        }

        let mut wildcard = false;
        if let Some(rest) = host.strip_prefix('*') {
            if !rest.is_empty() && !rest.starts_with('.') {
                return None;
            }
            host = rest.to_string();
            wildcard = true;
        }

        Some(Self {
            unparsed: realm.to_string(),
            scheme: parts.scheme,
            wildcard,
            host,
            port: parts.port,
            path: parts.path,
        })
    }

    /// Whether this realm is specific enough to be trusted.
    ///
    /// Rejects hosts whose last label is not a known top-level domain, bare
    /// top-level domains, and wildcards over registry-level suffixes such as
    /// `*.co.uk`. The suffix rule is a heuristic, not a public-suffix lookup.
    #[must_use]
    pub fn is_sane(&self) -> bool {
        if self.host == "localhost" {
            return true;
        }

        let mut labels: Vec<&str> = self.host.split('.').collect();
        if self.wildcard {
            // Host kept the leading dot of "*."
            labels.remove(0);
        }
        if labels.last() == Some(&"") {
            labels.pop();
        }

        let Some(&tld) = labels.last() else {
            return false;
        };
        if labels.contains(&"") || !is_top_level_domain(tld) {
            return false;
        }
        if labels.len() == 1 {
            return false;
        }

        if self.wildcard && tld.len() == 2 && labels[labels.len() - 2].len() <= 3 {
            return labels.len() > 2;
        }
        true
    }

    /// Whether `url` falls under this realm.
    ///
    /// Scheme and port must match exactly. A wildcard realm matches its own
    /// host and any subdomain of it. The path must equal the realm path or
    /// extend it at a boundary: after `/` or `?` for plain paths, after `&`
    /// once the realm path has a query.
    #[must_use]
    pub fn validate_url(&self, url: &str) -> bool {
        let Some(parts) = parse_url(url) else {
            return false;
        };

        if parts.scheme != self.scheme || parts.port != self.port {
            return false;
        }
        if parts.host.contains('*') {
            return false;
        }

        if self.wildcard {
            let subdomain = parts.host.ends_with(&self.host);
            let bare = format!(".{}", parts.host) == self.host;
            if !subdomain && !bare {
                return false;
            }
        } else if parts.host != self.host {
            return false;
        }

        if parts.path == self.path {
            return true;
        }
        if !parts.path.starts_with(&self.path) {
            return false;
        }

        let allowed: &[u8] = if self.path.contains('?') { b"&" } else { b"?/" };
        let last = self.path.as_bytes().last();
        let next = parts.path.as_bytes().get(self.path.len());
        last.is_some_and(|b| allowed.contains(b)) || next.is_some_and(|b| allowed.contains(b))
    }

    /// URL to run relying-party discovery against.
    ///
    /// Wildcard realms are probed at `www.` plus the host; any other realm is
    /// returned exactly as it was given.
    #[must_use]
    pub fn build_discovery_url(&self) -> String {
        if !self.wildcard {
            return self.unparsed.clone();
        }
        let port = self.port.map(|p| format!(":{p}")).unwrap_or_default();
        format!("{}://www{}{}{}", self.scheme, self.host, port, self.path)
    }

    /// Parse `realm` and check that it is sane.
    #[must_use]
    pub fn check_sanity(realm: &str) -> bool {
        Self::parse(realm).is_some_and(|root| root.is_sane())
    }

    /// Parse `realm` and check that `url` falls under it.
    #[must_use]
    pub fn check_url(realm: &str, url: &str) -> bool {
        Self::parse(realm).is_some_and(|root| root.validate_url(url))
    }

    #[must_use]
    pub fn unparsed(&self) -> &str {
        &self.unparsed
    }

    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// Host with the `*` removed; wildcard hosts keep their leading dot.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Explicit, non-default port.
    #[must_use]
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for TrustRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.unparsed)
    }
}

/// Whether `return_to` matches one of the `allowed` return URLs.
///
/// Each allowed URL is treated as a realm. Unparseable entries and wildcard
/// entries are skipped; wildcards are never expanded here.
#[must_use]
pub fn return_to_matches<S: AsRef<str>>(allowed: &[S], return_to: &str) -> bool {
    allowed
        .iter()
        .filter_map(|url| TrustRoot::parse(url.as_ref()))
        .filter(|root| !root.is_wildcard())
        .any(|root| root.validate_url(return_to))
}
