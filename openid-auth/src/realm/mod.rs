//! Realms (trust roots) and return URL matching.
//!
//! - [`TrustRoot`] - parsing, sanity heuristic, URL validation, discovery URL
//! - [`return_to_matches`] - match a return URL against discovered endpoints

mod tld;
mod trust_root;

pub use trust_root::{return_to_matches, TrustRoot};
