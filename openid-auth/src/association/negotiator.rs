//! Session negotiator: the ordered catalogue of acceptable association types.

use super::error::NegotiatorError;
use super::types::{AssocType, SessionType};

/// An allowed `(assoc_type, session_type)` pair.
pub type AllowedType = (AssocType, SessionType);

/// Preference order used by [`SessionNegotiator::default`].
pub const DEFAULT_ASSOCIATION_ORDER: [AllowedType; 4] = [
    (AssocType::HmacSha1, SessionType::DhSha1),
    (AssocType::HmacSha1, SessionType::NoEncryption),
    (AssocType::HmacSha256, SessionType::DhSha256),
    (AssocType::HmacSha256, SessionType::NoEncryption),
];

/// Preference order used by [`SessionNegotiator::encrypted_only`].
pub const ENCRYPTED_ASSOCIATION_ORDER: [AllowedType; 2] = [
    (AssocType::HmacSha1, SessionType::DhSha1),
    (AssocType::HmacSha256, SessionType::DhSha256),
];

/// Ordered set of allowed association/session type pairs.
///
/// Insertion order is preference order: the first pair is the one proposed
/// to a provider, and later pairs are only used when a provider's
/// counter-offer names them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionNegotiator {
    allowed_types: Vec<AllowedType>,
}

impl SessionNegotiator {
    /// Build a negotiator from wire names.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiatorError::Empty`] for an empty list, or the error of
    /// the first invalid pair.
    pub fn new<A, S>(allowed_types: &[(A, S)]) -> Result<Self, NegotiatorError>
    where
        A: AsRef<str>,
        S: AsRef<str>,
    {
        let entries: Vec<_> = allowed_types
            .iter()
            .map(|(a, s)| (a.as_ref(), Some(s.as_ref())))
            .collect();
        Self::from_entries(&entries)
    }

    /// Build a negotiator from wire names, where an omitted session type
    /// allows every session type valid for the association type.
    ///
    /// # Errors
    ///
    /// Same conditions as [`SessionNegotiator::new`].
    pub fn from_entries(entries: &[(&str, Option<&str>)]) -> Result<Self, NegotiatorError> {
        let mut negotiator = Self {
            allowed_types: Vec::with_capacity(entries.len()),
        };
        for (assoc_type, session_type) in entries {
            negotiator.add_allowed_type(assoc_type, *session_type)?;
        }
        if negotiator.allowed_types.is_empty() {
            return Err(NegotiatorError::Empty);
        }
        Ok(negotiator)
    }

    /// Build a negotiator from already-typed pairs.
    ///
    /// # Errors
    ///
    /// Same conditions as [`SessionNegotiator::new`].
    pub fn from_pairs(pairs: &[AllowedType]) -> Result<Self, NegotiatorError> {
        let named: Vec<_> = pairs
            .iter()
            .map(|(a, s)| (a.as_str(), s.as_str()))
            .collect();
        Self::new(&named)
    }

    /// Negotiator that only accepts Diffie-Hellman sessions.
    #[must_use]
    pub fn encrypted_only() -> Self {
        Self {
            allowed_types: ENCRYPTED_ASSOCIATION_ORDER.to_vec(),
        }
    }

    /// Add an allowed pair.
    ///
    /// With `session_type` omitted, every session type valid for
    /// `assoc_type` is added, strongest first.
    ///
    /// # Errors
    ///
    /// - [`NegotiatorError::UnknownAssocType`] if `assoc_type` admits no session types
    /// - [`NegotiatorError::InvalidSessionType`] if `session_type` cannot carry it
    pub fn add_allowed_type(
        &mut self,
        assoc_type: &str,
        session_type: Option<&str>,
    ) -> Result<(), NegotiatorError> {
        let parsed = AssocType::parse(assoc_type)
            .ok_or_else(|| NegotiatorError::UnknownAssocType(assoc_type.to_string()))?;

        match session_type {
            None => {
                for session_type in parsed.session_types() {
                    self.push_unique((parsed, *session_type));
                }
            }
            Some(name) => {
                let session = SessionType::parse(name)
                    .filter(|s| s.is_valid_for(parsed))
                    .ok_or_else(|| NegotiatorError::InvalidSessionType {
                        assoc_type: assoc_type.to_string(),
                        session_type: name.to_string(),
                    })?;
                self.push_unique((parsed, session));
            }
        }
        Ok(())
    }

    fn push_unique(&mut self, pair: AllowedType) {
        if !self.allowed_types.contains(&pair) {
            self.allowed_types.push(pair);
        }
    }

    /// Whether a provider-proposed pair is acceptable.
    ///
    /// Unknown wire names are never allowed.
    #[must_use]
    pub fn is_allowed(&self, assoc_type: &str, session_type: &str) -> bool {
        match (AssocType::parse(assoc_type), SessionType::parse(session_type)) {
            (Some(a), Some(s)) => s.is_valid_for(a) && self.allowed_types.contains(&(a, s)),
            _ => false,
        }
    }

    /// The most preferred pair.
    #[must_use]
    pub fn preferred(&self) -> AllowedType {
        // Non-empty by construction.
        self.allowed_types[0]
    }

    /// The first allowed pair for `assoc_type`, if any.
    #[must_use]
    pub fn allowed_type_for(&self, assoc_type: AssocType) -> Option<AllowedType> {
        self.allowed_types
            .iter()
            .copied()
            .find(|(a, _)| *a == assoc_type)
    }

    /// The first allowed pair accepted by `filter`.
    #[must_use]
    pub fn first_matching(&self, filter: impl Fn(&AllowedType) -> bool) -> Option<AllowedType> {
        self.allowed_types.iter().copied().find(|pair| filter(pair))
    }

    /// All allowed pairs in preference order.
    #[must_use]
    pub fn allowed_types(&self) -> &[AllowedType] {
        &self.allowed_types
    }
}

impl Default for SessionNegotiator {
    fn default() -> Self {
        Self {
            allowed_types: DEFAULT_ASSOCIATION_ORDER.to_vec(),
        }
    }
}
