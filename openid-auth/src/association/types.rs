//! Association and session type identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Signing algorithm of an association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssocType {
    #[serde(rename = "HMAC-SHA1")]
    HmacSha1,
    #[serde(rename = "HMAC-SHA256")]
    HmacSha256,
}

impl AssocType {
    /// All supported association types.
    pub const ALL: [AssocType; 2] = [AssocType::HmacSha1, AssocType::HmacSha256];

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HmacSha1 => "HMAC-SHA1",
            Self::HmacSha256 => "HMAC-SHA256",
        }
    }

    /// Parse a wire name. Unknown names yield `None`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "HMAC-SHA1" => Some(Self::HmacSha1),
            "HMAC-SHA256" => Some(Self::HmacSha256),
            _ => None,
        }
    }

    /// Secret length in bytes, equal to the digest output size.
    #[must_use]
    pub const fn secret_size(self) -> usize {
        match self {
            Self::HmacSha1 => 20,
            Self::HmacSha256 => 32,
        }
    }

    /// Session types able to carry this association type, strongest first.
    #[must_use]
    pub const fn session_types(self) -> &'static [SessionType] {
        match self {
            Self::HmacSha1 => &[SessionType::DhSha1, SessionType::NoEncryption],
            Self::HmacSha256 => &[SessionType::DhSha256, SessionType::NoEncryption],
        }
    }
}

impl fmt::Display for AssocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key-exchange mechanism used to transmit an association secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionType {
    #[serde(rename = "no-encryption")]
    NoEncryption,
    #[serde(rename = "DH-SHA1")]
    DhSha1,
    #[serde(rename = "DH-SHA256")]
    DhSha256,
}

impl SessionType {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoEncryption => "no-encryption",
            Self::DhSha1 => "DH-SHA1",
            Self::DhSha256 => "DH-SHA256",
        }
    }

    /// Parse a wire name. Unknown names yield `None`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "no-encryption" => Some(Self::NoEncryption),
            "DH-SHA1" => Some(Self::DhSha1),
            "DH-SHA256" => Some(Self::DhSha256),
            _ => None,
        }
    }

    /// Whether this session type may carry `assoc_type`.
    #[must_use]
    pub fn is_valid_for(self, assoc_type: AssocType) -> bool {
        assoc_type.session_types().contains(&self)
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_parse_back() {
        for assoc_type in AssocType::ALL {
            assert_eq!(AssocType::parse(assoc_type.as_str()), Some(assoc_type));
            for session_type in assoc_type.session_types() {
                assert_eq!(SessionType::parse(session_type.as_str()), Some(*session_type));
            }
        }
        assert_eq!(AssocType::parse("HMAC-MD5"), None);
        assert_eq!(SessionType::parse(""), None);
    }

    #[test]
    fn test_dh_session_matches_digest_strength() {
        assert!(SessionType::DhSha1.is_valid_for(AssocType::HmacSha1));
        assert!(!SessionType::DhSha1.is_valid_for(AssocType::HmacSha256));
        assert!(SessionType::DhSha256.is_valid_for(AssocType::HmacSha256));
        assert!(!SessionType::DhSha256.is_valid_for(AssocType::HmacSha1));
        assert!(SessionType::NoEncryption.is_valid_for(AssocType::HmacSha1));
        assert!(SessionType::NoEncryption.is_valid_for(AssocType::HmacSha256));
    }
}
