//! Consumer configuration.
//!
//! ```toml
//! [nonce]
//! allowed_skew_secs = 18000
//! salt_length = 6
//!
//! [association]
//! preset = "encrypted-only"
//!
//! # or an explicit preference list, which overrides the preset:
//! [[association.allowed]]
//! assoc_type = "HMAC-SHA256"
//! session_type = "DH-SHA256"
//!
//! [[association.allowed]]
//! assoc_type = "HMAC-SHA1"      # every valid session type
//! ```

use std::path::Path;

use chrono::Utc;
use openid_auth::association::{AssocType, NegotiatorError, SessionNegotiator, SessionType};
use openid_auth::nonce::{self, DEFAULT_SALT_LENGTH, SKEW};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::store::MemoryNonceStore;

/// Errors raised while loading or applying a configuration.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// The TOML is malformed or has unknown fields.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be written back as TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The skew must be positive.
    #[error("allowed_skew_secs must be positive, got {0}")]
    InvalidSkew(i64),

    /// An allowed association pair is invalid.
    #[error("invalid association type list: {0}")]
    Negotiator(#[from] NegotiatorError),
}

/// Top-level consumer configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsumerConfig {
    pub nonce: NonceConfig,
    pub association: AssociationConfig,
}

/// Response nonce settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NonceConfig {
    /// Accepted distance between a nonce timestamp and now, in seconds.
    pub allowed_skew_secs: i64,
    /// Length of generated salts.
    pub salt_length: usize,
}

impl Default for NonceConfig {
    fn default() -> Self {
        Self {
            allowed_skew_secs: SKEW,
            salt_length: DEFAULT_SALT_LENGTH,
        }
    }
}

impl NonceConfig {
    /// A fresh nonce for the current time.
    #[must_use]
    pub fn mk_nonce(&self) -> String {
        nonce::mk_nonce_at(Utc::now(), self.salt_length, &mut OsRng)
    }

    /// In-memory nonce store using the configured skew.
    #[must_use]
    pub fn memory_store(&self) -> MemoryNonceStore {
        MemoryNonceStore::new(self.allowed_skew_secs)
    }
}

/// Built-in preference orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssociationPreset {
    /// HMAC-SHA1 and HMAC-SHA256, Diffie-Hellman before plaintext.
    #[default]
    Default,
    /// Diffie-Hellman sessions only.
    EncryptedOnly,
}

/// One entry of an explicit preference list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AllowedPair {
    pub assoc_type: AssocType,
    /// Omit to allow every session type valid for `assoc_type`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_type: Option<SessionType>,
}

/// Which association types to propose and accept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssociationConfig {
    pub preset: AssociationPreset,
    /// Explicit preference list; overrides `preset` when non-empty.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<AllowedPair>,
}

impl AssociationConfig {
    /// Build the negotiator described by this section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Negotiator`] for a session type that cannot
    /// carry its association type. Unknown names are rejected while parsing.
    pub fn negotiator(&self) -> Result<SessionNegotiator, ConfigError> {
        if self.allowed.is_empty() {
            return Ok(match self.preset {
                AssociationPreset::Default => SessionNegotiator::default(),
                AssociationPreset::EncryptedOnly => SessionNegotiator::encrypted_only(),
            });
        }

        let entries: Vec<_> = self
            .allowed
            .iter()
            .map(|pair| (pair.assoc_type.as_str(), pair.session_type.map(SessionType::as_str)))
            .collect();
        Ok(SessionNegotiator::from_entries(&entries)?)
    }
}

impl ConsumerConfig {
    /// Parse a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys, and
    /// the validation errors of [`ConsumerConfig::validate`].
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, otherwise
    /// the errors of [`ConsumerConfig::from_toml`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Serialize as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check values that the type system does not.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidSkew`] for a non-positive skew
    /// - [`ConfigError::Negotiator`] for an invalid association list
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nonce.allowed_skew_secs <= 0 {
            return Err(ConfigError::InvalidSkew(self.nonce.allowed_skew_secs));
        }
        self.association.negotiator()?;
        Ok(())
    }

    /// The configured session negotiator.
    ///
    /// # Errors
    ///
    /// Same as [`AssociationConfig::negotiator`].
    pub fn negotiator(&self) -> Result<SessionNegotiator, ConfigError> {
        self.association.negotiator()
    }
}
