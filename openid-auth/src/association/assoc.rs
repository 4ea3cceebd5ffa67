//! The association entity: a shared signing key with a provider.

use base64::prelude::*;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::kv::{encode_kv, parse_kv};

use super::error::AssociationError;
use super::types::AssocType;

/// Field order of the serialized form.
const SERIALIZED_KEYS: [&str; 6] = ["version", "handle", "secret", "issued", "lifetime", "assoc_type"];

/// Version tag written by [`Association::serialize`].
const SERIALIZATION_VERSION: &str = "2";

/// Zeroize-on-drop holder for the MAC key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
struct MacKey(Vec<u8>);

/// A shared secret established with an identity provider.
///
/// # Security
///
/// - The secret is zeroized on drop
/// - `Debug` redacts the secret
/// - Equality and signature checks compare in constant time
///
/// Associations are immutable; a new one is negotiated when this one expires
/// or is invalidated by the provider.
#[derive(Clone)]
pub struct Association {
    handle: String,
    secret: MacKey,
    issued: i64,
    lifetime: i64,
    assoc_type: AssocType,
}

impl Association {
    /// Create an association.
    ///
    /// # Errors
    ///
    /// Returns [`AssociationError::SecretLength`] if the secret length does
    /// not equal the digest size of `assoc_type`.
    pub fn new(
        handle: impl Into<String>,
        secret: Vec<u8>,
        issued: i64,
        lifetime: i64,
        assoc_type: AssocType,
    ) -> Result<Self, AssociationError> {
        let expected = assoc_type.secret_size();
        if secret.len() != expected {
            return Err(AssociationError::SecretLength {
                assoc_type: assoc_type.as_str(),
                expected,
                actual: secret.len(),
            });
        }
        Ok(Self {
            handle: handle.into(),
            secret: MacKey(secret),
            issued,
            lifetime,
            assoc_type,
        })
    }

    /// Create an association issued at `now` that expires in `expires_in` seconds.
    ///
    /// # Errors
    ///
    /// Same as [`Association::new`].
    pub fn from_expires_in(
        expires_in: i64,
        handle: impl Into<String>,
        secret: Vec<u8>,
        assoc_type: AssocType,
        now: i64,
    ) -> Result<Self, AssociationError> {
        Self::new(handle, secret, now, expires_in, assoc_type)
    }

    #[must_use]
    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// Raw secret bytes. Do not log.
    #[must_use]
    pub fn secret(&self) -> &[u8] {
        &self.secret.0
    }

    /// Issue time (Unix seconds).
    #[must_use]
    pub fn issued(&self) -> i64 {
        self.issued
    }

    /// Lifetime in seconds relative to [`Association::issued`].
    #[must_use]
    pub fn lifetime(&self) -> i64 {
        self.lifetime
    }

    #[must_use]
    pub fn assoc_type(&self) -> AssocType {
        self.assoc_type
    }

    /// Seconds remaining at `now`, never negative.
    #[must_use]
    pub fn expires_in(&self, now: i64) -> i64 {
        self.issued
            .saturating_add(self.lifetime)
            .saturating_sub(now)
            .max(0)
    }

    #[must_use]
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_in(now) == 0
    }

    /// HMAC over the key-value form of `pairs`, in the given order.
    ///
    /// # Errors
    ///
    /// Returns an error if a pair cannot be written in key-value form.
    pub fn sign<K, V>(&self, pairs: &[(K, V)]) -> Result<Vec<u8>, AssociationError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let message = encode_kv(pairs)?;
        self.mac(message.as_bytes())
    }

    /// Check a base64 signature over `pairs` in constant time.
    ///
    /// Malformed base64 or unencodable pairs yield `false`.
    #[must_use]
    pub fn check_signature<K, V>(&self, pairs: &[(K, V)], signature_b64: &str) -> bool
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let Ok(presented) = BASE64_STANDARD.decode(signature_b64) else {
            return false;
        };
        match self.sign(pairs) {
            Ok(expected) => expected.ct_eq(&presented).into(),
            Err(_) => false,
        }
    }

    fn mac(&self, message: &[u8]) -> Result<Vec<u8>, AssociationError> {
        let key_error = |_| AssociationError::SecretLength {
            assoc_type: self.assoc_type.as_str(),
            expected: self.assoc_type.secret_size(),
            actual: self.secret.0.len(),
        };
        let tag = match self.assoc_type {
            AssocType::HmacSha1 => {
                let mut mac = <Hmac<Sha1> as Mac>::new_from_slice(&self.secret.0).map_err(key_error)?;
                mac.update(message);
                mac.finalize().into_bytes().to_vec()
            }
            AssocType::HmacSha256 => {
                let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(&self.secret.0).map_err(key_error)?;
                mac.update(message);
                mac.finalize().into_bytes().to_vec()
            }
        };
        Ok(tag)
    }

    /// Serialize for an association store.
    ///
    /// Format is key-value form with the keys `version`, `handle`, `secret`
    /// (base64), `issued`, `lifetime` and `assoc_type`, in that order.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle contains a newline.
    pub fn serialize(&self) -> Result<String, AssociationError> {
        let secret = BASE64_STANDARD.encode(&self.secret.0);
        let issued = self.issued.to_string();
        let lifetime = self.lifetime.to_string();
        let values = [
            SERIALIZATION_VERSION,
            self.handle.as_str(),
            secret.as_str(),
            issued.as_str(),
            lifetime.as_str(),
            self.assoc_type.as_str(),
        ];
        let pairs: Vec<_> = SERIALIZED_KEYS.iter().copied().zip(values).collect();
        Ok(encode_kv(&pairs)?)
    }

    /// Inverse of [`Association::serialize`].
    ///
    /// # Errors
    ///
    /// Returns an error if keys are missing, out of order, or carry invalid values.
    pub fn deserialize(text: &str) -> Result<Self, AssociationError> {
        let pairs = parse_kv(text)?;
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        if keys != SERIALIZED_KEYS {
            return Err(AssociationError::Malformed(format!(
                "unexpected keys: {keys:?}"
            )));
        }
        let value = |i: usize| pairs[i].1.as_str();

        if value(0) != SERIALIZATION_VERSION {
            return Err(AssociationError::Malformed(format!(
                "unknown version {:?}",
                value(0)
            )));
        }
        let secret = BASE64_STANDARD
            .decode(value(2))
            .map_err(|_| AssociationError::Malformed("secret is not base64".to_string()))?;
        let issued = value(3)
            .parse()
            .map_err(|_| AssociationError::InvalidNumber { field: "issued" })?;
        let lifetime = value(4)
            .parse()
            .map_err(|_| AssociationError::InvalidNumber { field: "lifetime" })?;
        let assoc_type = AssocType::parse(value(5))
            .ok_or_else(|| AssociationError::UnknownAssocType(value(5).to_string()))?;

        Self::new(value(1), secret, issued, lifetime, assoc_type)
    }
}

impl PartialEq for Association {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
            && self.issued == other.issued
            && self.lifetime == other.lifetime
            && self.assoc_type == other.assoc_type
            && bool::from(self.secret.0.ct_eq(&other.secret.0))
    }
}

impl Eq for Association {}

impl std::fmt::Debug for Association {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Association")
            .field("handle", &self.handle)
            .field("secret", &"[redacted]")
            .field("issued", &self.issued)
            .field("lifetime", &self.lifetime)
            .field("assoc_type", &self.assoc_type)
            .finish()
    }
}
