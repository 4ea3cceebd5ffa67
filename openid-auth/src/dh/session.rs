//! Consumer-side association sessions.
//!
//! A session produces the key-exchange fields of an associate request and
//! recovers the MAC key from the provider's reply.

use base64::prelude::*;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::association::{AssocType, SessionType};
use crate::kv::KvFields;

use super::diffie_hellman::{base64_to_long, long_to_base64, DhDigest, DiffieHellman};
use super::error::ProtocolError;

/// Request field carrying the consumer's public DH value.
pub const DH_CONSUMER_PUBLIC: &str = "dh_consumer_public";
/// Request field carrying a non-default modulus.
pub const DH_MODULUS: &str = "dh_modulus";
/// Request field carrying a non-default generator.
pub const DH_GEN: &str = "dh_gen";
/// Reply field carrying the provider's public DH value.
pub const DH_SERVER_PUBLIC: &str = "dh_server_public";
/// Reply field carrying the DH-masked MAC key.
pub const ENC_MAC_KEY: &str = "enc_mac_key";
/// Reply field carrying the plain MAC key.
pub const MAC_KEY: &str = "mac_key";

/// The consumer's half of an association session.
pub enum ConsumerSession {
    /// Secret is sent in the clear (over TLS, one hopes).
    NoEncryption,
    /// Secret is masked with a digest of the DH shared secret.
    DiffieHellman { digest: DhDigest, dh: DiffieHellman },
}

impl ConsumerSession {
    /// Session for `session_type` with a fresh exponent from the OS RNG.
    #[must_use]
    pub fn new(session_type: SessionType) -> Self {
        Self::with_rng(session_type, &mut OsRng)
    }

    /// Session for `session_type` with a fresh exponent from `rng`.
    #[must_use]
    pub fn with_rng<R: RngCore + CryptoRng>(session_type: SessionType, rng: &mut R) -> Self {
        match session_type {
            SessionType::NoEncryption => Self::NoEncryption,
            SessionType::DhSha1 => Self::DiffieHellman {
                digest: DhDigest::Sha1,
                dh: DiffieHellman::generate(rng),
            },
            SessionType::DhSha256 => Self::DiffieHellman {
                digest: DhDigest::Sha256,
                dh: DiffieHellman::generate(rng),
            },
        }
    }

    #[must_use]
    pub fn session_type(&self) -> SessionType {
        match self {
            Self::NoEncryption => SessionType::NoEncryption,
            Self::DiffieHellman {
                digest: DhDigest::Sha1,
                ..
            } => SessionType::DhSha1,
            Self::DiffieHellman {
                digest: DhDigest::Sha256,
                ..
            } => SessionType::DhSha256,
        }
    }

    /// Association types this session can deliver.
    #[must_use]
    pub fn allowed_assoc_types(&self) -> &'static [AssocType] {
        match self.session_type() {
            SessionType::NoEncryption => &AssocType::ALL,
            SessionType::DhSha1 => &[AssocType::HmacSha1],
            SessionType::DhSha256 => &[AssocType::HmacSha256],
        }
    }

    /// Key-exchange fields for the associate request.
    ///
    /// Modulus and generator are only sent when they differ from the defaults.
    #[must_use]
    pub fn request_fields(&self) -> KvFields {
        let mut fields = KvFields::new();
        if let Self::DiffieHellman { dh, .. } = self {
            fields.insert(DH_CONSUMER_PUBLIC, long_to_base64(dh.public_key()));
            if !dh.uses_default_params() {
                fields.insert(DH_MODULUS, long_to_base64(dh.modulus()));
                fields.insert(DH_GEN, long_to_base64(dh.generator()));
            }
        }
        fields
    }

    /// Recover the MAC key from the provider's reply.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] if a required field is missing, is not
    /// valid base64, or the masked key has the wrong length.
    pub fn extract_secret(&self, response: &KvFields) -> Result<Vec<u8>, ProtocolError> {
        match self {
            Self::NoEncryption => decode_field(response, MAC_KEY),
            Self::DiffieHellman { digest, dh } => {
                let server_public = base64_to_long(required(response, DH_SERVER_PUBLIC)?, DH_SERVER_PUBLIC)?;
                let enc_mac_key = decode_field(response, ENC_MAC_KEY)?;
                dh.xor_secret(&server_public, &enc_mac_key, *digest)
            }
        }
    }
}

fn required<'a>(fields: &'a KvFields, key: &'static str) -> Result<&'a str, ProtocolError> {
    fields.get(key).ok_or(ProtocolError::MissingField(key))
}

fn decode_field(fields: &KvFields, key: &'static str) -> Result<Vec<u8>, ProtocolError> {
    BASE64_STANDARD
        .decode(required(fields, key)?)
        .map_err(|_| ProtocolError::InvalidBase64 { field: key })
}
