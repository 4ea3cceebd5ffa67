//! Diffie-Hellman key agreement over the OpenID default group.

use base64::prelude::*;
use num_bigint::BigUint;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::error::ProtocolError;

/// Default 1024-bit prime modulus (big-endian), shared by all sessions unless
/// a provider is configured with alternate parameters.
pub const DEFAULT_MODULUS: [u8; 128] = [
    0xdc, 0xf9, 0x3a, 0x0b, 0x88, 0x39, 0x72, 0xec, 0x0e, 0x19, 0x98, 0x9a, 0xc5, 0xa2, 0xce, 0x31,
    0x0e, 0x1d, 0x37, 0x71, 0x7e, 0x8d, 0x95, 0x71, 0xbb, 0x76, 0x23, 0x73, 0x18, 0x66, 0xe6, 0x1e,
    0xf7, 0x5a, 0x2e, 0x27, 0x89, 0x8b, 0x05, 0x7f, 0x98, 0x91, 0xc2, 0xe2, 0x7a, 0x63, 0x9c, 0x3f,
    0x29, 0xb6, 0x08, 0x14, 0x58, 0x1c, 0xd3, 0xb2, 0xca, 0x39, 0x86, 0xd2, 0x68, 0x37, 0x05, 0x57,
    0x7d, 0x45, 0xc2, 0xe7, 0xe5, 0x2d, 0xc8, 0x1c, 0x7a, 0x17, 0x18, 0x76, 0xe5, 0xce, 0xa7, 0x4b,
    0x14, 0x48, 0xbf, 0xdf, 0xaf, 0x18, 0x82, 0x8e, 0xfd, 0x25, 0x19, 0xf1, 0x4e, 0x45, 0xe3, 0x82,
    0x66, 0x34, 0xaf, 0x19, 0x49, 0xe5, 0xb5, 0x35, 0xcc, 0x82, 0x9a, 0x48, 0x3b, 0x8a, 0x76, 0x22,
    0x3e, 0x5d, 0x49, 0x0a, 0x25, 0x7f, 0x05, 0xbd, 0xff, 0x16, 0xf2, 0xfb, 0x22, 0xc5, 0x83, 0xab,
];

/// Default generator.
pub const DEFAULT_GENERATOR: u32 = 2;

/// Extra random bytes drawn beyond the modulus size so that the reduction
/// into `[1, p-2]` has negligible bias.
const EXPONENT_OVERSAMPLE: usize = 8;

/// Digest applied to the shared secret before it masks the MAC key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhDigest {
    Sha1,
    Sha256,
}

impl DhDigest {
    /// Output size in bytes.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
        }
    }

    #[must_use]
    pub fn hash(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha1 => Sha1::digest(data).to_vec(),
            Self::Sha256 => Sha256::digest(data).to_vec(),
        }
    }
}

/// One side of a Diffie-Hellman exchange.
///
/// # Security
///
/// - The private exponent is drawn from a CSPRNG and zeroized on drop
/// - No `Debug` implementation prints the private exponent
/// - A fresh instance must be used for every negotiation attempt
pub struct DiffieHellman {
    modulus: BigUint,
    generator: BigUint,
    /// Big-endian private exponent.
    private: Zeroizing<Vec<u8>>,
    public: BigUint,
}

impl DiffieHellman {
    /// Default group, private exponent from the OS RNG.
    #[must_use]
    pub fn from_defaults() -> Self {
        Self::generate(&mut OsRng)
    }

    /// Default group, private exponent from `rng`.
    #[must_use]
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self::with_params(default_modulus(), BigUint::from(DEFAULT_GENERATOR), rng)
    }

    /// Custom group parameters.
    ///
    /// The private exponent is uniform (up to negligible bias) in `[1, p-2]`.
    #[must_use]
    pub fn with_params<R: RngCore + CryptoRng>(
        modulus: BigUint,
        generator: BigUint,
        rng: &mut R,
    ) -> Self {
        let mut bytes = Zeroizing::new(vec![0u8; modulus.to_bytes_be().len() + EXPONENT_OVERSAMPLE]);
        rng.fill_bytes(&mut bytes);

        let one = BigUint::from(1u32);
        let two = BigUint::from(2u32);
        let range = if modulus > two {
            &modulus - &two
        } else {
            one.clone()
        };
        let private = BigUint::from_bytes_be(&bytes) % range + &one;
        Self::from_private(modulus, generator, &private)
    }

    fn from_private(modulus: BigUint, generator: BigUint, private: &BigUint) -> Self {
        let public = generator.modpow(private, &modulus);
        Self {
            modulus,
            generator,
            private: Zeroizing::new(private.to_bytes_be()),
            public,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_private_key(private: u64) -> Self {
        Self::from_private(
            default_modulus(),
            BigUint::from(DEFAULT_GENERATOR),
            &BigUint::from(private),
        )
    }

    #[must_use]
    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    #[must_use]
    pub fn generator(&self) -> &BigUint {
        &self.generator
    }

    /// `g^x mod p`.
    #[must_use]
    pub fn public_key(&self) -> &BigUint {
        &self.public
    }

    /// Whether the default modulus and generator are in use.
    #[must_use]
    pub fn uses_default_params(&self) -> bool {
        self.modulus == default_modulus() && self.generator == BigUint::from(DEFAULT_GENERATOR)
    }

    /// `composite^x mod p`.
    #[must_use]
    pub fn shared_secret(&self, composite: &BigUint) -> BigUint {
        let private = BigUint::from_bytes_be(&self.private);
        composite.modpow(&private, &self.modulus)
    }

    /// Mask or unmask `secret` with `H(btwoc(composite^x mod p))`.
    ///
    /// The operation is its own inverse: a provider uses it to encrypt the
    /// MAC key and the relying party uses it to recover it.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::SecretLength`] if `secret` is not exactly
    /// one digest long.
    pub fn xor_secret(
        &self,
        composite: &BigUint,
        secret: &[u8],
        digest: DhDigest,
    ) -> Result<Vec<u8>, ProtocolError> {
        if secret.len() != digest.size() {
            return Err(ProtocolError::SecretLength {
                expected: digest.size(),
                actual: secret.len(),
            });
        }
        let shared = Zeroizing::new(btwoc(&self.shared_secret(composite)));
        let mask = Zeroizing::new(digest.hash(&shared));
        Ok(secret.iter().zip(mask.iter()).map(|(s, m)| s ^ m).collect())
    }
}

/// The default modulus as a big integer.
#[must_use]
pub fn default_modulus() -> BigUint {
    BigUint::from_bytes_be(&DEFAULT_MODULUS)
}

/// Big-endian two's-complement encoding of a non-negative integer.
///
/// A zero byte is prepended when the high bit is set so the value is not
/// read back as negative.
#[must_use]
pub fn btwoc(value: &BigUint) -> Vec<u8> {
    let bytes = value.to_bytes_be();
    if bytes[0] & 0x80 != 0 {
        let mut padded = Vec::with_capacity(bytes.len() + 1);
        padded.push(0);
        padded.extend_from_slice(&bytes);
        padded
    } else {
        bytes
    }
}

/// Base64 of [`btwoc`].
#[must_use]
pub fn long_to_base64(value: &BigUint) -> String {
    BASE64_STANDARD.encode(btwoc(value))
}

/// Decode a base64 two's-complement integer.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidBase64`] tagged with `field`.
pub fn base64_to_long(encoded: &str, field: &'static str) -> Result<BigUint, ProtocolError> {
    let bytes = BASE64_STANDARD
        .decode(encoded)
        .map_err(|_| ProtocolError::InvalidBase64 { field })?;
    Ok(BigUint::from_bytes_be(&bytes))
}
