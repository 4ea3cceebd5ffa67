//! Diffie-Hellman key exchange for association sessions.
//!
//! - [`DiffieHellman`] - modular exponentiation over the default (or a custom) group
//! - [`ConsumerSession`] - request fields and secret recovery per session type
//! - [`ProtocolError`] - undecipherable provider replies

mod diffie_hellman;
mod error;
mod session;

pub use diffie_hellman::{
    base64_to_long, btwoc, default_modulus, long_to_base64, DhDigest, DiffieHellman,
    DEFAULT_GENERATOR, DEFAULT_MODULUS,
};
pub use error::ProtocolError;
pub use session::{
    ConsumerSession, DH_CONSUMER_PUBLIC, DH_GEN, DH_MODULUS, DH_SERVER_PUBLIC, ENC_MAC_KEY,
    MAC_KEY,
};
