//! Associations and session type negotiation.
//!
//! An [`Association`] is the shared MAC key a relying party holds with a
//! provider. The [`SessionNegotiator`] decides which association and session
//! types the relying party proposes, and which counter-offers it accepts.

mod assoc;
mod error;
mod negotiator;
mod types;

pub use assoc::Association;
pub use error::{AssociationError, NegotiatorError};
pub use negotiator::{
    AllowedType, SessionNegotiator, DEFAULT_ASSOCIATION_ORDER, ENCRYPTED_ASSOCIATION_ORDER,
};
pub use types::{AssocType, SessionType};
