//! The association negotiation protocol.
//!
//! One request is made with the negotiator's most preferred pair. If an
//! OpenID 2 provider rejects it with `unsupported-type` and proposes a pair
//! the negotiator also allows, that pair is tried exactly once more.
//! Successful negotiation is silent; every failure is logged once.

use chrono::Utc;
use openid_auth::association::{AllowedType, AssocType, Association, SessionNegotiator, SessionType};
use openid_auth::dh::ConsumerSession;
use openid_auth::kv::KvFields;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::store::AssociationStore;

use super::endpoint::{AssociationTransport, ProviderEndpoint, ProviderReply, ProtocolVersion};
use super::error::NegotiationError;
use super::request::{
    associate_request, extract_association, ASSOC_TYPE, ERROR, ERROR_CODE, SESSION_TYPE,
    UNSUPPORTED_TYPE,
};

/// Outcome of a single associate request that did not yield an association.
enum AttemptError {
    /// The provider answered with an error message.
    Rejected(KvFields),
    /// Transport or decoding failure; already logged.
    Failed(NegotiationError),
}

/// Whether a pair can be requested from a provider speaking `version`.
///
/// OpenID 1 only knows HMAC-SHA1 over DH-SHA1 or no encryption.
#[must_use]
pub fn usable_with(version: ProtocolVersion, (assoc_type, session_type): AllowedType) -> bool {
    match version {
        ProtocolVersion::V2 => true,
        ProtocolVersion::V1 => {
            assoc_type == AssocType::HmacSha1
                && matches!(session_type, SessionType::DhSha1 | SessionType::NoEncryption)
        }
    }
}

/// Negotiate an association using the OS RNG and the current time.
///
/// # Errors
///
/// Returns the [`NegotiationError`] describing why no association was
/// established. The same failure has already been logged.
pub fn negotiate<T>(
    endpoint: &ProviderEndpoint,
    negotiator: &SessionNegotiator,
    transport: &T,
) -> Result<Association, NegotiationError>
where
    T: AssociationTransport + ?Sized,
{
    negotiate_with_rng(
        endpoint,
        negotiator,
        transport,
        &mut OsRng,
        Utc::now().timestamp(),
    )
}

/// Negotiate an association with an explicit RNG and issue time.
///
/// At most two requests are sent.
///
/// # Errors
///
/// Same as [`negotiate`].
pub fn negotiate_with_rng<T, R>(
    endpoint: &ProviderEndpoint,
    negotiator: &SessionNegotiator,
    transport: &T,
    rng: &mut R,
    now: i64,
) -> Result<Association, NegotiationError>
where
    T: AssociationTransport + ?Sized,
    R: RngCore + CryptoRng,
{
    let Some((assoc_type, session_type)) =
        negotiator.first_matching(|pair| usable_with(endpoint.version, *pair))
    else {
        tracing::error!(
            server_url = %endpoint.server_url,
            version = %endpoint.version,
            "No allowed association type is usable with this server"
        );
        return Err(NegotiationError::NoCompatibleType {
            server_url: endpoint.server_url.clone(),
        });
    };

    let rejection = match request_association(endpoint, assoc_type, session_type, transport, rng, now)
    {
        Ok(assoc) => return Ok(assoc),
        Err(AttemptError::Failed(err)) => return Err(err),
        Err(AttemptError::Rejected(fields)) => fields,
    };

    let (assoc_type, session_type) =
        supported_association_type(endpoint, negotiator, assoc_type, &rejection)?;

    match request_association(endpoint, assoc_type, session_type, transport, rng, now) {
        Ok(assoc) => Ok(assoc),
        Err(AttemptError::Failed(err)) => Err(err),
        Err(AttemptError::Rejected(fields)) => {
            tracing::error!(
                server_url = %endpoint.server_url,
                %session_type,
                %assoc_type,
                error_code = fields.get(ERROR_CODE).unwrap_or_default(),
                "Server refused its suggested association type"
            );
            Err(NegotiationError::RetryRefused {
                server_url: endpoint.server_url.clone(),
                assoc_type: assoc_type.as_str().to_string(),
                session_type: session_type.as_str().to_string(),
            })
        }
    }
}

/// [`negotiate`], discarding the failure detail.
#[must_use]
pub fn negotiate_association<T>(
    endpoint: &ProviderEndpoint,
    negotiator: &SessionNegotiator,
    transport: &T,
) -> Option<Association>
where
    T: AssociationTransport + ?Sized,
{
    negotiate(endpoint, negotiator, transport).ok()
}

/// Reuse the stored association for the endpoint, or negotiate a new one.
///
/// A stored association is reused only while it has time left; an expired
/// one is removed from the store. A freshly negotiated association is
/// stored before it is returned.
pub fn get_association<T, S>(
    endpoint: &ProviderEndpoint,
    negotiator: &SessionNegotiator,
    transport: &T,
    store: &S,
) -> Option<Association>
where
    T: AssociationTransport + ?Sized,
    S: AssociationStore + ?Sized,
{
    let now = Utc::now().timestamp();
    if let Some(assoc) = store.get_association(&endpoint.server_url, None) {
        if !assoc.is_expired(now) {
            return Some(assoc);
        }
        store.remove_association(&endpoint.server_url, assoc.handle());
    }

    let assoc = negotiate_association(endpoint, negotiator, transport)?;
    store.store_association(&endpoint.server_url, assoc.clone());
    Some(assoc)
}

/// Send one associate request and interpret the reply.
fn request_association<T, R>(
    endpoint: &ProviderEndpoint,
    assoc_type: AssocType,
    session_type: SessionType,
    transport: &T,
    rng: &mut R,
    now: i64,
) -> Result<Association, AttemptError>
where
    T: AssociationTransport + ?Sized,
    R: RngCore + CryptoRng,
{
    let session = ConsumerSession::with_rng(session_type, rng);
    let request = associate_request(endpoint, assoc_type, &session);

    let reply = transport
        .send_association_request(endpoint, &request)
        .map_err(|source| {
            tracing::error!(
                server_url = %endpoint.server_url,
                error = %source,
                "Associate request failed"
            );
            AttemptError::Failed(NegotiationError::Transport {
                server_url: endpoint.server_url.clone(),
                source,
            })
        })?;

    match reply {
        ProviderReply::Error(fields) => Err(AttemptError::Rejected(fields)),
        ProviderReply::Success(fields) => extract_association(endpoint, &session, &fields, now)
            .map_err(|source| {
                tracing::error!(
                    server_url = %endpoint.server_url,
                    error = %source,
                    "Server error when requesting an association"
                );
                AttemptError::Failed(NegotiationError::Protocol {
                    server_url: endpoint.server_url.clone(),
                    source,
                })
            }),
    }
}

/// The pair proposed in an error reply, if the protocol permits a retry
/// with it.
fn supported_association_type(
    endpoint: &ProviderEndpoint,
    negotiator: &SessionNegotiator,
    requested: AssocType,
    reply: &KvFields,
) -> Result<AllowedType, NegotiationError> {
    let error_code = reply.get(ERROR_CODE);
    let error = reply.get(ERROR).unwrap_or_default();

    if error_code != Some(UNSUPPORTED_TYPE) || endpoint.is_openid1() {
        tracing::error!(
            server_url = %endpoint.server_url,
            error_code = error_code.unwrap_or_default(),
            error,
            "Server error when requesting an association"
        );
        return Err(NegotiationError::ServerError {
            server_url: endpoint.server_url.clone(),
            error_code: error_code.map(str::to_string),
            error: error.to_string(),
        });
    }

    tracing::warn!(
        server_url = %endpoint.server_url,
        assoc_type = %requested,
        error,
        "Unsupported association type"
    );

    let (Some(assoc_type), Some(session_type)) = (reply.get(ASSOC_TYPE), reply.get(SESSION_TYPE))
    else {
        tracing::warn!(
            server_url = %endpoint.server_url,
            "Server responded with unsupported association session but did not supply a fallback"
        );
        return Err(NegotiationError::NoFallback {
            server_url: endpoint.server_url.clone(),
        });
    };

    let proposed = AssocType::parse(assoc_type)
        .zip(SessionType::parse(session_type))
        .filter(|_| negotiator.is_allowed(assoc_type, session_type));
    let Some(pair) = proposed else {
        tracing::warn!(
            server_url = %endpoint.server_url,
            session_type,
            assoc_type,
            "Server sent unsupported session/association type"
        );
        return Err(NegotiationError::PolicyViolation {
            server_url: endpoint.server_url.clone(),
            assoc_type: assoc_type.to_string(),
            session_type: session_type.to_string(),
        });
    };
    Ok(pair)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openid2_accepts_every_pair() {
        for pair in SessionNegotiator::default().allowed_types() {
            assert!(usable_with(ProtocolVersion::V2, *pair));
        }
    }

    #[test]
    fn test_openid1_only_sha1() {
        assert!(usable_with(
            ProtocolVersion::V1,
            (AssocType::HmacSha1, SessionType::DhSha1)
        ));
        assert!(usable_with(
            ProtocolVersion::V1,
            (AssocType::HmacSha1, SessionType::NoEncryption)
        ));
        assert!(!usable_with(
            ProtocolVersion::V1,
            (AssocType::HmacSha256, SessionType::DhSha256)
        ));
        assert!(!usable_with(
            ProtocolVersion::V1,
            (AssocType::HmacSha256, SessionType::NoEncryption)
        ));
    }
}
