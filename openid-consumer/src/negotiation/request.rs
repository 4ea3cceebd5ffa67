//! Associate request construction and reply decoding.

use openid_auth::association::{AssocType, Association, SessionType};
use openid_auth::dh::{ConsumerSession, ProtocolError};
use openid_auth::kv::KvFields;

use super::endpoint::{ProviderEndpoint, OPENID2_NS};

pub const MODE: &str = "mode";
pub const NS: &str = "ns";
pub const ASSOC_TYPE: &str = "assoc_type";
pub const ASSOC_HANDLE: &str = "assoc_handle";
pub const SESSION_TYPE: &str = "session_type";
pub const EXPIRES_IN: &str = "expires_in";
pub const ERROR: &str = "error";
pub const ERROR_CODE: &str = "error_code";

/// `error_code` a provider uses to reject an association or session type.
pub const UNSUPPORTED_TYPE: &str = "unsupported-type";

/// Fields of an associate request for `assoc_type` over `session`.
///
/// OpenID 1 requests carry no namespace, and omit `session_type` for
/// unencrypted sessions since OpenID 1 providers do not know that name.
#[must_use]
pub fn associate_request(
    endpoint: &ProviderEndpoint,
    assoc_type: AssocType,
    session: &ConsumerSession,
) -> KvFields {
    let mut fields = KvFields::new()
        .with(MODE, "associate")
        .with(ASSOC_TYPE, assoc_type.as_str());

    if !endpoint.is_openid1() {
        fields.insert(NS, OPENID2_NS);
    }
    if !(endpoint.is_openid1() && session.session_type() == SessionType::NoEncryption) {
        fields.insert(SESSION_TYPE, session.session_type().as_str());
    }
    fields.extend(session.request_fields());
    fields
}

/// Build an association from a provider's success reply.
///
/// Under OpenID 1 a missing or empty `session_type` means no encryption, and
/// a provider may answer a Diffie-Hellman request in plaintext.
///
/// # Errors
///
/// Returns a [`ProtocolError`] for missing fields, a non-integer
/// `expires_in`, a session type other than the one requested, an
/// association type the session cannot carry, or an unrecoverable secret.
pub fn extract_association(
    endpoint: &ProviderEndpoint,
    session: &ConsumerSession,
    reply: &KvFields,
    now: i64,
) -> Result<Association, ProtocolError> {
    let assoc_type = required(reply, ASSOC_TYPE)?;
    let handle = required(reply, ASSOC_HANDLE)?;
    let expires_raw = required(reply, EXPIRES_IN)?;
    let expires_in: i64 = expires_raw
        .trim()
        .parse()
        .map_err(|_| ProtocolError::InvalidNumber {
            field: EXPIRES_IN,
            value: expires_raw.to_string(),
        })?;

    let session_type = if endpoint.is_openid1() {
        openid1_session_type(endpoint, reply)
    } else {
        required(reply, SESSION_TYPE)?
    };

    let plaintext = ConsumerSession::NoEncryption;
    let session = if session.session_type().as_str() == session_type {
        session
    } else if endpoint.is_openid1() && session_type == SessionType::NoEncryption.as_str() {
        &plaintext
    } else {
        return Err(ProtocolError::SessionMismatch {
            expected: session.session_type().as_str().to_string(),
            actual: session_type.to_string(),
        });
    };

    let parsed = AssocType::parse(assoc_type)
        .filter(|t| session.allowed_assoc_types().contains(t))
        .ok_or_else(|| ProtocolError::UnsupportedAssocType {
            session_type: session.session_type().as_str(),
            assoc_type: assoc_type.to_string(),
        })?;

    let secret = session.extract_secret(reply)?;
    let actual = secret.len();
    Association::from_expires_in(expires_in, handle, secret, parsed, now).map_err(|_| {
        ProtocolError::SecretLength {
            expected: parsed.secret_size(),
            actual,
        }
    })
}

fn openid1_session_type<'a>(endpoint: &ProviderEndpoint, reply: &'a KvFields) -> &'a str {
    match reply.get(SESSION_TYPE) {
        None | Some("") => SessionType::NoEncryption.as_str(),
        Some(name) => {
            if name == SessionType::NoEncryption.as_str() {
                tracing::warn!(
                    server_url = %endpoint.server_url,
                    "OpenID 1 server sent \"no-encryption\" as session type"
                );
            }
            name
        }
    }
}

fn required<'a>(fields: &'a KvFields, key: &'static str) -> Result<&'a str, ProtocolError> {
    fields.get(key).ok_or(ProtocolError::MissingField(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::prelude::*;
    use openid_auth::dh::{
        base64_to_long, long_to_base64, DhDigest, DiffieHellman, DH_CONSUMER_PUBLIC,
        DH_SERVER_PUBLIC, ENC_MAC_KEY, MAC_KEY,
    };
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::negotiation::ProtocolVersion;

    const NOW: i64 = 1_700_000_000;

    fn v1() -> ProviderEndpoint {
        ProviderEndpoint::new("http://op.example.com/server", ProtocolVersion::V1)
    }

    fn v2() -> ProviderEndpoint {
        ProviderEndpoint::new("http://op.example.com/server", ProtocolVersion::V2)
    }

    fn plaintext_reply(assoc_type: &str, session_type: Option<&str>, key: &[u8]) -> KvFields {
        let mut reply = KvFields::new()
            .with(ASSOC_TYPE, assoc_type)
            .with(ASSOC_HANDLE, "handle")
            .with(EXPIRES_IN, "1000")
            .with(MAC_KEY, BASE64_STANDARD.encode(key));
        if let Some(session_type) = session_type {
            reply.insert(SESSION_TYPE, session_type);
        }
        reply
    }

    fn dh_reply(session: &ConsumerSession, mac_key: &[u8], digest: DhDigest) -> KvFields {
        let server = DiffieHellman::generate(&mut StdRng::seed_from_u64(99));
        let request = session.request_fields();
        let consumer_public =
            base64_to_long(request.get(DH_CONSUMER_PUBLIC).unwrap(), DH_CONSUMER_PUBLIC).unwrap();
        let enc = server.xor_secret(&consumer_public, mac_key, digest).unwrap();
        KvFields::new()
            .with(DH_SERVER_PUBLIC, long_to_base64(server.public_key()))
            .with(ENC_MAC_KEY, BASE64_STANDARD.encode(enc))
    }

    #[test]
    fn test_openid2_request_fields() {
        let session = ConsumerSession::new(SessionType::DhSha256);
        let fields = associate_request(&v2(), AssocType::HmacSha256, &session);

        assert_eq!(fields.get(MODE), Some("associate"));
        assert_eq!(fields.get(NS), Some(OPENID2_NS));
        assert_eq!(fields.get(ASSOC_TYPE), Some("HMAC-SHA256"));
        assert_eq!(fields.get(SESSION_TYPE), Some("DH-SHA256"));
        assert!(fields.contains_key(DH_CONSUMER_PUBLIC));
    }

    #[test]
    fn test_openid2_plaintext_request_names_session() {
        let fields = associate_request(&v2(), AssocType::HmacSha1, &ConsumerSession::NoEncryption);
        assert_eq!(fields.get(SESSION_TYPE), Some("no-encryption"));
        assert!(!fields.contains_key(DH_CONSUMER_PUBLIC));
    }

    #[test]
    fn test_openid1_request_omits_ns_and_plaintext_session() {
        let fields = associate_request(&v1(), AssocType::HmacSha1, &ConsumerSession::NoEncryption);
        assert!(!fields.contains_key(NS));
        assert!(!fields.contains_key(SESSION_TYPE));

        let session = ConsumerSession::new(SessionType::DhSha1);
        let fields = associate_request(&v1(), AssocType::HmacSha1, &session);
        assert!(!fields.contains_key(NS));
        assert_eq!(fields.get(SESSION_TYPE), Some("DH-SHA1"));
    }

    #[test]
    fn test_extract_dh_association() {
        let session = ConsumerSession::with_rng(SessionType::DhSha1, &mut StdRng::seed_from_u64(1));
        let mac_key = [0x42u8; 20];
        let mut reply = dh_reply(&session, &mac_key, DhDigest::Sha1);
        reply.extend(
            KvFields::new()
                .with(ASSOC_TYPE, "HMAC-SHA1")
                .with(ASSOC_HANDLE, "{HMAC-SHA1}{1}")
                .with(EXPIRES_IN, "1209600")
                .with(SESSION_TYPE, "DH-SHA1"),
        );

        let assoc = extract_association(&v2(), &session, &reply, NOW).unwrap();
        assert_eq!(assoc.handle(), "{HMAC-SHA1}{1}");
        assert_eq!(assoc.secret(), &mac_key);
        assert_eq!(assoc.issued(), NOW);
        assert_eq!(assoc.lifetime(), 1_209_600);
        assert_eq!(assoc.assoc_type(), AssocType::HmacSha1);
    }

    #[test]
    fn test_extract_missing_fields() {
        let session = ConsumerSession::NoEncryption;
        let full = plaintext_reply("HMAC-SHA1", Some("no-encryption"), &[1u8; 20]);

        for field in [ASSOC_TYPE, ASSOC_HANDLE, EXPIRES_IN, SESSION_TYPE, MAC_KEY] {
            let reply: KvFields = full.iter().filter(|(k, _)| *k != field).collect();
            assert_eq!(
                extract_association(&v2(), &session, &reply, NOW).unwrap_err(),
                ProtocolError::MissingField(field),
                "{field}"
            );
        }
    }

    #[test]
    fn test_extract_bad_expires_in() {
        let session = ConsumerSession::NoEncryption;
        let mut reply = plaintext_reply("HMAC-SHA1", Some("no-encryption"), &[1u8; 20]);
        reply.insert(EXPIRES_IN, "forever");

        assert_eq!(
            extract_association(&v2(), &session, &reply, NOW).unwrap_err(),
            ProtocolError::InvalidNumber {
                field: EXPIRES_IN,
                value: "forever".to_string()
            }
        );
    }

    #[test]
    fn test_extract_session_mismatch() {
        let session = ConsumerSession::new(SessionType::DhSha1);
        let reply = plaintext_reply("HMAC-SHA1", Some("no-encryption"), &[1u8; 20]);

        assert_eq!(
            extract_association(&v2(), &session, &reply, NOW).unwrap_err(),
            ProtocolError::SessionMismatch {
                expected: "DH-SHA1".to_string(),
                actual: "no-encryption".to_string()
            }
        );
    }

    #[test]
    fn test_extract_assoc_type_not_carried_by_session() {
        let session = ConsumerSession::with_rng(SessionType::DhSha1, &mut StdRng::seed_from_u64(2));
        let mut reply = dh_reply(&session, &[0u8; 20], DhDigest::Sha1);
        reply.extend(
            KvFields::new()
                .with(ASSOC_TYPE, "HMAC-SHA256")
                .with(ASSOC_HANDLE, "h")
                .with(EXPIRES_IN, "10")
                .with(SESSION_TYPE, "DH-SHA1"),
        );

        assert_eq!(
            extract_association(&v2(), &session, &reply, NOW).unwrap_err(),
            ProtocolError::UnsupportedAssocType {
                session_type: "DH-SHA1",
                assoc_type: "HMAC-SHA256".to_string()
            }
        );
    }

    #[test]
    fn test_extract_plaintext_wrong_key_length() {
        let reply = plaintext_reply("HMAC-SHA256", Some("no-encryption"), &[1u8; 20]);
        assert_eq!(
            extract_association(&v2(), &ConsumerSession::NoEncryption, &reply, NOW).unwrap_err(),
            ProtocolError::SecretLength {
                expected: 32,
                actual: 20
            }
        );
    }

    #[test]
    fn test_openid1_missing_or_empty_session_means_plaintext() {
        for session_type in [None, Some("")] {
            let reply = plaintext_reply("HMAC-SHA1", session_type, &[7u8; 20]);
            let assoc =
                extract_association(&v1(), &ConsumerSession::NoEncryption, &reply, NOW).unwrap();
            assert_eq!(assoc.secret(), &[7u8; 20]);
        }
    }

    #[test]
    fn test_openid1_plaintext_downgrade_of_dh_request() {
        let session = ConsumerSession::new(SessionType::DhSha1);
        let reply = plaintext_reply("HMAC-SHA1", None, &[8u8; 20]);

        let assoc = extract_association(&v1(), &session, &reply, NOW).unwrap();
        assert_eq!(assoc.secret(), &[8u8; 20]);
    }

    #[test]
    fn test_openid2_does_not_accept_downgrade() {
        let session = ConsumerSession::new(SessionType::DhSha1);
        let reply = plaintext_reply("HMAC-SHA1", Some("no-encryption"), &[8u8; 20]);
        assert!(matches!(
            extract_association(&v2(), &session, &reply, NOW),
            Err(ProtocolError::SessionMismatch { .. })
        ));
    }
}
