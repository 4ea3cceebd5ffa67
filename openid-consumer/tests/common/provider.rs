//! In-process OpenID provider answering associate requests from a script.

use std::collections::VecDeque;
use std::sync::Mutex;

use base64::prelude::*;
use openid_auth::association::{AssocType, SessionType};
use openid_auth::dh::{
    base64_to_long, long_to_base64, DhDigest, DiffieHellman, DH_CONSUMER_PUBLIC,
    DH_SERVER_PUBLIC, ENC_MAC_KEY, MAC_KEY,
};
use openid_auth::kv::KvFields;
use openid_consumer::negotiation::{
    AssociationTransport, ProviderEndpoint, ProviderReply, TransportError,
};
use rand::rngs::OsRng;
use rand::RngCore;

/// What the provider does with the next request.
#[derive(Debug, Clone)]
pub enum ProviderStep {
    /// Issue an association of the requested type over the requested session.
    Associate { handle: String, expires_in: i64 },
    /// Issue an association in plaintext, without naming a session type.
    AssociatePlaintext { handle: String },
    /// Reject with `unsupported-type`, optionally proposing a pair.
    Unsupported {
        assoc_type: Option<String>,
        session_type: Option<String>,
    },
    /// Answer with an error message made of these fields.
    Error(KvFields),
    /// Answer with these success fields verbatim.
    Raw(KvFields),
    /// Fail at the transport level.
    Unreachable,
}

impl ProviderStep {
    pub fn associate(handle: &str) -> Self {
        Self::Associate {
            handle: handle.to_string(),
            expires_in: 1_209_600,
        }
    }

    pub fn unsupported(assoc_type: &str, session_type: &str) -> Self {
        Self::Unsupported {
            assoc_type: Some(assoc_type.to_string()),
            session_type: Some(session_type.to_string()),
        }
    }
}

/// Scripted provider doing real Diffie-Hellman.
#[derive(Default)]
pub struct ScriptedProvider {
    steps: Mutex<VecDeque<ProviderStep>>,
    requests: Mutex<Vec<KvFields>>,
    issued_secrets: Mutex<Vec<Vec<u8>>>,
}

impl ScriptedProvider {
    pub fn new(steps: impl IntoIterator<Item = ProviderStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<KvFields> {
        self.requests.lock().unwrap().clone()
    }

    /// MAC keys handed out so far, in order.
    pub fn issued_secrets(&self) -> Vec<Vec<u8>> {
        self.issued_secrets.lock().unwrap().clone()
    }

    fn associate(&self, request: &KvFields, handle: &str, expires_in: i64, plaintext: bool) -> KvFields {
        let assoc_type = AssocType::parse(request.get("assoc_type").unwrap()).unwrap();
        let requested_session = match request.get("session_type") {
            Some(name) => SessionType::parse(name).unwrap(),
            None if request.contains_key(DH_CONSUMER_PUBLIC) => SessionType::DhSha1,
            None => SessionType::NoEncryption,
        };

        let mut mac_key = vec![0u8; assoc_type.secret_size()];
        OsRng.fill_bytes(&mut mac_key);
        self.issued_secrets.lock().unwrap().push(mac_key.clone());

        let mut reply = KvFields::new()
            .with("assoc_type", assoc_type.as_str())
            .with("assoc_handle", handle)
            .with("expires_in", expires_in.to_string());

        if plaintext {
            reply.insert(MAC_KEY, BASE64_STANDARD.encode(&mac_key));
            return reply;
        }

        reply.insert("session_type", requested_session.as_str());
        let digest = match requested_session {
            SessionType::NoEncryption => {
                reply.insert(MAC_KEY, BASE64_STANDARD.encode(&mac_key));
                return reply;
            }
            SessionType::DhSha1 => DhDigest::Sha1,
            SessionType::DhSha256 => DhDigest::Sha256,
        };

        let server = DiffieHellman::generate(&mut OsRng);
        let consumer_public =
            base64_to_long(request.get(DH_CONSUMER_PUBLIC).unwrap(), DH_CONSUMER_PUBLIC).unwrap();
        let enc_mac_key = server.xor_secret(&consumer_public, &mac_key, digest).unwrap();
        reply.insert(DH_SERVER_PUBLIC, long_to_base64(server.public_key()));
        reply.insert(ENC_MAC_KEY, BASE64_STANDARD.encode(enc_mac_key));
        reply
    }
}

impl AssociationTransport for ScriptedProvider {
    fn send_association_request(
        &self,
        _endpoint: &ProviderEndpoint,
        fields: &KvFields,
    ) -> Result<ProviderReply, TransportError> {
        self.requests.lock().unwrap().push(fields.clone());
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .expect("provider received more requests than scripted");

        match step {
            ProviderStep::Associate { handle, expires_in } => Ok(ProviderReply::Success(
                self.associate(fields, &handle, expires_in, false),
            )),
            ProviderStep::AssociatePlaintext { handle } => Ok(ProviderReply::Success(
                self.associate(fields, &handle, 1_209_600, true),
            )),
            ProviderStep::Unsupported {
                assoc_type,
                session_type,
            } => {
                let mut reply = KvFields::new()
                    .with("error", "That association type is not supported here")
                    .with("error_code", "unsupported-type");
                if let Some(assoc_type) = assoc_type {
                    reply.insert("assoc_type", assoc_type);
                }
                if let Some(session_type) = session_type {
                    reply.insert("session_type", session_type);
                }
                Ok(ProviderReply::Error(reply))
            }
            ProviderStep::Error(fields) => Ok(ProviderReply::Error(fields)),
            ProviderStep::Raw(fields) => Ok(ProviderReply::Success(fields)),
            ProviderStep::Unreachable => {
                Err(TransportError::Unreachable("connection refused".to_string()))
            }
        }
    }
}
