//! Discovery double serving canned documents.

use std::collections::HashMap;
use std::sync::Mutex;

use openid_consumer::verify::{
    DiscoveredServices, Discovery, DiscoveryError, ServiceEntry, RP_RETURN_TO_URL_TYPE,
};

/// Serves one document per URL and records every lookup.
#[derive(Default)]
pub struct ScriptedDiscovery {
    documents: HashMap<String, DiscoveredServices>,
    failures: HashMap<String, DiscoveryError>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `return_to` services for `url`, found at `url` itself.
    pub fn with_return_urls(self, url: &str, return_urls: &[&str]) -> Self {
        let services = return_urls
            .iter()
            .map(|uri| ServiceEntry::new(vec![RP_RETURN_TO_URL_TYPE.to_string()], Some(uri.to_string())))
            .collect();
        self.with_document(url, url, services)
    }

    /// Serve `services` for `url`, reporting `final_url` as where they were found.
    pub fn with_document(mut self, url: &str, final_url: &str, services: Vec<ServiceEntry>) -> Self {
        self.documents.insert(
            url.to_string(),
            DiscoveredServices {
                final_url: final_url.to_string(),
                services,
            },
        );
        self
    }

    pub fn with_failure(mut self, url: &str, reason: &str) -> Self {
        self.failures.insert(
            url.to_string(),
            DiscoveryError::Fetch {
                url: url.to_string(),
                reason: reason.to_string(),
            },
        );
        self
    }

    /// URLs looked up so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Discovery for ScriptedDiscovery {
    fn discover(&self, url: &str) -> Result<DiscoveredServices, DiscoveryError> {
        self.calls.lock().unwrap().push(url.to_string());
        if let Some(err) = self.failures.get(url) {
            return Err(err.clone());
        }
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| DiscoveryError::Fetch {
                url: url.to_string(),
                reason: "404 Not Found".to_string(),
            })
    }
}
