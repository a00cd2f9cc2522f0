use std::sync::Arc;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Response;
use tracing::warn;

use crate::error::RelayError;

/// Characters left unescaped by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// Full URL that asks `relay` to fetch `target`.
pub fn relay_url(relay: &str, target: &str) -> String {
    format!("{}{}", relay, encode_component(target))
}

/// Host part of a relay base, for log messages.
pub fn relay_host(relay: &str) -> String {
    url::Url::parse(relay)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| relay.to_string())
}

/// Plain GETs routed through an ordered list of URL-rewriting relays.
#[derive(Clone)]
pub struct RelayFetcher {
    client: reqwest::Client,
    relays: Arc<[String]>,
}

impl RelayFetcher {
    pub fn new(relays: Vec<String>) -> Self {
        Self::with_client(reqwest::Client::new(), relays)
    }

    pub fn with_client(client: reqwest::Client, relays: Vec<String>) -> Self {
        Self {
            client,
            relays: relays.into(),
        }
    }

    pub fn relays(&self) -> &[String] {
        &self.relays
    }

    /// One GET through one relay. Non-2xx statuses are errors.
    pub async fn attempt(&self, relay: &str, target: &str) -> Result<Response, RelayError> {
        let response = self
            .client
            .get(relay_url(relay, target))
            .send()
            .await
            .map_err(|source| RelayError::Transport {
                relay: relay.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(RelayError::Status {
                relay: relay.to_string(),
                status: response.status(),
            });
        }

        Ok(response)
    }

    /// Try every relay once, in order, returning the first 2xx response.
    pub async fn fetch_via_relay(&self, target: &str) -> Result<Response, RelayError> {
        for relay in self.relays.iter() {
            match self.attempt(relay, target).await {
                Ok(response) => return Ok(response),
                Err(e) => warn!(relay = %relay, error = %e, "relay attempt failed"),
            }
        }

        Err(RelayError::Exhausted {
            target: target.to_string(),
            attempts: self.relays.len(),
        })
    }

    /// Single attempt through the first configured relay only.
    pub async fn fetch_via_first_relay(&self, target: &str) -> Result<Response, RelayError> {
        let Some(relay) = self.relays.first() else {
            return Err(RelayError::Exhausted {
                target: target.to_string(),
                attempts: 0,
            });
        };
        self.attempt(relay, target).await
    }
}
