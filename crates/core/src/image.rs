use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use tracing::{debug, warn};

use crate::relay::RelayFetcher;

const FALLBACK_MIME: &str = "image/jpeg";

/// Base64 image payload ready for a multimodal request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

impl InlineImage {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

#[derive(Clone)]
pub struct ImageFetcher {
    relay: RelayFetcher,
}

impl ImageFetcher {
    pub fn new(relay: RelayFetcher) -> Self {
        Self { relay }
    }

    /// Download a thumbnail through the first relay. `None` means "go on without it".
    pub async fn fetch_image_as_base64(&self, image_url: &str) -> Option<InlineImage> {
        let response = match self.relay.fetch_via_first_relay(image_url).await {
            Ok(response) => response,
            Err(e) => {
                warn!(image_url, error = %e, "thumbnail fetch failed");
                return None;
            }
        };

        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_ascii_lowercase())
            .filter(|v| v.starts_with("image/"))
            .unwrap_or_else(|| FALLBACK_MIME.to_string());

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(image_url, error = %e, "thumbnail body unreadable");
                return None;
            }
        };

        if bytes.is_empty() {
            debug!(image_url, "thumbnail body empty");
            return None;
        }

        Some(encode_payload(&bytes, mime_type))
    }
}

/// Base64-encode raw bytes, or unwrap a body that already is a `data:` URL.
fn encode_payload(bytes: &[u8], mime_type: String) -> InlineImage {
    let data_url = std::str::from_utf8(bytes)
        .ok()
        .and_then(|text| text.trim().strip_prefix("data:"))
        .and_then(|rest| rest.split_once(','))
        .and_then(|(header, payload)| Some((header.strip_suffix(";base64")?, payload)));

    if let Some((declared, payload)) = data_url {
        let mime_type = if declared.starts_with("image/") {
            declared.to_string()
        } else {
            mime_type
        };
        return InlineImage {
            mime_type,
            data: payload.to_string(),
        };
    }

    InlineImage {
        mime_type,
        data: STANDARD.encode(bytes),
    }
}
