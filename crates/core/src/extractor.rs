use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use crate::{
    config::PipelineConfig,
    error::{PipelineError, RelayError, Result},
    log::LogSink,
    relay::{RelayFetcher, encode_component, relay_host},
    types::VideoRecord,
};

/// Characters of the input URL echoed into the demo title.
const DEMO_ECHO_CHARS: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error("Undecodable lookup response: {0}")]
    Decode(#[from] reqwest::Error),

    #[error("Lookup API returned code {code}: {msg}")]
    Api { code: i64, msg: String },

    #[error("Lookup API returned no data")]
    MissingData,
}

#[derive(Debug, Deserialize)]
pub struct LookupResponse {
    pub code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Option<LookupVideo>,
}

/// The lookup API sends ids as strings or bare numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(u64),
}

impl From<RawId> for String {
    fn from(id: RawId) -> Self {
        match id {
            RawId::Text(text) => text,
            RawId::Number(n) => n.to_string(),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

fn opt_string_or_number<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<RawId>::deserialize(deserializer).map(|id| id.map(String::from))
}

#[derive(Debug, Deserialize)]
pub struct LookupVideo {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<LookupAuthor>,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default)]
    pub play: Option<String>,
    #[serde(default)]
    pub hdplay: Option<String>,
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub play_count: Option<u64>,
    #[serde(default)]
    pub digg_count: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LookupAuthor {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub unique_id: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl LookupVideo {
    /// Map the lookup payload onto a record. `source_url` stands in for a missing play URL.
    pub fn into_record(self, source_url: &str) -> VideoRecord {
        let author = self.author.unwrap_or_default();
        let raw_title = non_empty(self.title);

        VideoRecord {
            video_id: self.id,
            title: raw_title.clone().unwrap_or_else(|| "No Title".to_string()),
            author: non_empty(author.nickname)
                .or(non_empty(author.unique_id))
                .unwrap_or_else(|| "Unknown".to_string()),
            author_id: non_empty(author.id),
            thumbnail_url: non_empty(self.cover).unwrap_or_default(),
            video_url: non_empty(self.hdplay)
                .or(non_empty(self.play))
                .unwrap_or_else(|| source_url.to_string()),
            duration_seconds: self.duration.unwrap_or(0),
            play_count: self.play_count,
            like_count: self.digg_count,
            // the lookup API carries the caption in `title`
            description: raw_title,
            is_demo: false,
        }
    }
}

/// Placeholder record used whenever live extraction fails.
pub fn demo_record(source_url: &str) -> VideoRecord {
    let echo: String = source_url.chars().take(DEMO_ECHO_CHARS).collect();

    VideoRecord {
        video_id: "demo-123".to_string(),
        title: format!("Demo Clone: {echo}..."),
        author: "future_tech_creator".to_string(),
        author_id: None,
        thumbnail_url: "https://picsum.photos/720/1280".to_string(),
        video_url: "#".to_string(),
        duration_seconds: 15,
        play_count: Some(1_500_000),
        like_count: Some(342_000),
        description: Some("How to use AI to clone videos #ai #tech #tutorial".to_string()),
        is_demo: true,
    }
}

pub struct MetadataExtractor {
    relay: RelayFetcher,
    lookup_api: String,
    host_marker: String,
}

impl MetadataExtractor {
    pub fn new(relay: RelayFetcher, config: &PipelineConfig) -> Self {
        Self {
            relay,
            lookup_api: config.lookup_api.clone(),
            host_marker: config.host_marker.clone(),
        }
    }

    pub fn lookup_url(&self, video_url: &str) -> String {
        format!("{}?url={}&hd=1", self.lookup_api, encode_component(video_url))
    }

    /// Resolve `url` to a record. Only an invalid URL is an error; every other
    /// failure yields the demo record.
    pub async fn extract(&self, url: &str, log: &dyn LogSink) -> Result<VideoRecord> {
        if !url.contains(&self.host_marker) {
            return Err(PipelineError::InvalidUrl {
                url: url.to_string(),
            });
        }

        log.info("Resolving video ID...");
        let api_url = self.lookup_url(url);

        for relay in self.relay.relays() {
            log.info(&format!("Attempting extraction via {}...", relay_host(relay)));

            match self.lookup(relay, &api_url).await {
                Ok(video) => {
                    log.success("Video metadata extracted successfully!");
                    return Ok(video.into_record(url));
                }
                Err(e) => warn!(relay = %relay, error = %e, "metadata lookup failed"),
            }
        }

        let exhausted = RelayError::Exhausted {
            target: api_url,
            attempts: self.relay.relays().len(),
        };
        debug!(error = %exhausted, "falling back to demo record");

        log.warning(
            "Automatic extraction failed due to relay/API limits. Falling back to Demo Mode for visualization.",
        );
        Ok(demo_record(url))
    }

    async fn lookup(
        &self,
        relay: &str,
        api_url: &str,
    ) -> std::result::Result<LookupVideo, LookupError> {
        let body: LookupResponse = self
            .relay
            .attempt(relay, api_url)
            .await?
            .json()
            .await?;

        if body.code != 0 {
            return Err(LookupError::Api {
                code: body.code,
                msg: body
                    .msg
                    .unwrap_or_else(|| "API returned invalid code".to_string()),
            });
        }

        body.data.ok_or(LookupError::MissingData)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(json: serde_json::Value) -> LookupVideo {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn maps_full_payload() {
        let record = video(serde_json::json!({
            "id": "7294458392095313184",
            "title": "dance #fyp",
            "author": {"id": "42", "unique_id": "dancer", "nickname": "Dancer"},
            "cover": "https://p16.example/cover.jpg",
            "play": "https://v.example/sd.mp4",
            "hdplay": "https://v.example/hd.mp4",
            "duration": 21,
            "play_count": 1000,
            "digg_count": 99
        }))
        .into_record("https://www.tiktok.com/@dancer/video/1");

        assert_eq!(record.video_id, "7294458392095313184");
        assert_eq!(record.title, "dance #fyp");
        assert_eq!(record.description.as_deref(), Some("dance #fyp"));
        assert_eq!(record.author, "Dancer");
        assert_eq!(record.author_id.as_deref(), Some("42"));
        assert_eq!(record.video_url, "https://v.example/hd.mp4");
        assert_eq!(record.duration_seconds, 21);
        assert_eq!(record.like_count, Some(99));
        assert!(!record.is_demo);
    }

    #[test]
    fn falls_back_through_optional_fields() {
        let record = video(serde_json::json!({
            "id": "1",
            "title": "",
            "author": {"nickname": "", "unique_id": "handle"},
            "play": "https://v.example/sd.mp4"
        }))
        .into_record("https://www.tiktok.com/@x/video/1");

        assert_eq!(record.title, "No Title");
        assert_eq!(record.description, None);
        assert_eq!(record.author, "handle");
        assert_eq!(record.video_url, "https://v.example/sd.mp4");
        assert_eq!(record.duration_seconds, 0);

        let record = video(serde_json::json!({"id": "2"})).into_record("https://www.tiktok.com/x");
        assert_eq!(record.author, "Unknown");
        assert_eq!(record.video_url, "https://www.tiktok.com/x");
    }

    #[test]
    fn numeric_ids_are_accepted() {
        let record = video(serde_json::json!({
            "id": 7294458392095313184u64,
            "title": "dance",
            "author": {"id": 42, "nickname": "Dancer"}
        }))
        .into_record("https://www.tiktok.com/@dancer/video/1");

        assert_eq!(record.video_id, "7294458392095313184");
        assert_eq!(record.author_id.as_deref(), Some("42"));

        let record = video(serde_json::json!({"id": "9", "author": {"id": null}}))
            .into_record("https://www.tiktok.com/x");
        assert_eq!(record.author_id, None);
    }

    #[test]
    fn demo_title_echoes_first_twenty_chars() {
        let record = demo_record("https://www.tiktok.com/@x/video/123");
        assert_eq!(record.title, "Demo Clone: https://www.tiktok.c...");
        assert!(record.is_demo);

        let short = demo_record("tiktok.com/ü");
        assert_eq!(short.title, "Demo Clone: tiktok.com/ü...");
    }

    #[test]
    fn lookup_url_embeds_encoded_video_url() {
        let extractor =
            MetadataExtractor::new(RelayFetcher::new(Vec::new()), &PipelineConfig::default());
        assert_eq!(
            extractor.lookup_url("https://www.tiktok.com/@x/video/1"),
            "https://www.tikwm.com/api/?url=https%3A%2F%2Fwww.tiktok.com%2F%40x%2Fvideo%2F1&hd=1"
        );
    }
}
