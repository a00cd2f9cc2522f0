/// Public relays tried in order when a URL cannot be fetched directly.
pub const DEFAULT_RELAYS: &[&str] = &[
    "https://corsproxy.io/?",
    "https://api.allorigins.win/raw?url=",
];

/// TikWM lookup endpoint, resolves a TikTok link to metadata.
pub const DEFAULT_LOOKUP_API: &str = "https://www.tikwm.com/api/";

/// Substring every accepted input URL must contain.
pub const DEFAULT_HOST_MARKER: &str = "tiktok.com";

pub const EXAMPLE_URL: &str = "https://www.tiktok.com/@tiktok/video/7294458392095313184";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub relays: Vec<String>,
    pub lookup_api: String,
    pub host_marker: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            relays: DEFAULT_RELAYS.iter().map(|r| r.to_string()).collect(),
            lookup_api: DEFAULT_LOOKUP_API.to_string(),
            host_marker: DEFAULT_HOST_MARKER.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Replace the relay list. An empty list keeps the defaults.
    pub fn with_relays(mut self, relays: Vec<String>) -> Self {
        if !relays.is_empty() {
            self.relays = relays;
        }
        self
    }
}
