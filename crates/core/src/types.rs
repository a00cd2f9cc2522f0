use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Longest recreation prompt handed back to callers, in characters.
pub const MAX_PROMPT_CHARS: usize = 400;

/// Number of virality factors the model must rank.
pub const VIRAL_FACTOR_COUNT: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub video_id: String,
    pub title: String,
    pub author: String,
    pub author_id: Option<String>,
    pub thumbnail_url: String,
    pub video_url: String,
    pub duration_seconds: u64,
    pub play_count: Option<u64>,
    pub like_count: Option<u64>,
    pub description: Option<String>,
    pub is_demo: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub prompt: String,
    pub technical_details: String,
    pub viral_factors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Local>,
    pub message: String,
    pub severity: Severity,
}

impl LogEntry {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Local::now(),
            message: message.into(),
            severity,
        }
    }

    /// Local wall-clock time as HH:MM:SS
    pub fn clock(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}
