//! clipdna core library
//!
//! Resolves a short-video URL to public metadata through relayed lookups and
//! turns it into a reusable video-generation prompt with a structured-output
//! AI model.

pub mod analyzer;
pub mod config;
pub mod error;
pub mod extractor;
pub mod format;
pub mod image;
pub mod log;
pub mod orchestrator;
pub mod provider;
pub mod relay;
pub mod tools;
pub mod types;

// Re-export commonly used items at crate root
pub use analyzer::{Analyzer, ChatCompletionsModel, GenerationRequest, GenerativeModel, ModelError};
pub use config::{EXAMPLE_URL, PipelineConfig};
pub use error::{PipelineError, RelayError, Result};
pub use extractor::{MetadataExtractor, demo_record};
pub use format::{format_count, format_result_readable, format_timestamp};
pub use image::{ImageFetcher, InlineImage};
pub use log::{LogBuffer, LogListener, LogSink};
pub use orchestrator::{Orchestrator, RunSnapshot, RunStatus, SubmitError};
pub use provider::{Provider, ProviderConfig, ProviderError};
pub use relay::RelayFetcher;
pub use tools::{AI_TOOLS, ToolLink};
pub use types::{AnalysisResult, LogEntry, Severity, VideoRecord};
