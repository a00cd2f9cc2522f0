use thiserror::Error;

/// Failures that end a pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid TikTok URL: {url}")]
    InvalidUrl { url: String },

    #[error("Analysis failed: {reason}")]
    AnalysisFailed { reason: String },
}

impl PipelineError {
    pub fn analysis(reason: impl Into<String>) -> Self {
        PipelineError::AnalysisFailed {
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Relay {relay} answered with HTTP {status}")]
    Status {
        relay: String,
        status: reqwest::StatusCode,
    },

    #[error("Relay {relay} unreachable: {source}")]
    Transport {
        relay: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("All {attempts} relays failed for {target}")]
    Exhausted { target: String, attempts: usize },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
