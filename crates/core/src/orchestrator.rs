use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::{
    analyzer::{Analyzer, GenerativeModel},
    config::PipelineConfig,
    error::PipelineError,
    extractor::MetadataExtractor,
    image::ImageFetcher,
    log::{LogBuffer, LogListener, LogSink},
    relay::RelayFetcher,
    types::{AnalysisResult, LogEntry, VideoRecord},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Idle,
    Running,
    Done,
    Failed,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("A run is already in progress")]
    Busy,

    #[error("No URL given")]
    EmptyUrl,

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSnapshot {
    pub status: RunStatus,
    pub logs: Vec<LogEntry>,
    pub video: Option<VideoRecord>,
    pub analysis: Option<AnalysisResult>,
}

struct RunState {
    status: RunStatus,
    video: Option<VideoRecord>,
    analysis: Option<AnalysisResult>,
}

/// Fails a run whose `submit` future was dropped before it settled.
struct RunGuard<'a> {
    state: &'a Mutex<RunState>,
    log: &'a LogBuffer,
    armed: bool,
}

impl RunGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        if state.status == RunStatus::Running {
            state.status = RunStatus::Failed;
            drop(state);
            self.log.error("Run interrupted before completion.");
        }
    }
}

/// Runs extraction then analysis, one submission at a time.
pub struct Orchestrator {
    extractor: MetadataExtractor,
    analyzer: Analyzer,
    state: Mutex<RunState>,
    log: LogBuffer,
}

impl Orchestrator {
    pub fn new(extractor: MetadataExtractor, analyzer: Analyzer) -> Self {
        Self::with_log(extractor, analyzer, LogBuffer::new())
    }

    pub fn with_log(extractor: MetadataExtractor, analyzer: Analyzer, log: LogBuffer) -> Self {
        Self {
            extractor,
            analyzer,
            state: Mutex::new(RunState {
                status: RunStatus::Idle,
                video: None,
                analysis: None,
            }),
            log,
        }
    }

    /// Wire the whole pipeline from `config`, sharing one HTTP client.
    pub fn from_config(
        config: &PipelineConfig,
        model: Arc<dyn GenerativeModel>,
        listener: Option<LogListener>,
    ) -> Self {
        let relay = RelayFetcher::new(config.relays.clone());
        let extractor = MetadataExtractor::new(relay.clone(), config);
        let analyzer = Analyzer::new(model, ImageFetcher::new(relay));
        let log = match listener {
            Some(listener) => LogBuffer::with_listener(listener),
            None => LogBuffer::new(),
        };

        Self::with_log(extractor, analyzer, log)
    }

    pub fn status(&self) -> RunStatus {
        self.state.lock().expect("run state poisoned").status
    }

    pub fn snapshot(&self) -> RunSnapshot {
        let state = self.state.lock().expect("run state poisoned");
        RunSnapshot {
            status: state.status,
            logs: self.log.entries(),
            video: state.video.clone(),
            analysis: state.analysis.clone(),
        }
    }

    /// Start a run for `url`. Rejected while another run is in flight.
    pub async fn submit(&self, url: &str) -> Result<(VideoRecord, AnalysisResult), SubmitError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(SubmitError::EmptyUrl);
        }

        {
            let mut state = self.state.lock().expect("run state poisoned");
            if state.status == RunStatus::Running {
                return Err(SubmitError::Busy);
            }
            state.status = RunStatus::Running;
            state.video = None;
            state.analysis = None;
            self.log.clear();
        }

        let guard = RunGuard {
            state: &self.state,
            log: &self.log,
            armed: true,
        };
        self.log.info("Starting TikTok Clone Engine...");

        let outcome = match self.run(url).await {
            Ok((video, analysis)) => {
                self.set_status(RunStatus::Done);
                Ok((video, analysis))
            }
            Err(e) => {
                self.log.error(&e.to_string());
                self.set_status(RunStatus::Failed);
                Err(e.into())
            }
        };
        guard.disarm();
        outcome
    }

    async fn run(&self, url: &str) -> Result<(VideoRecord, AnalysisResult), PipelineError> {
        let video = self.extractor.extract(url, &self.log).await?;
        self.state.lock().expect("run state poisoned").video = Some(video.clone());

        self.log.info(&format!(
            "Sending video \"{}\" to {}...",
            video.title,
            self.analyzer.model_name()
        ));
        let analysis = self.analyzer.analyze(&video, &self.log).await?;

        self.state.lock().expect("run state poisoned").analysis = Some(analysis.clone());
        self.log.success("Process completed successfully!");

        Ok((video, analysis))
    }

    fn set_status(&self, status: RunStatus) {
        self.state.lock().expect("run state poisoned").status = status;
    }
}
