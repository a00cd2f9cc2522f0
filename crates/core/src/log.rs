use std::sync::{Arc, Mutex};

use crate::types::{LogEntry, Severity};

/// Receives user-facing progress messages from pipeline stages.
pub trait LogSink: Send + Sync {
    fn log(&self, message: &str, severity: Severity);

    fn info(&self, message: &str) {
        self.log(message, Severity::Info);
    }

    fn success(&self, message: &str) {
        self.log(message, Severity::Success);
    }

    fn warning(&self, message: &str) {
        self.log(message, Severity::Warning);
    }

    fn error(&self, message: &str) {
        self.log(message, Severity::Error);
    }
}

pub type LogListener = Arc<dyn Fn(&LogEntry) + Send + Sync>;

/// Append-only log of a single run. Only `clear` removes entries.
#[derive(Default)]
pub struct LogBuffer {
    entries: Mutex<Vec<LogEntry>>,
    listener: Option<LogListener>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every appended entry is also handed to `listener`, after it is stored.
    pub fn with_listener(listener: LogListener) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            listener: Some(listener),
        }
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().expect("LogBuffer poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("LogBuffer poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().expect("LogBuffer poisoned").clear();
    }
}

impl LogSink for LogBuffer {
    fn log(&self, message: &str, severity: Severity) {
        tracing::debug!(?severity, "{message}");

        let entry = LogEntry::new(message, severity);
        self.entries
            .lock()
            .expect("LogBuffer poisoned")
            .push(entry.clone());

        if let Some(listener) = &self.listener {
            listener(&entry);
        }
    }
}
