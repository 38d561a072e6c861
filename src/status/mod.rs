//! Status log (C11, spec.md §3, §4.11).
//!
//! Append-only bounded ring of status entries, mirroring the teacher's
//! pattern of layering a UI-facing log on top of `tracing`
//! (`src/tui/notifications.rs`): every call both logs through `tracing`
//! and appends to the in-memory ring so a headless run still produces
//! useful output.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warn,
    Error,
    Debug,
}

#[derive(Debug, Clone)]
pub struct StatusEntry {
    pub timestamp: DateTime<Utc>,
    pub level: StatusLevel,
    pub component: String,
    pub message: String,
    pub context: Option<HashMap<String, String>>,
}

/// A handler invoked synchronously whenever the log changes.
pub type ChangeHandler = Box<dyn Fn(&StatusEntry) + Send + Sync>;

pub struct StatusLog {
    capacity: usize,
    entries: VecDeque<StatusEntry>,
    current_status_line: Option<String>,
    on_change: Option<ChangeHandler>,
}

impl StatusLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
            current_status_line: None,
            on_change: None,
        }
    }

    pub fn on_change(&mut self, handler: ChangeHandler) {
        self.on_change = Some(handler);
    }

    fn push(&mut self, level: StatusLevel, component: &str, message: impl Into<String>, context: Option<HashMap<String, String>>) {
        let message = message.into();
        match level {
            StatusLevel::Info => info!(component, %message),
            StatusLevel::Warn => warn!(component, %message),
            StatusLevel::Error => error!(component, %message),
            StatusLevel::Debug => debug!(component, %message),
        }
        self.current_status_line = Some(message.clone());
        let entry = StatusEntry {
            timestamp: Utc::now(),
            level,
            component: component.to_string(),
            message,
            context,
        };
        if self.entries.len() == self.capacity {
            // backpressure policy: drop oldest (spec.md §5 "Shared resources")
            self.entries.pop_front();
        }
        if let Some(handler) = &self.on_change {
            handler(&entry);
        }
        self.entries.push_back(entry);
    }

    pub fn info(&mut self, component: &str, message: impl Into<String>) {
        self.push(StatusLevel::Info, component, message, None);
    }

    pub fn warn(&mut self, component: &str, message: impl Into<String>) {
        self.push(StatusLevel::Warn, component, message, None);
    }

    pub fn error(&mut self, component: &str, message: impl Into<String>) {
        self.push(StatusLevel::Error, component, message, None);
    }

    pub fn debug(&mut self, component: &str, message: impl Into<String>) {
        self.push(StatusLevel::Debug, component, message, None);
    }

    /// Replaces the current status line without appending a log entry.
    pub fn set(&mut self, status_line: impl Into<String>) {
        self.current_status_line = Some(status_line.into());
    }

    pub fn clear(&mut self) {
        self.current_status_line = None;
    }

    pub fn current(&self) -> Option<&str> {
        self.current_status_line.as_deref()
    }

    pub fn entries(&self) -> impl Iterator<Item = &StatusEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_ring_drops_oldest() {
        let mut log = StatusLog::new(2);
        log.info("watch", "one");
        log.info("watch", "two");
        log.info("watch", "three");
        let messages: Vec<_> = log.entries().map(|e| e.message.clone()).collect();
        assert_eq!(messages, vec!["two".to_string(), "three".to_string()]);
    }

    #[test]
    fn set_does_not_append() {
        let mut log = StatusLog::new(10);
        log.set("Live");
        assert_eq!(log.current(), Some("Live"));
        assert_eq!(log.entries().count(), 0);
    }

    #[test]
    fn info_both_logs_and_sets_current_status_line() {
        let mut log = StatusLog::new(10);
        log.info("watch", "connected");
        assert_eq!(log.current(), Some("connected"));
        assert_eq!(log.entries().count(), 1);
    }
}
