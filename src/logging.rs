//! Observability handle passed down to every component.
//!
//! The caller builds one [`Logger`] over an [`EventSink`] and hands it to the
//! engine; components keep scoped clones instead of reaching for a global.

use log::Level;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Receiver of diagnostic events
pub trait EventSink: Send + Sync {
    fn record(&self, level: Level, target: &str, message: &str);

    fn enabled(&self, _level: Level) -> bool {
        true
    }
}

#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn EventSink>,
    target: String,
}

impl Logger {
    pub fn new(sink: Arc<dyn EventSink>, target: impl Into<String>) -> Self {
        Self {
            sink,
            target: target.into(),
        }
    }

    /// Logger that forwards to the `log` facade
    pub fn to_log(target: impl Into<String>) -> Self {
        Self::new(Arc::new(LogSink), target)
    }

    /// Same sink, nested target (`tradevolve::robot`)
    pub fn scoped(&self, name: &str) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            target: format!("{}::{}", self.target, name),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        if self.sink.enabled(level) {
            self.sink.record(level, &self.target, &args.to_string());
        }
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").field("target", &self.target).finish()
    }
}

/// Forwards events to whatever `log` backend the binary installed
pub struct LogSink;

impl EventSink for LogSink {
    fn record(&self, level: Level, target: &str, message: &str) {
        log::logger().log(
            &log::Record::builder()
                .level(level)
                .target(target)
                .args(format_args!("{}", message))
                .build(),
        );
    }

    fn enabled(&self, level: Level) -> bool {
        level <= log::max_level()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    pub level: Level,
    pub target: String,
    pub message: String,
}

/// Keeps every event in memory; used by tests
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<RecordedEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.events()
            .iter()
            .any(|e| e.level == level && e.message.contains(needle))
    }
}

impl EventSink for MemorySink {
    fn record(&self, level: Level, target: &str, message: &str) {
        let event = RecordedEvent {
            level,
            target: target.to_string(),
            message: message.to_string(),
        };
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
