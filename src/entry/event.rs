//! Event payload attached to every log entry
//!
//! Capturing caller location, identity and exception text is costly, so it is
//! only done for error-tier events. [`EventData::capture`] enforces that: the
//! expensive accessors of a [`CapturedEvent`] are never called for lower
//! levels, and [`EventData::error_detail`] is present exactly when the level is
//! at or above ERROR.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::level::{LevelRegistry, LevelToken, LogLevel};

/// Source location of an error-tier event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogLocation {
    pub class_name: String,
    pub file_name: String,
    pub method_name: String,
    pub line_number: String,
    /// Composite "class.method(file:line)" string
    pub full_info: String,
}

impl LogLocation {
    /// Build a location and derive `full_info` from the parts
    pub fn new(
        class_name: impl Into<String>,
        method_name: impl Into<String>,
        file_name: impl Into<String>,
        line_number: u32,
    ) -> Self {
        let class_name = class_name.into();
        let method_name = method_name.into();
        let file_name = file_name.into();
        let full_info = format!("{}.{}({}:{})", class_name, method_name, file_name, line_number);

        Self {
            class_name,
            file_name,
            method_name,
            line_number: line_number.to_string(),
            full_info,
        }
    }
}

/// Fields captured only for error-tier events
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorDetail {
    /// Rendered exception, if one was attached
    pub exception_string: Option<String>,
    /// Identity of the calling principal
    pub identity: String,
    /// OS user name
    pub user_name: String,
    /// Where the event was logged
    pub log_location: LogLocation,
}

/// Immutable description of one logged event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventData {
    /// Originating process name
    pub domain: String,
    pub level: Arc<LogLevel>,
    pub logger_name: String,
    pub message: String,
    pub properties: HashMap<String, String>,
    pub thread_name: String,
    #[serde(rename = "TimeStamp")]
    pub timestamp: DateTime<Utc>,
    /// Present iff `level` is error tier
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<ErrorDetail>,
}

impl EventData {
    /// Copy a framework event, applying the lazy-capture policy
    pub fn capture<E: CapturedEvent + ?Sized>(event: &E, levels: &LevelRegistry) -> Self {
        let token = event.level();
        let level = levels.of(&token);

        let error_detail = if token.is_error_tier() {
            Some(ErrorDetail {
                exception_string: event.exception_text(),
                identity: event.identity(),
                user_name: event.user_name(),
                log_location: event.location(),
            })
        } else {
            None
        };

        Self {
            domain: event.domain().to_string(),
            level,
            logger_name: event.logger_name().to_string(),
            message: event.message().to_string(),
            properties: event.properties(),
            thread_name: event.thread_name().to_string(),
            timestamp: event.timestamp(),
            error_detail,
        }
    }
}

/// An event as handed over by the logging framework
///
/// The last four accessors may be expensive and are only called for
/// error-tier events.
pub trait CapturedEvent {
    /// Severity
    fn level(&self) -> LevelToken;
    /// Name of the logger that emitted the event
    fn logger_name(&self) -> &str;
    /// Application domain (process) name
    fn domain(&self) -> &str;
    /// Rendered message text
    fn message(&self) -> &str;
    /// Name of the emitting thread
    fn thread_name(&self) -> &str;
    /// When the event was logged
    fn timestamp(&self) -> DateTime<Utc>;
    /// Context properties attached to the event
    fn properties(&self) -> HashMap<String, String>;

    /// Rendered exception, if one was attached
    fn exception_text(&self) -> Option<String>;
    /// Identity of the caller
    fn identity(&self) -> String;
    /// User the process runs as
    fn user_name(&self) -> String;
    /// Source location of the logging call
    fn location(&self) -> LogLocation;
}

/// Plain in-memory event
///
/// Fills domain, thread and timestamp from the current process when built.
#[derive(Debug, Clone)]
pub struct SimpleEvent {
    level: LevelToken,
    logger_name: String,
    message: String,
    domain: String,
    thread_name: String,
    timestamp: DateTime<Utc>,
    properties: HashMap<String, String>,
    exception: Option<String>,
    identity: String,
    user_name: String,
    location: LogLocation,
}

impl SimpleEvent {
    /// Create an event logged now on the current thread
    pub fn new(
        level: LevelToken,
        logger_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let thread = std::thread::current();
        let thread_name = match thread.name() {
            Some(name) => name.to_string(),
            None => format!("{:?}", thread.id()),
        };

        let domain = std::env::current_exe()
            .ok()
            .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_default();

        Self {
            level,
            logger_name: logger_name.into(),
            message: message.into(),
            domain,
            thread_name,
            timestamp: Utc::now(),
            properties: HashMap::new(),
            exception: None,
            identity: String::new(),
            user_name: std::env::var("USER").unwrap_or_default(),
            location: LogLocation::default(),
        }
    }

    /// Attach a key/value property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Attach exception text
    pub fn with_exception(mut self, text: impl Into<String>) -> Self {
        self.exception = Some(text.into());
        self
    }

    /// Set the caller location
    pub fn with_location(mut self, location: LogLocation) -> Self {
        self.location = location;
        self
    }

    /// Set the domain (process name)
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Set the calling identity
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }
}

impl CapturedEvent for SimpleEvent {
    fn level(&self) -> LevelToken {
        self.level.clone()
    }

    fn logger_name(&self) -> &str {
        &self.logger_name
    }

    fn domain(&self) -> &str {
        &self.domain
    }

    fn message(&self) -> &str {
        &self.message
    }

    fn thread_name(&self) -> &str {
        &self.thread_name
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn properties(&self) -> HashMap<String, String> {
        self.properties.clone()
    }

    fn exception_text(&self) -> Option<String> {
        self.exception.clone()
    }

    fn identity(&self) -> String {
        self.identity.clone()
    }

    fn user_name(&self) -> String {
        self.user_name.clone()
    }

    fn location(&self) -> LogLocation {
        self.location.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Counts how often the expensive accessors are hit
    struct CountingEvent {
        inner: SimpleEvent,
        expensive_calls: AtomicUsize,
    }

    impl CountingEvent {
        fn new(level: LevelToken) -> Self {
            Self {
                inner: SimpleEvent::new(level, "app.db", "query failed")
                    .with_exception("timeout")
                    .with_location(LogLocation::new("Repo", "load", "repo.rs", 42)),
                expensive_calls: AtomicUsize::new(0),
            }
        }

        fn hit(&self) {
            self.expensive_calls.fetch_add(1, Ordering::Relaxed);
        }
    }

    impl CapturedEvent for CountingEvent {
        fn level(&self) -> LevelToken {
            self.inner.level()
        }
        fn logger_name(&self) -> &str {
            self.inner.logger_name()
        }
        fn domain(&self) -> &str {
            self.inner.domain()
        }
        fn message(&self) -> &str {
            self.inner.message()
        }
        fn thread_name(&self) -> &str {
            self.inner.thread_name()
        }
        fn timestamp(&self) -> DateTime<Utc> {
            self.inner.timestamp()
        }
        fn properties(&self) -> HashMap<String, String> {
            self.inner.properties()
        }
        fn exception_text(&self) -> Option<String> {
            self.hit();
            self.inner.exception_text()
        }
        fn identity(&self) -> String {
            self.hit();
            self.inner.identity()
        }
        fn user_name(&self) -> String {
            self.hit();
            self.inner.user_name()
        }
        fn location(&self) -> LogLocation {
            self.hit();
            self.inner.location()
        }
    }

    #[test]
    fn test_low_severity_skips_error_detail() {
        let levels = LevelRegistry::new();
        let event = CountingEvent::new(LevelToken::WARN);

        let data = EventData::capture(&event, &levels);

        assert!(data.error_detail.is_none());
        assert_eq!(event.expensive_calls.load(Ordering::Relaxed), 0);
        assert_eq!(data.level.name, "WARN");
        assert_eq!(data.logger_name, "app.db");
    }

    #[test]
    fn test_error_captures_detail() {
        let levels = LevelRegistry::new();
        let event = CountingEvent::new(LevelToken::ERROR);

        let data = EventData::capture(&event, &levels);

        let detail = data.error_detail.expect("error tier carries detail");
        assert_eq!(detail.exception_string.as_deref(), Some("timeout"));
        assert_eq!(detail.log_location.full_info, "Repo.load(repo.rs:42)");
        assert_eq!(detail.log_location.line_number, "42");
        assert_eq!(event.expensive_calls.load(Ordering::Relaxed), 4);
    }

    #[test]
    fn test_level_is_shared() {
        let levels = LevelRegistry::new();
        let a = EventData::capture(&SimpleEvent::new(LevelToken::INFO, "a", "one"), &levels);
        let b = EventData::capture(&SimpleEvent::new(LevelToken::INFO, "b", "two"), &levels);

        assert!(Arc::ptr_eq(&a.level, &b.level));
    }

    #[test]
    fn test_properties_copied() {
        let levels = LevelRegistry::new();
        let event = SimpleEvent::new(LevelToken::INFO, "web", "request")
            .with_property("path", "/health")
            .with_property("status", "200");

        let data = EventData::capture(&event, &levels);
        assert_eq!(data.properties.len(), 2);
        assert_eq!(data.properties["path"], "/health");
    }

    #[test]
    fn test_wire_shape() {
        let levels = LevelRegistry::new();
        let info = EventData::capture(&SimpleEvent::new(LevelToken::INFO, "web", "up"), &levels);
        let json = serde_json::to_value(&info).unwrap();

        assert_eq!(json["LoggerName"], "web");
        assert_eq!(json["Level"]["Name"], "INFO");
        assert_eq!(json["Level"]["Value"], 40_000);
        assert!(json.get("TimeStamp").is_some());
        assert!(json.get("ExceptionString").is_none());

        let error = EventData::capture(
            &SimpleEvent::new(LevelToken::ERROR, "web", "down").with_exception("boom"),
            &levels,
        );
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["ExceptionString"], "boom");
        assert!(json["LogLocation"].is_object());
    }
}
