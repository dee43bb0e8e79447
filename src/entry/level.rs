//! Log levels and the level registry
//!
//! A [`LevelToken`] is the level as the logging framework hands it over. The
//! [`LevelRegistry`] maps each token onto one shared [`LogLevel`] descriptor,
//! so every event of the same level points at the same allocation.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use serde::{Deserialize, Serialize};

/// A level as reported by the logging framework
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LevelToken {
    /// Level name (e.g., "ERROR")
    pub name: Cow<'static, str>,
    /// Human readable name
    pub display_name: Cow<'static, str>,
    /// Numeric severity, higher is more severe
    pub value: i32,
}

impl LevelToken {
    /// Disables logging; above every other level
    pub const OFF: LevelToken = LevelToken::builtin("OFF", i32::MAX);
    /// Unrecoverable failure
    pub const FATAL: LevelToken = LevelToken::builtin("FATAL", 110_000);
    /// Failure; lowest error-tier level
    pub const ERROR: LevelToken = LevelToken::builtin("ERROR", 70_000);
    /// Unexpected but handled condition
    pub const WARN: LevelToken = LevelToken::builtin("WARN", 60_000);
    /// Normal operational message
    pub const INFO: LevelToken = LevelToken::builtin("INFO", 40_000);
    /// Diagnostic detail
    pub const DEBUG: LevelToken = LevelToken::builtin("DEBUG", 30_000);
    /// Finest-grained tracing
    pub const TRACE: LevelToken = LevelToken::builtin("TRACE", 20_000);
    /// Enables everything; below every other level
    pub const ALL: LevelToken = LevelToken::builtin("ALL", i32::MIN);

    const fn builtin(name: &'static str, value: i32) -> Self {
        Self {
            name: Cow::Borrowed(name),
            display_name: Cow::Borrowed(name),
            value,
        }
    }

    /// Create a custom level
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        display_name: impl Into<Cow<'static, str>>,
        value: i32,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            value,
        }
    }

    /// Whether events of this level get the full (expensive) capture
    pub fn is_error_tier(&self) -> bool {
        self.value >= Self::ERROR.value
    }
}

impl From<tracing::Level> for LevelToken {
    fn from(level: tracing::Level) -> Self {
        if level == tracing::Level::ERROR {
            Self::ERROR
        } else if level == tracing::Level::WARN {
            Self::WARN
        } else if level == tracing::Level::INFO {
            Self::INFO
        } else if level == tracing::Level::DEBUG {
            Self::DEBUG
        } else {
            Self::TRACE
        }
    }
}

/// Canonical level descriptor shared by all events of one level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogLevel {
    /// Level name
    pub name: String,
    /// Display name
    pub display_name: String,
    /// Numeric severity
    pub value: i32,
}

impl LogLevel {
    /// Whether this level is at or above the error threshold
    pub fn is_error_tier(&self) -> bool {
        self.value >= LevelToken::ERROR.value
    }
}

impl From<&LevelToken> for LogLevel {
    fn from(token: &LevelToken) -> Self {
        Self {
            name: token.name.to_string(),
            display_name: token.display_name.to_string(),
            value: token.value,
        }
    }
}

/// Memoized token → descriptor mapping
///
/// Cached lookups take a shared read lock and never block each other. A miss
/// takes the upgradable lock, checks again and only then upgrades to insert,
/// so two racing first lookups still produce a single descriptor.
#[derive(Debug, Default)]
pub struct LevelRegistry {
    levels: RwLock<HashMap<LevelToken, Arc<LogLevel>>>,
}

impl LevelRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the descriptor for `token`, creating it on first use
    pub fn of(&self, token: &LevelToken) -> Arc<LogLevel> {
        if let Some(level) = self.levels.read().get(token) {
            return Arc::clone(level);
        }

        let levels = self.levels.upgradable_read();
        if let Some(level) = levels.get(token) {
            return Arc::clone(level);
        }

        let mut levels = RwLockUpgradableReadGuard::upgrade(levels);
        let level = Arc::new(LogLevel::from(token));
        levels.insert(token.clone(), Arc::clone(&level));

        tracing::debug!(level = %token.name, value = token.value, "Level registered");

        level
    }

    /// Number of distinct levels seen so far
    pub fn len(&self) -> usize {
        self.levels.read().len()
    }

    /// Whether no level has been seen yet
    pub fn is_empty(&self) -> bool {
        self.levels.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_token_same_instance() {
        let registry = LevelRegistry::new();

        let a = registry.of(&LevelToken::INFO);
        let b = registry.of(&LevelToken::INFO);

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_distinct_tokens_distinct_instances() {
        let registry = LevelRegistry::new();

        let info = registry.of(&LevelToken::INFO);
        let error = registry.of(&LevelToken::ERROR);

        assert!(!Arc::ptr_eq(&info, &error));
        assert_eq!(error.name, "ERROR");
        assert_eq!(error.value, 70_000);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_custom_level() {
        let registry = LevelRegistry::new();
        let notice = LevelToken::new("NOTICE", "Notice", 50_000);

        let level = registry.of(&notice);
        assert_eq!(level.display_name, "Notice");
        assert!(!level.is_error_tier());
        assert!(Arc::ptr_eq(&level, &registry.of(&notice.clone())));
    }

    #[test]
    fn test_error_tier() {
        assert!(LevelToken::ERROR.is_error_tier());
        assert!(LevelToken::FATAL.is_error_tier());
        assert!(!LevelToken::WARN.is_error_tier());
        assert!(!LevelToken::DEBUG.is_error_tier());
    }

    #[test]
    fn test_from_tracing_level() {
        assert_eq!(LevelToken::from(tracing::Level::WARN), LevelToken::WARN);
        assert_eq!(LevelToken::from(tracing::Level::TRACE), LevelToken::TRACE);
    }

    #[test]
    fn test_concurrent_first_lookup() {
        let registry = Arc::new(LevelRegistry::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.of(&LevelToken::WARN))
            })
            .collect();

        let levels: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(levels.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(registry.len(), 1);
    }
}
