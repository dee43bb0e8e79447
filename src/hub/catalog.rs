//! Logger name catalog
//!
//! Subscribers receive the list of known logger names when they join, so a
//! UI can offer per-logger filtering before any entry arrives.

use std::collections::BTreeSet;

use parking_lot::RwLock;

/// Source of the logger names reported on subscribe
pub trait LoggerCatalog: Send + Sync {
    /// Current logger names (order does not matter, the hub sorts)
    fn logger_names(&self) -> Vec<String>;

    /// Called for every published entry
    fn observe(&self, _logger_name: &str) {}
}

/// Catalog that remembers every logger it has been told about
#[derive(Debug, Default)]
pub struct KnownLoggers {
    names: RwLock<BTreeSet<String>>,
}

impl KnownLoggers {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog pre-filled with names
    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: RwLock::new(names.into_iter().map(Into::into).collect()),
        }
    }

    /// Add a logger name; returns false if already known
    pub fn register(&self, name: &str) -> bool {
        if self.names.read().contains(name) {
            return false;
        }
        self.names.write().insert(name.to_string())
    }
}

impl LoggerCatalog for KnownLoggers {
    fn logger_names(&self) -> Vec<String> {
        self.names.read().iter().cloned().collect()
    }

    fn observe(&self, logger_name: &str) {
        self.register(logger_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_list() {
        let catalog = KnownLoggers::with_names(["web", "db"]);

        assert!(catalog.register("auth"));
        assert!(!catalog.register("web"));

        assert_eq!(catalog.logger_names(), vec!["auth", "db", "web"]);
    }

    #[test]
    fn test_observe_registers() {
        let catalog = KnownLoggers::new();
        catalog.observe("app.worker");
        catalog.observe("app.worker");

        assert_eq!(catalog.logger_names(), vec!["app.worker"]);
    }
}
