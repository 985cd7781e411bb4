use crate::{Context, Result};
use std::env;

/// Per handle settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Log every statement at `debug` level before running it.
    pub trace: bool,
    /// Upper bound of pooled connections, idle ones are closed right away.
    pub max_connections: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trace: false,
            max_connections: 10,
        }
    }
}

impl Config {
    /// Reads `KEEL_TRACE` and `KEEL_MAX_CONNECTIONS`, missing variables keep the defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        if let Ok(trace) = env::var("KEEL_TRACE") {
            config.trace = parse_flag(&trace);
        }
        if let Ok(max) = env::var("KEEL_MAX_CONNECTIONS") {
            config.max_connections = max
                .trim()
                .parse()
                .with_context(|| format!("KEEL_MAX_CONNECTIONS is not a number: `{max}`"))?;
        }
        Ok(config)
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert!(!config.trace);
        assert_eq!(config.max_connections, 10);
        let config = config.with_trace(true).with_max_connections(2);
        assert!(config.trace);
        assert_eq!(config.max_connections, 2);
    }

    #[test]
    fn flags() {
        assert!(parse_flag("1"));
        assert!(parse_flag("TRUE"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("yes"));
    }
}
