use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default wall-clock budget in milliseconds.
pub const DEFAULT_TIME_LIMIT_MS: u64 = 10_000;

/// Default number of search nodes entered before giving up.
pub const DEFAULT_MAX_ITERATIONS: u64 = 1_000_000;

/// Budgets bounding the exact branch-and-bound search. Exhausting either
/// one is not an error: the engine returns the best solution found so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchConfig {
    /// Maximum computation time in milliseconds.
    pub time_limit_ms: u64,

    /// Maximum number of search nodes entered.
    pub max_iterations: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: DEFAULT_TIME_LIMIT_MS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl SearchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = ms;
        self
    }

    pub fn with_max_iterations(mut self, iterations: u64) -> Self {
        self.max_iterations = iterations;
        self
    }

    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.time_limit_ms, 10_000);
        assert_eq!(config.max_iterations, 1_000_000);
        assert_eq!(config.time_limit(), Duration::from_secs(10));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: SearchConfig = serde_json::from_str(r#"{"maxIterations": 500}"#).unwrap();
        assert_eq!(config, SearchConfig::new().with_max_iterations(500));
    }
}
