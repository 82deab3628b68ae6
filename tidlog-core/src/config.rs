use std::sync::LazyLock;

use derive_from_env::FromEnv;

/// Process-wide defaults, read once from `TIDLOG_*` environment variables.
#[derive(FromEnv)]
#[from_env(prefix = "TIDLOG")]
#[allow(non_snake_case)]
pub struct TidlogConfig {
    /// Upper bound on how long buffered file sinks stay unflushed while the queue is busy.
    #[from_env(default = "100")]
    pub FLUSH_INTERVAL_MS: u64,
    /// Path used by text sinks registered with an empty path.
    #[from_env(default = "logs/log.txt")]
    pub TEXT_PATH: String,
    /// Path used by CSV sinks registered with an empty path.
    #[from_env(default = "logs/log.csv")]
    pub CSV_PATH: String,
    /// Register a console and a text sink for the identity constructing a logger.
    #[from_env(default = "true")]
    pub DEFAULT_SINKS: bool,
}

pub static TIDLOG_CONFIG: LazyLock<TidlogConfig> = LazyLock::new(|| {
    TidlogConfig::from_env().expect("Invalid TIDLOG_* environment configuration")
});

#[cfg(test)]
mod tests {
    use super::*;
    use derive_from_env::FromEnvError;

    // outer prefixes keep these variables away from TIDLOG_CONFIG
    #[test]
    fn test_overrides_and_defaults() {
        unsafe {
            std::env::set_var("TIDLOGTEST_TIDLOG_FLUSH_INTERVAL_MS", "250");
            std::env::set_var("TIDLOGTEST_TIDLOG_CSV_PATH", "/var/log/app.csv");
            std::env::set_var("TIDLOGTEST_TIDLOG_DEFAULT_SINKS", "false");
        }
        let config = TidlogConfig::from_env_with_prefix("TIDLOGTEST").unwrap();
        assert_eq!(config.FLUSH_INTERVAL_MS, 250);
        assert_eq!(config.TEXT_PATH, "logs/log.txt");
        assert_eq!(config.CSV_PATH, "/var/log/app.csv");
        assert!(!config.DEFAULT_SINKS);
    }

    #[test]
    fn test_invalid_value() {
        unsafe {
            std::env::set_var("TIDLOGBAD_TIDLOG_FLUSH_INTERVAL_MS", "soon");
        }
        match TidlogConfig::from_env_with_prefix("TIDLOGBAD") {
            Err(FromEnvError::ParsingFailure { var_name, .. }) => {
                assert_eq!(var_name, "TIDLOGBAD_TIDLOG_FLUSH_INTERVAL_MS")
            }
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("\"soon\" is not a number of milliseconds"),
        }
    }
}
