use crate::analysis::deletion::{DEFAULT_BATCH_PAUSE_MS, DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE};
use crate::analysis::duplicates::DEFAULT_TOLERANCE_MINUTES;
use crate::error::Error;
use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::time::Duration;

/// One year. Larger windows are rejected by `validate`.
const MAX_TOLERANCE_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub db_path: String,
    pub owner_id: String,
    pub tolerance_minutes: i64,
    pub batch_size: usize,
    pub batch_pause_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: "report_dedupe.db".to_string(),
            owner_id: "default".to_string(),
            tolerance_minutes: DEFAULT_TOLERANCE_MINUTES,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_pause_ms: DEFAULT_BATCH_PAUSE_MS,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if !(1..=MAX_BATCH_SIZE).contains(&self.batch_size) {
            return Err(Error::InvalidConfig(format!(
                "batch_size must be between 1 and {}, got {}",
                MAX_BATCH_SIZE, self.batch_size
            )));
        }
        if !(0..=MAX_TOLERANCE_MINUTES).contains(&self.tolerance_minutes) {
            return Err(Error::InvalidConfig(format!(
                "tolerance_minutes must be between 0 and {}, got {}",
                MAX_TOLERANCE_MINUTES, self.tolerance_minutes
            )));
        }
        Ok(())
    }

    pub fn tolerance(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.tolerance_minutes.clamp(0, MAX_TOLERANCE_MINUTES))
    }

    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }
}

/// Load `Config.toml` (optional) overlaid with `REPORT_DEDUPE_*` environment variables.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(Environment::with_prefix("REPORT_DEDUPE").try_parsing(true))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sources_yield_defaults() {
        let config = Config::builder()
            .build()
            .unwrap()
            .try_deserialize::<AppConfig>()
            .unwrap();
        assert_eq!(config.tolerance_minutes, 15);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.batch_pause_ms, 50);
        assert_eq!(config.owner_id, "default");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides_replace_individual_fields() {
        let config = Config::builder()
            .set_override("batch_size", 25)
            .unwrap()
            .set_override("owner_id", "user-42")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize::<AppConfig>()
            .unwrap();
        assert_eq!(config.batch_size, 25);
        assert_eq!(config.owner_id, "user-42");
        // Untouched fields keep their defaults
        assert_eq!(config.tolerance_minutes, 15);
    }

    #[test]
    fn test_validate_rejects_zero_batch_size() {
        let config = AppConfig {
            batch_size: 0,
            ..AppConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_oversized_batch() {
        let config = AppConfig {
            batch_size: MAX_BATCH_SIZE + 1,
            ..AppConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let at_limit = AppConfig {
            batch_size: MAX_BATCH_SIZE,
            ..AppConfig::default()
        };
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_tolerance() {
        let negative = AppConfig {
            tolerance_minutes: -1,
            ..AppConfig::default()
        };
        assert!(negative.validate().is_err());

        let huge = AppConfig {
            tolerance_minutes: i64::MAX,
            ..AppConfig::default()
        };
        assert!(huge.validate().is_err());
        assert_eq!(huge.tolerance(), chrono::Duration::minutes(MAX_TOLERANCE_MINUTES));
    }

    #[test]
    fn test_duration_helpers() {
        let config = AppConfig::default();
        assert_eq!(config.tolerance(), chrono::Duration::minutes(15));
        assert_eq!(config.batch_pause(), Duration::from_millis(50));
    }
}
