//! Application configuration
//!
//! Read from a TOML file (default `~/.config/fleet-booking/config.toml`,
//! overridable with `FLEET_CONFIG`). Every section and field has a default,
//! so a partial or missing file is valid.
//!
//! ```toml
//! [logging]
//! level = "debug"
//! format = "json"
//!
//! [booking]
//! overlap_policy = "include_pending"
//! hold_timeout_minutes = 15
//! expiry_check_interval_secs = 60
//!
//! [pricing]
//! base_rate_per_hour = "50.00"
//! currency = "USD"
//! classification_multiplier = false
//!
//! [retry]
//! max_attempts = 3
//! initial_delay_ms = 200
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{DomainResult, Money, OverlapPolicy, PricingPolicy};
use crate::shared::RetryConfig;

pub const CONFIG_ENV_VAR: &str = "FLEET_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid value for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub booking: BookingConfig,
    pub pricing: PricingConfig,
    pub retry: RetrySettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `fleet_booking=debug`.
    pub level: String,
    /// `text` or `json`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    pub overlap_policy: OverlapPolicy,
    /// Age after which an unconfirmed reservation is canceled.
    pub hold_timeout_minutes: u64,
    pub expiry_check_interval_secs: u64,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            overlap_policy: OverlapPolicy::default(),
            hold_timeout_minutes: 15,
            expiry_check_interval_secs: 60,
        }
    }
}

impl BookingConfig {
    /// The hold timeout as a duration that can be subtracted from the
    /// current time.
    pub fn hold_timeout(&self) -> Result<chrono::Duration, ConfigError> {
        let timeout = i64::try_from(self.hold_timeout_minutes)
            .ok()
            .and_then(chrono::Duration::try_minutes)
            .filter(|d| chrono::Utc::now().checked_sub_signed(*d).is_some());
        timeout.ok_or_else(|| ConfigError::Invalid {
            field: "booking.hold_timeout_minutes",
            message: format!("{} minutes is out of range", self.hold_timeout_minutes),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub base_rate_per_hour: Decimal,
    pub currency: String,
    pub classification_multiplier: bool,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_rate_per_hour: Decimal::from(50),
            currency: "USD".to_string(),
            classification_multiplier: false,
        }
    }
}

impl PricingConfig {
    pub fn base_rate(&self) -> DomainResult<Money> {
        Money::new(self.base_rate_per_hour, &self.currency)
    }

    pub fn policy(&self) -> PricingPolicy {
        PricingPolicy {
            classification_multiplier: self.classification_multiplier,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let base = RetryConfig::default();
        Self {
            max_attempts: base.max_attempts,
            initial_delay_ms: base.initial_delay.as_millis() as u64,
            backoff_multiplier: base.backoff_multiplier,
            max_delay_ms: base.max_delay.as_millis() as u64,
        }
    }
}

impl From<&RetrySettings> for RetryConfig {
    fn from(settings: &RetrySettings) -> Self {
        RetryConfig {
            max_attempts: settings.max_attempts,
            initial_delay: Duration::from_millis(settings.initial_delay_ms),
            backoff_multiplier: settings.backoff_multiplier,
            max_delay: Duration::from_millis(settings.max_delay_ms),
        }
    }
}

impl AppConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that parse but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.booking.hold_timeout()?;
        Ok(())
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}

/// `$FLEET_CONFIG`, or `config.toml` in the user config directory.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        return PathBuf::from(path);
    }
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fleet-booking")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = AppConfig::from_toml("").unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.booking.overlap_policy, OverlapPolicy::IncludePending);
        assert_eq!(cfg.booking.hold_timeout().unwrap(), chrono::Duration::minutes(15));
        assert_eq!(
            cfg.pricing.base_rate().unwrap(),
            Money::from_cents(5000, "USD").unwrap()
        );
    }

    #[test]
    fn partial_sections_override_defaults() {
        let cfg = AppConfig::from_toml(
            r#"
            [logging]
            format = "json"

            [booking]
            overlap_policy = "confirmed_only"

            [pricing]
            base_rate_per_hour = "42.50"
            currency = "eur"
            classification_multiplier = true

            [retry]
            max_attempts = 5
            "#,
        )
        .unwrap();

        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.logging.format, "json");
        assert_eq!(cfg.booking.overlap_policy, OverlapPolicy::ConfirmedOnly);
        assert_eq!(cfg.booking.hold_timeout_minutes, 15);
        assert_eq!(
            cfg.pricing.base_rate().unwrap(),
            Money::from_cents(4250, "EUR").unwrap()
        );
        assert!(cfg.pricing.policy().classification_multiplier);

        let retry = RetryConfig::from(&cfg.retry);
        assert_eq!(retry.max_attempts, 5);
        assert_eq!(retry.initial_delay, Duration::from_millis(200));
    }

    #[test]
    fn unknown_overlap_policy_is_rejected() {
        assert!(AppConfig::from_toml("[booking]\noverlap_policy = \"sometimes\"").is_err());
    }

    #[test]
    fn oversized_hold_timeout_is_rejected() {
        let mut cfg = AppConfig::default();
        cfg.booking.hold_timeout_minutes = u64::MAX;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid { .. })));

        let cfg = AppConfig::from_toml("[booking]\nhold_timeout_minutes = 9223372036854775807")
            .unwrap();
        let err = cfg.booking.hold_timeout().unwrap_err();
        assert!(err.to_string().contains("booking.hold_timeout_minutes"));

        let path = std::env::temp_dir()
            .join(format!("fleet-booking-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[booking]\nhold_timeout_minutes = 9223372036854775807\n")
            .unwrap();
        assert!(matches!(AppConfig::load(&path), Err(ConfigError::Invalid { .. })));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("fleet-booking-does-not-exist.toml");
        assert_eq!(AppConfig::load(&path).unwrap(), AppConfig::default());
    }

    #[test]
    fn load_reads_and_reports_parse_errors() {
        let dir = std::env::temp_dir();
        let good = dir.join(format!("fleet-booking-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&good, "[booking]\nhold_timeout_minutes = 5\n").unwrap();
        assert_eq!(AppConfig::load(&good).unwrap().booking.hold_timeout_minutes, 5);

        let bad = dir.join(format!("fleet-booking-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&bad, "[booking\n").unwrap();
        assert!(matches!(AppConfig::load(&bad), Err(ConfigError::Parse { .. })));

        let _ = std::fs::remove_file(good);
        let _ = std::fs::remove_file(bad);
    }
}
