use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::common::{ControlError, ControlResult};
use crate::domains::geometry::{
    CalibrationPolicy, Covering, ThetaCalibration, DEFAULT_RECALIBRATION_MAX, DEFAULT_THETA_MAX,
    DEFAULT_THETA_MIN,
};
use crate::domains::selection::SelectionPolicy;
use crate::domains::synthesis::{ProtocolSettings, DEFAULT_ACK_FIELD};

/// Prefix for environment overrides, e.g. `SYMCTL__RETRY__MAX_RETRIES=5`.
pub const ENV_PREFIX: &str = "SYMCTL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub robot: RobotConfig,
    pub localization: LocalizationConfig,
    pub synthesis: SynthesisConfig,
    pub retry: RetryConfig,
    pub calibration: CalibrationConfig,
    pub selection: SelectionConfig,
    pub control: ControlConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    Off,
    /// Serve a still-valid snapshot only after the retry budget is exhausted.
    #[default]
    Fallback,
    /// Serve a still-valid snapshot without touching the network.
    Prefer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalizationConfig {
    pub url: String,
    pub request_timeout_ms: u64,
    pub cache_mode: CacheMode,
    pub cache_validity_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolVariant {
    #[default]
    Combined,
    TwoPhase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMethod {
    #[default]
    Post,
    Put,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub url: String,
    pub request_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub clear_settle_ms: u64,
    pub protocol: ProtocolVariant,
    pub write_method: WriteMethod,
    pub ack_field: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub policy: CalibrationPolicy,
    pub theta_min: f64,
    pub theta_max: f64,
    pub recalibration_max: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub policy: SelectionPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub cycle_interval_ms: u64,
    pub cycle_deadline_ms: u64,
    pub covering: Covering,
    pub parenthesize_state: bool,
    pub stop_after_last_target: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: String,
    pub level: String,
    pub buffer_capacity: usize,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            name: "DeepRacer1".to_string(),
        }
    }
}

impl Default for LocalizationConfig {
    fn default() -> Self {
        Self {
            url: "http://192.168.1.194:12345/OptiTrackRestServer".to_string(),
            request_timeout_ms: 3_000,
            cache_mode: CacheMode::Fallback,
            cache_validity_ms: 5_000,
        }
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            url: "http://192.168.1.144:12345/pFaces/REST/dictionary/DeepRacer1".to_string(),
            request_timeout_ms: 3_000,
            poll_interval_ms: 100,
            clear_settle_ms: 200,
            protocol: ProtocolVariant::Combined,
            write_method: WriteMethod::Post,
            ack_field: DEFAULT_ACK_FIELD.to_string(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 1_000,
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            policy: CalibrationPolicy::Normalize,
            theta_min: DEFAULT_THETA_MIN,
            theta_max: DEFAULT_THETA_MAX,
            recalibration_max: DEFAULT_RECALIBRATION_MAX,
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            cycle_interval_ms: 1_000,
            cycle_deadline_ms: 30_000,
            covering: Covering::Single,
            parenthesize_state: true,
            stop_after_last_target: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: "symctl.log".to_string(),
            level: "info".to_string(),
            buffer_capacity: 256,
        }
    }
}

impl Config {
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// File (optional) layered with `SYMCTL__SECTION__KEY` environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path.as_ref()).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Startup checks. Failures here are the only fatal errors in the process.
    pub fn validate(&self) -> ControlResult<()> {
        for (name, raw) in [
            ("localization.url", &self.localization.url),
            ("synthesis.url", &self.synthesis.url),
        ] {
            let parsed = url::Url::parse(raw)
                .map_err(|e| ControlError::Configuration(format!("{} '{}': {}", name, raw, e)))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ControlError::Configuration(format!(
                    "{} must be http(s), got '{}'",
                    name,
                    parsed.scheme()
                )));
            }
        }
        let c = &self.calibration;
        if !(c.theta_min < c.theta_max) {
            return Err(ControlError::Configuration(format!(
                "calibration envelope [{}, {}] is empty",
                c.theta_min, c.theta_max
            )));
        }
        if c.recalibration_max <= 0.0 {
            return Err(ControlError::Configuration(
                "calibration.recalibration_max must be positive".to_string(),
            ));
        }
        if self.retry.max_retries == 0 {
            return Err(ControlError::Configuration(
                "retry.max_retries must be at least 1".to_string(),
            ));
        }
        if self.synthesis.ack_field.trim().is_empty() {
            return Err(ControlError::Configuration(
                "synthesis.ack_field must not be empty".to_string(),
            ));
        }
        self.log_level()?;
        Ok(())
    }

    pub fn log_level(&self) -> ControlResult<log::LevelFilter> {
        self.logging.level.parse().map_err(|_| {
            ControlError::Configuration(format!("unknown log level '{}'", self.logging.level))
        })
    }

    pub fn calibration(&self) -> ThetaCalibration {
        ThetaCalibration {
            policy: self.calibration.policy,
            theta_min: self.calibration.theta_min,
            theta_max: self.calibration.theta_max,
            recalibration_max: self.calibration.recalibration_max,
        }
    }

    pub fn protocol_settings(&self) -> ProtocolSettings {
        ProtocolSettings {
            poll_interval: Duration::from_millis(self.synthesis.poll_interval_ms),
            clear_settle: Duration::from_millis(self.synthesis.clear_settle_ms),
            ack_field: self.synthesis.ack_field.clone(),
        }
    }
}

impl RetryConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl LocalizationConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn cache_validity(&self) -> Duration {
        Duration::from_millis(self.cache_validity_ms)
    }
}

impl SynthesisConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl ControlConfig {
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms)
    }

    pub fn cycle_deadline(&self) -> Duration {
        Duration::from_millis(self.cycle_deadline_ms)
    }
}
