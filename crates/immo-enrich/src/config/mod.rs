use crate::workflows::enrichment::EnrichmentSettings;
use std::env;
use std::fmt;
use std::path::PathBuf;

/// Distinguishes runtime behavior for different stages of the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the batch job.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub enrichment: EnrichmentConfig,
    pub output: OutputConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let usd_rate = match env::var("APP_USD_RATE") {
            Ok(raw) if !raw.trim().is_empty() => parse_usd_rate(&raw)?,
            _ => EnrichmentSettings::default().usd_rate,
        };

        let jitter_seed = match env::var("APP_JITTER_SEED") {
            Ok(raw) if !raw.trim().is_empty() => Some(
                raw.trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidJitterSeed)?,
            ),
            _ => None,
        };

        let directory = env::var("APP_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));

        Ok(Self {
            environment,
            telemetry: TelemetryConfig { log_level },
            enrichment: EnrichmentConfig {
                usd_rate,
                jitter_seed,
            },
            output: OutputConfig { directory },
        })
    }
}

pub fn parse_usd_rate(raw: &str) -> Result<f64, ConfigError> {
    match raw.trim().parse::<f64>() {
        Ok(rate) if rate.is_finite() && rate > 0.0 => Ok(rate),
        _ => Err(ConfigError::InvalidUsdRate),
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Knobs of the enrichment run that operators may override.
#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    pub usd_rate: f64,
    /// Fixed seed for coordinate jitter; fresh entropy when unset.
    pub jitter_seed: Option<u64>,
}

impl EnrichmentConfig {
    pub fn settings(&self) -> EnrichmentSettings {
        EnrichmentSettings {
            usd_rate: self.usd_rate,
            ..EnrichmentSettings::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub directory: PathBuf,
}

impl OutputConfig {
    pub fn default_csv_path(&self) -> PathBuf {
        self.directory.join("properties_enhanced.csv")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidUsdRate,
    InvalidJitterSeed,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidUsdRate => write!(f, "APP_USD_RATE must be a positive number"),
            ConfigError::InvalidJitterSeed => {
                write!(f, "APP_JITTER_SEED must be an unsigned 64-bit integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
