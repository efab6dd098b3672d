//! Layered simulation configuration: defaults, optional file, then `UIOT__*` env.
//!
//! Values are fixed at process start; nothing re-reads them mid-run.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be within [0, 1], got {value}")]
    Probability { field: &'static str, value: f64 },
    #[error("{field} must be a non-negative number of seconds that fits a Duration, got {value}")]
    Seconds { field: &'static str, value: f64 },
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
    #[error("sample range is empty: [{min}, {max})")]
    SampleRange { min: f64, max: f64 },
}

/// What a round does with relay/uplink/flush tasks still running once every sensor finished.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TeardownPolicy {
    /// Wait for the round's tasks to drain, bounded by `teardown_timeout_secs`.
    #[default]
    Quiesce,
    /// Sleep `teardown_timeout_secs` and move on without checking.
    Grace,
    /// Leave in-flight work running against the finished round.
    Detach,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    pub uplink_latency_secs: f64,
    pub uplink_loss_probability: f64,
    pub reading_interval_secs: f64,
    pub hop_delay_secs: f64,
    pub collector_latency_secs: f64,
    pub batch_capacity: usize,
    pub history_len: usize,
    pub rounds: u64,
    pub sensor_count: usize,
    pub cycles_per_round: u64,
    pub emergency_threshold: f64,
    pub sample_min: f64,
    pub sample_max: f64,
    pub round_pause_secs: f64,
    pub seed: Option<u64>,
    pub teardown: TeardownPolicy,
    pub teardown_timeout_secs: f64,
    pub artifacts_dir: Option<PathBuf>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            uplink_latency_secs: 3.0,
            uplink_loss_probability: 0.2,
            reading_interval_secs: 5.0,
            hop_delay_secs: 0.2,
            collector_latency_secs: 0.5,
            batch_capacity: 10,
            history_len: 100,
            rounds: 3,
            sensor_count: 5,
            cycles_per_round: 30,
            emergency_threshold: 80.0,
            sample_min: 10.0,
            sample_max: 120.0,
            round_pause_secs: 2.0,
            seed: None,
            teardown: TeardownPolicy::Quiesce,
            teardown_timeout_secs: 30.0,
            artifacts_dir: None,
        }
    }
}

// Accessors assume `validate` passed; out-of-range seconds panic in `from_secs_f64`.
impl SimConfig {
    pub fn uplink_latency(&self) -> Duration { Duration::from_secs_f64(self.uplink_latency_secs) }
    pub fn reading_interval(&self) -> Duration { Duration::from_secs_f64(self.reading_interval_secs) }
    pub fn hop_delay(&self) -> Duration { Duration::from_secs_f64(self.hop_delay_secs) }
    pub fn collector_latency(&self) -> Duration { Duration::from_secs_f64(self.collector_latency_secs) }
    pub fn round_pause(&self) -> Duration { Duration::from_secs_f64(self.round_pause_secs) }
    pub fn teardown_timeout(&self) -> Duration { Duration::from_secs_f64(self.teardown_timeout_secs) }

    /// Parse a YAML document on top of the defaults, then validate.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let cfg: SimConfig = ::config::Config::builder()
            .add_source(::config::File::from_str(text, ::config::FileFormat::Yaml))
            .build()?
            .try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let seconds = [
            ("uplink_latency_secs", self.uplink_latency_secs),
            ("reading_interval_secs", self.reading_interval_secs),
            ("hop_delay_secs", self.hop_delay_secs),
            ("collector_latency_secs", self.collector_latency_secs),
            ("round_pause_secs", self.round_pause_secs),
            ("teardown_timeout_secs", self.teardown_timeout_secs),
        ];
        for (field, value) in seconds {
            if Duration::try_from_secs_f64(value).is_err() { return Err(ConfigError::Seconds { field, value }); }
        }
        if !(0.0..=1.0).contains(&self.uplink_loss_probability) {
            return Err(ConfigError::Probability { field: "uplink_loss_probability", value: self.uplink_loss_probability });
        }
        if self.batch_capacity == 0 { return Err(ConfigError::Zero { field: "batch_capacity" }); }
        if self.history_len == 0 { return Err(ConfigError::Zero { field: "history_len" }); }
        if self.sensor_count == 0 { return Err(ConfigError::Zero { field: "sensor_count" }); }
        if !(self.sample_min < self.sample_max) || !self.sample_min.is_finite() || !self.sample_max.is_finite() {
            return Err(ConfigError::SampleRange { min: self.sample_min, max: self.sample_max });
        }
        Ok(())
    }
}

/// Defaults, then `UIOT_CONFIG_FILE` if set, then `UIOT__<KEY>` environment overrides.
pub fn load_config() -> Result<SimConfig> {
    let mut builder = ::config::Config::builder();
    if let Ok(file) = std::env::var("UIOT_CONFIG_FILE") {
        builder = builder.add_source(::config::File::with_name(&file).required(false));
    }
    builder = builder.add_source(::config::Environment::with_prefix("UIOT").separator("__").try_parsing(true));
    let cfg: SimConfig = builder.build()?.try_deserialize()?;
    cfg.validate()?;
    tracing::debug!(?cfg, "config_loaded");
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = SimConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.batch_capacity, 10);
        assert_eq!(cfg.uplink_latency(), Duration::from_secs(3));
        assert!(cfg.uplink_latency() >= cfg.hop_delay() * 10);
    }

    #[test]
    fn yaml_overrides_only_named_keys() {
        let cfg = SimConfig::from_yaml_str("uplink_loss_probability: 0.0\nbatch_capacity: 4\nteardown: detach\nseed: 7\n").unwrap();
        assert_eq!(cfg.uplink_loss_probability, 0.0);
        assert_eq!(cfg.batch_capacity, 4);
        assert_eq!(cfg.teardown, TeardownPolicy::Detach);
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.sensor_count, 5);
    }

    #[test]
    fn rejects_out_of_range_loss() {
        let cfg = SimConfig { uplink_loss_probability: 1.5, ..Default::default() };
        assert_eq!(cfg.validate(), Err(ConfigError::Probability { field: "uplink_loss_probability", value: 1.5 }));
        assert!(SimConfig::from_yaml_str("uplink_loss_probability: -0.1").is_err());
    }

    #[test]
    fn rejects_zero_capacity_and_negative_delay() {
        let cfg = SimConfig { batch_capacity: 0, ..Default::default() };
        assert_eq!(cfg.validate(), Err(ConfigError::Zero { field: "batch_capacity" }));
        let cfg = SimConfig { hop_delay_secs: -1.0, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(ConfigError::Seconds { field: "hop_delay_secs", .. })));
    }

    #[test]
    fn rejects_seconds_beyond_duration_range() {
        let cfg = SimConfig { uplink_latency_secs: 1e20, ..Default::default() };
        assert_eq!(cfg.validate(), Err(ConfigError::Seconds { field: "uplink_latency_secs", value: 1e20 }));
        let cfg = SimConfig { teardown_timeout_secs: f64::INFINITY, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(ConfigError::Seconds { field: "teardown_timeout_secs", .. })));
        assert!(SimConfig::from_yaml_str("round_pause_secs: 1.0e30").is_err());
        let cfg = SimConfig { reading_interval_secs: 1e9, ..Default::default() };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn load_config_layers_file_then_env() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("sim.yaml");
        std::fs::write(&file, "batch_capacity: 20\nhop_delay_secs: 0.5\nrounds: 7\n").unwrap();

        std::env::set_var("UIOT_CONFIG_FILE", &file);
        std::env::set_var("UIOT__BATCH_CAPACITY", "4");
        std::env::set_var("UIOT__TEARDOWN", "grace");
        let cfg = load_config();
        for key in ["UIOT_CONFIG_FILE", "UIOT__BATCH_CAPACITY", "UIOT__TEARDOWN"] {
            std::env::remove_var(key);
        }
        let cfg = cfg.unwrap();

        assert_eq!(cfg.batch_capacity, 4);
        assert_eq!(cfg.teardown, TeardownPolicy::Grace);
        assert_eq!(cfg.hop_delay(), Duration::from_millis(500));
        assert_eq!(cfg.rounds, 7);
        assert_eq!(cfg.sensor_count, 5);
        assert_eq!(cfg.uplink_loss_probability, 0.2);
    }
}
