use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{IndicatorKind, IndicatorRequest};

/// How the first EMA value is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmaSeed {
    /// Seed with the first value; every input yields an output (warm-up 0)
    #[default]
    FirstValue,
    /// Seed with the SMA of the first `period` values (warm-up `period - 1`)
    Sma,
}

/// Conventional parameters used when a caller names an indicator without parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorDefaults {
    pub sma_period: usize,
    pub ema_period: usize,
    pub rsi_period: usize,
    pub macd_fast_period: usize,
    pub macd_slow_period: usize,
    pub macd_signal_period: usize,
    pub bb_period: usize,
    pub bb_std_dev: f64,
}

impl Default for IndicatorDefaults {
    fn default() -> Self {
        Self {
            sma_period: 20,
            ema_period: 20,
            rsi_period: 14,
            macd_fast_period: 12,
            macd_slow_period: 26,
            macd_signal_period: 9,
            bb_period: 20,
            bb_std_dev: 2.0,
        }
    }
}

impl IndicatorDefaults {
    /// Build a fully parameterised request for `kind`
    pub fn request_for(&self, kind: IndicatorKind) -> IndicatorRequest {
        match kind {
            IndicatorKind::Sma => IndicatorRequest::sma(self.sma_period),
            IndicatorKind::Ema => IndicatorRequest::ema(self.ema_period),
            IndicatorKind::Rsi => IndicatorRequest::rsi(self.rsi_period),
            IndicatorKind::Macd => IndicatorRequest::macd(
                self.macd_fast_period,
                self.macd_slow_period,
                self.macd_signal_period,
            ),
            IndicatorKind::BollingerBands => {
                IndicatorRequest::bollinger(self.bb_period, self.bb_std_dev)
            }
        }
    }
}

/// Engine-wide settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Applies to EMA requests and to the three EMAs inside MACD
    pub ema_seed: EmaSeed,
    pub defaults: IndicatorDefaults,
}

impl EngineConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let config = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    pub fn with_ema_seed(mut self, seed: EmaSeed) -> Self {
        self.ema_seed = seed;
        self
    }

    pub fn with_defaults(mut self, defaults: IndicatorDefaults) -> Self {
        self.defaults = defaults;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.ema_seed, EmaSeed::FirstValue);
        assert_eq!(config.defaults.rsi_period, 14);
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"ema_seed":"sma","defaults":{"rsi_period":2}}"#).unwrap();

        assert_eq!(config.ema_seed, EmaSeed::Sma);
        assert_eq!(config.defaults.rsi_period, 2);
        assert_eq!(config.defaults.macd_slow_period, 26);
    }

    #[test]
    fn test_request_for_uses_defaults() {
        let defaults = IndicatorDefaults::default();
        assert_eq!(
            defaults.request_for(IndicatorKind::Macd),
            IndicatorRequest::macd(12, 26, 9)
        );
        assert_eq!(
            defaults.request_for(IndicatorKind::BollingerBands),
            IndicatorRequest::bollinger(20, 2.0)
        );
    }

    #[test]
    fn test_missing_config_file() {
        let err = EngineConfig::from_json_file(Path::new("/nonexistent/engine.json")).unwrap_err();
        assert!(matches!(err, crate::IndicatorError::IoError(_)));
    }
}
