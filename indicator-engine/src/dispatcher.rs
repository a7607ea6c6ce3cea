//! Entry point for chart overlays: turns an [`IndicatorRequest`] into a
//! validated [`IndicatorSpec`] and runs the matching calculator.

use common::{
    close_series, Candle, EmaSeed, EngineConfig, IndicatorError, IndicatorKind, IndicatorRequest,
    IndicatorSeries, Result, PARAM_FAST_PERIOD, PARAM_PERIOD, PARAM_SIGNAL_PERIOD,
    PARAM_SLOW_PERIOD, PARAM_STD_DEV_MULTIPLIER,
};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::indicators::{
    bollinger, calculate_bollinger_bands, calculate_ema, calculate_macd, calculate_rsi,
    calculate_sma, check_history, ema, ensure_ordered, macd, rsi, sma,
};

/// A request whose parameters passed validation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorSpec {
    Sma { period: usize },
    Ema { period: usize },
    Rsi { period: usize },
    Macd { fast: usize, slow: usize, signal: usize },
    Bollinger { period: usize, multiplier: f64 },
}

impl IndicatorSpec {
    pub fn from_request(request: &IndicatorRequest) -> Result<Self> {
        let kind: IndicatorKind = request.kind.parse()?;

        let spec = match kind {
            IndicatorKind::Sma => IndicatorSpec::Sma {
                period: period_param(request, PARAM_PERIOD, sma::MIN_PERIOD)?,
            },
            IndicatorKind::Ema => IndicatorSpec::Ema {
                period: period_param(request, PARAM_PERIOD, ema::MIN_PERIOD)?,
            },
            IndicatorKind::Rsi => IndicatorSpec::Rsi {
                period: period_param(request, PARAM_PERIOD, rsi::MIN_PERIOD)?,
            },
            IndicatorKind::Macd => {
                let fast = period_param(request, PARAM_FAST_PERIOD, macd::MIN_PERIOD)?;
                let slow = period_param(request, PARAM_SLOW_PERIOD, macd::MIN_PERIOD)?;
                let signal = period_param(request, PARAM_SIGNAL_PERIOD, macd::MIN_PERIOD)?;
                macd::validate_periods(fast, slow, signal)?;
                IndicatorSpec::Macd { fast, slow, signal }
            }
            IndicatorKind::BollingerBands => {
                let period = period_param(request, PARAM_PERIOD, sma::MIN_PERIOD)?;
                let multiplier = required_param(request, PARAM_STD_DEV_MULTIPLIER)?;
                bollinger::validate_multiplier(multiplier)?;
                IndicatorSpec::Bollinger { period, multiplier }
            }
        };

        Ok(spec)
    }

    pub fn kind(&self) -> IndicatorKind {
        match self {
            IndicatorSpec::Sma { .. } => IndicatorKind::Sma,
            IndicatorSpec::Ema { .. } => IndicatorKind::Ema,
            IndicatorSpec::Rsi { .. } => IndicatorKind::Rsi,
            IndicatorSpec::Macd { .. } => IndicatorKind::Macd,
            IndicatorSpec::Bollinger { .. } => IndicatorKind::BollingerBands,
        }
    }

    /// Leading candles without output, so `len(output) = len(candles) - warm_up`
    pub fn warm_up(&self, seed: EmaSeed) -> usize {
        match *self {
            IndicatorSpec::Sma { period } | IndicatorSpec::Bollinger { period, .. } => {
                period.saturating_sub(1)
            }
            IndicatorSpec::Ema { period } => ema::warm_up(period, seed),
            IndicatorSpec::Rsi { period } => period,
            IndicatorSpec::Macd { slow, signal, .. } => macd::warm_up(slow, signal, seed),
        }
    }

    /// Shortest candle history that yields at least one point
    pub fn min_candles(&self, seed: EmaSeed) -> usize {
        self.warm_up(seed).saturating_add(1)
    }
}

fn required_param(request: &IndicatorRequest, key: &str) -> Result<f64> {
    request
        .param(key)
        .ok_or_else(|| IndicatorError::configuration(key, "missing required parameter"))
}

fn period_param(request: &IndicatorRequest, key: &str, min: usize) -> Result<usize> {
    let value = required_param(request, key)?;
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(IndicatorError::configuration(
            key,
            format!("must be a whole number, got {}", value),
        ));
    }
    if value < min as f64 {
        return Err(IndicatorError::configuration(
            key,
            format!("must be at least {}, got {}", min, value),
        ));
    }
    // `as usize` saturates, so anything at or past the top of the range is refused here
    if value >= usize::MAX as f64 {
        return Err(IndicatorError::configuration(
            key,
            format!("is too large, got {}", value),
        ));
    }
    Ok(value as usize)
}

/// Stateless indicator dispatcher
#[derive(Debug, Clone, Default)]
pub struct IndicatorEngine {
    config: EngineConfig,
}

impl IndicatorEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validate `request` and compute it over `candles`
    pub fn compute(
        &self,
        candles: &[Candle],
        request: &IndicatorRequest,
    ) -> Result<IndicatorSeries> {
        let spec = IndicatorSpec::from_request(request)?;
        ensure_ordered(candles)?;

        let series = self.compute_spec(candles, &spec)?;
        debug!(
            indicator = %request.label(),
            candles = candles.len(),
            points = series.len(),
            "computed indicator"
        );
        Ok(series)
    }

    /// Run an already validated spec; candle order is assumed
    pub fn compute_spec(
        &self,
        candles: &[Candle],
        spec: &IndicatorSpec,
    ) -> Result<IndicatorSeries> {
        let seed = self.config.ema_seed;
        check_history(spec.min_candles(seed), candles.len())?;
        let closes = close_series(candles);

        match *spec {
            IndicatorSpec::Sma { period } => {
                calculate_sma(&closes, period).map(IndicatorSeries::Line)
            }
            IndicatorSpec::Ema { period } => {
                calculate_ema(&closes, period, seed).map(IndicatorSeries::Line)
            }
            IndicatorSpec::Rsi { period } => {
                calculate_rsi(&closes, period).map(IndicatorSeries::Line)
            }
            IndicatorSpec::Macd { fast, slow, signal } => {
                calculate_macd(&closes, fast, slow, signal, seed).map(IndicatorSeries::Macd)
            }
            IndicatorSpec::Bollinger { period, multiplier } => {
                calculate_bollinger_bands(&closes, period, multiplier).map(IndicatorSeries::Bands)
            }
        }
    }

    /// Compute every request independently and in parallel; results keep request order
    pub fn compute_all(
        &self,
        candles: &[Candle],
        requests: &[IndicatorRequest],
    ) -> Vec<Result<IndicatorSeries>> {
        requests
            .par_iter()
            .map(|request| {
                let result = self.compute(candles, request);
                if let Err(e) = &result {
                    warn!(indicator = %request.label(), error = %e, "indicator request failed");
                }
                result
            })
            .collect()
    }
}

/// Compute one indicator with the default engine configuration
pub fn compute(candles: &[Candle], request: &IndicatorRequest) -> Result<IndicatorSeries> {
    IndicatorEngine::default().compute(candles, request)
}
