//! Append-only indicator evaluation.
//!
//! An [`IncrementalIndicator`] keeps the calculator state for one request so a
//! new candle costs O(1) instead of a full recompute. Its accumulated series is
//! identical to what [`IndicatorEngine::compute`](crate::IndicatorEngine::compute)
//! returns for the same candles, since both fold the same state machines.

use common::{
    BandPoint, Candle, EngineConfig, IndicatorError, IndicatorPoint, IndicatorRequest,
    IndicatorSeries, MacdSeries, Result,
};
use tracing::trace;

use crate::dispatcher::IndicatorSpec;
use crate::indicators::{BollingerState, EmaState, MacdState, RsiState, SmaState};

#[derive(Debug, Clone)]
enum CalculatorState {
    Sma(SmaState),
    Ema(EmaState),
    Rsi(RsiState),
    Macd(MacdState),
    Bollinger(BollingerState),
}

/// Output produced by one appended candle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorUpdate {
    Value(IndicatorPoint),
    Band(BandPoint),
    Macd {
        macd: IndicatorPoint,
        signal: Option<IndicatorPoint>,
        histogram: Option<IndicatorPoint>,
    },
}

#[derive(Debug, Clone)]
pub struct IncrementalIndicator {
    spec: IndicatorSpec,
    state: CalculatorState,
    series: IndicatorSeries,
    last_time: Option<i64>,
    candles_seen: usize,
}

impl IncrementalIndicator {
    /// Validate `request` the same way the dispatcher does
    pub fn new(request: &IndicatorRequest, config: &EngineConfig) -> Result<Self> {
        let spec = IndicatorSpec::from_request(request)?;
        Ok(Self::from_spec(spec, config))
    }

    pub fn from_spec(spec: IndicatorSpec, config: &EngineConfig) -> Self {
        let seed = config.ema_seed;
        let (state, series) = match spec {
            IndicatorSpec::Sma { period } => (
                CalculatorState::Sma(SmaState::new(period)),
                IndicatorSeries::Line(Vec::new()),
            ),
            IndicatorSpec::Ema { period } => (
                CalculatorState::Ema(EmaState::new(period, seed)),
                IndicatorSeries::Line(Vec::new()),
            ),
            IndicatorSpec::Rsi { period } => (
                CalculatorState::Rsi(RsiState::new(period)),
                IndicatorSeries::Line(Vec::new()),
            ),
            IndicatorSpec::Macd { fast, slow, signal } => (
                CalculatorState::Macd(MacdState::new(fast, slow, signal, seed)),
                IndicatorSeries::Macd(MacdSeries::default()),
            ),
            IndicatorSpec::Bollinger { period, multiplier } => (
                CalculatorState::Bollinger(BollingerState::new(period, multiplier)),
                IndicatorSeries::Bands(Vec::new()),
            ),
        };

        Self {
            spec,
            state,
            series,
            last_time: None,
            candles_seen: 0,
        }
    }

    /// Fold one candle in. Returns the new output, if the warm-up is over.
    ///
    /// A candle whose time does not follow the previous one is rejected and
    /// leaves the indicator unchanged.
    pub fn extend(&mut self, candle: &Candle) -> Result<Option<IndicatorUpdate>> {
        if let Some(previous) = self.last_time {
            if candle.time <= previous {
                return Err(IndicatorError::UnorderedCandles {
                    index: self.candles_seen,
                    previous,
                    current: candle.time,
                });
            }
        }
        self.last_time = Some(candle.time);
        self.candles_seen += 1;

        let time = candle.time;
        let value = candle.close;
        let update = match &mut self.state {
            CalculatorState::Sma(state) => value_update(time, state.next(value)),
            CalculatorState::Ema(state) => value_update(time, state.next(value)),
            CalculatorState::Rsi(state) => value_update(time, state.next(value)),
            CalculatorState::Bollinger(state) => state.next(time, value).map(IndicatorUpdate::Band),
            CalculatorState::Macd(state) => state.next(value).map(|step| IndicatorUpdate::Macd {
                macd: IndicatorPoint::new(time, step.macd),
                signal: step.signal.map(|s| IndicatorPoint::new(time, s)),
                histogram: step.histogram().map(|h| IndicatorPoint::new(time, h)),
            }),
        };

        match (update, &mut self.series) {
            (Some(IndicatorUpdate::Value(point)), IndicatorSeries::Line(points)) => {
                points.push(point)
            }
            (Some(IndicatorUpdate::Band(band)), IndicatorSeries::Bands(bands)) => bands.push(band),
            (
                Some(IndicatorUpdate::Macd {
                    macd,
                    signal,
                    histogram,
                }),
                IndicatorSeries::Macd(series),
            ) => {
                series.macd_line.push(macd);
                series.signal_line.extend(signal);
                series.histogram.extend(histogram);
            }
            _ => {}
        }

        trace!(
            kind = %self.spec.kind(),
            time,
            ready = update.is_some(),
            "extended incremental indicator"
        );
        Ok(update)
    }

    /// Fold a batch of candles, stopping at the first rejected one
    pub fn extend_all(&mut self, candles: &[Candle]) -> Result<()> {
        for candle in candles {
            self.extend(candle)?;
        }
        Ok(())
    }

    pub fn spec(&self) -> &IndicatorSpec {
        &self.spec
    }

    pub fn series(&self) -> &IndicatorSeries {
        &self.series
    }

    pub fn candles_seen(&self) -> usize {
        self.candles_seen
    }
}

fn value_update(time: i64, value: Option<f64>) -> Option<IndicatorUpdate> {
    value.map(|value| IndicatorUpdate::Value(IndicatorPoint::new(time, value)))
}
