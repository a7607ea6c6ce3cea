use common::{close_series, Candle, EmaSeed, IndicatorPoint, Result, PARAM_PERIOD};

use super::{check_history, check_period};

pub const MIN_PERIOD: usize = 1;

/// Exponential moving average recurrence with smoothing constant `2 / (period + 1)`
#[derive(Debug, Clone)]
pub struct EmaState {
    period: usize,
    multiplier: f64,
    seed: EmaSeed,
    current: Option<f64>,
    seed_sum: f64,
    seed_count: usize,
}

impl EmaState {
    pub fn new(period: usize, seed: EmaSeed) -> Self {
        Self {
            period,
            multiplier: 2.0 / (period as f64 + 1.0),
            seed,
            current: None,
            seed_sum: 0.0,
            seed_count: 0,
        }
    }

    pub fn next(&mut self, value: f64) -> Option<f64> {
        let ema = match (self.current, self.seed) {
            (Some(prev), _) => value * self.multiplier + prev * (1.0 - self.multiplier),
            (None, EmaSeed::FirstValue) => value,
            (None, EmaSeed::Sma) => {
                self.seed_sum += value;
                self.seed_count += 1;
                if self.seed_count < self.period {
                    return None;
                }
                self.seed_sum / self.period as f64
            }
        };
        self.current = Some(ema);
        Some(ema)
    }
}

/// Leading inputs that produce no EMA value
pub fn warm_up(period: usize, seed: EmaSeed) -> usize {
    match seed {
        EmaSeed::FirstValue => 0,
        EmaSeed::Sma => period.saturating_sub(1),
    }
}

/// EMA over any value series without parameter checks; MACD feeds its own line through here
pub(crate) fn ema_points(
    values: &[IndicatorPoint],
    period: usize,
    seed: EmaSeed,
) -> Vec<IndicatorPoint> {
    let mut state = EmaState::new(period, seed);
    values
        .iter()
        .filter_map(|point| {
            state
                .next(point.value)
                .map(|ema| IndicatorPoint::new(point.time, ema))
        })
        .collect()
}

/// Calculate Exponential Moving Average
///
/// With `EmaSeed::FirstValue` the series starts at the first input, so early
/// values lean toward that seed. `EmaSeed::Sma` starts at index `period - 1`
/// with the mean of the first `period` values.
pub fn calculate_ema(
    values: &[IndicatorPoint],
    period: usize,
    seed: EmaSeed,
) -> Result<Vec<IndicatorPoint>> {
    check_period(PARAM_PERIOD, period, MIN_PERIOD)?;
    check_history(warm_up(period, seed) + 1, values.len())?;

    Ok(ema_points(values, period, seed))
}

/// EMA of candle closes
pub fn ema(candles: &[Candle], period: usize, seed: EmaSeed) -> Result<Vec<IndicatorPoint>> {
    calculate_ema(&close_series(candles), period, seed)
}
