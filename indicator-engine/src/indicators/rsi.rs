use common::{close_series, Candle, IndicatorPoint, Result, PARAM_PERIOD};

use super::{check_history, check_period};

pub const MIN_PERIOD: usize = 2;

/// RSI with Wilder's smoothing (weight `1 / period`)
///
/// The first `period` deltas seed plain averages of gains and losses; later
/// deltas update them as `(avg * (period - 1) + x) / period`.
#[derive(Debug, Clone)]
pub struct RsiState {
    period: usize,
    prev_value: Option<f64>,
    seed_deltas: usize,
    avg_gain: f64,
    avg_loss: f64,
}

impl RsiState {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            prev_value: None,
            seed_deltas: 0,
            avg_gain: 0.0,
            avg_loss: 0.0,
        }
    }

    pub fn next(&mut self, value: f64) -> Option<f64> {
        let prev = self.prev_value.replace(value)?;
        let delta = value - prev;
        let (gain, loss) = if delta >= 0.0 {
            (delta, 0.0)
        } else {
            (0.0, -delta)
        };
        let period = self.period as f64;

        if self.seed_deltas < self.period {
            self.avg_gain += gain;
            self.avg_loss += loss;
            self.seed_deltas += 1;
            if self.seed_deltas < self.period {
                return None;
            }
            self.avg_gain /= period;
            self.avg_loss /= period;
        } else {
            self.avg_gain = (self.avg_gain * (period - 1.0) + gain) / period;
            self.avg_loss = (self.avg_loss * (period - 1.0) + loss) / period;
        }

        Some(rsi_from_averages(self.avg_gain, self.avg_loss))
    }
}

/// RSI from smoothed averages; no losses means 100 rather than a division by zero
pub fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
}

/// Calculate RSI using Wilder's Smoothing
///
/// # Arguments
/// * `values` - Time-ordered series (typically closes)
/// * `period` - RSI period, at least 2
///
/// # Returns
/// One point per input from index `period` onwards, each within `[0, 100]`
pub fn calculate_rsi(values: &[IndicatorPoint], period: usize) -> Result<Vec<IndicatorPoint>> {
    check_period(PARAM_PERIOD, period, MIN_PERIOD)?;
    check_history(period.saturating_add(1), values.len())?;

    let mut state = RsiState::new(period);
    let mut rsi = Vec::with_capacity(values.len() - period);
    for point in values {
        if let Some(value) = state.next(point.value) {
            rsi.push(IndicatorPoint::new(point.time, value));
        }
    }

    Ok(rsi)
}

/// RSI of candle closes
pub fn rsi(candles: &[Candle], period: usize) -> Result<Vec<IndicatorPoint>> {
    calculate_rsi(&close_series(candles), period)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use common::IndicatorError;

    use super::*;
    use crate::indicators::test_support::{candles_from_closes, points_from_values};

    #[test]
    fn test_rsi_basic() {
        let closes = [44.0, 44.25, 44.5, 43.75, 44.5, 44.25, 44.0, 43.5, 44.25, 44.5];
        let candles = candles_from_closes(&closes);
        let rsi = rsi(&candles, 2).unwrap();

        assert_eq!(rsi.len(), closes.len() - 2);
        assert_eq!(rsi[0].time, candles[2].time);
        // RSI should be between 0 and 100
        for point in &rsi {
            assert!(point.value >= 0.0 && point.value <= 100.0);
        }
    }

    #[test]
    fn test_rsi_wilder_values() {
        // Deltas: +2, -1, +3
        let rsi = calculate_rsi(&points_from_values(&[10.0, 12.0, 11.0, 14.0]), 2).unwrap();

        // Seed: gain 1.0, loss 0.5 => RS 2
        assert_relative_eq!(rsi[0].value, 100.0 - 100.0 / 3.0, epsilon = 1e-12);
        // gain (1*1 + 3)/2 = 2, loss (0.5*1)/2 = 0.25 => RS 8
        assert_relative_eq!(rsi[1].value, 100.0 - 100.0 / 9.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rsi_all_gains() {
        let candles = candles_from_closes(&[10.0, 11.0, 12.0, 13.0]);
        let rsi = rsi(&candles, 3).unwrap();

        // No losses: RSI is defined as 100, never NaN
        assert_eq!(rsi.len(), 1);
        assert_eq!(rsi[0].value, 100.0);

        let longer = calculate_rsi(
            &points_from_values(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]),
            2,
        )
        .unwrap();
        assert!(longer.iter().all(|p| p.value == 100.0));
    }

    #[test]
    fn test_rsi_all_losses() {
        let rsi = calculate_rsi(
            &points_from_values(&[15.0, 14.0, 13.0, 12.0, 11.0, 10.0]),
            2,
        )
        .unwrap();

        // All losses should result in RSI = 0
        assert!(rsi.iter().all(|p| p.value == 0.0));
    }

    #[test]
    fn test_rsi_needs_period_plus_one() {
        let err = calculate_rsi(&points_from_values(&[1.0, 2.0, 3.0]), 3).unwrap_err();
        assert!(matches!(
            err,
            IndicatorError::InsufficientData {
                required: 4,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_rsi_rejects_period_one() {
        let err = calculate_rsi(&points_from_values(&[1.0, 2.0, 3.0]), 1).unwrap_err();
        assert!(matches!(err, IndicatorError::Configuration { .. }));
    }
}
