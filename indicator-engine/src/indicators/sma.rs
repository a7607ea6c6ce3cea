use std::collections::VecDeque;

use common::{close_series, Candle, IndicatorPoint, Result, PARAM_PERIOD};

use super::{check_history, check_period};

pub const MIN_PERIOD: usize = 2;

/// Trailing-window mean kept with a running sum
#[derive(Debug, Clone)]
pub struct SmaState {
    period: usize,
    window: VecDeque<f64>,
    sum: f64,
}

impl SmaState {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            window: VecDeque::with_capacity(period.min(4096)),
            sum: 0.0,
        }
    }

    /// Push one value; returns the mean once the window is full
    pub fn next(&mut self, value: f64) -> Option<f64> {
        if self.window.len() == self.period {
            if let Some(leaving) = self.window.pop_front() {
                self.sum -= leaving;
            }
        }
        self.window.push_back(value);
        self.sum += value;

        if self.window.len() == self.period {
            Some(self.sum / self.period as f64)
        } else {
            None
        }
    }

    /// Values currently inside the window, oldest first
    pub fn window(&self) -> &VecDeque<f64> {
        &self.window
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

/// Calculate Simple Moving Average over a value series
///
/// # Arguments
/// * `values` - Time-ordered series (typically closes)
/// * `period` - Window length, at least 2
///
/// # Returns
/// One point per input from index `period - 1` onwards
pub fn calculate_sma(values: &[IndicatorPoint], period: usize) -> Result<Vec<IndicatorPoint>> {
    check_period(PARAM_PERIOD, period, MIN_PERIOD)?;
    check_history(period, values.len())?;

    let mut state = SmaState::new(period);
    let mut sma = Vec::with_capacity(values.len() + 1 - period);
    for point in values {
        if let Some(mean) = state.next(point.value) {
            sma.push(IndicatorPoint::new(point.time, mean));
        }
    }

    Ok(sma)
}

/// SMA of candle closes
pub fn sma(candles: &[Candle], period: usize) -> Result<Vec<IndicatorPoint>> {
    calculate_sma(&close_series(candles), period)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use common::IndicatorError;

    use super::*;
    use crate::indicators::test_support::{candles_from_closes, points_from_values};

    #[test]
    fn test_sma_basic() {
        let candles = candles_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let sma = sma(&candles, 3).unwrap();

        let values: Vec<f64> = sma.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
        // Outputs line up with candles 2, 3 and 4
        assert_eq!(sma[0].time, candles[2].time);
        assert_eq!(sma[2].time, candles[4].time);
    }

    #[test]
    fn test_sma_window_sum() {
        let closes = [
            22.27, 22.19, 22.08, 22.17, 22.18, 22.13, 22.23, 22.43, 22.24, 22.29, 22.15, 22.39,
        ];
        let period = 4;
        let sma = calculate_sma(&points_from_values(&closes), period).unwrap();

        assert_eq!(sma.len(), closes.len() - (period - 1));
        for (offset, point) in sma.iter().enumerate() {
            let i = offset + period - 1;
            let window_sum: f64 = closes[i + 1 - period..=i].iter().sum();
            assert_relative_eq!(point.value * period as f64, window_sum, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_sma_period_larger_than_data() {
        let err = calculate_sma(&points_from_values(&[1.0, 2.0, 3.0]), 5).unwrap_err();
        assert!(matches!(
            err,
            IndicatorError::InsufficientData {
                required: 5,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_sma_rejects_small_period() {
        let values = points_from_values(&[1.0, 2.0, 3.0]);
        for period in [0, 1] {
            let err = calculate_sma(&values, period).unwrap_err();
            assert!(matches!(err, IndicatorError::Configuration { .. }));
        }
    }

    #[test]
    fn test_sma_state_emits_after_warmup() {
        let mut state = SmaState::new(2);
        assert_eq!(state.next(4.0), None);
        assert_eq!(state.next(6.0), Some(5.0));
        assert_eq!(state.next(10.0), Some(8.0));
        assert_eq!(state.window().len(), 2);
    }
}
