//! MACD: fast EMA minus slow EMA, with a signal line that is an EMA of that difference.

use common::{
    close_series, Candle, EmaSeed, IndicatorError, IndicatorPoint, MacdSeries, Result,
    PARAM_FAST_PERIOD, PARAM_SIGNAL_PERIOD, PARAM_SLOW_PERIOD,
};

use super::ema::{self, ema_points, EmaState};
use super::{check_history, check_period};

pub const MIN_PERIOD: usize = 1;

/// MACD values produced by one input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdStep {
    pub macd: f64,
    /// `None` while the signal EMA is still seeding
    pub signal: Option<f64>,
}

impl MacdStep {
    pub fn histogram(&self) -> Option<f64> {
        self.signal.map(|signal| self.macd - signal)
    }
}

/// Streaming MACD built from three EMA states
#[derive(Debug, Clone)]
pub struct MacdState {
    fast: EmaState,
    slow: EmaState,
    signal: EmaState,
}

impl MacdState {
    pub fn new(
        fast_period: usize,
        slow_period: usize,
        signal_period: usize,
        seed: EmaSeed,
    ) -> Self {
        Self {
            fast: EmaState::new(fast_period, seed),
            slow: EmaState::new(slow_period, seed),
            signal: EmaState::new(signal_period, seed),
        }
    }

    pub fn next(&mut self, value: f64) -> Option<MacdStep> {
        let fast = self.fast.next(value);
        let slow = self.slow.next(value);
        let macd = fast? - slow?;
        Some(MacdStep {
            macd,
            signal: self.signal.next(macd),
        })
    }
}

/// Leading inputs without a signal value
pub fn warm_up(slow_period: usize, signal_period: usize, seed: EmaSeed) -> usize {
    ema::warm_up(slow_period, seed).saturating_add(ema::warm_up(signal_period, seed))
}

/// Compose the three EMAs; period ordering is not checked here
pub(crate) fn macd_components(
    values: &[IndicatorPoint],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
    seed: EmaSeed,
) -> MacdSeries {
    let fast = ema_points(values, fast_period, seed);
    let slow = ema_points(values, slow_period, seed);

    // Both EMAs end on the last input; drop the head of whichever started earlier
    let skip_fast = fast.len().saturating_sub(slow.len());
    let skip_slow = slow.len().saturating_sub(fast.len());
    let macd_line: Vec<IndicatorPoint> = fast[skip_fast..]
        .iter()
        .zip(&slow[skip_slow..])
        .map(|(f, s)| IndicatorPoint::new(s.time, f.value - s.value))
        .collect();

    let signal_line = ema_points(&macd_line, signal_period, seed);
    let offset = macd_line.len() - signal_line.len();
    let histogram = macd_line[offset..]
        .iter()
        .zip(&signal_line)
        .map(|(m, s)| IndicatorPoint::new(s.time, m.value - s.value))
        .collect();

    MacdSeries {
        macd_line,
        signal_line,
        histogram,
    }
}

/// Check MACD periods: all at least 1, fast strictly below slow
pub fn validate_periods(
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> Result<()> {
    check_period(PARAM_FAST_PERIOD, fast_period, MIN_PERIOD)?;
    check_period(PARAM_SLOW_PERIOD, slow_period, MIN_PERIOD)?;
    check_period(PARAM_SIGNAL_PERIOD, signal_period, MIN_PERIOD)?;
    if fast_period >= slow_period {
        return Err(IndicatorError::configuration(
            PARAM_FAST_PERIOD,
            format!(
                "must be less than {} ({}), got {}",
                PARAM_SLOW_PERIOD, slow_period, fast_period
            ),
        ));
    }
    Ok(())
}

/// Calculate MACD line, signal line and histogram
pub fn calculate_macd(
    values: &[IndicatorPoint],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
    seed: EmaSeed,
) -> Result<MacdSeries> {
    validate_periods(fast_period, slow_period, signal_period)?;
    check_history(
        warm_up(slow_period, signal_period, seed).saturating_add(1),
        values.len(),
    )?;

    Ok(macd_components(
        values,
        fast_period,
        slow_period,
        signal_period,
        seed,
    ))
}

/// MACD of candle closes
pub fn macd(
    candles: &[Candle],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
    seed: EmaSeed,
) -> Result<MacdSeries> {
    calculate_macd(
        &close_series(candles),
        fast_period,
        slow_period,
        signal_period,
        seed,
    )
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::indicators::ema::calculate_ema;
    use crate::indicators::test_support::{candles_from_closes, points_from_values};

    const CLOSES: [f64; 12] = [
        22.27, 22.19, 22.08, 22.17, 22.18, 22.13, 22.23, 22.43, 22.24, 22.29, 22.15, 22.39,
    ];

    #[test]
    fn test_macd_line_is_fast_minus_slow() {
        let values = points_from_values(&CLOSES);
        let macd = calculate_macd(&values, 3, 6, 4, EmaSeed::FirstValue).unwrap();
        let fast = calculate_ema(&values, 3, EmaSeed::FirstValue).unwrap();
        let slow = calculate_ema(&values, 6, EmaSeed::FirstValue).unwrap();

        assert_eq!(macd.macd_line.len(), CLOSES.len());
        for i in 0..CLOSES.len() {
            assert_eq!(macd.macd_line[i].value, fast[i].value - slow[i].value);
        }
    }

    #[test]
    fn test_signal_is_ema_of_macd_line() {
        let candles = candles_from_closes(&CLOSES);
        let macd = macd(&candles, 3, 6, 4, EmaSeed::FirstValue).unwrap();
        let signal = calculate_ema(&macd.macd_line, 4, EmaSeed::FirstValue).unwrap();

        assert_eq!(macd.signal_line, signal);
        assert_eq!(macd.signal_line[0].time, candles[0].time);
        for (h, (m, s)) in macd
            .histogram
            .iter()
            .zip(macd.macd_line.iter().zip(&macd.signal_line))
        {
            assert_relative_eq!(h.value, m.value - s.value);
        }
    }

    #[test]
    fn test_equal_periods_give_zero_line() {
        let values = points_from_values(&CLOSES);
        let macd = macd_components(&values, 5, 5, 3, EmaSeed::FirstValue);

        assert!(macd.macd_line.iter().all(|p| p.value == 0.0));
        assert!(macd.signal_line.iter().all(|p| p.value == 0.0));
    }

    #[test]
    fn test_sma_seeded_alignment() {
        let values = points_from_values(&CLOSES);
        let macd = calculate_macd(&values, 2, 4, 3, EmaSeed::Sma).unwrap();

        // MACD line starts at the slow warm-up, signal two values later
        assert_eq!(macd.macd_line.len(), CLOSES.len() - 3);
        assert_eq!(macd.macd_line[0].time, 3);
        assert_eq!(macd.signal_line.len(), CLOSES.len() - 5);
        assert_eq!(macd.signal_line[0].time, 5);
        assert_eq!(macd.histogram.len(), macd.signal_line.len());
    }

    #[test]
    fn test_fast_must_be_below_slow() {
        let values = points_from_values(&CLOSES);
        for (fast, slow) in [(6, 6), (8, 6)] {
            let err = calculate_macd(&values, fast, slow, 3, EmaSeed::FirstValue).unwrap_err();
            assert!(matches!(
                err,
                IndicatorError::Configuration { ref field, .. } if field == PARAM_FAST_PERIOD
            ));
        }
    }

    #[test]
    fn test_zero_signal_period() {
        let values = points_from_values(&CLOSES);
        let err = calculate_macd(&values, 3, 6, 0, EmaSeed::FirstValue).unwrap_err();
        assert!(matches!(
            err,
            IndicatorError::Configuration { ref field, .. } if field == PARAM_SIGNAL_PERIOD
        ));
    }

    #[test]
    fn test_warm_up_saturates_for_huge_periods() {
        assert_eq!(warm_up(26, 9, EmaSeed::Sma), 33);
        assert_eq!(warm_up(26, 9, EmaSeed::FirstValue), 0);
        assert_eq!(warm_up(usize::MAX, 3, EmaSeed::Sma), usize::MAX);

        let values = points_from_values(&CLOSES);
        let err = calculate_macd(&values, 2, usize::MAX, usize::MAX, EmaSeed::Sma).unwrap_err();
        assert!(matches!(
            err,
            IndicatorError::InsufficientData {
                required: usize::MAX,
                actual: 12
            }
        ));
    }

    #[test]
    fn test_state_matches_batch() {
        let values = points_from_values(&CLOSES);
        let batch = calculate_macd(&values, 3, 6, 4, EmaSeed::Sma).unwrap();

        let mut state = MacdState::new(3, 6, 4, EmaSeed::Sma);
        let steps: Vec<MacdStep> = values.iter().filter_map(|p| state.next(p.value)).collect();
        let signals: Vec<f64> = steps.iter().filter_map(|s| s.signal).collect();

        assert_eq!(steps.len(), batch.macd_line.len());
        assert_eq!(
            signals,
            batch.signal_line.iter().map(|p| p.value).collect::<Vec<_>>()
        );
    }
}
