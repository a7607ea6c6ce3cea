pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use bollinger::{bandwidth, bollinger, calculate_bollinger_bands, percent_b, BollingerState};
pub use ema::{calculate_ema, ema, EmaState};
pub use macd::{calculate_macd, macd, MacdState, MacdStep};
pub use rsi::{calculate_rsi, rsi, RsiState};
pub use sma::{calculate_sma, sma, SmaState};

use common::{Candle, IndicatorError, Result};

/// Reject periods below the calculator's minimum
pub(crate) fn check_period(field: &str, period: usize, min: usize) -> Result<()> {
    if period < min {
        return Err(IndicatorError::configuration(
            field,
            format!("must be at least {}, got {}", min, period),
        ));
    }
    Ok(())
}

/// Reject inputs shorter than the calculator's minimum history
pub(crate) fn check_history(required: usize, actual: usize) -> Result<()> {
    if actual < required {
        return Err(IndicatorError::InsufficientData { required, actual });
    }
    Ok(())
}

/// Candle times must be strictly increasing
pub fn ensure_ordered(candles: &[Candle]) -> Result<()> {
    for (i, pair) in candles.windows(2).enumerate() {
        if pair[1].time <= pair[0].time {
            return Err(IndicatorError::UnorderedCandles {
                index: i + 1,
                previous: pair[0].time,
                current: pair[1].time,
            });
        }
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::test_support::candles_from_closes;
    use super::*;

    #[test]
    fn test_ensure_ordered_accepts_increasing_times() {
        let candles = candles_from_closes(&[1.0, 2.0, 3.0]);
        assert!(ensure_ordered(&candles).is_ok());
        assert!(ensure_ordered(&[]).is_ok());
    }

    #[test]
    fn test_ensure_ordered_rejects_duplicate_time() {
        let mut candles = candles_from_closes(&[1.0, 2.0, 3.0]);
        candles[2].time = candles[1].time;

        let err = ensure_ordered(&candles).unwrap_err();
        assert!(matches!(
            err,
            IndicatorError::UnorderedCandles { index: 2, .. }
        ));
    }

    #[test]
    fn test_check_period() {
        assert!(check_period("period", 2, 2).is_ok());
        let err = check_period("period", 0, 2).unwrap_err();
        assert!(matches!(
            err,
            IndicatorError::Configuration { ref field, .. } if field == "period"
        ));
    }
}
