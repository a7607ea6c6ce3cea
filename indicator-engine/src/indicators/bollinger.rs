use common::{
    close_series, BandPoint, Candle, IndicatorError, IndicatorPoint, Result, PARAM_PERIOD,
    PARAM_STD_DEV_MULTIPLIER,
};

use super::sma::{SmaState, MIN_PERIOD};
use super::{check_history, check_period};

/// SMA middle band with population standard deviation over the same window
#[derive(Debug, Clone)]
pub struct BollingerState {
    sma: SmaState,
    std_dev_multiplier: f64,
}

impl BollingerState {
    pub fn new(period: usize, std_dev_multiplier: f64) -> Self {
        Self {
            sma: SmaState::new(period),
            std_dev_multiplier,
        }
    }

    pub fn next(&mut self, time: i64, value: f64) -> Option<BandPoint> {
        let middle = self.sma.next(value)?;
        let period = self.sma.period() as f64;

        let variance = self
            .sma
            .window()
            .iter()
            .map(|x| (x - middle).powi(2))
            .sum::<f64>()
            / period;
        let width = self.std_dev_multiplier * variance.sqrt();

        Some(BandPoint {
            time,
            upper: middle + width,
            middle,
            lower: middle - width,
        })
    }
}

pub fn validate_multiplier(std_dev_multiplier: f64) -> Result<()> {
    if !std_dev_multiplier.is_finite() || std_dev_multiplier <= 0.0 {
        return Err(IndicatorError::configuration(
            PARAM_STD_DEV_MULTIPLIER,
            format!("must be a positive number, got {}", std_dev_multiplier),
        ));
    }
    Ok(())
}

/// Calculate Bollinger Bands
///
/// # Arguments
/// * `values` - Time-ordered series (typically closes)
/// * `period` - Period for moving average (typically 20)
/// * `std_dev_multiplier` - Number of standard deviations (typically 2.0)
///
/// # Returns
/// Upper, middle (SMA) and lower bands from index `period - 1` onwards
pub fn calculate_bollinger_bands(
    values: &[IndicatorPoint],
    period: usize,
    std_dev_multiplier: f64,
) -> Result<Vec<BandPoint>> {
    check_period(PARAM_PERIOD, period, MIN_PERIOD)?;
    validate_multiplier(std_dev_multiplier)?;
    check_history(period, values.len())?;

    let mut state = BollingerState::new(period, std_dev_multiplier);
    let mut bands = Vec::with_capacity(values.len() + 1 - period);
    for point in values {
        if let Some(band) = state.next(point.time, point.value) {
            bands.push(band);
        }
    }

    Ok(bands)
}

/// Bollinger Bands of candle closes
pub fn bollinger(
    candles: &[Candle],
    period: usize,
    std_dev_multiplier: f64,
) -> Result<Vec<BandPoint>> {
    calculate_bollinger_bands(&close_series(candles), period, std_dev_multiplier)
}

/// Calculate %B indicator (position within bands)
/// Returns value between 0 and 1 when within bands
/// < 0 means below lower band, > 1 means above upper band
pub fn percent_b(price: f64, band: &BandPoint) -> f64 {
    if band.upper == band.lower {
        return 0.5;
    }
    (price - band.lower) / (band.upper - band.lower)
}

/// Calculate bandwidth (volatility indicator)
pub fn bandwidth(band: &BandPoint) -> f64 {
    if band.middle == 0.0 {
        return 0.0;
    }
    (band.upper - band.lower) / band.middle
}
