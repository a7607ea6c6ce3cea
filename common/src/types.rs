use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::IndicatorError;

/// Parameter keys understood by the dispatcher
pub const PARAM_PERIOD: &str = "period";
pub const PARAM_FAST_PERIOD: &str = "fastPeriod";
pub const PARAM_SLOW_PERIOD: &str = "slowPeriod";
pub const PARAM_SIGNAL_PERIOD: &str = "signalPeriod";
pub const PARAM_STD_DEV_MULTIPLIER: &str = "stdDevMultiplier";

const PARAM_DISPLAY_ORDER: [&str; 5] = [
    PARAM_PERIOD,
    PARAM_FAST_PERIOD,
    PARAM_SLOW_PERIOD,
    PARAM_SIGNAL_PERIOD,
    PARAM_STD_DEV_MULTIPLIER,
];

/// OHLCV candle, `time` in unix seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(time: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.time, 0)
    }

    /// Close price as a series point
    pub fn to_point(&self) -> IndicatorPoint {
        IndicatorPoint::new(self.time, self.close)
    }
}

/// Adapt candles to the numeric series every calculator works on
pub fn close_series(candles: &[Candle]) -> Vec<IndicatorPoint> {
    candles.iter().map(Candle::to_point).collect()
}

/// Single value of a line indicator, also used as a generic time series element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPoint {
    pub time: i64,
    pub value: f64,
}

impl IndicatorPoint {
    pub fn new(time: i64, value: f64) -> Self {
        Self { time, value }
    }
}

/// Bollinger band values at one timestamp
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandPoint {
    pub time: i64,
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// MACD output. `signal_line` is the primary series; `histogram` shares its timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MacdSeries {
    pub macd_line: Vec<IndicatorPoint>,
    pub signal_line: Vec<IndicatorPoint>,
    pub histogram: Vec<IndicatorPoint>,
}

/// Output of one indicator computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum IndicatorSeries {
    Line(Vec<IndicatorPoint>),
    Bands(Vec<BandPoint>),
    Macd(MacdSeries),
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        match self {
            IndicatorSeries::Line(points) => points.len(),
            IndicatorSeries::Bands(bands) => bands.len(),
            IndicatorSeries::Macd(macd) => macd.signal_line.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Timestamps of the primary series
    pub fn times(&self) -> Vec<i64> {
        match self {
            IndicatorSeries::Line(points) => points.iter().map(|p| p.time).collect(),
            IndicatorSeries::Bands(bands) => bands.iter().map(|b| b.time).collect(),
            IndicatorSeries::Macd(macd) => macd.signal_line.iter().map(|p| p.time).collect(),
        }
    }

    /// The line a chart draws first: the line itself, the middle band, or the MACD signal line
    pub fn primary(&self) -> Vec<IndicatorPoint> {
        match self {
            IndicatorSeries::Line(points) => points.clone(),
            IndicatorSeries::Bands(bands) => bands
                .iter()
                .map(|b| IndicatorPoint::new(b.time, b.middle))
                .collect(),
            IndicatorSeries::Macd(macd) => macd.signal_line.clone(),
        }
    }

    pub fn as_line(&self) -> Option<&[IndicatorPoint]> {
        match self {
            IndicatorSeries::Line(points) => Some(points),
            _ => None,
        }
    }

    pub fn as_bands(&self) -> Option<&[BandPoint]> {
        match self {
            IndicatorSeries::Bands(bands) => Some(bands),
            _ => None,
        }
    }

    pub fn as_macd(&self) -> Option<&MacdSeries> {
        match self {
            IndicatorSeries::Macd(macd) => Some(macd),
            _ => None,
        }
    }
}

/// Supported indicator kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndicatorKind {
    #[serde(rename = "SMA")]
    Sma,
    #[serde(rename = "EMA")]
    Ema,
    #[serde(rename = "RSI")]
    Rsi,
    #[serde(rename = "MACD")]
    Macd,
    #[serde(rename = "BollingerBands")]
    BollingerBands,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 5] = [
        IndicatorKind::Sma,
        IndicatorKind::Ema,
        IndicatorKind::Rsi,
        IndicatorKind::Macd,
        IndicatorKind::BollingerBands,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorKind::Sma => "SMA",
            IndicatorKind::Ema => "EMA",
            IndicatorKind::Rsi => "RSI",
            IndicatorKind::Macd => "MACD",
            IndicatorKind::BollingerBands => "BollingerBands",
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndicatorKind {
    type Err = IndicatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SMA" => Ok(IndicatorKind::Sma),
            "EMA" => Ok(IndicatorKind::Ema),
            "RSI" => Ok(IndicatorKind::Rsi),
            "MACD" => Ok(IndicatorKind::Macd),
            "BOLLINGERBANDS" | "BOLLINGER" | "BB" => Ok(IndicatorKind::BollingerBands),
            _ => Err(IndicatorError::UnsupportedIndicator(s.to_string())),
        }
    }
}

/// A named indicator plus its numeric parameters, as sent by the chart UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRequest {
    pub kind: String,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

impl IndicatorRequest {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: f64) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    pub fn sma(period: usize) -> Self {
        Self::new(IndicatorKind::Sma.as_str()).with_param(PARAM_PERIOD, period as f64)
    }

    pub fn ema(period: usize) -> Self {
        Self::new(IndicatorKind::Ema.as_str()).with_param(PARAM_PERIOD, period as f64)
    }

    pub fn rsi(period: usize) -> Self {
        Self::new(IndicatorKind::Rsi.as_str()).with_param(PARAM_PERIOD, period as f64)
    }

    pub fn macd(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        Self::new(IndicatorKind::Macd.as_str())
            .with_param(PARAM_FAST_PERIOD, fast_period as f64)
            .with_param(PARAM_SLOW_PERIOD, slow_period as f64)
            .with_param(PARAM_SIGNAL_PERIOD, signal_period as f64)
    }

    pub fn bollinger(period: usize, std_dev_multiplier: f64) -> Self {
        Self::new(IndicatorKind::BollingerBands.as_str())
            .with_param(PARAM_PERIOD, period as f64)
            .with_param(PARAM_STD_DEV_MULTIPLIER, std_dev_multiplier)
    }

    pub fn param(&self, key: &str) -> Option<f64> {
        self.params.get(key).copied()
    }

    /// Display label such as `MACD(12,26,9)`, used to key chart overlays
    pub fn label(&self) -> String {
        let known = PARAM_DISPLAY_ORDER
            .iter()
            .filter_map(|key| self.params.get(*key));
        let extra = self
            .params
            .iter()
            .filter(|(key, _)| !PARAM_DISPLAY_ORDER.contains(&key.as_str()))
            .map(|(_, value)| value);
        let values: Vec<String> = known.chain(extra).map(|v| v.to_string()).collect();

        if values.is_empty() {
            self.kind.clone()
        } else {
            format!("{}({})", self.kind, values.join(","))
        }
    }
}
