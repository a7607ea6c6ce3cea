pub mod data;
pub mod dispatcher;
pub mod incremental;
pub mod indicators;

pub use data::{generate_synthetic_candles, load_file};
pub use dispatcher::{compute, IndicatorEngine, IndicatorSpec};
pub use incremental::{IncrementalIndicator, IndicatorUpdate};

// Re-export common types
pub use common::{
    close_series, BandPoint, Candle, EmaSeed, EngineConfig, IndicatorDefaults, IndicatorError,
    IndicatorKind, IndicatorPoint, IndicatorRequest, IndicatorSeries, MacdSeries, Result,
};
