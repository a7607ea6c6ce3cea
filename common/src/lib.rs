pub mod config;
pub mod error;
pub mod types;

pub use config::{EmaSeed, EngineConfig, IndicatorDefaults};
pub use error::{IndicatorError, Result};
pub use types::*;
