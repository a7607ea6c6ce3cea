pub mod loader;
pub mod synthetic;

pub use loader::{load_csv, load_json, read_csv};
pub use synthetic::generate_synthetic_candles;

use std::path::Path;

use common::{Candle, IndicatorError, Result};

/// Load candles from file, detecting format from extension
pub fn load_file(path: &Path) -> Result<Vec<Candle>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        _ => Err(IndicatorError::DataLoadError(format!(
            "Unsupported file format: {}",
            ext
        ))),
    }
}
