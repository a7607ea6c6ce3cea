use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndicatorError {
    #[error("Invalid configuration for `{field}`: {reason}")]
    Configuration { field: String, reason: String },

    #[error("Unsupported indicator: {0}")]
    UnsupportedIndicator(String),

    #[error("Insufficient data: need at least {required} candles, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Candles out of order at index {index}: time {current} does not follow {previous}")]
    UnorderedCandles {
        index: usize,
        previous: i64,
        current: i64,
    },

    #[error("Data loading error: {0}")]
    DataLoadError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV parse error: {0}")]
    CsvError(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl IndicatorError {
    pub fn configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, IndicatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_names_field() {
        let err = IndicatorError::configuration("period", "must be at least 2");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for `period`: must be at least 2"
        );
    }

    #[test]
    fn test_insufficient_data_message() {
        let err = IndicatorError::InsufficientData {
            required: 15,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient data: need at least 15 candles, got 3"
        );
    }
}
