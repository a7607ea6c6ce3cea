use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use common::{Candle, IndicatorError, Result};

/// Load candles from CSV file
///
/// Expected columns: time, open, high, low, close, volume (with header row)
pub fn load_csv(path: &Path) -> Result<Vec<Candle>> {
    let file = File::open(path).map_err(|e| IndicatorError::DataLoadError(e.to_string()))?;
    read_csv(BufReader::new(file))
}

pub fn read_csv<R: Read>(reader: R) -> Result<Vec<Candle>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut candles = Vec::new();

    for result in csv_reader.records() {
        let record = result.map_err(|e| IndicatorError::CsvError(e.to_string()))?;

        if record.len() < 6 {
            continue;
        }

        candles.push(Candle {
            time: parse_timestamp(&record[0])?,
            open: parse_price(&record[1], "open")?,
            high: parse_price(&record[2], "high")?,
            low: parse_price(&record[3], "low")?,
            close: parse_price(&record[4], "close")?,
            volume: parse_price(&record[5], "volume")?,
        });
    }

    Ok(candles)
}

/// Load candles from a JSON array
pub fn load_json(path: &Path) -> Result<Vec<Candle>> {
    let file = File::open(path).map_err(|e| IndicatorError::DataLoadError(e.to_string()))?;
    let reader = BufReader::new(file);
    let candles: Vec<Candle> = serde_json::from_reader(reader)?;
    Ok(candles)
}

fn parse_price(s: &str, column: &str) -> Result<f64> {
    s.parse()
        .map_err(|_| IndicatorError::CsvError(format!("Invalid {} value: {}", column, s)))
}

/// Parse timestamp into unix seconds from various formats
fn parse_timestamp(s: &str) -> Result<i64> {
    // Unix timestamp (seconds)
    if let Ok(ts) = s.parse::<i64>() {
        return Ok(ts);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc).timestamp());
    }

    let datetime_formats = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"];
    for fmt in &datetime_formats {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&dt).timestamp());
        }
    }

    let date_formats = ["%Y-%m-%d", "%Y/%m/%d"];
    for fmt in &date_formats {
        if let Some(dt) = chrono::NaiveDate::parse_from_str(s, fmt)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
        {
            return Ok(Utc.from_utc_datetime(&dt).timestamp());
        }
    }

    Err(IndicatorError::CsvError(format!(
        "Unable to parse timestamp: {}",
        s
    )))
}
