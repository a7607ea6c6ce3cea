use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::{json, Map, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

use indicator_engine::{
    generate_synthetic_candles, load_file, Candle, EmaSeed, EngineConfig, IndicatorDefaults,
    IndicatorEngine, IndicatorKind, IndicatorRequest, IndicatorSeries,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SeedArg {
    FirstValue,
    Sma,
}

impl From<SeedArg> for EmaSeed {
    fn from(seed: SeedArg) -> Self {
        match seed {
            SeedArg::FirstValue => EmaSeed::FirstValue,
            SeedArg::Sma => EmaSeed::Sma,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "indicator-engine")]
#[command(version = "0.1.0")]
#[command(about = "Compute indicator series from OHLCV candles", long_about = None)]
struct Args {
    /// Candle file path (CSV/JSON). If not provided, uses synthetic data.
    #[arg(short = 'f', long)]
    data_file: Option<PathBuf>,

    /// Number of synthetic candles
    #[arg(short, long, default_value = "200")]
    bars: usize,

    /// Initial price for synthetic data
    #[arg(long, default_value = "50.0")]
    initial_price: f64,

    /// Seconds between synthetic candles
    #[arg(long, default_value = "60")]
    interval: i64,

    /// Indicator to compute, as `kind` or `kind:key=value,...` (repeatable)
    #[arg(short, long = "indicator", value_name = "SPEC")]
    indicators: Vec<String>,

    /// Engine config file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// EMA seeding, overrides the config file
    #[arg(long, value_enum)]
    ema_seed: Option<SeedArg>,

    /// Output format (json, text)
    #[arg(short, long, default_value = "json")]
    output: String,

    /// Pretty print JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(seed) = args.ema_seed {
        config = config.with_ema_seed(seed.into());
    }

    let requests = if args.indicators.is_empty() {
        IndicatorKind::ALL
            .iter()
            .map(|kind| config.defaults.request_for(*kind))
            .collect()
    } else {
        args.indicators
            .iter()
            .map(|arg| parse_indicator_arg(arg, &config.defaults))
            .collect::<Result<Vec<_>>>()?
    };

    // Load or generate data
    let candles = if let Some(path) = &args.data_file {
        info!("Loading candles from {:?}", path);
        load_file(path)?
    } else {
        info!(
            "Generating {} synthetic candles (initial price: {:.2})",
            args.bars, args.initial_price
        );
        generate_synthetic_candles(args.bars, args.initial_price, args.interval)
    };

    info!(
        "Computing {} indicators over {} candles",
        requests.len(),
        candles.len()
    );

    let engine = IndicatorEngine::new(config);
    let results = engine.compute_all(&candles, &requests);

    match args.output.as_str() {
        "json" => {
            let mut report = Map::new();
            for (request, result) in requests.iter().zip(&results) {
                let entry = match result {
                    Ok(series) => serde_json::to_value(series)?,
                    Err(e) => json!({ "error": e.to_string() }),
                };
                report.insert(request.label(), entry);
            }
            let report = Value::Object(report);
            let json = if args.pretty {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string(&report)?
            };
            println!("{}", json);
        }
        "text" => print_text_report(&candles, &requests, &results),
        _ => {
            eprintln!("Unknown output format: {}. Using text.", args.output);
            print_text_report(&candles, &requests, &results);
        }
    }

    Ok(())
}

/// Parse `rsi`, `sma:period=50` or `macd:fastPeriod=8,slowPeriod=21,signalPeriod=5`
fn parse_indicator_arg(arg: &str, defaults: &IndicatorDefaults) -> Result<IndicatorRequest> {
    let (kind, params) = match arg.split_once(':') {
        Some((kind, params)) => (kind.trim(), Some(params)),
        None => (arg.trim(), None),
    };

    let Some(params) = params else {
        let kind: IndicatorKind = kind.parse()?;
        return Ok(defaults.request_for(kind));
    };

    let mut request = IndicatorRequest::new(kind);
    for pair in params.split(',').filter(|p| !p.trim().is_empty()) {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("expected key=value in indicator parameters, got `{}`", pair);
        };
        let value: f64 = value
            .trim()
            .parse()
            .with_context(|| format!("parameter `{}` is not a number", key.trim()))?;
        request = request.with_param(key.trim(), value);
    }
    Ok(request)
}

fn print_text_report(
    candles: &[Candle],
    requests: &[IndicatorRequest],
    results: &[indicator_engine::Result<IndicatorSeries>],
) {
    println!();
    println!("================================================================");
    println!("  INDICATOR REPORT");
    println!("================================================================");
    println!();
    println!("  Candles: {}", candles.len());
    if let (Some(first), Some(last)) = (candles.first(), candles.last()) {
        let fmt = |c: &Candle| {
            c.datetime()
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| c.time.to_string())
        };
        println!("  Period:  {} to {}", fmt(first), fmt(last));
        println!("  Last close: {:>12.4}", last.close);
    }
    println!();
    println!("----------------------------------------------------------------");

    for (request, result) in requests.iter().zip(results) {
        let label = request.label();
        match result {
            Ok(IndicatorSeries::Line(points)) => {
                if let Some(last) = points.last() {
                    println!("  {:<28} {:>12.4}   ({} points)", label, last.value, points.len());
                }
            }
            Ok(IndicatorSeries::Bands(bands)) => {
                if let Some(last) = bands.last() {
                    println!(
                        "  {:<28} upper {:.4} / middle {:.4} / lower {:.4}   ({} points)",
                        label,
                        last.upper,
                        last.middle,
                        last.lower,
                        bands.len()
                    );
                }
            }
            Ok(IndicatorSeries::Macd(macd)) => {
                if let (Some(m), Some(s), Some(h)) = (
                    macd.macd_line.last(),
                    macd.signal_line.last(),
                    macd.histogram.last(),
                ) {
                    println!(
                        "  {:<28} macd {:.4} / signal {:.4} / hist {:+.4}",
                        label, m.value, s.value, h.value
                    );
                }
            }
            Err(e) => println!("  {:<28} error: {}", label, e),
        }
    }

    println!();
    println!("================================================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind_only_uses_defaults() {
        let request = parse_indicator_arg("rsi", &IndicatorDefaults::default()).unwrap();
        assert_eq!(request, IndicatorRequest::rsi(14));
    }

    #[test]
    fn test_parse_with_params() {
        let request = parse_indicator_arg(
            "MACD:fastPeriod=8, slowPeriod=21,signalPeriod=5",
            &IndicatorDefaults::default(),
        )
        .unwrap();
        assert_eq!(request, IndicatorRequest::macd(8, 21, 5));
    }

    #[test]
    fn test_parse_keeps_unknown_kind_for_dispatcher() {
        let request = parse_indicator_arg("vwap:period=3", &IndicatorDefaults::default()).unwrap();
        assert_eq!(request.kind, "vwap");
    }

    #[test]
    fn test_parse_rejects_malformed_pair() {
        assert!(parse_indicator_arg("sma:period", &IndicatorDefaults::default()).is_err());
        assert!(parse_indicator_arg("sma:period=abc", &IndicatorDefaults::default()).is_err());
        assert!(parse_indicator_arg("unknown", &IndicatorDefaults::default()).is_err());
    }
}
