use common::Candle;
use rand::Rng;

const START_TIME: i64 = 1_700_000_000;

/// Generate a random-walk candle series, `interval` seconds apart
pub fn generate_synthetic_candles(count: usize, initial_price: f64, interval: i64) -> Vec<Candle> {
    let mut rng = rand::thread_rng();
    let mut candles = Vec::with_capacity(count);

    let mut price = initial_price;
    let step = interval.max(1);
    let volatility = 0.02;
    let drift = 0.0001;

    for i in 0..count {
        let time = START_TIME + i as i64 * step;

        let random_return: f64 = rng.gen_range(-1.0..1.0);
        let new_price = (price * (1.0 + drift + volatility * random_return)).max(0.01);

        // Generate OHLC
        let range = price * rng.gen_range(0.005..0.03);
        let open = price;
        let close = new_price;
        let high = open.max(close) + rng.gen_range(0.0..range / 2.0);
        let low = (open.min(close) - rng.gen_range(0.0..range / 2.0)).max(0.0);

        // Higher volume on bigger moves
        let volume = 1_000.0 * (1.0 + random_return.abs() * 10.0) * rng.gen_range(0.8..1.2);

        candles.push(Candle {
            time,
            open,
            high,
            low,
            close,
            volume,
        });

        price = new_price;
    }

    candles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_synthetic_candles() {
        let candles = generate_synthetic_candles(100, 50.0, 60);

        assert_eq!(candles.len(), 100);
        assert_eq!(candles[0].open, 50.0);

        for candle in &candles {
            assert!(candle.high >= candle.low);
            assert!(candle.high >= candle.open);
            assert!(candle.high >= candle.close);
            assert!(candle.low <= candle.open);
            assert!(candle.low <= candle.close);
            assert!(candle.volume > 0.0);
        }
        for pair in candles.windows(2) {
            assert_eq!(pair[1].time - pair[0].time, 60);
            assert_eq!(pair[1].open, pair[0].close);
        }
    }

    #[test]
    fn test_zero_interval_still_increasing() {
        let candles = generate_synthetic_candles(3, 10.0, 0);
        assert!(candles.windows(2).all(|p| p[1].time > p[0].time));
    }
}
