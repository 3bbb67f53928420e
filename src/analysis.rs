pub mod chart;

use error_stack::{Report, ResultExt};
use tracing::debug;

use crate::error::AnalysisError;
use crate::indicator::{DEFAULT_RSI_PERIOD, NEUTRAL_RSI, rsi, sma};
use crate::model::{PriceHistoryPoint, Trend, TrendAnalysis, TrendMetrics};

/// Histories shorter than this produce the fixed "insufficient data" result.
pub const MIN_HISTORY: usize = 30;
pub const SHORT_TERM_PERIOD: usize = 7;
pub const LONG_TERM_PERIOD: usize = 21;

pub const INSUFFICIENT_DATA: &str = "Insufficient data for analysis";

const HIGH_VOLATILITY_PCT: f64 = 10.0;
const LOW_VOLATILITY_PCT: f64 = 3.0;

impl TrendAnalysis {
    /// The neutral, zero-confidence result for a history that is too short.
    pub fn insufficient_data() -> Self {
        Self {
            trend: Trend::Neutral,
            confidence: 0,
            prediction: INSUFFICIENT_DATA.to_owned(),
            metrics: TrendMetrics {
                rsi: NEUTRAL_RSI,
                short_term_avg: 0.0,
                long_term_avg: 0.0,
                volatility: 0.0,
            },
        }
    }
}

/// Classify the trend of a chronological (oldest first) price history.
///
/// Pure and stateless: the same input always yields the same output. A price
/// that does not parse to a finite, non-negative number fails the whole call
/// with [`AnalysisError::InvalidSample`].
pub fn analyze_trend(history: &[PriceHistoryPoint]) -> Result<TrendAnalysis, Report<AnalysisError>> {
    if history.len() < MIN_HISTORY {
        debug!(
            available = history.len(),
            required = MIN_HISTORY,
            "insufficient history for trend analysis"
        );
        return Ok(TrendAnalysis::insufficient_data());
    }

    let prices = price_series(history)?;

    let short_term_avg = sma(&prices, SHORT_TERM_PERIOD).change_context(AnalysisError::Indicator)?;
    let long_term_avg = sma(&prices, LONG_TERM_PERIOD).change_context(AnalysisError::Indicator)?;
    let volatility = volatility(&prices);
    let rsi = rsi(&prices, DEFAULT_RSI_PERIOD).change_context(AnalysisError::Indicator)?;

    let signal = classify(short_term_avg, long_term_avg, rsi).with_volatility(volatility);

    Ok(TrendAnalysis {
        trend: signal.trend,
        confidence: finalize_confidence(signal.confidence),
        prediction: signal.prediction,
        metrics: TrendMetrics {
            rsi: rsi.round(),
            short_term_avg,
            long_term_avg,
            volatility: (volatility * 100.0).round() / 100.0,
        },
    })
}

/// Parse every `price_usd` into a price series.
pub fn price_series(history: &[PriceHistoryPoint]) -> Result<Vec<f64>, Report<AnalysisError>> {
    history
        .iter()
        .enumerate()
        .map(|(index, point)| parse_price(index, &point.price_usd))
        .collect()
}

fn parse_price(index: usize, raw: &str) -> Result<f64, Report<AnalysisError>> {
    let invalid = || AnalysisError::InvalidSample {
        index,
        value: raw.to_owned(),
    };

    let price: f64 = raw.trim().parse().change_context_lazy(invalid)?;
    if !price.is_finite() || price < 0.0 {
        return Err(Report::new(invalid()).attach("price must be finite and non-negative"));
    }
    Ok(price)
}

/// Population standard deviation as a percentage of the mean.
///
/// A zero mean (an all-zero series) reports zero volatility.
pub fn volatility(prices: &[f64]) -> f64 {
    if prices.is_empty() {
        return 0.0;
    }
    let n = prices.len() as f64;
    let mean = prices.iter().sum::<f64>() / n;
    if mean == 0.0 {
        return 0.0;
    }
    let variance = prices.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt() / mean * 100.0
}

#[derive(Debug, Clone, PartialEq)]
struct Signal {
    trend: Trend,
    confidence: f64,
    prediction: String,
}

impl Signal {
    fn new(trend: Trend, confidence: f64, prediction: &str) -> Self {
        Self {
            trend,
            confidence,
            prediction: prediction.to_owned(),
        }
    }

    /// The high and low bands never overlap, so at most one note is added.
    fn with_volatility(mut self, volatility: f64) -> Self {
        if volatility > HIGH_VOLATILITY_PCT {
            self.prediction
                .push_str("; High volatility indicates potential for large price swings");
            self.confidence *= 0.9;
        } else if volatility < LOW_VOLATILITY_PCT {
            self.prediction
                .push_str("; Low volatility might precede a significant price movement");
            self.confidence *= 0.95;
        }
        self
    }
}

fn classify(short: f64, long: f64, rsi: f64) -> Signal {
    if short > long && rsi < 70.0 {
        let base = ((short / long - 1.0) * 100.0).min(90.0);
        if rsi > 65.0 {
            Signal::new(
                Trend::Bullish,
                base * 0.8,
                "Potential overbought conditions, but still in uptrend",
            )
        } else if rsi < 40.0 {
            Signal::new(Trend::Bullish, base * 0.7, "Potential recovery or start of uptrend")
        } else {
            Signal::new(Trend::Bullish, base, "Bullish trend likely to continue")
        }
    } else if short < long && rsi > 30.0 {
        let base = ((long / short - 1.0) * 100.0).min(90.0);
        if rsi < 35.0 {
            Signal::new(
                Trend::Bearish,
                base * 0.8,
                "Potential oversold conditions, but still in downtrend",
            )
        } else if rsi > 60.0 {
            Signal::new(Trend::Bearish, base * 0.7, "Potential reversal or start of downtrend")
        } else {
            Signal::new(Trend::Bearish, base, "Bearish trend likely to continue")
        }
    } else {
        // Both averages zero leaves no price level to compare against.
        let confidence = if long == 0.0 {
            0.0
        } else {
            (100.0 - ((short / long - 1.0) * 200.0).abs()).min(70.0)
        };
        Signal::new(Trend::Neutral, confidence, "Market in consolidation, no clear trend")
    }
}

/// Round, then clamp into `[0, 100]`; a non-finite score becomes 0.
fn finalize_confidence(raw: f64) -> u8 {
    let rounded = raw.round();
    if !rounded.is_finite() {
        return 0;
    }
    rounded.clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(prices: &[f64]) -> Vec<PriceHistoryPoint> {
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| PriceHistoryPoint::new(p.to_string(), 1_704_067_200_000 + i as i64 * 86_400_000))
            .collect()
    }

    /// 30 prices starting at `base`, alternating `+up` and `-down`.
    fn zigzag(base: f64, up: f64, down: f64) -> Vec<f64> {
        let mut prices = vec![base];
        for i in 1..30 {
            let last = prices[i - 1];
            prices.push(if i % 2 == 1 { last + up } else { last - down });
        }
        prices
    }

    /// 15 flat prices, a step to `level`, then 14 changes alternating `even`/`odd`.
    fn step_then_chop(base: f64, level: f64, even: f64, odd: f64) -> Vec<f64> {
        let mut prices = vec![base; 15];
        prices.push(level);
        for i in 16..30 {
            let last = prices[i - 1];
            prices.push(last + if i % 2 == 0 { even } else { odd });
        }
        prices
    }

    fn analyze(prices: &[f64]) -> TrendAnalysis {
        analyze_trend(&history(prices)).unwrap()
    }

    #[test]
    fn short_history_is_insufficient() {
        let analysis = analyze(&[100.0; 29]);
        assert_eq!(analysis.trend, Trend::Neutral);
        assert_eq!(analysis.confidence, 0);
        assert_eq!(analysis.prediction, "Insufficient data for analysis");
        assert_eq!(analysis.metrics.rsi, 50.0);
        assert_eq!(analysis.metrics.short_term_avg, 0.0);
        assert_eq!(analysis.metrics.long_term_avg, 0.0);
        assert_eq!(analysis.metrics.volatility, 0.0);
    }

    #[test]
    fn empty_history_is_insufficient() {
        assert_eq!(analyze_trend(&[]).unwrap(), TrendAnalysis::insufficient_data());
    }

    #[test]
    fn short_history_skips_price_parsing() {
        let mut points = history(&[1.0; 10]);
        points[3].price_usd = "garbage".into();
        assert_eq!(analyze_trend(&points).unwrap(), TrendAnalysis::insufficient_data());
    }

    #[test]
    fn bullish_continuation() {
        // last 14 changes: 7 x +3, 7 x -2 -> rsi 60
        let analysis = analyze(&zigzag(100.0, 3.0, 2.0));
        assert_eq!(analysis.trend, Trend::Bullish);
        assert_eq!(analysis.prediction, "Bullish trend likely to continue");
        assert_eq!(analysis.confidence, 3);
        assert_eq!(analysis.metrics.rsi, 60.0);
        assert!((analysis.metrics.short_term_avg - 801.0 / 7.0).abs() < 1e-9);
        assert!((analysis.metrics.long_term_avg - 2327.0 / 21.0).abs() < 1e-9);
        assert!((analysis.metrics.volatility - 4.22).abs() < 1e-9);
    }

    #[test]
    fn bullish_overbought_scales_confidence() {
        // rs = 2 -> rsi 66.7
        let analysis = analyze(&zigzag(100.0, 4.0, 2.0));
        assert_eq!(analysis.trend, Trend::Bullish);
        assert_eq!(
            analysis.prediction,
            "Potential overbought conditions, but still in uptrend"
        );
        assert_eq!(analysis.metrics.rsi, 67.0);
        assert_eq!(analysis.confidence, 5);
    }

    #[test]
    fn bullish_recovery_with_high_volatility() {
        let analysis = analyze(&step_then_chop(100.0, 130.0, -2.0, 1.0));
        assert_eq!(analysis.trend, Trend::Bullish);
        assert_eq!(
            analysis.prediction,
            "Potential recovery or start of uptrend; High volatility indicates potential for large price swings"
        );
        assert_eq!(analysis.metrics.rsi, 33.0);
        assert_eq!(analysis.confidence, 3);
    }

    #[test]
    fn bearish_continuation_with_low_volatility() {
        let analysis = analyze(&zigzag(200.0, -3.0, -2.0));
        assert_eq!(analysis.trend, Trend::Bearish);
        assert_eq!(
            analysis.prediction,
            "Bearish trend likely to continue; Low volatility might precede a significant price movement"
        );
        assert_eq!(analysis.metrics.rsi, 40.0);
        assert_eq!(analysis.confidence, 2);
    }

    #[test]
    fn bearish_oversold() {
        let analysis = analyze(&step_then_chop(100.0, 70.0, -2.0, 1.0));
        assert_eq!(analysis.trend, Trend::Bearish);
        assert!(
            analysis
                .prediction
                .starts_with("Potential oversold conditions, but still in downtrend")
        );
        assert_eq!(analysis.confidence, 13);
    }

    #[test]
    fn bearish_reversal() {
        let analysis = analyze(&step_then_chop(100.0, 70.0, 2.0, -1.0));
        assert_eq!(analysis.trend, Trend::Bearish);
        assert!(
            analysis
                .prediction
                .starts_with("Potential reversal or start of downtrend")
        );
        assert_eq!(analysis.metrics.rsi, 67.0);
        assert_eq!(analysis.confidence, 4);
    }

    #[test]
    fn rising_series_with_rsi_100_is_neutral() {
        let prices: Vec<f64> = (1..=30).map(f64::from).collect();
        let analysis = analyze(&prices);
        assert_eq!(analysis.trend, Trend::Neutral);
        assert_eq!(
            analysis.prediction,
            "Market in consolidation, no clear trend; High volatility indicates potential for large price swings"
        );
        // min(100 - |(27/20 - 1) * 200|, 70) * 0.9
        assert_eq!(analysis.confidence, 27);
        assert_eq!(analysis.metrics.rsi, 100.0);
    }

    #[test]
    fn flat_series_is_capped_neutral() {
        let analysis = analyze(&[100.0; 30]);
        assert_eq!(analysis.trend, Trend::Neutral);
        assert_eq!(
            analysis.prediction,
            "Market in consolidation, no clear trend; Low volatility might precede a significant price movement"
        );
        // 70 * 0.95 = 66.5
        assert_eq!(analysis.confidence, 67);
        assert_eq!(analysis.metrics.volatility, 0.0);
    }

    #[test]
    fn all_zero_prices_yield_zero_confidence() {
        let analysis = analyze(&[0.0; 30]);
        assert_eq!(analysis.trend, Trend::Neutral);
        assert_eq!(analysis.confidence, 0);
        assert_eq!(analysis.metrics.volatility, 0.0);
    }

    #[test]
    fn zero_short_average_caps_bearish_confidence() {
        // short avg 0 against a positive long avg: the ratio is infinite
        let mut prices = vec![0.0; 16];
        prices.extend((1..=7).map(|i| f64::from(i) * 10.0));
        prices.extend([0.0; 7]);

        let analysis = analyze(&prices);
        assert_eq!(analysis.trend, Trend::Bearish);
        assert_eq!(analysis.metrics.short_term_avg, 0.0);
        assert!((analysis.metrics.long_term_avg - 280.0 / 21.0).abs() < 1e-9);
        assert_eq!(analysis.metrics.rsi, 50.0);
        // 90 cap, then the high volatility factor
        assert_eq!(analysis.confidence, 81);
        assert_eq!(
            analysis.prediction,
            "Bearish trend likely to continue; High volatility indicates potential for large price swings"
        );
    }

    #[test]
    fn neutral_confidence_never_negative() {
        // Steep rise keeps rsi at 100, so the neutral branch sees a large ratio.
        let prices: Vec<f64> = (0..30).map(|i| 1.0 + (i as f64).powi(3)).collect();
        let analysis = analyze(&prices);
        assert_eq!(analysis.trend, Trend::Neutral);
        assert_eq!(analysis.confidence, 0);
    }

    #[test]
    fn malformed_price_is_reported_with_index() {
        let mut points = history(&[100.0; 30]);
        points[12].price_usd = "12.3.4".into();
        let err = analyze_trend(&points).unwrap_err();
        assert!(matches!(
            err.current_context(),
            AnalysisError::InvalidSample { index: 12, .. }
        ));
    }

    #[test]
    fn non_finite_and_negative_prices_rejected() {
        for bad in ["NaN", "inf", "-5"] {
            let mut points = history(&[100.0; 30]);
            points[0].price_usd = bad.into();
            assert!(analyze_trend(&points).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn analysis_is_idempotent() {
        let points = history(&step_then_chop(100.0, 130.0, -2.0, 1.0));
        assert_eq!(analyze_trend(&points).unwrap(), analyze_trend(&points).unwrap());
    }

    #[test]
    fn confidence_stays_in_range() {
        let series = [
            zigzag(100.0, 3.0, 2.0),
            zigzag(100.0, 40.0, 1.0),
            zigzag(500.0, -30.0, -1.0),
            step_then_chop(1.0, 1000.0, -2.0, 1.0),
            step_then_chop(1000.0, 1.0, 0.5, -0.1),
        ];
        for prices in series {
            let analysis = analyze(&prices);
            assert!(analysis.confidence <= 100);
            assert!((0.0..=100.0).contains(&analysis.metrics.rsi));
            if analysis.trend == Trend::Neutral {
                assert!(analysis.confidence <= 70);
            }
        }
    }

    #[test]
    fn volatility_of_known_series() {
        // mean 5, population stddev 2
        let v = volatility(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((v - 40.0).abs() < 1e-9);
        assert_eq!(volatility(&[]), 0.0);
    }

    #[test]
    fn finalize_confidence_clamps() {
        assert_eq!(finalize_confidence(-20.0), 0);
        assert_eq!(finalize_confidence(f64::NAN), 0);
        assert_eq!(finalize_confidence(f64::INFINITY), 0);
        assert_eq!(finalize_confidence(150.0), 100);
        assert_eq!(finalize_confidence(66.5), 67);
    }
}
