use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::check_period;

pub const DEFAULT_RSI_PERIOD: usize = 14;

/// Reading reported when there is not enough history for an RSI.
pub const NEUTRAL_RSI: f64 = 50.0;

/// RSI over a single fixed window of the last `period` price changes.
///
/// Gains and losses are plain sums over the window, recomputed from scratch
/// on every call. There is no Wilder smoothing.
pub fn rsi(prices: &[f64], period: usize) -> Result<f64, Report<IndicatorError>> {
    check_period(period)?;
    if prices.len() <= period {
        bail!(IndicatorError::InsufficientData {
            required: period + 1,
            available: prices.len(),
        });
    }

    let window = &prices[prices.len() - period - 1..];
    let (gains, losses) = window
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold((0.0_f64, 0.0_f64), |(g, l), d| {
            if d > 0.0 { (g + d, l) } else { (g, l - d) }
        });

    if losses == 0.0 {
        return Ok(100.0);
    }
    let rs = gains / losses;
    Ok(100.0 - 100.0 / (1.0 + rs))
}
