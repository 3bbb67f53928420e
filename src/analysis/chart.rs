use error_stack::Report;
use serde::Serialize;

use crate::analysis::{LONG_TERM_PERIOD, MIN_HISTORY, SHORT_TERM_PERIOD, price_series};
use crate::error::AnalysisError;
use crate::indicator::ema;
use crate::model::PriceHistoryPoint;

/// One plotted sample: the price plus both EMA lines at that time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub time: i64,
    pub price: f64,
    pub ema_short: f64,
    pub ema_long: f64,
}

/// Build the price chart overlay with the default 7/21 EMA pair.
///
/// Like the trend analysis, a history shorter than `MIN_HISTORY` is not
/// charted.
pub fn default_overlay(history: &[PriceHistoryPoint]) -> Result<Vec<ChartPoint>, Report<AnalysisError>> {
    if history.len() < MIN_HISTORY {
        return Ok(Vec::new());
    }
    overlay(history, SHORT_TERM_PERIOD, LONG_TERM_PERIOD)
}

/// Build chart points carrying short and long EMA lines.
///
/// The first `long` samples only warm up the averages and are not emitted,
/// so a history of `long` samples or fewer yields an empty chart.
pub fn overlay(
    history: &[PriceHistoryPoint],
    short: usize,
    long: usize,
) -> Result<Vec<ChartPoint>, Report<AnalysisError>> {
    if history.len() <= long {
        return Ok(Vec::new());
    }

    let prices = price_series(history)?;
    let ema_short = ema(&prices, short);
    let ema_long = ema(&prices, long);

    Ok(history
        .iter()
        .zip(prices.iter())
        .zip(ema_short.iter().zip(ema_long.iter()))
        .skip(long)
        .map(|((point, &price), (&ema_short, &ema_long))| ChartPoint {
            time: point.time,
            price,
            ema_short,
            ema_long,
        })
        .collect())
}
