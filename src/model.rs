use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A listed asset as returned by the market-data API.
///
/// Numeric fields are kept as the upstream decimal strings; the formatting
/// helpers parse them at display time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub rank: String,
    pub symbol: String,
    pub name: String,
    pub supply: String,
    #[serde(rename = "maxSupply", default)]
    pub max_supply: Option<String>,
    #[serde(rename = "marketCapUsd")]
    pub market_cap_usd: String,
    #[serde(rename = "volumeUsd24Hr")]
    pub volume_usd_24hr: String,
    #[serde(rename = "priceUsd")]
    pub price_usd: String,
    #[serde(rename = "changePercent24Hr")]
    pub change_percent_24hr: String,
    #[serde(rename = "vwap24Hr", default)]
    pub vwap_24hr: Option<String>,
    #[serde(default)]
    pub explorer: Option<String>,
}

/// One sample of an asset's price history, oldest first in a sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistoryPoint {
    #[serde(rename = "priceUsd")]
    pub price_usd: String,
    /// Epoch milliseconds.
    pub time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

#[cfg(test)]
impl PriceHistoryPoint {
    pub fn new(price_usd: impl Into<String>, time: i64) -> Self {
        Self {
            price_usd: price_usd.into(),
            time,
            date: None,
        }
    }
}

/// Sampling interval accepted by the history endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryInterval {
    Min1,
    Min5,
    Min15,
    Min30,
    Hour1,
    Hour2,
    Hour6,
    Hour12,
    Day1,
}

impl HistoryInterval {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "m1" => Some(Self::Min1),
            "m5" => Some(Self::Min5),
            "m15" => Some(Self::Min15),
            "m30" => Some(Self::Min30),
            "h1" => Some(Self::Hour1),
            "h2" => Some(Self::Hour2),
            "h6" => Some(Self::Hour6),
            "h12" => Some(Self::Hour12),
            "d1" => Some(Self::Day1),
            _ => None,
        }
    }

    /// Query-string form used by the API.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Min1 => "m1",
            Self::Min5 => "m5",
            Self::Min15 => "m15",
            Self::Min30 => "m30",
            Self::Hour1 => "h1",
            Self::Hour2 => "h2",
            Self::Hour6 => "h6",
            Self::Hour12 => "h12",
            Self::Day1 => "d1",
        }
    }
}

impl fmt::Display for HistoryInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Time range choices offered for an asset's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangePreset {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl RangePreset {
    /// Parse a config/CLI string (`"24h"`, `"7d"`, `"30d"`, `"90d"`, `"1y"`).
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "24h" => Some(Self::Day),
            "7d" => Some(Self::Week),
            "30d" => Some(Self::Month),
            "90d" => Some(Self::Quarter),
            "1y" => Some(Self::Year),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "24h",
            Self::Week => "7d",
            Self::Month => "30d",
            Self::Quarter => "90d",
            Self::Year => "1y",
        }
    }

    /// Hourly samples for the 24h view, daily samples otherwise.
    pub fn interval(self) -> HistoryInterval {
        match self {
            Self::Day => HistoryInterval::Hour1,
            _ => HistoryInterval::Day1,
        }
    }

    pub fn days(self) -> i64 {
        match self {
            Self::Day => 1,
            Self::Week => 7,
            Self::Month => 30,
            Self::Quarter => 90,
            Self::Year => 365,
        }
    }

    /// Resolve the preset into a concrete window ending at `now`.
    pub fn window(self, now: DateTime<Utc>) -> HistoryWindow {
        let end = now.timestamp_millis();
        let start = (now - Duration::days(self.days())).timestamp_millis();
        HistoryWindow {
            interval: self.interval(),
            start: Some(start),
            end: Some(end),
        }
    }
}

impl fmt::Display for RangePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Interval plus optional epoch-millisecond bounds for a history request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryWindow {
    pub interval: HistoryInterval,
    pub start: Option<i64>,
    pub end: Option<i64>,
}

/// 1-based page of the asset listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: usize,
    pub limit: usize,
}

impl Page {
    pub const DEFAULT_LIMIT: usize = 20;

    /// Page numbers and limits below 1 are raised to 1.
    pub fn new(number: usize, limit: usize) -> Self {
        Self {
            number: number.max(1),
            limit: limit.max(1),
        }
    }

    /// Saturates instead of overflowing on absurd page numbers.
    pub fn offset(self) -> usize {
        (self.number - 1).saturating_mul(self.limit)
    }

    pub fn next(self) -> Self {
        Self::new(self.number.saturating_add(1), self.limit)
    }

    /// `None` on the first page.
    pub fn previous(self) -> Option<Self> {
        (self.number > 1).then(|| Self::new(self.number - 1, self.limit))
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_LIMIT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bullish => write!(f, "bullish"),
            Self::Bearish => write!(f, "bearish"),
            Self::Neutral => write!(f, "neutral"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendMetrics {
    /// Rounded to the nearest integer, in `[0, 100]`.
    pub rsi: f64,
    pub short_term_avg: f64,
    pub long_term_avg: f64,
    /// Percent of the series mean, rounded to two decimals.
    pub volatility: f64,
}

/// Result of a trend analysis over one price history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendAnalysis {
    pub trend: Trend,
    /// Heuristic score in `[0, 100]`.
    pub confidence: u8,
    pub prediction: String,
    pub metrics: TrendMetrics,
}
