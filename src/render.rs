pub mod json;
pub mod terminal;

use std::fmt;
use std::io;

use crate::analysis::chart::ChartPoint;
use crate::model::{Asset, Page, RangePreset, TrendAnalysis};

/// Sink for everything the CLI shows.
pub trait Renderer {
    fn assets(&mut self, assets: &[Asset], page: Page) -> io::Result<()>;

    fn asset(&mut self, asset: &Asset) -> io::Result<()>;

    fn analysis(
        &mut self,
        asset: &Asset,
        range: RangePreset,
        analysis: &TrendAnalysis,
    ) -> io::Result<()>;

    fn chart(&mut self, asset: &Asset, range: RangePreset, points: &[ChartPoint]) -> io::Result<()>;
}

pub const DISCLAIMER: &str =
    "This is a simple analysis for educational purposes only. Not financial advice.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsiZone {
    Overbought,
    Oversold,
    Neutral,
}

impl RsiZone {
    pub fn of(rsi: f64) -> Self {
        if rsi > 70.0 {
            Self::Overbought
        } else if rsi < 30.0 {
            Self::Oversold
        } else {
            Self::Neutral
        }
    }
}

impl fmt::Display for RsiZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overbought => write!(f, "Overbought"),
            Self::Oversold => write!(f, "Oversold"),
            Self::Neutral => write!(f, "Neutral"),
        }
    }
}

/// Display band for a volatility percentage.
///
/// The cut-offs are for display only; the analyzer uses its own thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolatilityBand {
    High,
    Medium,
    Low,
}

impl VolatilityBand {
    pub fn of(volatility: f64) -> Self {
        if volatility > 8.0 {
            Self::High
        } else if volatility < 3.0 {
            Self::Low
        } else {
            Self::Medium
        }
    }
}

impl fmt::Display for VolatilityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "High"),
            Self::Medium => write!(f, "Medium"),
            Self::Low => write!(f, "Low"),
        }
    }
}
