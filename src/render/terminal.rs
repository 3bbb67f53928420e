use std::io::{self, Write};

use chrono::DateTime;

use crate::analysis::chart::ChartPoint;
use crate::analysis::{LONG_TERM_PERIOD, SHORT_TERM_PERIOD};
use crate::format;
use crate::model::{Asset, Page, RangePreset, Trend, TrendAnalysis};
use crate::render::{DISCLAIMER, Renderer, RsiZone, VolatilityBand};

const GAUGE_WIDTH: usize = 20;

/// Plain-text output for a terminal.
pub struct TerminalRenderer<W: Write> {
    out: W,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn assets(&mut self, assets: &[Asset], page: Page) -> io::Result<()> {
        writeln!(
            self.out,
            "{:>5}  {:<8} {:<20} {:>14} {:>9} {:>12}",
            "RANK", "SYMBOL", "NAME", "PRICE", "24H", "MARKET CAP"
        )?;
        for asset in assets {
            writeln!(
                self.out,
                "{:>5}  {:<8} {:<20} {:>14} {:>9} {:>12}",
                asset.rank,
                asset.symbol,
                truncate(&asset.name, 20),
                format::currency_str(&asset.price_usd),
                format::percent_change_str(&asset.change_percent_24hr),
                format::currency_str(&asset.market_cap_usd),
            )?;
        }
        if assets.is_empty() {
            writeln!(self.out, "(no assets)")?;
        }
        write!(self.out, "page {} ({} per page)", page.number, page.limit)?;
        if let Some(previous) = page.previous() {
            write!(self.out, "  prev: --page {}", previous.number)?;
        }
        if assets.len() == page.limit {
            write!(self.out, "  next: --page {}", page.next().number)?;
        }
        writeln!(self.out)
    }

    fn asset(&mut self, asset: &Asset) -> io::Result<()> {
        let max_supply = match asset.max_supply.as_deref() {
            Some(max) => format!("{} {}", format::large_number_str(max), asset.symbol),
            None => "No limit".to_owned(),
        };

        writeln!(self.out, "{} ({})  rank #{}", asset.name, asset.symbol, asset.rank)?;
        writeln!(
            self.out,
            "  Price:       {}  {} (24h)",
            format::currency_str(&asset.price_usd),
            format::percent_change_str(&asset.change_percent_24hr)
        )?;
        writeln!(self.out, "  Market cap:  {}", format::currency_str(&asset.market_cap_usd))?;
        writeln!(self.out, "  24h volume:  {}", format::currency_str(&asset.volume_usd_24hr))?;
        writeln!(
            self.out,
            "  Supply:      {} {}",
            format::large_number_str(&asset.supply),
            asset.symbol
        )?;
        writeln!(self.out, "  Max supply:  {max_supply}")?;
        if let Some(explorer) = &asset.explorer {
            writeln!(self.out, "  Explorer:    {explorer}")?;
        }
        Ok(())
    }

    fn analysis(
        &mut self,
        asset: &Asset,
        range: RangePreset,
        analysis: &TrendAnalysis,
    ) -> io::Result<()> {
        let metrics = &analysis.metrics;

        writeln!(self.out, "{} ({}) market analysis, {range}", asset.name, asset.symbol)?;
        writeln!(self.out, "  Trend:       {}", trend_label(analysis.trend))?;
        writeln!(
            self.out,
            "  Confidence:  {:>3}% {}",
            analysis.confidence,
            gauge(analysis.confidence)
        )?;
        writeln!(self.out, "  Prediction:  {}", analysis.prediction)?;
        writeln!(self.out, "  RSI:         {} ({})", metrics.rsi, RsiZone::of(metrics.rsi))?;
        writeln!(
            self.out,
            "  Volatility:  {}% ({})",
            metrics.volatility,
            VolatilityBand::of(metrics.volatility)
        )?;
        writeln!(
            self.out,
            "  {SHORT_TERM_PERIOD}-sample avg:  {}",
            format::currency(metrics.short_term_avg)
        )?;
        writeln!(
            self.out,
            "  {LONG_TERM_PERIOD}-sample avg: {}",
            format::currency(metrics.long_term_avg)
        )?;
        writeln!(self.out, "{DISCLAIMER}")
    }

    fn chart(&mut self, asset: &Asset, range: RangePreset, points: &[ChartPoint]) -> io::Result<()> {
        writeln!(self.out, "{} ({}) price chart, {range}", asset.name, asset.symbol)?;
        if points.is_empty() {
            return writeln!(self.out, "(not enough history to plot)");
        }
        writeln!(
            self.out,
            "{:<16} {:>14} {:>14} {:>14}",
            "TIME",
            "PRICE",
            format!("EMA{SHORT_TERM_PERIOD}"),
            format!("EMA{LONG_TERM_PERIOD}")
        )?;
        for point in points {
            let time = DateTime::from_timestamp_millis(point.time)
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| point.time.to_string());
            writeln!(
                self.out,
                "{:<16} {:>14} {:>14} {:>14}",
                time,
                format::currency(point.price),
                format::currency(point.ema_short),
                format::currency(point.ema_long)
            )?;
        }
        Ok(())
    }
}

fn trend_label(trend: Trend) -> &'static str {
    match trend {
        Trend::Bullish => "BULLISH",
        Trend::Bearish => "BEARISH",
        Trend::Neutral => "NEUTRAL",
    }
}

fn gauge(confidence: u8) -> String {
    let filled = usize::from(confidence.min(100)) * GAUGE_WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(GAUGE_WIDTH - filled))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_owned()
    } else {
        let mut out: String = s.chars().take(max - 1).collect();
        out.push('~');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TrendMetrics;
    use crate::source::coincap::CoinCapSource;

    fn render(f: impl FnOnce(&mut TerminalRenderer<Vec<u8>>) -> io::Result<()>) -> String {
        let mut renderer = TerminalRenderer::new(Vec::new());
        f(&mut renderer).unwrap();
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    fn bitcoin() -> Asset {
        CoinCapSource::mock_assets().remove(0)
    }

    #[test]
    fn asset_list_shows_formatted_columns() {
        let assets = CoinCapSource::mock_assets();
        let text = render(|r| r.assets(&assets, Page::default()));
        assert!(text.contains("BTC"));
        assert!(text.contains("$52,000"));
        assert!(text.contains("-0.80%"));
        assert!(text.contains("$1T"));
        assert!(text.contains("page 1 (20 per page)"));
        assert!(!text.contains("prev:"));
        assert!(!text.contains("next:"));
    }

    #[test]
    fn full_page_offers_navigation() {
        let assets = CoinCapSource::mock_assets();
        let text = render(|r| r.assets(&assets, Page::new(2, 3)));
        assert!(text.contains("prev: --page 1"));
        assert!(text.contains("next: --page 3"));
    }

    #[test]
    fn empty_asset_list_is_noted() {
        let text = render(|r| r.assets(&[], Page::new(4, 20)));
        assert!(text.contains("(no assets)"));
        assert!(text.contains("page 4"));
    }

    #[test]
    fn asset_detail_handles_missing_max_supply() {
        let eth = CoinCapSource::mock_assets().remove(1);
        let text = render(|r| r.asset(&eth));
        assert!(text.contains("Ethereum (ETH)  rank #2"));
        assert!(text.contains("Max supply:  No limit"));
        assert!(text.contains("Supply:      120M ETH"));
    }

    #[test]
    fn analysis_shows_zones_and_disclaimer() {
        let analysis = TrendAnalysis {
            trend: Trend::Bullish,
            confidence: 50,
            prediction: "Bullish trend likely to continue".into(),
            metrics: TrendMetrics {
                rsi: 72.0,
                short_term_avg: 52_000.0,
                long_term_avg: 51_000.0,
                volatility: 2.5,
            },
        };
        let text = render(|r| r.analysis(&bitcoin(), RangePreset::Quarter, &analysis));
        assert!(text.contains("BULLISH"));
        assert!(text.contains("50% [##########..........]"));
        assert!(text.contains("72 (Overbought)"));
        assert!(text.contains("2.5% (Low)"));
        assert!(text.contains("$51,000"));
        assert!(text.contains(DISCLAIMER));
    }

    #[test]
    fn chart_without_points_says_so() {
        let text = render(|r| r.chart(&bitcoin(), RangePreset::Week, &[]));
        assert!(text.contains("not enough history"));
    }

    #[test]
    fn chart_rows_carry_dates() {
        let points = [ChartPoint {
            time: 1_704_067_200_000,
            price: 42_000.0,
            ema_short: 41_000.0,
            ema_long: 40_000.0,
        }];
        let text = render(|r| r.chart(&bitcoin(), RangePreset::Month, &points));
        assert!(text.contains("2024-01-01 00:00"));
        assert!(text.contains("$41,000"));
    }

    #[test]
    fn gauge_scales_to_width() {
        assert_eq!(gauge(0), format!("[{}]", ".".repeat(20)));
        assert_eq!(gauge(100), format!("[{}]", "#".repeat(20)));
    }

    #[test]
    fn long_names_are_truncated() {
        assert_eq!(truncate("Bitcoin", 20), "Bitcoin");
        assert_eq!(truncate("abcdef", 4), "abc~");
    }
}
