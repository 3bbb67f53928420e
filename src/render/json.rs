use std::io::{self, Write};

use serde::Serialize;

use crate::analysis::chart::ChartPoint;
use crate::model::{Asset, Page, RangePreset, TrendAnalysis};
use crate::render::Renderer;

/// One JSON document per call, newline terminated.
pub struct JsonRenderer<W: Write> {
    out: W,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn emit<T: Serialize>(&mut self, value: &T) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut self.out, value)?;
        writeln!(self.out)
    }
}

#[derive(Serialize)]
struct AssetPage<'a> {
    page: usize,
    limit: usize,
    assets: &'a [Asset],
}

#[derive(Serialize)]
struct AnalysisDocument<'a> {
    id: &'a str,
    range: &'static str,
    #[serde(flatten)]
    analysis: &'a TrendAnalysis,
}

#[derive(Serialize)]
struct ChartDocument<'a> {
    id: &'a str,
    range: &'static str,
    points: &'a [ChartPoint],
}

impl<W: Write> Renderer for JsonRenderer<W> {
    fn assets(&mut self, assets: &[Asset], page: Page) -> io::Result<()> {
        self.emit(&AssetPage {
            page: page.number,
            limit: page.limit,
            assets,
        })
    }

    fn asset(&mut self, asset: &Asset) -> io::Result<()> {
        self.emit(asset)
    }

    fn analysis(
        &mut self,
        asset: &Asset,
        range: RangePreset,
        analysis: &TrendAnalysis,
    ) -> io::Result<()> {
        self.emit(&AnalysisDocument {
            id: &asset.id,
            range: range.as_str(),
            analysis,
        })
    }

    fn chart(&mut self, asset: &Asset, range: RangePreset, points: &[ChartPoint]) -> io::Result<()> {
        self.emit(&ChartDocument {
            id: &asset.id,
            range: range.as_str(),
            points,
        })
    }
}
