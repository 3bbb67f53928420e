pub mod coincap;

use error_stack::Report;
use futures::future::BoxFuture;

use crate::error::SourceError;
use crate::model::{Asset, HistoryWindow, Page, PriceHistoryPoint};

/// Upstream market-data API. Methods return `BoxFuture` so the CLI can hold
/// a `&dyn MarketSource`.
pub trait MarketSource: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch one page of assets ordered by rank.
    fn list_assets(&self, page: Page) -> BoxFuture<'_, Result<Vec<Asset>, Report<SourceError>>>;

    /// Fetch a single asset; `None` when the id is unknown upstream.
    fn asset(&self, id: &str) -> BoxFuture<'_, Result<Option<Asset>, Report<SourceError>>>;

    /// Fetch price history, oldest first.
    fn history(
        &self,
        id: &str,
        window: HistoryWindow,
    ) -> BoxFuture<'_, Result<Vec<PriceHistoryPoint>, Report<SourceError>>>;
}
