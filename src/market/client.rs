use crate::error::Result;
use crate::types::{MarketSnapshot, OrderFill, OrderRequest, VenuePosition};

/// Market data and order execution as consumed by the evolution core.
///
/// Calls block until they resolve. A fill is all-or-nothing: `Ok` carries a
/// complete fill, any `Err` means the order was not taken. Implementations
/// honour `OrderRequest::timeout` and own any retry policy.
pub trait MarketClient: Send + Sync {
    fn get_market_snapshot(&self) -> Result<MarketSnapshot>;

    fn place_order(&self, request: &OrderRequest) -> Result<OrderFill>;

    fn get_positions(&self, symbol: &str) -> Result<Vec<VenuePosition>>;

    /// Closes every long on `symbol`; `Ok(false)` when the venue declined
    fn close_all_longs(&self, symbol: &str) -> Result<bool>;
}
