pub mod client;
pub mod lots;
pub mod indicators;
pub mod paper;

pub use client::MarketClient;
pub use lots::LotSizes;
pub use indicators::IndicatorFeed;
pub use paper::PaperExchange;
