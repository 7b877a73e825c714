pub mod robot;
pub mod strategy;

pub use robot::{Robot, TradingDesk, FORCED_CLOSE_ORDER_ID, POSITION_EPSILON};
pub use strategy::{GeneStrategy, SignalContext, Strategy};
