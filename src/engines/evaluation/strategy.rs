use crate::engines::generation::gene::Gene;
use crate::market::LotSizes;
use crate::types::{Action, MarketSnapshot, Position, Signal};
use crate::utils::round_to;

/// Discount applied to the buy price hint
pub const BUY_PRICE_FACTOR: f64 = 0.99;
/// Premium applied to the sell price hint
pub const SELL_PRICE_FACTOR: f64 = 1.01;

/// Robot state a strategy may look at
#[derive(Debug, Clone, Copy)]
pub struct SignalContext<'a> {
    pub gene: &'a Gene,
    pub balance: f64,
    pub position: Option<&'a Position>,
    /// Minutes since the open position was entered, 0 when flat
    pub minutes_held: i64,
}

pub trait Strategy: Send + Sync {
    fn generate_signal(
        &self,
        symbol: &str,
        snapshot: &MarketSnapshot,
        context: &SignalContext<'_>,
    ) -> Signal;
}

/// Signals from the robot's decision tree, sized by its trade percentage
#[derive(Debug, Clone, Default)]
pub struct GeneStrategy {
    lots: LotSizes,
}

impl GeneStrategy {
    pub fn new(lots: LotSizes) -> Self {
        Self { lots }
    }
}

impl Strategy for GeneStrategy {
    fn generate_signal(
        &self,
        symbol: &str,
        snapshot: &MarketSnapshot,
        context: &SignalContext<'_>,
    ) -> Signal {
        let price = snapshot.current_price;
        if !(price.is_finite() && price > 0.0) {
            return Signal::hold(price);
        }
        let sell_hint = round_to(price * SELL_PRICE_FACTOR, 2);

        // time-based exit takes precedence over the tree
        if let Some(position) = context.position {
            if context.minutes_held >= i64::from(context.gene.max_trade_duration_minutes) {
                return Signal {
                    action: Action::Sell,
                    price: sell_hint,
                    qty: position.qty,
                };
            }
        }

        let qty = self
            .lots
            .round_qty(symbol, context.balance * context.gene.trade_percentage / price);

        match context.gene.decide(snapshot) {
            Action::Buy => Signal {
                action: Action::Buy,
                price: round_to(price * BUY_PRICE_FACTOR, 2),
                qty,
            },
            Action::Sell => Signal {
                action: Action::Sell,
                price: sell_hint,
                qty,
            },
            Action::Hold => Signal::hold(price),
        }
    }
}
