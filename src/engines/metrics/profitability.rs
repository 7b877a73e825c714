// src/engines/metrics/profitability.rs
use crate::types::{Trade, TradeLeg};

/// Returned when nothing was ever bought; a cap, not a ratio
pub const PROFIT_FACTOR_CAP: f64 = 10.0;

pub struct ProfitabilityMetrics;

impl ProfitabilityMetrics {
    /// Gross sell revenue over gross buy cost
    pub fn profit_factor(trades: &[Trade]) -> f64 {
        let (gross_revenue, gross_cost) =
            trades.iter().fold((0.0, 0.0), |(revenue, cost), trade| match trade.leg {
                TradeLeg::Sell { revenue: r } => (revenue + r, cost),
                TradeLeg::Buy { cost: c } => (revenue, cost + c),
            });

        let gross_cost = f64::abs(gross_cost);
        if gross_cost == 0.0 {
            return PROFIT_FACTOR_CAP;
        }
        gross_revenue / gross_cost
    }

    /// Share of trades whose revenue exceeds their cost
    pub fn win_rate(trades: &[Trade]) -> f64 {
        if trades.is_empty() {
            return 0.0;
        }
        let winners = trades.iter().filter(|t| t.revenue() > t.cost()).count();
        winners as f64 / trades.len() as f64
    }
}
