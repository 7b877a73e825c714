use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Decision produced by a decision tree or a strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

/// Order side as understood by the venue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
}

/// Open long exposure in one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub qty: f64,
    pub avg_price: f64,
}

/// Buy legs carry what was paid, sell legs what was received
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TradeLeg {
    Buy { cost: f64 },
    Sell { revenue: f64 },
}

/// Immutable record of one executed fill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub leg: TradeLeg,
    pub price: f64,
    pub qty: f64,
    pub timestamp: DateTime<Utc>,
    pub order_id: String,
}

impl Trade {
    pub fn buy(price: f64, qty: f64, timestamp: DateTime<Utc>, order_id: String) -> Self {
        Self {
            leg: TradeLeg::Buy { cost: price * qty },
            price,
            qty,
            timestamp,
            order_id,
        }
    }

    pub fn sell(price: f64, qty: f64, timestamp: DateTime<Utc>, order_id: String) -> Self {
        Self {
            leg: TradeLeg::Sell { revenue: price * qty },
            price,
            qty,
            timestamp,
            order_id,
        }
    }

    pub fn action(&self) -> Action {
        match self.leg {
            TradeLeg::Buy { .. } => Action::Buy,
            TradeLeg::Sell { .. } => Action::Sell,
        }
    }

    /// Zero for sell legs
    pub fn cost(&self) -> f64 {
        match self.leg {
            TradeLeg::Buy { cost } => cost,
            TradeLeg::Sell { .. } => 0.0,
        }
    }

    /// Zero for buy legs
    pub fn revenue(&self) -> f64 {
        match self.leg {
            TradeLeg::Buy { .. } => 0.0,
            TradeLeg::Sell { revenue } => revenue,
        }
    }
}

/// One market observation shared by every robot within a step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub timestamp: DateTime<Utc>,
    pub current_price: f64,
    pub rsi: f64,
    pub ema: f64,
    pub volume_ratio: f64,
    pub trend_aligned: bool,
}

/// Trading intent returned by a strategy
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub action: Action,
    pub price: f64,
    pub qty: f64,
}

impl Signal {
    pub fn hold(price: f64) -> Self {
        Self {
            action: Action::Hold,
            price,
            qty: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub qty: f64,
    pub price: Option<f64>,
    pub reduce_only: bool,
    pub timeout: Duration,
}

/// Confirmed, complete fill reported by the venue
#[derive(Debug, Clone, PartialEq)]
pub struct OrderFill {
    pub executed_price: f64,
    pub order_id: String,
}

/// Position as reported by the venue
#[derive(Debug, Clone, PartialEq)]
pub struct VenuePosition {
    pub symbol: String,
    pub side: Side,
    pub size: f64,
    pub avg_price: f64,
}
