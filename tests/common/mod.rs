#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tradevolve::engines::evaluation::{SignalContext, Strategy};
use tradevolve::error::{EvolutionError, Result};
use tradevolve::logging::{Logger, MemorySink};
use tradevolve::market::MarketClient;
use tradevolve::types::{
    Action, MarketSnapshot, OrderFill, OrderRequest, Side, Signal, VenuePosition,
};

pub const SYMBOL: &str = "BTCUSDT";
const EPOCH: i64 = 1_700_000_000;

pub fn at_minute(minute: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(EPOCH + minute * 60, 0).unwrap()
}

pub fn snapshot(price: f64) -> MarketSnapshot {
    MarketSnapshot {
        timestamp: at_minute(0),
        current_price: price,
        rsi: 50.0,
        ema: price,
        volume_ratio: 1.0,
        trend_aligned: false,
    }
}

pub fn memory_logger() -> (Arc<MemorySink>, Logger) {
    let sink = Arc::new(MemorySink::new());
    let logger = Logger::new(sink.clone(), "test");
    (sink, logger)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CloseBehavior {
    Confirm,
    Deny,
    Fail,
}

#[derive(Debug)]
struct StubState {
    step: i64,
    oscillating: bool,
    fail_snapshots: bool,
    fail_orders: bool,
    fill_prices: VecDeque<f64>,
    last_price: f64,
    close_behavior: CloseBehavior,
    venue_positions: Vec<VenuePosition>,
    orders: Vec<OrderRequest>,
    close_calls: usize,
    snapshot_calls: usize,
}

/// Deterministic market collaborator with scriptable failures
pub struct StubMarket {
    state: Mutex<StubState>,
}

impl StubMarket {
    /// Constant price of 100 with neutral indicators
    pub fn flat() -> Self {
        Self::with(false)
    }

    /// Cyclic prices and indicators that trigger every catalog rule
    pub fn oscillating() -> Self {
        Self::with(true)
    }

    fn with(oscillating: bool) -> Self {
        Self {
            state: Mutex::new(StubState {
                step: 0,
                oscillating,
                fail_snapshots: false,
                fail_orders: false,
                fill_prices: VecDeque::new(),
                last_price: 100.0,
                close_behavior: CloseBehavior::Confirm,
                venue_positions: Vec::new(),
                orders: Vec::new(),
                close_calls: 0,
                snapshot_calls: 0,
            }),
        }
    }

    /// Next fills execute at these prices, then at the last snapshot price
    pub fn queue_fills(&self, prices: &[f64]) {
        self.state.lock().unwrap().fill_prices.extend(prices);
    }

    pub fn fail_orders(&self, fail: bool) {
        self.state.lock().unwrap().fail_orders = fail;
    }

    pub fn fail_snapshots(&self, fail: bool) {
        self.state.lock().unwrap().fail_snapshots = fail;
    }

    pub fn close_behavior(&self, behavior: CloseBehavior) {
        self.state.lock().unwrap().close_behavior = behavior;
    }

    pub fn set_venue_positions(&self, positions: Vec<VenuePosition>) {
        self.state.lock().unwrap().venue_positions = positions;
    }

    pub fn orders(&self) -> Vec<OrderRequest> {
        self.state.lock().unwrap().orders.clone()
    }

    pub fn close_calls(&self) -> usize {
        self.state.lock().unwrap().close_calls
    }

    /// Every snapshot request, including failed ones
    pub fn snapshot_calls(&self) -> usize {
        self.state.lock().unwrap().snapshot_calls
    }
}

impl MarketClient for StubMarket {
    fn get_market_snapshot(&self) -> Result<MarketSnapshot> {
        let mut state = self.state.lock().unwrap();
        state.snapshot_calls += 1;
        if state.fail_snapshots {
            return Err(EvolutionError::Market("feed offline".to_string()));
        }

        let t = state.step as f64;
        state.step += 1;
        let snapshot = if state.oscillating {
            MarketSnapshot {
                timestamp: at_minute(state.step),
                current_price: 100.0 + 5.0 * (0.5 * t).sin(),
                rsi: 50.0 + 35.0 * (0.9 * t).sin(),
                ema: 100.0,
                volume_ratio: 1.0 + (1.3 * t).sin(),
                trend_aligned: state.step % 3 == 0,
            }
        } else {
            MarketSnapshot {
                timestamp: at_minute(state.step),
                ..snapshot(100.0)
            }
        };
        state.last_price = snapshot.current_price;
        Ok(snapshot)
    }

    fn place_order(&self, request: &OrderRequest) -> Result<OrderFill> {
        let mut state = self.state.lock().unwrap();
        if state.fail_orders {
            return Err(EvolutionError::OrderRejected("venue unavailable".to_string()));
        }
        state.orders.push(request.clone());
        let executed_price = state.fill_prices.pop_front().unwrap_or(state.last_price);
        Ok(OrderFill {
            executed_price,
            order_id: format!("stub-{}", state.orders.len()),
        })
    }

    fn get_positions(&self, symbol: &str) -> Result<Vec<VenuePosition>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .venue_positions
            .iter()
            .filter(|p| p.symbol == symbol)
            .cloned()
            .collect())
    }

    fn close_all_longs(&self, _symbol: &str) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        state.close_calls += 1;
        match state.close_behavior {
            CloseBehavior::Confirm => Ok(true),
            CloseBehavior::Deny => Ok(false),
            CloseBehavior::Fail => Err(EvolutionError::Timeout {
                operation: "close_all_longs".to_string(),
                timeout_ms: 5_000,
            }),
        }
    }
}

pub fn venue_long(qty: f64) -> VenuePosition {
    VenuePosition {
        symbol: SYMBOL.to_string(),
        side: Side::Buy,
        size: qty,
        avg_price: 100.0,
    }
}

/// Replays queued signals, then holds
#[derive(Default)]
pub struct ScriptedStrategy {
    signals: Mutex<VecDeque<Signal>>,
}

impl ScriptedStrategy {
    pub fn new(signals: Vec<Signal>) -> Self {
        Self {
            signals: Mutex::new(signals.into()),
        }
    }

    pub fn push(&self, signal: Signal) {
        self.signals.lock().unwrap().push_back(signal);
    }
}

impl Strategy for ScriptedStrategy {
    fn generate_signal(
        &self,
        _symbol: &str,
        snapshot: &MarketSnapshot,
        _context: &SignalContext<'_>,
    ) -> Signal {
        self.signals
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Signal::hold(snapshot.current_price))
    }
}

/// Holds, remembering the snapshot time behind every signal request
#[derive(Clone, Default)]
pub struct RecordingStrategy {
    seen: Arc<Mutex<Vec<DateTime<Utc>>>>,
}

impl RecordingStrategy {
    pub fn seen(&self) -> Vec<DateTime<Utc>> {
        self.seen.lock().unwrap().clone()
    }
}

impl Strategy for RecordingStrategy {
    fn generate_signal(
        &self,
        _symbol: &str,
        snapshot: &MarketSnapshot,
        _context: &SignalContext<'_>,
    ) -> Signal {
        self.seen.lock().unwrap().push(snapshot.timestamp);
        Signal::hold(snapshot.current_price)
    }
}

/// Buys a fixed quantity on every step
pub struct AlwaysBuy {
    pub qty: f64,
}

impl Strategy for AlwaysBuy {
    fn generate_signal(
        &self,
        _symbol: &str,
        snapshot: &MarketSnapshot,
        _context: &SignalContext<'_>,
    ) -> Signal {
        Signal {
            action: Action::Buy,
            price: snapshot.current_price,
            qty: self.qty,
        }
    }
}

pub fn buy(price: f64, qty: f64) -> Signal {
    Signal {
        action: Action::Buy,
        price,
        qty,
    }
}

pub fn sell(price: f64, qty: f64) -> Signal {
    Signal {
        action: Action::Sell,
        price,
        qty,
    }
}
