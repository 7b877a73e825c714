use crate::engines::evaluation::strategy::{SignalContext, Strategy};
use crate::engines::generation::gene::Gene;
use crate::engines::metrics::{FitnessReport, TradingHistory};
use crate::logging::Logger;
use crate::market::{LotSizes, MarketClient};
use crate::types::{
    Action, MarketSnapshot, OrderRequest, OrderType, Position, Side, Signal, Trade,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

/// Residual quantity treated as flat
pub const POSITION_EPSILON: f64 = 1e-12;
pub const FORCED_CLOSE_ORDER_ID: &str = "forced-close";

/// Everything a robot needs to turn a signal into an order
#[derive(Clone, Copy)]
pub struct TradingDesk<'a> {
    pub client: &'a dyn MarketClient,
    pub strategy: &'a dyn Strategy,
    pub lots: &'a LotSizes,
    pub order_timeout: Duration,
}

/// One trading agent: a gene plus its own balance, positions and history
#[derive(Debug, Clone)]
pub struct Robot {
    pub id: u64,
    pub generation_born: usize,
    pub balance: f64,
    pub initial_balance: f64,
    pub gene: Gene,
    pub fitness: f64,
    /// May go negative for children of young parents
    pub survived_cycles: i64,
    pub children_count: u32,
    pub current_profit: f64,
    pub last_report: Option<FitnessReport>,
    positions: BTreeMap<String, Position>,
    trades: Vec<Trade>,
    balance_history: Vec<f64>,
    returns: Vec<f64>,
    entry_times: BTreeMap<String, DateTime<Utc>>,
    marks: BTreeMap<String, (f64, DateTime<Utc>)>,
    logger: Logger,
}

impl Robot {
    pub fn new(
        id: u64,
        generation_born: usize,
        initial_balance: f64,
        gene: Gene,
        logger: Logger,
    ) -> Self {
        Self {
            id,
            generation_born,
            balance: initial_balance,
            initial_balance,
            gene,
            fitness: 0.0,
            survived_cycles: 0,
            children_count: 0,
            current_profit: 0.0,
            last_report: None,
            positions: BTreeMap::new(),
            trades: Vec::new(),
            balance_history: vec![initial_balance],
            returns: Vec::new(),
            entry_times: BTreeMap::new(),
            marks: BTreeMap::new(),
            logger,
        }
    }

    pub fn positions(&self) -> &BTreeMap<String, Position> {
        &self.positions
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn balance_history(&self) -> &[f64] {
        &self.balance_history
    }

    pub fn returns(&self) -> &[f64] {
        &self.returns
    }

    pub fn history(&self) -> TradingHistory<'_> {
        TradingHistory {
            robot_id: self.id,
            profit: self.current_profit,
            initial_balance: self.initial_balance,
            returns: &self.returns,
            balance_history: &self.balance_history,
            trades: &self.trades,
        }
    }

    /// Asks the strategy for a signal and executes it if the guard rails allow.
    ///
    /// Returns whether a fill was applied. Venue failures are logged and leave
    /// the robot untouched.
    pub fn trade(&mut self, symbol: &str, snapshot: &MarketSnapshot, desk: &TradingDesk<'_>) -> bool {
        let minutes_held = self
            .entry_times
            .get(symbol)
            .filter(|_| self.positions.contains_key(symbol))
            .map(|entered| (snapshot.timestamp - *entered).num_minutes())
            .unwrap_or(0);

        let context = SignalContext {
            gene: &self.gene,
            balance: self.balance,
            position: self.positions.get(symbol),
            minutes_held,
        };
        let signal = desk.strategy.generate_signal(symbol, snapshot, &context);

        match signal.action {
            Action::Hold => false,
            Action::Buy => self.buy(symbol, &signal, snapshot, desk),
            Action::Sell => self.sell(symbol, &signal, snapshot, desk),
        }
    }

    fn buy(
        &mut self,
        symbol: &str,
        signal: &Signal,
        snapshot: &MarketSnapshot,
        desk: &TradingDesk<'_>,
    ) -> bool {
        let qty = signal.qty;
        if !(qty.is_finite() && qty > 0.0) {
            self.logger.debug(format_args!("robot {}: buy size {} is not positive", self.id, qty));
            return false;
        }

        let estimated_cost = signal.price * qty;
        if estimated_cost > self.balance {
            self.logger.debug(format_args!(
                "robot {}: insufficient funds, need {:.2}, have {:.2}",
                self.id, estimated_cost, self.balance
            ));
            return false;
        }

        let request = OrderRequest {
            symbol: symbol.to_string(),
            side: Side::Buy,
            order_type: OrderType::Market,
            qty,
            price: None,
            reduce_only: false,
            timeout: desk.order_timeout,
        };
        let Some(fill) = self.submit(&request, desk) else {
            return false;
        };

        let trade = Trade::buy(fill.executed_price, qty, snapshot.timestamp, fill.order_id);
        self.balance -= trade.cost();
        self.add_to_position(symbol, qty, fill.executed_price, snapshot.timestamp);
        self.update_after_trade(trade);
        true
    }

    fn sell(
        &mut self,
        symbol: &str,
        signal: &Signal,
        snapshot: &MarketSnapshot,
        desk: &TradingDesk<'_>,
    ) -> bool {
        let held = match self.positions.get(symbol) {
            Some(position) if position.qty > 0.0 => position.qty,
            _ => {
                self.logger.debug(format_args!("robot {}: no {} position to sell", self.id, symbol));
                return false;
            }
        };
        if !(signal.qty.is_finite() && signal.qty > 0.0) {
            self.logger.debug(format_args!("robot {}: sell size {} is not positive", self.id, signal.qty));
            return false;
        }

        let qty = signal.qty.min(held);
        let min_lot = desk.lots.min_lot(symbol);
        if qty < min_lot {
            self.logger.debug(format_args!(
                "robot {}: sell size {} below minimum lot {}",
                self.id, qty, min_lot
            ));
            return false;
        }

        let request = OrderRequest {
            symbol: symbol.to_string(),
            side: Side::Sell,
            order_type: OrderType::Market,
            qty,
            price: None,
            reduce_only: true,
            timeout: desk.order_timeout,
        };
        let Some(fill) = self.submit(&request, desk) else {
            return false;
        };

        let trade = Trade::sell(fill.executed_price, qty, snapshot.timestamp, fill.order_id);
        self.balance += trade.revenue();
        self.reduce_position(symbol, qty);
        self.update_after_trade(trade);
        true
    }

    fn submit(&self, request: &OrderRequest, desk: &TradingDesk<'_>) -> Option<crate::types::OrderFill> {
        match desk.client.place_order(request) {
            Ok(fill) if fill.executed_price.is_finite() && fill.executed_price > 0.0 => Some(fill),
            Ok(fill) => {
                self.logger.warn(format_args!(
                    "robot {}: venue reported unusable price {} for order {}",
                    self.id, fill.executed_price, fill.order_id
                ));
                None
            }
            Err(e) => {
                self.logger.warn(format_args!(
                    "robot {}: {:?} order for {} {} failed: {}",
                    self.id, request.side, request.qty, request.symbol, e
                ));
                None
            }
        }
    }

    fn add_to_position(&mut self, symbol: &str, qty: f64, price: f64, at: DateTime<Utc>) {
        match self.positions.get_mut(symbol) {
            Some(position) => {
                let total = position.qty + qty;
                position.avg_price = (position.avg_price * position.qty + price * qty) / total;
                position.qty = total;
            }
            None => {
                self.positions.insert(
                    symbol.to_string(),
                    Position {
                        symbol: symbol.to_string(),
                        qty,
                        avg_price: price,
                    },
                );
                self.entry_times.insert(symbol.to_string(), at);
            }
        }
    }

    fn reduce_position(&mut self, symbol: &str, qty: f64) {
        let flat = match self.positions.get_mut(symbol) {
            Some(position) => {
                position.qty -= qty;
                position.qty <= POSITION_EPSILON
            }
            None => false,
        };
        if flat {
            self.positions.remove(symbol);
            self.entry_times.remove(symbol);
        }
    }

    /// Appends the trade, one return sample and the new balance
    pub fn update_after_trade(&mut self, trade: Trade) {
        self.trades.push(trade);

        let previous = self.balance_history.last().copied().unwrap_or(self.initial_balance);
        if previous > 0.0 {
            self.returns.push((self.balance - previous) / previous);
        }
        self.balance_history.push(self.balance);
    }

    /// Marks open exposure to `snapshot` and refreshes the running profit
    pub fn update_profit(&mut self, symbol: &str, snapshot: &MarketSnapshot) -> f64 {
        if snapshot.current_price.is_finite() && snapshot.current_price > 0.0 {
            self.marks
                .insert(symbol.to_string(), (snapshot.current_price, snapshot.timestamp));
        }
        self.refresh_profit()
    }

    fn refresh_profit(&mut self) -> f64 {
        let exposure: f64 = self
            .positions
            .values()
            .map(|p| p.qty * self.marks.get(&p.symbol).map_or(p.avg_price, |(price, _)| *price))
            .sum();
        self.current_profit = self.balance + exposure - self.initial_balance;
        self.current_profit
    }

    /// Flattens every open position through the venue.
    ///
    /// Local state follows the venue: a position is liquidated at its last
    /// mark only once the close call confirmed it. Returns how many were closed.
    pub fn close_all_positions(&mut self, client: &dyn MarketClient) -> usize {
        if self.positions.is_empty() {
            return 0;
        }

        let symbols: Vec<String> = self.positions.keys().cloned().collect();
        let mut closed = 0;
        for symbol in symbols {
            let confirmed = match client.close_all_longs(&symbol) {
                Ok(true) => true,
                Ok(false) => match client.get_positions(&symbol) {
                    Ok(open) => !open
                        .iter()
                        .any(|p| p.side == Side::Buy && p.size > POSITION_EPSILON),
                    Err(e) => {
                        self.logger.warn(format_args!(
                            "robot {}: could not verify {} close: {}",
                            self.id, symbol, e
                        ));
                        false
                    }
                },
                Err(e) => {
                    self.logger.error(format_args!(
                        "robot {}: forced close of {} failed: {}",
                        self.id, symbol, e
                    ));
                    false
                }
            };

            if confirmed {
                self.liquidate_locally(&symbol);
                closed += 1;
            } else {
                self.logger.warn(format_args!(
                    "robot {}: {} position stays open after forced close",
                    self.id, symbol
                ));
            }
        }

        self.refresh_profit();
        closed
    }

    fn liquidate_locally(&mut self, symbol: &str) {
        let Some(position) = self.positions.remove(symbol) else {
            return;
        };
        let entered = self.entry_times.remove(symbol);

        // unmarked positions close at cost, stamped with their entry
        let (price, at) = match self.marks.get(symbol) {
            Some(&mark) => mark,
            None => (position.avg_price, entered.unwrap_or_default()),
        };
        let trade = Trade::sell(price, position.qty, at, FORCED_CLOSE_ORDER_ID.to_string());
        self.balance += trade.revenue();
        self.update_after_trade(trade);
    }

    pub fn apply_report(&mut self, report: FitnessReport) {
        self.fitness = report.fitness;
        self.last_report = Some(report);
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::generation::gene::{DecisionTree, CONDITION_CATALOG};
    use crate::logging::MemorySink;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn robot() -> Robot {
        let gene = Gene {
            trade_percentage: 0.05,
            risk_appetite: 0.5,
            max_trade_duration_minutes: 5,
            decision_tree: DecisionTree(vec![CONDITION_CATALOG[0], CONDITION_CATALOG[1]]),
        };
        Robot::new(1, 0, 1_000.0, gene, Logger::new(Arc::new(MemorySink::new()), "test"))
    }

    fn snapshot(price: f64) -> MarketSnapshot {
        MarketSnapshot {
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            current_price: price,
            rsi: 50.0,
            ema: price,
            volume_ratio: 1.0,
            trend_aligned: false,
        }
    }

    #[test]
    fn balance_history_starts_with_initial_balance() {
        let r = robot();
        assert_eq!(r.balance_history(), &[1_000.0]);
        assert!(r.returns().is_empty());
        assert!(r.trades().is_empty());
    }

    #[test]
    fn update_after_trade_appends_return_and_balance() {
        let mut r = robot();
        r.balance = 900.0;
        r.update_after_trade(Trade::buy(100.0, 1.0, Utc::now(), "a".into()));
        r.balance = 1_080.0;
        r.update_after_trade(Trade::sell(180.0, 1.0, Utc::now(), "b".into()));

        assert_eq!(r.balance_history(), &[1_000.0, 900.0, 1_080.0]);
        assert_eq!(r.trades().len(), 2);
        assert!((r.returns()[0] + 0.1).abs() < 1e-12);
        assert!((r.returns()[1] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn profit_marks_open_positions_to_market() {
        let mut r = robot();
        r.balance = 800.0;
        r.add_to_position("BTCUSDT", 2.0, 100.0, Utc::now());
        assert_eq!(r.update_profit("BTCUSDT", &snapshot(150.0)), 100.0);
        assert_eq!(r.current_profit, 100.0);

        // unusable marks keep the previous one
        assert_eq!(r.update_profit("BTCUSDT", &snapshot(f64::NAN)), 100.0);
    }

    #[test]
    fn flat_robot_profit_is_balance_delta() {
        let mut r = robot();
        r.balance = 1_025.0;
        assert_eq!(r.update_profit("BTCUSDT", &snapshot(10.0)), 25.0);
    }
}
