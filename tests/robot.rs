mod common;

use common::*;
use log::Level;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::time::Duration;
use tradevolve::engines::evaluation::{Robot, Strategy, TradingDesk, FORCED_CLOSE_ORDER_ID};
use tradevolve::engines::generation::Gene;
use tradevolve::logging::Logger;
use tradevolve::market::{LotSizes, MarketClient};
use tradevolve::types::{Action, MarketSnapshot, Side};

fn robot(logger: Logger) -> Robot {
    let gene = Gene::random(&mut StdRng::seed_from_u64(3));
    Robot::new(1, 0, 1_000.0, gene, logger)
}

fn lots() -> LotSizes {
    let mut per_symbol = BTreeMap::new();
    per_symbol.insert(SYMBOL.to_string(), 0.001);
    LotSizes::new(per_symbol, 1.0)
}

fn desk<'a>(market: &'a dyn MarketClient, strategy: &'a dyn Strategy, lots: &'a LotSizes) -> TradingDesk<'a> {
    TradingDesk {
        client: market,
        strategy,
        lots,
        order_timeout: Duration::from_millis(250),
    }
}

#[test]
fn test_buy_rejected_when_cost_exceeds_balance() {
    let (_, logger) = memory_logger();
    let mut robot = robot(logger);
    let market = StubMarket::flat();
    let strategy = ScriptedStrategy::new(vec![buy(100.0, 10.5)]);
    let lots = lots();

    let before = (robot.balance, robot.positions().clone(), robot.balance_history().to_vec());
    let traded = robot.trade(SYMBOL, &snapshot(100.0), &desk(&market, &strategy, &lots));

    assert!(!traded);
    assert_eq!(before, (robot.balance, robot.positions().clone(), robot.balance_history().to_vec()));
    assert!(robot.trades().is_empty());
    assert!(market.orders().is_empty(), "no order may reach the venue");
}

#[test]
fn test_buys_average_their_cost() {
    let (_, logger) = memory_logger();
    let mut robot = robot(logger);
    let market = StubMarket::flat();
    market.queue_fills(&[100.0, 200.0]);
    let strategy = ScriptedStrategy::new(vec![buy(100.0, 1.0), buy(200.0, 1.0)]);
    let lots = lots();
    let desk = desk(&market, &strategy, &lots);

    assert!(robot.trade(SYMBOL, &snapshot(100.0), &desk));
    assert!(robot.trade(SYMBOL, &snapshot(200.0), &desk));

    let position = robot.position(SYMBOL).unwrap();
    assert_eq!(position.qty, 2.0);
    assert_eq!(position.avg_price, 150.0);
    assert_eq!(robot.balance, 700.0);
    assert_eq!(robot.balance_history(), &[1_000.0, 900.0, 700.0]);
    assert_eq!(robot.returns().len(), 2);
}

#[test]
fn test_fill_uses_executed_price() {
    let (_, logger) = memory_logger();
    let mut robot = robot(logger);
    let market = StubMarket::flat();
    market.queue_fills(&[101.5]);
    let strategy = ScriptedStrategy::new(vec![buy(100.0, 2.0)]);
    let lots = lots();

    assert!(robot.trade(SYMBOL, &snapshot(100.0), &desk(&market, &strategy, &lots)));

    let trade = &robot.trades()[0];
    assert_eq!(trade.price, 101.5);
    assert_eq!(trade.cost(), 203.0);
    assert_eq!(trade.order_id, "stub-1");
    assert_eq!(robot.balance, 797.0);
    assert_eq!(robot.position(SYMBOL).unwrap().avg_price, 101.5);

    let order = &market.orders()[0];
    assert_eq!(order.side, Side::Buy);
    assert!(!order.reduce_only);
    assert_eq!(order.timeout, Duration::from_millis(250));
}

#[test]
fn test_order_failure_leaves_robot_untouched() {
    let (sink, logger) = memory_logger();
    let mut robot = robot(logger);
    let market = StubMarket::flat();
    market.fail_orders(true);
    let strategy = ScriptedStrategy::new(vec![buy(100.0, 1.0)]);
    let lots = lots();

    assert!(!robot.trade(SYMBOL, &snapshot(100.0), &desk(&market, &strategy, &lots)));
    assert_eq!(robot.balance, 1_000.0);
    assert!(robot.positions().is_empty());
    assert!(robot.trades().is_empty());
    assert!(sink.contains(Level::Warn, "venue unavailable"));
}

#[test]
fn test_sell_is_clamped_to_holding() {
    let (_, logger) = memory_logger();
    let mut robot = robot(logger);
    let market = StubMarket::flat();
    market.queue_fills(&[100.0, 110.0]);
    let strategy = ScriptedStrategy::new(vec![buy(100.0, 0.5), sell(110.0, 2.0)]);
    let lots = lots();
    let desk = desk(&market, &strategy, &lots);

    assert!(robot.trade(SYMBOL, &snapshot(100.0), &desk));
    assert!(robot.trade(SYMBOL, &snapshot(110.0), &desk));

    let orders = market.orders();
    assert_eq!(orders[1].qty, 0.5);
    assert!(orders[1].reduce_only);
    assert!(robot.position(SYMBOL).is_none(), "flat positions are removed");
    assert_eq!(robot.balance, 1_005.0);
    assert_eq!(robot.trades()[1].action(), Action::Sell);
    assert_eq!(robot.trades()[1].revenue(), 55.0);
}

#[test]
fn test_sell_rejected_without_position_or_below_min_lot() {
    let (_, logger) = memory_logger();
    let mut robot = robot(logger);
    let market = StubMarket::flat();
    let strategy = ScriptedStrategy::new(vec![
        sell(100.0, 1.0),
        buy(100.0, 0.0005),
        sell(100.0, 0.0005),
        sell(100.0, 0.0),
    ]);
    let lots = lots();
    let desk = desk(&market, &strategy, &lots);

    assert!(!robot.trade(SYMBOL, &snapshot(100.0), &desk));
    assert!(robot.trade(SYMBOL, &snapshot(100.0), &desk));
    assert!(!robot.trade(SYMBOL, &snapshot(100.0), &desk));
    assert!(!robot.trade(SYMBOL, &snapshot(100.0), &desk));

    assert_eq!(market.orders().len(), 1);
    assert_eq!(robot.position(SYMBOL).unwrap().qty, 0.0005);
}

#[test]
fn test_close_all_positions_liquidates_at_mark_and_is_idempotent() {
    let (_, logger) = memory_logger();
    let mut robot = robot(logger);
    let market = StubMarket::flat();
    market.queue_fills(&[100.0]);
    let strategy = ScriptedStrategy::new(vec![buy(100.0, 2.0)]);
    let lots = lots();

    assert!(robot.trade(SYMBOL, &snapshot(100.0), &desk(&market, &strategy, &lots)));
    assert_eq!(robot.update_profit(SYMBOL, &snapshot(120.0)), 40.0);

    assert_eq!(robot.close_all_positions(&market), 1);
    assert!(robot.positions().is_empty());
    assert_eq!(robot.balance, 1_040.0);
    assert_eq!(robot.current_profit, 40.0);

    let forced = robot.trades().last().unwrap();
    assert_eq!(forced.order_id, FORCED_CLOSE_ORDER_ID);
    assert_eq!(forced.price, 120.0);
    assert_eq!(robot.balance_history().last(), Some(&1_040.0));

    let trades = robot.trades().len();
    assert_eq!(robot.close_all_positions(&market), 0);
    assert_eq!(robot.trades().len(), trades);
    assert_eq!(market.close_calls(), 1);
}

#[test]
fn test_unmarked_position_closes_at_cost_and_entry_time() {
    let (_, logger) = memory_logger();
    let mut robot = robot(logger);
    let market = StubMarket::flat();
    market.queue_fills(&[95.0]);
    let strategy = ScriptedStrategy::new(vec![buy(100.0, 2.0)]);
    let lots = lots();
    let entry = MarketSnapshot {
        timestamp: at_minute(7),
        ..snapshot(100.0)
    };

    assert!(robot.trade(SYMBOL, &entry, &desk(&market, &strategy, &lots)));
    assert_eq!(robot.close_all_positions(&market), 1);

    let forced = robot.trades().last().unwrap();
    assert_eq!(forced.order_id, FORCED_CLOSE_ORDER_ID);
    assert_eq!(forced.price, 95.0);
    assert_eq!(forced.timestamp, at_minute(7));
    assert_eq!(robot.balance, 1_000.0);
}

#[test]
fn test_failed_close_keeps_local_position() {
    let (sink, logger) = memory_logger();
    let mut robot = robot(logger);
    let market = StubMarket::flat();
    let strategy = ScriptedStrategy::new(vec![buy(100.0, 1.0)]);
    let lots = lots();
    assert!(robot.trade(SYMBOL, &snapshot(100.0), &desk(&market, &strategy, &lots)));

    market.close_behavior(CloseBehavior::Fail);
    assert_eq!(robot.close_all_positions(&market), 0);
    assert_eq!(robot.position(SYMBOL).unwrap().qty, 1.0);
    assert!(sink.contains(Level::Error, "forced close"));
}

#[test]
fn test_denied_close_defers_to_venue_positions() {
    let (_, logger) = memory_logger();
    let mut robot = robot(logger);
    let market = StubMarket::flat();
    let strategy = ScriptedStrategy::new(vec![buy(100.0, 1.0)]);
    let lots = lots();
    assert!(robot.trade(SYMBOL, &snapshot(100.0), &desk(&market, &strategy, &lots)));

    market.close_behavior(CloseBehavior::Deny);
    market.set_venue_positions(vec![venue_long(1.0)]);
    assert_eq!(robot.close_all_positions(&market), 0);
    assert!(robot.position(SYMBOL).is_some());

    market.set_venue_positions(Vec::new());
    assert_eq!(robot.close_all_positions(&market), 1);
    assert!(robot.position(SYMBOL).is_none());
    assert_eq!(robot.balance, 1_000.0);
}

#[test]
fn test_time_exit_sells_whole_position() {
    use tradevolve::engines::evaluation::GeneStrategy;
    use tradevolve::engines::generation::{DecisionTree, CONDITION_CATALOG};

    let (_, logger) = memory_logger();
    let gene = Gene {
        trade_percentage: 0.1,
        risk_appetite: 0.5,
        max_trade_duration_minutes: 2,
        // rsi < 30 -> buy
        decision_tree: DecisionTree(vec![CONDITION_CATALOG[0], CONDITION_CATALOG[1]]),
    };
    let mut robot = Robot::new(7, 0, 1_000.0, gene, logger);
    let market = StubMarket::flat();
    let lots = lots();
    let strategy = GeneStrategy::new(lots.clone());
    let desk = desk(&market, &strategy, &lots);

    let mut oversold = snapshot(100.0);
    oversold.rsi = 20.0;
    assert!(robot.trade(SYMBOL, &oversold, &desk));
    assert_eq!(robot.position(SYMBOL).unwrap().qty, 1.0);

    let mut later = snapshot(100.0);
    later.timestamp = at_minute(1);
    assert!(!robot.trade(SYMBOL, &later, &desk));

    later.timestamp = at_minute(2);
    assert!(robot.trade(SYMBOL, &later, &desk));
    assert!(robot.position(SYMBOL).is_none());
    assert_eq!(market.orders()[1].side, Side::Sell);
}
