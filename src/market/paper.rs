use crate::config::PaperMarketConfig;
use crate::error::{EvolutionError, Result};
use crate::market::{IndicatorFeed, MarketClient};
use crate::types::{MarketSnapshot, OrderFill, OrderRequest, Side, VenuePosition};
use crate::utils::gaussian;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// 2023-11-14T22:13:20Z, so snapshot timestamps are reproducible
const EPOCH_SECONDS: i64 = 1_700_000_000;
const WARMUP_BARS: usize = 30;

struct PaperState {
    rng: StdRng,
    price: f64,
    clock: DateTime<Utc>,
    feed: IndicatorFeed,
    last: Option<MarketSnapshot>,
    order_seq: u64,
    longs: BTreeMap<String, (f64, f64)>,
}

/// Simulated venue: random-walk prices, immediate market fills.
///
/// Shared by every robot of a run, so venue positions are the account-wide
/// aggregate of all robots' orders.
pub struct PaperExchange {
    config: PaperMarketConfig,
    state: Mutex<PaperState>,
}

impl PaperExchange {
    pub fn new(config: PaperMarketConfig) -> Self {
        let clock = DateTime::from_timestamp(EPOCH_SECONDS, 0).unwrap_or_default();
        let mut state = PaperState {
            rng: StdRng::seed_from_u64(config.seed),
            price: config.initial_price,
            clock,
            feed: IndicatorFeed::new(),
            last: None,
            order_seq: 0,
            longs: BTreeMap::new(),
        };
        for _ in 0..WARMUP_BARS {
            Self::advance(&config, &mut state);
        }

        Self {
            config,
            state: Mutex::new(state),
        }
    }

    /// Last published snapshot, if any
    pub fn last_snapshot(&self) -> Option<MarketSnapshot> {
        self.lock().ok().and_then(|state| state.last.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, PaperState>> {
        self.state
            .lock()
            .map_err(|_| EvolutionError::Market("paper exchange state poisoned".to_string()))
    }

    fn advance(config: &PaperMarketConfig, state: &mut PaperState) -> MarketSnapshot {
        let step = gaussian(&mut state.rng, config.volatility);
        state.price *= step.exp();
        state.clock += ChronoDuration::minutes(1);

        let volume = 1_000.0 * (1.0 + gaussian(&mut state.rng, 0.3)).max(0.05);
        let readings = state.feed.push(state.price, volume);

        let snapshot = MarketSnapshot {
            timestamp: state.clock,
            current_price: state.price,
            rsi: readings.rsi,
            ema: readings.ema_slow,
            volume_ratio: readings.volume_ratio,
            trend_aligned: readings.ema_fast > readings.ema_slow,
        };
        state.last = Some(snapshot.clone());
        snapshot
    }
}

impl MarketClient for PaperExchange {
    fn get_market_snapshot(&self) -> Result<MarketSnapshot> {
        let mut state = self.lock()?;
        Ok(Self::advance(&self.config, &mut state))
    }

    fn place_order(&self, request: &OrderRequest) -> Result<OrderFill> {
        let timeout_ms = request.timeout.as_millis() as u64;
        if self.config.latency_ms > timeout_ms {
            return Err(EvolutionError::Timeout {
                operation: format!("place_order {}", request.symbol),
                timeout_ms,
            });
        }
        if !(request.qty.is_finite() && request.qty > 0.0) {
            return Err(EvolutionError::OrderRejected(format!(
                "invalid quantity {}",
                request.qty
            )));
        }

        let mut state = self.lock()?;
        if state.rng.gen_bool(self.config.rejection_rate) {
            return Err(EvolutionError::OrderRejected(format!(
                "{:?} {} {} rejected by venue",
                request.side, request.qty, request.symbol
            )));
        }

        let slip = self.config.slippage_bps / 10_000.0;
        let executed_price = match request.side {
            Side::Buy => state.price * (1.0 + slip),
            Side::Sell => state.price * (1.0 - slip),
        };

        let entry = state
            .longs
            .entry(request.symbol.to_ascii_uppercase())
            .or_insert((0.0, 0.0));
        match request.side {
            Side::Buy => {
                let total = entry.0 + request.qty;
                entry.1 = (entry.1 * entry.0 + executed_price * request.qty) / total;
                entry.0 = total;
            }
            Side::Sell => {
                entry.0 = (entry.0 - request.qty).max(0.0);
            }
        }

        state.order_seq += 1;
        Ok(OrderFill {
            executed_price,
            order_id: format!("paper-{:08}", state.order_seq),
        })
    }

    fn get_positions(&self, symbol: &str) -> Result<Vec<VenuePosition>> {
        let state = self.lock()?;
        let symbol = symbol.to_ascii_uppercase();
        Ok(state
            .longs
            .get(&symbol)
            .filter(|(size, _)| *size > 0.0)
            .map(|(size, avg_price)| VenuePosition {
                symbol: symbol.clone(),
                side: Side::Buy,
                size: *size,
                avg_price: *avg_price,
            })
            .into_iter()
            .collect())
    }

    fn close_all_longs(&self, symbol: &str) -> Result<bool> {
        let mut state = self.lock()?;
        state.longs.remove(&symbol.to_ascii_uppercase());
        Ok(true)
    }
}
