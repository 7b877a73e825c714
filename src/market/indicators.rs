use std::collections::VecDeque;

const RSI_PERIOD: usize = 14;
const EMA_FAST: usize = 12;
const EMA_SLOW: usize = 26;
const VOLUME_PERIOD: usize = 20;

/// Latest indicator values after a bar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorReadings {
    pub rsi: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub volume_ratio: f64,
}

/// Wilder-smoothed RSI, fed one close at a time
#[derive(Debug, Clone)]
struct RsiState {
    period: usize,
    gains: VecDeque<f64>,
    losses: VecDeque<f64>,
    averages: Option<(f64, f64)>,
    prev_close: Option<f64>,
}

impl RsiState {
    fn new(period: usize) -> Self {
        Self {
            period,
            gains: VecDeque::with_capacity(period),
            losses: VecDeque::with_capacity(period),
            averages: None,
            prev_close: None,
        }
    }

    fn update(&mut self, close: f64) -> f64 {
        let prev_close = match self.prev_close.replace(close) {
            Some(prev) => prev,
            None => return 50.0,
        };

        let change = close - prev_close;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        let period = self.period as f64;
        let (avg_gain, avg_loss) = match self.averages {
            Some((avg_gain, avg_loss)) => (
                (avg_gain * (period - 1.0) + gain) / period,
                (avg_loss * (period - 1.0) + loss) / period,
            ),
            None => {
                self.gains.push_back(gain);
                self.losses.push_back(loss);
                if self.gains.len() < self.period {
                    return 50.0;
                }
                (
                    self.gains.iter().sum::<f64>() / period,
                    self.losses.iter().sum::<f64>() / period,
                )
            }
        };
        self.averages = Some((avg_gain, avg_loss));

        if avg_loss == 0.0 {
            100.0
        } else {
            100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
        }
    }
}

#[derive(Debug, Clone)]
struct Ema {
    alpha: f64,
    value: Option<f64>,
}

impl Ema {
    fn new(period: usize) -> Self {
        Self {
            alpha: 2.0 / (period as f64 + 1.0),
            value: None,
        }
    }

    fn update(&mut self, x: f64) -> f64 {
        let next = match self.value {
            Some(prev) => prev + self.alpha * (x - prev),
            None => x,
        };
        self.value = Some(next);
        next
    }
}

/// Incremental indicator set backing the paper exchange snapshots
#[derive(Debug, Clone)]
pub struct IndicatorFeed {
    rsi: RsiState,
    ema_fast: Ema,
    ema_slow: Ema,
    volumes: VecDeque<f64>,
}

impl Default for IndicatorFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatorFeed {
    pub fn new() -> Self {
        Self {
            rsi: RsiState::new(RSI_PERIOD),
            ema_fast: Ema::new(EMA_FAST),
            ema_slow: Ema::new(EMA_SLOW),
            volumes: VecDeque::with_capacity(VOLUME_PERIOD),
        }
    }

    pub fn push(&mut self, close: f64, volume: f64) -> IndicatorReadings {
        self.volumes.push_back(volume);
        if self.volumes.len() > VOLUME_PERIOD {
            self.volumes.pop_front();
        }
        let volume_sma = self.volumes.iter().sum::<f64>() / self.volumes.len() as f64;

        IndicatorReadings {
            rsi: self.rsi.update(close),
            ema_fast: self.ema_fast.update(close),
            ema_slow: self.ema_slow.update(close),
            volume_ratio: if volume_sma > 0.0 { volume / volume_sma } else { 0.0 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsi_is_neutral_until_warmed_up_then_saturates_on_rises() {
        let mut feed = IndicatorFeed::new();
        let mut last = feed.push(100.0, 1.0);
        assert_eq!(last.rsi, 50.0);

        for i in 1..RSI_PERIOD {
            last = feed.push(100.0 + i as f64, 1.0);
            assert_eq!(last.rsi, 50.0);
        }
        last = feed.push(100.0 + RSI_PERIOD as f64, 1.0);
        assert_eq!(last.rsi, 100.0);
    }

    #[test]
    fn fast_ema_leads_slow_ema_in_uptrend() {
        let mut feed = IndicatorFeed::new();
        let mut last = feed.push(100.0, 10.0);
        for i in 1..40 {
            last = feed.push(100.0 + i as f64, 10.0);
        }
        assert!(last.ema_fast > last.ema_slow);
        assert!((last.volume_ratio - 1.0).abs() < 1e-12);
    }
}
