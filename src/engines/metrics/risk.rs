// src/engines/metrics/risk.rs

pub struct RiskMetrics;

impl RiskMetrics {
    /// Annualised mean/std of per-step returns; 0 without dispersion
    pub fn sharpe_ratio(returns: &[f64], annualization_factor: f64) -> f64 {
        if returns.len() < 2 {
            return 0.0;
        }
        let std = Self::std_dev(returns);
        if std == 0.0 {
            return 0.0;
        }
        Self::mean(returns) / std * annualization_factor.sqrt()
    }

    /// Largest peak-to-trough decline as a fraction of the running peak
    pub fn max_drawdown(balances: &[f64]) -> f64 {
        let mut peak = match balances.first() {
            Some(&first) => first,
            None => return 0.0,
        };
        let mut max_dd = 0.0;

        for &value in balances {
            if value > peak {
                peak = value;
            }
            if peak > 0.0 {
                let dd = (peak - value) / peak;
                if dd > max_dd {
                    max_dd = dd;
                }
            }
        }

        max_dd
    }

    /// 1 - coefficient of variation; 0 when it is undefined
    pub fn consistency(returns: &[f64]) -> f64 {
        if returns.len() < 2 {
            return 0.0;
        }
        let mean = Self::mean(returns);
        if mean == 0.0 {
            return 0.0;
        }
        1.0 - Self::std_dev(returns) / mean
    }

    pub fn mean(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        values.iter().sum::<f64>() / values.len() as f64
    }

    /// Population standard deviation
    pub fn std_dev(values: &[f64]) -> f64 {
        // constant input is exactly zero, whatever the mean's rounding
        if values.windows(2).all(|w| w[0] == w[1]) {
            return 0.0;
        }

        let mean = Self::mean(values);
        let variance = values.iter()
            .map(|&v| (v - mean).powi(2))
            .sum::<f64>() / values.len() as f64;

        variance.sqrt()
    }
}
