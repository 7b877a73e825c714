use std::collections::BTreeMap;

/// Minimum order size per symbol
#[derive(Debug, Clone, PartialEq)]
pub struct LotSizes {
    per_symbol: BTreeMap<String, f64>,
    default_lot: f64,
}

impl LotSizes {
    pub fn new(per_symbol: BTreeMap<String, f64>, default_lot: f64) -> Self {
        let per_symbol = per_symbol
            .into_iter()
            .map(|(symbol, lot)| (symbol.to_ascii_uppercase(), lot))
            .collect();
        Self {
            per_symbol,
            default_lot,
        }
    }

    pub fn min_lot(&self, symbol: &str) -> f64 {
        self.per_symbol
            .get(&symbol.to_ascii_uppercase())
            .copied()
            .unwrap_or(self.default_lot)
    }

    /// Decimal places implied by the lot (0.001 -> 3, 100 -> 0)
    pub fn precision(&self, symbol: &str) -> i32 {
        let lot = self.min_lot(symbol);
        if lot >= 1.0 {
            0
        } else {
            (-lot.log10() - 1e-9).ceil().max(0.0) as i32
        }
    }

    pub fn round_qty(&self, symbol: &str, qty: f64) -> f64 {
        let factor = 10_f64.powi(self.precision(symbol));
        (qty * factor).round() / factor
    }
}

impl Default for LotSizes {
    fn default() -> Self {
        Self::new(BTreeMap::new(), 1.0)
    }
}
