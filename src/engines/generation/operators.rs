use crate::engines::generation::gene::{
    random_condition, DecisionTree, Gene, RISK_APPETITE_RANGE, TRADE_PERCENTAGE_RANGE,
};
use crate::utils::gaussian;
use rand::Rng;

pub const TRADE_PERCENTAGE_MUTATION_RATE: f64 = 0.3;
pub const RISK_APPETITE_MUTATION_RATE: f64 = 0.3;
pub const TREE_MUTATION_RATE: f64 = 0.4;
pub const RISK_APPETITE_SIGMA: f64 = 0.1;
/// Trees at or below this length never lose a rule
pub const MIN_TREE_LEN: usize = 2;

/// Averages the numeric traits; the tree is A's first half followed by B's second half.
///
/// The trade-duration trait is taken from parent A.
pub fn crossover(a: &Gene, b: &Gene) -> Gene {
    let head = &a.decision_tree.conditions()[..a.decision_tree.len() / 2];
    let tail = &b.decision_tree.conditions()[b.decision_tree.len() / 2..];

    Gene {
        trade_percentage: (a.trade_percentage + b.trade_percentage) / 2.0,
        risk_appetite: (a.risk_appetite + b.risk_appetite) / 2.0,
        max_trade_duration_minutes: a.max_trade_duration_minutes,
        decision_tree: DecisionTree(head.iter().chain(tail).copied().collect()),
    }
}

/// Three independent gates: trade size redraw, risk jitter, tree edit
pub fn mutate<R: Rng + ?Sized>(mut gene: Gene, rng: &mut R) -> Gene {
    if rng.gen_bool(TRADE_PERCENTAGE_MUTATION_RATE) {
        gene.trade_percentage = rng.gen_range(TRADE_PERCENTAGE_RANGE);
    }

    if rng.gen_bool(RISK_APPETITE_MUTATION_RATE) {
        gene.risk_appetite = (gene.risk_appetite + gaussian(rng, RISK_APPETITE_SIGMA))
            .clamp(*RISK_APPETITE_RANGE.start(), *RISK_APPETITE_RANGE.end());
    }

    if rng.gen_bool(TREE_MUTATION_RATE) {
        let tree = &mut gene.decision_tree.0;
        if rng.gen_bool(0.5) {
            if tree.len() > MIN_TREE_LEN {
                let idx = rng.gen_range(0..tree.len());
                tree.remove(idx);
            }
        } else {
            tree.push(random_condition(rng));
        }
    }

    gene
}

/// Child genotype: `mutate(crossover(a, b))`
pub fn breed<R: Rng + ?Sized>(a: &Gene, b: &Gene, rng: &mut R) -> Gene {
    mutate(crossover(a, b), rng)
}
