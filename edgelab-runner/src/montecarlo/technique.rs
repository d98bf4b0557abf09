//! Resampling techniques: how one scenario's trade sequence is drawn.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Draws the trade ordering for one scenario.
///
/// `sample` returns indices into the original trade list. It must only use
/// `rng` for randomness so that a seeded run replays exactly.
pub trait SimulationTechnique: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn sample(&self, n_trades: usize, rng: &mut StdRng) -> Vec<usize>;
}

/// Uniform random permutation: every trade exactly once.
#[derive(Debug, Clone, Copy, Default)]
pub struct TradeShuffling;

impl SimulationTechnique for TradeShuffling {
    fn name(&self) -> &'static str {
        "trade_shuffling"
    }

    fn description(&self) -> &'static str {
        "Randomly reorders the historical trades to test whether the edge depends on their sequence"
    }

    fn sample(&self, n_trades: usize, rng: &mut StdRng) -> Vec<usize> {
        let mut order: Vec<usize> = (0..n_trades).collect();
        order.shuffle(rng);
        order
    }
}

/// Draw `n` trades with replacement.
#[derive(Debug, Clone, Copy, Default)]
pub struct BootstrapResampling;

impl SimulationTechnique for BootstrapResampling {
    fn name(&self) -> &'static str {
        "bootstrap_resampling"
    }

    fn description(&self) -> &'static str {
        "Resamples trades with replacement to test whether the edge rests on a few outliers"
    }

    fn sample(&self, n_trades: usize, rng: &mut StdRng) -> Vec<usize> {
        if n_trades == 0 {
            return Vec::new();
        }
        (0..n_trades).map(|_| rng.gen_range(0..n_trades)).collect()
    }
}

/// Serializable technique selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Technique {
    #[default]
    TradeShuffling,
    BootstrapResampling,
}

impl Technique {
    pub fn all() -> &'static [Technique] {
        &[Self::TradeShuffling, Self::BootstrapResampling]
    }

    pub fn implementation(self) -> &'static dyn SimulationTechnique {
        match self {
            Self::TradeShuffling => &TradeShuffling,
            Self::BootstrapResampling => &BootstrapResampling,
        }
    }
}
