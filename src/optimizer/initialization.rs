use super::individual::{Gene, Individual};
use crate::config::SearchParams;
use crate::random::DeterministicRandom;

/// Relative weights of the three gene states at initialization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitWeights {
    pub empty: f64,
    pub up: f64,
    pub down: f64,
}

impl Default for InitWeights {
    fn default() -> Self {
        Self {
            empty: 0.90,
            up: 0.05,
            down: 0.05,
        }
    }
}

impl From<&SearchParams> for InitWeights {
    fn from(p: &SearchParams) -> Self {
        Self {
            empty: p.init_empty,
            up: p.init_up,
            down: p.init_down,
        }
    }
}

impl InitWeights {
    /// Maps one uniform draw onto a gene.
    fn pick(&self, r: f64) -> Gene {
        let x = r * (self.empty + self.up + self.down);
        if x < self.empty {
            Gene::Empty
        } else if x < self.empty + self.up {
            Gene::Up
        } else {
            Gene::Down
        }
    }
}

/// One draw per cell, row-major.
pub fn random_init(
    width: usize,
    height: usize,
    weights: &InitWeights,
    rng: &mut DeterministicRandom,
) -> Individual {
    let genes: Vec<Gene> = (0..width * height)
        .map(|_| weights.pick(rng.next_f64()))
        .collect();
    Individual::from_genes(width, height, genes)
}
