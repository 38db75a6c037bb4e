use super::individual::Individual;
use crate::error::{DbForgeError, DfResult};
use crate::random::DeterministicRandom;

/// Genes `[0, cut)` from `a`, the rest from `b`.
pub fn single_point(a: &Individual, b: &Individual, rng: &mut DeterministicRandom) -> Individual {
    let len = a.genes().len();
    let cut = if len == 0 { 0 } else { rng.below(len) };
    let genes = a.genes()[..cut]
        .iter()
        .chain(&b.genes()[cut..])
        .copied()
        .collect();
    Individual::from_genes(a.width(), a.height(), genes)
}

/// Each gene from `a` with probability one half, otherwise from `b`.
pub fn uniform(a: &Individual, b: &Individual, rng: &mut DeterministicRandom) -> Individual {
    let genes = a
        .genes()
        .iter()
        .zip(b.genes())
        .map(|(&ga, &gb)| if rng.next_f64() < 0.5 { ga } else { gb })
        .collect();
    Individual::from_genes(a.width(), a.height(), genes)
}

impl Individual {
    /// New unevaluated child of `self` and `other`; the first draw picks the strategy.
    pub fn crossover(
        &self,
        other: &Individual,
        rng: &mut DeterministicRandom,
    ) -> DfResult<Individual> {
        if self.width() != other.width() || self.height() != other.height() {
            return Err(DbForgeError::Validation(format!(
                "Cannot cross a {}x{} individual with a {}x{} one.",
                self.width(),
                self.height(),
                other.width(),
                other.height()
            )));
        }
        Ok(if rng.next_f64() < 0.5 {
            single_point(self, other, rng)
        } else {
            uniform(self, other, rng)
        })
    }
}
