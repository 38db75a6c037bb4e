use super::individual::Individual;
use crate::random::DeterministicRandom;

/// Cycles a single random cell to one of its two other states.
pub fn single_point(parent: &Individual, rng: &mut DeterministicRandom) -> Individual {
    let mut genes = parent.genes().to_vec();
    if !genes.is_empty() {
        let idx = rng.below(genes.len());
        let k = rng.below(2);
        genes[idx] = genes[idx].cycled(k);
    }
    Individual::from_genes(parent.width(), parent.height(), genes)
}

/// Every cell has an even chance of being cycled.
pub fn uniform(parent: &Individual, rng: &mut DeterministicRandom) -> Individual {
    let mut genes = parent.genes().to_vec();
    for gene in genes.iter_mut() {
        if rng.next_f64() < 0.5 {
            let k = rng.below(2);
            *gene = gene.cycled(k);
        }
    }
    Individual::from_genes(parent.width(), parent.height(), genes)
}

impl Individual {
    /// New unevaluated child; the first draw picks the strategy.
    pub fn mutate(&self, rng: &mut DeterministicRandom) -> Individual {
        if rng.next_f64() < 0.5 {
            single_point(self, rng)
        } else {
            uniform(self, rng)
        }
    }
}
