pub mod crossover;
pub mod individual;
pub mod initialization;
pub mod mutation;
pub mod runner;

pub use self::individual::{Fitness, Gene, Individual};
pub use self::initialization::{random_init, InitWeights};

use crate::config::SearchParams;
use crate::error::{DbForgeError, DfResult};
use crate::layout::Layout;
use crate::random::DeterministicRandom;
use crate::scorer::Evaluator;
use crate::truth::TruthTable;
use rayon::prelude::*;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaParams {
    pub population_size: usize,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    pub elitism_count: usize,
    pub init: InitWeights,
}

impl From<&SearchParams> for GaParams {
    fn from(p: &SearchParams) -> Self {
        Self {
            population_size: p.population_size,
            crossover_rate: p.crossover_rate,
            mutation_rate: p.mutation_rate,
            elitism_count: p.elitism_count,
            init: InitWeights::from(p),
        }
    }
}

/// Population manager: fitness-proportional selection with elitism and
/// generational replacement.
///
/// Every random decision goes through the `DeterministicRandom` handed in by
/// the caller, in a fixed order. Evaluation never draws.
pub struct GeneticAlgorithm {
    params: GaParams,
    population: Vec<Individual>,
    generation: usize,
    dirty: bool,
}

/// Fitness descending, DB count ascending.
fn rank(a: &Individual, b: &Individual) -> Ordering {
    b.score()
        .total_cmp(&a.score())
        .then_with(|| a.db_count().cmp(&b.db_count()))
}

impl GeneticAlgorithm {
    pub fn new(params: GaParams) -> Self {
        Self {
            params,
            population: Vec::new(),
            generation: 0,
            dirty: true,
        }
    }

    pub fn params(&self) -> &GaParams {
        &self.params
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn generate_population(
        &mut self,
        width: usize,
        height: usize,
        rng: &mut DeterministicRandom,
    ) {
        self.population = (0..self.params.population_size)
            .map(|_| random_init(width, height, &self.params.init, rng))
            .collect();
        self.generation = 0;
        self.dirty = true;
    }

    /// Installs an already ranked, already evaluated population.
    pub fn restore(&mut self, generation: usize, population: Vec<Individual>) {
        self.dirty = population.iter().any(|i| !i.is_evaluated());
        self.population = population;
        self.generation = generation;
    }

    /// Scores every unevaluated individual, then ranks the population.
    ///
    /// Runs on a pool of at most `max_concurrency` threads; a no-op when the
    /// current generation is already ranked.
    pub fn evaluate_population(
        &mut self,
        layout: &Layout,
        table: &TruthTable,
        evaluator: &Evaluator,
    ) -> DfResult<()> {
        if !self.dirty {
            return Ok(());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(evaluator.params().max_concurrency.max(1))
            .build()
            .map_err(|e| DbForgeError::Config(format!("Failed to build worker pool: {}", e)))?;

        pool.install(|| {
            self.population
                .par_iter_mut()
                .filter(|ind| !ind.is_evaluated())
                .try_for_each(|ind| ind.evaluate_fitness(layout, table, evaluator).map(|_| ()))
        })?;

        self.population.sort_by(rank);
        self.dirty = false;
        Ok(())
    }

    /// Roulette-wheel pick over the ranked population.
    ///
    /// One draw. With zero total fitness the same draw picks uniformly.
    pub fn select_parent(&self, rng: &mut DeterministicRandom) -> Option<&Individual> {
        let len = self.population.len();
        if len == 0 {
            return None;
        }
        let r = rng.next_f64();
        let total: f64 = self.population.iter().map(|i| i.score()).sum();

        if total <= 0.0 || !total.is_finite() {
            let idx = ((r * len as f64) as usize).min(len - 1);
            return self.population.get(idx);
        }

        let target = r * total;
        let mut acc = 0.0;
        for ind in &self.population {
            acc += ind.score();
            if acc > target {
                return Some(ind);
            }
        }
        // Rounding left the sum just short of the target.
        self.population
            .iter()
            .rev()
            .find(|i| i.score() > 0.0)
            .or_else(|| self.population.last())
    }

    /// Replaces the population with the next generation.
    ///
    /// Elites are copied as is. Each other slot draws parent A, then `r`,
    /// then parent B only when crossing over.
    pub fn next_generation(&mut self, rng: &mut DeterministicRandom) -> DfResult<()> {
        if self.population.is_empty() {
            return Err(DbForgeError::Validation(
                "Cannot advance an empty population.".into(),
            ));
        }

        self.generation += 1;
        self.dirty = true;

        let p = self.params;
        let mut next: Vec<Individual> = self
            .population
            .iter()
            .take(p.elitism_count)
            .cloned()
            .collect();

        for _ in 0..p.population_size.saturating_sub(p.elitism_count) {
            let parent_a = self.pick(rng)?;
            let r = rng.next_f64();
            let child = if r < p.crossover_rate {
                let parent_b = self.pick(rng)?;
                parent_a.crossover(parent_b, rng)?
            } else if r < p.crossover_rate + p.mutation_rate {
                parent_a.mutate(rng)
            } else {
                parent_a.clone()
            };
            next.push(child);
        }

        self.population = next;
        Ok(())
    }

    fn pick(&self, rng: &mut DeterministicRandom) -> DfResult<&Individual> {
        self.select_parent(rng)
            .ok_or_else(|| DbForgeError::Validation("Population is empty.".into()))
    }

    pub fn best(&self) -> Option<&Individual> {
        self.population.first()
    }
}
