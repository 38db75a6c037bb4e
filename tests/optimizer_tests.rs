mod common;

use common::*;
use dbforge::optimizer::{GaParams, GeneticAlgorithm, InitWeights, Individual};
use dbforge::random::DeterministicRandom;
use dbforge::scorer::Evaluator;
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn params(size: usize, elitism: usize, crossover: f64, mutation: f64) -> GaParams {
    GaParams {
        population_size: size,
        crossover_rate: crossover,
        mutation_rate: mutation,
        elitism_count: elitism,
        init: InitWeights {
            empty: 0.6,
            up: 0.2,
            down: 0.2,
        },
    }
}

fn landscape(max_concurrency: usize) -> Evaluator {
    let mut p = exact(false);
    p.max_concurrency = max_concurrency;
    evaluator(Arc::new(LandscapeOracle), p)
}

fn codes_and_scores(pop: &[Individual]) -> Vec<(String, f64)> {
    pop.iter().map(|i| (i.genetic_code(), i.score())).collect()
}

/// Generates, then runs `generations` evaluate/advance cycles.
fn evolve(seed: &str, generations: usize, eval: &Evaluator) -> (Vec<(String, f64)>, u64) {
    let layout = fixture_layout();
    let table = xor_table();
    let mut rng = DeterministicRandom::new(seed);
    let mut ga = GeneticAlgorithm::new(params(12, 2, 0.7, 0.2));
    ga.generate_population(4, 3, &mut rng);
    for _ in 0..generations {
        ga.evaluate_population(&layout, &table, eval).unwrap();
        ga.next_generation(&mut rng).unwrap();
    }
    ga.evaluate_population(&layout, &table, eval).unwrap();
    (codes_and_scores(ga.population()), rng.draws())
}

#[test]
fn test_population_is_ranked_after_evaluation() {
    let layout = fixture_layout();
    let mut rng = DeterministicRandom::new("ranked");
    let mut ga = GeneticAlgorithm::new(params(16, 2, 0.7, 0.2));
    ga.generate_population(4, 3, &mut rng);
    assert!(ga.is_dirty());

    ga.evaluate_population(&layout, &xor_table(), &landscape(1))
        .unwrap();
    assert!(!ga.is_dirty());

    for pair in ga.population().windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(a.is_evaluated() && b.is_evaluated());
        assert!(
            a.score() > b.score() || (a.score() == b.score() && a.db_count() <= b.db_count()),
            "{} ({}) ranked above {} ({})",
            a.genetic_code(),
            a.score(),
            b.genetic_code(),
            b.score()
        );
    }
}

#[test]
fn test_elites_survive_unchanged() {
    let layout = fixture_layout();
    let mut rng = DeterministicRandom::new("elites");
    let mut ga = GeneticAlgorithm::new(params(10, 3, 0.7, 0.2));
    ga.generate_population(4, 3, &mut rng);
    ga.evaluate_population(&layout, &xor_table(), &landscape(1))
        .unwrap();

    let elites: Vec<Individual> = ga.population()[..3].to_vec();
    ga.next_generation(&mut rng).unwrap();

    assert_eq!(ga.generation(), 1);
    assert_eq!(ga.population().len(), 10);
    assert_eq!(&ga.population()[..3], elites.as_slice());
}

#[test]
fn test_same_seed_same_history() {
    let (a, draws_a) = evolve("determinism", 4, &landscape(1));
    let (b, draws_b) = evolve("determinism", 4, &landscape(1));
    assert_eq!(a, b);
    assert_eq!(draws_a, draws_b);

    let (c, _) = evolve("another seed", 4, &landscape(1));
    assert_ne!(a, c);
}

#[test]
fn test_concurrency_does_not_change_results() {
    let (serial, draws_serial) = evolve("pool", 3, &landscape(1));
    let (parallel, draws_parallel) = evolve("pool", 3, &landscape(4));
    assert_eq!(serial, parallel);
    assert_eq!(draws_serial, draws_parallel);
}

#[test]
fn test_evaluation_skips_scored_individuals() {
    let layout = fixture_layout();
    let oracle = Arc::new(ParityOracle::default());
    let eval = evaluator(oracle.clone(), exact(false));
    let mut rng = DeterministicRandom::new("clean");
    let mut ga = GeneticAlgorithm::new(params(6, 1, 0.0, 0.0));
    ga.generate_population(4, 3, &mut rng);

    ga.evaluate_population(&layout, &xor_table(), &eval).unwrap();
    let first_pass = oracle.calls.load(Ordering::SeqCst);
    assert_eq!(first_pass, 6 * 4);

    // Already ranked: nothing to do.
    ga.evaluate_population(&layout, &xor_table(), &eval).unwrap();
    assert_eq!(oracle.calls.load(Ordering::SeqCst), first_pass);

    // Pure reproduction only clones scored parents.
    ga.next_generation(&mut rng).unwrap();
    assert!(ga.population().iter().all(|i| i.is_evaluated()));
    ga.evaluate_population(&layout, &xor_table(), &eval).unwrap();
    assert_eq!(oracle.calls.load(Ordering::SeqCst), first_pass);
}

#[test]
fn test_restore_marks_population_clean() {
    let scored = vec![
        Individual::from_code(4, 3, "100000000000")
            .unwrap()
            .with_fitness(4.0, "a"),
        Individual::from_code(4, 3, "000000000000")
            .unwrap()
            .with_fitness(0.0, "b"),
    ];
    let mut ga = GeneticAlgorithm::new(params(2, 1, 0.5, 0.5));
    ga.restore(7, scored);
    assert!(!ga.is_dirty());
    assert_eq!(ga.generation(), 7);

    let oracle = Arc::new(ParityOracle::default());
    ga.evaluate_population(
        &fixture_layout(),
        &xor_table(),
        &evaluator(oracle.clone(), exact(false)),
    )
    .unwrap();
    assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
    assert_eq!(ga.best().and_then(|b| b.id()), Some("a"));
}

#[test]
fn test_advancing_empty_population_fails() {
    let mut ga = GeneticAlgorithm::new(params(4, 1, 0.5, 0.5));
    let mut rng = DeterministicRandom::new("empty");
    assert!(ga.next_generation(&mut rng).is_err());
    assert_eq!(rng.draws(), 0);
}
