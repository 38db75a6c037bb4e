use dbforge::config::{parse_key_val, Config, EvaluationMode, SimulationParameters};
use dbforge::error::DbForgeError;
use rstest::rstest;
use std::io::Write;

#[test]
fn test_defaults_are_valid() {
    let c = Config::default();
    assert!(c.validate().is_ok());
    assert_eq!(c.search.population_size, 50);
    assert_eq!(c.evaluation.mode, EvaluationMode::Exact);
    assert!((c.evaluation.zero_accuracy() - 0.01).abs() < 1e-12);
}

#[test]
fn test_partial_options_file_keeps_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "populationSize": 8,
            "initUp": 0.5,
            "evaluation": {{ "mode": "statistical", "trials": 30 }},
            "simulationParameters": {{ "mu": -0.28, "anneal_cycles": 500 }}
        }}"#
    )
    .unwrap();

    let c = Config::load_from_file(file.path()).unwrap();
    assert_eq!(c.search.population_size, 8);
    assert_eq!(c.search.init_up, 0.5);
    assert_eq!(c.search.elitism_count, 2);
    assert_eq!(c.evaluation.mode, EvaluationMode::Statistical);
    assert_eq!(c.evaluation.trials, 30);
    assert_eq!(c.evaluation.threshold, 0.9);
    assert_eq!(c.simulation_parameters.get("anneal_cycles"), Some("500"));
}

#[test]
fn test_unreadable_options_file() {
    let err = Config::load_from_file("/definitely/not/here.json").unwrap_err();
    assert!(matches!(err, DbForgeError::Config(_)));

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();
    assert!(Config::load_from_file(file.path()).is_err());
}

#[rstest]
#[case::empty_population(|c: &mut Config| c.search.population_size = 0)]
#[case::too_many_elites(|c: &mut Config| c.search.elitism_count = 51)]
#[case::rate_above_one(|c: &mut Config| c.search.crossover_rate = 1.5)]
#[case::rates_sum_above_one(|c: &mut Config| c.search.mutation_rate = 0.5)]
#[case::negative_weight(|c: &mut Config| c.search.init_up = -0.1)]
#[case::zero_weights(|c: &mut Config| {
    c.search.init_empty = 0.0;
    c.search.init_up = 0.0;
    c.search.init_down = 0.0;
})]
#[case::zero_trials(|c: &mut Config| c.evaluation.trials = 0)]
#[case::threshold(|c: &mut Config| c.evaluation.threshold = 1.2)]
#[case::no_workers(|c: &mut Config| c.evaluation.max_concurrency = 0)]
#[case::no_timeout(|c: &mut Config| c.evaluation.timeout_secs = 0)]
fn test_validate_rejects(#[case] tweak: fn(&mut Config)) {
    let mut c = Config::default();
    tweak(&mut c);
    assert!(matches!(c.validate(), Err(DbForgeError::Config(_))));
}

#[test]
fn test_simulation_parameters_resolve_over_defaults() {
    let params = SimulationParameters::default()
        .with("T_init", "250")
        .with("mu", "-0.25");
    let resolved = params.resolved();

    assert_eq!(resolved["T_init"], "250");
    assert_eq!(resolved["anneal_cycles"], "10000");
    assert_eq!(resolved["muzm"], "-0.25");

    let both = params.with("muzm", "-0.3").resolved();
    assert_eq!(both["muzm"], "-0.3");
    assert_eq!(SimulationParameters::default().resolved()["muzm"], "-0.32");
}

#[rstest]
#[case("muzm=-0.3", Some(("muzm", "-0.3")))]
#[case(" T_min = 4 ", Some(("T_min", "4")))]
#[case("novalue", None)]
fn test_parse_key_val(#[case] input: &str, #[case] expected: Option<(&str, &str)>) {
    let parsed = parse_key_val(input).ok();
    let expected = expected.map(|(k, v)| (k.to_string(), v.to_string()));
    assert_eq!(parsed, expected);
}

#[test]
fn test_mode_names() {
    assert_eq!("statistical".parse::<EvaluationMode>().ok(), Some(EvaluationMode::Statistical));
    assert_eq!(EvaluationMode::Exact.to_string(), "exact");
    assert!("fuzzy".parse::<EvaluationMode>().is_err());
}
