//! Fact scoring through one-to-many clusters.

use anno_score::eval::{
    evaluate_facts, ArgumentOracle, ClusterEngine, EvalConfig, Fact, FactMode,
};
use anno_score::Error;

fn fact(id: u64, kind: &str) -> Fact {
    Fact::new(id, kind)
}

#[test]
fn test_reference_fact_bound_to_nothing() {
    let reference = vec![fact(1, "Occupation")
        .with_argument("who", ["Иванов"])
        .with_argument("position", ["директор"])];
    let alignment = evaluate_facts(&reference, &[], &EvalConfig::default()).unwrap();

    assert_eq!(alignment.clusters.len(), 1);
    assert!(alignment.clusters[0].system.is_empty());
    assert_eq!(alignment.clusters[0].quality, 0.0);
    assert_eq!(alignment.overall.tp_std, 0.0);
    assert_eq!(alignment.overall.n_std, 1);
    assert_eq!(alignment.overall.recall.get(), 0.0);
}

#[test]
fn test_ignored_reference_fact_bound_to_nothing() {
    let reference = vec![fact(1, "Occupation")
        .with_argument("who", ["Иванов"])
        .with_argument("difficulty", ["elevated"])];
    let alignment = evaluate_facts(&reference, &[], &EvalConfig::default()).unwrap();

    assert!(alignment.clusters[0].ignored);
    assert_eq!(alignment.overall.n_std, 0);
    assert_eq!(alignment.overall.f1.get(), 1.0);
}

#[test]
fn test_spurious_system_fact_costs_precision() {
    let reference = vec![fact(1, "Occupation").with_argument("who", ["Иванов"])];
    let system = vec![
        fact(1, "Occupation").with_argument("who", ["Иванов"]),
        fact(2, "Meeting").with_argument("participant", ["Петров"]),
    ];
    let alignment = evaluate_facts(&reference, &system, &EvalConfig::default()).unwrap();

    assert_eq!(alignment.overall.recall.get(), 1.0);
    assert_eq!(alignment.overall.precision.get(), 0.5);
    let lone = alignment.clusters.last().unwrap();
    assert_eq!(lone.reference, None);
    assert_eq!(lone.system, vec![1]);
}

#[test]
fn test_each_system_fact_picks_its_own_reference() {
    let reference = vec![
        fact(1, "Occupation")
            .with_argument("who", ["Иванов"])
            .with_argument("where", ["Газпром"]),
        fact(2, "Occupation")
            .with_argument("who", ["Петров"])
            .with_argument("where", ["Роснефть"]),
    ];
    let system = vec![
        fact(1, "Occupation")
            .with_argument("who", ["Петров"])
            .with_argument("where", ["Роснефть"]),
        fact(2, "Occupation")
            .with_argument("who", ["Иванов"])
            .with_argument("where", ["Газпром"]),
    ];
    let alignment = evaluate_facts(&reference, &system, &EvalConfig::default()).unwrap();

    assert_eq!(alignment.overall.f1.get(), 1.0);
    assert_eq!(alignment.clusters[0].system, vec![1]);
    assert_eq!(alignment.clusters[1].system, vec![0]);
}

#[test]
fn test_split_response_loses_identification() {
    let reference = vec![fact(1, "Occupation")
        .with_argument("who", ["Иванов"])
        .with_argument("position", ["директор"])
        .with_argument("where", ["Газпром"])];
    let whole = vec![fact(1, "Occupation")
        .with_argument("who", ["Иванов"])
        .with_argument("position", ["директор"])
        .with_argument("where", ["Газпром"])];
    let split = vec![
        fact(1, "Occupation")
            .with_argument("who", ["Иванов"])
            .with_argument("position", ["директор"]),
        fact(2, "Occupation")
            .with_argument("who", ["Иванов"])
            .with_argument("where", ["Газпром"]),
    ];

    let config = EvalConfig::default();
    let whole = evaluate_facts(&reference, &whole, &config).unwrap();
    let split = evaluate_facts(&reference, &split, &config).unwrap();

    assert_eq!(whole.overall.f1.get(), 1.0);
    assert!(split.overall.f1.get() < 1.0);
    assert_eq!(split.clusters[0].argument_quality, 1.0);
    assert!(split.clusters[0].identification_quality < 1.0);
}

#[test]
fn test_position_alone_never_binds() {
    let reference = vec![fact(1, "Occupation")
        .with_argument("who", ["Иванов"])
        .with_argument("position", ["директор"])];
    let system = vec![fact(1, "Occupation")
        .with_argument("who", ["Сидоров"])
        .with_argument("job", ["директор"])];
    let alignment = evaluate_facts(&reference, &system, &EvalConfig::default()).unwrap();

    assert!(alignment.clusters[0].system.is_empty());
    assert_eq!(alignment.overall.f1.get(), 0.0);
}

#[test]
fn test_easy_mode_does_not_score_reference_phase() {
    let reference = vec![fact(1, "Occupation")
        .with_argument("who", ["Иванов"])
        .with_argument("phase", ["start"])];
    let system = vec![fact(1, "Occupation").with_argument("who", ["Иванов"])];

    let easy = evaluate_facts(&reference, &system, &EvalConfig::default()).unwrap();
    let hard = evaluate_facts(
        &reference,
        &system,
        &EvalConfig {
            fact_mode: FactMode::Hard,
            ..EvalConfig::default()
        },
    )
    .unwrap();

    assert_eq!(easy.overall.f1.get(), 1.0);
    assert_eq!(hard.clusters[0].argument_quality, 0.5);
}

#[test]
fn test_system_phase_is_spurious_in_easy_mode() {
    let reference = vec![fact(1, "Occupation")
        .with_argument("who", ["Иванов"])
        .with_argument("where", ["Газпром"])];
    let system = vec![fact(1, "Occupation")
        .with_argument("who", ["Иванов"])
        .with_argument("where", ["Газпром"])
        .with_argument("phase", ["start"])];

    let alignment = evaluate_facts(&reference, &system, &EvalConfig::default()).unwrap();
    let cluster = &alignment.clusters[0];
    assert!((cluster.argument_quality - 2.0 / 3.0).abs() < 1e-12);
    assert_eq!(cluster.identification_quality, 1.0);
    assert!((cluster.quality - 2.0 / 3.0).abs() < 1e-12);
    assert!((alignment.overall.f1.get() - 2.0 / 3.0).abs() < 1e-12);
}

#[test]
fn test_fact_types_compare_case_insensitively() {
    let reference = vec![fact(1, "Occupation").with_argument("who", ["Иванов"])];
    let system = vec![fact(1, "occupation").with_argument("who", ["Иванов"])];
    let alignment = evaluate_facts(&reference, &system, &EvalConfig::default()).unwrap();
    assert_eq!(alignment.overall.f1.get(), 1.0);
}

#[test]
fn test_hard_mode_drops_optional_reference_facts() {
    let reference = vec![
        fact(1, "Occupation")
            .with_argument("who", ["Иванов"])
            .with_argument("modality", ["possibility"]),
        fact(2, "Occupation").with_argument("who", ["Петров"]),
    ];
    let system = vec![fact(1, "Occupation").with_argument("who", ["Петров"])];

    let hard = evaluate_facts(
        &reference,
        &system,
        &EvalConfig {
            fact_mode: FactMode::Hard,
            ..EvalConfig::default()
        },
    )
    .unwrap();
    assert_eq!(hard.overall.f1.get(), 1.0);
    assert_eq!(hard.clusters.len(), 1);

    let easy = evaluate_facts(&reference, &system, &EvalConfig::default()).unwrap();
    assert_eq!(easy.overall.recall.get(), 0.5);
}

#[test]
fn test_budget_is_reported() {
    let reference: Vec<Fact> = (0..3)
        .map(|i| fact(i, "Occupation").with_argument("who", ["Иванов"]))
        .collect();
    let system: Vec<Fact> = (0..8)
        .map(|i| fact(i, "Occupation").with_argument("who", ["Иванов"]))
        .collect();
    let oracle = ArgumentOracle::default();
    let result = ClusterEngine::new(&oracle, &reference, &system)
        .with_max_steps(Some(100))
        .find_solution();
    match result {
        Err(Error::SearchExhausted { steps }) => assert_eq!(steps, 101),
        other => panic!("expected an exhausted search, got {:?}", other),
    }
}
