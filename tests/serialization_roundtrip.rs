use approx::assert_relative_eq;
use mcrisk::core::{RiskError, SimulationConfig, from_json, simulation_config_from_json, to_json_pretty};
use mcrisk::engines::MonteCarloRiskEngine;
use mcrisk::models::ReturnStatistics;
use mcrisk::risk::RiskReport;
use nalgebra::{DMatrix, DVector};

#[test]
fn config_loads_from_collaborator_json() {
    let payload = r#"{
        "horizon_days": 20,
        "n_paths": 20000,
        "seed": 42,
        "initial_value": 10000.0,
        "weights": [0.5, 0.5]
    }"#;
    let cfg = simulation_config_from_json(payload).unwrap();
    assert_eq!(cfg.seed, Some(42));
    assert_eq!(cfg.weights, vec![0.5, 0.5]);

    let unseeded = r#"{"horizon_days": 5, "n_paths": 10, "initial_value": 1.0, "weights": [1.0]}"#;
    assert_eq!(simulation_config_from_json(unseeded).unwrap().seed, None);
}

#[test]
fn invalid_config_json_is_rejected() {
    let bad_weights = r#"{"horizon_days": 20, "n_paths": 100, "initial_value": 1.0, "weights": [0.3, 0.3]}"#;
    assert!(matches!(
        simulation_config_from_json(bad_weights),
        Err(RiskError::InvalidConfig { .. })
    ));
    assert!(matches!(
        simulation_config_from_json("{ not json"),
        Err(RiskError::InvalidConfig { .. })
    ));
}

#[test]
fn report_serializes_with_named_fields() {
    let stats = ReturnStatistics::from_parts(
        vec!["A".into()],
        DVector::from_element(1, 0.0003),
        DMatrix::from_element(1, 1, 0.0002),
        DVector::from_element(1, 10.0),
    )
    .unwrap();
    let cfg = SimulationConfig::builder()
        .horizon_days(5)
        .n_paths(200)
        .seed(3)
        .initial_value(500.0)
        .weights(vec![1.0])
        .build()
        .unwrap();
    let report = MonteCarloRiskEngine::new(cfg).run_statistics(stats).unwrap().report;

    let json = to_json_pretty(&report).unwrap();
    for key in ["var_95", "cvar_95", "var_99", "cvar_99", "prob_loss", "max_drawdown_distribution"] {
        assert!(json.contains(key), "missing {key}");
    }

    let decoded: RiskReport = from_json(&json).unwrap();
    assert_eq!(decoded.n_paths, report.n_paths);
    assert_eq!(decoded.seed, Some(3));
    assert_relative_eq!(decoded.var_95, report.var_95, max_relative = 1.0e-15);
    assert_relative_eq!(decoded.cvar_99, report.cvar_99, max_relative = 1.0e-15);
    assert_eq!(decoded.max_drawdown_distribution.len(), 200);
}
