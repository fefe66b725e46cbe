// ==========================================
// 结果输出测试
// ==========================================

mod helpers;

use helpers::test_data_builder::{fast_params, sample_inputs};
use silo_blend::config::ConfigManager;
use silo_blend::engine::{DischargeOptimizer, MultiSiloOrchestrator};
use silo_blend::report;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

fn sample_result() -> silo_blend::MultiSiloResult {
    MultiSiloOrchestrator::new(fast_params(true))
        .unwrap()
        .run(&sample_inputs())
        .unwrap()
}

#[test]
fn test_write_outputs_creates_all_artifacts() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("nested/outputs");
    let result = sample_result();
    let snapshot = ConfigManager::new().get_config_snapshot().unwrap();

    let paths = report::write_outputs(&result, &out, Some(&snapshot)).unwrap();
    for path in [
        &paths.segment_contributions_csv,
        &paths.lot_contributions_csv,
        &paths.silo_state_ledger_csv,
        &paths.lot_state_ledger_csv,
        &paths.segment_state_ledger_csv,
        &paths.summary_json,
    ] {
        assert!(path.exists(), "{}", path.display());
    }

    // 表头 + 每段一行
    let segments = fs::read_to_string(&paths.segment_contributions_csv).unwrap();
    let mut lines = segments.lines();
    assert_eq!(
        lines.next().unwrap(),
        "silo_id,layer_index,lot_id,supplier,segment_mass_kg,discharged_mass_kg"
    );
    assert_eq!(lines.count(), 8);

    let silo_ledger = fs::read_to_string(&paths.silo_state_ledger_csv).unwrap();
    assert!(silo_ledger.starts_with(
        "silo_id,initial_mass_kg,discharged_mass_kg,remaining_mass_kg,remaining_pct"
    ));
}

#[test]
fn test_summary_json_contents() {
    let dir = TempDir::new().unwrap();
    let result = sample_result();
    let paths = report::write_outputs(&result, dir.path(), None).unwrap();

    let summary: Value =
        serde_json::from_str(&fs::read_to_string(&paths.summary_json).unwrap()).unwrap();
    let total = summary["total_discharged_mass_kg"].as_f64().unwrap();
    assert!((total - 3900.0).abs() < 1e-6);
    assert!(summary["per_silo"]["S2"]["blended_params_per_silo"]["wort_pH"].is_f64());
    assert!(summary["total_blended_params"]["moisture_pct"].is_f64());
    assert!(summary.get("config").is_none());
}

#[test]
fn test_terminal_summary_lists_every_silo() {
    let text = report::terminal_summary(&sample_result());
    assert!(text.starts_with("Simulation complete"));
    assert!(text.contains("Total discharged mass: 3900.000 kg"));
    for silo_id in ["S1", "S2", "S3"] {
        assert!(text.contains(&format!("- {}: discharge=", silo_id)));
    }
}

#[test]
fn test_write_optimization_output() {
    let dir = TempDir::new().unwrap();
    let optimizer = DischargeOptimizer::new(fast_params(true)).unwrap();
    let req = silo_blend::OptimizeRequest {
        targets: [("moisture_pct".to_string(), 4.3)].into_iter().collect(),
        param_ranges: Default::default(),
        iterations: 5,
        seed: 42,
    };
    let result = optimizer.optimize(&sample_inputs(), &req).unwrap();

    let path = report::write_optimization_output(&result, dir.path()).unwrap();
    let json: Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(json["objective_method"], "normalized_weighted_l2_hybrid_search");
    assert_eq!(json["candidates"].as_array().unwrap().len(), 5);
    assert!(json["best_fractions"]["S1"].is_f64());
    assert_eq!(
        json["recommended_discharge"]["S1"]["fraction"],
        json["best_fractions"]["S1"]
    );
    assert!(json["recommended_discharge"]["S2"]["mass_kg"].as_f64().unwrap() > 0.0);
    assert!(json["candidates"][0]["discharge"]["S3"]["mass_kg"].is_f64());

    let text = report::optimization_summary(&result);
    assert!(text.contains("Recommended discharge:"));
    assert!(text.contains("- S1: fraction="));
}
