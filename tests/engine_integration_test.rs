// ==========================================
// 多仓编排引擎集成测试
// ==========================================
// 场景: 三仓示例数据, 端到端仿真 + 台账一致性
// ==========================================

mod helpers;

use helpers::test_data_builder::{fast_params, sample_inputs, InputsBuilder, MALT_PARAMS};
use silo_blend::domain::DischargeRequest;
use silo_blend::engine::{
    beverloo_mass_flow_rate_kg_s, EngineError, MultiSiloOrchestrator, SimulationParams,
};
use silo_blend::logging;
use std::collections::HashMap;

const TOL: f64 = 1e-6;

fn run_sample(params: SimulationParams) -> silo_blend::MultiSiloResult {
    logging::init_test();
    let orchestrator = MultiSiloOrchestrator::new(params).unwrap();
    orchestrator.run(&sample_inputs()).unwrap()
}

#[test]
fn test_sample_run_discharges_requested_mass() {
    let result = run_sample(fast_params(true));

    let expected = [("S1", 1600.0), ("S2", 1500.0), ("S3", 800.0)];
    for (silo_id, mass) in expected {
        let silo = result.silo(silo_id).unwrap();
        assert!((silo.discharged_mass_kg - mass).abs() < TOL, "{}", silo_id);

        let from_segments: f64 = silo
            .segment_contributions
            .iter()
            .map(|c| c.discharged_mass_kg)
            .sum();
        assert!((from_segments - mass).abs() < TOL, "{}", silo_id);
    }
    assert!((result.total_discharged_mass_kg - 3900.0).abs() < TOL);
    assert!(result.warnings.is_empty());
}

#[test]
fn test_sample_run_flow_rate_and_time_consistent() {
    let params = fast_params(false);
    let result = run_sample(params);
    let inputs = sample_inputs();

    for silo in &inputs.silos {
        let w = beverloo_mass_flow_rate_kg_s(silo, &params.material, &params.beverloo).unwrap();
        let r = result.silo(&silo.silo_id).unwrap();
        assert!((r.mass_flow_rate_kg_s - w).abs() < 1e-9);
        assert!((r.discharge_time_s - r.discharged_mass_kg / w).abs() < 1e-9);
        assert_eq!(r.sigma_m, 0.12);
        assert_eq!(r.sigma_attempts, 0);
    }
}

#[test]
fn test_blended_params_bounded_by_supplier_range() {
    let result = run_sample(fast_params(true));
    let inputs = sample_inputs();

    for param in MALT_PARAMS {
        let (lo, hi) = inputs.suppliers.param_bounds(param).unwrap();
        let total = result.total_blended_params[param];
        assert!(total >= lo - TOL && total <= hi + TOL, "{} = {}", param, total);

        for silo in &result.per_silo {
            let v = silo.blended_params[param];
            assert!(v >= lo - TOL && v <= hi + TOL, "{} {} = {}", silo.silo_id, param, v);
        }
    }
}

#[test]
fn test_ledgers_are_consistent() {
    let result = run_sample(fast_params(true));

    // 分段: remaining = max(0, segment - discharged)
    for row in &result.segment_ledger {
        assert!(row.discharged_mass_kg >= 0.0);
        let expected = (row.segment_mass_kg - row.discharged_mass_kg).max(0.0);
        assert!((row.remaining_mass_kg - expected).abs() < TOL);
    }

    // 批次: 由分段汇总
    let mut lot_remaining: HashMap<(String, String), f64> = HashMap::new();
    for row in &result.segment_ledger {
        *lot_remaining
            .entry((row.silo_id.clone(), row.lot_id.clone()))
            .or_default() += row.remaining_mass_kg;
    }
    for row in &result.lot_ledger {
        let key = (row.silo_id.clone(), row.lot_id.clone());
        assert!((row.remaining_mass_kg - lot_remaining[&key]).abs() < TOL);
    }

    // 筒仓: 初始 = 装料总量, 百分比与剩余一致
    for row in &result.silo_ledger {
        let fill: f64 = sample_inputs().total_fill_mass_kg(&row.silo_id);
        assert!((row.initial_mass_kg - fill).abs() < TOL);
        assert!((row.remaining_pct - 100.0 * row.remaining_mass_kg / fill).abs() < TOL);
    }

    let total_remaining: f64 = result.silo_ledger.iter().map(|r| r.remaining_mass_kg).sum();
    assert!((result.total_remaining_mass_kg - total_remaining).abs() < TOL);
    assert!(result.total_remaining_mass_kg >= 7200.0 - 3900.0 - TOL);
}

#[test]
fn test_lot_contributions_sorted_and_aggregated() {
    let result = run_sample(fast_params(true));

    let keys: Vec<(String, String)> = result
        .lot_contributions
        .iter()
        .map(|c| (c.silo_id.clone(), c.lot_id.clone()))
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);

    let lot_total: f64 = result.lot_contributions.iter().map(|c| c.discharged_mass_kg).sum();
    assert!((lot_total - result.total_discharged_mass_kg).abs() < TOL);
}

#[test]
fn test_run_is_deterministic() {
    let a = run_sample(fast_params(true));
    let b = run_sample(fast_params(true));
    assert_eq!(a.segment_contributions, b.segment_contributions);
    assert_eq!(a.total_blended_params, b.total_blended_params);
}

#[test]
fn test_zero_discharge_gives_nan_blend() {
    logging::init_test();
    let inputs = sample_inputs().with_discharge(vec![
        DischargeRequest::mass("S1", 0.0),
        DischargeRequest::fraction("S2", 0.0),
        DischargeRequest::mass("S3", 0.0),
    ]);
    let result = MultiSiloOrchestrator::new(fast_params(true))
        .unwrap()
        .run(&inputs)
        .unwrap();

    assert_eq!(result.total_discharged_mass_kg, 0.0);
    assert!(result.total_blended_params.values().all(|v| v.is_nan()));
    assert!((result.total_remaining_mass_kg - 7200.0).abs() < TOL);
}

#[test]
fn test_full_fraction_discharges_whole_silo() {
    logging::init_test();
    let inputs = sample_inputs().with_discharge(vec![
        DischargeRequest::fraction("S1", 1.0),
        DischargeRequest::mass("S2", 100.0),
        DischargeRequest::mass("S3", 100.0),
    ]);
    let result = MultiSiloOrchestrator::new(fast_params(false))
        .unwrap()
        .run(&inputs)
        .unwrap();

    let s1 = result.silo("S1").unwrap();
    assert!((s1.discharged_mass_kg - 2800.0).abs() < TOL);
}

#[test]
fn test_fraction_out_of_range_rejected() {
    logging::init_test();
    let inputs = sample_inputs().with_discharge(vec![
        DischargeRequest::mass("S1", 100.0),
        DischargeRequest::fraction("S2", 1.2),
        DischargeRequest::mass("S3", 100.0),
    ]);
    let err = MultiSiloOrchestrator::new(fast_params(false))
        .unwrap()
        .run(&inputs)
        .unwrap_err();

    match err {
        EngineError::RangeViolation(msg) => {
            assert!(msg.contains("discharge_fraction must be between 0 and 1"))
        }
        other => panic!("Expected RangeViolation, got {:?}", other),
    }
}

#[test]
fn test_unknown_supplier_rejected() {
    logging::init_test();
    let inputs = InputsBuilder::new()
        .silo("S1", 4000.0, 3.0, 0.2)
        .layer("S1", "L1", "Nobody", 1000.0)
        .supplier("BBM", [4.2, 82.0, 5.98, 342.1, 10.12, 3.8])
        .discharge_mass("S1", 100.0)
        .build();

    let err = MultiSiloOrchestrator::new(fast_params(false))
        .unwrap()
        .run(&inputs)
        .unwrap_err();
    assert!(matches!(err, EngineError::MissingSpec(_)));
}

#[test]
fn test_outlet_smaller_than_grain_term_rejected() {
    logging::init_test();
    // 0.005 - 1.4 * 0.004 < 0
    let inputs = InputsBuilder::new()
        .silo("S1", 4000.0, 3.0, 0.005)
        .layer("S1", "L1", "BBM", 1000.0)
        .supplier("BBM", [4.2, 82.0, 5.98, 342.1, 10.12, 3.8])
        .discharge_mass("S1", 100.0)
        .build();

    let err = MultiSiloOrchestrator::new(fast_params(false))
        .unwrap()
        .run(&inputs)
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidGeometry { .. }));
}

#[test]
fn test_non_three_silo_count_only_warns() {
    logging::init_test();
    let inputs = InputsBuilder::new()
        .silo("S1", 4000.0, 3.0, 0.2)
        .layer("S1", "L1", "BBM", 1000.0)
        .layer("S1", "L2", "COFCO", 1000.0)
        .supplier("BBM", [4.2, 82.0, 5.98, 342.1, 10.12, 3.8])
        .supplier("COFCO", [4.4, 81.8, 5.93, 317.4, 11.1, 4.0])
        .discharge_mass("S1", 500.0)
        .build();

    let result = MultiSiloOrchestrator::new(fast_params(true))
        .unwrap()
        .run(&inputs)
        .unwrap();
    assert_eq!(result.per_silo.len(), 1);
    assert_eq!(result.warnings.len(), 1);
}

#[test]
fn test_non_finite_segment_mass_rejected() {
    logging::init_test();
    let inputs = InputsBuilder::new()
        .silo("S1", 4000.0, 3.0, 0.2)
        .layer("S1", "L1", "BBM", 1000.0)
        .layer("S1", "L2", "COFCO", f64::NAN)
        .layer("S1", "L3", "BBM", 800.0)
        .supplier("BBM", [4.2, 82.0, 5.98, 342.1, 10.12, 3.8])
        .supplier("COFCO", [4.4, 81.8, 5.93, 317.4, 11.1, 4.0])
        .discharge_mass("S1", 500.0)
        .build();

    let err = MultiSiloOrchestrator::new(fast_params(true))
        .unwrap()
        .run(&inputs)
        .unwrap_err();
    match err {
        EngineError::RangeViolation(msg) => assert!(msg.contains("non-finite")),
        other => panic!("Expected RangeViolation, got {:?}", other),
    }
}

#[test]
fn test_non_finite_supplier_param_rejected() {
    logging::init_test();
    let inputs = InputsBuilder::new()
        .silo("S1", 4000.0, 3.0, 0.2)
        .layer("S1", "L1", "BBM", 1000.0)
        .supplier("BBM", [4.2, 82.0, f64::INFINITY, 342.1, 10.12, 3.8])
        .discharge_mass("S1", 100.0)
        .build();

    let err = MultiSiloOrchestrator::new(fast_params(false))
        .unwrap()
        .run(&inputs)
        .unwrap_err();
    match err {
        EngineError::RangeViolation(msg) => assert!(msg.contains("BBM.wort_pH")),
        other => panic!("Expected RangeViolation, got {:?}", other),
    }
}
