// ==========================================
// 筒仓出料仿真系统 - 结果输出
// ==========================================
// 职责: 仿真结果 → CSV 台账 + summary.json + 终端摘要
// 红线: 只读结果, 不重新计算
// ==========================================

use crate::domain::MultiSiloResult;
use crate::engine::OptimizationResult;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const SEGMENT_CONTRIBUTIONS_FILE: &str = "segment_contributions.csv";
pub const LOT_CONTRIBUTIONS_FILE: &str = "lot_contributions.csv";
pub const SILO_STATE_LEDGER_FILE: &str = "silo_state_ledger.csv";
pub const LOT_STATE_LEDGER_FILE: &str = "lot_state_ledger.csv";
pub const SEGMENT_STATE_LEDGER_FILE: &str = "segment_state_ledger.csv";
pub const SUMMARY_FILE: &str = "summary.json";
pub const OPTIMIZATION_FILE: &str = "optimization.json";

/// 输出层错误类型
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("输出目录/文件写入失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV 写入失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON 序列化失败: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ReportResult<T> = Result<T, ReportError>;

/// 仿真输出文件路径
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPaths {
    pub segment_contributions_csv: PathBuf,
    pub lot_contributions_csv: PathBuf,
    pub silo_state_ledger_csv: PathBuf,
    pub lot_state_ledger_csv: PathBuf,
    pub segment_state_ledger_csv: PathBuf,
    pub summary_json: PathBuf,
}

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> ReportResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// 汇总 JSON（非有限数值写为 null）
pub fn summary_payload(result: &MultiSiloResult) -> Value {
    let mut per_silo = Map::new();
    for silo in &result.per_silo {
        per_silo.insert(
            silo.silo_id.clone(),
            json!({
                "discharged_mass_kg": silo.discharged_mass_kg,
                "mass_flow_rate_kg_s": silo.mass_flow_rate_kg_s,
                "discharge_time_s": silo.discharge_time_s,
                "sigma_m": silo.sigma_m,
                "sigma_attempts": silo.sigma_attempts,
                "blended_params_per_silo": silo.blended_params,
            }),
        );
    }

    json!({
        "total_discharged_mass_kg": result.total_discharged_mass_kg,
        "total_remaining_mass_kg": result.total_remaining_mass_kg,
        "total_blended_params": result.total_blended_params,
        "per_silo": per_silo,
        "warnings": result.warnings,
    })
}

/// 写出仿真结果
///
/// # 参数
/// - result: 多仓仿真结果
/// - output_dir: 输出目录（不存在时创建）
/// - config_snapshot: 生效配置（写入 summary.json 的 config 字段）
pub fn write_outputs(
    result: &MultiSiloResult,
    output_dir: &Path,
    config_snapshot: Option<&Value>,
) -> ReportResult<OutputPaths> {
    fs::create_dir_all(output_dir)?;

    let paths = OutputPaths {
        segment_contributions_csv: output_dir.join(SEGMENT_CONTRIBUTIONS_FILE),
        lot_contributions_csv: output_dir.join(LOT_CONTRIBUTIONS_FILE),
        silo_state_ledger_csv: output_dir.join(SILO_STATE_LEDGER_FILE),
        lot_state_ledger_csv: output_dir.join(LOT_STATE_LEDGER_FILE),
        segment_state_ledger_csv: output_dir.join(SEGMENT_STATE_LEDGER_FILE),
        summary_json: output_dir.join(SUMMARY_FILE),
    };

    write_csv(&paths.segment_contributions_csv, &result.segment_contributions)?;
    write_csv(&paths.lot_contributions_csv, &result.lot_contributions)?;
    write_csv(&paths.silo_state_ledger_csv, &result.silo_ledger)?;
    write_csv(&paths.lot_state_ledger_csv, &result.lot_ledger)?;
    write_csv(&paths.segment_state_ledger_csv, &result.segment_ledger)?;

    let mut payload = summary_payload(result);
    if let (Some(cfg), Value::Object(map)) = (config_snapshot, &mut payload) {
        map.insert("config".to_string(), cfg.clone());
    }
    fs::write(&paths.summary_json, serde_json::to_string_pretty(&payload)?)?;

    info!(dir = %output_dir.display(), "仿真结果已写出");
    Ok(paths)
}

/// 写出优化结果 (optimization.json)
pub fn write_optimization_output(
    result: &OptimizationResult,
    output_dir: &Path,
) -> ReportResult<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(OPTIMIZATION_FILE);
    fs::write(&path, serde_json::to_string_pretty(result)?)?;
    info!(path = %path.display(), candidates = result.candidates.len(), "优化结果已写出");
    Ok(path)
}

/// 终端摘要（仿真）
pub fn terminal_summary(result: &MultiSiloResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Simulation complete");
    let _ = writeln!(out, "Total discharged mass: {:.3} kg", result.total_discharged_mass_kg);
    let _ = writeln!(out, "Total remaining mass: {:.3} kg", result.total_remaining_mass_kg);
    let _ = writeln!(out, "Total blended parameters:");
    for (name, value) in &result.total_blended_params {
        let _ = writeln!(out, "- {}: {:.4}", name, value);
    }
    let _ = writeln!(out, "Per-silo:");
    for silo in &result.per_silo {
        let _ = writeln!(
            out,
            "- {}: discharge={:.3} kg, flow={:.3} kg/s, time={:.3} s, sigma={:.4} m",
            silo.silo_id,
            silo.discharged_mass_kg,
            silo.mass_flow_rate_kg_s,
            silo.discharge_time_s,
            silo.sigma_m
        );
    }
    for warning in &result.warnings {
        let _ = writeln!(out, "warning: {}", warning);
    }
    out.trim_end().to_string()
}

/// 终端摘要（优化）
pub fn optimization_summary(result: &OptimizationResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Optimization complete ({}, {} explore + {} exploit)",
        result.objective_method, result.explore_iterations, result.exploit_iterations
    );
    let _ = writeln!(out, "Best score: {:.6}", result.best_score);
    let _ = writeln!(out, "Recommended discharge:");
    for (silo_id, plan) in &result.recommended_discharge {
        let _ = writeln!(
            out,
            "- {}: fraction={:.4}, mass={:.3} kg",
            silo_id, plan.fraction, plan.mass_kg
        );
    }
    let _ = writeln!(
        out,
        "Best discharged mass: {:.3} kg",
        result.best_total_discharged_mass_kg
    );
    let _ = writeln!(out, "Best blended parameters:");
    for (name, value) in &result.best_blended_params {
        let _ = writeln!(out, "- {}: {:.4}", name, value);
    }
    out.trim_end().to_string()
}
