// ==========================================
// 筒仓出料仿真系统 - 仿真结果与台账
// ==========================================
// 职责: 分段/批次/筒仓 三级出料贡献与剩余台账
// 红线: remaining = max(0, initial - discharged)
// ==========================================

use crate::domain::types::BlendedParams;
use serde::Serialize;

// ==========================================
// Trait: SupplierMass
// ==========================================
// 用途: BlendAggregator 的输入接口（任意贡献表）
pub trait SupplierMass {
    fn supplier(&self) -> &str;

    fn discharged_mass_kg(&self) -> f64;
}

// ==========================================
// SegmentContribution - 分段出料贡献
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentContribution {
    pub silo_id: String,
    pub layer_index: u32,
    pub lot_id: String,
    pub supplier: String,
    pub segment_mass_kg: f64,
    pub discharged_mass_kg: f64,
}

impl SupplierMass for SegmentContribution {
    fn supplier(&self) -> &str {
        &self.supplier
    }

    fn discharged_mass_kg(&self) -> f64 {
        self.discharged_mass_kg
    }
}

// ==========================================
// LotContribution - 批次出料贡献
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LotContribution {
    pub silo_id: String,
    pub lot_id: String,
    pub supplier: String,
    pub discharged_mass_kg: f64,
}

impl SupplierMass for LotContribution {
    fn supplier(&self) -> &str {
        &self.supplier
    }

    fn discharged_mass_kg(&self) -> f64 {
        self.discharged_mass_kg
    }
}

// ==========================================
// 台账 (State Ledger)
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentLedgerRow {
    pub silo_id: String,
    pub layer_index: u32,
    pub lot_id: String,
    pub supplier: String,
    pub segment_mass_kg: f64,
    pub discharged_mass_kg: f64,
    pub remaining_mass_kg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LotLedgerRow {
    pub silo_id: String,
    pub lot_id: String,
    pub supplier: String,
    pub initial_mass_kg: f64,
    pub discharged_mass_kg: f64,
    pub remaining_mass_kg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiloLedgerRow {
    pub silo_id: String,
    pub initial_mass_kg: f64,
    pub discharged_mass_kg: f64,
    pub remaining_mass_kg: f64,
    pub remaining_pct: f64, // 初始质量为 0 时为 NaN
}

// ==========================================
// SiloResult - 单仓仿真结果
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct SiloResult {
    pub silo_id: String,
    pub discharged_mass_kg: f64,
    pub mass_flow_rate_kg_s: f64,
    pub discharge_time_s: f64,
    pub sigma_m: f64,          // 实际使用的混合展宽
    pub sigma_attempts: usize, // σ 放大次数
    pub blended_params: BlendedParams,
    pub segment_contributions: Vec<SegmentContribution>,
    pub lot_contributions: Vec<LotContribution>,
}

// ==========================================
// MultiSiloResult - 多仓汇总结果
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct MultiSiloResult {
    pub per_silo: Vec<SiloResult>,
    pub segment_contributions: Vec<SegmentContribution>,
    pub lot_contributions: Vec<LotContribution>,
    pub segment_ledger: Vec<SegmentLedgerRow>,
    pub lot_ledger: Vec<LotLedgerRow>,
    pub silo_ledger: Vec<SiloLedgerRow>,
    pub total_discharged_mass_kg: f64,
    pub total_remaining_mass_kg: f64,
    pub total_blended_params: BlendedParams,
    pub warnings: Vec<String>,
}

impl MultiSiloResult {
    pub fn silo(&self, silo_id: &str) -> Option<&SiloResult> {
        self.per_silo.iter().find(|r| r.silo_id == silo_id)
    }
}
