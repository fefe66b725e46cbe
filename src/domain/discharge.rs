// ==========================================
// 筒仓出料仿真系统 - 出料请求领域模型
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// DischargeAmount - 出料量（质量或比例二选一）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DischargeAmount {
    Mass(f64),     // 绝对质量 (kg)
    Fraction(f64), // 占该仓总装料质量的比例 (0..1)
}

// ==========================================
// DischargeRequest - 单仓出料请求
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DischargeRequest {
    pub silo_id: String,
    pub amount: DischargeAmount,
}

impl DischargeRequest {
    pub fn mass(silo_id: &str, mass_kg: f64) -> Self {
        Self {
            silo_id: silo_id.to_string(),
            amount: DischargeAmount::Mass(mass_kg),
        }
    }

    pub fn fraction(silo_id: &str, fraction: f64) -> Self {
        Self {
            silo_id: silo_id.to_string(),
            amount: DischargeAmount::Fraction(fraction),
        }
    }
}
