// ==========================================
// 筒仓出料仿真系统 - 筒仓与物料领域模型
// ==========================================
// 职责: 物料物性 / Beverloo 参数 / 筒仓几何
// 红线: 一次运行内只读，不在引擎中修改
// ==========================================

use crate::engine::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

// ==========================================
// Material - 散料物性
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub rho_bulk_kg_m3: f64,   // 堆积密度 (kg/m³)
    pub grain_diameter_m: f64, // 颗粒粒径 (m)
}

impl Material {
    pub fn new(rho_bulk_kg_m3: f64, grain_diameter_m: f64) -> Self {
        Self {
            rho_bulk_kg_m3,
            grain_diameter_m,
        }
    }

    /// 校验物性参数（密度、粒径必须为正）
    pub fn validate(&self) -> EngineResult<()> {
        if !(self.rho_bulk_kg_m3 > 0.0) {
            return Err(EngineError::InvalidParameter(
                "material.rho_bulk_kg_m3 must be > 0".to_string(),
            ));
        }
        if !(self.grain_diameter_m > 0.0) {
            return Err(EngineError::InvalidParameter(
                "material.grain_diameter_m must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

// ==========================================
// BeverlooParams - Beverloo 经验参数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeverlooParams {
    pub c: f64,      // 经验系数 C
    pub k: f64,      // 粒径修正系数 k
    pub g_m_s2: f64, // 重力加速度
}

impl Default for BeverlooParams {
    fn default() -> Self {
        Self {
            c: 0.58,
            k: 1.4,
            g_m_s2: 9.81,
        }
    }
}

impl BeverlooParams {
    pub fn validate(&self) -> EngineResult<()> {
        if !(self.c > 0.0) {
            return Err(EngineError::InvalidParameter(
                "beverloo C must be > 0".to_string(),
            ));
        }
        if !(self.k >= 0.0) {
            return Err(EngineError::InvalidParameter(
                "beverloo k must be >= 0".to_string(),
            ));
        }
        if !(self.g_m_s2 > 0.0) {
            return Err(EngineError::InvalidParameter(
                "beverloo gravity must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

// ==========================================
// Silo - 筒仓几何
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Silo {
    pub silo_id: String,
    pub capacity_kg: f64,       // 额定容量 (kg)
    pub body_diameter_m: f64,   // 仓体直径 (m)
    pub outlet_diameter_m: f64, // 出料口直径 (m)
    #[serde(default)]
    pub initial_mass_kg: f64,   // 初始存量 (kg, 仅做校验)
}

impl Silo {
    pub fn new(
        silo_id: &str,
        capacity_kg: f64,
        body_diameter_m: f64,
        outlet_diameter_m: f64,
    ) -> Self {
        Self {
            silo_id: silo_id.to_string(),
            capacity_kg,
            body_diameter_m,
            outlet_diameter_m,
            initial_mass_kg: 0.0,
        }
    }

    /// 仓体横截面积 π·(d/2)²
    pub fn cross_section_area_m2(&self) -> f64 {
        PI * (self.body_diameter_m / 2.0).powi(2)
    }

    /// 校验几何参数
    ///
    /// # 返回
    /// - Ok(()) 全部为有限正数（初始存量可为 0）
    /// - Err(EngineError::InvalidParameter) 并指明筒仓与字段
    pub fn validate(&self) -> EngineResult<()> {
        let id = &self.silo_id;
        if !(self.capacity_kg > 0.0 && self.capacity_kg.is_finite()) {
            return Err(EngineError::InvalidParameter(format!(
                "Silo {}: capacity_kg must be finite and > 0",
                id
            )));
        }
        if !(self.body_diameter_m > 0.0 && self.body_diameter_m.is_finite()) {
            return Err(EngineError::InvalidParameter(format!(
                "Silo {}: body_diameter_m must be finite and > 0",
                id
            )));
        }
        if !(self.outlet_diameter_m > 0.0 && self.outlet_diameter_m.is_finite()) {
            return Err(EngineError::InvalidParameter(format!(
                "Silo {}: outlet_diameter_m must be finite and > 0",
                id
            )));
        }
        if !(self.initial_mass_kg >= 0.0 && self.initial_mass_kg.is_finite()) {
            return Err(EngineError::RangeViolation(format!(
                "Silo {}: initial_mass_kg must be finite and >= 0",
                id
            )));
        }
        Ok(())
    }
}
