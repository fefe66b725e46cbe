use crate::domain::silo::{BeverlooParams, Material};
use crate::engine::error::EngineResult;
use crate::engine::orchestrator::SimulationParams;
use crate::engine::sigma_adjuster::DEFAULT_MIN_NONZERO_MASS_KG;
use serde::{Deserialize, Serialize};

/// 仿真运行配置
///
/// 存储位置：配置文件（扁平 JSON 对象）或命令行覆写
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// 堆积密度 (kg/m³)
    pub rho_bulk_kg_m3: f64,

    /// 颗粒粒径 (m)
    pub grain_diameter_m: f64,

    /// Beverloo 经验系数 C
    pub beverloo_c: f64,

    /// Beverloo 粒径修正系数 k
    pub beverloo_k: f64,

    /// 重力加速度 (m/s²)
    pub gravity_m_s2: f64,

    /// 混合展宽 σ (m)
    pub sigma_m: f64,

    /// 时间步数
    pub steps: usize,

    /// 是否启用 σ 自动放大
    pub auto_adjust: bool,

    /// 批次有效出料质量阈值 (kg)
    pub min_nonzero_mass_kg: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        let bev = BeverlooParams::default();
        Self {
            rho_bulk_kg_m3: 610.0,
            grain_diameter_m: 0.004,
            beverloo_c: bev.c,
            beverloo_k: bev.k,
            gravity_m_s2: bev.g_m_s2,
            sigma_m: 0.12,
            steps: 2000,
            auto_adjust: true,
            min_nonzero_mass_kg: DEFAULT_MIN_NONZERO_MASS_KG,
        }
    }
}

impl RunConfig {
    /// 转换为引擎仿真参数（并校验）
    pub fn to_simulation_params(&self) -> EngineResult<SimulationParams> {
        let params = SimulationParams {
            material: Material::new(self.rho_bulk_kg_m3, self.grain_diameter_m),
            beverloo: BeverlooParams {
                c: self.beverloo_c,
                k: self.beverloo_k,
                g_m_s2: self.gravity_m_s2,
            },
            sigma_m: self.sigma_m,
            steps: self.steps,
            auto_adjust: self.auto_adjust,
            min_nonzero_mass_kg: self.min_nonzero_mass_kg,
        };
        params.validate()?;
        Ok(params)
    }
}
