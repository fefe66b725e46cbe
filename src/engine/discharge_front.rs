// ==========================================
// 筒仓出料仿真系统 - 出料前沿仿真引擎
// ==========================================
// 模型: 高斯混合前沿 Normal(z_front, σ)
// 输入: 分层区间 + 出料质量 + Beverloo 流量 + σ + 步数
// 输出: 各分段累计出料质量（最终重标定为出料质量）
// ==========================================
// 时间离散: 按等时长步进, 取步中点时刻计算已出料质量
// 每步: 区间概率 = 区间内 CDF 质量 / [0, H] 内 CDF 质量, 再归一化
// ==========================================

use crate::domain::layer::SiloIntervals;
use crate::domain::result::SegmentContribution;
use crate::engine::error::{EngineError, EngineResult};
use crate::perf;
use std::f64::consts::SQRT_2;
use tracing::{debug, instrument};

/// 归一化分母下限，低于该值视为前沿完全落在料柱外
const DENOM_EPS: f64 = 1e-15;

// ==========================================
// 正态分布 CDF
// ==========================================

/// erf 近似 (Abramowitz-Stegun 7.1.26, 最大误差 1.5e-7)
fn erf(x: f64) -> f64 {
    let sign = x.signum();
    let a = x.abs();
    let t = 1.0 / (1.0 + 0.3275911 * a);
    let poly = ((((1.061405429 * t - 1.453152027) * t + 1.421413741) * t - 0.284496736) * t
        + 0.254829592)
        * t;
    sign * (1.0 - poly * (-(a * a)).exp())
}

/// 标准正态分布累积分布函数 Φ(x)
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / SQRT_2))
}

/// 单步区间概率（写入 out, 返回是否分配成功）
///
/// 分母不足或全部被裁剪为 0 时, out 全部置 0 并返回 false
fn fill_step_probabilities(
    z_front_m: f64,
    sigma_m: f64,
    z0: &[f64],
    z1: &[f64],
    total_height_m: f64,
    out: &mut [f64],
) -> bool {
    let denom = normal_cdf((total_height_m - z_front_m) / sigma_m)
        - normal_cdf((0.0 - z_front_m) / sigma_m);
    if denom <= DENOM_EPS {
        out.iter_mut().for_each(|p| *p = 0.0);
        return false;
    }

    let mut sum = 0.0;
    for ((p, &lo), &hi) in out.iter_mut().zip(z0).zip(z1) {
        let raw = (normal_cdf((hi - z_front_m) / sigma_m) - normal_cdf((lo - z_front_m) / sigma_m))
            / denom;
        // 数值噪声导致的微小负值裁剪为 0
        *p = raw.max(0.0);
        sum += *p;
    }

    if sum <= 0.0 {
        out.iter_mut().for_each(|p| *p = 0.0);
        return false;
    }
    out.iter_mut().for_each(|p| *p /= sum);
    true
}

/// 单步区间概率向量
///
/// # 参数
/// - `z_front_m`: 出料前沿高度
/// - `sigma_m`: 混合展宽 σ (> 0)
/// - `z0` / `z1`: 各区间底/顶高度
/// - `total_height_m`: 料柱总高
///
/// # 返回
/// 各区间概率, 分母可用时之和为 1; 前沿远离料柱时全 0
pub fn layer_probabilities(
    z_front_m: f64,
    sigma_m: f64,
    z0: &[f64],
    z1: &[f64],
    total_height_m: f64,
) -> EngineResult<Vec<f64>> {
    if !(sigma_m > 0.0) {
        return Err(EngineError::InvalidParameter("sigma_m must be > 0".to_string()));
    }
    if z0.len() != z1.len() {
        return Err(EngineError::InputShape(format!(
            "interval bounds length mismatch: z0={}, z1={}",
            z0.len(),
            z1.len()
        )));
    }
    let mut out = vec![0.0; z0.len()];
    fill_step_probabilities(z_front_m, sigma_m, z0, z1, total_height_m, &mut out);
    Ok(out)
}

// ==========================================
// DischargeKinematics - 单仓出料运动学参数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DischargeKinematics {
    pub discharge_mass_kg: f64,
    pub mass_flow_rate_kg_s: f64,
    pub rho_bulk_kg_m3: f64,
    pub area_m2: f64,
}

impl DischargeKinematics {
    /// 出料总时长 (s)
    pub fn discharge_time_s(&self) -> f64 {
        if self.mass_flow_rate_kg_s > 0.0 {
            self.discharge_mass_kg / self.mass_flow_rate_kg_s
        } else {
            0.0
        }
    }
}

// ==========================================
// DischargeFrontSimulator - 出料前沿仿真引擎
// ==========================================
pub struct DischargeFrontSimulator {
    // 无状态引擎
}

impl DischargeFrontSimulator {
    pub fn new() -> Self {
        Self {}
    }

    /// 按给定 σ 仿真单仓出料
    ///
    /// # 参数
    /// - `intervals`: 单仓分层区间
    /// - `kin`: 出料质量 / 流量 / 密度 / 截面积
    /// - `sigma_m`: 混合展宽
    /// - `steps`: 时间步数
    ///
    /// # 返回
    /// 各分段出料质量（与 intervals 同序）, 之和等于出料质量
    #[instrument(skip(self, intervals, kin), fields(
        silo_id = %intervals.silo_id,
        discharge_mass_kg = kin.discharge_mass_kg,
        sigma_m,
        steps
    ))]
    pub fn simulate(
        &self,
        intervals: &SiloIntervals,
        kin: &DischargeKinematics,
        sigma_m: f64,
        steps: usize,
    ) -> EngineResult<Vec<f64>> {
        if steps == 0 {
            return Err(EngineError::InvalidParameter("steps must be > 0".to_string()));
        }
        if !(kin.mass_flow_rate_kg_s > 0.0) {
            return Err(EngineError::InvalidParameter(
                "m_dot_kg_s must be > 0".to_string(),
            ));
        }
        if !(sigma_m > 0.0) {
            return Err(EngineError::InvalidParameter("sigma_m must be > 0".to_string()));
        }

        let n = intervals.intervals.len();
        let mut discharged = vec![0.0; n];
        if kin.discharge_mass_kg == 0.0 {
            return Ok(discharged);
        }

        let z0 = intervals.z0();
        let z1 = intervals.z1();
        let dt = kin.discharge_time_s() / steps as f64;
        let dm = kin.mass_flow_rate_kg_s * dt;
        let front_scale = kin.rho_bulk_kg_m3 * kin.area_m2;

        let mut probs = vec![0.0; n];
        let mut skipped_steps = 0usize;
        for i in 0..steps {
            let t_mid = (i as f64 + 0.5) * dt;
            let m_removed = kin.discharge_mass_kg.min(kin.mass_flow_rate_kg_s * t_mid);
            let z_front = m_removed / front_scale;

            if !fill_step_probabilities(
                z_front,
                sigma_m,
                &z0,
                &z1,
                intervals.total_height_m,
                &mut probs,
            ) {
                skipped_steps += 1;
                continue;
            }
            for (acc, p) in discharged.iter_mut().zip(&probs) {
                *acc += dm * p;
            }
        }
        perf::record_sim_steps(steps as u64);

        // 全局重标定：消除浮点漂移与未分配步
        let total_sim: f64 = discharged.iter().sum();
        if total_sim > 0.0 {
            let scale = kin.discharge_mass_kg / total_sim;
            discharged.iter_mut().for_each(|m| *m *= scale);
        }

        debug!(skipped_steps, total_sim, "出料前沿仿真完成");
        Ok(discharged)
    }

    /// 将分段出料质量组装为贡献表
    pub fn to_segment_contributions(
        &self,
        intervals: &SiloIntervals,
        discharged: &[f64],
    ) -> Vec<SegmentContribution> {
        intervals
            .intervals
            .iter()
            .zip(discharged)
            .map(|(iv, &m)| SegmentContribution {
                silo_id: iv.layer.silo_id.clone(),
                layer_index: iv.layer.layer_index,
                lot_id: iv.layer.lot_id.clone(),
                supplier: iv.layer.supplier.clone(),
                segment_mass_kg: iv.layer.segment_mass_kg,
                discharged_mass_kg: m,
            })
            .collect()
    }
}

impl Default for DischargeFrontSimulator {
    fn default() -> Self {
        Self::new()
    }
}
