// ==========================================
// 筒仓出料仿真系统 - σ 自动放大
// ==========================================
// 目的: 保证出料配比至少覆盖 2 个批次（物理上可行时）
// 规则: 有效批次 < 2 时 σ *= 1.35 重新仿真, 最多 12 次
// 红线: 达到上限不是错误, 返回最后一次结果
// ==========================================

use crate::domain::layer::SiloIntervals;
use crate::engine::discharge_front::{DischargeFrontSimulator, DischargeKinematics};
use crate::engine::error::{EngineError, EngineResult};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// σ 放大系数
pub const SIGMA_GROWTH: f64 = 1.35;

/// 最大放大次数
pub const MAX_SIGMA_RETRIES: usize = 12;

/// 最少有效批次数
pub const MIN_DISTINCT_LOTS: usize = 2;

/// 批次有效出料质量阈值默认值 (kg)
pub const DEFAULT_MIN_NONZERO_MASS_KG: f64 = 1e-3;

/// σ 调整结果
#[derive(Debug, Clone)]
pub struct SigmaAdjustment {
    pub discharged: Vec<f64>, // 各分段出料质量
    pub sigma_m: f64,         // 最终使用的 σ
    pub attempts: usize,      // 放大次数
    pub lots_represented: usize,
    pub converged: bool, // 是否满足 >= 2 个有效批次
}

// ==========================================
// SigmaAdjuster - σ 自动放大器
// ==========================================
pub struct SigmaAdjuster {
    simulator: DischargeFrontSimulator,
    min_nonzero_mass_kg: f64,
}

impl SigmaAdjuster {
    /// 创建 σ 放大器
    ///
    /// # 参数
    /// - `min_nonzero_mass_kg`: 批次被视为"有效"的出料质量阈值（>= 0）
    pub fn new(min_nonzero_mass_kg: f64) -> EngineResult<Self> {
        if !(min_nonzero_mass_kg >= 0.0) {
            return Err(EngineError::InvalidParameter(
                "min_nonzero_mass_kg must be >= 0".to_string(),
            ));
        }
        Ok(Self {
            simulator: DischargeFrontSimulator::new(),
            min_nonzero_mass_kg,
        })
    }

    /// 统计出料质量超过阈值的批次数
    pub fn count_significant_lots(&self, intervals: &SiloIntervals, discharged: &[f64]) -> usize {
        let mut by_lot: HashMap<&str, f64> = HashMap::new();
        for (iv, m) in intervals.intervals.iter().zip(discharged) {
            *by_lot.entry(iv.layer.lot_id.as_str()).or_insert(0.0) += m;
        }
        by_lot
            .values()
            .filter(|&&m| m > self.min_nonzero_mass_kg)
            .count()
    }

    /// 仿真（可选自动放大 σ）
    ///
    /// # 参数
    /// - `auto_adjust`: false 时只按输入 σ 仿真一次
    #[instrument(skip(self, intervals, kin), fields(silo_id = %intervals.silo_id, sigma_m, auto_adjust))]
    pub fn simulate(
        &self,
        intervals: &SiloIntervals,
        kin: &DischargeKinematics,
        sigma_m: f64,
        steps: usize,
        auto_adjust: bool,
    ) -> EngineResult<SigmaAdjustment> {
        let mut used_sigma_m = sigma_m;
        let mut discharged = self.simulator.simulate(intervals, kin, used_sigma_m, steps)?;
        let mut lots = self.count_significant_lots(intervals, &discharged);

        if !auto_adjust {
            return Ok(SigmaAdjustment {
                discharged,
                sigma_m: used_sigma_m,
                attempts: 0,
                lots_represented: lots,
                converged: lots >= MIN_DISTINCT_LOTS,
            });
        }

        let mut attempts = 0;
        while lots < MIN_DISTINCT_LOTS && attempts < MAX_SIGMA_RETRIES {
            used_sigma_m *= SIGMA_GROWTH;
            attempts += 1;
            discharged = self.simulator.simulate(intervals, kin, used_sigma_m, steps)?;
            lots = self.count_significant_lots(intervals, &discharged);
            debug!(attempt = attempts, sigma_m = used_sigma_m, lots, "σ 放大重算");
        }

        let converged = lots >= MIN_DISTINCT_LOTS;
        if attempts > 0 {
            info!(
                silo_id = %intervals.silo_id,
                initial_sigma_m = sigma_m,
                used_sigma_m,
                attempts,
                converged,
                "σ 自动放大完成"
            );
        }

        Ok(SigmaAdjustment {
            discharged,
            sigma_m: used_sigma_m,
            attempts,
            lots_represented: lots,
            converged,
        })
    }
}
