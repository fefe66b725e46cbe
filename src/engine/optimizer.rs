// ==========================================
// 筒仓出料仿真系统 - 出料比例优化器
// ==========================================
// 目标: 每仓出料比例 ∈ [0.2, 0.8], 使全局配比逼近目标值
// 目标函数: Σ ((actual - target) / range)²
// 搜索: 探索阶段(约 60%, 分层扫描 + 打乱) → 开发阶段(局部扰动, 步长退火)
// 红线: 单一随机序列按固定顺序消费, 同一 seed 结果可复现
// ==========================================

use crate::domain::discharge::DischargeRequest;
use crate::domain::inputs::BlendInputs;
use crate::domain::types::{BlendedParams, ObjectiveMethod, SearchPhase};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::orchestrator::{MultiSiloOrchestrator, SimulationParams};
use crate::perf::PerfGuard;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// 出料比例下限
pub const FRACTION_MIN: f64 = 0.2;

/// 出料比例上限
pub const FRACTION_MAX: f64 = 0.8;

/// 探索阶段占迭代预算的比例
pub const EXPLORE_SHARE: f64 = 0.6;

/// 开发阶段起始步长 / 最小步长
pub const EXPLOIT_STEP_START: f64 = 0.12;
pub const EXPLOIT_STEP_FLOOR: f64 = 0.01;

/// 探索无有限解时的默认比例
pub const DEFAULT_FRACTION: f64 = 0.5;

/// 返回的最优候选数量
pub const TOP_CANDIDATES: usize = 5;

// ==========================================
// OptimizeRequest - 优化请求
// ==========================================
#[derive(Debug, Clone)]
pub struct OptimizeRequest {
    pub targets: BTreeMap<String, f64>,      // 目标参数值
    pub param_ranges: BTreeMap<String, f64>, // 归一化量程（缺省或 <= 0 时取 1.0）
    pub iterations: usize,
    pub seed: u64,
}

/// 单仓出料方案（比例 + 解析后的出料质量）
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SiloDischarge {
    pub fraction: f64,
    pub mass_kg: f64,
}

/// 候选方案记录
#[derive(Debug, Clone, Serialize)]
pub struct CandidateRecord {
    pub iteration: usize,
    pub phase: SearchPhase,
    pub fractions: BTreeMap<String, f64>,
    pub discharge: BTreeMap<String, SiloDischarge>, // silo_id → 出料方案
    pub score: f64,
    pub blended_params: BlendedParams,
    pub total_discharged_mass_kg: f64,
}

/// 优化结果
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationResult {
    pub objective_method: ObjectiveMethod,
    pub best_fractions: BTreeMap<String, f64>,
    pub recommended_discharge: BTreeMap<String, SiloDischarge>,
    pub best_score: f64,
    pub best_blended_params: BlendedParams,
    pub best_total_discharged_mass_kg: f64,
    pub top_candidates: Vec<CandidateRecord>,
    pub candidates: Vec<CandidateRecord>,
    pub best_score_trace: Vec<f64>, // 每次评估后的历史最优分
    pub explore_iterations: usize,
    pub exploit_iterations: usize,
    pub warnings: Vec<String>,
}

/// 归一化量程（<= 0 或未配置时取 1.0）
fn param_range(ranges: &BTreeMap<String, f64>, param: &str) -> f64 {
    match ranges.get(param) {
        Some(&r) if r > 0.0 => r,
        _ => 1.0,
    }
}

/// 目标函数: Σ ((actual - target) / range)²
///
/// 无目标参数时为 +∞; 结果非有限（如配比为 NaN）时同样视为 +∞
pub fn objective_score(
    blend: &BlendedParams,
    targets: &BTreeMap<String, f64>,
    ranges: &BTreeMap<String, f64>,
) -> f64 {
    if targets.is_empty() {
        return f64::INFINITY;
    }
    let score: f64 = targets
        .iter()
        .map(|(param, &target)| {
            let actual = blend.get(param).copied().unwrap_or(f64::NAN);
            ((actual - target) / param_range(ranges, param)).powi(2)
        })
        .sum();
    if score.is_finite() {
        score
    } else {
        f64::INFINITY
    }
}

/// 探索阶段第 i 个分层区间
fn explore_band(i: usize, n: usize) -> (f64, f64) {
    let width = FRACTION_MAX - FRACTION_MIN;
    let lo = FRACTION_MIN + i as f64 * width / n as f64;
    let hi = FRACTION_MIN + (i + 1) as f64 * width / n as f64;
    (lo, hi)
}

/// 开发阶段第 i 步的扰动步长
fn exploit_step(i: usize, n: usize) -> f64 {
    EXPLOIT_STEP_START * (1.0 - i as f64 / n as f64) + EXPLOIT_STEP_FLOOR
}

// ==========================================
// DischargeOptimizer - 出料比例优化器
// ==========================================
pub struct DischargeOptimizer {
    orchestrator: MultiSiloOrchestrator,
}

impl DischargeOptimizer {
    pub fn new(params: SimulationParams) -> EngineResult<Self> {
        Ok(Self {
            orchestrator: MultiSiloOrchestrator::new(params)?,
        })
    }

    /// 评估一个候选比例向量（完整执行多仓编排）
    fn evaluate(
        &self,
        inputs: &BlendInputs,
        silo_ids: &[String],
        fractions: &[f64],
        req: &OptimizeRequest,
        iteration: usize,
        phase: SearchPhase,
    ) -> EngineResult<CandidateRecord> {
        let discharge = silo_ids
            .iter()
            .zip(fractions)
            .map(|(id, &f)| DischargeRequest::fraction(id, f))
            .collect();
        let result = self.orchestrator.run(&inputs.with_discharge(discharge))?;
        let score = objective_score(&result.total_blended_params, &req.targets, &req.param_ranges);
        // per_silo 与 silo_ids 同序（均按 silos 表顺序）
        let discharge = result
            .per_silo
            .iter()
            .zip(fractions)
            .map(|(silo, &fraction)| {
                let plan = SiloDischarge {
                    fraction,
                    mass_kg: silo.discharged_mass_kg,
                };
                (silo.silo_id.clone(), plan)
            })
            .collect();

        Ok(CandidateRecord {
            iteration,
            phase,
            fractions: silo_ids.iter().cloned().zip(fractions.iter().copied()).collect(),
            discharge,
            score,
            blended_params: result.total_blended_params,
            total_discharged_mass_kg: result.total_discharged_mass_kg,
        })
    }

    /// 搜索最优出料比例
    ///
    /// # 参数
    /// - `inputs`: 基础输入表（出料请求表被忽略, 由候选比例生成）
    /// - `req`: 目标参数 / 量程 / 迭代预算 / 随机种子
    ///
    /// # 返回
    /// 最优方案（含各仓推荐出料） + 前 5 名候选 + 全部候选记录
    #[instrument(skip(self, inputs, req), fields(
        targets = req.targets.len(),
        iterations = req.iterations,
        seed = req.seed
    ))]
    pub fn optimize(
        &self,
        inputs: &BlendInputs,
        req: &OptimizeRequest,
    ) -> EngineResult<OptimizationResult> {
        let _perf = PerfGuard::new("optimize_discharge_fractions");

        // 1. 前置校验（不消耗搜索预算）
        if req.targets.is_empty() {
            return Err(EngineError::InvalidParameter(
                "at least one target parameter is required".to_string(),
            ));
        }
        if req.iterations == 0 {
            return Err(EngineError::InvalidParameter(
                "iterations must be > 0".to_string(),
            ));
        }
        for (param, value) in &req.targets {
            if !inputs.suppliers.param_names.contains(param) {
                return Err(EngineError::InputShape(format!(
                    "target parameter '{}' is not a supplier parameter column",
                    param
                )));
            }
            if !value.is_finite() {
                return Err(EngineError::InvalidParameter(format!(
                    "target value for '{}' must be finite",
                    param
                )));
            }
        }
        let warnings = self.orchestrator.validate_base_tables(inputs)?;

        let silo_ids: Vec<String> = inputs.silos.iter().map(|s| s.silo_id.clone()).collect();
        let explore_count = ((req.iterations as f64) * EXPLORE_SHARE).round() as usize;
        let exploit_count = req.iterations - explore_count;
        let mut rng = StdRng::seed_from_u64(req.seed);

        let mut candidates: Vec<CandidateRecord> = Vec::with_capacity(req.iterations);
        let mut best_idx: Option<usize> = None;
        let mut best_score = f64::INFINITY;
        let mut best_score_trace = Vec::with_capacity(req.iterations);

        // 2. 探索阶段：分层扫描 + 打乱分配顺序
        info!(explore_count, exploit_count, silos = silo_ids.len(), "开始探索阶段");
        for i in 0..explore_count {
            let (lo, hi) = explore_band(i, explore_count);
            let mut fractions: Vec<f64> = (0..silo_ids.len())
                .map(|_| lo + rng.gen::<f64>() * (hi - lo))
                .collect();
            fractions.shuffle(&mut rng);

            let record =
                self.evaluate(inputs, &silo_ids, &fractions, req, i, SearchPhase::Explore)?;
            if record.score < best_score {
                best_score = record.score;
                best_idx = Some(candidates.len());
            }
            candidates.push(record);
            best_score_trace.push(best_score);
        }

        // 3. 开发阶段：围绕当前最优做局部扰动, 步长线性退火
        let mut center: Vec<f64> = match best_idx {
            Some(idx) => silo_ids
                .iter()
                .map(|id| candidates[idx].fractions[id])
                .collect(),
            None => vec![DEFAULT_FRACTION; silo_ids.len()],
        };
        info!(best_score, "探索阶段完成, 开始开发阶段");

        for i in 0..exploit_count {
            let step = exploit_step(i, exploit_count);
            let fractions: Vec<f64> = center
                .iter()
                .map(|&c| {
                    let delta = (rng.gen::<f64>() * 2.0 - 1.0) * step;
                    (c + delta).clamp(FRACTION_MIN, FRACTION_MAX)
                })
                .collect();

            let record = self.evaluate(
                inputs,
                &silo_ids,
                &fractions,
                req,
                explore_count + i,
                SearchPhase::Exploit,
            )?;
            if record.score < best_score {
                best_score = record.score;
                best_idx = Some(candidates.len());
                center = fractions;
                debug!(iteration = explore_count + i, best_score, step, "开发阶段改进");
            }
            candidates.push(record);
            best_score_trace.push(best_score);
        }

        // 4. 汇总：最优 + 前 5（稳定排序, 同分保持先后）
        let best = candidates[best_idx.unwrap_or(0)].clone();
        let mut ranked: Vec<&CandidateRecord> = candidates.iter().collect();
        ranked.sort_by(|a, b| a.score.total_cmp(&b.score));
        let top_candidates = ranked.into_iter().take(TOP_CANDIDATES).cloned().collect();

        info!(
            best_score = best.score,
            evaluated = candidates.len(),
            "出料比例优化完成"
        );

        Ok(OptimizationResult {
            objective_method: ObjectiveMethod::NormalizedWeightedL2HybridSearch,
            best_fractions: best.fractions,
            recommended_discharge: best.discharge,
            best_score: best.score,
            best_blended_params: best.blended_params,
            best_total_discharged_mass_kg: best.total_discharged_mass_kg,
            top_candidates,
            candidates,
            best_score_trace,
            explore_iterations: explore_count,
            exploit_iterations: exploit_count,
            warnings,
        })
    }
}
