// ==========================================
// 筒仓出料仿真系统 - 多仓编排器
// ==========================================
// 用途: 逐仓执行 区间构建 → 出料解析 → Beverloo → 前沿仿真(σ放大) → 配比
// 输出: 单仓结果 + 全局配比 + 分段/批次/筒仓台账
// 红线: 各仓之间无共享可变状态
// ==========================================

use crate::domain::discharge::{DischargeAmount, DischargeRequest};
use crate::domain::inputs::BlendInputs;
use crate::domain::result::{
    LotContribution, LotLedgerRow, MultiSiloResult, SegmentContribution, SegmentLedgerRow,
    SiloLedgerRow, SiloResult,
};
use crate::domain::silo::{BeverlooParams, Material};
use crate::engine::beverloo::beverloo_mass_flow_rate_kg_s;
use crate::engine::blend::BlendAggregator;
use crate::engine::discharge_front::{DischargeFrontSimulator, DischargeKinematics};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::interval::IntervalBuilder;
use crate::engine::sigma_adjuster::{SigmaAdjuster, DEFAULT_MIN_NONZERO_MASS_KG};
use crate::perf::PerfGuard;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, info, instrument, warn};

/// 约定的筒仓数量（不一致时仅告警）
pub const EXPECTED_SILO_COUNT: usize = 3;

/// 出料质量超出存量的容差 (kg)
const DISCHARGE_TOLERANCE_KG: f64 = 1e-9;

// ==========================================
// SimulationParams - 仿真参数集
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParams {
    pub material: Material,
    pub beverloo: BeverlooParams,
    pub sigma_m: f64,
    pub steps: usize,
    pub auto_adjust: bool,
    pub min_nonzero_mass_kg: f64,
}

impl SimulationParams {
    pub fn new(material: Material, sigma_m: f64, steps: usize) -> Self {
        Self {
            material,
            beverloo: BeverlooParams::default(),
            sigma_m,
            steps,
            auto_adjust: false,
            min_nonzero_mass_kg: DEFAULT_MIN_NONZERO_MASS_KG,
        }
    }

    pub fn validate(&self) -> EngineResult<()> {
        if !(self.sigma_m > 0.0) {
            return Err(EngineError::InvalidParameter("sigma_m must be > 0".to_string()));
        }
        if self.steps == 0 {
            return Err(EngineError::InvalidParameter("steps must be > 0".to_string()));
        }
        if !(self.min_nonzero_mass_kg >= 0.0) {
            return Err(EngineError::InvalidParameter(
                "min_nonzero_mass_kg must be >= 0".to_string(),
            ));
        }
        self.material.validate()?;
        self.beverloo.validate()
    }
}

/// 解析单仓出料质量
///
/// # 参数
/// - `silo_id`: 筒仓
/// - `requests`: 出料请求表（取该仓的请求）
/// - `total_mass_kg`: 该仓装料总质量
///
/// # 返回
/// - Ok(kg)
/// - Err(InputShape): 该仓无出料请求
/// - Err(RangeViolation): 比例不在 [0,1] / 负质量 / 超过存量
pub fn resolve_discharge_mass_kg(
    silo_id: &str,
    requests: &[DischargeRequest],
    total_mass_kg: f64,
) -> EngineResult<f64> {
    let request = requests
        .iter()
        .find(|r| r.silo_id == silo_id)
        .ok_or_else(|| {
            EngineError::InputShape(format!("No discharge row found for silo_id={}", silo_id))
        })?;

    let m_kg = match request.amount {
        DischargeAmount::Mass(kg) => kg,
        DischargeAmount::Fraction(frac) => {
            if !(0.0..=1.0).contains(&frac) {
                return Err(EngineError::RangeViolation(format!(
                    "Silo {}: discharge_fraction must be between 0 and 1. Got {:.6}.",
                    silo_id, frac
                )));
            }
            frac * total_mass_kg
        }
    };

    if !(m_kg >= 0.0) {
        return Err(EngineError::RangeViolation(format!(
            "Silo {}: discharge mass cannot be negative.",
            silo_id
        )));
    }
    if m_kg > total_mass_kg + DISCHARGE_TOLERANCE_KG {
        return Err(EngineError::RangeViolation(format!(
            "Silo {}: discharge_mass_kg ({:.2}) exceeds total mass in silo ({:.2}).",
            silo_id, m_kg, total_mass_kg
        )));
    }
    Ok(m_kg)
}

/// 分段贡献按 (lot_id, supplier) 汇总, 按 lot_id 排序
pub fn aggregate_lot_contributions(segments: &[SegmentContribution]) -> Vec<LotContribution> {
    let mut by_lot: BTreeMap<(&str, &str, &str), f64> = BTreeMap::new();
    for s in segments {
        *by_lot
            .entry((s.silo_id.as_str(), s.lot_id.as_str(), s.supplier.as_str()))
            .or_insert(0.0) += s.discharged_mass_kg;
    }
    by_lot
        .into_iter()
        .map(|((silo_id, lot_id, supplier), m)| LotContribution {
            silo_id: silo_id.to_string(),
            lot_id: lot_id.to_string(),
            supplier: supplier.to_string(),
            discharged_mass_kg: m,
        })
        .collect()
}

// ==========================================
// MultiSiloOrchestrator - 多仓编排器
// ==========================================
pub struct MultiSiloOrchestrator {
    params: SimulationParams,
    interval_builder: IntervalBuilder,
    simulator: DischargeFrontSimulator,
}

impl MultiSiloOrchestrator {
    /// 创建编排器
    ///
    /// # 参数
    /// - params: 仿真参数（创建时即校验）
    pub fn new(params: SimulationParams) -> EngineResult<Self> {
        params.validate()?;
        Ok(Self {
            params,
            interval_builder: IntervalBuilder::new(),
            simulator: DischargeFrontSimulator::new(),
        })
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// 表级校验：筒仓主键唯一 + 几何有效, 供应商存在且参数有限, 筒仓数量
    ///
    /// # 返回
    /// 非致命告警列表
    fn check_tables(&self, inputs: &BlendInputs) -> EngineResult<Vec<String>> {
        let mut warnings = Vec::new();

        if inputs.silos.is_empty() {
            return Err(EngineError::InputShape("no silos supplied".to_string()));
        }
        let mut seen = HashSet::new();
        for silo in &inputs.silos {
            if !seen.insert(silo.silo_id.as_str()) {
                return Err(EngineError::InputShape(format!(
                    "duplicate silo_id: {}",
                    silo.silo_id
                )));
            }
            silo.validate()?;
        }

        let missing: BTreeSet<&str> = inputs
            .layers
            .iter()
            .map(|l| l.supplier.as_str())
            .filter(|s| !inputs.suppliers.contains(s))
            .collect();
        if !missing.is_empty() {
            return Err(EngineError::MissingSpec(format!(
                "Suppliers in layers not found in supplier table: {:?}",
                missing
            )));
        }

        let non_finite: BTreeSet<String> = inputs
            .suppliers
            .specs()
            .flat_map(|spec| {
                spec.params
                    .iter()
                    .filter(|(_, v)| !v.is_finite())
                    .map(move |(name, _)| format!("{}.{}", spec.supplier, name))
            })
            .collect();
        if !non_finite.is_empty() {
            return Err(EngineError::RangeViolation(format!(
                "Supplier parameters must be finite: {:?}",
                non_finite
            )));
        }

        if inputs.silos.len() != EXPECTED_SILO_COUNT {
            warn!(silo_count = inputs.silos.len(), "筒仓数量与约定不一致");
            warnings.push(format!(
                "Expected {} silos; got {}. Running on provided silos.",
                EXPECTED_SILO_COUNT,
                inputs.silos.len()
            ));
        }
        Ok(warnings)
    }

    /// 校验基础输入表（不含出料请求）
    ///
    /// 供优化器在消耗搜索预算前调用：除表级校验外, 还会构建各仓区间并计算 Beverloo 流量
    ///
    /// # 返回
    /// 非致命告警列表（筒仓数量、超容）
    pub fn validate_base_tables(&self, inputs: &BlendInputs) -> EngineResult<Vec<String>> {
        let mut warnings = self.check_tables(inputs)?;
        for silo in &inputs.silos {
            let (_, capacity_warning) =
                self.interval_builder
                    .build(silo, &inputs.layers, &self.params.material)?;
            warnings.extend(capacity_warning);
            beverloo_mass_flow_rate_kg_s(silo, &self.params.material, &self.params.beverloo)?;
        }
        Ok(warnings)
    }

    /// 执行多仓出料仿真
    ///
    /// # 参数
    /// - inputs: 四张输入表
    ///
    /// # 返回
    /// 多仓汇总结果（含台账与告警）
    #[instrument(skip(self, inputs), fields(
        silo_count = inputs.silos.len(),
        layer_count = inputs.layers.len(),
        sigma_m = self.params.sigma_m,
        steps = self.params.steps
    ))]
    pub fn run(&self, inputs: &BlendInputs) -> EngineResult<MultiSiloResult> {
        let _perf = PerfGuard::new("run_multi_silo_blend");

        // 1. 基础校验
        let mut warnings = self.check_tables(inputs)?;
        let mut discharge_seen = HashSet::new();
        for r in &inputs.discharge {
            if !discharge_seen.insert(r.silo_id.as_str()) {
                return Err(EngineError::InputShape(format!(
                    "duplicate discharge row for silo_id={}",
                    r.silo_id
                )));
            }
        }

        // 2. 逐仓仿真
        let adjuster = SigmaAdjuster::new(self.params.min_nonzero_mass_kg)?;
        let aggregator = BlendAggregator::new(&inputs.suppliers);
        let mut per_silo = Vec::with_capacity(inputs.silos.len());

        for silo in &inputs.silos {
            let (intervals, capacity_warning) =
                self.interval_builder
                    .build(silo, &inputs.layers, &self.params.material)?;
            warnings.extend(capacity_warning);

            let discharge_mass_kg = resolve_discharge_mass_kg(
                &silo.silo_id,
                &inputs.discharge,
                intervals.total_mass_kg,
            )?;
            let m_dot =
                beverloo_mass_flow_rate_kg_s(silo, &self.params.material, &self.params.beverloo)?;
            let kin = DischargeKinematics {
                discharge_mass_kg,
                mass_flow_rate_kg_s: m_dot,
                rho_bulk_kg_m3: self.params.material.rho_bulk_kg_m3,
                area_m2: silo.cross_section_area_m2(),
            };

            let adjustment = adjuster.simulate(
                &intervals,
                &kin,
                self.params.sigma_m,
                self.params.steps,
                self.params.auto_adjust,
            )?;

            let segment_contributions = self
                .simulator
                .to_segment_contributions(&intervals, &adjustment.discharged);
            let lot_contributions = aggregate_lot_contributions(&segment_contributions);
            let blended_params = aggregator.blend(&lot_contributions)?;

            debug!(
                silo_id = %silo.silo_id,
                discharge_mass_kg,
                mass_flow_rate_kg_s = m_dot,
                sigma_m = adjustment.sigma_m,
                lots = lot_contributions.len(),
                "单仓仿真完成"
            );

            per_silo.push(SiloResult {
                silo_id: silo.silo_id.clone(),
                discharged_mass_kg: discharge_mass_kg,
                mass_flow_rate_kg_s: m_dot,
                discharge_time_s: kin.discharge_time_s(),
                sigma_m: adjustment.sigma_m,
                sigma_attempts: adjustment.attempts,
                blended_params,
                segment_contributions,
                lot_contributions,
            });
        }

        // 3. 合并 + 全局配比
        let segment_contributions: Vec<SegmentContribution> = per_silo
            .iter()
            .flat_map(|r| r.segment_contributions.iter().cloned())
            .collect();
        let lot_contributions: Vec<LotContribution> = per_silo
            .iter()
            .flat_map(|r| r.lot_contributions.iter().cloned())
            .collect();
        let total_blended_params = aggregator.blend(&lot_contributions)?;
        let total_discharged_mass_kg: f64 = per_silo.iter().map(|r| r.discharged_mass_kg).sum();

        // 4. 台账
        let segment_ledger = build_segment_ledger(&segment_contributions);
        let lot_ledger = build_lot_ledger(&segment_ledger);
        let silo_ledger = build_silo_ledger(&segment_ledger);
        let total_remaining_mass_kg: f64 = silo_ledger.iter().map(|r| r.remaining_mass_kg).sum();

        info!(
            total_discharged_mass_kg,
            total_remaining_mass_kg,
            warnings = warnings.len(),
            "多仓出料仿真完成"
        );

        Ok(MultiSiloResult {
            per_silo,
            segment_contributions,
            lot_contributions,
            segment_ledger,
            lot_ledger,
            silo_ledger,
            total_discharged_mass_kg,
            total_remaining_mass_kg,
            total_blended_params,
            warnings,
        })
    }
}

// ==========================================
// 台账构建
// ==========================================

fn build_segment_ledger(segments: &[SegmentContribution]) -> Vec<SegmentLedgerRow> {
    segments
        .iter()
        .map(|s| SegmentLedgerRow {
            silo_id: s.silo_id.clone(),
            layer_index: s.layer_index,
            lot_id: s.lot_id.clone(),
            supplier: s.supplier.clone(),
            segment_mass_kg: s.segment_mass_kg,
            discharged_mass_kg: s.discharged_mass_kg,
            remaining_mass_kg: (s.segment_mass_kg - s.discharged_mass_kg).max(0.0),
        })
        .collect()
}

fn build_lot_ledger(segment_ledger: &[SegmentLedgerRow]) -> Vec<LotLedgerRow> {
    let mut by_lot: BTreeMap<(&str, &str, &str), (f64, f64, f64)> = BTreeMap::new();
    for row in segment_ledger {
        let acc = by_lot
            .entry((row.silo_id.as_str(), row.lot_id.as_str(), row.supplier.as_str()))
            .or_insert((0.0, 0.0, 0.0));
        acc.0 += row.segment_mass_kg;
        acc.1 += row.discharged_mass_kg;
        acc.2 += row.remaining_mass_kg;
    }
    by_lot
        .into_iter()
        .map(
            |((silo_id, lot_id, supplier), (initial, discharged, remaining))| LotLedgerRow {
                silo_id: silo_id.to_string(),
                lot_id: lot_id.to_string(),
                supplier: supplier.to_string(),
                initial_mass_kg: initial,
                discharged_mass_kg: discharged,
                remaining_mass_kg: remaining,
            },
        )
        .collect()
}

fn build_silo_ledger(segment_ledger: &[SegmentLedgerRow]) -> Vec<SiloLedgerRow> {
    let mut by_silo: BTreeMap<&str, (f64, f64, f64)> = BTreeMap::new();
    for row in segment_ledger {
        let acc = by_silo
            .entry(row.silo_id.as_str())
            .or_insert((0.0, 0.0, 0.0));
        acc.0 += row.segment_mass_kg;
        acc.1 += row.discharged_mass_kg;
        acc.2 += row.remaining_mass_kg;
    }
    by_silo
        .into_iter()
        .map(|(silo_id, (initial, discharged, remaining))| SiloLedgerRow {
            silo_id: silo_id.to_string(),
            initial_mass_kg: initial,
            discharged_mass_kg: discharged,
            remaining_mass_kg: remaining,
            remaining_pct: if initial > 0.0 {
                100.0 * remaining / initial
            } else {
                f64::NAN
            },
        })
        .collect()
}
