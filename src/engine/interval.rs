// ==========================================
// 筒仓出料仿真系统 - 分层高度区间构建
// ==========================================
// 输入: 某仓的分层装料记录 + 筒仓几何 + 物料密度
// 输出: 自底向上的 [z0, z1] 区间 + 料柱总高
// 红线: layer_index 必须为连续 1..N; 负质量 / 非有限质量为致命错误
// ==========================================

use crate::domain::layer::{LayerInterval, LayerRecord, SiloIntervals};
use crate::domain::silo::{Material, Silo};
use crate::engine::error::{EngineError, EngineResult};
use tracing::{instrument, warn};

/// 超容判定容差 (kg)
const CAPACITY_TOLERANCE_KG: f64 = 1e-9;

// ==========================================
// IntervalBuilder - 区间构建器
// ==========================================
pub struct IntervalBuilder {
    // 无状态
}

impl IntervalBuilder {
    pub fn new() -> Self {
        Self {}
    }

    /// 构建单仓高度区间
    ///
    /// # 参数
    /// - `silo`: 筒仓几何
    /// - `layers`: 全部装料记录（内部按 silo_id 过滤）
    /// - `material`: 物料物性
    ///
    /// # 返回
    /// - Ok(SiloIntervals): 区间、总高、总质量、超容告警（非致命）
    /// - Err(InputShape): 无分层 / 分层不连续
    /// - Err(RangeViolation): 负数或非有限的分段质量
    #[instrument(skip(self, layers, material), fields(silo_id = %silo.silo_id))]
    pub fn build(
        &self,
        silo: &Silo,
        layers: &[LayerRecord],
        material: &Material,
    ) -> EngineResult<(SiloIntervals, Option<String>)> {
        let mut rows: Vec<&LayerRecord> = layers
            .iter()
            .filter(|l| l.silo_id == silo.silo_id)
            .collect();
        if rows.is_empty() {
            return Err(EngineError::InputShape(format!(
                "No layers found for silo_id={}",
                silo.silo_id
            )));
        }

        // 稳定排序（同序号保持输入顺序, 交由连续性检查报错）
        rows.sort_by_key(|l| l.layer_index);

        let contiguous = rows
            .iter()
            .enumerate()
            .all(|(i, l)| l.layer_index as usize == i + 1);
        if !contiguous {
            let actual: Vec<u32> = rows.iter().map(|l| l.layer_index).collect();
            return Err(EngineError::InputShape(format!(
                "layer_index for silo {} must be contiguous bottom->top 1..N. Got {:?}",
                silo.silo_id, actual
            )));
        }

        // 质量必须为有限非负数（NaN 会让后续前沿仿真静默失效）
        if let Some(layer) = rows
            .iter()
            .find(|l| !(l.segment_mass_kg.is_finite() && l.segment_mass_kg >= 0.0))
        {
            let kind = if layer.segment_mass_kg.is_finite() {
                "negative"
            } else {
                "non-finite"
            };
            return Err(EngineError::RangeViolation(format!(
                "Silo {}: {} segment_mass_kg found (layer {}).",
                silo.silo_id, kind, layer.layer_index
            )));
        }

        let total_mass_kg: f64 = rows.iter().map(|l| l.segment_mass_kg).sum();
        let mut capacity_warning = None;
        if total_mass_kg > silo.capacity_kg + CAPACITY_TOLERANCE_KG {
            let msg = format!(
                "Silo {}: segment mass sum ({:.2}) exceeds capacity ({:.2}).",
                silo.silo_id, total_mass_kg, silo.capacity_kg
            );
            warn!(silo_id = %silo.silo_id, total_mass_kg, capacity_kg = silo.capacity_kg, "装料超过额定容量");
            capacity_warning = Some(msg);
        }

        let area = silo.cross_section_area_m2();
        let mut z_cursor = 0.0;
        let mut intervals = Vec::with_capacity(rows.len());
        for layer in rows {
            let h_m = layer.segment_mass_kg / (material.rho_bulk_kg_m3 * area);
            let z0_m = z_cursor;
            z_cursor += h_m;
            intervals.push(LayerInterval {
                layer: layer.clone(),
                z0_m,
                z1_m: z_cursor,
            });
        }

        Ok((
            SiloIntervals {
                silo_id: silo.silo_id.clone(),
                intervals,
                total_height_m: z_cursor,
                total_mass_kg,
            },
            capacity_warning,
        ))
    }
}

impl Default for IntervalBuilder {
    fn default() -> Self {
        Self::new()
    }
}
