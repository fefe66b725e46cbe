// ==========================================
// 筒仓出料仿真系统 - 分层装料领域模型
// ==========================================
// 职责: 装料分层记录 + 高度区间
// 红线: layer_index 每仓自底向上连续 1..N
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// LayerRecord - 分层装料记录（输入）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerRecord {
    pub silo_id: String,
    pub layer_index: u32, // 自底向上, 从 1 开始
    pub lot_id: String,
    pub supplier: String,
    pub segment_mass_kg: f64,
}

impl LayerRecord {
    pub fn new(
        silo_id: &str,
        layer_index: u32,
        lot_id: &str,
        supplier: &str,
        segment_mass_kg: f64,
    ) -> Self {
        Self {
            silo_id: silo_id.to_string(),
            layer_index,
            lot_id: lot_id.to_string(),
            supplier: supplier.to_string(),
            segment_mass_kg,
        }
    }
}

// ==========================================
// LayerInterval - 分层高度区间
// ==========================================
// 由 IntervalBuilder 一次性生成, 之后不再修改
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerInterval {
    pub layer: LayerRecord,
    pub z0_m: f64, // 区间底部高度
    pub z1_m: f64, // 区间顶部高度
}

/// 单仓区间集合
#[derive(Debug, Clone)]
pub struct SiloIntervals {
    pub silo_id: String,
    pub intervals: Vec<LayerInterval>,
    pub total_height_m: f64,
    pub total_mass_kg: f64,
}

impl SiloIntervals {
    /// 区间底部高度数组（供仿真热循环使用）
    pub fn z0(&self) -> Vec<f64> {
        self.intervals.iter().map(|i| i.z0_m).collect()
    }

    /// 区间顶部高度数组
    pub fn z1(&self) -> Vec<f64> {
        self.intervals.iter().map(|i| i.z1_m).collect()
    }
}
