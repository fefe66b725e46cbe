// ==========================================
// 筒仓出料仿真系统 - 引擎输入表
// ==========================================
// 四张语义表: 筒仓几何 / 分层装料 / 供应商规格 / 出料请求
// ==========================================

use crate::domain::discharge::DischargeRequest;
use crate::domain::layer::LayerRecord;
use crate::domain::silo::Silo;
use crate::domain::supplier::SupplierTable;

#[derive(Debug, Clone, Default)]
pub struct BlendInputs {
    pub silos: Vec<Silo>,
    pub layers: Vec<LayerRecord>,
    pub suppliers: SupplierTable,
    pub discharge: Vec<DischargeRequest>,
}

impl BlendInputs {
    /// 替换出料请求（优化器每个候选方案使用）
    pub fn with_discharge(&self, discharge: Vec<DischargeRequest>) -> Self {
        Self {
            silos: self.silos.clone(),
            layers: self.layers.clone(),
            suppliers: self.suppliers.clone(),
            discharge,
        }
    }

    /// 某仓装料总质量
    pub fn total_fill_mass_kg(&self, silo_id: &str) -> f64 {
        self.layers
            .iter()
            .filter(|l| l.silo_id == silo_id)
            .map(|l| l.segment_mass_kg)
            .sum()
    }
}
