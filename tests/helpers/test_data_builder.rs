// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use silo_blend::domain::{
    BlendInputs, DischargeRequest, LayerRecord, Material, Silo, SupplierSpec, SupplierTable,
};
use silo_blend::engine::SimulationParams;

/// 麦芽质量参数列（与示例数据一致）
pub const MALT_PARAMS: [&str; 6] = [
    "moisture_pct",
    "fine_extract_db_pct",
    "wort_pH",
    "diastatic_power_WK",
    "total_protein_pct",
    "wort_colour_EBC",
];

// ==========================================
// BlendInputs 构建器
// ==========================================

#[derive(Default)]
pub struct InputsBuilder {
    silos: Vec<Silo>,
    layers: Vec<LayerRecord>,
    specs: Vec<SupplierSpec>,
    discharge: Vec<DischargeRequest>,
}

impl InputsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn silo(mut self, silo_id: &str, capacity_kg: f64, body_d: f64, outlet_d: f64) -> Self {
        self.silos.push(Silo::new(silo_id, capacity_kg, body_d, outlet_d));
        self
    }

    /// 追加一层（层序号按该仓已有层数自动递增）
    pub fn layer(mut self, silo_id: &str, lot_id: &str, supplier: &str, mass_kg: f64) -> Self {
        let index = self.layers.iter().filter(|l| l.silo_id == silo_id).count() as u32 + 1;
        self.layers
            .push(LayerRecord::new(silo_id, index, lot_id, supplier, mass_kg));
        self
    }

    /// 供应商规格（按 MALT_PARAMS 顺序给值）
    pub fn supplier(mut self, supplier: &str, values: [f64; 6]) -> Self {
        let spec = MALT_PARAMS
            .iter()
            .zip(values)
            .fold(SupplierSpec::new(supplier), |spec, (name, v)| spec.with_param(name, v));
        self.specs.push(spec);
        self
    }

    pub fn discharge_mass(mut self, silo_id: &str, mass_kg: f64) -> Self {
        self.discharge.push(DischargeRequest::mass(silo_id, mass_kg));
        self
    }

    pub fn discharge_fraction(mut self, silo_id: &str, fraction: f64) -> Self {
        self.discharge
            .push(DischargeRequest::fraction(silo_id, fraction));
        self
    }

    pub fn build(self) -> BlendInputs {
        let mut suppliers =
            SupplierTable::new(MALT_PARAMS.iter().map(|p| p.to_string()).collect());
        for spec in self.specs {
            suppliers.insert(spec);
        }
        BlendInputs {
            silos: self.silos,
            layers: self.layers,
            suppliers,
            discharge: self.discharge,
        }
    }
}

/// 三仓示例场景（S1 1600 kg / S2 50% / S3 800 kg）
pub fn sample_inputs() -> BlendInputs {
    InputsBuilder::new()
        .silo("S1", 4000.0, 3.0, 0.20)
        .silo("S2", 4000.0, 3.2, 0.20)
        .silo("S3", 4000.0, 3.1, 0.21)
        .layer("S1", "L1001", "BBM", 1200.0)
        .layer("S1", "L1002", "COFCO", 900.0)
        .layer("S1", "L1003", "Malteurop", 700.0)
        .layer("S2", "L1001", "BBM", 1400.0)
        .layer("S2", "L1003", "Malteurop", 1000.0)
        .layer("S2", "L1002", "COFCO", 600.0)
        .layer("S3", "L1002", "COFCO", 700.0)
        .layer("S3", "L1003", "Malteurop", 700.0)
        .supplier("BBM", [4.2, 82.0, 5.98, 342.1, 10.12, 3.8])
        .supplier("COFCO", [4.4, 81.8, 5.93, 317.4, 11.1, 4.0])
        .supplier("Malteurop", [4.3, 81.2, 5.97, 336.9, 10.5, 3.8])
        .discharge_mass("S1", 1600.0)
        .discharge_fraction("S2", 0.5)
        .discharge_mass("S3", 800.0)
        .build()
}

/// 默认物料 + 较少步数（测试提速）
pub fn fast_params(auto_adjust: bool) -> SimulationParams {
    let mut params = SimulationParams::new(Material::new(610.0, 0.004), 0.12, 400);
    params.auto_adjust = auto_adjust;
    params
}
