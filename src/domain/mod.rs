// ==========================================
// 筒仓出料仿真系统 - 领域模型层
// ==========================================
// 职责: 定义筒仓、装料分层、供应商规格、出料请求与结果
// 红线: 不含引擎逻辑, 不含文件读写
// ==========================================

pub mod discharge;
pub mod inputs;
pub mod layer;
pub mod result;
pub mod silo;
pub mod supplier;
pub mod types;

// 重导出核心类型
pub use discharge::{DischargeAmount, DischargeRequest};
pub use inputs::BlendInputs;
pub use layer::{LayerInterval, LayerRecord, SiloIntervals};
pub use result::{
    LotContribution, LotLedgerRow, MultiSiloResult, SegmentContribution, SegmentLedgerRow,
    SiloLedgerRow, SiloResult, SupplierMass,
};
pub use silo::{BeverlooParams, Material, Silo};
pub use supplier::{SupplierSpec, SupplierTable};
pub use types::{BlendedParams, ObjectiveMethod, SearchPhase};
