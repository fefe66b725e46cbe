// ==========================================
// 筒仓出料仿真系统 - 引擎层
// ==========================================
// 职责: 出料前沿仿真 + 配比聚合 + 出料比例优化
// 红线: 引擎不读写文件, 所有错误显式返回 EngineError
// ==========================================

pub mod beverloo;
pub mod blend;
pub mod discharge_front;
pub mod error;
pub mod interval;
pub mod optimizer;
pub mod orchestrator;
pub mod sigma_adjuster;

// 重导出核心引擎
pub use beverloo::beverloo_mass_flow_rate_kg_s;
pub use blend::BlendAggregator;
pub use discharge_front::{
    layer_probabilities, normal_cdf, DischargeFrontSimulator, DischargeKinematics,
};
pub use error::{EngineError, EngineResult};
pub use interval::IntervalBuilder;
pub use optimizer::{
    objective_score, CandidateRecord, DischargeOptimizer, OptimizationResult, OptimizeRequest,
    SiloDischarge,
};
pub use orchestrator::{
    aggregate_lot_contributions, resolve_discharge_mass_kg, MultiSiloOrchestrator,
    SimulationParams,
};
pub use sigma_adjuster::{SigmaAdjuster, SigmaAdjustment};
