// ==========================================
// 筒仓出料仿真系统 - 核心库
// ==========================================
// 职责: 筒仓分层出料前沿仿真 + 多仓配比 + 出料比例优化
// 技术栈: Rust + CSV + JSON (同步、单线程、确定性)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 仿真与优化
pub mod engine;

// 导入层 - 输入目录 / 示例数据
pub mod importer;

// 配置层 - 运行参数
pub mod config;

// 输出层 - 台账与摘要
pub mod report;

// 日志系统
pub mod logging;

// 性能统计
pub mod perf;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    BeverlooParams, BlendInputs, BlendedParams, DischargeAmount, DischargeRequest, LayerRecord,
    Material, MultiSiloResult, Silo, SupplierSpec, SupplierTable,
};

// 引擎
pub use engine::{
    DischargeOptimizer, EngineError, EngineResult, MultiSiloOrchestrator, OptimizationResult,
    OptimizeRequest, SimulationParams,
};

// 配置
pub use config::{ConfigManager, OptimizeConfig, RunConfig};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "筒仓出料配比仿真系统";
