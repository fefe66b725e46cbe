// ==========================================
// 筒仓出料仿真系统 - 配置层
// ==========================================
// 职责: 运行参数 / 优化参数管理, 支持文件加载 + 命令行覆写
// ==========================================

pub mod config_manager;
pub mod optimize_config;
pub mod run_config;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigError, ConfigManager, ConfigResult};
pub use optimize_config::{default_param_ranges, OptimizeConfig};
pub use run_config::RunConfig;
