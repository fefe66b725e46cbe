// ==========================================
// 筒仓出料仿真系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: 扁平 JSON 对象 (key-value), 命令行参数覆写
// ==========================================

use crate::config::optimize_config::OptimizeConfig;
use crate::config::run_config::RunConfig;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// 配置层错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败: {path}: {message}")]
    FileReadError { path: String, message: String },

    #[error("配置文件格式错误: {0}")]
    ParseError(String),

    #[error("配置值格式错误 (key: {key}): {message}")]
    ValueError { key: String, message: String },
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ConfigManager {
    values: BTreeMap<String, Value>,
}

impl ConfigManager {
    /// 创建空配置（全部使用默认值）
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JSON 配置文件加载
    ///
    /// # 参数
    /// - path: 配置文件路径（顶层必须是对象）
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&raw)
    }

    /// 从 JSON 字符串加载
    pub fn from_json_str(raw: &str) -> ConfigResult<Self> {
        let value: Value = serde_json::from_str(raw)?;
        match value {
            Value::Object(map) => Ok(Self {
                values: map.into_iter().collect(),
            }),
            _ => Err(ConfigError::ParseError(
                "config root must be a JSON object".to_string(),
            )),
        }
    }

    /// 读取配置值
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// 覆写配置值（命令行参数优先于文件）
    pub fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }

    /// 覆写配置值（仅当值存在时）
    pub fn set_opt<T: Into<Value>>(&mut self, key: &str, value: Option<T>) {
        if let Some(v) = value {
            self.set(key, v.into());
        }
    }

    fn as_object(&self) -> Value {
        let map: Map<String, Value> = self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Value::Object(map)
    }

    /// 仿真运行配置（缺省键使用默认值）
    pub fn get_run_config(&self) -> ConfigResult<RunConfig> {
        serde_json::from_value(self.as_object()).map_err(|e| ConfigError::ValueError {
            key: "run".to_string(),
            message: e.to_string(),
        })
    }

    /// 优化配置（缺省键使用默认值）
    pub fn get_optimize_config(&self) -> ConfigResult<OptimizeConfig> {
        serde_json::from_value(self.as_object()).map_err(|e| ConfigError::ValueError {
            key: "optimize".to_string(),
            message: e.to_string(),
        })
    }

    /// 获取生效配置快照（JSON格式）
    ///
    /// # 用途
    /// - 写入 summary.json, 保证结果可追溯
    pub fn get_config_snapshot(&self) -> ConfigResult<Value> {
        let run = serde_json::to_value(self.get_run_config()?)?;
        let optimize = serde_json::to_value(self.get_optimize_config()?)?;
        Ok(serde_json::json!({ "run": run, "optimize": optimize }))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 物料 / Beverloo
    pub const RHO_BULK_KG_M3: &str = "rho_bulk_kg_m3";
    pub const GRAIN_DIAMETER_M: &str = "grain_diameter_m";
    pub const BEVERLOO_C: &str = "beverloo_c";
    pub const BEVERLOO_K: &str = "beverloo_k";
    pub const GRAVITY_M_S2: &str = "gravity_m_s2";

    // 前沿仿真
    pub const SIGMA_M: &str = "sigma_m";
    pub const STEPS: &str = "steps";
    pub const AUTO_ADJUST: &str = "auto_adjust";
    pub const MIN_NONZERO_MASS_KG: &str = "min_nonzero_mass_kg";

    // 优化
    pub const TARGETS: &str = "targets"; // 目标参数 (JSON 对象)
    pub const ITERATIONS: &str = "iterations";
    pub const SEED: &str = "seed";
    pub const PARAM_RANGES: &str = "param_ranges";
}
