// ==========================================
// 筒仓出料仿真系统 - 领域类型定义
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 配比结果：参数名 → 质量加权平均值（总质量为 0 时为 NaN）
pub type BlendedParams = BTreeMap<String, f64>;

// ==========================================
// 优化目标函数 (Objective Method)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveMethod {
    // Σ((actual - target) / range)², 分层探索 + 局部开发
    #[serde(rename = "normalized_weighted_l2_hybrid_search")]
    NormalizedWeightedL2HybridSearch,
}

impl fmt::Display for ObjectiveMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectiveMethod::NormalizedWeightedL2HybridSearch => {
                write!(f, "normalized_weighted_l2_hybrid_search")
            }
        }
    }
}

// ==========================================
// 搜索阶段 (Search Phase)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchPhase {
    Explore, // 分层抽样探索
    Exploit, // 局部扰动开发
}

impl fmt::Display for SearchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchPhase::Explore => write!(f, "EXPLORE"),
            SearchPhase::Exploit => write!(f, "EXPLOIT"),
        }
    }
}
