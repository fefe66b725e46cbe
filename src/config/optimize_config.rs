use crate::engine::optimizer::OptimizeRequest;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 内置参数归一化量程（麦芽质量指标）
///
/// 未列出的参数量程取 1.0
pub fn default_param_ranges() -> BTreeMap<String, f64> {
    [
        ("moisture_pct", 1.0),
        ("fine_extract_db_pct", 2.0),
        ("wort_pH", 0.2),
        ("diastatic_power_WK", 60.0),
        ("total_protein_pct", 1.0),
        ("wort_colour_EBC", 0.4),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// 出料比例优化配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizeConfig {
    /// 目标参数值（参数名 → 目标值）
    pub targets: BTreeMap<String, f64>,

    /// 迭代预算
    pub iterations: usize,

    /// 随机种子
    pub seed: u64,

    /// 归一化量程覆写（与内置量程合并）
    pub param_ranges: BTreeMap<String, f64>,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            targets: BTreeMap::new(),
            iterations: 120,
            seed: 42,
            param_ranges: BTreeMap::new(),
        }
    }
}

impl OptimizeConfig {
    /// 转换为引擎优化请求（量程 = 内置量程 + 覆写）
    pub fn to_request(&self) -> OptimizeRequest {
        let mut ranges = default_param_ranges();
        ranges.extend(self.param_ranges.iter().map(|(k, v)| (k.clone(), *v)));
        OptimizeRequest {
            targets: self.targets.clone(),
            param_ranges: ranges,
            iterations: self.iterations,
            seed: self.seed,
        }
    }
}
