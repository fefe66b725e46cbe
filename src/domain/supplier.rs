// ==========================================
// 筒仓出料仿真系统 - 供应商质量规格
// ==========================================
// 职责: 供应商 → 质量参数（水分、浸出物、pH 等）
// 红线: 装料引用的供应商必须有完整规格
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// 单个供应商的质量规格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierSpec {
    pub supplier: String,
    pub params: BTreeMap<String, f64>,
}

impl SupplierSpec {
    pub fn new(supplier: &str) -> Self {
        Self {
            supplier: supplier.to_string(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, name: &str, value: f64) -> Self {
        self.params.insert(name.to_string(), value);
        self
    }
}

// ==========================================
// SupplierTable - 供应商规格表
// ==========================================
// param_names 保留输入列顺序（不含 supplier 列）
#[derive(Debug, Clone, Default)]
pub struct SupplierTable {
    pub param_names: Vec<String>,
    specs: HashMap<String, SupplierSpec>,
}

impl SupplierTable {
    pub fn new(param_names: Vec<String>) -> Self {
        Self {
            param_names,
            specs: HashMap::new(),
        }
    }

    /// 由规格列表构建，参数列取所有规格参数名的并集（按名称排序）
    pub fn from_specs(specs: Vec<SupplierSpec>) -> Self {
        let mut names: Vec<String> = specs
            .iter()
            .flat_map(|s| s.params.keys().cloned())
            .collect();
        names.sort();
        names.dedup();

        let mut table = Self::new(names);
        for spec in specs {
            table.insert(spec);
        }
        table
    }

    pub fn insert(&mut self, spec: SupplierSpec) {
        self.specs.insert(spec.supplier.clone(), spec);
    }

    pub fn get(&self, supplier: &str) -> Option<&SupplierSpec> {
        self.specs.get(supplier)
    }

    pub fn contains(&self, supplier: &str) -> bool {
        self.specs.contains_key(supplier)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn specs(&self) -> impl Iterator<Item = &SupplierSpec> {
        self.specs.values()
    }

    /// 某个参数在所有供应商中的 (最小, 最大) 值
    pub fn param_bounds(&self, param: &str) -> Option<(f64, f64)> {
        self.specs
            .values()
            .filter_map(|s| s.params.get(param).copied())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}
