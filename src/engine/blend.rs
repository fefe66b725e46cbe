// ==========================================
// 筒仓出料仿真系统 - 配比聚合引擎
// ==========================================
// 输入: 任意 (supplier, discharged_mass) 贡献表 + 供应商规格表
// 输出: 各质量参数的质量加权平均 Σ(m·v)/Σm
// 红线: 总质量为 0 时所有参数为 NaN（"未定义", 不是 0）
// ==========================================

use crate::domain::result::SupplierMass;
use crate::domain::supplier::SupplierTable;
use crate::domain::types::BlendedParams;
use crate::engine::error::{EngineError, EngineResult};

// ==========================================
// BlendAggregator - 配比聚合器
// ==========================================
pub struct BlendAggregator<'a> {
    suppliers: &'a SupplierTable,
}

impl<'a> BlendAggregator<'a> {
    pub fn new(suppliers: &'a SupplierTable) -> Self {
        Self { suppliers }
    }

    /// 计算质量加权配比
    ///
    /// # 返回
    /// - Ok(BlendedParams): 参数名 → 加权平均（总质量 <= 0 时全部 NaN）
    /// - Err(InputShape): 规格表无参数列
    /// - Err(MissingSpec): 贡献中的供应商无规格或规格不完整
    pub fn blend<T: SupplierMass>(&self, contributions: &[T]) -> EngineResult<BlendedParams> {
        let param_names = &self.suppliers.param_names;
        if param_names.is_empty() {
            return Err(EngineError::InputShape(
                "supplier table must have at least one parameter column besides 'supplier'"
                    .to_string(),
            ));
        }

        let mut weighted = vec![0.0; param_names.len()];
        let mut total_mass = 0.0;
        for c in contributions {
            let spec = self.suppliers.get(c.supplier()).ok_or_else(|| {
                EngineError::MissingSpec(format!(
                    "supplier '{}' has no spec in supplier table",
                    c.supplier()
                ))
            })?;

            let m = c.discharged_mass_kg();
            for (acc, name) in weighted.iter_mut().zip(param_names) {
                let v = spec.params.get(name).copied().filter(|v| !v.is_nan());
                match v {
                    Some(v) => *acc += m * v,
                    None => {
                        return Err(EngineError::MissingSpec(format!(
                            "supplier '{}' spec is missing parameter '{}'",
                            c.supplier(),
                            name
                        )))
                    }
                }
            }
            total_mass += m;
        }

        if total_mass <= 0.0 {
            return Ok(param_names
                .iter()
                .map(|name| (name.clone(), f64::NAN))
                .collect());
        }

        Ok(param_names
            .iter()
            .zip(weighted)
            .map(|(name, w)| (name.clone(), w / total_mass))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::result::LotContribution;
    use crate::domain::supplier::SupplierSpec;

    fn suppliers() -> SupplierTable {
        SupplierTable::from_specs(vec![
            SupplierSpec::new("A").with_param("moisture_pct", 4.0).with_param("wort_pH", 6.0),
            SupplierSpec::new("B").with_param("moisture_pct", 5.0).with_param("wort_pH", 5.8),
        ])
    }

    fn lot(supplier: &str, mass: f64) -> LotContribution {
        LotContribution {
            silo_id: "S1".to_string(),
            lot_id: format!("L-{}", supplier),
            supplier: supplier.to_string(),
            discharged_mass_kg: mass,
        }
    }

    #[test]
    fn test_blend_weighted_average() {
        let table = suppliers();
        let blend = BlendAggregator::new(&table)
            .blend(&[lot("A", 300.0), lot("B", 100.0)])
            .unwrap();
        assert!((blend["moisture_pct"] - 4.25).abs() < 1e-12);
        assert!((blend["wort_pH"] - 5.95).abs() < 1e-12);
    }

    #[test]
    fn test_blend_zero_mass_is_nan() {
        let table = suppliers();
        let blend = BlendAggregator::new(&table)
            .blend(&[lot("A", 0.0), lot("B", 0.0)])
            .unwrap();
        assert_eq!(blend.len(), 2);
        assert!(blend.values().all(|v| v.is_nan()));

        let empty: Vec<LotContribution> = Vec::new();
        let blend = BlendAggregator::new(&table).blend(&empty).unwrap();
        assert!(blend.values().all(|v| v.is_nan()));
    }

    #[test]
    fn test_blend_missing_supplier() {
        let table = suppliers();
        let err = BlendAggregator::new(&table)
            .blend(&[lot("A", 1.0), lot("Z", 1.0)])
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingSpec(_)));
    }

    #[test]
    fn test_blend_incomplete_spec() {
        let mut table = suppliers();
        table.insert(SupplierSpec::new("C").with_param("moisture_pct", 4.1));
        let err = BlendAggregator::new(&table).blend(&[lot("C", 1.0)]).unwrap_err();
        match err {
            EngineError::MissingSpec(msg) => assert!(msg.contains("wort_pH")),
            other => panic!("Expected MissingSpec, got {:?}", other),
        }
    }

    #[test]
    fn test_blend_requires_param_columns() {
        let table = SupplierTable::new(Vec::new());
        assert!(matches!(
            BlendAggregator::new(&table).blend(&[lot("A", 1.0)]),
            Err(EngineError::InputShape(_))
        ));
    }
}
