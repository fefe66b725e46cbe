// ==========================================
// 筒仓出料仿真系统 - Beverloo 孔口流量模型
// ==========================================
// 公式: W = C · ρ_bulk · sqrt(g) · (D_outlet - k·d_grain)^2.5
// 红线: 有效孔径 <= 0 时不可出料（致命几何错误）
// ==========================================

use crate::domain::silo::{BeverlooParams, Material, Silo};
use crate::engine::error::{EngineError, EngineResult};

/// 计算质量流量 (kg/s)
///
/// 纯函数，无状态
pub fn beverloo_mass_flow_rate_kg_s(
    silo: &Silo,
    material: &Material,
    bev: &BeverlooParams,
) -> EngineResult<f64> {
    let d_eff = silo.outlet_diameter_m - bev.k * material.grain_diameter_m;
    if d_eff <= 0.0 {
        return Err(EngineError::InvalidGeometry {
            silo_id: silo.silo_id.clone(),
            outlet_diameter_m: silo.outlet_diameter_m,
            k: bev.k,
            grain_diameter_m: material.grain_diameter_m,
        });
    }
    Ok(bev.c * material.rho_bulk_kg_m3 * bev.g_m_s2.sqrt() * d_eff.powf(2.5))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beverloo_flow_rate_value() {
        let silo = Silo::new("S1", 4000.0, 3.0, 0.2);
        let material = Material::new(610.0, 0.004);
        let bev = BeverlooParams::default();

        let w = beverloo_mass_flow_rate_kg_s(&silo, &material, &bev).unwrap();
        let d_eff: f64 = 0.2 - 1.4 * 0.004;
        let expected = 0.58 * 610.0 * 9.81_f64.sqrt() * d_eff.powf(2.5);
        assert!((w - expected).abs() < 1e-9);
        assert!(w > 0.0);
    }

    #[test]
    fn test_beverloo_invalid_effective_diameter() {
        let silo = Silo::new("S1", 1000.0, 2.0, 0.2);
        let material = Material::new(610.0, 0.15);
        let bev = BeverlooParams {
            c: 0.58,
            k: 1.4,
            g_m_s2: 9.81,
        };
        match beverloo_mass_flow_rate_kg_s(&silo, &material, &bev) {
            Err(EngineError::InvalidGeometry { silo_id, .. }) => assert_eq!(silo_id, "S1"),
            other => panic!("Expected InvalidGeometry, got {:?}", other),
        }
    }

    #[test]
    fn test_beverloo_small_outlet_relative_to_grain() {
        let silo = Silo::new("S1", 1000.0, 2.0, 0.005);
        let material = Material::new(610.0, 0.004);
        let err = beverloo_mass_flow_rate_kg_s(&silo, &material, &BeverlooParams::default())
            .unwrap_err();
        assert!(err.to_string().contains("invalid Beverloo term"));
    }
}
