// ==========================================
// 筒仓出料仿真系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 所有错误均为致命错误, 直接向调用方传播
// ==========================================

use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    // ===== 输入结构错误 =====
    /// 缺列 / 分层不连续 / 重复主键
    #[error("输入结构错误: {0}")]
    InputShape(String),

    // ===== 参数错误 =====
    /// σ / 步数 / 流量等非正参数
    #[error("参数无效: {0}")]
    InvalidParameter(String),

    /// Beverloo 有效孔径 D - k·d <= 0
    #[error(
        "几何无效: Silo {silo_id}: invalid Beverloo term D-k*d <= 0 \
         ({outlet_diameter_m:.6} - {k:.6}*{grain_diameter_m:.6})"
    )]
    InvalidGeometry {
        silo_id: String,
        outlet_diameter_m: f64,
        k: f64,
        grain_diameter_m: f64,
    },

    // ===== 数值范围错误 =====
    /// 出料比例越界 / 出料超过存量 / 负质量
    #[error("数值越界: {0}")]
    RangeViolation(String),

    // ===== 规格缺失 =====
    #[error("供应商规格缺失: {0}")]
    MissingSpec(String),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_geometry_message() {
        let err = EngineError::InvalidGeometry {
            silo_id: "S1".to_string(),
            outlet_diameter_m: 0.2,
            k: 1.4,
            grain_diameter_m: 0.15,
        };
        let msg = err.to_string();
        assert!(msg.contains("S1"));
        assert!(msg.contains("invalid Beverloo term"));
    }

    #[test]
    fn test_range_violation_message() {
        let err = EngineError::RangeViolation(
            "Silo S1: discharge_fraction must be between 0 and 1".to_string(),
        );
        assert!(err.to_string().contains("between 0 and 1"));
    }
}
