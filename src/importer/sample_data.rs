// ==========================================
// 筒仓出料仿真系统 - 内置示例数据
// ==========================================
// 三仓 / 三供应商 / 三批次, 用于演示与冒烟测试
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::input_loader::{DISCHARGE_FILE, LAYERS_FILE, SILOS_FILE, SUPPLIERS_FILE};
use std::fs;
use std::path::Path;
use tracing::info;

pub const SILOS_CSV: &str = "silo_id,capacity_kg,body_diameter_m,outlet_diameter_m
S1,4000,3.0,0.20
S2,4000,3.2,0.20
S3,4000,3.1,0.21
";

pub const LAYERS_CSV: &str = "silo_id,layer_index,lot_id,supplier,segment_mass_kg
S1,1,L1001,BBM,1200
S1,2,L1002,COFCO,900
S1,3,L1003,Malteurop,700
S2,1,L1001,BBM,1400
S2,2,L1003,Malteurop,1000
S2,3,L1002,COFCO,600
S3,1,L1002,COFCO,700
S3,2,L1003,Malteurop,700
";

pub const SUPPLIERS_CSV: &str = "supplier,moisture_pct,fine_extract_db_pct,wort_pH,diastatic_power_WK,total_protein_pct,wort_colour_EBC
BBM,4.2,82.0,5.98,342.1,10.12,3.8
COFCO,4.4,81.8,5.93,317.4,11.1,4.0
Malteurop,4.3,81.2,5.97,336.9,10.5,3.8
";

pub const DISCHARGE_CSV: &str = "silo_id,discharge_mass_kg,discharge_fraction
S1,1600,
S2,,0.5
S3,800,
";

/// 写出示例输入目录（目录不存在时创建）
pub fn write_sample_data(output_dir: &Path) -> ImportResult<()> {
    fs::create_dir_all(output_dir)
        .map_err(|e| ImportError::FileWriteError(format!("{}: {}", output_dir.display(), e)))?;

    for (filename, content) in [
        (SILOS_FILE, SILOS_CSV),
        (LAYERS_FILE, LAYERS_CSV),
        (SUPPLIERS_FILE, SUPPLIERS_CSV),
        (DISCHARGE_FILE, DISCHARGE_CSV),
    ] {
        let path = output_dir.join(filename);
        fs::write(&path, content)
            .map_err(|e| ImportError::FileWriteError(format!("{}: {}", path.display(), e)))?;
    }

    info!(dir = %output_dir.display(), "示例数据已写出");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::input_loader::load_inputs;
    use crate::domain::DischargeAmount;
    use tempfile::TempDir;

    #[test]
    fn test_sample_data_loads() {
        let dir = TempDir::new().unwrap();
        write_sample_data(dir.path()).unwrap();

        let inputs = load_inputs(dir.path()).unwrap();
        assert_eq!(inputs.silos.len(), 3);
        assert_eq!(inputs.layers.len(), 8);
        assert_eq!(inputs.suppliers.len(), 3);
        assert_eq!(inputs.suppliers.param_names.len(), 6);
        assert_eq!(inputs.discharge[1].amount, DischargeAmount::Fraction(0.5));
        assert_eq!(inputs.total_fill_mass_kg("S2"), 3000.0);
    }
}
