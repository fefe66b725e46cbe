// ==========================================
// 筒仓出料仿真系统 - 合成数据集生成
// ==========================================
// 职责: 按种子生成随机但合法的四张输入表
// 红线: 同一种子 → 完全相同的输出
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::input_loader::{DISCHARGE_FILE, LAYERS_FILE, SILOS_FILE, SUPPLIERS_FILE};
use csv::Writer;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// 供应商参数及其取值区间（均在麦芽验收范围内）
const SUPPLIER_PARAM_RANGES: [(&str, f64, f64); 6] = [
    ("moisture_pct", 3.6, 4.95),
    ("fine_extract_db_pct", 81.05, 83.0),
    ("wort_pH", 5.8, 6.0),
    ("diastatic_power_WK", 300.1, 360.0),
    ("total_protein_pct", 10.2, 11.2),
    ("wort_colour_EBC", 4.3, 4.7),
];

/// 合成数据集规模
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticOptions {
    pub seed: u64,
    pub n_silos: usize,
    pub n_suppliers: usize,
    pub n_lots: usize,
}

impl Default for SyntheticOptions {
    fn default() -> Self {
        Self {
            seed: 42,
            n_silos: 3,
            n_suppliers: 3,
            n_lots: 8,
        }
    }
}

struct Lot {
    lot_id: String,
    supplier: String,
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn write_table(path: &Path, header: &[&str], rows: &[Vec<String>]) -> ImportResult<()> {
    let mut writer = Writer::from_path(path)?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer
        .flush()
        .map_err(|e| ImportError::FileWriteError(format!("{}: {}", path.display(), e)))?;
    Ok(())
}

/// 生成合成数据集
///
/// # 参数
/// - output_dir: 输出目录（不存在时创建）
/// - options: 种子与规模; n_suppliers / n_lots 为 0 时按 1 处理
///
/// # 返回
/// - 输出目录路径
pub fn generate_synthetic_dataset(
    output_dir: &Path,
    options: SyntheticOptions,
) -> ImportResult<PathBuf> {
    let mut rng = StdRng::seed_from_u64(options.seed);
    fs::create_dir_all(output_dir)
        .map_err(|e| ImportError::FileWriteError(format!("{}: {}", output_dir.display(), e)))?;

    let supplier_names: Vec<String> = (1..=options.n_suppliers.max(1))
        .map(|i| format!("SUP{}", i))
        .collect();

    // ===== 供应商 =====
    let mut supplier_rows = Vec::with_capacity(supplier_names.len());
    for name in &supplier_names {
        let mut row = vec![name.clone()];
        for (_, lo, hi) in SUPPLIER_PARAM_RANGES {
            row.push(round3(rng.gen_range(lo..hi)).to_string());
        }
        supplier_rows.push(row);
    }

    // ===== 筒仓 =====
    let mut silo_rows = Vec::with_capacity(options.n_silos);
    let mut capacities = Vec::with_capacity(options.n_silos);
    for i in 0..options.n_silos {
        let body_d = rng.gen_range(2.8..3.4);
        let capacity = round3(rng.gen_range(3200.0..4500.0));
        let outlet_d = rng.gen_range(0.18..0.23);
        capacities.push((format!("S{}", i + 1), capacity));
        silo_rows.push(vec![
            format!("S{}", i + 1),
            capacity.to_string(),
            round3(body_d).to_string(),
            round3(outlet_d).to_string(),
        ]);
    }

    // ===== 批次 =====
    let lots: Vec<Lot> = (0..options.n_lots.max(1))
        .map(|i| Lot {
            lot_id: format!("L{}", 1000 + i),
            supplier: supplier_names
                .choose(&mut rng)
                .cloned()
                .unwrap_or_default(),
        })
        .collect();

    // ===== 分层装料: 填充到容量的 65% ~ 95% =====
    let mut layer_rows = Vec::new();
    for (silo_id, capacity) in &capacities {
        let mut remain = rng.gen_range(0.65..0.95) * capacity;
        let mut layer_index = 1;
        while remain > 1e-9 {
            let Some(lot) = lots.choose(&mut rng) else {
                break;
            };
            let piece = remain.min(rng.gen_range(200.0..1100.0));
            layer_rows.push(vec![
                silo_id.clone(),
                layer_index.to_string(),
                lot.lot_id.clone(),
                lot.supplier.clone(),
                round3(piece).to_string(),
            ]);
            remain -= piece;
            layer_index += 1;
        }
    }

    // ===== 出料请求: 质量 / 比例 各半 =====
    let mut discharge_rows = Vec::with_capacity(capacities.len());
    for (silo_id, _) in &capacities {
        if rng.gen::<f64>() < 0.5 {
            discharge_rows.push(vec![
                silo_id.clone(),
                round3(rng.gen_range(500.0..1800.0)).to_string(),
                String::new(),
            ]);
        } else {
            discharge_rows.push(vec![
                silo_id.clone(),
                String::new(),
                round3(rng.gen_range(0.2..0.7)).to_string(),
            ]);
        }
    }

    let mut supplier_header = vec!["supplier"];
    supplier_header.extend(SUPPLIER_PARAM_RANGES.iter().map(|(name, _, _)| *name));

    write_table(
        &output_dir.join(SILOS_FILE),
        &["silo_id", "capacity_kg", "body_diameter_m", "outlet_diameter_m"],
        &silo_rows,
    )?;
    write_table(
        &output_dir.join(LAYERS_FILE),
        &["silo_id", "layer_index", "lot_id", "supplier", "segment_mass_kg"],
        &layer_rows,
    )?;
    write_table(&output_dir.join(SUPPLIERS_FILE), &supplier_header, &supplier_rows)?;
    write_table(
        &output_dir.join(DISCHARGE_FILE),
        &["silo_id", "discharge_mass_kg", "discharge_fraction"],
        &discharge_rows,
    )?;

    info!(
        dir = %output_dir.display(),
        seed = options.seed,
        silos = silo_rows.len(),
        layers = layer_rows.len(),
        "合成数据集已生成"
    );
    Ok(output_dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::input_loader::{load_inputs, load_raw_inputs};
    use crate::importer::validator::validate_inputs_shape;
    use tempfile::TempDir;

    #[test]
    fn test_synthetic_dataset_is_valid() {
        let dir = TempDir::new().unwrap();
        generate_synthetic_dataset(dir.path(), SyntheticOptions::default()).unwrap();

        let raw = load_raw_inputs(dir.path()).unwrap();
        assert!(validate_inputs_shape(&raw).is_empty());

        let inputs = raw.into_blend_inputs().unwrap();
        assert_eq!(inputs.silos.len(), 3);
        assert_eq!(inputs.discharge.len(), 3);
        for silo in &inputs.silos {
            let fill = inputs.total_fill_mass_kg(&silo.silo_id);
            assert!(fill <= silo.capacity_kg * 0.95 + 1.0);
            assert!(fill >= silo.capacity_kg * 0.65 - 1.0);
        }
    }

    #[test]
    fn test_same_seed_same_dataset() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        let options = SyntheticOptions {
            seed: 7,
            n_silos: 4,
            n_suppliers: 2,
            n_lots: 5,
        };
        generate_synthetic_dataset(a.path(), options).unwrap();
        generate_synthetic_dataset(b.path(), options).unwrap();

        for file in [SILOS_FILE, LAYERS_FILE, SUPPLIERS_FILE, DISCHARGE_FILE] {
            let left = fs::read_to_string(a.path().join(file)).unwrap();
            let right = fs::read_to_string(b.path().join(file)).unwrap();
            assert_eq!(left, right, "{} differs", file);
        }
        assert_eq!(load_inputs(a.path()).unwrap().silos.len(), 4);
    }
}
