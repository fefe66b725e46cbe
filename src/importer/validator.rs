// ==========================================
// 筒仓出料仿真系统 - 输入表结构校验
// ==========================================
// 职责: 在类型转换之前对四张原始表做一次整体检查
// 输出: 全部问题列表（空列表 = 通过），不中断
// ==========================================

use crate::importer::file_parser::RawTable;
use crate::importer::input_loader::RawInputs;
use std::collections::{BTreeSet, HashSet};

const REQUIRED_SILOS: [&str; 4] = ["silo_id", "capacity_kg", "body_diameter_m", "outlet_diameter_m"];
const REQUIRED_LAYERS: [&str; 5] = ["silo_id", "layer_index", "lot_id", "supplier", "segment_mass_kg"];
const REQUIRED_SUPPLIERS: [&str; 1] = ["supplier"];
const REQUIRED_DISCHARGE: [&str; 1] = ["silo_id"];

/// 可解析的数值（空值 / 非数值返回 None）
fn numeric_values<'a>(table: &'a RawTable, column: &'a str) -> impl Iterator<Item = f64> + 'a {
    table
        .column_values(column)
        .filter_map(|v| v.and_then(|s| s.parse::<f64>().ok()))
}

/// 非空但无法解析为数值的单元格数量
fn non_numeric_count(table: &RawTable, column: &str) -> usize {
    table
        .column_values(column)
        .flatten()
        .filter(|s| s.parse::<f64>().is_err())
        .count()
}

/// 可解析但非有限（NaN / inf）的单元格数量
fn non_finite_count(table: &RawTable, column: &str) -> usize {
    numeric_values(table, column).filter(|v| !v.is_finite()).count()
}

fn check_missing(errors: &mut Vec<String>, file: &str, table: &RawTable, required: &[&str]) {
    let missing = table.missing_columns(required);
    if !missing.is_empty() {
        errors.push(format!("{} missing: {:?}", file, missing));
    }
}

/// 校验原始输入表结构
///
/// # 检查项
/// - 必需列
/// - silo_id 唯一, (silo_id, layer_index) 唯一
/// - 装料引用的供应商均存在于 suppliers.csv
/// - 几何参数 > 0, 质量 >= 0, 出料比例在 [0, 1]
/// - 数值列可解析且有限（含供应商参数列）
///
/// # 返回
/// - 问题描述列表（按检查顺序）
pub fn validate_inputs_shape(inputs: &RawInputs) -> Vec<String> {
    let mut errors = Vec::new();
    let silos = &inputs.silos;
    let layers = &inputs.layers;
    let suppliers = &inputs.suppliers;
    let discharge = &inputs.discharge;

    check_missing(&mut errors, "silos.csv", silos, &REQUIRED_SILOS);
    check_missing(&mut errors, "layers.csv", layers, &REQUIRED_LAYERS);
    check_missing(&mut errors, "suppliers.csv", suppliers, &REQUIRED_SUPPLIERS);
    check_missing(&mut errors, "discharge.csv", discharge, &REQUIRED_DISCHARGE);

    if silos.has_column("silo_id") {
        let mut seen = HashSet::new();
        if silos.column_values("silo_id").any(|id| !seen.insert(id.unwrap_or(""))) {
            errors.push("silos.csv has duplicate silo_id values.".to_string());
        }
    }

    if layers.has_column("supplier") && suppliers.has_column("supplier") {
        let known: HashSet<&str> = suppliers.column_values("supplier").flatten().collect();
        let unknown: BTreeSet<&str> = layers
            .column_values("supplier")
            .map(|s| s.unwrap_or(""))
            .filter(|s| !known.contains(s))
            .collect();
        if !unknown.is_empty() {
            errors.push(format!(
                "layers.csv references unknown suppliers: {:?}",
                unknown
            ));
        }
    }

    for column in ["capacity_kg", "body_diameter_m", "outlet_diameter_m"] {
        if silos.has_column(column) && numeric_values(silos, column).any(|v| v <= 0.0) {
            errors.push(format!("silos.csv must have {} > 0 for all rows.", column));
        }
    }

    if silos.has_column("initial_mass_kg") && numeric_values(silos, "initial_mass_kg").any(|v| v < 0.0) {
        errors.push("silos.csv must have initial_mass_kg >= 0 for all rows.".to_string());
    }

    if layers.has_column("segment_mass_kg") && numeric_values(layers, "segment_mass_kg").any(|v| v < 0.0) {
        errors.push("layers.csv must have segment_mass_kg >= 0 for all rows.".to_string());
    }

    if layers.has_column("silo_id") && layers.has_column("layer_index") {
        let mut seen = HashSet::new();
        let duplicated = layers.rows.iter().any(|row| {
            let silo = row.get("silo_id").map(|s| s.as_str()).unwrap_or("");
            // "2" 与 "2.0" 视为同一层
            let index = row
                .get("layer_index")
                .and_then(|s| s.parse::<f64>().ok())
                .map(|v| v.to_string())
                .unwrap_or_else(|| row.get("layer_index").cloned().unwrap_or_default());
            !seen.insert((silo, index))
        });
        if duplicated {
            errors.push("layers.csv has duplicate (silo_id, layer_index) values.".to_string());
        }
    }

    if discharge.has_column("discharge_mass_kg")
        && numeric_values(discharge, "discharge_mass_kg").any(|v| v < 0.0)
    {
        errors.push("discharge.csv must have discharge_mass_kg >= 0 when provided.".to_string());
    }

    if discharge.has_column("discharge_fraction")
        && numeric_values(discharge, "discharge_fraction").any(|v| !(0.0..=1.0).contains(&v))
    {
        errors.push(
            "discharge.csv must have discharge_fraction between 0 and 1 when provided.".to_string(),
        );
    }

    let supplier_params: Vec<&str> = suppliers
        .headers
        .iter()
        .map(|h| h.as_str())
        .filter(|h| *h != "supplier")
        .collect();
    let numeric_columns: [(&str, &RawTable, Vec<&str>); 4] = [
        ("silos.csv", silos, vec!["capacity_kg", "body_diameter_m", "outlet_diameter_m", "initial_mass_kg"]),
        ("layers.csv", layers, vec!["layer_index", "segment_mass_kg"]),
        ("suppliers.csv", suppliers, supplier_params),
        ("discharge.csv", discharge, vec!["discharge_mass_kg", "discharge_fraction"]),
    ];
    for (file, table, columns) in numeric_columns {
        for column in columns {
            let bad = non_numeric_count(table, column);
            if bad > 0 {
                errors.push(format!("{} has {} non-numeric {} values.", file, bad, column));
            }
            let non_finite = non_finite_count(table, column);
            if non_finite > 0 {
                errors.push(format!(
                    "{} has {} non-finite {} values.",
                    file, non_finite, column
                ));
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|values| {
                    headers
                        .iter()
                        .zip(values.iter())
                        .map(|(h, v)| (h.to_string(), v.to_string()))
                        .collect::<HashMap<_, _>>()
                })
                .collect(),
        }
    }

    fn valid_inputs() -> RawInputs {
        RawInputs {
            silos: table(
                &["silo_id", "capacity_kg", "body_diameter_m", "outlet_diameter_m"],
                &[&["S1", "4000", "3.0", "0.2"], &["S2", "4000", "3.2", "0.2"]],
            ),
            layers: table(
                &["silo_id", "layer_index", "lot_id", "supplier", "segment_mass_kg"],
                &[&["S1", "1", "L1", "A", "1000"], &["S2", "1", "L2", "B", "800"]],
            ),
            suppliers: table(&["supplier", "moisture_pct"], &[&["A", "4.2"], &["B", "4.4"]]),
            discharge: table(
                &["silo_id", "discharge_mass_kg", "discharge_fraction"],
                &[&["S1", "500", ""], &["S2", "", "0.5"]],
            ),
        }
    }

    #[test]
    fn test_valid_inputs_pass() {
        assert!(validate_inputs_shape(&valid_inputs()).is_empty());
    }

    #[test]
    fn test_missing_columns_listed() {
        let mut inputs = valid_inputs();
        inputs.silos.headers.retain(|h| h != "outlet_diameter_m");

        let errors = validate_inputs_shape(&inputs);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("silos.csv missing:"));
        assert!(errors[0].contains("outlet_diameter_m"));
    }

    #[test]
    fn test_duplicate_layer_index_detected() {
        let mut inputs = valid_inputs();
        inputs.layers = table(
            &["silo_id", "layer_index", "lot_id", "supplier", "segment_mass_kg"],
            &[&["S1", "1", "L1", "A", "1000"], &["S1", "1.0", "L2", "B", "800"]],
        );

        let errors = validate_inputs_shape(&inputs);
        assert!(errors.iter().any(|e| e.contains("duplicate (silo_id, layer_index)")));
    }

    #[test]
    fn test_fraction_and_supplier_problems_collected() {
        let mut inputs = valid_inputs();
        inputs.discharge.rows[1].insert("discharge_fraction".to_string(), "1.5".to_string());
        inputs.layers.rows[0].insert("supplier".to_string(), "Z".to_string());
        inputs.silos.rows[0].insert("capacity_kg".to_string(), "0".to_string());

        let errors = validate_inputs_shape(&inputs);
        assert!(errors.iter().any(|e| e.contains("unknown suppliers") && e.contains("\"Z\"")));
        assert!(errors.iter().any(|e| e.contains("discharge_fraction between 0 and 1")));
        assert!(errors.iter().any(|e| e.contains("capacity_kg > 0")));
    }

    #[test]
    fn test_non_numeric_values_reported() {
        let mut inputs = valid_inputs();
        inputs.layers.rows[1].insert("segment_mass_kg".to_string(), "heavy".to_string());

        let errors = validate_inputs_shape(&inputs);
        assert_eq!(errors, vec!["layers.csv has 1 non-numeric segment_mass_kg values."]);
    }

    #[test]
    fn test_non_finite_values_reported() {
        let mut inputs = valid_inputs();
        inputs.layers.rows[0].insert("segment_mass_kg".to_string(), "NaN".to_string());
        inputs.silos.headers.push("initial_mass_kg".to_string());
        inputs.silos.rows[1].insert("initial_mass_kg".to_string(), "inf".to_string());
        inputs.suppliers.rows[0].insert("moisture_pct".to_string(), "-inf".to_string());

        let errors = validate_inputs_shape(&inputs);
        assert_eq!(
            errors,
            vec![
                "silos.csv has 1 non-finite initial_mass_kg values.",
                "layers.csv has 1 non-finite segment_mass_kg values.",
                "suppliers.csv has 1 non-finite moisture_pct values.",
            ]
        );
    }
}
