// ==========================================
// 筒仓出料仿真系统 - 输入目录加载
// ==========================================
// 输入: silos.csv / layers.csv / suppliers.csv / discharge.csv
// 输出: RawInputs (原始表) → BlendInputs (引擎输入)
// ==========================================

use crate::domain::{
    BlendInputs, DischargeRequest, LayerRecord, Silo, SupplierSpec, SupplierTable,
};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{CsvParser, FileParser, RawTable};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, instrument};

pub const SILOS_FILE: &str = "silos.csv";
pub const LAYERS_FILE: &str = "layers.csv";
pub const SUPPLIERS_FILE: &str = "suppliers.csv";
pub const DISCHARGE_FILE: &str = "discharge.csv";

/// 必需的四个输入文件
pub const REQUIRED_INPUT_FILES: [&str; 4] =
    [SILOS_FILE, LAYERS_FILE, SUPPLIERS_FILE, DISCHARGE_FILE];

// ==========================================
// RawInputs - 四张原始表
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct RawInputs {
    pub silos: RawTable,
    pub layers: RawTable,
    pub suppliers: RawTable,
    pub discharge: RawTable,
}

/// 加载输入目录中的四张原始表
///
/// # 返回
/// - Err(FileNotFound): 目录或任一必需文件不存在
#[instrument(skip_all, fields(input_dir = %input_dir.display()))]
pub fn load_raw_inputs(input_dir: &Path) -> ImportResult<RawInputs> {
    if !input_dir.exists() {
        return Err(ImportError::FileNotFound(format!(
            "Input directory not found: {}",
            input_dir.display()
        )));
    }

    let parser = CsvParser;
    let mut tables = Vec::with_capacity(REQUIRED_INPUT_FILES.len());
    for filename in REQUIRED_INPUT_FILES {
        let path = input_dir.join(filename);
        if !path.exists() {
            return Err(ImportError::FileNotFound(format!(
                "Missing input file: {}",
                path.display()
            )));
        }
        let table = parser.parse_to_raw_table(&path)?;
        debug!(file = filename, rows = table.len(), "输入表已读取");
        tables.push(table);
    }

    let mut it = tables.into_iter();
    let raw = RawInputs {
        silos: it.next().unwrap_or_default(),
        layers: it.next().unwrap_or_default(),
        suppliers: it.next().unwrap_or_default(),
        discharge: it.next().unwrap_or_default(),
    };
    info!(
        silos = raw.silos.len(),
        layers = raw.layers.len(),
        suppliers = raw.suppliers.len(),
        discharge = raw.discharge.len(),
        "输入目录加载完成"
    );
    Ok(raw)
}

/// 加载输入目录并转换为引擎输入
pub fn load_inputs(input_dir: &Path) -> ImportResult<BlendInputs> {
    load_raw_inputs(input_dir)?.into_blend_inputs()
}

// ==========================================
// 单元格读取
// ==========================================
struct RowReader<'a> {
    table: &'static str,
    row_no: usize,
    row: &'a HashMap<String, String>,
}

impl<'a> RowReader<'a> {
    fn opt_str(&self, field: &str) -> Option<&'a str> {
        self.row
            .get(field)
            .map(|v| v.as_str())
            .filter(|v| !v.is_empty())
    }

    fn string(&self, field: &str) -> ImportResult<String> {
        self.opt_str(field)
            .map(|v| v.to_string())
            .ok_or_else(|| ImportError::TypeConversionError {
                table: self.table.to_string(),
                row: self.row_no,
                field: field.to_string(),
                message: "值为空".to_string(),
            })
    }

    fn opt_num(&self, field: &str) -> ImportResult<Option<f64>> {
        match self.opt_str(field) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<f64>()
                .map(Some)
                .map_err(|e| ImportError::TypeConversionError {
                    table: self.table.to_string(),
                    row: self.row_no,
                    field: field.to_string(),
                    message: format!("'{}' 不是数值: {}", raw, e),
                }),
        }
    }

    fn num(&self, field: &str) -> ImportResult<f64> {
        self.opt_num(field)?
            .ok_or_else(|| ImportError::TypeConversionError {
                table: self.table.to_string(),
                row: self.row_no,
                field: field.to_string(),
                message: "值为空".to_string(),
            })
    }

    /// 层序号: 接受 "3" 或 "3.0"
    fn index(&self, field: &str) -> ImportResult<u32> {
        let value = self.num(field)?;
        if value.fract() != 0.0 || value < 0.0 || value > u32::MAX as f64 {
            return Err(ImportError::TypeConversionError {
                table: self.table.to_string(),
                row: self.row_no,
                field: field.to_string(),
                message: format!("{} 不是非负整数", value),
            });
        }
        Ok(value as u32)
    }
}

fn require_columns(table_name: &str, table: &RawTable, required: &[&str]) -> ImportResult<()> {
    match table.missing_columns(required).first() {
        Some(column) => Err(ImportError::MissingColumn {
            table: table_name.to_string(),
            column: column.to_string(),
        }),
        None => Ok(()),
    }
}

fn rows<'a>(table_name: &'static str, table: &'a RawTable) -> impl Iterator<Item = RowReader<'a>> {
    table
        .rows
        .iter()
        .enumerate()
        .map(move |(idx, row)| RowReader {
            table: table_name,
            row_no: idx + 1,
            row,
        })
}

impl RawInputs {
    /// 原始表 → 引擎输入
    ///
    /// # 规则
    /// - 数值列严格解析, 空值只允许出现在可选列
    /// - 出料请求必须恰好给出 discharge_mass_kg / discharge_fraction 之一
    /// - 供应商参数列 = suppliers.csv 除 supplier 外的所有列（保留列序）
    pub fn into_blend_inputs(self) -> ImportResult<BlendInputs> {
        require_columns(
            SILOS_FILE,
            &self.silos,
            &["silo_id", "capacity_kg", "body_diameter_m", "outlet_diameter_m"],
        )?;
        require_columns(
            LAYERS_FILE,
            &self.layers,
            &["silo_id", "layer_index", "lot_id", "supplier", "segment_mass_kg"],
        )?;
        require_columns(SUPPLIERS_FILE, &self.suppliers, &["supplier"])?;
        require_columns(DISCHARGE_FILE, &self.discharge, &["silo_id"])?;

        let mut silos = Vec::with_capacity(self.silos.len());
        for r in rows(SILOS_FILE, &self.silos) {
            let mut silo = Silo::new(
                &r.string("silo_id")?,
                r.num("capacity_kg")?,
                r.num("body_diameter_m")?,
                r.num("outlet_diameter_m")?,
            );
            silo.initial_mass_kg = r.opt_num("initial_mass_kg")?.unwrap_or(0.0);
            silos.push(silo);
        }

        let mut layers = Vec::with_capacity(self.layers.len());
        for r in rows(LAYERS_FILE, &self.layers) {
            layers.push(LayerRecord::new(
                &r.string("silo_id")?,
                r.index("layer_index")?,
                &r.string("lot_id")?,
                &r.string("supplier")?,
                r.num("segment_mass_kg")?,
            ));
        }

        let param_names: Vec<String> = self
            .suppliers
            .headers
            .iter()
            .filter(|h| h.as_str() != "supplier")
            .cloned()
            .collect();
        let mut suppliers = SupplierTable::new(param_names.clone());
        for r in rows(SUPPLIERS_FILE, &self.suppliers) {
            let mut spec = SupplierSpec::new(&r.string("supplier")?);
            // 空单元格视为缺失参数, 由配比聚合报告 MissingSpec
            for name in &param_names {
                if let Some(value) = r.opt_num(name)? {
                    spec = spec.with_param(name, value);
                }
            }
            suppliers.insert(spec);
        }

        let mut discharge = Vec::with_capacity(self.discharge.len());
        for r in rows(DISCHARGE_FILE, &self.discharge) {
            let silo_id = r.string("silo_id")?;
            let request = match (r.opt_num("discharge_mass_kg")?, r.opt_num("discharge_fraction")?) {
                (Some(mass), None) => DischargeRequest::mass(&silo_id, mass),
                (None, Some(fraction)) => DischargeRequest::fraction(&silo_id, fraction),
                (Some(_), Some(_)) => {
                    return Err(ImportError::InvalidRow {
                        table: DISCHARGE_FILE.to_string(),
                        row: r.row_no,
                        message: format!(
                            "silo {} gives both discharge_mass_kg and discharge_fraction",
                            silo_id
                        ),
                    })
                }
                (None, None) => {
                    return Err(ImportError::InvalidRow {
                        table: DISCHARGE_FILE.to_string(),
                        row: r.row_no,
                        message: format!(
                            "silo {} needs discharge_mass_kg or discharge_fraction",
                            silo_id
                        ),
                    })
                }
            };
            discharge.push(request);
        }

        Ok(BlendInputs {
            silos,
            layers,
            suppliers,
            discharge,
        })
    }
}
