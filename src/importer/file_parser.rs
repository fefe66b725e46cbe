// ==========================================
// 筒仓出料仿真系统 - 文件解析器
// ==========================================
// 阶段 0: 文件读取与解析 (CSV → 原始表)
// 原始表只做 trim, 不做类型转换
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

// ==========================================
// RawTable - 原始表（表头 + 字符串行）
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<HashMap<String, String>>,
}

impl RawTable {
    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    /// 缺失列（按传入顺序）
    pub fn missing_columns<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|c| !self.has_column(c))
            .collect()
    }

    /// 某列的所有值（空串视为缺失）
    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = Option<&'a str>> {
        self.rows.iter().map(move |row| {
            row.get(column)
                .map(|v| v.as_str())
                .filter(|v| !v.is_empty())
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ==========================================
// Trait: FileParser
// ==========================================
pub trait FileParser {
    /// 解析文件为原始表
    fn parse_to_raw_table(&self, file_path: &Path) -> ImportResult<RawTable>;
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_raw_table(&self, file_path: &Path) -> ImportResult<RawTable> {
        let path = file_path;

        // 检查文件存在
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        // 检查扩展名
        if let Some(ext) = path.extension() {
            if ext != "csv" {
                return Err(ImportError::UnsupportedFormat(
                    ext.to_string_lossy().to_string(),
                ));
            }
        }

        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut row_map = HashMap::new();

            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    row_map.insert(header.clone(), value.trim().to_string());
                }
            }

            // 跳过完全空白的行
            if row_map.values().all(|v| v.is_empty()) {
                continue;
            }

            rows.push(row_map);
        }

        Ok(RawTable { headers, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_csv_parser_trims_and_skips_blank_rows() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "silo_id , capacity_kg").unwrap();
        writeln!(temp_file, " S1 ,4000").unwrap();
        writeln!(temp_file, ",").unwrap();
        writeln!(temp_file, "S2, 4200").unwrap();
        temp_file.flush().unwrap();

        let table = CsvParser.parse_to_raw_table(temp_file.path()).unwrap();
        assert_eq!(table.headers, vec!["silo_id", "capacity_kg"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].get("silo_id").unwrap(), "S1");
        assert_eq!(table.rows[1].get("capacity_kg").unwrap(), "4200");
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser.parse_to_raw_table(Path::new("/nonexistent/silos.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_missing_columns_reported_in_order() {
        let table = RawTable {
            headers: vec!["silo_id".to_string()],
            rows: vec![],
        };
        assert_eq!(
            table.missing_columns(&["silo_id", "capacity_kg", "body_diameter_m"]),
            vec!["capacity_kg", "body_diameter_m"]
        );
    }
}
