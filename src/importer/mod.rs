// ==========================================
// 筒仓出料仿真系统 - 导入层
// ==========================================
// 职责: 输入目录 (CSV) → 原始表 → 结构校验 → 引擎输入
// 附带: 内置示例数据 / 合成数据集生成
// ==========================================

// 模块声明
pub mod error;
pub mod file_parser;
pub mod input_loader;
pub mod sample_data;
pub mod synthetic;
pub mod validator;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, FileParser, RawTable};
pub use input_loader::{load_inputs, load_raw_inputs, RawInputs, REQUIRED_INPUT_FILES};
pub use sample_data::write_sample_data;
pub use synthetic::{generate_synthetic_dataset, SyntheticOptions};
pub use validator::validate_inputs_shape;
