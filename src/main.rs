// ==========================================
// 筒仓出料仿真系统 - 命令行入口
// ==========================================
// 子命令: init-sample / init-synthetic / validate / run / optimize
// 退出码: 0 成功, 1 运行错误, 2 输入校验失败
// ==========================================

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use silo_blend::config::{config_keys, ConfigManager};
use silo_blend::engine::{DischargeOptimizer, MultiSiloOrchestrator};
use silo_blend::importer::{
    generate_synthetic_dataset, load_raw_inputs, validate_inputs_shape, write_sample_data,
    RawInputs, SyntheticOptions,
};
use silo_blend::{logging, perf, report};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// 输入校验失败的退出码
const EXIT_VALIDATION_FAILED: u8 = 2;

/// Offline silo discharge and blend simulator.
#[derive(Debug, Parser)]
#[command(name = "silo-blend", version, about = "Offline silo discharge and blend simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create sample CSV input files.
    InitSample {
        /// Directory for sample inputs.
        #[arg(long, default_value = "data/sample")]
        out: PathBuf,
    },
    /// Create synthetic CSV input files.
    InitSynthetic {
        /// Output directory.
        #[arg(long, default_value = "data/synthetic")]
        out: PathBuf,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = 3)]
        silos: usize,
        #[arg(long, default_value_t = 3)]
        suppliers: usize,
        #[arg(long, default_value_t = 8)]
        lots: usize,
    },
    /// Validate input CSV files.
    Validate {
        /// Input directory.
        #[arg(long = "in", default_value = "data/sample")]
        input_dir: PathBuf,
    },
    /// Run the simulation from input CSV files.
    Run {
        #[command(flatten)]
        run: RunArgs,
    },
    /// Search discharge fractions that best match target parameters.
    Optimize {
        #[command(flatten)]
        run: RunArgs,
        /// Target value, repeatable: --target moisture_pct=4.3
        #[arg(long = "target", value_parser = parse_key_value)]
        targets: Vec<(String, f64)>,
        /// Normalization range override, repeatable: --range wort_pH=0.1
        #[arg(long = "range", value_parser = parse_key_value)]
        ranges: Vec<(String, f64)>,
        #[arg(long)]
        iterations: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// run / optimize 共用参数
#[derive(Debug, Args)]
struct RunArgs {
    /// Input directory.
    #[arg(long = "in", default_value = "data/sample")]
    input_dir: PathBuf,
    /// Output directory.
    #[arg(long = "out", default_value = "outputs/latest")]
    output_dir: PathBuf,
    /// JSON config file (flat keys); flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    rho_bulk_kg_m3: Option<f64>,
    #[arg(long)]
    grain_diameter_m: Option<f64>,
    #[arg(long)]
    beverloo_c: Option<f64>,
    #[arg(long)]
    beverloo_k: Option<f64>,
    #[arg(long)]
    gravity_m_s2: Option<f64>,
    #[arg(long)]
    sigma_m: Option<f64>,
    #[arg(long)]
    steps: Option<usize>,
    /// Widen sigma until at least two lots contribute.
    #[arg(long, conflicts_with = "no_auto_adjust")]
    auto_adjust: bool,
    /// Run the front simulation once with the given sigma.
    #[arg(long)]
    no_auto_adjust: bool,
}

fn parse_key_value(raw: &str) -> Result<(String, f64), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid number in '{}': {}", raw, e))?;
    Ok((key.trim().to_string(), value))
}

impl RunArgs {
    /// 配置文件 + 命令行覆写
    fn config_manager(&self) -> anyhow::Result<ConfigManager> {
        let mut cfg = match &self.config {
            Some(path) => ConfigManager::from_file(path)?,
            None => ConfigManager::new(),
        };
        cfg.set_opt(config_keys::RHO_BULK_KG_M3, self.rho_bulk_kg_m3);
        cfg.set_opt(config_keys::GRAIN_DIAMETER_M, self.grain_diameter_m);
        cfg.set_opt(config_keys::BEVERLOO_C, self.beverloo_c);
        cfg.set_opt(config_keys::BEVERLOO_K, self.beverloo_k);
        cfg.set_opt(config_keys::GRAVITY_M_S2, self.gravity_m_s2);
        cfg.set_opt(config_keys::SIGMA_M, self.sigma_m);
        cfg.set_opt(config_keys::STEPS, self.steps.map(|s| s as u64));
        if self.auto_adjust {
            cfg.set_opt(config_keys::AUTO_ADJUST, Some(true));
        }
        if self.no_auto_adjust {
            cfg.set_opt(config_keys::AUTO_ADJUST, Some(false));
        }
        Ok(cfg)
    }
}

fn print_validation_errors(errors: &[String]) {
    println!("Validation failed:");
    for error in errors {
        println!("- {}", error);
    }
}

/// 加载并校验输入目录; 校验失败返回 None（已打印问题列表）
fn load_checked(input_dir: &Path) -> anyhow::Result<Option<RawInputs>> {
    let raw = load_raw_inputs(input_dir)
        .with_context(|| format!("loading inputs from {}", input_dir.display()))?;
    let errors = validate_inputs_shape(&raw);
    if !errors.is_empty() {
        print_validation_errors(&errors);
        return Ok(None);
    }
    Ok(Some(raw))
}

fn cmd_run(args: &RunArgs) -> anyhow::Result<ExitCode> {
    let Some(raw) = load_checked(&args.input_dir)? else {
        return Ok(ExitCode::from(EXIT_VALIDATION_FAILED));
    };
    let inputs = raw.into_blend_inputs()?;

    let cfg = args.config_manager()?;
    let params = cfg.get_run_config()?.to_simulation_params()?;
    let orchestrator = MultiSiloOrchestrator::new(params)?;
    let result = orchestrator.run(&inputs)?;

    let snapshot = cfg.get_config_snapshot()?;
    let paths = report::write_outputs(&result, &args.output_dir, Some(&snapshot))?;

    println!("{}", report::terminal_summary(&result));
    println!("Artifacts:");
    for (label, path) in [
        ("segment_contributions_csv", &paths.segment_contributions_csv),
        ("lot_contributions_csv", &paths.lot_contributions_csv),
        ("silo_state_ledger_csv", &paths.silo_state_ledger_csv),
        ("lot_state_ledger_csv", &paths.lot_state_ledger_csv),
        ("segment_state_ledger_csv", &paths.segment_state_ledger_csv),
        ("summary_json", &paths.summary_json),
    ] {
        println!("- {}: {}", label, path.display());
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_optimize(
    args: &RunArgs,
    targets: &[(String, f64)],
    ranges: &[(String, f64)],
    iterations: Option<usize>,
    seed: Option<u64>,
) -> anyhow::Result<ExitCode> {
    let Some(raw) = load_checked(&args.input_dir)? else {
        return Ok(ExitCode::from(EXIT_VALIDATION_FAILED));
    };
    let inputs = raw.into_blend_inputs()?;

    let mut cfg = args.config_manager()?;
    cfg.set_opt(config_keys::ITERATIONS, iterations.map(|n| n as u64));
    cfg.set_opt(config_keys::SEED, seed);

    let mut opt_cfg = cfg.get_optimize_config()?;
    opt_cfg.targets.extend(targets.iter().cloned());
    opt_cfg.param_ranges.extend(ranges.iter().cloned());
    if opt_cfg.targets.is_empty() {
        bail!("no targets given; use --target name=value or a config file with \"targets\"");
    }

    let params = cfg.get_run_config()?.to_simulation_params()?;
    let optimizer = DischargeOptimizer::new(params)?;
    let result = optimizer.optimize(&inputs, &opt_cfg.to_request())?;

    let path = report::write_optimization_output(&result, &args.output_dir)?;
    println!("{}", report::optimization_summary(&result));
    println!("Artifacts:");
    println!("- optimization_json: {}", path.display());
    Ok(ExitCode::SUCCESS)
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Commands::InitSample { out } => {
            write_sample_data(&out)?;
            println!("Sample input files created at {}", out.display());
        }
        Commands::InitSynthetic {
            out,
            seed,
            silos,
            suppliers,
            lots,
        } => {
            let options = SyntheticOptions {
                seed,
                n_silos: silos,
                n_suppliers: suppliers,
                n_lots: lots,
            };
            let dir = generate_synthetic_dataset(&out, options)?;
            println!("Synthetic input files created at {}", dir.display());
        }
        Commands::Validate { input_dir } => {
            if load_checked(&input_dir)?.is_none() {
                return Ok(ExitCode::from(EXIT_VALIDATION_FAILED));
            }
            println!("Validation passed.");
        }
        Commands::Run { run } => return cmd_run(&run),
        Commands::Optimize {
            run,
            targets,
            ranges,
            iterations,
            seed,
        } => return cmd_optimize(&run, &targets, &ranges, iterations, seed),
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    logging::init();
    perf::install();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(error) => {
            tracing::error!("{:#}", error);
            eprintln!("silo-blend error: {:#}", error);
            ExitCode::FAILURE
        }
    }
}
