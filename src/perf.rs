use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

static PERF_ENABLED: AtomicBool = AtomicBool::new(false);

thread_local! {
    static PERF_DEPTH: Cell<u32> = Cell::new(0);
    static SIM_STEP_COUNT: Cell<u64> = Cell::new(0);
    static SIM_RUN_COUNT: Cell<u64> = Cell::new(0);
}

fn is_true(v: &str) -> bool {
    matches!(
        v.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

/// 安装性能统计开关（仿真步数计数 + 耗时日志）
///
/// 开关：
/// - Debug 默认开启；Release 默认关闭（可通过环境变量开启）
/// - `SILO_BLEND_PERF=1` 强制开启
pub fn install() {
    let enabled = match std::env::var("SILO_BLEND_PERF") {
        Ok(v) => is_true(&v),
        Err(_) => cfg!(debug_assertions),
    };
    PERF_ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn is_enabled() -> bool {
    PERF_ENABLED.load(Ordering::Relaxed)
}

/// 记录一次仿真执行的时间步数（仅在 PerfGuard 作用域内计数）
pub fn record_sim_steps(steps: u64) {
    if !is_enabled() {
        return;
    }
    let active = PERF_DEPTH.with(|d| d.get() > 0);
    if !active {
        return;
    }
    SIM_STEP_COUNT.with(|c| c.set(c.get().saturating_add(steps)));
    SIM_RUN_COUNT.with(|c| c.set(c.get().saturating_add(1)));
}

/// 性能统计 Guard：记录 elapsed_ms + 仿真次数 + 仿真步数
///
/// 使用方式：
/// ```ignore
/// let _perf = silo_blend::perf::PerfGuard::new("run_multi_silo_blend");
/// // do work...
/// ```
pub struct PerfGuard {
    op: &'static str,
    start: Instant,
    steps_start: u64,
    runs_start: u64,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        PERF_DEPTH.with(|d| d.set(d.get().saturating_add(1)));
        let steps_start = SIM_STEP_COUNT.with(|c| c.get());
        let runs_start = SIM_RUN_COUNT.with(|c| c.get());
        Self {
            op,
            start: Instant::now(),
            steps_start,
            runs_start,
        }
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        if is_enabled() {
            let elapsed_ms = self.start.elapsed().as_millis() as u64;
            let sim_steps = SIM_STEP_COUNT
                .with(|c| c.get())
                .saturating_sub(self.steps_start);
            let sim_runs = SIM_RUN_COUNT
                .with(|c| c.get())
                .saturating_sub(self.runs_start);

            tracing::info!(
                target: "perf",
                op = self.op,
                elapsed_ms,
                sim_runs,
                sim_steps,
                "done"
            );
        }

        PERF_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}
