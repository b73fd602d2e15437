use serde::Serialize;
use std::sync::Mutex;
use std::time::Instant;

#[cfg(feature = "cli")]
use indicatif::{ProgressBar, ProgressStyle};
#[cfg(feature = "cli")]
use std::time::Duration;
#[cfg(feature = "cli")]
use sysinfo::{Pid, RefreshKind, System};

#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub step: String,
    pub elapsed_ms: u128,
    pub succeeded: bool,
}

/// 記錄每個流程步驟的耗時；CLI 模式下可顯示 spinner 與行程資源使用量
pub struct FlowMonitor {
    started: Instant,
    timings: Mutex<Vec<StepTiming>>,
    #[cfg_attr(not(feature = "cli"), allow(dead_code))]
    spinner: bool,
    #[cfg(feature = "cli")]
    system: Option<(Mutex<System>, Pid)>,
}

impl FlowMonitor {
    pub fn new(system_stats: bool) -> Self {
        Self {
            started: Instant::now(),
            timings: Mutex::new(Vec::new()),
            spinner: false,
            #[cfg(feature = "cli")]
            system: if system_stats {
                sysinfo::get_current_pid().ok().map(|pid| {
                    let mut system = System::new_with_specifics(RefreshKind::everything());
                    system.refresh_all();
                    (Mutex::new(system), pid)
                })
            } else {
                None
            },
        }
    }

    /// 在終端顯示「處理中」的 spinner
    pub fn with_spinner(mut self, enabled: bool) -> Self {
        self.spinner = enabled;
        self
    }

    pub fn start_step(&self, label: impl Into<String>) -> StepGuard<'_> {
        let label = label.into();
        tracing::info!("⏳ {}", label);

        StepGuard {
            monitor: self,
            #[cfg(feature = "cli")]
            progress: self.spinner.then(|| spinner(&label)),
            label,
            started: Instant::now(),
            succeeded: false,
        }
    }

    pub fn timings(&self) -> Vec<StepTiming> {
        self.timings
            .lock()
            .map(|timings| timings.clone())
            .unwrap_or_default()
    }

    fn record(&self, timing: StepTiming) {
        if let Ok(mut timings) = self.timings.lock() {
            timings.push(timing);
        }
    }

    pub fn log_stats(&self, phase: &str) {
        #[cfg(feature = "cli")]
        if let Some((system, pid)) = &self.system {
            let Ok(mut system) = system.lock() else {
                return;
            };
            system.refresh_all();
            if let Some(process) = system.process(*pid) {
                tracing::info!(
                    "📊 {} - CPU: {:.1}%, Memory: {}MB, Time: {:?}",
                    phase,
                    process.cpu_usage(),
                    process.memory() / 1024 / 1024,
                    self.started.elapsed()
                );
            }
        }
        #[cfg(not(feature = "cli"))]
        let _ = phase;
    }

    pub fn log_final_stats(&self) {
        let timings = self.timings();
        tracing::info!(
            "📊 Flow finished - {} steps, total time: {:?}",
            timings.len(),
            self.started.elapsed()
        );
        self.log_stats("Final");
    }
}

impl Default for FlowMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(feature = "cli")]
fn spinner(label: &str) -> ProgressBar {
    let progress = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]") {
        progress.set_style(style);
    }
    progress.set_message(label.to_string());
    progress.enable_steady_tick(Duration::from_millis(120));
    progress
}

/// 步驟結束時（含失敗被 drop）寫入耗時
pub struct StepGuard<'a> {
    monitor: &'a FlowMonitor,
    label: String,
    started: Instant,
    succeeded: bool,
    #[cfg(feature = "cli")]
    progress: Option<ProgressBar>,
}

impl StepGuard<'_> {
    pub fn finish(mut self) {
        self.succeeded = true;
    }
}

impl Drop for StepGuard<'_> {
    fn drop(&mut self) {
        let elapsed = self.started.elapsed();

        #[cfg(feature = "cli")]
        if let Some(progress) = self.progress.take() {
            progress.finish_and_clear();
        }

        if self.succeeded {
            tracing::info!("✅ {} ({:?})", self.label, elapsed);
        } else {
            tracing::warn!("❌ {} failed after {:?}", self.label, elapsed);
        }

        self.monitor.record(StepTiming {
            step: self.label.clone(),
            elapsed_ms: elapsed.as_millis(),
            succeeded: self.succeeded,
        });
        self.monitor.log_stats(&self.label);
    }
}
