//! Host resource sampling for the periodic metrics cycle
//!
//! All functions are synchronous and cheap enough to run inline from an
//! interval task. When the `metrics` feature is disabled every probe
//! returns zero so the rest of the pipeline keeps working unchanged.

#[cfg(feature = "metrics")]
use once_cell::sync::Lazy;
#[cfg(feature = "metrics")]
use parking_lot::Mutex;
#[cfg(feature = "metrics")]
use sysinfo::System;

#[cfg(feature = "metrics")]
static SYSTEM: Lazy<Mutex<System>> = Lazy::new(|| Mutex::new(System::new_all()));

/// Sample (used, total) physical memory in bytes.
#[cfg(feature = "metrics")]
pub fn sample_memory() -> (u64, u64) {
    let mut sys = SYSTEM.lock();
    sys.refresh_memory();
    (sys.used_memory(), sys.total_memory())
}

#[cfg(not(feature = "metrics"))]
pub fn sample_memory() -> (u64, u64) {
    (0, 0)
}

/// Sample global CPU usage as a percentage across all cores.
#[cfg(feature = "metrics")]
pub fn sample_cpu_usage() -> f64 {
    let mut sys = SYSTEM.lock();
    sys.refresh_cpu_usage();
    f64::from(sys.global_cpu_usage())
}

#[cfg(not(feature = "metrics"))]
pub fn sample_cpu_usage() -> f64 {
    0.0
}

/// Sample the resident set size of the current process in bytes.
#[cfg(feature = "metrics")]
pub fn sample_process_rss() -> u64 {
    let pid = sysinfo::get_current_pid().ok();
    let Some(pid) = pid else { return 0 };
    let mut sys = SYSTEM.lock();
    sys.refresh_processes(sysinfo::ProcessesToUpdate::Some(&[pid]), true);
    sys.process(pid).map(|p| p.memory()).unwrap_or(0)
}

#[cfg(not(feature = "metrics"))]
pub fn sample_process_rss() -> u64 {
    0
}

/// Count of processes visible on the host.
#[cfg(feature = "metrics")]
pub fn sample_process_count() -> usize {
    let mut sys = SYSTEM.lock();
    sys.refresh_processes(sysinfo::ProcessesToUpdate::All, true);
    sys.processes().len()
}

#[cfg(not(feature = "metrics"))]
pub fn sample_process_count() -> usize {
    0
}
