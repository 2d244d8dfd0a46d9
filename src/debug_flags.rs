//! Environment-driven switches, read once per process.

use std::sync::OnceLock;

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "on" | "ON"))
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(default)
}

/// Print every pause with full register dump.
pub fn verbose_pause() -> bool {
    static ON: OnceLock<bool> = OnceLock::new();
    *ON.get_or_init(|| env_flag("DEBUG_PAUSE_VERBOSE", false))
}

/// Override the per-tick cycle budget.
pub fn tick_frequency(default: u32) -> u32 {
    static FREQ: OnceLock<u32> = OnceLock::new();
    *FREQ.get_or_init(|| env_u32("TICK_FREQUENCY", default))
}
