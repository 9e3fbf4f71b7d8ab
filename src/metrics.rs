// Prometheus metrics for the terminal service
//
// Exposes metrics on the /metrics HTTP endpoint:
// - Commands by verdict (counter)
// - Execution latencies (histogram)
// - Timeouts and spawn failures (counter)
// - History size (gauge)

use lazy_static::lazy_static;
use prometheus::{
    core::Collector, Encoder, Histogram, IntCounter, IntCounterVec, IntGauge, Registry,
    TextEncoder,
};
use std::sync::Arc;

lazy_static! {
    pub static ref REGISTRY: Arc<Registry> = Arc::new(Registry::new());

    pub static ref COMMANDS_TOTAL: IntCounterVec = IntCounterVec::new(
        prometheus::Opts::new("commands_total", "Commands submitted, by validator verdict"),
        &["verdict"]
    ).expect("Failed to create commands total metric");

    pub static ref COMMAND_DURATION_SECONDS: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new("command_duration_seconds", "Wall-clock duration of executed commands"),
    ).expect("Failed to create command duration metric");

    pub static ref COMMAND_TIMEOUTS_TOTAL: IntCounter = IntCounter::new(
        "command_timeouts_total",
        "Commands killed at the execution deadline"
    ).expect("Failed to create command timeouts metric");

    pub static ref COMMAND_SPAWN_FAILURES_TOTAL: IntCounter = IntCounter::new(
        "command_spawn_failures_total",
        "Commands that could not be tokenized or spawned"
    ).expect("Failed to create spawn failures metric");

    pub static ref HISTORY_ENTRIES: IntGauge = IntGauge::new(
        "history_entries",
        "Entries in the command history log"
    ).expect("Failed to create history entries metric");
}

/// Register a collector, tolerating a repeated registration
fn register<C: Collector + Clone + 'static>(collector: &C) -> prometheus::Result<()> {
    match REGISTRY.register(Box::new(collector.clone())) {
        Ok(()) | Err(prometheus::Error::AlreadyReg) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Initialize metrics registry
///
/// Safe to call more than once; every router construction calls it.
pub fn init() -> prometheus::Result<()> {
    register(&*COMMANDS_TOTAL)?;
    register(&*COMMAND_DURATION_SECONDS)?;
    register(&*COMMAND_TIMEOUTS_TOTAL)?;
    register(&*COMMAND_SPAWN_FAILURES_TOTAL)?;
    register(&*HISTORY_ENTRIES)?;
    Ok(())
}

/// Gather all metrics in Prometheus text format
pub fn gather_metrics() -> anyhow::Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| anyhow::anyhow!("Failed to encode metrics: {}", e))?;
    String::from_utf8(buffer).map_err(|e| anyhow::anyhow!("Invalid UTF-8 in metrics: {}", e))
}
