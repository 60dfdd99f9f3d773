//! Operational metrics with Prometheus
//!
//! NOTE: We intentionally avoid user_id in metric labels to prevent
//! high-cardinality explosion that can crash Prometheus.

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global metrics registry
    pub static ref METRICS_REGISTRY: Registry = Registry::new();

    // ============================================================================
    // Request Metrics
    // ============================================================================

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "tasknest_http_request_duration_seconds",
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        &["method", "endpoint", "status"]
    ).unwrap();

    /// Total HTTP requests
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("tasknest_http_requests_total", "Total HTTP requests"),
        &["method", "endpoint", "status"]
    ).unwrap();

    /// Authentication failures
    pub static ref AUTH_FAILURES_TOTAL: IntCounter = IntCounter::new(
        "tasknest_auth_failures_total",
        "Total rejected authentication attempts"
    ).unwrap();

    // ============================================================================
    // Task Store Metrics
    // ============================================================================

    /// Task store operations by kind and result
    pub static ref TASK_OPERATIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("tasknest_task_operations_total", "Total task store operations"),
        &["operation", "result"]
    ).unwrap();

    // ============================================================================
    // Agent Tool Metrics
    // ============================================================================

    /// Tool facade invocations by tool and outcome
    /// outcome: ok | validation | not_found | ambiguous | blocked | error
    pub static ref TOOL_INVOCATIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("tasknest_tool_invocations_total", "Total agent tool invocations"),
        &["tool", "outcome"]
    ).unwrap();
}

/// Register all metrics with the global registry. Call once at startup.
pub fn register_metrics() -> prometheus::Result<()> {
    METRICS_REGISTRY.register(Box::new(HTTP_REQUEST_DURATION.clone()))?;
    METRICS_REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()))?;
    METRICS_REGISTRY.register(Box::new(AUTH_FAILURES_TOTAL.clone()))?;
    METRICS_REGISTRY.register(Box::new(TASK_OPERATIONS_TOTAL.clone()))?;
    METRICS_REGISTRY.register(Box::new(TOOL_INVOCATIONS_TOTAL.clone()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics_once() {
        assert!(register_metrics().is_ok());
        // Double registration is an error, not a panic
        assert!(register_metrics().is_err());
    }
}
