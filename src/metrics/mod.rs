// Private module declaration
mod server;

use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};

// Re-export for public API
pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Counters and gauges for:
// - HTTP request outcomes by route and status
// - Order status transitions (and rejected transitions)
// - Outbox dispatch throughput and failures
// - Dead letter volume
// - Courier gateway latency and circuit breaker state
//
// Scraped via /metrics on the ops port.
// ============================================================================

/// Central metrics registry for the entire application
pub struct Metrics {
    registry: Registry,

    // HTTP Metrics
    pub http_requests: IntCounterVec,

    // Order Workflow Metrics
    pub order_transitions: IntCounterVec,
    pub order_transitions_rejected: IntCounterVec,

    // Outbox Metrics
    pub outbox_dispatched: IntCounterVec,
    pub outbox_dispatch_failures: IntCounterVec,
    pub outbox_pending: IntGauge,

    // Dead Letter Metrics
    pub dead_letters_total: IntCounter,

    // Courier Gateway Metrics
    pub courier_call_duration: HistogramVec,
    pub courier_circuit_state: IntGauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let http_requests = IntCounterVec::new(
            Opts::new("http_requests_total", "HTTP requests by route and status"),
            &["route", "status"],
        )?;
        registry.register(Box::new(http_requests.clone()))?;

        let order_transitions = IntCounterVec::new(
            Opts::new("order_transitions_total", "Committed order status transitions"),
            &["from", "to"],
        )?;
        registry.register(Box::new(order_transitions.clone()))?;

        let order_transitions_rejected = IntCounterVec::new(
            Opts::new(
                "order_transitions_rejected_total",
                "Order transitions rejected by validation",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(order_transitions_rejected.clone()))?;

        let outbox_dispatched = IntCounterVec::new(
            Opts::new("outbox_dispatched_total", "Outbox messages dispatched"),
            &["event_type"],
        )?;
        registry.register(Box::new(outbox_dispatched.clone()))?;

        let outbox_dispatch_failures = IntCounterVec::new(
            Opts::new(
                "outbox_dispatch_failures_total",
                "Outbox dispatch attempts that failed",
            ),
            &["event_type"],
        )?;
        registry.register(Box::new(outbox_dispatch_failures.clone()))?;

        let outbox_pending = IntGauge::new(
            "outbox_pending",
            "Outbox messages awaiting dispatch",
        )?;
        registry.register(Box::new(outbox_pending.clone()))?;

        let dead_letters_total = IntCounter::new(
            "dead_letters_total",
            "Outbox messages parked in the dead letter table",
        )?;
        registry.register(Box::new(dead_letters_total.clone()))?;

        let courier_call_duration = HistogramVec::new(
            HistogramOpts::new("courier_call_duration_seconds", "Courier API call duration")
                .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
            &["operation"],
        )?;
        registry.register(Box::new(courier_call_duration.clone()))?;

        let courier_circuit_state = IntGauge::new(
            "courier_circuit_state",
            "Courier circuit breaker state (0=Closed, 1=Open, 2=HalfOpen)",
        )?;
        registry.register(Box::new(courier_circuit_state.clone()))?;

        Ok(Self {
            registry,
            http_requests,
            order_transitions,
            order_transitions_rejected,
            outbox_dispatched,
            outbox_dispatch_failures,
            outbox_pending,
            dead_letters_total,
            courier_call_duration,
            courier_circuit_state,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Helper to record an HTTP request outcome
    pub fn record_http_request(&self, route: &str, status: u16) {
        self.http_requests
            .with_label_values(&[route, &status.to_string()])
            .inc();
    }

    /// Helper to record a committed transition
    pub fn record_transition(&self, from: &str, to: &str) {
        self.order_transitions.with_label_values(&[from, to]).inc();
    }

    /// Helper to record a rejected transition
    pub fn record_rejected_transition(&self, reason: &str) {
        self.order_transitions_rejected
            .with_label_values(&[reason])
            .inc();
    }

    /// Helper to record an outbox dispatch outcome
    pub fn record_dispatch(&self, event_type: &str, success: bool) {
        if success {
            self.outbox_dispatched.with_label_values(&[event_type]).inc();
        } else {
            self.outbox_dispatch_failures
                .with_label_values(&[event_type])
                .inc();
        }
    }

    /// Helper to record a dead-lettered message
    pub fn record_dead_letter(&self) {
        self.dead_letters_total.inc();
    }

    /// Helper to record courier call duration
    pub fn record_courier_call(&self, operation: &str, duration_secs: f64) {
        self.courier_call_duration
            .with_label_values(&[operation])
            .observe(duration_secs);
    }

    /// Helper to update the courier circuit breaker gauge
    pub fn update_courier_circuit_state(&self, state: u8) {
        self.courier_circuit_state.set(state as i64);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert!(metrics.registry.gather().len() > 0);
    }

    #[test]
    fn test_record_http_request() {
        let metrics = Metrics::new().unwrap();
        metrics.record_http_request("orders.update_status", 200);
        metrics.record_http_request("orders.update_status", 409);

        let gathered = metrics.registry.gather();
        let requests = gathered
            .iter()
            .find(|m| m.name() == "http_requests_total")
            .unwrap();
        assert_eq!(requests.metric.len(), 2);
    }

    #[test]
    fn test_record_transition() {
        let metrics = Metrics::new().unwrap();
        metrics.record_transition("PENDING", "SHIPPED");

        let gathered = metrics.registry.gather();
        let transitions = gathered
            .iter()
            .find(|m| m.name() == "order_transitions_total")
            .unwrap();
        assert_eq!(transitions.metric[0].counter.value, Some(1.0));
    }

    #[test]
    fn test_record_dispatch_outcomes() {
        let metrics = Metrics::new().unwrap();
        metrics.record_dispatch("OrderShipped", true);
        metrics.record_dispatch("OrderShipped", false);
        metrics.record_dispatch("OrderShipped", true);

        let gathered = metrics.registry.gather();
        let dispatched = gathered
            .iter()
            .find(|m| m.name() == "outbox_dispatched_total")
            .unwrap();
        assert_eq!(dispatched.metric[0].counter.value, Some(2.0));

        let failures = gathered
            .iter()
            .find(|m| m.name() == "outbox_dispatch_failures_total")
            .unwrap();
        assert_eq!(failures.metric[0].counter.value, Some(1.0));
    }

    #[test]
    fn test_courier_circuit_gauge() {
        let metrics = Metrics::new().unwrap();
        metrics.update_courier_circuit_state(1);

        let gathered = metrics.registry.gather();
        let state = gathered
            .iter()
            .find(|m| m.name() == "courier_circuit_state")
            .unwrap();
        assert_eq!(state.metric[0].gauge.value, Some(1.0));
    }
}
