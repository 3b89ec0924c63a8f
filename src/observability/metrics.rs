use prometheus::{
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub submissions_total: IntCounterVec,
    pub submission_latency_seconds: HistogramVec,
    pub registrations_in_shift: IntGauge,
    pub cleanup_deleted_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let submissions_total = IntCounterVec::new(
            Opts::new("submissions_total", "Total submission attempts by outcome"),
            &["outcome"],
        )
        .expect("valid submissions_total metric");

        let submission_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "submission_latency_seconds",
                "Latency of submission processing in seconds",
            ),
            &["outcome"],
        )
        .expect("valid submission_latency_seconds metric");

        let registrations_in_shift = IntGauge::new(
            "registrations_in_shift",
            "Registrations in the current shift window",
        )
        .expect("valid registrations_in_shift metric");

        let cleanup_deleted_total = IntCounter::new(
            "cleanup_deleted_total",
            "Registrations deleted by the cleanup endpoint",
        )
        .expect("valid cleanup_deleted_total metric");

        registry
            .register(Box::new(submissions_total.clone()))
            .expect("register submissions_total");
        registry
            .register(Box::new(submission_latency_seconds.clone()))
            .expect("register submission_latency_seconds");
        registry
            .register(Box::new(registrations_in_shift.clone()))
            .expect("register registrations_in_shift");
        registry
            .register(Box::new(cleanup_deleted_total.clone()))
            .expect("register cleanup_deleted_total");

        Self {
            registry,
            submissions_total,
            submission_latency_seconds,
            registrations_in_shift,
            cleanup_deleted_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
