use prometheus::{Encoder, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub messages_total: IntCounterVec,
    pub orders_created_total: IntCounterVec,
    pub claims_total: IntCounterVec,
    pub dispatch_queue_depth: IntGauge,
    pub fanout_latency_seconds: HistogramVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let messages_total = IntCounterVec::new(
            Opts::new("messages_total", "Inbound messages by outcome"),
            &["outcome"],
        )
        .expect("valid messages_total metric");

        let orders_created_total = IntCounterVec::new(
            Opts::new("orders_created_total", "Orders created by entry point"),
            &["source"],
        )
        .expect("valid orders_created_total metric");

        let claims_total = IntCounterVec::new(
            Opts::new("claims_total", "Claim attempts by outcome"),
            &["outcome"],
        )
        .expect("valid claims_total metric");

        let dispatch_queue_depth =
            IntGauge::new("dispatch_queue_depth", "Orders waiting for runner fan-out")
                .expect("valid dispatch_queue_depth metric");

        let fanout_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "fanout_latency_seconds",
                "Latency of per-order runner fan-out in seconds",
            ),
            &["outcome"],
        )
        .expect("valid fanout_latency_seconds metric");

        registry
            .register(Box::new(messages_total.clone()))
            .expect("register messages_total");
        registry
            .register(Box::new(orders_created_total.clone()))
            .expect("register orders_created_total");
        registry
            .register(Box::new(claims_total.clone()))
            .expect("register claims_total");
        registry
            .register(Box::new(dispatch_queue_depth.clone()))
            .expect("register dispatch_queue_depth");
        registry
            .register(Box::new(fanout_latency_seconds.clone()))
            .expect("register fanout_latency_seconds");

        Self {
            registry,
            messages_total,
            orders_created_total,
            claims_total,
            dispatch_queue_depth,
            fanout_latency_seconds,
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
