//! Prometheus metrics for the report pipeline.

use careplan_models::PlanSource;
use careplan_utils::{CarePlanError, CarePlanResult};
use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

fn metrics_error(e: prometheus::Error) -> CarePlanError {
    CarePlanError::configuration(format!("Failed to register metrics: {}", e))
}

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    reports_analyzed: IntCounter,
    reports_rejected: IntCounterVec,
    plans_generated: IntCounterVec,
    knowledge_documents: IntGauge,
}

impl Metrics {
    pub fn new(namespace: &str) -> CarePlanResult<Self> {
        let registry = Registry::new_custom(Some(namespace.to_string()), None).map_err(metrics_error)?;

        let reports_analyzed = IntCounter::with_opts(Opts::new(
            "reports_analyzed_total",
            "Reports that produced a care plan",
        ))
        .map_err(metrics_error)?;
        let reports_rejected = IntCounterVec::new(
            Opts::new("reports_rejected_total", "Reports rejected before planning"),
            &["reason"],
        )
        .map_err(metrics_error)?;
        let plans_generated = IntCounterVec::new(
            Opts::new("plans_generated_total", "Care plans by treatment section source"),
            &["source"],
        )
        .map_err(metrics_error)?;
        let knowledge_documents = IntGauge::with_opts(Opts::new(
            "knowledge_documents",
            "Documents held in the knowledge store",
        ))
        .map_err(metrics_error)?;

        registry.register(Box::new(reports_analyzed.clone())).map_err(metrics_error)?;
        registry.register(Box::new(reports_rejected.clone())).map_err(metrics_error)?;
        registry.register(Box::new(plans_generated.clone())).map_err(metrics_error)?;
        registry.register(Box::new(knowledge_documents.clone())).map_err(metrics_error)?;

        Ok(Self {
            registry,
            reports_analyzed,
            reports_rejected,
            plans_generated,
            knowledge_documents,
        })
    }

    pub fn record_rejection(&self, error: &CarePlanError) {
        self.reports_rejected
            .with_label_values(&[&error.error_code().to_lowercase()])
            .inc();
    }

    pub fn record_plan(&self, source: PlanSource) {
        self.reports_analyzed.inc();
        self.plans_generated.with_label_values(&[source.as_str()]).inc();
    }

    pub fn set_knowledge_documents(&self, count: usize) {
        self.knowledge_documents.set(count as i64);
    }

    /// Prometheus text exposition format.
    pub fn encode(&self) -> CarePlanResult<String> {
        TextEncoder::new()
            .encode_to_string(&self.registry.gather())
            .map_err(|e| CarePlanError::internal(format!("Failed to encode metrics: {}", e)))
    }
}
