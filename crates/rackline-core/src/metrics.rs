//! Model mutation counters.
//!
//! Counters are the only state shared between concurrently handled requests.
//! They are backed by Prometheus counter families, so every increment is a
//! single atomic add.

use crate::ObjectChangeAction;
use prometheus::{IntCounterVec, Opts, Registry};

/// Receives one increment per recorded mutation.
pub trait MetricsSink: Send + Sync {
    fn increment(&self, model: &str, action: ObjectChangeAction);
}

/// Discards all increments.
#[derive(Debug, Default)]
pub struct NullMetrics;

impl MetricsSink for NullMetrics {
    fn increment(&self, _model: &str, _action: ObjectChangeAction) {}
}

/// `model_inserts_total`, `model_updates_total` and `model_deletes_total`,
/// each labelled by `model`.
pub struct ModelCounters {
    inserts: IntCounterVec,
    updates: IntCounterVec,
    deletes: IntCounterVec,
    registry: Registry,
}

fn model_counter(name: &str, help: &str) -> Result<IntCounterVec, prometheus::Error> {
    IntCounterVec::new(Opts::new(name, help), &["model"])
}

impl ModelCounters {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let inserts = model_counter("model_inserts_total", "Objects created, by model")?;
        let updates = model_counter("model_updates_total", "Objects updated, by model")?;
        let deletes = model_counter("model_deletes_total", "Objects deleted, by model")?;

        registry.register(Box::new(inserts.clone()))?;
        registry.register(Box::new(updates.clone()))?;
        registry.register(Box::new(deletes.clone()))?;

        Ok(Self {
            inserts,
            updates,
            deletes,
            registry,
        })
    }

    fn family(&self, action: ObjectChangeAction) -> &IntCounterVec {
        match action {
            ObjectChangeAction::Create => &self.inserts,
            ObjectChangeAction::Update => &self.updates,
            ObjectChangeAction::Delete => &self.deletes,
        }
    }

    pub fn get(&self, model: &str, action: ObjectChangeAction) -> u64 {
        self.family(action)
            .get_metric_with_label_values(&[model])
            .map(|c| c.get())
            .unwrap_or(0)
    }

    /// Registry holding the three families, for mounting in an exporter.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl MetricsSink for ModelCounters {
    fn increment(&self, model: &str, action: ObjectChangeAction) {
        self.family(action).with_label_values(&[model]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::{Encoder, TextEncoder};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_concurrent_increments() {
        let counters = Arc::new(ModelCounters::new().unwrap());
        counters.increment("site", ObjectChangeAction::Create);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counters = Arc::clone(&counters);
                thread::spawn(move || {
                    for _ in 0..500 {
                        counters.increment("site", ObjectChangeAction::Create);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(counters.get("site", ObjectChangeAction::Create), 4001);
        assert_eq!(counters.get("site", ObjectChangeAction::Delete), 0);
    }

    #[test]
    fn test_exposition_uses_model_label() {
        let counters = ModelCounters::new().unwrap();
        counters.increment("device", ObjectChangeAction::Update);
        counters.increment("device", ObjectChangeAction::Update);
        counters.increment("site", ObjectChangeAction::Delete);

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&counters.registry().gather(), &mut buffer)
            .unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("# TYPE model_updates_total counter"));
        assert!(text.contains("model_updates_total{model=\"device\"} 2"));
        assert!(text.contains("model_deletes_total{model=\"site\"} 1"));
        assert!(!text.contains("model_inserts_total{"));
    }

    #[test]
    fn test_families_are_independent_per_model() {
        let counters = ModelCounters::new().unwrap();
        counters.increment("device", ObjectChangeAction::Create);
        assert_eq!(counters.get("device", ObjectChangeAction::Create), 1);
        assert_eq!(counters.get("device", ObjectChangeAction::Update), 0);
        assert_eq!(counters.get("site", ObjectChangeAction::Create), 0);
    }
}
