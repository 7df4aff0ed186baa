//! Protocol audit records.
//!
//! JWT-formatted introspection responses are recorded through an
//! [`AuditSink`] before they are returned. Sinks must never fail the
//! request they are recording.

use indexmap::IndexMap;

use crate::config::AuditConfig;

/// Label of the audit record emitted for JWT introspection responses.
pub const INTROSPECTION_RESPONSE_LABEL: &str = "OpenID Connect Introspection Response";

/// Tracing target used by [`TracingAuditSink`].
pub const AUDIT_TARGET: &str = "oidc_introspection::audit";

/// A single protocol audit record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    /// What is being recorded.
    pub label: String,

    /// Context entries, kept in insertion order.
    pub context: IndexMap<String, String>,

    /// The recorded payload, if any.
    pub payload: Option<String>,
}

impl AuditRecord {
    /// Creates a record with no context or payload.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            context: IndexMap::new(),
            payload: None,
        }
    }

    /// Adds a context entry.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets the payload.
    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }
}

/// Destination for protocol audit records.
pub trait AuditSink: Send + Sync {
    /// Records an audit entry. Must not panic or block for long.
    fn record(&self, record: &AuditRecord);
}

/// Sink writing records as structured `tracing` events.
#[derive(Debug, Clone)]
pub struct TracingAuditSink {
    include_payload: bool,
}

impl TracingAuditSink {
    /// Creates a sink. When `include_payload` is false the payload is omitted.
    #[must_use]
    pub fn new(include_payload: bool) -> Self {
        Self { include_payload }
    }
}

impl Default for TracingAuditSink {
    fn default() -> Self {
        Self::new(true)
    }
}

impl AuditSink for TracingAuditSink {
    fn record(&self, record: &AuditRecord) {
        let context = record
            .context
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", ");

        match (&record.payload, self.include_payload) {
            (Some(payload), true) => tracing::info!(
                target: AUDIT_TARGET,
                label = %record.label,
                context = %context,
                payload = %payload,
                "audit"
            ),
            _ => tracing::info!(
                target: AUDIT_TARGET,
                label = %record.label,
                context = %context,
                "audit"
            ),
        }
    }
}

/// Sink that discards every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _record: &AuditRecord) {}
}

/// Builds the sink selected by configuration.
#[must_use]
pub fn sink_from_config(config: &AuditConfig) -> std::sync::Arc<dyn AuditSink> {
    if config.enabled {
        std::sync::Arc::new(TracingAuditSink::new(config.include_payload))
    } else {
        std::sync::Arc::new(NoopAuditSink)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::{AuditRecord, AuditSink};

    /// Sink that keeps every record for inspection.
    #[derive(Debug, Default)]
    pub struct RecordingAuditSink {
        records: Mutex<Vec<AuditRecord>>,
    }

    impl RecordingAuditSink {
        pub fn records(&self) -> Vec<AuditRecord> {
            self.records.lock().unwrap().clone()
        }
    }

    impl AuditSink for RecordingAuditSink {
        fn record(&self, record: &AuditRecord) {
            self.records.lock().unwrap().push(record.clone());
        }
    }
}
