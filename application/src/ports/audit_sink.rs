//! Port for audit records.
//!
//! Separate from `tracing`: tracing carries human-readable diagnostics,
//! while this port receives one immutable [`AuditRecord`] per dispatch,
//! escalation and state transition.
//!
//! `record` is synchronous and non-fallible so auditing never disrupts the
//! round loop; sinks swallow their own I/O failures.

use mindloop_domain::{AuditKind, AuditRecord};
use std::sync::Arc;

/// Port for writing (and optionally querying) audit records.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: AuditRecord);

    /// Records of one kind (or all kinds), oldest first.
    ///
    /// Write-only sinks return nothing.
    fn query(&self, _kind: Option<AuditKind>) -> Vec<AuditRecord> {
        Vec::new()
    }
}

/// No-op sink for tests and when auditing is disabled.
pub struct NoAuditSink;

impl AuditSink for NoAuditSink {
    fn record(&self, _record: AuditRecord) {}
}

/// Fans every record out to several sinks.
pub struct CompositeAuditSink {
    sinks: Vec<Arc<dyn AuditSink>>,
}

impl CompositeAuditSink {
    pub fn new(sinks: Vec<Arc<dyn AuditSink>>) -> Self {
        Self { sinks }
    }
}

impl AuditSink for CompositeAuditSink {
    fn record(&self, record: AuditRecord) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.record(record.clone());
            }
            last.record(record);
        }
    }

    fn query(&self, kind: Option<AuditKind>) -> Vec<AuditRecord> {
        self.sinks.iter().flat_map(|sink| sink.query(kind)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording(Mutex<Vec<AuditRecord>>);

    impl AuditSink for Recording {
        fn record(&self, record: AuditRecord) {
            self.0.lock().unwrap().push(record);
        }

        fn query(&self, kind: Option<AuditKind>) -> Vec<AuditRecord> {
            self.0
                .lock()
                .unwrap()
                .iter()
                .filter(|r| kind.is_none_or(|k| r.kind == k))
                .cloned()
                .collect()
        }
    }

    #[test]
    fn test_composite_fans_out() {
        let a = Arc::new(Recording::default());
        let b = Arc::new(Recording::default());
        let composite = CompositeAuditSink::new(vec![a.clone(), b.clone(), Arc::new(NoAuditSink)]);

        composite.record(AuditRecord::new(AuditKind::Admin, "operator", "pause", "ok"));

        assert_eq!(a.query(None).len(), 1);
        assert_eq!(b.query(Some(AuditKind::Admin)).len(), 1);
        assert_eq!(composite.query(Some(AuditKind::Dispatch)).len(), 0);
        assert_eq!(composite.query(None).len(), 2);
    }
}
