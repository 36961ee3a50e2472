//! Bounded in-memory audit log.

use mindloop_application::AuditSink;
use mindloop_domain::{AuditKind, AuditRecord};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// Keeps the most recent `capacity` records for querying.
pub struct InMemoryAuditSink {
    records: Mutex<VecDeque<AuditRecord>>,
    capacity: usize,
}

impl InMemoryAuditSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, record: AuditRecord) {
        if self.capacity == 0 {
            return;
        }
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        while records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    fn query(&self, kind: Option<AuditKind>) -> Vec<AuditRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| kind.is_none_or(|k| r.kind == k))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oldest_records_are_evicted() {
        let sink = InMemoryAuditSink::new(2);
        for action in ["pause", "step", "resume"] {
            sink.record(AuditRecord::new(AuditKind::Admin, "operator", action, "ok"));
        }
        let actions: Vec<_> = sink.query(None).into_iter().map(|r| r.action).collect();
        assert_eq!(actions, vec!["step", "resume"]);
    }

    #[test]
    fn test_query_filters_by_kind() {
        let sink = InMemoryAuditSink::new(10);
        sink.record(AuditRecord::new(AuditKind::Admin, "operator", "pause", "ok"));
        sink.record(AuditRecord::new(AuditKind::Transition, "state_machine", "normal-work", "ok"));
        assert_eq!(sink.query(Some(AuditKind::Transition)).len(), 1);
        assert_eq!(sink.query(Some(AuditKind::Dispatch)).len(), 0);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let sink = InMemoryAuditSink::new(0);
        sink.record(AuditRecord::new(AuditKind::Admin, "operator", "pause", "ok"));
        assert!(sink.is_empty());
    }
}
