//! JSONL file writer for audit records.
//!
//! Each [`AuditRecord`] becomes one JSON line with an added RFC 3339
//! `recorded_at` field.

use mindloop_application::AuditSink;
use mindloop_domain::AuditRecord;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Append-only audit log, one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes after every record and
/// on `Drop`.
pub struct JsonlAuditSink {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlAuditSink {
    /// Open (or create) the log at `path`, creating parent directories.
    ///
    /// Returns `None` if the file cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!("Could not create audit log directory {}: {}", parent.display(), e);
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open audit log {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for JsonlAuditSink {
    fn record(&self, record: AuditRecord) {
        let Ok(mut value) = serde_json::to_value(&record) else {
            return;
        };
        if let serde_json::Value::Object(map) = &mut value {
            let recorded_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
            map.insert("recorded_at".to_string(), serde_json::Value::String(recorded_at));
        }
        let Ok(line) = serde_json::to_string(&value) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
                warn!("Could not write audit record to {}: {}", self.path.display(), e);
            }
        }
    }
}

impl Drop for JsonlAuditSink {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindloop_domain::AuditKind;

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_writes_one_json_object_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit").join("run.jsonl");
        let sink = JsonlAuditSink::new(&path).unwrap();

        sink.record(
            AuditRecord::new(AuditKind::Dispatch, "thought_pipeline", "speak", "ok").with_subject("th-1"),
        );
        sink.record(AuditRecord::new(AuditKind::Admin, "operator", "pause", "ok"));

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["kind"], "dispatch");
        assert_eq!(lines[0]["subject"], "th-1");
        assert!(lines[0]["recorded_at"].as_str().unwrap().ends_with('Z'));
        assert_eq!(lines[1]["action"], "pause");
    }

    #[test]
    fn test_reopening_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.jsonl");
        {
            let sink = JsonlAuditSink::new(&path).unwrap();
            sink.record(AuditRecord::new(AuditKind::Admin, "operator", "pause", "ok"));
        }
        let sink = JsonlAuditSink::new(&path).unwrap();
        sink.record(AuditRecord::new(AuditKind::Admin, "operator", "resume", "ok"));
        drop(sink);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["action"], "resume");
    }
}
