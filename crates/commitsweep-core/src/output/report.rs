//! Flat-text findings report, rewritten every cycle

use crate::coordination::scheduler::{TaskError, TaskReport};
use crate::error::Result;
use crate::types::Finding;
use std::fmt::Write as _;
use std::path::Path;

/// One block per work item
#[derive(Debug, Default)]
pub struct FindingsReport {
    body: String,
    blocks: usize,
}

impl FindingsReport {
    /// Render reports in the order given
    pub fn from_reports(reports: &[TaskReport]) -> Self {
        let mut report = Self::default();
        for r in reports {
            report.push(r);
        }
        report
    }

    fn push(&mut self, report: &TaskReport) {
        let item = &report.item;
        // Writing into a String cannot fail
        let _ = match &report.result {
            Ok(Finding {
                raw_output: Some(raw),
                ..
            }) => writeln!(
                self.body,
                "Findings for {} commit {}:\n{}",
                item.full_name(),
                item.commit_id,
                raw.trim_end()
            ),
            Ok(_) => writeln!(
                self.body,
                "No findings for {} commit {}.",
                item.full_name(),
                item.commit_id
            ),
            Err(TaskError::Cancelled) => writeln!(
                self.body,
                "No findings for {} commit {} (not scanned: cancelled).",
                item.full_name(),
                item.commit_id
            ),
            Err(e) => writeln!(
                self.body,
                "No findings for {} commit {} (error: {}).",
                item.full_name(),
                item.commit_id,
                e
            ),
        };
        self.blocks += 1;
    }

    /// Number of blocks rendered
    pub fn len(&self) -> usize {
        self.blocks
    }

    /// True when no work item was recorded
    pub fn is_empty(&self) -> bool {
        self.blocks == 0
    }

    /// Rendered text
    pub fn as_str(&self) -> &str {
        &self.body
    }

    /// Overwrite `path` with the report. An empty report truncates the file.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, &self.body)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::WorkItem;
    use tempfile::TempDir;

    fn ok(item: &WorkItem, raw: &str) -> TaskReport {
        TaskReport {
            item: item.clone(),
            result: Ok(Finding::from_scan(item, raw.to_string())),
        }
    }

    #[test]
    fn test_findings_and_clean_blocks() {
        let a = WorkItem::new("acme", "widgets", "abc123");
        let b = WorkItem::new("acme", "gadgets", "def456");
        let report = FindingsReport::from_reports(&[
            ok(&a, "{\"DetectorName\":\"Github\"}\n"),
            ok(&b, ""),
        ]);

        assert_eq!(report.len(), 2);
        assert_eq!(
            report.as_str(),
            "Findings for acme/widgets commit abc123:\n{\"DetectorName\":\"Github\"}\n\
             No findings for acme/gadgets commit def456.\n"
        );
    }

    #[test]
    fn test_failure_renders_no_findings_marker() {
        let item = WorkItem::new("acme", "widgets", "abc123");
        let report = FindingsReport::from_reports(&[TaskReport {
            item: item.clone(),
            result: Err(TaskError::Fetch(Error::Retrieval(
                "commit metadata returned 404 Not Found".to_string(),
            ))),
        }]);
        assert!(report
            .as_str()
            .starts_with("No findings for acme/widgets commit abc123 (error: fetch failed:"));
    }

    #[test]
    fn test_write_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("findings.txt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "stale content from last cycle\n").unwrap();

        let item = WorkItem::new("acme", "widgets", "abc123");
        FindingsReport::from_reports(&[ok(&item, "")])
            .write_to(&path)
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "No findings for acme/widgets commit abc123.\n");
    }

    #[test]
    fn test_empty_report_truncates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("findings.txt");
        std::fs::write(&path, "old").unwrap();

        let report = FindingsReport::from_reports(&[]);
        assert!(report.is_empty());
        report.write_to(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }
}
