//! Log scanner: walk a directory of GC logs, extract pause durations per file,
//! and write one summary row per file to the GC-summary artifact.

use crate::classify::LineClassifier;
use crate::collector::Collector;
use crate::config::ReportConfig;
use crate::table::{self, TableError};
use std::path::{Path, PathBuf};

/// Column order of the GC-summary artifact.
pub const GC_REPORT_HEADER: [&str; 6] = [
    "file",
    "gc",
    "collections",
    "total_pause_ms",
    "max_pause_ms",
    "avg_pause_ms",
];

/// Aggregate of every pause observed in one log file.
#[derive(Debug, Clone, PartialEq)]
pub struct GcSummaryRow {
    /// Log path as discovered under the scan root.
    pub file: String,
    /// Reported or inferred collector name; empty when unresolved.
    pub gc: String,
    pub collections: usize,
    pub total_pause_ms: f64,
    pub max_pause_ms: f64,
}

impl GcSummaryRow {
    pub fn avg_pause_ms(&self) -> f64 {
        self.total_pause_ms / self.collections as f64
    }

    /// Cells in `GC_REPORT_HEADER` order, durations fixed to 3 decimals.
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.file.clone(),
            self.gc.clone(),
            self.collections.to_string(),
            format!("{:.3}", self.total_pause_ms),
            format!("{:.3}", self.max_pause_ms),
            format!("{:.3}", self.avg_pause_ms()),
        ]
    }
}

/// Why a log file produced no row.
#[derive(Debug)]
pub enum SkipReason {
    Unreadable(std::io::Error),
    NoPauses,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Unreadable(e) => write!(f, "unreadable: {e}"),
            SkipReason::NoPauses => write!(f, "no pause lines"),
        }
    }
}

/// Result of processing a single log file.
#[derive(Debug)]
pub enum FileOutcome {
    Row(GcSummaryRow),
    Skip(SkipReason),
}

/// Result of a full scan.
#[derive(Debug)]
pub struct ScanSummary {
    pub rows: Vec<GcSummaryRow>,
    pub skipped: usize,
    pub report: PathBuf,
}

/// Classify the lines of one log's text.
///
/// Returns the observed pauses and the last announced collector name, if any.
fn classify_text(text: &str, classifier: &dyn LineClassifier) -> (Vec<f64>, Option<String>) {
    let mut pauses = Vec::new();
    let mut using = None;

    for line in text.split(['\n', '\r']) {
        if let Some(ms) = classifier.try_match_pause(line) {
            pauses.push(ms);
        }
        if let Some(name) = classifier.try_match_using(line) {
            using = Some(name);
        }
    }

    (pauses, using)
}

/// Decode bytes as UTF-8, dropping invalid sequences.
fn decode_dropping_invalid(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text
}

/// Summarize one log file. Invalid UTF-8 is dropped, never fatal.
pub fn scan_file(path: &Path, classifier: &dyn LineClassifier) -> FileOutcome {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => return FileOutcome::Skip(SkipReason::Unreadable(e)),
    };
    let text = decode_dropping_invalid(&bytes);

    let (pauses, using) = classify_text(&text, classifier);
    if pauses.is_empty() {
        return FileOutcome::Skip(SkipReason::NoPauses);
    }

    let gc = using.unwrap_or_else(|| {
        let base = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Collector::infer(&base)
            .map(|c| c.display_name().to_string())
            .unwrap_or_default()
    });

    let total_pause_ms = pauses.iter().sum();
    let max_pause_ms = pauses.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    FileOutcome::Row(GcSummaryRow {
        file: path.display().to_string(),
        gc,
        collections: pauses.len(),
        total_pause_ms,
        max_pause_ms,
    })
}

/// Recursively collect files under `root` whose name ends in one of `extensions`.
///
/// Unreadable directories are logged and skipped. A missing root yields nothing.
pub fn discover_logs(root: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(e) => e,
            Err(e) => {
                if dir != root || e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(error = %e, path = %dir.display(), "failed to read directory");
                }
                continue;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if is_dir {
                pending.push(path);
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if extensions.iter().any(|ext| name.ends_with(&format!(".{ext}"))) {
                found.push(path);
            }
        }
    }

    found
}

/// Scan every log under the configured root and write the GC-summary artifact.
pub fn scan(config: &ReportConfig, classifier: &dyn LineClassifier) -> Result<ScanSummary, TableError> {
    let logs = discover_logs(config.root(), &config.scan.extensions);
    tracing::info!(root = %config.root().display(), files = logs.len(), "scanning GC logs");

    let mut rows = Vec::new();
    let mut skipped = 0;
    for path in logs {
        match scan_file(&path, classifier) {
            FileOutcome::Row(row) => {
                tracing::debug!(
                    file = %row.file,
                    gc = %row.gc,
                    collections = row.collections,
                    "summarized log"
                );
                rows.push(row);
            }
            FileOutcome::Skip(SkipReason::Unreadable(e)) => {
                tracing::warn!(error = %e, path = %path.display(), "skipping unreadable log");
                skipped += 1;
            }
            FileOutcome::Skip(reason) => {
                tracing::debug!(path = %path.display(), %reason, "skipping log");
                skipped += 1;
            }
        }
    }

    rows.sort_by(|a, b| a.file.cmp(&b.file));

    let report = config.gc_report();
    let cells: Vec<Vec<String>> = rows.iter().map(GcSummaryRow::cells).collect();
    table::write_atomic(&report, &GC_REPORT_HEADER, &cells)?;

    Ok(ScanSummary {
        rows,
        skipped,
        report,
    })
}
