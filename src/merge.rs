//! Report merger: join per-collector latency results with the GC-summary
//! artifact into the final comparison table.

use crate::collector::Collector;
use crate::config::ReportConfig;
use crate::latency::{self, number_cell, LatencySummary};
use crate::table::{self, TableError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Column order of the final report.
pub const FINAL_REPORT_HEADER: [&str; 9] = [
    "gc",
    "req_per_sec",
    "p50_ms",
    "p95_ms",
    "p99_ms",
    "collections",
    "total_pause_ms",
    "max_pause_ms",
    "avg_pause_ms",
];

/// GC pause figures for one collector, carried verbatim from the GC-summary artifact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GcAggregate {
    pub collections: String,
    pub total_pause_ms: String,
    pub max_pause_ms: String,
    pub avg_pause_ms: String,
}

/// One display-ready row of the final report.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalReportRow {
    pub collector: Collector,
    pub latency: Option<LatencySummary>,
    pub gc: Option<GcAggregate>,
}

impl FinalReportRow {
    /// Upper-cased collector token, e.g. `SHEN`.
    pub fn gc_name(&self) -> String {
        self.collector.token().to_uppercase()
    }

    /// Cells in `FINAL_REPORT_HEADER` order; missing data renders empty.
    pub fn cells(&self) -> Vec<String> {
        let lat = self.latency.clone().unwrap_or_default();
        let gc = self.gc.clone().unwrap_or_default();
        vec![
            self.gc_name(),
            number_cell(&lat.req_per_sec),
            number_cell(&lat.p50_ms),
            number_cell(&lat.p95_ms),
            number_cell(&lat.p99_ms),
            gc.collections,
            gc.total_pause_ms,
            gc.max_pause_ms,
            gc.avg_pause_ms,
        ]
    }

    /// One-line console digest.
    pub fn digest(&self) -> String {
        let lat = self.latency.clone().unwrap_or_default();
        let avg = self
            .gc
            .as_ref()
            .map(|g| g.avg_pause_ms.as_str())
            .unwrap_or("");
        format!(
            "{:6} | {} req/s | p99={} ms | avgGC={} ms",
            self.gc_name(),
            number_cell(&lat.req_per_sec),
            number_cell(&lat.p99_ms),
            avg
        )
    }
}

/// Outcome of a merge run.
#[derive(Debug)]
pub enum MergeOutcome {
    Written {
        path: PathBuf,
        rows: Vec<FinalReportRow>,
    },
    /// Neither source had data for any known collector; nothing was written.
    NothingToMerge,
}

/// Errors that abort a merge.
#[derive(Debug)]
pub enum MergeError {
    Write(TableError),
}

impl std::fmt::Display for MergeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeError::Write(e) => write!(f, "failed to write final report: {e}"),
        }
    }
}

impl std::error::Error for MergeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MergeError::Write(e) => Some(e),
        }
    }
}

impl From<TableError> for MergeError {
    fn from(e: TableError) -> Self {
        MergeError::Write(e)
    }
}

/// Build per-collector aggregates from GC-summary text.
///
/// Identity comes from the `gc` column, falling back to the base name of the
/// `file` column. Unresolved rows are dropped; a later row replaces an earlier
/// one for the same collector.
pub fn parse_gc_report(text: &str) -> BTreeMap<Collector, GcAggregate> {
    let mut aggregates = BTreeMap::new();

    for record in table::parse(text).rows {
        let collector = Collector::infer(record.get("gc")).or_else(|| {
            let base = Path::new(record.get("file"))
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            Collector::infer(&base)
        });
        let Some(collector) = collector else {
            tracing::debug!(file = %record.get("file"), gc = %record.get("gc"), "GC row has no known collector");
            continue;
        };

        aggregates.insert(
            collector,
            GcAggregate {
                collections: record.get("collections").to_string(),
                total_pause_ms: record.get("total_pause_ms").to_string(),
                max_pause_ms: record.get("max_pause_ms").to_string(),
                avg_pause_ms: record.get("avg_pause_ms").to_string(),
            },
        );
    }

    aggregates
}

/// Read the GC-summary artifact. A missing or unreadable file means no GC data.
pub fn load_gc_aggregates(path: &Path) -> BTreeMap<Collector, GcAggregate> {
    match std::fs::read(path) {
        Ok(bytes) => parse_gc_report(&String::from_utf8_lossy(&bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "no GC report found, merging latency only");
            BTreeMap::new()
        }
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "failed to read GC report");
            BTreeMap::new()
        }
    }
}

/// Join both sources in report order, keeping collectors present in either.
pub fn join(
    mut latency: BTreeMap<Collector, LatencySummary>,
    mut gc: BTreeMap<Collector, GcAggregate>,
) -> Vec<FinalReportRow> {
    let mut rows = Vec::new();
    for collector in Collector::ALL {
        let row = FinalReportRow {
            collector,
            latency: latency.remove(&collector),
            gc: gc.remove(&collector),
        };
        if row.latency.is_some() || row.gc.is_some() {
            rows.push(row);
        }
    }
    rows
}

/// Merge latency results and the GC-summary artifact into the final report.
pub fn merge(config: &ReportConfig) -> Result<MergeOutcome, MergeError> {
    let latency = latency::load_latency(&config.latency_dir());
    let gc = load_gc_aggregates(&config.gc_report());
    tracing::debug!(latency = latency.len(), gc = gc.len(), "loaded merge inputs");

    let rows = join(latency, gc);
    if rows.is_empty() {
        return Ok(MergeOutcome::NothingToMerge);
    }

    let path = config.final_report();
    let cells: Vec<Vec<String>> = rows.iter().map(FinalReportRow::cells).collect();
    table::write_atomic(&path, &FINAL_REPORT_HEADER, &cells)?;

    Ok(MergeOutcome::Written { path, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{GcSummaryRow, GC_REPORT_HEADER};
    use tempfile::tempdir;

    fn num(text: &str) -> serde_json::Number {
        serde_json::from_str(text).unwrap()
    }

    const HEADER: &str = "file,gc,collections,total_pause_ms,max_pause_ms,avg_pause_ms\n";

    fn setup(gc_report: Option<&str>, latency: &[(&str, &str)]) -> (tempfile::TempDir, ReportConfig) {
        let dir = tempdir().unwrap();
        let config = ReportConfig::default().with_root(dir.path().join("out"));
        std::fs::create_dir_all(config.latency_dir()).unwrap();
        if let Some(text) = gc_report {
            std::fs::write(config.gc_report(), text).unwrap();
        }
        for (name, body) in latency {
            std::fs::write(config.latency_dir().join(name), body).unwrap();
        }
        (dir, config)
    }

    #[test]
    fn test_gc_column_resolves_identity() {
        let text = format!("{HEADER}out/run-1.log,Shenandoah,4,2.000,1.000,0.500\n");
        let aggs = parse_gc_report(&text);
        assert_eq!(aggs.len(), 1);
        assert_eq!(aggs[&Collector::Shenandoah].collections, "4");
        assert_eq!(aggs[&Collector::Shenandoah].avg_pause_ms, "0.500");
    }

    #[test]
    fn test_file_name_is_fallback_identity() {
        let text = format!("{HEADER}out/zgc/gc-zgc-1.log,,2,0.200,0.150,0.100\nout/misc.log,,1,1.000,1.000,1.000\n");
        let aggs = parse_gc_report(&text);
        assert_eq!(aggs.len(), 1);
        assert_eq!(aggs[&Collector::Zgc].total_pause_ms, "0.200");
    }

    #[test]
    fn test_fallback_uses_base_name_only() {
        let text = format!("{HEADER}out/g1-runs/parallel.log,Parallel,1,1.000,1.000,1.000\n");
        assert!(parse_gc_report(&text).is_empty());
    }

    #[test]
    fn test_last_duplicate_row_wins() {
        let text = format!(
            "{HEADER}out/a.log,G1,1,1.000,1.000,1.000\nout/b.log,G1,2,5.000,3.000,2.500\n"
        );
        let aggs = parse_gc_report(&text);
        assert_eq!(aggs[&Collector::G1].collections, "2");
        assert_eq!(aggs[&Collector::G1].max_pause_ms, "3.000");
    }

    #[test]
    fn test_scanner_output_round_trips() {
        let rows = vec![
            GcSummaryRow {
                file: "out/gc-g1.log".to_string(),
                gc: "G1".to_string(),
                collections: 3,
                total_pause_ms: 6.5,
                max_pause_ms: 4.25,
            },
            GcSummaryRow {
                file: "out/x, y/gc-shen.log".to_string(),
                gc: String::new(),
                collections: 2,
                total_pause_ms: 1.0,
                max_pause_ms: 0.6,
            },
            GcSummaryRow {
                file: "out/gc-g1-again.log".to_string(),
                gc: "G1".to_string(),
                collections: 1,
                total_pause_ms: 0.5,
                max_pause_ms: 0.5,
            },
        ];
        let dir = tempdir().unwrap();
        let path = dir.path().join("gc_report.csv");
        let cells: Vec<Vec<String>> = rows.iter().map(GcSummaryRow::cells).collect();
        table::write_atomic(&path, &GC_REPORT_HEADER, &cells).unwrap();

        let aggs = load_gc_aggregates(&path);
        assert_eq!(
            aggs[&Collector::G1],
            GcAggregate {
                collections: "1".to_string(),
                total_pause_ms: "0.500".to_string(),
                max_pause_ms: "0.500".to_string(),
                avg_pause_ms: "0.500".to_string(),
            }
        );
        assert_eq!(
            aggs[&Collector::Shenandoah],
            GcAggregate {
                collections: "2".to_string(),
                total_pause_ms: "1.000".to_string(),
                max_pause_ms: "0.600".to_string(),
                avg_pause_ms: "0.500".to_string(),
            }
        );
    }

    #[test]
    fn test_line_break_in_file_path_round_trips() {
        let row = GcSummaryRow {
            file: "out/weird\nname/gc-g1.log".to_string(),
            gc: "G1".to_string(),
            collections: 2,
            total_pause_ms: 3.0,
            max_pause_ms: 2.0,
        };
        let dir = tempdir().unwrap();
        let path = dir.path().join("gc_report.csv");
        table::write_atomic(&path, &GC_REPORT_HEADER, &[row.cells()]).unwrap();

        let aggs = load_gc_aggregates(&path);
        assert_eq!(aggs.len(), 1);
        assert_eq!(
            aggs[&Collector::G1],
            GcAggregate {
                collections: "2".to_string(),
                total_pause_ms: "3.000".to_string(),
                max_pause_ms: "2.000".to_string(),
                avg_pause_ms: "1.500".to_string(),
            }
        );
    }

    #[test]
    fn test_latency_numbers_keep_their_form() {
        let (_dir, config) = setup(
            None,
            &[(
                "g1-burst.json",
                r#"{"req_per_sec": 1200.0, "p50_ms": 12.0, "p95_ms": 40, "p99_ms": 123456789012345678}"#,
            )],
        );

        let MergeOutcome::Written { rows, .. } = merge(&config).unwrap() else {
            panic!("expected a written report");
        };
        assert_eq!(
            rows[0].cells(),
            vec!["G1", "1200.0", "12.0", "40", "123456789012345678", "", "", "", ""]
        );
    }

    #[test]
    fn test_missing_gc_report_is_empty() {
        let dir = tempdir().unwrap();
        assert!(load_gc_aggregates(&dir.path().join("gc_report.csv")).is_empty());
    }

    #[test]
    fn test_join_orders_and_fills_gaps() {
        let mut latency = BTreeMap::new();
        latency.insert(
            Collector::Zgc,
            LatencySummary {
                req_per_sec: Some(num("1500")),
                p99_ms: Some(num("2.5")),
                ..Default::default()
            },
        );
        let mut gc = BTreeMap::new();
        gc.insert(
            Collector::G1,
            GcAggregate {
                collections: "3".to_string(),
                avg_pause_ms: "1.250".to_string(),
                ..Default::default()
            },
        );

        let rows = join(latency, gc);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].collector, Collector::G1);
        assert_eq!(
            rows[0].cells(),
            vec!["G1", "", "", "", "", "3", "", "", "1.250"]
        );
        assert_eq!(rows[1].collector, Collector::Zgc);
        assert_eq!(
            rows[1].cells(),
            vec!["ZGC", "1500", "", "", "2.5", "", "", "", ""]
        );
    }

    #[test]
    fn test_digest_format() {
        let row = FinalReportRow {
            collector: Collector::Shenandoah,
            latency: Some(LatencySummary {
                req_per_sec: Some(num("980.25")),
                p99_ms: Some(num("14.0")),
                ..Default::default()
            }),
            gc: Some(GcAggregate {
                avg_pause_ms: "0.420".to_string(),
                ..Default::default()
            }),
        };
        assert_eq!(row.digest(), "SHEN   | 980.25 req/s | p99=14.0 ms | avgGC=0.420 ms");
    }

    #[test]
    fn test_merge_latency_zgc_and_gc_g1() {
        let gc = format!("{HEADER}out/gc-g1.log,G1,3,6.000,3.000,2.000\n");
        let (_dir, config) = setup(
            Some(&gc),
            &[("zgc-burst.json", r#"{"req_per_sec": 1000, "p50_ms": 1.1, "p95_ms": 2.2, "p99_ms": 3.3}"#)],
        );

        let MergeOutcome::Written { path, rows } = merge(&config).unwrap() else {
            panic!("expected a written report");
        };
        assert_eq!(rows.len(), 2);
        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(
            text,
            "gc,req_per_sec,p50_ms,p95_ms,p99_ms,collections,total_pause_ms,max_pause_ms,avg_pause_ms\n\
             G1,,,,,3,6.000,3.000,2.000\n\
             ZGC,1000,1.1,2.2,3.3,,,,\n"
        );
    }

    #[test]
    fn test_merge_without_gc_report_uses_latency_only() {
        let (_dir, config) = setup(None, &[("shen-a.json", r#"{"p99_ms": 7.5}"#)]);

        let MergeOutcome::Written { rows, .. } = merge(&config).unwrap() else {
            panic!("expected a written report");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].gc_name(), "SHEN");
        assert!(rows[0].gc.is_none());
    }

    #[test]
    fn test_merge_with_no_data_writes_nothing() {
        let gc = format!("{HEADER}out/parallel.log,Parallel,1,1.000,1.000,1.000\n");
        let (_dir, config) = setup(
            Some(&gc),
            &[("epsilon-run.json", r#"{"p99_ms": 1}"#), ("g1-bad.json", "not json")],
        );

        assert!(matches!(merge(&config).unwrap(), MergeOutcome::NothingToMerge));
        assert!(!config.final_report().exists());
    }

    #[test]
    fn test_merge_with_missing_root_is_nothing_to_merge() {
        let dir = tempdir().unwrap();
        let config = ReportConfig::default().with_root(dir.path().join("never-created"));
        assert!(matches!(merge(&config).unwrap(), MergeOutcome::NothingToMerge));
    }
}
