/// Latency ingestion: read `<collector>-*.json` benchmark results from the
/// latency directory into one summary per collector.
use crate::collector::Collector;
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Throughput and latency percentiles for one collector's benchmark run.
///
/// Numbers are kept as written by the harness so `1200.0` does not become `1200`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatencySummary {
    pub req_per_sec: Option<Number>,
    pub p50_ms: Option<Number>,
    pub p95_ms: Option<Number>,
    pub p99_ms: Option<Number>,
}

/// Render an optional number as a report cell; absent is empty.
pub fn number_cell(v: &Option<Number>) -> String {
    v.as_ref().map(Number::to_string).unwrap_or_default()
}

impl LatencySummary {
    /// Pull the four known fields out of a JSON object. Absent or
    /// non-numeric fields stay `None`.
    pub fn from_value(v: &Value) -> Self {
        let field = |name: &str| match v.get(name) {
            Some(Value::Number(n)) => Some(n.clone()),
            _ => None,
        };
        Self {
            req_per_sec: field("req_per_sec"),
            p50_ms: field("p50_ms"),
            p95_ms: field("p95_ms"),
            p99_ms: field("p99_ms"),
        }
    }
}

/// Why a latency file was not ingested.
#[derive(Debug)]
pub enum LatencySkip {
    /// File name prefix is not one of the known collector tokens.
    UnknownCollector(String),
    Io(std::io::Error),
    Json(serde_json::Error),
    /// Valid JSON, but not an object.
    NotAnObject,
}

impl std::fmt::Display for LatencySkip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LatencySkip::UnknownCollector(token) => write!(f, "unknown collector token {token:?}"),
            LatencySkip::Io(e) => write!(f, "I/O error: {e}"),
            LatencySkip::Json(e) => write!(f, "malformed JSON: {e}"),
            LatencySkip::NotAnObject => write!(f, "top-level JSON value is not an object"),
        }
    }
}

/// Collector token from a latency file name: text before the first `-`.
///
/// `zgc-run1.json` → `zgc`, `shen.json` → `shen.json`.
fn token_from_file_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    name.split('-').next().unwrap_or_default().to_lowercase()
}

/// Read one latency file.
pub fn read_latency_file(path: &Path) -> Result<(Collector, LatencySummary), LatencySkip> {
    let token = token_from_file_name(path);
    let collector =
        Collector::from_token(&token).ok_or(LatencySkip::UnknownCollector(token))?;

    let contents = std::fs::read_to_string(path).map_err(LatencySkip::Io)?;
    let v: Value = serde_json::from_str(&contents).map_err(LatencySkip::Json)?;
    if !v.is_object() {
        return Err(LatencySkip::NotAnObject);
    }

    Ok((collector, LatencySummary::from_value(&v)))
}

/// Latency result file names.
static LATENCY_FILE_PATTERN: LazyLock<glob::Pattern> =
    LazyLock::new(|| glob::Pattern::new("*.json").unwrap());

/// JSON files directly under `dir`, in directory-walk order (not sorted).
pub fn discover_latency_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %dir.display(), "no latency directory");
            return Vec::new();
        }
        Err(e) => {
            tracing::warn!(error = %e, path = %dir.display(), "failed to read latency directory");
            return Vec::new();
        }
    };

    entries
        .flatten()
        .filter(|entry| !entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter(|entry| LATENCY_FILE_PATTERN.matches(&entry.file_name().to_string_lossy()))
        .map(|entry| entry.path())
        .collect()
}

/// Load every latency file under `dir`. When several files map to the same
/// collector, the last one in directory-walk order wins.
pub fn load_latency(dir: &Path) -> BTreeMap<Collector, LatencySummary> {
    let mut results = BTreeMap::new();

    for path in discover_latency_files(dir) {
        match read_latency_file(&path) {
            Ok((collector, summary)) => {
                tracing::debug!(path = %path.display(), %collector, "loaded latency results");
                results.insert(collector, summary);
            }
            Err(LatencySkip::UnknownCollector(token)) => {
                tracing::debug!(path = %path.display(), token = %token, "ignoring latency file");
            }
            Err(reason) => {
                tracing::warn!(path = %path.display(), %reason, "failed to read latency file");
            }
        }
    }

    results
}
