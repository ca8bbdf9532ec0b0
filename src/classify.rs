//! Line classification for GC logs.
//!
//! A log line can carry a pause observation, e.g.
//! `[1.234s][info][gc] GC(3) Pause Young (Normal) (G1 Evacuation Pause) 24M->8M(256M) 1.234ms`,
//! or announce the collector in use, e.g. `[0.010s][info][gc] Using Shenandoah`.

use regex::Regex;
use std::sync::LazyLock;

/// Matches from the start of the trimmed line: anything, the word "Pause",
/// then a space-separated decimal immediately followed by `ms`.
static PAUSE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^.*\bPause\b.*? ([0-9]+(?:\.[0-9]+)?)ms").unwrap());

/// Matches from the start of the trimmed line: anything, the word "Using",
/// whitespace, then the collector name token.
static USING_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^.*\bUsing\s+([A-Za-z0-9\-_]+)").unwrap());

/// Extracts pause durations and collector announcements from single log lines.
pub trait LineClassifier {
    /// Pause duration in milliseconds, if the line reports one.
    fn try_match_pause(&self, line: &str) -> Option<f64>;

    /// Raw collector name, if the line announces which collector is in use.
    fn try_match_using(&self, line: &str) -> Option<String>;
}

/// Regex-backed classifier for unified JVM logging output (G1, ZGC, Shenandoah).
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexClassifier;

impl RegexClassifier {
    pub fn new() -> Self {
        RegexClassifier
    }
}

impl LineClassifier for RegexClassifier {
    fn try_match_pause(&self, line: &str) -> Option<f64> {
        let caps = PAUSE_PATTERN.captures(line.trim())?;
        caps.get(1)?.as_str().parse().ok()
    }

    fn try_match_using(&self, line: &str) -> Option<String> {
        let caps = USING_PATTERN.captures(line.trim())?;
        Some(caps.get(1)?.as_str().to_string())
    }
}
