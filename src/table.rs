//! Comma-separated tabular artifacts.
//!
//! Writes are atomic: every row is buffered, written to a temp file in the
//! destination directory, then renamed over the destination so readers never
//! see a truncated artifact.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Quote a field if it contains a separator, quote or line break.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render one record as a line (without the trailing newline).
pub fn format_line<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| escape_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Split text into records of fields, honouring double-quote escaping.
///
/// Line breaks inside quotes belong to the field; outside quotes they end the
/// record (`\r\n`, `\n` and bare `\r` alike). Blank lines yield no record.
pub fn split_records(text: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut chars = text.chars().peekable();

    let mut end_record = |fields: &mut Vec<String>, current: &mut String, quoted: &mut bool| {
        if fields.is_empty() && current.is_empty() && !*quoted {
            return;
        }
        fields.push(std::mem::take(current));
        records.push(std::mem::take(fields));
        *quoted = false;
    };

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else if c == '"' {
            in_quotes = true;
            quoted = true;
        } else if c == ',' {
            fields.push(std::mem::take(&mut current));
        } else if c == '\r' || c == '\n' {
            if c == '\r' && chars.peek() == Some(&'\n') {
                chars.next();
            }
            end_record(&mut fields, &mut current, &mut quoted);
        } else {
            current.push(c);
        }
    }
    end_record(&mut fields, &mut current, &mut quoted);

    records
}

/// A parsed table: header names plus data rows keyed by header.
#[derive(Debug, Default)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Record>,
}

/// One data row. Cells missing from a short row read as empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    cells: HashMap<String, String>,
}

impl Record {
    /// Cell value for `column`, or `""` when absent.
    pub fn get(&self, column: &str) -> &str {
        self.cells.get(column).map(String::as_str).unwrap_or("")
    }
}

/// Parse table text. The first record is the header; blank lines are skipped.
pub fn parse(text: &str) -> Table {
    let mut records = split_records(text.trim_start_matches('\u{feff}')).into_iter();

    let header = match records.next() {
        Some(h) => h,
        None => return Table::default(),
    };

    let rows = records
        .map(|fields| {
            let cells = header
                .iter()
                .cloned()
                .zip(fields)
                .collect::<HashMap<_, _>>();
            Record { cells }
        })
        .collect();

    Table { header, rows }
}

/// Errors from writing a table artifact.
#[derive(Debug)]
pub enum TableError {
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableError::CreateDir { path, source } => {
                write!(f, "failed to create directory {}: {source}", path.display())
            }
            TableError::Write { path, source } => {
                write!(f, "failed to write temp file for {}: {source}", path.display())
            }
            TableError::Persist { path, source } => {
                write!(f, "failed to move temp file over {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for TableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TableError::CreateDir { source, .. } => Some(source),
            TableError::Write { source, .. } => Some(source),
            TableError::Persist { source, .. } => Some(source),
        }
    }
}

/// Atomically write `header` and `rows` to `path`, creating parent directories.
pub fn write_atomic<S: AsRef<str>>(
    path: &Path,
    header: &[&str],
    rows: &[Vec<S>],
) -> Result<(), TableError> {
    let mut buf = String::new();
    buf.push_str(&format_line(header));
    buf.push('\n');
    for row in rows {
        buf.push_str(&format_line(row));
        buf.push('\n');
    }

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| TableError::CreateDir {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let write_err = |e| TableError::Write {
        path: path.to_path_buf(),
        source: e,
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(buf.as_bytes()).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;

    tmp.persist(path).map_err(|e| TableError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    Ok(())
}
