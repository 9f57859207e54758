//! Loading the source CSV into an untyped in-memory table.
//!
//! Sources beginning with `http` are fetched over the network; anything else
//! is treated as a local path.

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info};

use crate::error::{JobError, Result};
use crate::fetch::{HttpClient, fetch_bytes};

/// Kind of values a column holds, judged from its non-empty cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    Text,
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ColumnKind::Integer => "integer",
            ColumnKind::Float => "float",
            ColumnKind::Text => "text",
        };
        f.write_str(name)
    }
}

/// Header plus rows, exactly as read from the CSV.
#[derive(Debug, Clone)]
pub struct RawTable {
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

impl RawTable {
    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.headers.iter()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn rows(&self) -> &[StringRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Infers the kind of column `idx`.
    ///
    /// Empty cells are missing values and do not count against numeric
    /// kinds, so a column with no values at all is reported as `Float`.
    pub fn infer_kind(&self, idx: usize) -> ColumnKind {
        let cells = || {
            self.rows
                .iter()
                .filter_map(move |r| r.get(idx))
                .map(str::trim)
                .filter(|c| !c.is_empty())
        };

        if cells().all(|c| c.parse::<i64>().is_ok()) && cells().next().is_some() {
            ColumnKind::Integer
        } else if cells().all(|c| c.parse::<f64>().is_ok()) {
            ColumnKind::Float
        } else {
            ColumnKind::Text
        }
    }
}

/// Reads `source` (URL or path) and parses it as CSV.
#[tracing::instrument(skip(client))]
pub async fn load<C: HttpClient>(client: &C, source: &str) -> Result<RawTable> {
    let bytes = if source.starts_with("http") {
        fetch_bytes(client, source)
            .await
            .map_err(|e| JobError::fetch(source, format!("{e:#}")))?
    } else {
        tokio::fs::read(source)
            .await
            .map_err(|e| JobError::fetch(source, e))?
    };

    let table = parse_csv(source, &bytes)?;
    info!(rows = table.len(), columns = table.headers.len(), "Source loaded");

    for (idx, name) in table.headers().enumerate() {
        debug!(column = name, kind = %table.infer_kind(idx), "Inferred column kind");
    }

    Ok(table)
}

/// Parses comma-delimited CSV with a mandatory header row.
pub fn parse_csv(source: &str, bytes: &[u8]) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(bytes);

    let headers = rdr
        .headers()
        .map_err(|e| JobError::fetch(source, e))?
        .clone();
    if headers.is_empty() || headers.iter().all(str::is_empty) {
        return Err(JobError::fetch(source, "no columns to parse"));
    }

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| JobError::fetch(source, e))?;
        rows.push(record);
    }

    Ok(RawTable { headers, rows })
}
