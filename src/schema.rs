//! Fixed input schema and the all-or-nothing cast from raw CSV cells.
//!
//! Narrow numeric targets keep their bit-width: integers are truncated
//! toward zero and wrap on overflow, floats round to the nearest `f16`.

use half::f16;
use tracing::info;

use crate::error::{JobError, Result};
use crate::source::RawTable;

/// Storage type a source column is cast to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Int8,
    Int16,
    Float16,
}

impl FieldType {
    pub fn name(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Int8 => "int8",
            FieldType::Int16 => "int16",
            FieldType::Float16 => "float16",
        }
    }
}

/// Column names and target types, in source order.
pub static INPUT_SCHEMA: &[(&str, FieldType)] = &[
    ("id", FieldType::Text),
    ("class", FieldType::Text),
    ("memory", FieldType::Int16),
    ("percentage", FieldType::Float16),
    ("ratio", FieldType::Float16),
    ("fob", FieldType::Text),
    ("dp", FieldType::Text),
    ("recovered", FieldType::Int8),
];

/// Text stored for a missing cell in a text column.
pub const MISSING_TEXT: &str = "nan";

/// One source row after coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct InputRecord {
    pub id: String,
    pub class: String,
    pub memory: i16,
    pub percentage: f16,
    pub ratio: f16,
    pub fob: String,
    pub dp: String,
    pub recovered: i8,
}

/// Casts every row of `table` to [`InputRecord`].
///
/// Columns outside [`INPUT_SCHEMA`] are ignored. Fails on the first missing
/// column or uncastable cell; no partial result is returned.
#[tracing::instrument(skip_all, fields(rows = table.len()))]
pub fn coerce(table: &RawTable) -> Result<Vec<InputRecord>> {
    let mut idx = [0usize; 8];
    for (slot, (name, _)) in idx.iter_mut().zip(INPUT_SCHEMA) {
        *slot = table
            .column_index(name)
            .ok_or_else(|| JobError::MissingColumn {
                column: name.to_string(),
            })?;
    }

    let mut records = Vec::with_capacity(table.len());

    for (row, record) in table.rows().iter().enumerate() {
        let cell = |col: usize| record.get(idx[col]).unwrap_or("");

        let cast_err = |col: usize, reason: String| {
            let (name, target) = INPUT_SCHEMA[col];
            JobError::Schema {
                column: format!("{name} (inferred {})", table.infer_kind(idx[col])),
                row,
                value: cell(col).to_string(),
                target: target.name(),
                reason,
            }
        };

        records.push(InputRecord {
            id: to_text(cell(0)),
            class: to_text(cell(1)),
            memory: to_i16(cell(2)).map_err(|e| cast_err(2, e))?,
            percentage: to_f16(cell(3)).map_err(|e| cast_err(3, e))?,
            ratio: to_f16(cell(4)).map_err(|e| cast_err(4, e))?,
            fob: to_text(cell(5)),
            dp: to_text(cell(6)),
            recovered: to_i8(cell(7)).map_err(|e| cast_err(7, e))?,
        });
    }

    info!(records = records.len(), "Schema applied");
    Ok(records)
}

/// Parses an integral value, accepting decimal text by truncating toward zero.
fn parse_integral(raw: &str) -> std::result::Result<i64, String> {
    let s = raw.trim();
    if s.is_empty() {
        return Err("missing value".into());
    }
    if let Ok(v) = s.parse::<i64>() {
        return Ok(v);
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() => Ok(f.trunc() as i64),
        Ok(_) => Err("non-finite value".into()),
        Err(_) => Err("not a number".into()),
    }
}

pub fn to_i16(raw: &str) -> std::result::Result<i16, String> {
    parse_integral(raw).map(|v| v as i16)
}

pub fn to_i8(raw: &str) -> std::result::Result<i8, String> {
    parse_integral(raw).map(|v| v as i8)
}

/// A missing (empty) cell is rendered the way a missing value prints, `"nan"`.
pub fn to_text(raw: &str) -> String {
    if raw.is_empty() {
        MISSING_TEXT.to_string()
    } else {
        raw.to_string()
    }
}

/// Empty cells are missing values and become NaN.
pub fn to_f16(raw: &str) -> std::result::Result<f16, String> {
    let s = raw.trim();
    if s.is_empty() {
        return Ok(f16::NAN);
    }
    s.parse::<f64>()
        .map(f16::from_f64)
        .map_err(|_| "not a number".to_string())
}
