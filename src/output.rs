//! Serialization and display of the aggregated table.
//!
//! Supports Parquet encoding and a text preview of the leading rows.

use std::io::Cursor;

use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use bytes::Bytes;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use parquet::format::KeyValue;
use tracing::debug;

use crate::error::Result;

fn writer_properties() -> WriterProperties {
    let created_by = KeyValue {
        key: "created_by".to_string(),
        value: Some(concat!("dp_aggregator ", env!("CARGO_PKG_VERSION")).to_string()),
    };
    WriterProperties::builder()
        .set_key_value_metadata(Some(vec![created_by]))
        .build()
}

/// Encodes `batch` as a single-row-group Parquet file held in memory.
///
/// A batch with no rows still produces a valid file carrying the schema.
pub fn encode_parquet(batch: &RecordBatch) -> Result<Bytes> {
    let mut cursor = Cursor::new(Vec::<u8>::new());
    let mut writer = ArrowWriter::try_new(&mut cursor, batch.schema(), Some(writer_properties()))?;
    writer.write(batch)?;
    writer.close()?;

    let bytes = Bytes::from(cursor.into_inner());
    debug!(rows = batch.num_rows(), bytes = bytes.len(), "Parquet encoded");
    Ok(bytes)
}

/// Renders the first `n` rows of `batch` as a text table.
pub fn preview(batch: &RecordBatch, n: usize) -> Result<String> {
    let head = batch.slice(0, n.min(batch.num_rows()));
    let mut out = pretty_format_batches(&[head])?.to_string();

    if batch.num_rows() > n {
        out.push_str(&format!(
            "\n[{} rows x {} columns]",
            batch.num_rows(),
            batch.num_columns()
        ));
    }
    Ok(out)
}
