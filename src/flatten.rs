//! Collapses the two-level aggregate columns into a flat Arrow batch.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float16Array, Int16Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use crate::aggregate::{AggFn, AggValues, AggregateTable, BaseField, GROUP_KEY};
use crate::error::{JobError, Result};

/// Flat output name for every `(field, function)` pair the job produces.
pub static FLAT_NAMES: &[((BaseField, AggFn), &str)] = &[
    ((BaseField::Memory, AggFn::Min), "memory_min"),
    ((BaseField::Memory, AggFn::Max), "memory_max"),
    ((BaseField::Memory, AggFn::Count), "memory_count"),
    ((BaseField::Percentage, AggFn::Max), "percentage_max"),
    ((BaseField::Percentage, AggFn::Mean), "percentage_avg"),
    ((BaseField::Ratio, AggFn::Max), "ratio_max"),
];

pub fn flat_name(field: BaseField, func: AggFn) -> Option<&'static str> {
    FLAT_NAMES
        .iter()
        .find(|(key, _)| *key == (field, func))
        .map(|(_, name)| *name)
}

fn into_array(values: AggValues) -> ArrayRef {
    match values {
        AggValues::Int16(v) => Arc::new(Int16Array::from(v)),
        AggValues::Int64(v) => Arc::new(Int64Array::from(v)),
        AggValues::Float16(v) => Arc::new(Float16Array::from(v)),
    }
}

/// Builds the output batch: the group key column followed by each aggregate
/// column under its flat name, rows in grouped order.
pub fn flatten(table: AggregateTable) -> Result<RecordBatch> {
    let mut fields = vec![Field::new(GROUP_KEY, DataType::Utf8, false)];
    let mut arrays: Vec<ArrayRef> = vec![Arc::new(StringArray::from(table.keys))];

    for column in table.columns {
        let name = flat_name(column.field, column.func).ok_or_else(|| {
            JobError::encode(format!(
                "no flat name for ({:?}, {:?})",
                column.field, column.func
            ))
        })?;
        let array = into_array(column.values);
        fields.push(Field::new(name, array.data_type().clone(), false));
        arrays.push(array);
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}
