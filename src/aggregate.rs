//! Grouped aggregation over coerced records.
//!
//! The result is two-level: each output column is identified by the base
//! field it summarizes and the function applied, mirroring what a dataframe
//! `groupby(..).agg({field: [fns]})` would produce.

use half::f16;
use std::collections::BTreeMap;
use tracing::info;

use crate::error::{JobError, Result};
use crate::schema::InputRecord;

/// Name of the grouping column.
pub const GROUP_KEY: &str = "dp";

/// Numeric input fields that can be aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BaseField {
    Memory,
    Percentage,
    Ratio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AggFn {
    Min,
    Max,
    Count,
    Mean,
}

/// Functions applied per field, in output column order.
pub static AGGREGATIONS: &[(BaseField, &[AggFn])] = &[
    (BaseField::Memory, &[AggFn::Min, AggFn::Max, AggFn::Count]),
    (BaseField::Percentage, &[AggFn::Max, AggFn::Mean]),
    (BaseField::Ratio, &[AggFn::Max]),
];

/// Values of one aggregate column, one entry per group.
#[derive(Debug, Clone, PartialEq)]
pub enum AggValues {
    Int16(Vec<i16>),
    Int64(Vec<i64>),
    Float16(Vec<f16>),
}

impl AggValues {
    pub fn len(&self) -> usize {
        match self {
            AggValues::Int16(v) => v.len(),
            AggValues::Int64(v) => v.len(),
            AggValues::Float16(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateColumn {
    pub field: BaseField,
    pub func: AggFn,
    pub values: AggValues,
}

/// Group keys plus their aggregate columns; row `i` of every column belongs
/// to `keys[i]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregateTable {
    pub keys: Vec<String>,
    pub columns: Vec<AggregateColumn>,
}

impl AggregateTable {
    pub fn num_groups(&self) -> usize {
        self.keys.len()
    }

    pub fn column(&self, field: BaseField, func: AggFn) -> Option<&AggValues> {
        self.columns
            .iter()
            .find(|c| c.field == field && c.func == func)
            .map(|c| &c.values)
    }
}

#[derive(Debug, Clone, Copy)]
struct IntStats {
    min: i16,
    max: i16,
    count: i64,
}

impl IntStats {
    fn new(v: i16) -> Self {
        Self {
            min: v,
            max: v,
            count: 1,
        }
    }

    fn push(&mut self, v: i16) {
        self.min = self.min.min(v);
        self.max = self.max.max(v);
        self.count += 1;
    }
}

/// NaN values are missing and skipped by every reduction.
#[derive(Debug, Clone, Copy, Default)]
struct FloatStats {
    max: Option<f16>,
    count: i64,
    sum: f64,
}

impl FloatStats {
    fn push(&mut self, v: f16) {
        if v.is_nan() {
            return;
        }
        if self.max.is_none_or(|m| v > m) {
            self.max = Some(v);
        }
        self.count += 1;
        self.sum += v.to_f64();
    }

    fn mean(&self) -> f16 {
        if self.count == 0 {
            f16::NAN
        } else {
            f16::from_f64(self.sum / self.count as f64)
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct GroupStats {
    memory: IntStats,
    percentage: FloatStats,
    ratio: FloatStats,
}

impl GroupStats {
    fn new(r: &InputRecord) -> Self {
        let mut s = Self {
            memory: IntStats::new(r.memory),
            percentage: FloatStats::default(),
            ratio: FloatStats::default(),
        };
        s.percentage.push(r.percentage);
        s.ratio.push(r.ratio);
        s
    }

    fn push(&mut self, r: &InputRecord) {
        self.memory.push(r.memory);
        self.percentage.push(r.percentage);
        self.ratio.push(r.ratio);
    }
}

/// Groups `records` by `dp` and applies [`AGGREGATIONS`].
///
/// Groups come out in ascending key order. An empty input yields a table
/// with no groups but the full set of (empty) columns.
#[tracing::instrument(skip_all, fields(records = records.len()))]
pub fn aggregate(records: &[InputRecord]) -> Result<AggregateTable> {
    let mut groups: BTreeMap<&str, GroupStats> = BTreeMap::new();

    for r in records {
        groups
            .entry(r.dp.as_str())
            .and_modify(|g| g.push(r))
            .or_insert_with(|| GroupStats::new(r));
    }

    let stats: Vec<&GroupStats> = groups.values().collect();

    let mut columns = Vec::new();
    for &(field, funcs) in AGGREGATIONS {
        for &func in funcs {
            columns.push(AggregateColumn {
                field,
                func,
                values: reduce(&stats, field, func)?,
            });
        }
    }

    let keys: Vec<String> = groups.keys().map(|k| k.to_string()).collect();
    info!(groups = keys.len(), "Records aggregated");

    Ok(AggregateTable { keys, columns })
}

fn reduce(stats: &[&GroupStats], field: BaseField, func: AggFn) -> Result<AggValues> {
    let values = match (field, func) {
        (BaseField::Memory, AggFn::Min) => {
            AggValues::Int16(stats.iter().map(|g| g.memory.min).collect())
        }
        (BaseField::Memory, AggFn::Max) => {
            AggValues::Int16(stats.iter().map(|g| g.memory.max).collect())
        }
        (BaseField::Memory, AggFn::Count) => {
            AggValues::Int64(stats.iter().map(|g| g.memory.count).collect())
        }
        (BaseField::Percentage, AggFn::Max) => AggValues::Float16(
            stats
                .iter()
                .map(|g| g.percentage.max.unwrap_or(f16::NAN))
                .collect(),
        ),
        (BaseField::Percentage, AggFn::Mean) => {
            AggValues::Float16(stats.iter().map(|g| g.percentage.mean()).collect())
        }
        (BaseField::Ratio, AggFn::Max) => AggValues::Float16(
            stats
                .iter()
                .map(|g| g.ratio.max.unwrap_or(f16::NAN))
                .collect(),
        ),
        _ => return Err(JobError::UnsupportedAggregation { field, func }),
    };
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(dp: &str, memory: i16, percentage: f32, ratio: f32) -> InputRecord {
        InputRecord {
            id: "id".into(),
            class: "c".into(),
            memory,
            percentage: f16::from_f32(percentage),
            ratio: f16::from_f32(ratio),
            fob: "f".into(),
            dp: dp.into(),
            recovered: 0,
        }
    }

    fn f16s(values: &AggValues) -> Vec<f32> {
        match values {
            AggValues::Float16(v) => v.iter().map(|x| x.to_f32()).collect(),
            other => panic!("expected float16 column, got {other:?}"),
        }
    }

    #[test]
    fn test_two_groups() {
        let records = vec![
            rec("A", 10, 1.5, 0.2),
            rec("A", 20, 2.5, 0.4),
            rec("B", 5, 0.5, 0.1),
        ];
        let table = aggregate(&records).unwrap();

        assert_eq!(table.keys, vec!["A", "B"]);
        assert_eq!(
            table.column(BaseField::Memory, AggFn::Min),
            Some(&AggValues::Int16(vec![10, 5]))
        );
        assert_eq!(
            table.column(BaseField::Memory, AggFn::Max),
            Some(&AggValues::Int16(vec![20, 5]))
        );
        assert_eq!(
            table.column(BaseField::Memory, AggFn::Count),
            Some(&AggValues::Int64(vec![2, 1]))
        );
        assert_eq!(
            f16s(table.column(BaseField::Percentage, AggFn::Max).unwrap()),
            vec![2.5, 0.5]
        );
        assert_eq!(
            f16s(table.column(BaseField::Percentage, AggFn::Mean).unwrap()),
            vec![2.0, 0.5]
        );
        let ratio_max = table.column(BaseField::Ratio, AggFn::Max).unwrap();
        assert_eq!(
            ratio_max,
            &AggValues::Float16(vec![f16::from_f32(0.4), f16::from_f32(0.1)])
        );
    }

    #[test]
    fn test_column_order_follows_aggregations() {
        let table = aggregate(&[rec("A", 1, 1.0, 1.0)]).unwrap();
        let order: Vec<_> = table.columns.iter().map(|c| (c.field, c.func)).collect();
        assert_eq!(
            order,
            vec![
                (BaseField::Memory, AggFn::Min),
                (BaseField::Memory, AggFn::Max),
                (BaseField::Memory, AggFn::Count),
                (BaseField::Percentage, AggFn::Max),
                (BaseField::Percentage, AggFn::Mean),
                (BaseField::Ratio, AggFn::Max),
            ]
        );
    }

    #[test]
    fn test_empty_input_has_no_groups() {
        let table = aggregate(&[]).unwrap();
        assert_eq!(table.num_groups(), 0);
        assert_eq!(table.columns.len(), 6);
        assert!(table.columns.iter().all(|c| c.values.is_empty()));
    }

    #[test]
    fn test_single_row_group() {
        let table = aggregate(&[rec("Z", -7, 3.0, 0.5)]).unwrap();
        assert_eq!(
            table.column(BaseField::Memory, AggFn::Min),
            table.column(BaseField::Memory, AggFn::Max)
        );
        assert_eq!(
            table.column(BaseField::Memory, AggFn::Count),
            Some(&AggValues::Int64(vec![1]))
        );
    }

    #[test]
    fn test_counts_sum_to_input_rows() {
        let records: Vec<_> = (0..50)
            .map(|i| rec(&format!("g{}", i % 7), i, i as f32 / 10.0, 0.5))
            .collect();
        let table = aggregate(&records).unwrap();
        assert_eq!(table.num_groups(), 7);

        let AggValues::Int64(counts) = table.column(BaseField::Memory, AggFn::Count).unwrap()
        else {
            panic!("count column has wrong type");
        };
        assert_eq!(counts.iter().sum::<i64>(), 50);
        assert!(counts.iter().all(|&c| c >= 1));
    }

    #[test]
    fn test_mean_stays_within_group_bounds() {
        let records = vec![
            rec("A", 1, 0.1, 0.0),
            rec("A", 1, 0.2, 0.0),
            rec("A", 1, 0.3, 0.0),
            rec("A", 1, 0.7, 0.0),
        ];
        let table = aggregate(&records).unwrap();
        let mean = f16s(table.column(BaseField::Percentage, AggFn::Mean).unwrap())[0];
        assert!(mean >= f16::from_f32(0.1).to_f32());
        assert!(mean <= f16::from_f32(0.7).to_f32());
    }

    #[test]
    fn test_pairs_outside_table_are_rejected() {
        let stats = GroupStats::new(&rec("A", 1, 1.0, 1.0));
        let err = reduce(&[&stats], BaseField::Ratio, AggFn::Count).unwrap_err();
        assert!(matches!(
            err,
            JobError::UnsupportedAggregation {
                field: BaseField::Ratio,
                func: AggFn::Count
            }
        ));
        assert!(reduce(&[&stats], BaseField::Memory, AggFn::Mean).is_err());
    }

    #[test]
    fn test_nan_is_skipped() {
        let mut missing = rec("A", 1, 0.0, 0.0);
        missing.percentage = f16::NAN;
        let table = aggregate(&[missing.clone(), rec("A", 2, 4.0, 1.0)]).unwrap();
        assert_eq!(
            f16s(table.column(BaseField::Percentage, AggFn::Mean).unwrap()),
            vec![4.0]
        );

        let table = aggregate(&[missing]).unwrap();
        assert!(f16s(table.column(BaseField::Percentage, AggFn::Max).unwrap())[0].is_nan());
    }
}
