use std::fmt;

use super::model::{Axis, AxisValue, BenchmarkTable, Measurement, TransferMode};

// ---------------------------------------------------------------------------
// Filter predicate: one configuration axis held at a fixed value
// ---------------------------------------------------------------------------

/// `axis == value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Predicate {
    pub axis: Axis,
    pub value: AxisValue,
}

impl Predicate {
    pub fn new(axis: Axis, value: impl Into<AxisValue>) -> Self {
        Predicate {
            axis,
            value: value.into(),
        }
    }

    pub fn count(axis: Axis, n: u64) -> Self {
        Self::new(axis, n)
    }

    pub fn mode(mode: TransferMode) -> Self {
        Self::new(Axis::Mode, mode)
    }

    pub fn matches(&self, row: &Measurement) -> bool {
        row.axis(self.axis) == self.value
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=={}", self.axis.column(), self.value)
    }
}

/// Return indices of rows that pass every predicate.
///
/// An empty predicate list passes everything. No match yields an empty
/// vector, which callers render as an empty chart.
pub fn filtered_indices(table: &BenchmarkTable, predicates: &[Predicate]) -> Vec<usize> {
    table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| predicates.iter().all(|p| p.matches(row)))
        .map(|(i, _)| i)
        .collect()
}

/// Rows that pass every predicate, in table order.
pub fn select<'a>(table: &'a BenchmarkTable, predicates: &[Predicate]) -> Vec<&'a Measurement> {
    let rows: Vec<&Measurement> = filtered_indices(table, predicates)
        .into_iter()
        .map(|i| &table.rows[i])
        .collect();
    log::debug!(
        "selection [{}] matched {} of {} rows",
        describe(predicates),
        rows.len(),
        table.len()
    );
    rows
}

/// Human-readable conjunction of predicates for log lines.
pub fn describe(predicates: &[Predicate]) -> String {
    predicates
        .iter()
        .map(Predicate::to_string)
        .collect::<Vec<_>>()
        .join(" & ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::row;
    use TransferMode::{Parallel, Serial};

    fn sample() -> BenchmarkTable {
        BenchmarkTable::from_rows(vec![
            row(1, 1, Serial, 4096, 10.0, 11.0),
            row(1, 1, Parallel, 4096, 9.0, 10.0),
            row(8, 1, Parallel, 4096, 5.0, 6.0),
            row(8, 4, Parallel, 4096, 4.0, 5.0),
            row(8, 1, Parallel, 8192, 7.0, 8.0),
        ])
    }

    #[test]
    fn all_predicates_must_hold() {
        let table = sample();
        let preds = [
            Predicate::mode(Parallel),
            Predicate::count(Axis::NrTasklets, 1),
            Predicate::count(Axis::Size, 4096),
        ];
        assert_eq!(filtered_indices(&table, &preds), vec![1, 2]);
    }

    #[test]
    fn no_predicates_selects_everything() {
        let table = sample();
        assert_eq!(filtered_indices(&table, &[]).len(), table.len());
    }

    #[test]
    fn unmatched_selection_is_empty_not_an_error() {
        let table = sample();
        let preds = [Predicate::count(Axis::NrDpus, 16)];
        assert!(filtered_indices(&table, &preds).is_empty());
        assert!(select(&table, &preds).is_empty());
    }

    #[test]
    fn filtering_is_idempotent() {
        let table = sample();
        let preds = [Predicate::mode(Parallel), Predicate::count(Axis::NrDpus, 8)];

        let once = BenchmarkTable::from_rows(select(&table, &preds).into_iter().cloned().collect());
        let twice = select(&once, &preds);

        assert_eq!(once.len(), 3);
        assert_eq!(twice.len(), once.len());
        assert!(twice.iter().zip(&once.rows).all(|(a, b)| *a == b));
    }

    #[test]
    fn select_keeps_table_order() {
        let table = sample();
        let rows = select(&table, &[Predicate::count(Axis::NrDpus, 8)]);
        let sizes: Vec<(u64, u64)> = rows.iter().map(|r| (r.nr_tasklets, r.size)).collect();
        assert_eq!(sizes, vec![(1, 4096), (4, 4096), (1, 8192)]);
    }

    #[test]
    fn describe_joins_predicates() {
        let preds = [Predicate::mode(Serial), Predicate::count(Axis::Size, 4096)];
        assert_eq!(describe(&preds), "mode==serial & size==4096");
    }
}
