use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use super::model::{Axis, AxisValue, Measurement, Metric};

// ---------------------------------------------------------------------------
// Point series
// ---------------------------------------------------------------------------

/// `(x, metric)` pairs for the rows, in row order.
///
/// Rows whose `x` axis has no numeric position (transfer modes) are skipped.
pub fn points(rows: &[&Measurement], x: Axis, metric: Metric) -> Vec<(f64, f64)> {
    rows.iter()
        .filter_map(|row| Some((row.axis(x).as_f64()?, row.metric(metric))))
        .collect()
}

// ---------------------------------------------------------------------------
// Pivot: mean of a metric over a two-axis grid
// ---------------------------------------------------------------------------

/// A two-dimensional mean aggregation. `cells[r][c]` is `None` when no row
/// falls into `(row_keys[r], column_keys[c])`.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotGrid {
    pub row_keys: Vec<AxisValue>,
    pub column_keys: Vec<AxisValue>,
    pub cells: Vec<Vec<Option<f64>>>,
}

impl PivotGrid {
    pub fn get(&self, row: AxisValue, column: AxisValue) -> Option<f64> {
        let r = self.row_keys.iter().position(|k| *k == row)?;
        let c = self.column_keys.iter().position(|k| *k == column)?;
        self.cells[r][c]
    }

    /// Smallest and largest populated cell.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.cells
            .iter()
            .flatten()
            .flatten()
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Group `rows` by `(row_axis, column_axis)` and average `metric` per cell.
/// Keys on both axes are sorted ascending.
///
/// Cells fed by more than one row are logged: the input is expected to hold
/// one row per configuration, so duplicates point at a harness problem.
pub fn pivot_mean(
    rows: &[&Measurement],
    row_axis: Axis,
    column_axis: Axis,
    metric: Metric,
) -> PivotGrid {
    let mut sums: BTreeMap<(AxisValue, AxisValue), (f64, usize)> = BTreeMap::new();
    let mut row_keys = BTreeSet::new();
    let mut column_keys = BTreeSet::new();

    for row in rows {
        let key = (row.axis(row_axis), row.axis(column_axis));
        row_keys.insert(key.0);
        column_keys.insert(key.1);
        let entry = sums.entry(key).or_insert((0.0, 0));
        entry.0 += row.metric(metric);
        entry.1 += 1;
    }

    for ((r, c), (_, n)) in &sums {
        if *n > 1 {
            log::warn!(
                "{n} rows share {}={r}, {}={c}; averaging {}",
                row_axis.column(),
                column_axis.column(),
                metric.column()
            );
        }
    }

    let row_keys: Vec<AxisValue> = row_keys.into_iter().collect();
    let column_keys: Vec<AxisValue> = column_keys.into_iter().collect();
    let cells = row_keys
        .iter()
        .map(|r| {
            column_keys
                .iter()
                .map(|c| sums.get(&(*r, *c)).map(|(sum, n)| sum / *n as f64))
                .collect()
        })
        .collect();

    PivotGrid {
        row_keys,
        column_keys,
        cells,
    }
}

// ---------------------------------------------------------------------------
// Keyed ratio (speedup)
// ---------------------------------------------------------------------------

/// Two series that were expected to pair up on a key did not.
#[derive(Debug, Clone, PartialEq, Error)]
#[error(
    "cannot align series on {axis}: unmatched keys {unmatched:?}, duplicated keys {duplicated:?}"
)]
pub struct ShapeMismatchError {
    pub axis: &'static str,
    pub unmatched: Vec<AxisValue>,
    pub duplicated: Vec<AxisValue>,
}

/// Pair each numerator row with the denominator row sharing its `key` value
/// and return `(key, numerator / denominator)` in numerator order.
///
/// Every key must appear exactly once on each side.
pub fn keyed_ratio(
    numerator: &[&Measurement],
    denominator: &[&Measurement],
    key: Axis,
    metric: Metric,
) -> Result<Vec<(AxisValue, f64)>, ShapeMismatchError> {
    let mut duplicated = Vec::new();
    let num = index_by(numerator, key, metric, &mut duplicated);
    let den = index_by(denominator, key, metric, &mut duplicated);

    let mut unmatched: Vec<AxisValue> = num
        .iter()
        .map(|(k, _)| *k)
        .filter(|k| !den.iter().any(|(d, _)| d == k))
        .collect();
    unmatched.extend(
        den.iter()
            .map(|(k, _)| *k)
            .filter(|k| !num.iter().any(|(n, _)| n == k)),
    );

    if !unmatched.is_empty() || !duplicated.is_empty() {
        return Err(ShapeMismatchError {
            axis: key.column(),
            unmatched,
            duplicated,
        });
    }

    Ok(num
        .iter()
        .map(|(k, n)| {
            let d = den
                .iter()
                .find(|(dk, _)| dk == k)
                .map(|(_, v)| *v)
                .unwrap_or(f64::NAN);
            (*k, n / d)
        })
        .collect())
}

/// `(key, metric)` in row order, recording keys seen more than once.
fn index_by(
    rows: &[&Measurement],
    key: Axis,
    metric: Metric,
    duplicated: &mut Vec<AxisValue>,
) -> Vec<(AxisValue, f64)> {
    let mut out: Vec<(AxisValue, f64)> = Vec::with_capacity(rows.len());
    for row in rows {
        let k = row.axis(key);
        if out.iter().any(|(seen, _)| *seen == k) {
            if !duplicated.contains(&k) {
                duplicated.push(k);
            }
            continue;
        }
        out.push((k, row.metric(metric)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::row;
    use crate::data::model::TransferMode::{Parallel, Serial};

    #[test]
    fn points_follow_row_order() {
        let rows = [
            row(16, 1, Parallel, 4096, 10.0, 1.0),
            row(1, 1, Parallel, 4096, 100.0, 1.0),
            row(4, 1, Parallel, 4096, 30.0, 1.0),
        ];
        let refs: Vec<&Measurement> = rows.iter().collect();
        assert_eq!(
            points(&refs, Axis::NrDpus, Metric::WriteMean),
            vec![(16.0, 10.0), (1.0, 100.0), (4.0, 30.0)]
        );
    }

    #[test]
    fn mode_axis_has_no_points() {
        let rows = [row(1, 1, Serial, 512, 1.0, 1.0)];
        let refs: Vec<&Measurement> = rows.iter().collect();
        assert!(points(&refs, Axis::Mode, Metric::ReadMean).is_empty());
    }

    #[test]
    fn pivot_cells_are_means_of_matching_rows() {
        let rows = [
            row(8, 1, Parallel, 1024, 4.0, 0.0),
            row(1, 1, Parallel, 512, 2.0, 0.0),
            row(8, 1, Parallel, 1024, 6.0, 0.0),
            row(1, 1, Parallel, 1024, 3.0, 0.0),
        ];
        let refs: Vec<&Measurement> = rows.iter().collect();
        let grid = pivot_mean(&refs, Axis::NrDpus, Axis::Size, Metric::WriteMean);

        assert_eq!(grid.row_keys, vec![AxisValue::Count(1), AxisValue::Count(8)]);
        assert_eq!(grid.column_keys, vec![AxisValue::Count(512), AxisValue::Count(1024)]);
        assert_eq!(grid.get(AxisValue::Count(8), AxisValue::Count(1024)), Some(5.0));
        assert_eq!(grid.get(AxisValue::Count(1), AxisValue::Count(512)), Some(2.0));
        assert_eq!(grid.get(AxisValue::Count(8), AxisValue::Count(512)), None);
        assert_eq!(grid.value_range(), Some((2.0, 5.0)));
    }

    #[test]
    fn empty_pivot() {
        let grid = pivot_mean(&[], Axis::NrDpus, Axis::Size, Metric::WriteMean);
        assert!(grid.row_keys.is_empty());
        assert!(grid.cells.is_empty());
        assert_eq!(grid.value_range(), None);
    }

    #[test]
    fn ratio_joins_on_key_not_position() {
        let serial = [
            row(1, 1, Serial, 4096, 100.0, 0.0),
            row(8, 1, Serial, 4096, 200.0, 0.0),
        ];
        let parallel = [
            row(8, 1, Parallel, 4096, 50.0, 0.0),
            row(1, 1, Parallel, 4096, 100.0, 0.0),
        ];
        let s: Vec<&Measurement> = serial.iter().collect();
        let p: Vec<&Measurement> = parallel.iter().collect();

        let ratio = keyed_ratio(&s, &p, Axis::NrDpus, Metric::WriteMean).unwrap();
        assert_eq!(
            ratio,
            vec![(AxisValue::Count(1), 1.0), (AxisValue::Count(8), 4.0)]
        );
    }

    #[test]
    fn ratio_is_positive_and_one_only_for_equal_latencies() {
        let serial = [
            row(1, 1, Serial, 4096, 3.0, 0.0),
            row(2, 1, Serial, 4096, 7.5, 0.0),
        ];
        let parallel = [
            row(1, 1, Parallel, 4096, 3.0, 0.0),
            row(2, 1, Parallel, 4096, 2.5, 0.0),
        ];
        let s: Vec<&Measurement> = serial.iter().collect();
        let p: Vec<&Measurement> = parallel.iter().collect();

        let ratio = keyed_ratio(&s, &p, Axis::NrDpus, Metric::WriteMean).unwrap();
        assert!(ratio.iter().all(|(_, r)| *r > 0.0));
        assert_eq!(ratio[0].1, 1.0);
        assert!(ratio[1].1 != 1.0);
    }

    #[test]
    fn unmatched_key_is_a_shape_mismatch() {
        let serial = [
            row(1, 1, Serial, 4096, 1.0, 0.0),
            row(8, 1, Serial, 4096, 1.0, 0.0),
        ];
        let parallel = [row(1, 1, Parallel, 4096, 1.0, 0.0)];
        let s: Vec<&Measurement> = serial.iter().collect();
        let p: Vec<&Measurement> = parallel.iter().collect();

        let err = keyed_ratio(&s, &p, Axis::NrDpus, Metric::WriteMean).unwrap_err();
        assert_eq!(err.unmatched, vec![AxisValue::Count(8)]);
        assert_eq!(err.axis, "nr_dpus");
    }

    #[test]
    fn duplicated_key_is_a_shape_mismatch() {
        let serial = [
            row(1, 1, Serial, 4096, 1.0, 0.0),
            row(1, 1, Serial, 4096, 2.0, 0.0),
        ];
        let parallel = [row(1, 1, Parallel, 4096, 1.0, 0.0)];
        let s: Vec<&Measurement> = serial.iter().collect();
        let p: Vec<&Measurement> = parallel.iter().collect();

        let err = keyed_ratio(&s, &p, Axis::NrDpus, Metric::WriteMean).unwrap_err();
        assert_eq!(err.duplicated, vec![AxisValue::Count(1)]);
        assert!(err.unmatched.is_empty());
    }
}
