use log::{debug, warn};

use crate::data::aggregate::{keyed_ratio, pivot_mean, points, ShapeMismatchError};
use crate::data::filter::{describe, select, Predicate};
use crate::data::model::{AxisValue, BenchmarkTable, Measurement};

use super::{
    ChartData, ChartKind, HeatmapData, LineKind, MarkerKind, PanelData, ReportSpec, SeriesData,
};

/// Turn a report descriptor into the data its chart draws.
///
/// Empty selections are not errors: the affected series simply have no
/// points. The only failure is a speedup whose two sides do not pair up.
pub fn prepare(spec: &ReportSpec, table: &BenchmarkTable) -> Result<ChartData, ShapeMismatchError> {
    match &spec.kind {
        ChartKind::Lines {
            fixed,
            grouping,
            x_axis,
            label,
            panels,
        } => {
            let groups: Vec<(AxisValue, Vec<&Measurement>)> = grouping
                .values(table)
                .into_iter()
                .map(|value| {
                    let predicates = with(fixed, Predicate::new(grouping.axis(), value));
                    (value, select_logged(spec, table, &predicates))
                })
                .collect();

            let panels = panels
                .iter()
                .map(|panel| {
                    let mut series = Vec::new();
                    for (value, rows) in &groups {
                        for trace in &panel.traces {
                            series.push(SeriesData {
                                label: format!("{}{}", label(value), trace.suffix),
                                color_index: series.len(),
                                points: points(rows, *x_axis, trace.metric),
                                line: trace.line,
                                marker: trace.marker,
                            });
                        }
                    }
                    PanelData {
                        title: panel.title.to_string(),
                        x_desc: x_axis.description().to_string(),
                        y_desc: panel.y_desc.to_string(),
                        series,
                        reference: None,
                    }
                })
                .collect();

            Ok(ChartData::Lines(panels))
        }

        ChartKind::Heatmap {
            fixed,
            row_axis,
            column_axis,
            metric,
            precision,
            title,
        } => {
            let rows = select_logged(spec, table, fixed);
            let grid = pivot_mean(&rows, *row_axis, *column_axis, *metric);
            debug!(
                "{}: {}×{} grid",
                spec.file_name,
                grid.row_keys.len(),
                grid.column_keys.len()
            );

            Ok(ChartData::Heatmap(HeatmapData {
                title: title.to_string(),
                x_desc: column_axis.description().to_string(),
                y_desc: row_axis.description().to_string(),
                grid,
                precision: *precision,
            }))
        }

        ChartKind::Speedup {
            fixed,
            split,
            label,
            numerator,
            denominator,
            key,
            metric,
            title,
            y_desc,
            reference,
        } => {
            let mut series = Vec::new();
            for value in split.values(table) {
                let base = with(fixed, Predicate::new(split.axis(), value));
                let num = select_logged(spec, table, &with(&base, Predicate::mode(*numerator)));
                let den = select_logged(spec, table, &with(&base, Predicate::mode(*denominator)));

                let ratio = keyed_ratio(&num, &den, *key, *metric)?;
                series.push(SeriesData {
                    label: label(&value),
                    color_index: series.len(),
                    points: ratio
                        .iter()
                        .filter_map(|(k, r)| Some((k.as_f64()?, *r)))
                        .collect(),
                    line: LineKind::Solid,
                    marker: MarkerKind::Circle,
                });
            }

            Ok(ChartData::Lines(vec![PanelData {
                title: title.to_string(),
                x_desc: key.description().to_string(),
                y_desc: y_desc.to_string(),
                series,
                reference: Some(*reference),
            }]))
        }
    }
}

fn with(fixed: &[Predicate], extra: Predicate) -> Vec<Predicate> {
    let mut predicates = fixed.to_vec();
    predicates.push(extra);
    predicates
}

fn select_logged<'a>(
    spec: &ReportSpec,
    table: &'a BenchmarkTable,
    predicates: &[Predicate],
) -> Vec<&'a Measurement> {
    let rows = select(table, predicates);
    if rows.is_empty() {
        warn!(
            "{}: no rows match [{}]; series left empty",
            spec.file_name,
            describe(predicates)
        );
    }
    rows
}
