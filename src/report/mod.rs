/// Report layer: declarative chart descriptors, data preparation, rendering.
///
/// ```text
///   ReportSpec ──┐
///                ├─ prepare ──▶ ChartData ── render ──▶ NN_name.png
///   BenchmarkTable┘
/// ```
///
/// The six reports differ only in their [`ReportSpec`]; there is one
/// preparation path per [`ChartKind`] and one renderer per [`ChartData`]
/// variant.

pub mod catalog;
pub mod prepare;
pub mod render;

use crate::data::aggregate::PivotGrid;
use crate::data::filter::Predicate;
use crate::data::model::{Axis, AxisValue, BenchmarkTable, Metric, TransferMode};

pub use catalog::catalog;
pub use prepare::prepare;
pub use render::render_png;

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

/// Legend label for one group value.
pub type LabelFn = fn(&AxisValue) -> String;

/// One fixed report: where it goes and how its data is selected.
#[derive(Debug, Clone)]
pub struct ReportSpec {
    /// File name inside the output directory.
    pub file_name: &'static str,
    /// One-line summary printed after a successful run.
    pub description: &'static str,
    /// Figure size in inches.
    pub figure_size: (f64, f64),
    pub kind: ChartKind,
}

#[derive(Debug, Clone)]
pub enum ChartKind {
    /// One series per group value and trace, on one or more side-by-side panels.
    Lines {
        fixed: Vec<Predicate>,
        grouping: Grouping,
        x_axis: Axis,
        label: LabelFn,
        panels: Vec<PanelSpec>,
    },
    /// Mean of `metric` over a `row_axis` × `column_axis` grid.
    Heatmap {
        fixed: Vec<Predicate>,
        row_axis: Axis,
        column_axis: Axis,
        metric: Metric,
        /// Decimal places in cell annotations.
        precision: usize,
        title: &'static str,
    },
    /// `numerator / denominator` mode ratio of `metric`, joined on `key`,
    /// one series per `split` value.
    Speedup {
        fixed: Vec<Predicate>,
        split: Grouping,
        label: LabelFn,
        numerator: TransferMode,
        denominator: TransferMode,
        key: Axis,
        metric: Metric,
        title: &'static str,
        y_desc: &'static str,
        reference: ReferenceLine,
    },
}

/// Which values of which axis become separate series.
#[derive(Debug, Clone, PartialEq)]
pub enum Grouping {
    /// Every distinct value, in order of first appearance in the table.
    FirstAppearance(Axis),
    /// Exactly these values, in this order.
    Fixed(Axis, Vec<AxisValue>),
}

impl Grouping {
    pub fn axis(&self) -> Axis {
        match self {
            Grouping::FirstAppearance(axis) | Grouping::Fixed(axis, _) => *axis,
        }
    }

    pub fn values(&self, table: &BenchmarkTable) -> Vec<AxisValue> {
        match self {
            Grouping::FirstAppearance(axis) => table.distinct(*axis).to_vec(),
            Grouping::Fixed(_, values) => values.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PanelSpec {
    pub title: &'static str,
    pub y_desc: &'static str,
    pub traces: Vec<TraceSpec>,
}

/// One metric drawn for every group on a panel.
#[derive(Debug, Clone)]
pub struct TraceSpec {
    pub metric: Metric,
    pub line: LineKind,
    pub marker: MarkerKind,
    /// Appended to the group label in the legend.
    pub suffix: &'static str,
}

impl TraceSpec {
    pub fn solid(metric: Metric) -> Self {
        TraceSpec {
            metric,
            line: LineKind::Solid,
            marker: MarkerKind::Circle,
            suffix: "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Solid,
    Dashed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Circle,
    Square,
    None,
}

/// A horizontal line across the whole panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceLine {
    pub y: f64,
    pub label: &'static str,
}

// ---------------------------------------------------------------------------
// Prepared chart data (renderer input)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    Lines(Vec<PanelData>),
    Heatmap(HeatmapData),
}

impl ChartData {
    pub fn panels(&self) -> &[PanelData] {
        match self {
            ChartData::Lines(panels) => panels,
            ChartData::Heatmap(_) => &[],
        }
    }

    /// Look up a series by panel index and legend label.
    pub fn series(&self, panel: usize, label: &str) -> Option<&SeriesData> {
        self.panels()
            .get(panel)?
            .series
            .iter()
            .find(|s| s.label == label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelData {
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    pub series: Vec<SeriesData>,
    pub reference: Option<ReferenceLine>,
}

impl PanelData {
    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.points.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesData {
    pub label: String,
    /// Position in the panel's colour cycle.
    pub color_index: usize,
    pub points: Vec<(f64, f64)>,
    pub line: LineKind,
    pub marker: MarkerKind,
}

impl SeriesData {
    pub fn ys(&self) -> Vec<f64> {
        self.points.iter().map(|&(_, y)| y).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapData {
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    pub grid: PivotGrid,
    pub precision: usize,
}
