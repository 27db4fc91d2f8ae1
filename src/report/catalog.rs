use crate::data::filter::Predicate;
use crate::data::model::{Axis, AxisValue, Metric, TransferMode};

use super::{
    ChartKind, Grouping, LineKind, MarkerKind, PanelSpec, ReferenceLine, ReportSpec, TraceSpec,
};

/// Transfer size the single-size comparisons focus on.
pub const FOCUS_SIZE: u64 = 4096;
/// DPU count the tasklet comparison focuses on.
pub const FOCUS_DPUS: u64 = 16;

const LATENCY_US: &str = "Latency (µs)";

fn dpus_label(v: &AxisValue) -> String {
    format!("{v} DPUs")
}

fn tasklets_label(v: &AxisValue) -> String {
    format!("{v} tasklets")
}

fn mode_label(v: &AxisValue) -> String {
    match v {
        AxisValue::Mode(m) => m.title().to_string(),
        other => other.to_string(),
    }
}

fn bytes_label(v: &AxisValue) -> String {
    format!("{v}B")
}

fn both_modes() -> Grouping {
    Grouping::Fixed(
        Axis::Mode,
        vec![
            AxisValue::Mode(TransferMode::Serial),
            AxisValue::Mode(TransferMode::Parallel),
        ],
    )
}

fn write_read_panels(write_title: &'static str, read_title: &'static str) -> Vec<PanelSpec> {
    vec![
        PanelSpec {
            title: write_title,
            y_desc: LATENCY_US,
            traces: vec![TraceSpec::solid(Metric::WriteMean)],
        },
        PanelSpec {
            title: read_title,
            y_desc: LATENCY_US,
            traces: vec![TraceSpec::solid(Metric::ReadMean)],
        },
    ]
}

/// The six reports, in output order.
pub fn catalog() -> Vec<ReportSpec> {
    let single_tasklet = Predicate::count(Axis::NrTasklets, 1);
    let parallel = Predicate::mode(TransferMode::Parallel);
    let focus_size = Predicate::count(Axis::Size, FOCUS_SIZE);

    vec![
        ReportSpec {
            file_name: "01_latency_vs_size.png",
            description: "Latency scaling with transfer size",
            figure_size: (15.0, 6.0),
            kind: ChartKind::Lines {
                fixed: vec![parallel, single_tasklet],
                grouping: Grouping::FirstAppearance(Axis::NrDpus),
                x_axis: Axis::Size,
                label: dpus_label,
                panels: write_read_panels("WRITE Latency vs Size", "READ Latency vs Size"),
            },
        },
        ReportSpec {
            file_name: "02_serial_vs_parallel.png",
            description: "Serial vs Parallel comparison",
            figure_size: (15.0, 6.0),
            kind: ChartKind::Lines {
                fixed: vec![focus_size, single_tasklet],
                grouping: both_modes(),
                x_axis: Axis::NrDpus,
                label: mode_label,
                panels: write_read_panels(
                    "WRITE Latency: Serial vs Parallel (4KB)",
                    "READ Latency: Serial vs Parallel (4KB)",
                ),
            },
        },
        ReportSpec {
            file_name: "03_throughput_scaling.png",
            description: "Aggregate throughput",
            figure_size: (12.0, 6.0),
            kind: ChartKind::Lines {
                fixed: vec![focus_size, single_tasklet],
                grouping: both_modes(),
                x_axis: Axis::NrDpus,
                label: mode_label,
                panels: vec![PanelSpec {
                    title: "Aggregate Throughput vs DPU Count (4KB transfers)",
                    y_desc: "Throughput (MB/s)",
                    traces: vec![
                        TraceSpec {
                            metric: Metric::WriteThroughput,
                            line: LineKind::Solid,
                            marker: MarkerKind::Circle,
                            suffix: " Write",
                        },
                        TraceSpec {
                            metric: Metric::ReadThroughput,
                            line: LineKind::Dashed,
                            marker: MarkerKind::Square,
                            suffix: " Read",
                        },
                    ],
                }],
            },
        },
        ReportSpec {
            file_name: "04_heatmap_write.png",
            description: "Latency heatmap",
            figure_size: (10.0, 6.0),
            kind: ChartKind::Heatmap {
                fixed: vec![parallel, single_tasklet],
                row_axis: Axis::NrDpus,
                column_axis: Axis::Size,
                metric: Metric::WriteMean,
                precision: 1,
                title: "WRITE Latency Heatmap (µs): DPUs × Size (Parallel)",
            },
        },
        ReportSpec {
            file_name: "05_tasklets_impact.png",
            description: "Impact of tasklets",
            figure_size: (15.0, 6.0),
            kind: ChartKind::Lines {
                fixed: vec![Predicate::count(Axis::NrDpus, FOCUS_DPUS), parallel],
                grouping: Grouping::FirstAppearance(Axis::NrTasklets),
                x_axis: Axis::Size,
                label: tasklets_label,
                panels: write_read_panels(
                    "WRITE: Tasklets Impact (16 DPUs, Parallel)",
                    "READ: Tasklets Impact (16 DPUs, Parallel)",
                ),
            },
        },
        ReportSpec {
            file_name: "06_speedup.png",
            description: "Parallel speedup",
            figure_size: (12.0, 6.0),
            kind: ChartKind::Speedup {
                fixed: vec![single_tasklet],
                split: Grouping::Fixed(
                    Axis::Size,
                    vec![AxisValue::Count(4096), AxisValue::Count(8192)],
                ),
                label: bytes_label,
                numerator: TransferMode::Serial,
                denominator: TransferMode::Parallel,
                key: Axis::NrDpus,
                metric: Metric::WriteMean,
                title: "Parallel Speedup vs Serial (WRITE)",
                y_desc: "Speedup (Serial / Parallel)",
                reference: ReferenceLine {
                    y: 1.0,
                    label: "No speedup",
                },
            },
        },
    ]
}
