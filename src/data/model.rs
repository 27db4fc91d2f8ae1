use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TransferMode – how host-to-DPU transfers are issued
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    Serial,
    Parallel,
}

impl TransferMode {
    /// Capitalised name used in legends ("Serial", "Parallel").
    pub fn title(self) -> &'static str {
        match self {
            TransferMode::Serial => "Serial",
            TransferMode::Parallel => "Parallel",
        }
    }
}

impl fmt::Display for TransferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferMode::Serial => write!(f, "serial"),
            TransferMode::Parallel => write!(f, "parallel"),
        }
    }
}

impl FromStr for TransferMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "serial" => Ok(TransferMode::Serial),
            "parallel" => Ok(TransferMode::Parallel),
            other => Err(format!("unknown transfer mode '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Axis / Metric – names for the configuration and measured columns
// ---------------------------------------------------------------------------

/// A configuration column of the benchmark table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Axis {
    NrDpus,
    NrTasklets,
    Mode,
    Size,
}

impl Axis {
    pub const ALL: [Axis; 4] = [Axis::NrDpus, Axis::NrTasklets, Axis::Mode, Axis::Size];

    /// Column name in the input table.
    pub fn column(self) -> &'static str {
        match self {
            Axis::NrDpus => "nr_dpus",
            Axis::NrTasklets => "nr_tasklets",
            Axis::Mode => "mode",
            Axis::Size => "size",
        }
    }

    /// Axis description used on chart axes.
    pub fn description(self) -> &'static str {
        match self {
            Axis::NrDpus => "Number of DPUs",
            Axis::NrTasklets => "Number of tasklets",
            Axis::Mode => "Transfer mode",
            Axis::Size => "Transfer Size (bytes)",
        }
    }
}

/// A measured column of the benchmark table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    WriteMean,
    ReadMean,
    WriteThroughput,
    ReadThroughput,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::WriteMean,
        Metric::ReadMean,
        Metric::WriteThroughput,
        Metric::ReadThroughput,
    ];

    pub fn column(self) -> &'static str {
        match self {
            Metric::WriteMean => "write_mean_us",
            Metric::ReadMean => "read_mean_us",
            Metric::WriteThroughput => "write_throughput_mbps",
            Metric::ReadThroughput => "read_throughput_mbps",
        }
    }
}

// ---------------------------------------------------------------------------
// AxisValue – a single cell in a configuration column
// ---------------------------------------------------------------------------

/// The value of one row on one [`Axis`].
/// Ordered so it can key `BTreeMap`s (counts before modes, then by value).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AxisValue {
    Count(u64),
    Mode(TransferMode),
}

impl AxisValue {
    /// Numeric position on a chart axis. Modes have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AxisValue::Count(n) => Some(*n as f64),
            AxisValue::Mode(_) => None,
        }
    }
}

impl fmt::Display for AxisValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisValue::Count(n) => write!(f, "{n}"),
            AxisValue::Mode(m) => write!(f, "{m}"),
        }
    }
}

impl From<u64> for AxisValue {
    fn from(n: u64) -> Self {
        AxisValue::Count(n)
    }
}

impl From<TransferMode> for AxisValue {
    fn from(m: TransferMode) -> Self {
        AxisValue::Mode(m)
    }
}

// ---------------------------------------------------------------------------
// Measurement – one row of the benchmark table
// ---------------------------------------------------------------------------

/// One benchmark configuration and its measured latencies/throughputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub nr_dpus: u64,
    pub nr_tasklets: u64,
    pub mode: TransferMode,
    pub size: u64,
    pub write_mean_us: f64,
    pub read_mean_us: f64,
    pub write_throughput_mbps: f64,
    pub read_throughput_mbps: f64,
}

impl Measurement {
    pub fn axis(&self, axis: Axis) -> AxisValue {
        match axis {
            Axis::NrDpus => AxisValue::Count(self.nr_dpus),
            Axis::NrTasklets => AxisValue::Count(self.nr_tasklets),
            Axis::Mode => AxisValue::Mode(self.mode),
            Axis::Size => AxisValue::Count(self.size),
        }
    }

    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::WriteMean => self.write_mean_us,
            Metric::ReadMean => self.read_mean_us,
            Metric::WriteThroughput => self.write_throughput_mbps,
            Metric::ReadThroughput => self.read_throughput_mbps,
        }
    }
}

/// Column names every input table must provide.
pub fn required_columns() -> impl Iterator<Item = &'static str> {
    Axis::ALL
        .into_iter()
        .map(Axis::column)
        .chain(Metric::ALL.into_iter().map(Metric::column))
}

// ---------------------------------------------------------------------------
// BenchmarkTable – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed table with pre-computed per-axis distinct values.
#[derive(Debug, Clone)]
pub struct BenchmarkTable {
    /// All rows, in input order.
    pub rows: Vec<Measurement>,
    /// For each axis the distinct values in order of first appearance.
    distinct: BTreeMap<Axis, Vec<AxisValue>>,
}

impl BenchmarkTable {
    /// Build axis indices from the loaded rows.
    pub fn from_rows(rows: Vec<Measurement>) -> Self {
        let mut distinct: BTreeMap<Axis, Vec<AxisValue>> =
            Axis::ALL.into_iter().map(|a| (a, Vec::new())).collect();

        for row in &rows {
            for (axis, seen) in distinct.iter_mut() {
                let value = row.axis(*axis);
                if !seen.contains(&value) {
                    seen.push(value);
                }
            }
        }

        BenchmarkTable { rows, distinct }
    }

    /// Distinct values of `axis`, in the order they first appear.
    pub fn distinct(&self, axis: Axis) -> &[AxisValue] {
        self.distinct.get(&axis).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
