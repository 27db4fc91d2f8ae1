use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

const DPU_COUNTS: [u64; 5] = [1, 8, 16, 32, 64];
const TASKLET_COUNTS: [u64; 4] = [1, 4, 8, 16];
const SIZES: [u64; 5] = [512, 1024, 2048, 4096, 8192];
const MODES: [&str; 2] = ["serial", "parallel"];
const ITERATIONS: usize = 20;

/// One row in the layout the benchmark harness writes.
#[derive(Debug, Serialize)]
struct HarnessRow {
    nr_dpus: u64,
    nr_tasklets: u64,
    size: u64,
    mode: &'static str,
    write_mean_us: f64,
    write_min_us: f64,
    write_max_us: f64,
    write_std_us: f64,
    write_throughput_mbps: f64,
    read_mean_us: f64,
    read_min_us: f64,
    read_max_us: f64,
    read_std_us: f64,
    read_throughput_mbps: f64,
}

/// Summary of `ITERATIONS` simulated transfers, rounded like the harness output.
struct Stats {
    mean: f64,
    min: f64,
    max: f64,
    std: f64,
    throughput_mbps: f64,
}

impl Stats {
    fn from_samples(samples: &[f64], total_bytes: u64) -> Self {
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let min = samples.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let std = (samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n).sqrt();
        // bytes per microsecond == MB/s
        let throughput_mbps = total_bytes as f64 / mean;
        Stats {
            mean: round2(mean),
            min: round2(min),
            max: round2(max),
            std: round2(std),
            throughput_mbps: round2(throughput_mbps),
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Expected transfer latency in µs for one configuration.
fn model_latency_us(nr_dpus: u64, nr_tasklets: u64, size: u64, mode: &str, write: bool) -> f64 {
    let per_dpu_us = 4.0 + size as f64 / if write { 380.0 } else { 320.0 };
    let tasklet_overhead = 1.0 + 0.015 * (nr_tasklets as f64).log2();
    let base = match mode {
        "serial" => per_dpu_us * nr_dpus as f64,
        _ => 12.0 + per_dpu_us * (1.0 + (nr_dpus as f64).log2() * 0.35),
    };
    base * tasklet_overhead
}

/// Seeded measurement noise: SplitMix64 uniforms, normals via Box-Muller.
struct Jitter {
    state: u64,
    /// Second Box-Muller output, used on the next draw.
    spare: Option<f64>,
}

impl Jitter {
    fn seeded(seed: u64) -> Self {
        Jitter { state: seed, spare: None }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in (0, 1].
    fn unit(&mut self) -> f64 {
        ((self.next_u64() >> 11) + 1) as f64 / (1u64 << 53) as f64
    }

    fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        let z = match self.spare.take() {
            Some(z) => z,
            None => {
                let radius = (-2.0 * self.unit().ln()).sqrt();
                let angle = std::f64::consts::TAU * self.unit();
                self.spare = Some(radius * angle.sin());
                radius * angle.cos()
            }
        };
        mean + std_dev * z
    }
}

fn simulate(rng: &mut Jitter) -> Vec<HarnessRow> {
    let mut rows = Vec::new();
    for &nr_dpus in &DPU_COUNTS {
        for &nr_tasklets in &TASKLET_COUNTS {
            for &size in &SIZES {
                for mode in MODES {
                    let mut run = |write: bool| {
                        let expected = model_latency_us(nr_dpus, nr_tasklets, size, mode, write);
                        let samples: Vec<f64> = (0..ITERATIONS)
                            .map(|_| rng.normal(expected, expected * 0.04).max(expected * 0.5))
                            .collect();
                        Stats::from_samples(&samples, size * nr_dpus)
                    };
                    let w = run(true);
                    let r = run(false);

                    rows.push(HarnessRow {
                        nr_dpus,
                        nr_tasklets,
                        size,
                        mode,
                        write_mean_us: w.mean,
                        write_min_us: w.min,
                        write_max_us: w.max,
                        write_std_us: w.std,
                        write_throughput_mbps: w.throughput_mbps,
                        read_mean_us: r.mean,
                        read_min_us: r.min,
                        read_max_us: r.max,
                        read_std_us: r.std,
                        read_throughput_mbps: r.throughput_mbps,
                    });
                }
            }
        }
    }
    rows
}

fn write_csv(path: &Path, rows: &[HarnessRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    for row in rows {
        writer.serialize(row).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV file")?;
    Ok(())
}

fn int_column(rows: &[HarnessRow], f: impl Fn(&HarnessRow) -> u64) -> ArrayRef {
    Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| f(r) as i64)))
}

fn float_column(rows: &[HarnessRow], f: impl Fn(&HarnessRow) -> f64) -> ArrayRef {
    Arc::new(Float64Array::from_iter_values(rows.iter().map(f)))
}

fn write_parquet(path: &Path, rows: &[HarnessRow]) -> Result<()> {
    let columns: Vec<(&str, ArrayRef)> = vec![
        ("nr_dpus", int_column(rows, |r| r.nr_dpus)),
        ("nr_tasklets", int_column(rows, |r| r.nr_tasklets)),
        ("size", int_column(rows, |r| r.size)),
        (
            "mode",
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.mode))) as ArrayRef,
        ),
        ("write_mean_us", float_column(rows, |r| r.write_mean_us)),
        ("write_min_us", float_column(rows, |r| r.write_min_us)),
        ("write_max_us", float_column(rows, |r| r.write_max_us)),
        ("write_std_us", float_column(rows, |r| r.write_std_us)),
        ("write_throughput_mbps", float_column(rows, |r| r.write_throughput_mbps)),
        ("read_mean_us", float_column(rows, |r| r.read_mean_us)),
        ("read_min_us", float_column(rows, |r| r.read_min_us)),
        ("read_max_us", float_column(rows, |r| r.read_max_us)),
        ("read_std_us", float_column(rows, |r| r.read_std_us)),
        ("read_throughput_mbps", float_column(rows, |r| r.read_throughput_mbps)),
    ];

    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|(name, array)| Field::new(*name, array.data_type().clone(), false))
            .collect::<Vec<_>>(),
    ));
    let batch = RecordBatch::try_new(
        schema.clone(),
        columns.into_iter().map(|(_, array)| array).collect(),
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let output_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("benchmark_results.csv"));

    let mut rng = Jitter::seeded(42);
    let rows = simulate(&mut rng);
    log::debug!("simulated {} configurations", rows.len());

    let ext = output_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "csv" => write_csv(&output_path, &rows)?,
        "parquet" | "pq" => write_parquet(&output_path, &rows)?,
        other => bail!("Unsupported output extension: .{other}"),
    }

    println!(
        "Wrote {} benchmark rows ({} DPU counts × {} tasklet counts × {} sizes × {} modes) to {}",
        rows.len(),
        DPU_COUNTS.len(),
        TASKLET_COUNTS.len(),
        SIZES.len(),
        MODES.len(),
        output_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulation_covers_the_full_grid() {
        let rows = simulate(&mut Jitter::seeded(42));
        assert_eq!(
            rows.len(),
            DPU_COUNTS.len() * TASKLET_COUNTS.len() * SIZES.len() * MODES.len()
        );
        assert_eq!(rows.len(), 200);

        for row in &rows {
            assert!(row.write_mean_us > 0.0 && row.read_mean_us > 0.0);
            assert!(row.write_min_us <= row.write_mean_us && row.write_mean_us <= row.write_max_us);
            assert!(row.read_std_us >= 0.0);
            assert!(row.write_throughput_mbps > 0.0);
        }
    }

    #[test]
    fn same_seed_same_table() {
        let a = simulate(&mut Jitter::seeded(7));
        let b = simulate(&mut Jitter::seeded(7));
        let means = |rows: &[HarnessRow]| -> Vec<f64> {
            rows.iter().map(|r| r.write_mean_us).collect()
        };
        assert_eq!(means(&a), means(&b));
    }

    #[test]
    fn parallel_beats_serial_at_scale() {
        let rows = simulate(&mut Jitter::seeded(42));
        let mean = |mode: &str| {
            rows.iter()
                .find(|r| r.nr_dpus == 64 && r.nr_tasklets == 1 && r.size == 4096 && r.mode == mode)
                .map(|r| r.write_mean_us)
                .unwrap()
        };
        assert!(mean("serial") > mean("parallel"));
    }

    #[test]
    fn normals_center_on_the_mean() {
        let mut jitter = Jitter::seeded(1);
        let n = 10_000;
        let avg = (0..n).map(|_| jitter.normal(50.0, 2.0)).sum::<f64>() / n as f64;
        assert!((avg - 50.0).abs() < 0.2);
    }
}
