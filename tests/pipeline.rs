use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use dpu_bench_plots::data::aggregate::ShapeMismatchError;
use dpu_bench_plots::data::loader::DataLoadError;
use dpu_bench_plots::pipeline::{self, GeneratedChart, PipelineConfig};
use dpu_bench_plots::report::ChartData;
use dpu_bench_plots::style::ChartStyle;

const HEADER: &str = "nr_dpus,nr_tasklets,size,mode,write_mean_us,write_min_us,write_max_us,\
write_std_us,write_throughput_mbps,read_mean_us,read_min_us,read_max_us,read_std_us,read_throughput_mbps";

/// One harness row; min/max/std are filler and throughput follows from the latency.
fn csv_row(nr_dpus: u64, nr_tasklets: u64, size: u64, mode: &str, write: f64, read: f64) -> String {
    let bytes = (size * nr_dpus) as f64;
    format!(
        "{nr_dpus},{nr_tasklets},{size},{mode},{write},{write},{write},0.0,{:.2},{read},{read},{read},0.0,{:.2}",
        bytes / write,
        bytes / read,
    )
}

fn write_input(dir: &Path, rows: &[String]) -> PathBuf {
    let path = dir.join("benchmark_results.csv");
    let mut contents = String::from(HEADER);
    for row in rows {
        contents.push('\n');
        contents.push_str(row);
    }
    contents.push('\n');
    std::fs::write(&path, contents).unwrap();
    path
}

fn config(dir: &Path, input: PathBuf) -> PipelineConfig {
    PipelineConfig {
        input,
        output_dir: dir.join("plots"),
        style: ChartStyle {
            dpi: 40.0,
            ..ChartStyle::default()
        },
    }
}

/// A small table touching every report.
fn full_grid() -> Vec<String> {
    let mut rows = Vec::new();
    for nr_dpus in [1, 4, 16] {
        for nr_tasklets in [1, 4] {
            for size in [512, 4096, 8192] {
                let per_dpu = 4.0 + size as f64 / 380.0;
                let serial = per_dpu * nr_dpus as f64;
                let parallel = 12.0 + per_dpu * (1.0 + (nr_dpus as f64).log2() * 0.35);
                rows.push(csv_row(nr_dpus, nr_tasklets, size, "serial", serial, serial * 1.1));
                rows.push(csv_row(
                    nr_dpus,
                    nr_tasklets,
                    size,
                    "parallel",
                    parallel,
                    parallel * 1.1,
                ));
            }
        }
    }
    rows
}

fn chart<'a>(charts: &'a [GeneratedChart], file_name: &str) -> &'a GeneratedChart {
    charts
        .iter()
        .find(|c| c.file_name == file_name)
        .unwrap_or_else(|| panic!("{file_name} was not generated"))
}

#[test]
fn writes_six_png_reports() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), &full_grid());
    let charts = pipeline::run(&config(dir.path(), input)).unwrap();

    let names: Vec<&str> = charts.iter().map(|c| c.file_name).collect();
    assert_eq!(
        names,
        vec![
            "01_latency_vs_size.png",
            "02_serial_vs_parallel.png",
            "03_throughput_scaling.png",
            "04_heatmap_write.png",
            "05_tasklets_impact.png",
            "06_speedup.png",
        ]
    );

    for chart in &charts {
        let image = image::open(&chart.path).unwrap();
        assert!(image.width() > 0 && image.height() > 0);
    }
    let (w, h) = image::image_dimensions(&chart(&charts, "01_latency_vs_size.png").path).unwrap();
    assert_eq!((w, h), (600, 240));

    match &chart(&charts, "04_heatmap_write.png").data {
        ChartData::Heatmap(heatmap) => {
            assert_eq!(heatmap.grid.row_keys.len(), 3);
            assert_eq!(heatmap.grid.column_keys.len(), 3);
        }
        other => panic!("expected a heatmap, got {other:?}"),
    }
}

#[test]
fn latency_series_keep_dpu_order() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(
        dir.path(),
        &[
            csv_row(1, 1, 4096, "parallel", 100.0, 110.0),
            csv_row(4, 1, 4096, "parallel", 30.0, 33.0),
            csv_row(16, 1, 4096, "parallel", 10.0, 11.0),
            csv_row(1, 1, 4096, "serial", 100.0, 110.0),
            csv_row(4, 1, 4096, "serial", 120.0, 132.0),
            csv_row(16, 1, 4096, "serial", 160.0, 176.0),
        ],
    );
    let charts = pipeline::run(&config(dir.path(), input)).unwrap();
    assert_eq!(charts.len(), 6);
    let data = &chart(&charts, "01_latency_vs_size.png").data;

    let labels: Vec<&str> = data.panels()[0]
        .series
        .iter()
        .map(|s| s.label.as_str())
        .collect();
    assert_eq!(labels, vec!["1 DPUs", "4 DPUs", "16 DPUs"]);

    let at_4096: Vec<f64> = data.panels()[0]
        .series
        .iter()
        .flat_map(|s| s.points.iter().filter(|(x, _)| *x == 4096.0).map(|&(_, y)| y))
        .collect();
    assert_eq!(at_4096, vec![100.0, 30.0, 10.0]);
}

#[test]
fn speedup_is_serial_over_parallel() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(
        dir.path(),
        &[
            csv_row(8, 1, 4096, "serial", 200.0, 220.0),
            csv_row(8, 1, 4096, "parallel", 50.0, 55.0),
        ],
    );
    let charts = pipeline::run(&config(dir.path(), input)).unwrap();
    let data = &chart(&charts, "06_speedup.png").data;

    let series = data.series(0, "4096B").unwrap();
    assert_eq!(series.points, vec![(8.0, 4.0)]);
    assert!(data.series(0, "8192B").unwrap().points.is_empty());

    let reference = data.panels()[0].reference.unwrap();
    assert_eq!(reference.y, 1.0);
}

#[test]
fn missing_focus_rows_still_produce_a_chart() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(
        dir.path(),
        &[
            csv_row(1, 1, 4096, "parallel", 20.0, 22.0),
            csv_row(1, 4, 4096, "parallel", 21.0, 23.0),
            csv_row(1, 1, 4096, "serial", 20.0, 22.0),
        ],
    );
    let charts = pipeline::run(&config(dir.path(), input)).unwrap();
    let tasklets = chart(&charts, "05_tasklets_impact.png");

    assert!(tasklets.path.is_file());
    assert!(tasklets.data.panels().iter().all(|p| p.is_empty()));
}

#[test]
fn rerunning_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), &full_grid());
    let config = config(dir.path(), input);

    let first = pipeline::run(&config).unwrap();
    let second = pipeline::run(&config).unwrap();
    assert_eq!(first, second);

    let on_disk: BTreeSet<String> = std::fs::read_dir(&config.output_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(on_disk.len(), 6);
}

#[test]
fn missing_input_fails_before_any_chart() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), dir.path().join("benchmark_results.csv"));

    let err = pipeline::run(&config).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DataLoadError>(),
        Some(DataLoadError::NotFound(_))
    ));
    assert!(!config.output_dir.exists());
}

#[test]
fn unpaired_speedup_rows_abort_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(
        dir.path(),
        &[
            csv_row(8, 1, 4096, "serial", 200.0, 220.0),
            csv_row(16, 1, 4096, "serial", 400.0, 440.0),
            csv_row(8, 1, 4096, "parallel", 50.0, 55.0),
        ],
    );
    let config = config(dir.path(), input);

    let err = pipeline::run(&config).unwrap_err();
    let mismatch = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<ShapeMismatchError>())
        .expect("shape mismatch in the error chain");
    assert_eq!(mismatch.axis, "nr_dpus");

    assert!(config.output_dir.join("05_tasklets_impact.png").is_file());
    assert!(!config.output_dir.join("06_speedup.png").exists());
}
