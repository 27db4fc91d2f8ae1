use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;

use crate::data::loader::{ensure_output_dir, load_file};
use crate::data::model::BenchmarkTable;
use crate::report::{self, ChartData, ReportSpec};
use crate::style::ChartStyle;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Where the table comes from, where charts go, and how they look.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub style: ChartStyle,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("benchmark_results.csv"),
            output_dir: PathBuf::from("plots"),
            style: ChartStyle::default(),
        }
    }
}

/// One chart written by a run.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedChart {
    pub file_name: &'static str,
    pub description: &'static str,
    pub path: PathBuf,
    pub data: ChartData,
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Load the table, then generate every report in catalog order.
///
/// The first failing report aborts the run; reports after it are not drawn.
pub fn run(config: &PipelineConfig) -> Result<Vec<GeneratedChart>> {
    let table = load_file(&config.input)?;
    ensure_output_dir(&config.output_dir)?;

    report::catalog()
        .iter()
        .map(|spec| generate(spec, &table, config))
        .collect()
}

/// Prepare, render and write a single report.
pub fn generate(
    spec: &ReportSpec,
    table: &BenchmarkTable,
    config: &PipelineConfig,
) -> Result<GeneratedChart> {
    let data = report::prepare(spec, table)
        .with_context(|| format!("preparing {}", spec.file_name))?;

    let path = config.output_dir.join(spec.file_name);
    report::render_png(&data, spec.figure_size, &config.style, &path)
        .with_context(|| format!("rendering {}", spec.file_name))?;
    info!("wrote {}", path.display());

    Ok(GeneratedChart {
        file_name: spec.file_name,
        description: spec.description,
        path,
        data,
    })
}
