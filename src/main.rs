use dpu_bench_plots::pipeline::{self, PipelineConfig};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = PipelineConfig::default();
    let charts = pipeline::run(&config)?;

    println!("✓ All plots generated in ./{}/", config.output_dir.display());
    println!("\nGenerated plots:");
    for chart in &charts {
        println!("  {} - {}", chart.file_name, chart.description);
    }
    Ok(())
}
