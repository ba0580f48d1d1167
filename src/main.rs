use alloc_bench_charts::report::{run, ReportConfig};
use alloc_bench_charts::PlottersRenderer;
use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
#[command(name = "alloc-bench-charts")]
#[command(about = "Render allocator comparison charts from benchmark results")]
struct Cli {
    /// Print per-chart sample summaries
    #[arg(short, long, default_value = "false")]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ReportConfig {
        verbose: cli.verbose,
        ..ReportConfig::default()
    };

    let written = run(&config, &mut PlottersRenderer)?;

    println!("\nWrote {} charts to {}", written.len(), config.output_dir.display());
    Ok(())
}
