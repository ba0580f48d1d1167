use crate::chart::{ChartRenderer, ChartSpec};
use crate::figures::{catalogue, Target};
use crate::results::ResultsBundle;
use crate::table::{Column, LongFormTable};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;

/// Inputs and outputs of a report run
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Directory holding one `<allocator>.json` per allocator
    pub results_dir: PathBuf,
    /// Memory-access results of the instrumented mpp build
    pub access_memory_file: PathBuf,
    pub output_dir: PathBuf,
    /// Allocators in chart order
    pub allocators: Vec<String>,
    /// Allocators left out of comparison figures
    pub excluded: Vec<String>,
    /// Per-target replacement for `excluded`
    pub figure_exclusions: HashMap<Target, Vec<String>>,
    /// Allocator whose mean is drawn as the reference line
    pub baseline: String,
    /// Print per-figure sample summaries
    pub verbose: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("2022-10-26T-16_26_25Z"),
            access_memory_file: PathBuf::from("mpp_access_memory.json"),
            output_dir: PathBuf::from("."),
            allocators: ["jemalloc", "mimalloc", "mpp", "ptmalloc2", "ptmalloc3", "rpmalloc"]
                .into_iter()
                .map(String::from)
                .collect(),
            // ptmalloc3's build is not comparable with the others
            excluded: vec!["ptmalloc3".to_string()],
            figure_exclusions: HashMap::new(),
            baseline: "mpp".to_string(),
            verbose: false,
        }
    }
}

fn y_desc(column: Column, table: &LongFormTable) -> String {
    match column {
        Column::Time => format!("Time ({})", table.time_unit().unwrap_or("ns")),
        Column::Memory => "Peak memory usage".to_string(),
    }
}

/// Load all results, then render every figure in order.
///
/// Returns the paths of the written charts.
pub fn run<R: ChartRenderer>(config: &ReportConfig, renderer: &mut R) -> Result<Vec<PathBuf>> {
    println!("Loading results from {}...", config.results_dir.display());
    let bundle = ResultsBundle::load(
        &config.results_dir,
        &config.allocators,
        &config.access_memory_file,
    )?;
    for dataset in bundle.datasets() {
        println!("  {}: {} records", dataset.allocator, dataset.records.len());
    }
    println!(
        "  {}: {} records",
        config.access_memory_file.display(),
        bundle.access_memory.len()
    );

    std::fs::create_dir_all(&config.output_dir).context("Failed to create output directory")?;

    println!("\nGenerating charts...");
    let mut written = Vec::new();

    for figure in catalogue(
        &config.allocators,
        &config.excluded,
        &config.figure_exclusions,
    ) {
        let groups = figure.source.extract(&bundle);
        for group in groups.iter().filter(|g| g.is_empty()) {
            eprintln!(
                "  warning: no samples of {} for {}",
                group.fragment, group.label
            );
        }

        let table = LongFormTable::expand(&groups);

        for plan in &figure.charts {
            if config.verbose {
                print_summary(&plan.title, &table, plan.column);
            }

            let reference = if plan.with_reference {
                let mean = table.mean(&config.baseline, plan.column);
                if mean.is_none() {
                    eprintln!(
                        "  warning: baseline {} has no {} samples, {} has no reference line",
                        config.baseline,
                        plan.column.name(),
                        plan.file_name
                    );
                }
                mean
            } else {
                None
            };

            let spec = ChartSpec {
                kind: plan.kind,
                column: plan.column,
                title: plan.title.clone(),
                x_desc: figure.source.category_desc().to_string(),
                y_desc: y_desc(plan.column, &table),
                reference,
                path: config.output_dir.join(&plan.file_name),
            };

            renderer.render(&table, &spec)?;
            println!("Generated: {}", spec.path.display());
            written.push(spec.path);
        }
    }

    Ok(written)
}

/// Print per-category statistics for one chart
pub fn print_summary(title: &str, table: &LongFormTable, column: Column) {
    println!("\n{:=<72}", "");
    println!("{title}");
    println!("{:=<72}", "");
    println!(
        "  {:<16} {:>8} {:>14} {:>14} {:>14}",
        "Category", "Samples", "Mean", "Min", "Max"
    );
    println!("  {:-<70}", "");

    let fmt = |v: Option<f64>| v.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".to_string());
    for row in table.summary(column) {
        println!(
            "  {:<16} {:>8} {:>14} {:>14} {:>14}",
            row.label,
            row.samples,
            fmt(row.mean),
            fmt(row.min),
            fmt(row.max)
        );
    }
}
