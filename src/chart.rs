use crate::table::{self, Column, LongFormTable};
use anyhow::{Context, Result};
use plotters::data::Quartiles;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::PathBuf;

// Font sizes
const TITLE_FONT_SIZE: u32 = 32;
const AXIS_LABEL_FONT_SIZE: u32 = 22;
const TICK_LABEL_FONT_SIZE: u32 = 18;
const DATA_LABEL_FONT_SIZE: u32 = 16;

const CHART_SIZE: (u32, u32) = (1000, 600);
const X_LABEL_AREA_SIZE: u32 = 60;
const Y_LABEL_AREA_SIZE: u32 = 100;

const BOX_WIDTH: f64 = 0.6;
const BAR_WIDTH: f64 = 0.6;
const WHISKER_CAP: f64 = 0.12;

/// Category colors, cycled in axis order
const PALETTE: &[RGBColor] = &[
    RGBColor(44, 189, 254),  // Blue
    RGBColor(243, 160, 242), // Pink
    RGBColor(71, 219, 205),  // Green
    RGBColor(245, 177, 76),  // Amber
    RGBColor(157, 46, 197),  // Purple
    RGBColor(102, 29, 152),  // Violet
];

const REFERENCE_COLOR: RGBColor = RGBColor(220, 40, 40);

fn category_color(idx: usize) -> RGBColor {
    PALETTE[idx % PALETTE.len()]
}

/// How the samples of each category are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Box-and-whisker plot of the sample distribution
    Box,
    /// Mean with a 95% confidence whisker
    Bar,
}

/// Everything a renderer needs besides the table
#[derive(Debug, Clone)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub column: Column,
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    /// Baseline mean drawn as a dashed horizontal line
    pub reference: Option<f64>,
    pub path: PathBuf,
}

/// Sink that turns a long-form table into one image file
pub trait ChartRenderer {
    fn render(&mut self, table: &LongFormTable, spec: &ChartSpec) -> Result<()>;
}

/// Writes PNG charts with plotters' bitmap backend
#[derive(Debug, Default)]
pub struct PlottersRenderer;

impl ChartRenderer for PlottersRenderer {
    fn render(&mut self, table: &LongFormTable, spec: &ChartSpec) -> Result<()> {
        match spec.kind {
            ChartKind::Box => draw_box_chart(table, spec),
            ChartKind::Bar => draw_bar_chart(table, spec),
        }
        .with_context(|| format!("Failed to render {}", spec.path.display()))
    }
}

/// Box-and-whisker geometry for one category
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Furthest samples within 1.5 IQR of the box
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        let samples: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
        if samples.is_empty() {
            return None;
        }

        // Quartiles reports f32; classify samples at the same precision
        let [lower_fence, q1, median, q3, upper_fence] =
            Quartiles::new(samples.as_slice()).values();
        let fences = lower_fence..=upper_fence;

        let (inside, outliers): (Vec<f64>, Vec<f64>) = samples
            .iter()
            .copied()
            .partition(|&v| fences.contains(&(v as f32)));

        let (q1, median, q3) = (f64::from(q1), f64::from(median), f64::from(q3));
        Some(Self {
            q1,
            median,
            q3,
            whisker_low: inside.iter().copied().reduce(f64::min).unwrap_or(q1),
            whisker_high: inside.iter().copied().reduce(f64::max).unwrap_or(q3),
            outliers,
        })
    }
}

/// Mean and 95% confidence half-width for one category
#[derive(Debug, Clone, PartialEq)]
pub struct BarStats {
    pub mean: f64,
    pub ci: f64,
}

impl BarStats {
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        let mean = table::mean(samples)?;
        let n = samples.len() as f64;
        let ci = if samples.len() > 1 {
            let variance = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
            1.96 * (variance / n).sqrt()
        } else {
            0.0
        };
        Some(Self { mean, ci })
    }
}

/// Compact value for data labels
fn format_value(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("{:.2}G", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.2}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("{:.1}k", value / 1e3)
    } else {
        format!("{:.1}", value)
    }
}

/// Padded y-axis bounds covering `values`; `(0, 1)` when there are none
fn value_range(values: impl Iterator<Item = f64>, from_zero: bool) -> (f64, f64) {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !min.is_finite() {
        return (0.0, 1.0);
    }

    let low = if from_zero { min.min(0.0) } else { min };
    let span = max - low;
    let pad = if span > 0.0 {
        span * 0.1
    } else {
        max.abs().max(1.0) * 0.1
    };

    let low = if from_zero && low >= 0.0 { 0.0 } else { low - pad };
    (low, max + pad)
}

fn category_label(categories: &[String], x: f64) -> String {
    let idx = x.round();
    if idx < 0.0 || (x - idx).abs() >= 0.3 {
        return String::new();
    }
    categories.get(idx as usize).cloned().unwrap_or_default()
}

fn draw_box_chart(table: &LongFormTable, spec: &ChartSpec) -> Result<()> {
    let categories = table.categories();
    let num_categories = categories.len().max(1);
    let stats: Vec<Option<BoxStats>> = categories
        .iter()
        .map(|c| BoxStats::from_samples(&table.values(c, spec.column)))
        .collect();

    let (y_min, y_max) = value_range(
        table.all_values(spec.column).chain(spec.reference),
        false,
    );

    let root = BitMapBackend::new(&spec.path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&spec.title, ("sans-serif", TITLE_FONT_SIZE))
        .margin(20)
        .x_label_area_size(X_LABEL_AREA_SIZE)
        .y_label_area_size(Y_LABEL_AREA_SIZE)
        .build_cartesian_2d(-0.5..(num_categories as f64 - 0.5), y_min..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(num_categories)
        .x_label_formatter(&|x| category_label(categories, *x))
        .y_label_formatter(&|y| format_value(*y))
        .y_desc(spec.y_desc.as_str())
        .x_desc(spec.x_desc.as_str())
        .label_style(("sans-serif", TICK_LABEL_FONT_SIZE))
        .axis_desc_style(("sans-serif", AXIS_LABEL_FONT_SIZE))
        .draw()?;

    for (idx, stats) in stats.iter().enumerate() {
        // Empty groups keep their slot but draw nothing
        let Some(stats) = stats else { continue };

        let color = category_color(idx);
        let x = idx as f64;
        let left = x - BOX_WIDTH / 2.0;
        let right = x + BOX_WIDTH / 2.0;

        chart.draw_series(std::iter::once(Rectangle::new(
            [(left, stats.q1), (right, stats.q3)],
            color.mix(0.85).filled(),
        )))?;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(left, stats.q1), (right, stats.q3)],
            BLACK.stroke_width(1),
        )))?;

        chart.draw_series(vec![
            PathElement::new(
                vec![(left, stats.median), (right, stats.median)],
                BLACK.stroke_width(2),
            ),
            PathElement::new(vec![(x, stats.q3), (x, stats.whisker_high)], BLACK.stroke_width(1)),
            PathElement::new(vec![(x, stats.q1), (x, stats.whisker_low)], BLACK.stroke_width(1)),
            PathElement::new(
                vec![
                    (x - WHISKER_CAP, stats.whisker_high),
                    (x + WHISKER_CAP, stats.whisker_high),
                ],
                BLACK.stroke_width(1),
            ),
            PathElement::new(
                vec![
                    (x - WHISKER_CAP, stats.whisker_low),
                    (x + WHISKER_CAP, stats.whisker_low),
                ],
                BLACK.stroke_width(1),
            ),
        ])?;

        chart.draw_series(
            stats
                .outliers
                .iter()
                .map(|&v| Circle::new((x, v), 3, BLACK.stroke_width(1))),
        )?;
    }

    if let Some(reference) = spec.reference {
        chart.draw_series(DashedLineSeries::new(
            vec![
                (-0.5, reference),
                (num_categories as f64 - 0.5, reference),
            ],
            10,
            6,
            REFERENCE_COLOR.stroke_width(2),
        ))?;
    }

    root.present()?;
    Ok(())
}

fn draw_bar_chart(table: &LongFormTable, spec: &ChartSpec) -> Result<()> {
    let categories = table.categories();
    let num_categories = categories.len().max(1);
    let stats: Vec<Option<BarStats>> = categories
        .iter()
        .map(|c| BarStats::from_samples(&table.values(c, spec.column)))
        .collect();

    let (_, y_max) = value_range(
        stats
            .iter()
            .flatten()
            .map(|s| s.mean + s.ci)
            .chain(spec.reference),
        true,
    );
    let y_max = y_max * 1.05;

    let root = BitMapBackend::new(&spec.path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&spec.title, ("sans-serif", TITLE_FONT_SIZE))
        .margin(20)
        .x_label_area_size(X_LABEL_AREA_SIZE)
        .y_label_area_size(Y_LABEL_AREA_SIZE)
        .build_cartesian_2d(-0.5..(num_categories as f64 - 0.5), 0.0..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(num_categories)
        .x_label_formatter(&|x| category_label(categories, *x))
        .y_label_formatter(&|y| format_value(*y))
        .y_desc(spec.y_desc.as_str())
        .x_desc(spec.x_desc.as_str())
        .label_style(("sans-serif", TICK_LABEL_FONT_SIZE))
        .axis_desc_style(("sans-serif", AXIS_LABEL_FONT_SIZE))
        .draw()?;

    for (idx, stats) in stats.iter().enumerate() {
        let Some(stats) = stats else { continue };

        let color = category_color(idx);
        let x = idx as f64;
        let left = x - BAR_WIDTH / 2.0;
        let right = x + BAR_WIDTH / 2.0;
        let top = stats.mean + stats.ci;

        chart.draw_series(std::iter::once(Rectangle::new(
            [(left, 0.0), (right, stats.mean)],
            color.filled(),
        )))?;

        if stats.ci > 0.0 {
            let bottom = (stats.mean - stats.ci).max(0.0);
            chart.draw_series(vec![
                PathElement::new(vec![(x, bottom), (x, top)], BLACK.stroke_width(2)),
                PathElement::new(
                    vec![(x - WHISKER_CAP, top), (x + WHISKER_CAP, top)],
                    BLACK.stroke_width(2),
                ),
                PathElement::new(
                    vec![(x - WHISKER_CAP, bottom), (x + WHISKER_CAP, bottom)],
                    BLACK.stroke_width(2),
                ),
            ])?;
        }

        chart.draw_series(std::iter::once(Text::new(
            format_value(stats.mean),
            (x + BAR_WIDTH / 4.0, top + y_max * 0.01),
            ("sans-serif", DATA_LABEL_FONT_SIZE)
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Left, VPos::Bottom)),
        )))?;
    }

    if let Some(reference) = spec.reference {
        chart.draw_series(DashedLineSeries::new(
            vec![
                (-0.5, reference),
                (num_categories as f64 - 0.5, reference),
            ],
            10,
            6,
            REFERENCE_COLOR.stroke_width(2),
        ))?;
    }

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::GroupedMeasurement;
    use tempfile::TempDir;

    fn table_with_empty_category() -> LongFormTable {
        let group = |label: &str, time: Vec<f64>| GroupedMeasurement {
            label: label.to_string(),
            fragment: "BM_Complex/a".to_string(),
            memory: Some(time.iter().map(|t| Some(t * 100.0)).collect()),
            time,
            time_unit: Some("ns".to_string()),
        };
        LongFormTable::expand(&[
            group("jemalloc", vec![12.0, 14.0, 13.0]),
            group("mpp", Vec::new()),
            group("rpmalloc", vec![9.0, 11.0]),
        ])
    }

    fn spec(kind: ChartKind, column: Column, path: PathBuf) -> ChartSpec {
        ChartSpec {
            kind,
            column,
            title: "Complex benchmark".to_string(),
            x_desc: "Allocator".to_string(),
            y_desc: "Value".to_string(),
            reference: None,
            path,
        }
    }

    #[test]
    fn test_render_with_empty_category_and_no_reference() {
        let dir = TempDir::new().unwrap();
        let table = table_with_empty_category();
        let mut renderer = PlottersRenderer;

        let box_spec = spec(ChartKind::Box, Column::Time, dir.path().join("time.png"));
        let bar_spec = spec(ChartKind::Bar, Column::Memory, dir.path().join("mem.png"));

        renderer.render(&table, &box_spec).unwrap();
        renderer.render(&table, &bar_spec).unwrap();

        assert!(box_spec.path.is_file());
        assert!(bar_spec.path.is_file());
    }

    #[test]
    fn test_render_with_reference_line() {
        let dir = TempDir::new().unwrap();
        let table = table_with_empty_category();
        let mut spec = spec(ChartKind::Box, Column::Time, dir.path().join("ref.png"));
        spec.reference = table.mean("rpmalloc", Column::Time);

        PlottersRenderer.render(&table, &spec).unwrap();

        assert!(spec.path.is_file());
    }

    #[test]
    fn test_box_stats() {
        let stats = BoxStats::from_samples(&[5.0, 1.0, 100.0, 3.0, 2.0, 4.0]).unwrap();

        assert_eq!(stats.q1, 2.25);
        assert_eq!(stats.median, 3.5);
        assert_eq!(stats.q3, 4.75);
        assert_eq!(stats.whisker_low, 1.0);
        assert_eq!(stats.whisker_high, 5.0);
        assert_eq!(stats.outliers, vec![100.0]);
    }

    #[test]
    fn test_box_stats_single_sample() {
        let stats = BoxStats::from_samples(&[7.0]).unwrap();

        assert_eq!(stats.median, 7.0);
        assert_eq!(stats.whisker_low, 7.0);
        assert_eq!(stats.whisker_high, 7.0);
        assert!(stats.outliers.is_empty());
    }

    #[test]
    fn test_box_stats_empty() {
        assert!(BoxStats::from_samples(&[]).is_none());
        assert!(BoxStats::from_samples(&[f64::NAN]).is_none());
    }

    #[test]
    fn test_box_stats_large_timings() {
        let samples = [1_000_000_001.0; 4];

        let stats = BoxStats::from_samples(&samples).unwrap();

        assert!(stats.outliers.is_empty());
        assert_eq!(stats.whisker_low, 1_000_000_001.0);
        assert_eq!(stats.whisker_high, 1_000_000_001.0);
    }

    #[test]
    fn test_bar_stats() {
        let stats = BarStats::from_samples(&[2.0, 4.0]).unwrap();
        assert_eq!(stats.mean, 3.0);
        // sd = sqrt(2), se = 1
        assert!((stats.ci - 1.96).abs() < 1e-9);

        let single = BarStats::from_samples(&[2.0]).unwrap();
        assert_eq!(single.ci, 0.0);

        assert!(BarStats::from_samples(&[]).is_none());
    }

    #[test]
    fn test_value_range() {
        assert_eq!(value_range(std::iter::empty(), false), (0.0, 1.0));
        assert_eq!(value_range([f64::NAN].into_iter(), true), (0.0, 1.0));

        let (low, high) = value_range([10.0, 20.0].into_iter(), false);
        assert_eq!((low, high), (9.0, 21.0));

        let (low, high) = value_range([10.0, 20.0].into_iter(), true);
        assert_eq!((low, high), (0.0, 22.0));

        let (low, high) = value_range([5.0].into_iter(), false);
        assert!(low < 5.0 && high > 5.0);
    }

    #[test]
    fn test_category_label() {
        let categories = vec!["jemalloc".to_string(), "mpp".to_string()];

        assert_eq!(category_label(&categories, 0.0), "jemalloc");
        assert_eq!(category_label(&categories, 1.1), "mpp");
        assert_eq!(category_label(&categories, 0.5), "");
        assert_eq!(category_label(&categories, 2.0), "");
        assert_eq!(category_label(&categories, -1.0), "");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(12.34), "12.3");
        assert_eq!(format_value(4_500.0), "4.5k");
        assert_eq!(format_value(2_500_000.0), "2.50M");
        assert_eq!(format_value(3_000_000_000.0), "3.00G");
    }
}
