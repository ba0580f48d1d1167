pub mod chart;
pub mod extract;
pub mod figures;
pub mod matcher;
pub mod report;
pub mod results;
pub mod table;

pub use chart::{ChartRenderer, PlottersRenderer};
pub use results::{BenchmarkRecord, LoadError, ResultsBundle};
