use serde::Deserialize;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// A single record from a Google Benchmark JSON dump
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BenchmarkRecord {
    /// Full benchmark name, including parameters and any aggregate suffix
    pub name: String,
    /// Elapsed wall-clock time, in `time_unit`
    pub real_time: f64,
    /// Peak memory counter, only emitted by memory-tracking benchmarks
    #[serde(rename = "PeakMemoryUsage", default)]
    pub peak_memory_usage: Option<f64>,
    #[serde(default)]
    pub time_unit: Option<String>,
}

impl BenchmarkRecord {
    pub fn new(name: impl Into<String>, real_time: f64) -> Self {
        Self {
            name: name.into(),
            real_time,
            peak_memory_usage: None,
            time_unit: None,
        }
    }

    pub fn with_peak_memory(mut self, peak: f64) -> Self {
        self.peak_memory_usage = Some(peak);
        self
    }
}

/// All records produced by one allocator's build
#[derive(Debug, Clone)]
pub struct AllocatorDataset {
    pub allocator: String,
    pub records: Vec<BenchmarkRecord>,
}

/// Errors raised while loading result documents
#[derive(Debug)]
pub enum LoadError {
    /// An expected input file does not exist.
    MissingFile(PathBuf),
    /// The document is not JSON, or has no `benchmarks` array of records.
    MalformedDocument { path: PathBuf, reason: String },
    /// Any other failure while reading the file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::MissingFile(path) => {
                write!(f, "missing results file: {}", path.display())
            }
            LoadError::MalformedDocument { path, reason } => {
                write!(f, "malformed results file {}: {reason}", path.display())
            }
            LoadError::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Results for every allocator under test plus the memory-access dataset.
///
/// Datasets are kept in load order, which is the caller's allocator order.
#[derive(Debug, Clone, Default)]
pub struct ResultsBundle {
    datasets: Vec<AllocatorDataset>,
    pub access_memory: Vec<BenchmarkRecord>,
}

impl ResultsBundle {
    pub fn new(datasets: Vec<AllocatorDataset>, access_memory: Vec<BenchmarkRecord>) -> Self {
        Self {
            datasets,
            access_memory,
        }
    }

    /// Load `<results_dir>/<allocator>.json` for each allocator and the
    /// auxiliary memory-access document.
    pub fn load<S: AsRef<str>>(
        results_dir: &Path,
        allocators: &[S],
        access_memory_path: &Path,
    ) -> Result<Self, LoadError> {
        let mut datasets = Vec::with_capacity(allocators.len());
        for allocator in allocators {
            let allocator = allocator.as_ref();
            let path = results_dir.join(format!("{allocator}.json"));
            datasets.push(AllocatorDataset {
                allocator: allocator.to_string(),
                records: load_records(&path)?,
            });
        }

        let access_memory = load_records(access_memory_path)?;

        Ok(Self::new(datasets, access_memory))
    }

    pub fn get(&self, allocator: &str) -> Option<&AllocatorDataset> {
        self.datasets.iter().find(|d| d.allocator == allocator)
    }

    pub fn allocators(&self) -> impl Iterator<Item = &str> {
        self.datasets.iter().map(|d| d.allocator.as_str())
    }

    pub fn datasets(&self) -> &[AllocatorDataset] {
        &self.datasets
    }
}

/// Read one results document and return its `benchmarks` records
pub fn load_records(path: &Path) -> Result<Vec<BenchmarkRecord>, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => LoadError::MissingFile(path.to_path_buf()),
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    parse_records(&text).map_err(|reason| LoadError::MalformedDocument {
        path: path.to_path_buf(),
        reason,
    })
}

fn parse_records(text: &str) -> Result<Vec<BenchmarkRecord>, String> {
    let mut doc: serde_json::Value =
        serde_json::from_str(text).map_err(|e| format!("invalid JSON: {e}"))?;

    let benchmarks = doc
        .get_mut("benchmarks")
        .ok_or_else(|| "top-level \"benchmarks\" key is missing".to_string())?
        .take();
    if !benchmarks.is_array() {
        return Err("\"benchmarks\" is not an array".to_string());
    }

    serde_json::from_value(benchmarks).map_err(|e| format!("invalid benchmark record: {e}"))
}
