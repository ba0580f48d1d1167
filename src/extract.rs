use crate::matcher::matches;
use crate::results::{BenchmarkRecord, ResultsBundle};

/// Samples of one benchmark fragment for one allocator or category
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedMeasurement {
    /// Allocator name, or category label for the memory-access dataset
    pub label: String,
    pub fragment: String,
    /// `real_time` of every matched record, in record order
    pub time: Vec<f64>,
    /// `PeakMemoryUsage` of every matched record, aligned with `time`;
    /// `None` when the family does not track memory
    pub memory: Option<Vec<Option<f64>>>,
    /// Unit reported by the first matched record
    pub time_unit: Option<String>,
}

impl GroupedMeasurement {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// No record matched the fragment for this label
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

/// Which allocators a figure compares, and in what order
#[derive(Debug, Clone)]
pub struct Selection {
    pub allocators: Vec<String>,
    pub excluded: Vec<String>,
}

impl Selection {
    pub fn new<S: AsRef<str>>(allocators: &[S], excluded: &[S]) -> Self {
        Self {
            allocators: allocators.iter().map(|a| a.as_ref().to_string()).collect(),
            excluded: excluded.iter().map(|a| a.as_ref().to_string()).collect(),
        }
    }

    /// Allocators in caller order, minus exclusions
    pub fn included(&self) -> impl Iterator<Item = &str> {
        self.allocators
            .iter()
            .filter(|a| !self.excluded.contains(a))
            .map(String::as_str)
    }
}

/// Collect the samples of `fragment` from `records`
pub fn collect(
    records: &[BenchmarkRecord],
    label: &str,
    fragment: &str,
    with_memory: bool,
) -> GroupedMeasurement {
    let matched: Vec<&BenchmarkRecord> = records
        .iter()
        .filter(|r| matches(&r.name, fragment))
        .collect();

    let memory = with_memory.then(|| matched.iter().map(|r| r.peak_memory_usage).collect());

    GroupedMeasurement {
        label: label.to_string(),
        fragment: fragment.to_string(),
        time: matched.iter().map(|r| r.real_time).collect(),
        memory,
        time_unit: matched.iter().find_map(|r| r.time_unit.clone()),
    }
}

/// One group per included allocator, in selection order.
///
/// An allocator without a dataset in the bundle yields an empty group.
pub fn group_by_allocator(
    bundle: &ResultsBundle,
    selection: &Selection,
    fragment: &str,
    with_memory: bool,
) -> Vec<GroupedMeasurement> {
    selection
        .included()
        .map(|allocator| {
            let records = bundle
                .get(allocator)
                .map(|d| d.records.as_slice())
                .unwrap_or_default();
            collect(records, allocator, fragment, with_memory)
        })
        .collect()
}

/// One group per `(label, fragment)` category of a single-producer dataset
pub fn group_by_category<L: AsRef<str>, F: AsRef<str>>(
    records: &[BenchmarkRecord],
    categories: &[(L, F)],
) -> Vec<GroupedMeasurement> {
    categories
        .iter()
        .map(|(label, fragment)| collect(records, label.as_ref(), fragment.as_ref(), false))
        .collect()
}
