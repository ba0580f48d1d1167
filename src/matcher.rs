/// Name suffixes Google Benchmark appends to derived-statistic records
pub const AGGREGATE_SUFFIXES: &[&str] = &["_cv", "_stddev", "_median", "_mean"];

/// Return the aggregate-statistic suffix `name` ends with, if any
pub fn aggregate_suffix(name: &str) -> Option<&'static str> {
    AGGREGATE_SUFFIXES
        .iter()
        .copied()
        .find(|suffix| name.ends_with(suffix))
}

/// Whether `record_name` is a raw sample of the benchmark `fragment`.
///
/// The fragment must be a precise prefix: `BM_Allocate` also matches every
/// `BM_AllocateMany...` record.
pub fn matches(record_name: &str, fragment: &str) -> bool {
    record_name.starts_with(fragment) && aggregate_suffix(record_name).is_none()
}
