use crate::chart::ChartKind;
use crate::extract::{group_by_allocator, group_by_category, GroupedMeasurement, Selection};
use crate::results::ResultsBundle;
use crate::table::Column;
use std::collections::HashMap;

/// Allocator-comparison benchmarks that get their own figures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    AllocateManyRandom4096,
    DeallocateManyRandom4096,
    /// 200'000 operations, transition matrix ver-1
    Complex200k,
    /// 1'000'000 operations, transition matrix ver-1
    Complex1m,
    /// 2'000'000 operations, transition matrix ver-1
    Complex2m,
}

impl Target {
    pub fn all() -> &'static [Target] {
        &[
            Target::AllocateManyRandom4096,
            Target::DeallocateManyRandom4096,
            Target::Complex200k,
            Target::Complex1m,
            Target::Complex2m,
        ]
    }

    /// Exact benchmark-name prefix, parameters included
    pub fn fragment(&self) -> &'static str {
        match self {
            Target::AllocateManyRandom4096 => "BM_AllocateManyRandom/4096",
            Target::DeallocateManyRandom4096 => "BM_DeallocateManyRandom/4096",
            Target::Complex200k => {
                "BM_Complex/\"Total ops: \" \"200'000\" \"Transition matrix: ver-1\"/iterations:5"
            }
            Target::Complex1m => {
                "BM_Complex/\"Total ops: \" \"1'000'000\" \"Transition matrix: ver-1\"/iterations:5"
            }
            Target::Complex2m => {
                "BM_Complex/\"Total ops: \" \"2'000'000\" \"Transition matrix: ver-1\"/iterations:5"
            }
        }
    }

    /// Whether records of this benchmark carry a `PeakMemoryUsage` counter
    pub fn tracks_memory(&self) -> bool {
        matches!(
            self,
            Target::Complex200k | Target::Complex1m | Target::Complex2m
        )
    }

    fn charts(&self) -> Vec<ChartPlan> {
        let time = |title: &str, file_name: &str| ChartPlan {
            kind: ChartKind::Box,
            column: Column::Time,
            title: title.to_string(),
            file_name: file_name.to_string(),
            with_reference: true,
        };
        let memory = |title: &str, file_name: &str| ChartPlan {
            kind: ChartKind::Bar,
            column: Column::Memory,
            title: title.to_string(),
            file_name: file_name.to_string(),
            with_reference: true,
        };

        match self {
            Target::AllocateManyRandom4096 => vec![time(
                "Benchmark Allocate 4096 (time)",
                "allocate-4096-time.png",
            )],
            Target::DeallocateManyRandom4096 => vec![time(
                "Benchmark Deallocate 4096 (time)",
                "deallocate-4096-time.png",
            )],
            Target::Complex200k => vec![
                time("Complex benchmark 200k (time)", "complex_200k-time.png"),
                memory("Complex benchmark 200k (mem)", "complex_200k-mem.png"),
            ],
            Target::Complex1m => vec![
                time("Complex benchmark 1m (time)", "complex_1m-time.png"),
                memory("Complex benchmark 1m (mem)", "complex_1m-mem.png"),
            ],
            Target::Complex2m => vec![
                time("Complex benchmark 2m (time)", "complex_2m-time.png"),
                memory("Complex benchmark 2m (mem)", "complex_2m-mem.png"),
            ],
        }
    }
}

/// Linked-list layouts measured by the memory-access benchmark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessPattern {
    /// Plain linked list without layouting
    Default,
    /// Randomized linked list with layouting
    Layouted,
    Randomized,
}

impl AccessPattern {
    pub fn all() -> &'static [AccessPattern] {
        &[
            AccessPattern::Default,
            AccessPattern::Layouted,
            AccessPattern::Randomized,
        ]
    }

    pub fn family(&self) -> &'static str {
        match self {
            AccessPattern::Default => "BM_AccessMemoryDefaultLinkedList",
            AccessPattern::Layouted => "BM_AccessMemoryRandomizedLayoutedLinkedList",
            AccessPattern::Randomized => "BM_AccessMemoryRandomizedLinkedList",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AccessPattern::Default => "Default",
            AccessPattern::Layouted => "Layouted",
            AccessPattern::Randomized => "Randomized",
        }
    }

    pub fn fragment(&self, list_size: u32) -> String {
        format!("{}/{}/manual_time", self.family(), list_size)
    }
}

/// List sizes of the memory-access benchmark, one figure each
pub const LIST_SIZES: &[u32] = &[2048, 8192, 16384];

/// Where a figure's groups come from
#[derive(Debug, Clone)]
pub enum Source {
    /// One group per selected allocator
    Allocators {
        selection: Selection,
        fragment: String,
        with_memory: bool,
    },
    /// One group per `(label, fragment)` of the memory-access dataset
    AccessMemory { categories: Vec<(String, String)> },
}

impl Source {
    pub fn extract(&self, bundle: &ResultsBundle) -> Vec<GroupedMeasurement> {
        match self {
            Source::Allocators {
                selection,
                fragment,
                with_memory,
            } => group_by_allocator(bundle, selection, fragment, *with_memory),
            Source::AccessMemory { categories } => {
                group_by_category(&bundle.access_memory, categories)
            }
        }
    }

    /// Description of the category axis
    pub fn category_desc(&self) -> &'static str {
        match self {
            Source::Allocators { .. } => "Allocator",
            Source::AccessMemory { .. } => "Benchmark",
        }
    }
}

/// One chart drawn from a figure's table
#[derive(Debug, Clone)]
pub struct ChartPlan {
    pub kind: ChartKind,
    pub column: Column,
    pub title: String,
    pub file_name: String,
    /// Draw the baseline allocator's mean
    pub with_reference: bool,
}

/// A group of charts sharing one extraction
#[derive(Debug, Clone)]
pub struct Figure {
    pub name: String,
    pub source: Source,
    pub charts: Vec<ChartPlan>,
}

/// The fixed set of report figures, in output order.
///
/// Every allocator figure gets its own selection. An entry in `overrides`
/// replaces the default `excluded` list for that target.
pub fn catalogue<S: AsRef<str>>(
    allocators: &[S],
    excluded: &[S],
    overrides: &HashMap<Target, Vec<String>>,
) -> Vec<Figure> {
    let mut figures: Vec<Figure> = Target::all()
        .iter()
        .map(|target| {
            let mut selection = Selection::new(allocators, excluded);
            if let Some(excluded) = overrides.get(target) {
                selection.excluded = excluded.clone();
            }
            Figure {
                name: target.fragment().to_string(),
                source: Source::Allocators {
                    selection,
                    fragment: target.fragment().to_string(),
                    with_memory: target.tracks_memory(),
                },
                charts: target.charts(),
            }
        })
        .collect();

    figures.extend(LIST_SIZES.iter().map(|&size| Figure {
        name: format!("Memory access, list size {size}"),
        source: Source::AccessMemory {
            categories: AccessPattern::all()
                .iter()
                .map(|p| (p.label().to_string(), p.fragment(size)))
                .collect(),
        },
        charts: vec![ChartPlan {
            kind: ChartKind::Bar,
            column: Column::Time,
            title: format!("Memory access benchmark. List size = {size}"),
            file_name: format!("mem_access-{size}.png"),
            with_reference: false,
        }],
    }));

    figures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::matches;

    #[test]
    fn test_catalogue_file_names() {
        let figures = catalogue(&["mpp", "ptmalloc3"], &["ptmalloc3"], &HashMap::new());

        let files: Vec<&str> = figures
            .iter()
            .flat_map(|f| f.charts.iter().map(|c| c.file_name.as_str()))
            .collect();
        assert_eq!(
            files,
            vec![
                "allocate-4096-time.png",
                "deallocate-4096-time.png",
                "complex_200k-time.png",
                "complex_200k-mem.png",
                "complex_1m-time.png",
                "complex_1m-mem.png",
                "complex_2m-time.png",
                "complex_2m-mem.png",
                "mem_access-2048.png",
                "mem_access-8192.png",
                "mem_access-16384.png",
            ]
        );
    }

    #[test]
    fn test_selection_per_figure() {
        let figures = catalogue(
            &["jemalloc", "mpp", "ptmalloc3"],
            &["ptmalloc3"],
            &HashMap::new(),
        );

        for figure in &figures {
            if let Source::Allocators { selection, .. } = &figure.source {
                assert_eq!(selection.included().collect::<Vec<_>>(), vec!["jemalloc", "mpp"]);
            }
        }
    }

    #[test]
    fn test_exclusion_override_for_one_target() {
        let mut overrides = HashMap::new();
        overrides.insert(
            Target::Complex1m,
            vec!["ptmalloc3".to_string(), "jemalloc".to_string()],
        );

        let figures = catalogue(&["jemalloc", "mpp", "ptmalloc3"], &["ptmalloc3"], &overrides);

        for figure in &figures {
            if let Source::Allocators {
                selection,
                fragment,
                ..
            } = &figure.source
            {
                let included: Vec<&str> = selection.included().collect();
                if fragment == Target::Complex1m.fragment() {
                    assert_eq!(included, vec!["mpp"]);
                } else {
                    assert_eq!(included, vec!["jemalloc", "mpp"]);
                }
            }
        }
    }

    #[test]
    fn test_fragments_do_not_cross_match() {
        for a in Target::all() {
            for b in Target::all() {
                if a != b {
                    assert!(!matches(a.fragment(), b.fragment()), "{a:?} matches {b:?}");
                }
            }
        }
        for size in LIST_SIZES {
            for a in AccessPattern::all() {
                for b in AccessPattern::all() {
                    if a != b {
                        assert!(!matches(&a.fragment(*size), &b.fragment(*size)));
                    }
                }
            }
        }
    }

    #[test]
    fn test_access_fragment() {
        assert_eq!(
            AccessPattern::Layouted.fragment(8192),
            "BM_AccessMemoryRandomizedLayoutedLinkedList/8192/manual_time"
        );
    }

    #[test]
    fn test_memory_tracking() {
        assert!(!Target::AllocateManyRandom4096.tracks_memory());
        assert!(Target::Complex1m.tracks_memory());
        assert!(Target::Complex2m
            .charts()
            .iter()
            .any(|c| c.column == Column::Memory && c.kind == ChartKind::Bar));
    }
}
