use crate::extract::GroupedMeasurement;

/// Metric column of a long-form table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Time,
    Memory,
}

impl Column {
    pub fn name(&self) -> &'static str {
        match self {
            Column::Time => "time",
            Column::Memory => "memory",
        }
    }
}

/// One observation
#[derive(Debug, Clone, PartialEq)]
pub struct LongFormRow {
    pub label: String,
    pub time: f64,
    pub memory: Option<f64>,
}

impl LongFormRow {
    pub fn value(&self, column: Column) -> Option<f64> {
        match column {
            Column::Time => Some(self.time),
            Column::Memory => self.memory,
        }
    }
}

/// Per-category statistics printed in the console report
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    pub label: String,
    pub samples: usize,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// One-row-per-sample table feeding a chart
#[derive(Debug, Clone, Default)]
pub struct LongFormTable {
    categories: Vec<String>,
    rows: Vec<LongFormRow>,
    has_memory: bool,
    time_unit: Option<String>,
}

impl LongFormTable {
    /// Expand grouped measurements into one row per time sample.
    ///
    /// Every group keeps a category slot, even when it contributes no rows.
    pub fn expand(groups: &[GroupedMeasurement]) -> Self {
        let mut table = Self::default();

        for group in groups {
            if !table.categories.contains(&group.label) {
                table.categories.push(group.label.clone());
            }
            table.has_memory |= group.memory.is_some();
            if table.time_unit.is_none() {
                table.time_unit = group.time_unit.clone();
            }

            let memory = group.memory.as_deref().unwrap_or_default();
            table
                .rows
                .extend(group.time.iter().enumerate().map(|(i, &time)| LongFormRow {
                    label: group.label.clone(),
                    time,
                    memory: memory.get(i).copied().flatten(),
                }));
        }

        table
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[LongFormRow] {
        &self.rows
    }

    /// Category labels in group order
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Whether any group tracked memory
    pub fn has_memory(&self) -> bool {
        self.has_memory
    }

    pub fn time_unit(&self) -> Option<&str> {
        self.time_unit.as_deref()
    }

    /// All values of `column` for rows labelled `label`
    pub fn values(&self, label: &str, column: Column) -> Vec<f64> {
        self.rows
            .iter()
            .filter(|r| r.label == label)
            .filter_map(|r| r.value(column))
            .collect()
    }

    /// All values of `column` across the table
    pub fn all_values(&self, column: Column) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().filter_map(move |r| r.value(column))
    }

    /// Sample mean of `column` for `label`; `None` when it has no samples
    pub fn mean(&self, label: &str, column: Column) -> Option<f64> {
        mean(&self.values(label, column))
    }

    pub fn summary(&self, column: Column) -> Vec<CategorySummary> {
        self.categories
            .iter()
            .map(|label| {
                let values = self.values(label, column);
                CategorySummary {
                    label: label.clone(),
                    samples: values.len(),
                    mean: mean(&values),
                    min: values.iter().copied().reduce(f64::min),
                    max: values.iter().copied().reduce(f64::max),
                }
            })
            .collect()
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}
