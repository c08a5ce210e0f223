//! Good/bad tabulation over the assessment categories.
//!
//! Every operation here is a pure transform of an already-loaded
//! [`Dataset`]; nothing touches the console or the filesystem.

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{ALL_LABEL, Category, CategoryMap, ReportConfig};
use crate::dataset::{Dataset, Record};
use crate::error::{QcError, Result};
use crate::style::{BAD, GOOD};

/// Name of the column carrying the per-row failure count on export.
pub const FAILURE_COUNT_COLUMN: &str = "Bad_Count";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub label: String,
    pub good: usize,
    pub bad: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadBreakdown {
    pub label: String,
    pub bad: usize,
}

/// Mapped columns the loaded header does not contain.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchemaReport {
    pub missing: Vec<Category>,
}

impl SchemaReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn missing_columns(&self) -> Vec<String> {
        self.missing.iter().map(|c| c.column.clone()).collect()
    }
}

/// A dataset with a failure count attached to each record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnnotatedDataset {
    pub dataset: Dataset,
    pub failures: Vec<usize>,
}

impl AnnotatedDataset {
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = (&Record, usize)> {
        self.dataset
            .records()
            .iter()
            .zip(self.failures.iter().copied())
    }

    pub fn total_failures(&self) -> usize {
        self.failures.iter().sum()
    }

    /// Flattens the annotation into a trailing `Bad_Count` column. The
    /// header is widened with unnamed columns to the longest row, and every
    /// row is padded to that width, so the count always sits under
    /// `Bad_Count`.
    pub fn to_dataset(&self) -> Dataset {
        let width = self
            .dataset
            .records()
            .iter()
            .map(Record::len)
            .max()
            .unwrap_or(0)
            .max(self.dataset.headers().len());

        let mut headers = self.dataset.headers().to_vec();
        headers.resize(width, String::new());
        headers.push(FAILURE_COUNT_COLUMN.to_string());

        let records = self
            .rows()
            .map(|(record, failures)| {
                let mut fields = record.fields().to_vec();
                fields.resize(width, String::new());
                fields.push(failures.to_string());
                Record::new(fields)
            })
            .collect();
        Dataset::new(headers, records)
    }
}

/// Totals shown under "Summary Statistics for 'Bad' Data".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BadStats {
    pub total_bad: usize,
    pub multiple_issues: usize,
}

/// Strips commas and left-pads with `'0'` to `width`. Longer values are
/// returned unpadded, never truncated.
pub fn normalize_parcel(value: &str, width: usize) -> String {
    let cleaned: String = value.chars().filter(|&c| c != ',').collect();
    let len = cleaned.chars().count();
    if len >= width {
        return cleaned;
    }
    let mut out = "0".repeat(width - len);
    out.push_str(&cleaned);
    out
}

/// Rewrites every non-empty cell of `column`. No-op when the column is absent.
pub fn normalize_identifier(mut dataset: Dataset, column: &str, width: usize) -> Dataset {
    let Some(idx) = dataset.column_index(column) else {
        debug!(column, "identifier column absent, skipping normalization");
        return dataset;
    };
    for record in dataset.records_mut() {
        if let Some(cell) = record.get_mut(idx) {
            if !cell.is_empty() {
                *cell = normalize_parcel(cell, width);
            }
        }
    }
    dataset
}

pub fn validate_schema(dataset: &Dataset, categories: &CategoryMap) -> SchemaReport {
    let missing: Vec<Category> = categories
        .iter()
        .filter(|c| !dataset.has_column(&c.column))
        .cloned()
        .collect();
    for c in &missing {
        warn!(label = %c.label, column = %c.column, "category column missing from input");
    }
    SchemaReport { missing }
}

fn count_matching(dataset: &Dataset, column: &str, wanted: &str) -> usize {
    match dataset.column_index(column) {
        Some(idx) => dataset
            .records()
            .iter()
            .filter(|r| r.get(idx) == Some(wanted))
            .count(),
        None => 0,
    }
}

/// One entry per category, in map order. An absent column counts 0/0.
pub fn summarize_by_category(dataset: &Dataset, categories: &CategoryMap) -> Vec<CategorySummary> {
    categories
        .iter()
        .map(|c| CategorySummary {
            label: c.label.clone(),
            good: count_matching(dataset, &c.column, GOOD),
            bad: count_matching(dataset, &c.column, BAD),
        })
        .collect()
}

pub fn bad_breakdown(summaries: &[CategorySummary]) -> Vec<BadBreakdown> {
    summaries
        .iter()
        .map(|s| BadBreakdown {
            label: s.label.clone(),
            bad: s.bad,
        })
        .collect()
}

pub fn annotate_failure_counts(dataset: &Dataset, categories: &CategoryMap) -> AnnotatedDataset {
    let indices: Vec<usize> = categories
        .columns()
        .filter_map(|col| dataset.column_index(col))
        .collect();

    let failures = dataset
        .records()
        .iter()
        .map(|r| indices.iter().filter(|&&i| r.get(i) == Some(BAD)).count())
        .collect();

    AnnotatedDataset {
        dataset: dataset.clone(),
        failures,
    }
}

/// Rows failing more than one category.
pub fn select_multi_failure(annotated: &AnnotatedDataset) -> AnnotatedDataset {
    let (records, failures): (Vec<Record>, Vec<usize>) = annotated
        .rows()
        .filter(|(_, n)| *n > 1)
        .map(|(r, n)| (r.clone(), n))
        .unzip();

    AnnotatedDataset {
        dataset: Dataset::new(annotated.dataset.headers().to_vec(), records),
        failures,
    }
}

/// `"All"` returns the dataset untouched; any other label keeps the rows
/// marked bad in that category's column.
pub fn filter_by_category(
    dataset: &Dataset,
    categories: &CategoryMap,
    label: &str,
) -> Result<Dataset> {
    if label == ALL_LABEL {
        return Ok(dataset.clone());
    }
    let column = categories
        .column_for(label)
        .ok_or_else(|| QcError::UnknownCategory(label.to_string()))?;

    Ok(match dataset.column_index(column) {
        Some(idx) => dataset.filtered(|r| r.get(idx) == Some(BAD)),
        None => dataset.filtered(|_| false),
    })
}

/// Everything derived from one loaded file. Rebuilt from scratch on every
/// load; nothing carries over from a previous file.
#[derive(Debug, Clone)]
pub struct Assessment {
    pub dataset: Dataset,
    pub schema: SchemaReport,
    pub summaries: Vec<CategorySummary>,
    pub breakdown: Vec<BadBreakdown>,
    pub annotated: AnnotatedDataset,
    pub multi_failure: AnnotatedDataset,
    pub stats: BadStats,
}

impl Assessment {
    pub fn build(dataset: Dataset, config: &ReportConfig) -> Self {
        let dataset =
            normalize_identifier(dataset, &config.identifier_column, config.identifier_width);
        let schema = validate_schema(&dataset, &config.categories);
        let summaries = summarize_by_category(&dataset, &config.categories);
        let breakdown = bad_breakdown(&summaries);
        let annotated = annotate_failure_counts(&dataset, &config.categories);
        let multi_failure = select_multi_failure(&annotated);

        let stats = BadStats {
            total_bad: annotated.total_failures(),
            multiple_issues: multi_failure.len(),
        };
        debug_assert_eq!(
            stats.total_bad,
            summaries.iter().map(|s| s.bad).sum::<usize>(),
            "per-category and per-row bad totals diverged"
        );
        debug!(
            rows = dataset.len(),
            total_bad = stats.total_bad,
            multiple_issues = stats.multiple_issues,
            "assessment built"
        );

        Self {
            dataset,
            schema,
            summaries,
            breakdown,
            annotated,
            multi_failure,
            stats,
        }
    }
}
