use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use num_format::{Locale, ToFormattedString};
use serde::Serialize;
use tracing::info;

use crate::chart::{BarSeries, text_bar_chart};
use crate::config::CategoryMap;
use crate::dataset::Dataset;
use crate::error::{QcError, Result};
use crate::html::render_html_report;
use crate::summary::{Assessment, BadBreakdown, CategorySummary};

pub const GOOD_COLOR: &str = "#2ca02c";
pub const BAD_COLOR: &str = "#d62728";

pub const SUMMARY_CSV: &str = "report_1_category_summary.csv";
pub const MULTI_FAILURE_CSV: &str = "report_2_multiple_bad_records.csv";
pub const BREAKDOWN_CSV: &str = "report_3_bad_breakdown.csv";
pub const SUMMARY_JSON: &str = "summary.json";
pub const HTML_REPORT: &str = "assessment_report.html";

/// Number of rows echoed to the console for record tables.
pub const PREVIEW_ROWS: usize = 10;

#[derive(Debug, Clone)]
pub struct ReportMeta {
    pub source: String,
    pub generated_at: DateTime<Local>,
}

impl ReportMeta {
    pub fn now(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            generated_at: Local::now(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryJson<'a> {
    pub source: &'a str,
    pub generated_at: DateTime<Local>,
    pub total_rows: usize,
    pub missing_columns: Vec<String>,
    pub total_bad: usize,
    pub multiple_issues: usize,
    pub categories: &'a [CategorySummary],
}

pub fn format_count(n: usize) -> String {
    n.to_formatted_string(&Locale::en)
}

fn label_width(labels: impl Iterator<Item = usize>, header: &str) -> usize {
    labels.max().unwrap_or(0).max(header.len())
}

pub fn summary_table(summaries: &[CategorySummary]) -> String {
    let w = label_width(summaries.iter().map(|s| s.label.chars().count()), "Category");
    let mut out = format!("| {:<w$} | {:>10} | {:>10} |\n", "Category", "Good", "Bad");
    out.push_str(&"-".repeat(w + 30));
    out.push('\n');
    for s in summaries {
        out.push_str(&format!(
            "| {:<w$} | {:>10} | {:>10} |\n",
            s.label,
            format_count(s.good),
            format_count(s.bad)
        ));
    }
    out
}

pub fn breakdown_table(breakdown: &[BadBreakdown]) -> String {
    let w = label_width(breakdown.iter().map(|b| b.label.chars().count()), "Category");
    let mut out = format!("| {:<w$} | {:>10} |\n", "Category", "Bad Count");
    out.push_str(&"-".repeat(w + 17));
    out.push('\n');
    for b in breakdown {
        out.push_str(&format!("| {:<w$} | {:>10} |\n", b.label, format_count(b.bad)));
    }
    out
}

fn preview_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let parts: Vec<String> = cells
        .zip(widths)
        .map(|(c, w)| format!("{:<w$}", c, w = *w))
        .collect();
    format!("| {} |\n", parts.join(" | "))
}

/// Pipe table of the first `limit` records, widths fitted to the content.
pub fn records_preview(dataset: &Dataset, limit: usize) -> String {
    let headers = dataset.headers();
    let shown = &dataset.records()[..dataset.len().min(limit)];

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            shown
                .iter()
                .filter_map(|r| r.get(i))
                .map(|v| v.chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = preview_line(headers.iter().map(String::as_str), &widths);
    for r in shown {
        out.push_str(&preview_line(
            (0..headers.len()).map(|i| r.get(i).unwrap_or("")),
            &widths,
        ));
    }
    if dataset.len() > limit {
        out.push_str(&format!(
            "... {} more rows\n",
            format_count(dataset.len() - limit)
        ));
    }
    out
}

/// Everything the "Generate Reports" menu option prints.
pub fn console_report(a: &Assessment) -> String {
    let labels: Vec<String> = a.summaries.iter().map(|s| s.label.clone()).collect();
    let mut out = String::new();

    if !a.schema.is_complete() {
        out.push_str("Warning: missing category columns (reported as 0/0):\n");
        for c in a.schema.missing_columns() {
            out.push_str(&format!("  - {c}\n"));
        }
        out.push('\n');
    }

    out.push_str("Summary Table\n\n");
    out.push_str(&summary_table(&a.summaries));
    out.push('\n');
    out.push_str(&text_bar_chart(
        "Good vs. Bad Points by Category",
        &labels,
        &[
            BarSeries::new("Good", GOOD_COLOR, a.summaries.iter().map(|s| s.good).collect()),
            BarSeries::new("Bad", BAD_COLOR, a.summaries.iter().map(|s| s.bad).collect()),
        ],
    ));
    out.push('\n');

    out.push_str("Records with Multiple 'Bad' Categories\n");
    out.push_str(&format!(
        "Total Records with Multiple 'Bad' Categories: {}\n\n",
        format_count(a.multi_failure.len())
    ));
    if !a.multi_failure.is_empty() {
        out.push_str(&records_preview(&a.multi_failure.to_dataset(), PREVIEW_ROWS));
        out.push('\n');
    }

    out.push_str("Breakdown of 'Bad' Reasons\n\n");
    out.push_str(&breakdown_table(&a.breakdown));
    out.push('\n');

    out.push_str("Summary Statistics for 'Bad' Data\n");
    out.push_str(&format!("Total 'Bad' Records: {}\n", format_count(a.stats.total_bad)));
    out.push_str(&format!(
        "Records with Multiple Issues: {}\n\n",
        format_count(a.stats.multiple_issues)
    ));

    out.push_str(&text_bar_chart(
        "Visualization of 'Bad' Counts by Category",
        &labels,
        &[BarSeries::new(
            "Bad Count",
            BAD_COLOR,
            a.breakdown.iter().map(|b| b.bad).collect(),
        )],
    ));
    out
}

fn csv_writer(path: &Path) -> Result<csv::Writer<File>> {
    Ok(csv::Writer::from_path(path)?)
}

pub fn write_summary_csv(path: &Path, summaries: &[CategorySummary]) -> Result<()> {
    let mut wtr = csv_writer(path)?;
    wtr.write_record(["Category", "Good", "Bad"])?;
    for s in summaries {
        wtr.write_record([s.label.clone(), s.good.to_string(), s.bad.to_string()])?;
    }
    wtr.flush().map_err(|e| QcError::io(path, e))?;
    Ok(())
}

pub fn write_breakdown_csv(path: &Path, breakdown: &[BadBreakdown]) -> Result<()> {
    let mut wtr = csv_writer(path)?;
    wtr.write_record(["Category", "Bad Count"])?;
    for b in breakdown {
        wtr.write_record([b.label.clone(), b.bad.to_string()])?;
    }
    wtr.flush().map_err(|e| QcError::io(path, e))?;
    Ok(())
}

/// Writes header plus rows; ragged rows are written as they are.
pub fn write_dataset_csv(path: &Path, dataset: &Dataset) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_path(path)?;
    wtr.write_record(dataset.headers())?;
    for r in dataset.records() {
        wtr.write_record(r.fields())?;
    }
    wtr.flush().map_err(|e| QcError::io(path, e))?;
    Ok(())
}

pub fn write_summary_json(path: &Path, a: &Assessment, meta: &ReportMeta) -> Result<()> {
    let summary = SummaryJson {
        source: &meta.source,
        generated_at: meta.generated_at,
        total_rows: a.dataset.len(),
        missing_columns: a.schema.missing_columns(),
        total_bad: a.stats.total_bad,
        multiple_issues: a.stats.multiple_issues,
        categories: &a.summaries,
    };
    let file = File::create(path).map_err(|e| QcError::io(path, e))?;
    let mut w = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut w, &summary)?;
    w.flush().map_err(|e| QcError::io(path, e))?;
    Ok(())
}

/// Writes every report file into `out_dir` and returns their paths.
pub fn export_reports(
    a: &Assessment,
    categories: &CategoryMap,
    meta: &ReportMeta,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir).map_err(|e| QcError::io(out_dir, e))?;

    let summary_csv = out_dir.join(SUMMARY_CSV);
    write_summary_csv(&summary_csv, &a.summaries)?;

    let multi_csv = out_dir.join(MULTI_FAILURE_CSV);
    write_dataset_csv(&multi_csv, &a.multi_failure.to_dataset())?;

    let breakdown_csv = out_dir.join(BREAKDOWN_CSV);
    write_breakdown_csv(&breakdown_csv, &a.breakdown)?;

    let json = out_dir.join(SUMMARY_JSON);
    write_summary_json(&json, a, meta)?;

    let html = out_dir.join(HTML_REPORT);
    fs::write(&html, render_html_report(a, categories, meta)).map_err(|e| QcError::io(&html, e))?;

    let written = vec![summary_csv, multi_csv, breakdown_csv, json, html];
    info!(dir = %out_dir.display(), files = written.len(), "reports exported");
    Ok(written)
}

/// `"Residential Non-Waterfront"` → `"residential_non_waterfront"`.
pub fn slug(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for c in label.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') && !out.is_empty() {
            out.push('_');
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

pub fn export_filtered(dataset: &Dataset, label: &str, out_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(out_dir).map_err(|e| QcError::io(out_dir, e))?;
    let path = out_dir.join(format!("detail_{}.csv", slug(label)));
    write_dataset_csv(&path, dataset)?;
    info!(path = %path.display(), rows = dataset.len(), "filtered table exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportConfig;
    use crate::dataset::{Record, read_csv};
    use tempfile::tempdir;

    fn summaries() -> Vec<CategorySummary> {
        vec![
            CategorySummary { label: "Parks Waterfront".into(), good: 1234, bad: 5 },
            CategorySummary { label: "Farms".into(), good: 0, bad: 0 },
        ]
    }

    #[test]
    fn counts_use_thousands_separators() {
        assert_eq!(format_count(1234567), "1,234,567");
        assert_eq!(format_count(0), "0");
    }

    #[test]
    fn summary_table_lists_categories_in_order() {
        let table = summary_table(&summaries());
        let lines: Vec<&str> = table.lines().collect();
        assert!(lines[0].contains("Category") && lines[0].contains("Good"));
        assert!(lines[2].starts_with("| Parks Waterfront |"));
        assert!(lines[2].contains("1,234"));
        assert!(lines[3].starts_with("| Farms            |"));
    }

    #[test]
    fn preview_truncates_and_reports_remaining_rows() {
        let records = (0..12).map(|i| Record::new([i.to_string(), "bad".into()])).collect();
        let ds = Dataset::new(vec!["ID".into(), "Status".into()], records);

        let preview = records_preview(&ds, 10);
        assert_eq!(preview.lines().count(), 12);
        assert!(preview.ends_with("... 2 more rows\n"));
    }

    #[test]
    fn slug_flattens_labels() {
        assert_eq!(slug("Residential Non-Waterfront"), "residential_non_waterfront");
        assert_eq!(slug("All"), "all");
        assert_eq!(slug("  Farms & Fields "), "farms_fields");
    }

    #[test]
    fn summary_csv_round_trips_through_the_reader() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("s.csv");
        write_summary_csv(&path, &summaries()).unwrap();

        let (ds, _) = read_csv(File::open(&path).unwrap()).unwrap();
        assert_eq!(ds.headers(), &["Category", "Good", "Bad"]);
        assert_eq!(ds.records()[0].get(1), Some("1234"));
    }

    #[test]
    fn console_report_warns_about_missing_columns() {
        let (ds, _) = read_csv("PARCEL,RES Waterfront Point Comp. to Col. BU\n7,bad\n".as_bytes())
            .unwrap();
        let a = Assessment::build(ds, &ReportConfig::default());
        let text = console_report(&a);

        assert!(text.starts_with("Warning: missing category columns"));
        assert!(text.contains("Total Records with Multiple 'Bad' Categories: 0"));
        assert!(text.contains("Total 'Bad' Records: 1"));
    }
}
