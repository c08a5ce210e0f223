//! Self-contained HTML report: tables, highlighted category cells and SVG
//! charts in one file that opens offline.

use std::fmt::Write as _;

use crate::chart::{BarSeries, svg_bar_chart};
use crate::config::{ALL_LABEL, CategoryMap};
use crate::dataset::Dataset;
use crate::report::{BAD_COLOR, GOOD_COLOR, ReportMeta};
use crate::style::{StyleTag, style_classification};
use crate::summary::{AnnotatedDataset, Assessment};

pub const REPORT_TITLE: &str = "RCW 87.84 Rehabilitation Assessments QA/QC";

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub fn render_html_report(a: &Assessment, categories: &CategoryMap, meta: &ReportMeta) -> String {
    let detail = a.annotated.to_dataset();
    let labels: Vec<String> = a.summaries.iter().map(|s| s.label.clone()).collect();

    let good_bad_chart = svg_bar_chart(
        "Good vs. Bad Points",
        "Count",
        &labels,
        &[
            BarSeries::new("Good", GOOD_COLOR, a.summaries.iter().map(|s| s.good).collect()),
            BarSeries::new("Bad", BAD_COLOR, a.summaries.iter().map(|s| s.bad).collect()),
        ],
    );
    let breakdown_chart = svg_bar_chart(
        "Bad Count by Category",
        "Bad Count",
        &labels,
        &[BarSeries::new(
            "Bad Count",
            BAD_COLOR,
            a.breakdown.iter().map(|b| b.bad).collect(),
        )],
    );

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{css}</style>
</head>
<body>
    <div class="container">
        <h1>{title}</h1>
        <p class="meta">Source: {source} &middot; {rows} records</p>
        {warnings}
        <h2>Summary Table</h2>
        {summary}
        <h2>Good vs. Bad Points by Category</h2>
        {good_bad_chart}
        <h2>Records with Multiple 'Bad' Categories</h2>
        <p>Total Records with Multiple 'Bad' Categories: {multi_count}</p>
        {multi}
        <h2>Breakdown of 'Bad' Reasons</h2>
        {breakdown}
        <h2>Filter the Detailed Table</h2>
        {filter}
        <h2>Summary Statistics for 'Bad' Data</h2>
        <p>Total 'Bad' Records: {total_bad}</p>
        <p>Records with Multiple Issues: {multi_count}</p>
        <h2>Visualization of 'Bad' Counts by Category</h2>
        {breakdown_chart}
        <h2>Detailed Data (Optional)</h2>
        <details><summary>View Detailed Table</summary>{detail}</details>
        <footer>Generated {generated}</footer>
    </div>
    <script>{js}</script>
</body>
</html>"#,
        title = REPORT_TITLE,
        css = inline_css(),
        js = inline_javascript(),
        source = escape_html(&meta.source),
        rows = a.dataset.len(),
        warnings = render_warnings(&a.schema.missing_columns()),
        summary = render_summary_table(a),
        good_bad_chart = good_bad_chart,
        multi_count = a.stats.multiple_issues,
        multi = render_annotated_table(&a.multi_failure, categories),
        breakdown = render_breakdown_table(a),
        filter = render_filter_section(&detail, categories),
        total_bad = a.stats.total_bad,
        breakdown_chart = breakdown_chart,
        detail = render_table(&detail, &[]),
        generated = meta.generated_at.format("%Y-%m-%d %H:%M:%S"),
    )
}

fn render_warnings(missing: &[String]) -> String {
    if missing.is_empty() {
        return String::new();
    }
    let items: String = missing
        .iter()
        .map(|c| format!("<li>{}</li>", escape_html(c)))
        .collect();
    format!(
        r#"<div class="warning">Missing category columns (reported as 0/0):<ul>{items}</ul></div>"#
    )
}

fn render_summary_table(a: &Assessment) -> String {
    let mut html = String::from("<table><thead><tr><th>Category</th><th>Good</th><th>Bad</th></tr></thead><tbody>");
    for s in &a.summaries {
        let _ = write!(
            html,
            "<tr><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td></tr>",
            escape_html(&s.label),
            s.good,
            s.bad
        );
    }
    html.push_str("</tbody></table>");
    html
}

fn render_breakdown_table(a: &Assessment) -> String {
    let mut html =
        String::from("<table><thead><tr><th>Category</th><th>Bad Count</th></tr></thead><tbody>");
    for b in &a.breakdown {
        let _ = write!(
            html,
            "<tr><td>{}</td><td class=\"num\">{}</td></tr>",
            escape_html(&b.label),
            b.bad
        );
    }
    html.push_str("</tbody></table>");
    html
}

fn styled_columns(dataset: &Dataset, categories: &CategoryMap) -> Vec<usize> {
    categories
        .columns()
        .filter_map(|c| dataset.column_index(c))
        .collect()
}

fn render_annotated_table(annotated: &AnnotatedDataset, categories: &CategoryMap) -> String {
    let flat = annotated.to_dataset();
    let styled = styled_columns(&annotated.dataset, categories);
    render_table(&flat, &styled)
}

/// The full table plus a category selector. Rows start unstyled; category
/// cells carry their highlight in `data-css`, and the script applies it to
/// the selected column only while hiding rows not `bad` there.
fn render_filter_section(dataset: &Dataset, categories: &CategoryMap) -> String {
    let mut select = format!(
        r#"<label>Filter by Category <select id="category-filter"><option value="">{}</option>"#,
        ALL_LABEL
    );
    for c in categories {
        if let Some(idx) = dataset.column_index(&c.column) {
            let _ = write!(
                select,
                r#"<option value="{idx}">{}</option>"#,
                escape_html(&c.label)
            );
        }
    }
    select.push_str("</select></label>");

    let tagged = styled_columns(dataset, categories);
    format!(
        "{select}{}",
        render_filterable_table(dataset, &tagged)
    )
}

fn render_filterable_table(dataset: &Dataset, tagged: &[usize]) -> String {
    let mut html = String::from(r#"<table id="filterable" class="data"><thead><tr>"#);
    for h in dataset.headers() {
        let _ = write!(html, "<th>{}</th>", escape_html(h));
    }
    html.push_str("</tr></thead><tbody>");

    for record in dataset.records() {
        html.push_str("<tr>");
        for idx in 0..dataset.headers().len() {
            let value = record.get(idx).unwrap_or("");
            let css = if tagged.contains(&idx) {
                style_classification(value).css()
            } else {
                ""
            };
            if css.is_empty() {
                let _ = write!(html, "<td>{}</td>", escape_html(value));
            } else {
                let _ = write!(
                    html,
                    "<td data-css=\"{}\">{}</td>",
                    css,
                    escape_html(value)
                );
            }
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

fn render_table(dataset: &Dataset, styled: &[usize]) -> String {
    let mut html = String::from(r#"<table class="data"><thead><tr>"#);
    for h in dataset.headers() {
        let _ = write!(html, "<th>{}</th>", escape_html(h));
    }
    html.push_str("</tr></thead><tbody>");

    for record in dataset.records() {
        html.push_str("<tr>");
        for idx in 0..dataset.headers().len() {
            let value = record.get(idx).unwrap_or("");
            let tag = if styled.contains(&idx) {
                style_classification(value)
            } else {
                StyleTag::Neutral
            };
            match tag {
                StyleTag::Neutral => {
                    let _ = write!(html, "<td>{}</td>", escape_html(value));
                }
                _ => {
                    let _ = write!(
                        html,
                        "<td style=\"{}\">{}</td>",
                        tag.css(),
                        escape_html(value)
                    );
                }
            }
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

fn inline_css() -> &'static str {
    r#"
body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif; margin: 0; color: #222; }
.container { padding: 16px 32px; }
h1 { font-size: 1.6em; }
h2 { font-size: 1.2em; margin-top: 2em; border-bottom: 1px solid #ddd; }
table { border-collapse: collapse; margin: 8px 0; font-size: 0.9em; }
th, td { border: 1px solid #ccc; padding: 4px 8px; text-align: left; }
th { background: #f4f4f4; }
td.num { text-align: right; }
table.data { display: block; overflow-x: auto; max-width: 100%; }
.warning { background: #fff4e5; border: 1px solid #f0b429; padding: 8px 12px; }
.meta, footer { color: #666; font-size: 0.85em; }
"#
}

fn inline_javascript() -> &'static str {
    r#"
(function () {
    var select = document.getElementById('category-filter');
    var table = document.getElementById('filterable');
    if (!select || !table) { return; }
    select.addEventListener('change', function () {
        var col = select.value;
        table.querySelectorAll('tbody tr').forEach(function (row) {
            var show = col === '' || (row.cells[col] && row.cells[col].textContent === 'bad');
            row.style.display = show ? '' : 'none';
            Array.prototype.forEach.call(row.cells, function (cell, i) {
                cell.style.cssText = (col !== '' && String(i) === col) ? (cell.dataset.css || '') : '';
            });
        });
    });
})();
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportConfig;
    use crate::dataset::read_csv;
    use chrono::Local;

    fn assessment(csv: &str) -> Assessment {
        let (ds, _) = read_csv(csv.as_bytes()).unwrap();
        Assessment::build(ds, &ReportConfig::default())
    }

    fn meta() -> ReportMeta {
        ReportMeta {
            source: "upload <1>.csv".to_string(),
            generated_at: Local::now(),
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html("<a href='x'>&</a>"), "&lt;a href=&#39;x&#39;&gt;&amp;&lt;/a&gt;");
    }

    #[test]
    fn report_highlights_category_cells_only() {
        let a = assessment(
            "PARCEL,Note,RES Waterfront Point Comp. to Col. BU,COM Waterfront Point Comp. to Col. BU\n\
             1,bad,bad,bad\n",
        );
        let html = render_html_report(&a, &CategoryMap::default(), &meta());

        assert!(html.contains(REPORT_TITLE));
        assert!(html.contains("upload &lt;1&gt;.csv"));
        assert!(html.contains(StyleTag::Bad.css()));
        // Note column is never styled
        assert!(html.contains("<td>000000001</td><td>bad</td>"));
        assert!(html.contains("Total Records with Multiple 'Bad' Categories: 1"));
    }

    #[test]
    fn report_lists_missing_columns() {
        let a = assessment("PARCEL\n1\n");
        let html = render_html_report(&a, &CategoryMap::default(), &meta());
        assert!(html.contains("Missing category columns"));
        assert!(html.contains("FARMS NON-Waterfront Point Comp. to Col. BU"));
    }

    fn section<'a>(html: &'a str, start: &str, end: &str) -> &'a str {
        let from = html.find(start).unwrap();
        let to = from + html[from..].find(end).unwrap();
        &html[from..to]
    }

    #[test]
    fn filter_and_detail_tables_carry_bad_count() {
        let a = assessment("PARCEL,RES Waterfront Point Comp. to Col. BU\n1,bad\n");
        let html = render_html_report(&a, &CategoryMap::default(), &meta());

        let filter = section(&html, r#"<table id="filterable""#, "</table>");
        assert!(filter.contains("<th>Bad_Count</th>"));
        let detail = section(&html, "<details>", "</details>");
        assert!(detail.contains("<th>Bad_Count</th>"));
        assert!(detail.contains("<td>bad</td><td>1</td>"));
    }

    #[test]
    fn filterable_table_starts_unstyled() {
        let a = assessment(
            "PARCEL,RES Waterfront Point Comp. to Col. BU,COM Waterfront Point Comp. to Col. BU\n\
             1,bad,good\n",
        );
        let html = render_html_report(&a, &CategoryMap::default(), &meta());

        let filter = section(&html, r#"<table id="filterable""#, "</table>");
        assert!(!filter.contains("style="));
        assert!(filter.contains(&format!(r#"<td data-css="{}">bad</td>"#, StyleTag::Bad.css())));
        assert!(filter.contains(&format!(r#"<td data-css="{}">good</td>"#, StyleTag::Good.css())));
        assert!(html.contains("cell.dataset.css"));
    }

    #[test]
    fn filter_select_only_offers_present_columns() {
        let a = assessment("PARCEL,PARKS Waterfront Point Comp. to Col. BU\n1,good\n");
        let html = render_html_report(&a, &CategoryMap::default(), &meta());
        assert!(html.contains(r#"<option value="1">Parks Waterfront</option>"#));
        assert!(!html.contains(">Residential Waterfront</option>"));
    }
}
