//! Bar charts, as console text and as inline SVG for the HTML report.

use std::fmt::Write as _;

use crate::html::escape_html;

const TEXT_BAR_WIDTH: usize = 40;

const SVG_WIDTH: f64 = 720.0;
const SVG_HEIGHT: f64 = 360.0;
const MARGIN_LEFT: f64 = 56.0;
const MARGIN_RIGHT: f64 = 16.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 110.0;

/// One coloured series; `values[i]` belongs to the i-th category label.
#[derive(Debug, Clone)]
pub struct BarSeries {
    pub name: String,
    pub color: &'static str,
    pub values: Vec<usize>,
}

impl BarSeries {
    pub fn new(name: impl Into<String>, color: &'static str, values: Vec<usize>) -> Self {
        Self {
            name: name.into(),
            color,
            values,
        }
    }
}

fn max_value(series: &[BarSeries]) -> usize {
    series
        .iter()
        .flat_map(|s| s.values.iter().copied())
        .max()
        .unwrap_or(0)
}

fn scaled(value: usize, max: usize, span: usize) -> usize {
    if max == 0 {
        0
    } else {
        (value * span).div_ceil(max)
    }
}

/// Horizontal text chart, one line per (label, series) pair.
pub fn text_bar_chart(title: &str, labels: &[String], series: &[BarSeries]) -> String {
    let max = max_value(series);
    let label_width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let series_width = series.iter().map(|s| s.name.chars().count()).max().unwrap_or(0);

    let mut out = String::new();
    let _ = writeln!(out, "{title}");
    for (i, label) in labels.iter().enumerate() {
        for (j, s) in series.iter().enumerate() {
            let value = s.values.get(i).copied().unwrap_or(0);
            let shown = if j == 0 { label.as_str() } else { "" };
            let _ = writeln!(
                out,
                "  {:<lw$} | {:<sw$} {} {}",
                shown,
                s.name,
                "#".repeat(scaled(value, max, TEXT_BAR_WIDTH)),
                value,
                lw = label_width,
                sw = series_width,
            );
        }
    }
    out
}

/// Vertical grouped bar chart as a standalone `<svg>` element.
pub fn svg_bar_chart(title: &str, y_label: &str, labels: &[String], series: &[BarSeries]) -> String {
    let plot_w = SVG_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = SVG_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let max = max_value(series).max(1);

    let group_w = if labels.is_empty() {
        plot_w
    } else {
        plot_w / labels.len() as f64
    };
    let bar_w = group_w * 0.8 / series.len().max(1) as f64;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        "<svg xmlns='http://www.w3.org/2000/svg' width='{SVG_WIDTH:.0}' height='{SVG_HEIGHT:.0}' viewBox='0 0 {SVG_WIDTH:.0} {SVG_HEIGHT:.0}' role='img'>"
    );
    let _ = writeln!(
        svg,
        "  <text x='{:.0}' y='24' text-anchor='middle' font-size='16' font-weight='600'>{}</text>",
        SVG_WIDTH / 2.0,
        escape_html(title)
    );
    let _ = writeln!(
        svg,
        "  <text x='14' y='{:.0}' transform='rotate(-90 14 {:.0})' text-anchor='middle' font-size='12'>{}</text>",
        MARGIN_TOP + plot_h / 2.0,
        MARGIN_TOP + plot_h / 2.0,
        escape_html(y_label)
    );
    let _ = writeln!(
        svg,
        "  <line x1='{MARGIN_LEFT:.0}' y1='{:.2}' x2='{:.2}' y2='{:.2}' stroke='#444' stroke-width='1'/>",
        MARGIN_TOP + plot_h,
        MARGIN_LEFT + plot_w,
        MARGIN_TOP + plot_h
    );
    let _ = writeln!(
        svg,
        "  <text x='{:.0}' y='{:.0}' text-anchor='end' font-size='11'>{max}</text>",
        MARGIN_LEFT - 6.0,
        MARGIN_TOP + 4.0
    );

    for (i, label) in labels.iter().enumerate() {
        let group_x = MARGIN_LEFT + i as f64 * group_w + group_w * 0.1;
        for (j, s) in series.iter().enumerate() {
            let value = s.values.get(i).copied().unwrap_or(0);
            let h = plot_h * value as f64 / max as f64;
            let x = group_x + j as f64 * bar_w;
            let y = MARGIN_TOP + plot_h - h;
            let _ = writeln!(
                svg,
                "  <rect x='{x:.2}' y='{y:.2}' width='{bar_w:.2}' height='{h:.2}' fill='{}'><title>{}: {}</title></rect>",
                s.color,
                escape_html(&s.name),
                value
            );
        }
        let cx = MARGIN_LEFT + i as f64 * group_w + group_w / 2.0;
        let ly = MARGIN_TOP + plot_h + 14.0;
        let _ = writeln!(
            svg,
            "  <text x='{cx:.2}' y='{ly:.2}' transform='rotate(40 {cx:.2} {ly:.2})' font-size='11'>{}</text>",
            escape_html(label)
        );
    }

    if series.len() > 1 {
        for (j, s) in series.iter().enumerate() {
            let lx = SVG_WIDTH - MARGIN_RIGHT - 90.0;
            let ly = MARGIN_TOP + j as f64 * 18.0;
            let _ = writeln!(
                svg,
                "  <rect x='{lx:.0}' y='{ly:.0}' width='12' height='12' fill='{}'/>",
                s.color
            );
            let _ = writeln!(
                svg,
                "  <text x='{:.0}' y='{:.0}' font-size='12'>{}</text>",
                lx + 18.0,
                ly + 10.0,
                escape_html(&s.name)
            );
        }
    }

    let _ = writeln!(svg, "</svg>");
    svg
}
