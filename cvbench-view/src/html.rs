//! Server-rendered HTML for the viewer page and the offline report

use crate::canvas::{draw_bar_chart, draw_line_chart};
use crate::format::{escape_markup, title_case};
use crate::shell::{Notice, ViewModel, NO_MATCHES_MESSAGE};
use crate::state::{
    ChartSelection, FilterState, SortDirection, SortState, ViewState, CATEGORY_KEYS, SERIES_KEYS,
    X_AXIS_KEYS,
};
use crate::svg::SvgCanvas;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const BAR_CHART_SIZE: (u32, u32) = (900, 520);
const LINE_CHART_SIZE: (u32, u32) = (900, 460);

/// View state as carried in the page URL
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewQuery {
    pub algorithm: Option<String>,
    pub dataset: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<String>,
    pub metric: Option<String>,
    pub category: Option<String>,
    pub x_axis: Option<String>,
    pub series: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ViewQuery {
    /// Build a view state, falling back to `defaults` for anything absent or
    /// unparseable
    pub fn to_view(&self, defaults: &ChartSelection) -> ViewState {
        let sort = match non_blank(&self.sort) {
            Some(key) => SortState {
                key: key.to_string(),
                direction: non_blank(&self.dir)
                    .and_then(|dir| dir.parse().ok())
                    .unwrap_or(SortDirection::Ascending),
            },
            None => SortState::default(),
        };
        let pick = |value: &Option<String>, fallback: &str| {
            non_blank(value).unwrap_or(fallback).to_string()
        };
        ViewState {
            filters: FilterState::new(
                self.algorithm.clone().unwrap_or_default(),
                self.dataset.clone().unwrap_or_default(),
            ),
            sort,
            chart: ChartSelection {
                metric: non_blank(&self.metric).map(str::to_string),
                category_key: pick(&self.category, &defaults.category_key),
                x_axis_key: pick(&self.x_axis, &defaults.x_axis_key),
                series_key: pick(&self.series, &defaults.series_key),
            },
        }
    }

    pub fn from_view(view: &ViewState) -> Self {
        let text = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Self {
            algorithm: text(&view.filters.algorithm),
            dataset: text(&view.filters.dataset),
            sort: Some(view.sort.key.clone()),
            dir: Some(direction_param(view.sort.direction).to_string()),
            metric: view.chart.metric.clone(),
            category: Some(view.chart.category_key.clone()),
            x_axis: Some(view.chart.x_axis_key.clone()),
            series: Some(view.chart.series_key.clone()),
        }
    }

    pub fn to_query_string(&self) -> String {
        let pairs = [
            ("algorithm", &self.algorithm),
            ("dataset", &self.dataset),
            ("sort", &self.sort),
            ("dir", &self.dir),
            ("metric", &self.metric),
            ("category", &self.category),
            ("x_axis", &self.x_axis),
            ("series", &self.series),
        ];
        pairs
            .iter()
            .filter_map(|(name, value)| {
                value
                    .as_deref()
                    .map(|value| format!("{name}={}", encode_component(value)))
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn direction_param(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Ascending => "asc",
        SortDirection::Descending => "desc",
    }
}

/// Percent-encode everything outside the URL unreserved set
fn encode_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[derive(Debug, Clone)]
pub struct PageOptions {
    pub title: String,
    /// Shown in the summary block when set
    pub generated_at: Option<DateTime<Utc>>,
    /// Render the filter form and sortable header links
    pub interactive: bool,
    /// Path the form and sort links point at
    pub action: String,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            title: "Computer Vision Algorithm Benchmarks".to_string(),
            generated_at: None,
            interactive: true,
            action: "/".to_string(),
        }
    }
}

fn page_head(title: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 40px; background: #f5f5f5; }}
        .container {{ max-width: 1200px; margin: 0 auto; background: white; padding: 30px; border-radius: 8px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }}
        h1 {{ color: #2c3e50; text-align: center; margin-bottom: 30px; }}
        h2 {{ color: #34495e; border-bottom: 2px solid #3498db; padding-bottom: 10px; }}
        .summary {{ background: #ecf0f1; padding: 20px; border-radius: 6px; margin: 20px 0; }}
        .controls {{ display: flex; flex-wrap: wrap; gap: 16px; align-items: flex-end; margin: 20px 0; }}
        .controls label {{ display: block; font-size: 12px; color: #7f8c8d; }}
        .chart {{ text-align: center; margin: 30px 0; }}
        .notice {{ background: #fceaea; padding: 10px; margin: 5px 0; border-left: 4px solid #e74c3c; }}
        .feedback {{ text-align: center; padding: 40px; color: #34495e; }}
        .error {{ color: #e74c3c; }}
        table {{ width: 100%; border-collapse: collapse; margin: 20px 0; }}
        th, td {{ padding: 12px; text-align: left; border-bottom: 1px solid #ddd; }}
        th {{ background-color: #3498db; color: white; }}
        th a {{ color: white; text-decoration: none; }}
        tr:nth-child(even) {{ background-color: #f2f2f2; }}
    </style>
</head>
<body>
    <div class="container">
"#,
        title = escape_markup(title)
    )
}

const PAGE_FOOT: &str = r#"
    </div>
</body>
</html>"#;

/// Full-page message for the loading and failed states
pub fn render_status_page(title: &str, message: &str, is_error: bool) -> String {
    let mut html = page_head(title);
    html.push_str(&format!(
        r#"<div class="feedback{}">{}</div>"#,
        if is_error { " error" } else { "" },
        escape_markup(message)
    ));
    html.push_str(PAGE_FOOT);
    html
}

/// The complete viewer page for `model`
pub fn render_page(model: &ViewModel, notices: &[Notice], options: &PageOptions) -> String {
    let mut html = page_head(&options.title);
    html.push_str(&format!("<h1>{}</h1>", escape_markup(&options.title)));

    html.push_str(r#"<div class="summary">"#);
    if let Some(generated_at) = options.generated_at {
        html.push_str(&format!(
            "<p><strong>Generated:</strong> {}</p>",
            generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    html.push_str(&format!(
        "<p><strong>Records shown:</strong> {} of {}</p></div>",
        model.shown, model.total
    ));

    for notice in notices {
        html.push_str(&format!(
            r#"<div class="notice" data-notice="{}">{}</div>"#,
            notice.id,
            escape_markup(&notice.message)
        ));
    }

    if options.interactive {
        html.push_str(&render_controls(model, &options.action));
    }

    if model.is_empty() {
        html.push_str(&format!(
            r#"<p class="feedback">{}</p>"#,
            escape_markup(NO_MATCHES_MESSAGE)
        ));
        html.push_str(PAGE_FOOT);
        return html;
    }

    html.push_str("<h2>Results</h2>");
    html.push_str(&render_table(model, options));

    html.push_str("<h2>Charts</h2>");
    html.push_str(&format!(r#"<div class="chart">{}</div>"#, bar_chart_svg(model)));
    html.push_str(&format!(r#"<div class="chart">{}</div>"#, line_chart_svg(model)));

    html.push_str(PAGE_FOOT);
    html
}

/// Standalone SVG document for the 3D bar view
pub fn bar_chart_svg(model: &ViewModel) -> String {
    let mut canvas = SvgCanvas::new(BAR_CHART_SIZE.0, BAR_CHART_SIZE.1);
    if let Some(projection) = &model.bars {
        canvas = canvas.titled(projection.title.clone());
    }
    draw_bar_chart(&mut canvas, model.bars.as_ref());
    canvas.finish()
}

/// Standalone SVG document for the line view
pub fn line_chart_svg(model: &ViewModel) -> String {
    let mut canvas = SvgCanvas::new(LINE_CHART_SIZE.0, LINE_CHART_SIZE.1);
    draw_line_chart(&mut canvas, model.lines.as_ref());
    canvas.finish()
}

fn render_table(model: &ViewModel, options: &PageOptions) -> String {
    let mut html = String::from(r#"<table id="benchmark-table"><tr>"#);
    for header in &model.table.headers {
        let label = escape_markup(&header.label());
        if options.interactive {
            let next = model.view.toggled_sort(header.key);
            let href = format!(
                "{}?{}",
                options.action,
                ViewQuery::from_view(&next).to_query_string()
            );
            html.push_str(&format!(
                r#"<th><a href="{}">{}</a></th>"#,
                escape_markup(&href),
                label
            ));
        } else {
            html.push_str(&format!("<th>{label}</th>"));
        }
    }
    html.push_str("</tr>");
    for row in &model.table.rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", escape_markup(cell)));
        }
        html.push_str("</tr>");
    }
    html.push_str("</table>");
    html
}

fn render_select(name: &str, label: &str, options: &[String], selected: Option<&str>, empty: &str) -> String {
    let mut html = format!(r#"<div><label for="{name}">{label}</label><select id="{name}" name="{name}">"#);
    if options.is_empty() {
        html.push_str(&format!(r#"<option value="">{}</option>"#, escape_markup(empty)));
    }
    for option in options {
        html.push_str(&format!(
            r#"<option value="{}"{}>{}</option>"#,
            escape_markup(option),
            if Some(option.as_str()) == selected { " selected" } else { "" },
            escape_markup(&title_case(option))
        ));
    }
    html.push_str("</select></div>");
    html
}

fn owned_keys(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|key| key.to_string()).collect()
}

fn render_controls(model: &ViewModel, action: &str) -> String {
    let view = &model.view;
    let mut html = format!(r#"<form class="controls" method="get" action="{}">"#, escape_markup(action));
    html.push_str(&format!(
        r#"<div><label for="algorithm">Algorithm</label><input type="text" id="algorithm" name="algorithm" placeholder="Filter by Algorithm Name..." value="{}"></div>"#,
        escape_markup(&view.filters.algorithm)
    ));
    html.push_str(&format!(
        r#"<div><label for="dataset">Dataset</label><input type="text" id="dataset" name="dataset" placeholder="Filter by Dataset Name..." value="{}"></div>"#,
        escape_markup(&view.filters.dataset)
    ));
    html.push_str(&format!(
        r#"<input type="hidden" name="sort" value="{}"><input type="hidden" name="dir" value="{}">"#,
        escape_markup(&view.sort.key),
        direction_param(view.sort.direction)
    ));
    html.push_str(&render_select(
        "metric",
        "Chart Metric",
        &model.metrics,
        view.chart.metric.as_deref(),
        "No numeric metrics available",
    ));
    html.push_str(&render_select(
        "category",
        "Bar Category",
        &owned_keys(&CATEGORY_KEYS),
        Some(view.chart.category_key.as_str()),
        "",
    ));
    html.push_str(&render_select(
        "x_axis",
        "Chart X-Axis",
        &owned_keys(&X_AXIS_KEYS),
        Some(view.chart.x_axis_key.as_str()),
        "",
    ));
    html.push_str(&render_select(
        "series",
        "Chart Series (Group By)",
        &owned_keys(&SERIES_KEYS),
        Some(view.chart.series_key.as_str()),
        "",
    ));
    html.push_str(r#"<div><button type="submit">Apply</button></div></form>"#);
    html
}
