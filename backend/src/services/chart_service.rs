use chrono::Datelike;

use crate::models::{ChartPoint, LineChart, PriceSeries};
use crate::views::escape_html;

const WIDTH: i32 = 720;
const HEIGHT: i32 = 360;
const PADDING: f64 = 48.0;
const LINE_COLOR: &str = "#348dc1";
const MAX_TIME_LABELS: usize = 10;

/// Closing price over time, titled after `label`. Does not touch `series`.
pub fn build_price_chart(series: &PriceSeries, label: &str) -> LineChart {
    LineChart {
        title: format!("{} Stock Price", label),
        x_label: "Date".to_string(),
        y_label: "Close".to_string(),
        points: series
            .records
            .iter()
            .map(|r| ChartPoint { date: r.date, value: r.close })
            .collect(),
    }
}

fn svg_header(width: i32, height: i32) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" role="img"><style>text{{font-family:Arial,sans-serif;font-size:11px;fill:#666}}</style>"#,
        w = width,
        h = height
    )
}

fn x_positions(len: usize, width: f64) -> Vec<f64> {
    match len {
        0 => Vec::new(),
        1 => vec![width / 2.0],
        _ => {
            let inner = width - 2.0 * PADDING;
            (0..len)
                .map(|i| PADDING + inner * (i as f64 / (len - 1) as f64))
                .collect()
        }
    }
}

fn extent(values: &[f64]) -> Option<(f64, f64)> {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let min = finite.clone().fold(f64::INFINITY, f64::min);
    let max = finite.fold(f64::NEG_INFINITY, f64::max);
    (min.is_finite() && max.is_finite()).then_some((min, max))
}

fn scale_y(value: f64, min: f64, max: f64, height: f64) -> f64 {
    if max == min {
        return height / 2.0;
    }
    let norm = (value - min) / (max - min);
    PADDING + (1.0 - norm) * (height - 2.0 * PADDING)
}

fn add_value_axis(svg: &mut String, min: f64, max: f64, width: f64, height: f64) {
    for value in [min, max] {
        let y = scale_y(value, min, max, height);
        svg.push_str(&format!(
            r##"<line x1="{x1:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="#dddddd" stroke-width="0.5" />"##,
            x1 = PADDING,
            x2 = width - PADDING,
            y = y
        ));
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="end" dy="4">{label:.2}</text>"#,
            x = PADDING - 6.0,
            y = y,
            label = value
        ));
    }
}

fn add_time_axis(svg: &mut String, chart: &LineChart, xs: &[f64], width: f64, height: f64) {
    let axis_y = height - PADDING + 5.0;
    svg.push_str(&format!(
        r##"<line x1="{x1:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="#000" stroke-width="1" />"##,
        x1 = PADDING,
        x2 = width - PADDING,
        y = axis_y
    ));

    // one candidate tick per calendar year, thinned to keep labels readable
    let mut ticks: Vec<usize> = Vec::new();
    let mut last_year = None;
    for (idx, point) in chart.points.iter().enumerate() {
        if last_year != Some(point.date.year()) {
            last_year = Some(point.date.year());
            ticks.push(idx);
        }
    }
    if ticks.len() < 2 {
        ticks = vec![0, chart.points.len().saturating_sub(1)];
        ticks.dedup();
    }
    let step = ticks.len().div_ceil(MAX_TIME_LABELS).max(1);
    let use_full_date = last_year == chart.points.first().map(|p| p.date.year());

    for &idx in ticks.iter().step_by(step) {
        let (Some(point), Some(&x)) = (chart.points.get(idx), xs.get(idx)) else {
            continue;
        };
        let label = if use_full_date {
            point.date.format("%Y-%m-%d").to_string()
        } else {
            point.date.format("%Y").to_string()
        };
        svg.push_str(&format!(
            r##"<line x1="{x:.2}" y1="{y1:.2}" x2="{x:.2}" y2="{y2:.2}" stroke="#ccc" stroke-width="1" />"##,
            x = x,
            y1 = axis_y,
            y2 = axis_y + 4.0
        ));
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle">{label}</text>"#,
            x = x,
            y = axis_y + 16.0,
            label = label
        ));
    }
}

/// Render a [`LineChart`] as a standalone inline SVG wrapped in a titled div.
pub fn render_svg(chart: &LineChart) -> String {
    let width = WIDTH as f64;
    let height = HEIGHT as f64;
    let title = escape_html(&chart.title);

    let mut svg = svg_header(WIDTH, HEIGHT);
    svg.push_str(&format!(
        r##"<text x="{x:.2}" y="20" text-anchor="middle" style="font-size:14px;fill:#333">{title}</text>"##,
        x = width / 2.0,
        title = title
    ));

    let values: Vec<f64> = chart.points.iter().map(|p| p.value).collect();
    if let Some((min, max)) = extent(&values) {
        let xs = x_positions(values.len(), width);
        let coords = xs
            .iter()
            .zip(&values)
            .filter(|(_, v)| v.is_finite())
            .map(|(x, v)| format!("{:.2},{:.2}", x, scale_y(*v, min, max, height)))
            .collect::<Vec<_>>()
            .join(" ");

        add_value_axis(&mut svg, min, max, width, height);
        svg.push_str(&format!(
            r#"<polyline fill="none" stroke="{stroke}" stroke-width="1.5" points="{coords}" />"#,
            stroke = LINE_COLOR,
            coords = coords
        ));
        add_time_axis(&mut svg, chart, &xs, width, height);
    }

    svg.push_str(&format!(
        r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle">{label}</text>"#,
        x = width / 2.0,
        y = height - 6.0,
        label = escape_html(&chart.x_label)
    ));
    svg.push_str(&format!(
        r#"<text x="12" y="{y:.2}" text-anchor="middle" transform="rotate(-90 12 {y:.2})">{label}</text>"#,
        y = height / 2.0,
        label = escape_html(&chart.y_label)
    ));
    svg.push_str("</svg>");

    format!(r#"<div class="chart">{svg}</div>"#, svg = svg)
}
