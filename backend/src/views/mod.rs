//! Server-rendered HTML for the browser form.

use crate::models::{AnalysisReport, MetricBlock};
use crate::services::chart_service;

const STYLE: &str = "body{font-family:Arial,sans-serif;max-width:780px;margin:2rem auto;color:#222}\
.chart{margin:1rem 0}.error{background:#fdecea;color:#611a15;padding:.75rem 1rem;border-radius:4px}\
input{padding:.3rem;margin-right:.5rem}button{padding:.3rem .8rem}";

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(ticker: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Stock Analysis</title><style>{style}</style></head>
<body>
<h1>Stock Analysis</h1>
<form method="get" action="/analyse">
<label for="ticker">Enter a stock ticker (e.g., AAPL)</label><br>
<input id="ticker" name="ticker" value="{ticker}">
<button type="submit">Analyse Stock</button>
</form>
{body}
</body>
</html>"#,
        style = STYLE,
        ticker = escape_html(ticker),
        body = body
    )
}

fn render_block(block: &MetricBlock) -> String {
    let items: String = block
        .lines
        .iter()
        .map(|line| format!("<li>{}</li>", escape_html(line)))
        .collect();
    format!(
        r#"<section class="metrics"><h5>{title}:</h5><ul>{items}</ul></section>"#,
        title = escape_html(&block.title),
        items = items
    )
}

/// Empty form, ticker pre-filled.
pub fn form_page(default_ticker: &str) -> String {
    layout(default_ticker, "")
}

/// Form followed by the chart and the metric blocks.
pub fn report_page(report: &AnalysisReport) -> String {
    let mut body = chart_service::render_svg(&report.chart);
    body.push_str("<h3>General Performance Metrics</h3>");
    for block in &report.blocks {
        body.push_str(&render_block(block));
    }
    layout(&report.ticker, &body)
}

/// Form followed by a single error message; no chart or metrics.
pub fn error_page(ticker: &str, message: &str) -> String {
    let body = format!(
        r#"<div class="error" role="alert">Error fetching data: {}</div>"#,
        escape_html(message)
    );
    layout(ticker, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">S&P's</a>"#), "&lt;a href=&quot;x&quot;&gt;S&amp;P&#39;s&lt;/a&gt;");
    }

    #[test]
    fn test_form_page_prefills_ticker() {
        let html = form_page("AAPL");
        assert!(html.contains(r#"name="ticker" value="AAPL""#));
        assert!(html.contains("Analyse Stock"));
        assert!(!html.contains("class=\"error\""));
    }

    #[test]
    fn test_error_page_has_one_message_and_no_chart() {
        let html = error_page("ZZZZ", "no data found for symbol ZZZZ");
        assert_eq!(html.matches("Error fetching data:").count(), 1);
        assert!(!html.contains("<svg"));
        assert!(!html.contains("Metrics"));
    }
}
