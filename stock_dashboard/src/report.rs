//! Text and JSON renderings of a [`DashboardView`].

use std::fmt::Write;

use serde::Serialize;

use crate::{
    chart::Figure,
    indicators::IndicatorSeries,
    metrics::Metrics,
    refresh::DashboardView,
    request::{DashboardRequest, Period},
    series::{self, Bar, Series},
};

pub fn currency_symbol(code: &str) -> &'static str {
    match code {
        "USD" => "$",
        "EUR" => "€",
        "GBP" => "£",
        "JPY" => "¥",
        _ => "",
    }
}

/// `1234567` -> `1,234,567`.
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Sign of a value as it will print at two decimals; `-0.00` reads as `+`.
fn sign(value: f64) -> char {
    if value < 0.0 && format!("{:.2}", value.abs()) != "0.00" {
        '-'
    } else {
        '+'
    }
}

/// `$110.00 USD`
pub fn format_price(value: f64, currency: &str) -> String {
    format!("{}{:.2} {}", currency_symbol(currency), value, currency)
}

/// `+$10.00 (+10.00%)`, or `+$0.00 (n/a)` when the percentage is undefined.
pub fn format_delta(change: f64, pct_change: Option<f64>, currency: &str) -> String {
    let pct = match pct_change {
        Some(p) => format!("{}{:.2}%", sign(p), p.abs()),
        None => "n/a".to_string(),
    };
    format!(
        "{}{}{:.2} ({})",
        sign(change),
        currency_symbol(currency),
        change.abs(),
        pct
    )
}

/// Display strings for the metrics panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub label: String,
    pub last_price: String,
    pub delta: String,
    pub high: String,
    pub low: String,
    pub volume: String,
}

impl MetricsSummary {
    pub fn new(ticker: &str, metrics: &Metrics, currency: &str) -> Self {
        Self {
            label: format!("{ticker} Last Price"),
            last_price: format_price(metrics.last_close, currency),
            delta: format_delta(metrics.change, metrics.pct_change, currency),
            high: format_price(metrics.high, currency),
            low: format_price(metrics.low, currency),
            volume: format!("{} shares", thousands(metrics.volume)),
        }
    }
}

/// A rectangular table of display strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Left-aligned first column, right-aligned numbers, two spaces between.
    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        let mut line = |cells: &[String]| {
            let mut text = String::new();
            for (i, (cell, w)) in cells.iter().zip(widths.iter().copied()).enumerate() {
                if i == 0 {
                    let _ = write!(text, "{cell:<w$}");
                } else {
                    let _ = write!(text, "  {cell:>w$}");
                }
            }
            out.push_str(text.trim_end());
            out.push('\n');
        };
        line(&self.headers);
        for row in &self.rows {
            line(row);
        }
        out
    }
}

fn price_cell(v: f64) -> String {
    format!("{v:.2}")
}

/// The last `n` canonical bars.
pub fn bars_table(series: &Series, n: usize) -> Table {
    let headers = [
        series::TIMESTAMP,
        series::OPEN,
        series::HIGH,
        series::LOW,
        series::CLOSE,
        series::VOLUME,
    ];
    Table {
        headers: headers.iter().map(|h| h.to_string()).collect(),
        rows: series
            .tail(n)
            .iter()
            .map(|b: &Bar| {
                vec![
                    series::format_timestamp(&b.timestamp),
                    price_cell(b.open),
                    price_cell(b.high),
                    price_cell(b.low),
                    price_cell(b.close),
                    thousands(b.volume),
                ]
            })
            .collect(),
    }
}

/// The last `n` indicator rows; undefined values are blank.
pub fn indicators_table(series: &Series, indicators: &[IndicatorSeries], n: usize) -> Table {
    let mut headers = vec![series::TIMESTAMP.to_string()];
    headers.extend(indicators.iter().map(IndicatorSeries::label));

    let start = series.len().saturating_sub(n);
    let rows = series.bars[start..]
        .iter()
        .enumerate()
        .map(|(offset, bar)| {
            let i = start + offset;
            let mut row = vec![series::format_timestamp(&bar.timestamp)];
            row.extend(indicators.iter().map(|ind| {
                ind.values
                    .get(i)
                    .copied()
                    .flatten()
                    .map(price_cell)
                    .unwrap_or_default()
            }));
            row
        })
        .collect();
    Table { headers, rows }
}

pub fn render_text(view: &DashboardView) -> String {
    let req = &view.request;
    let summary = MetricsSummary::new(req.ticker(), &view.metrics, &view.currency);
    let mut out = String::new();

    let _ = writeln!(out, "{}", view.figure.layout.title.text);
    let _ = writeln!(
        out,
        "{} chart, {} bars, {}",
        req.chart_type,
        view.series.len(),
        view.series.timezone.name()
    );
    out.push('\n');
    let _ = writeln!(out, "{}: {}  {}", summary.label, summary.last_price, summary.delta);
    let _ = writeln!(out, "High: {}", summary.high);
    let _ = writeln!(out, "Low: {}", summary.low);
    let _ = writeln!(out, "Volume: {}", summary.volume);

    out.push_str("\nHistorical Data\n");
    out.push_str(&bars_table(&view.series, view.table_rows).render());

    out.push_str("\nTechnical Indicators\n");
    out.push_str(&indicators_table(&view.series, &view.indicators, view.table_rows).render());
    out
}

#[derive(Serialize)]
struct JsonView<'a> {
    request: &'a DashboardRequest,
    currency: &'a str,
    metrics: &'a Metrics,
    summary: MetricsSummary,
    figure: &'a Figure,
    historical: Table,
    indicators: Table,
}

pub fn render_json(view: &DashboardView) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonView {
        request: &view.request,
        currency: &view.currency,
        metrics: &view.metrics,
        summary: MetricsSummary::new(view.request.ticker(), &view.metrics, &view.currency),
        figure: &view.figure,
        historical: bars_table(&view.series, view.table_rows),
        indicators: indicators_table(&view.series, &view.indicators, view.table_rows),
    })
}

/// Shown instead of the dashboard when the window held no bars.
pub fn render_no_data(ticker: &str, period: Period) -> String {
    format!(
        "No data for {ticker} over {}.\nThe market may have been closed for the whole window.\n",
        period.label()
    )
}
