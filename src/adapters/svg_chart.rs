//! SVG chart rendering of a completed run.
//!
//! Four stacked panels sharing the bar axis: price with signal markers,
//! volume, the retained indicators, and capital.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::domain::action::Action;
use crate::domain::backtest::{ChartData, ChartStyle};
use crate::domain::broker::Ledger;
use crate::domain::error::SteptraderError;
use crate::domain::ohlcv::Bar;
use crate::ports::report_port::ReportPort;

const WIDTH: f64 = 1200.0;
const HEIGHT: f64 = 820.0;
const LEFT: f64 = 80.0;
const RIGHT: f64 = 20.0;

const UP_COLOR: &str = "seagreen";
const DOWN_COLOR: &str = "red";
const PALETTE: [&str; 6] = ["#1f77b4", "#ff7f0e", "#2ca02c", "#9467bd", "#8c564b", "#e377c2"];

/// Writes the chart as a standalone SVG document. The bars come from the
/// table the run was made on.
pub struct SvgChartAdapter<'a> {
    bars: &'a [Bar],
}

impl<'a> SvgChartAdapter<'a> {
    pub fn new(bars: &'a [Bar]) -> Self {
        Self { bars }
    }
}

impl ReportPort for SvgChartAdapter<'_> {
    fn write(&self, chart: &ChartData<'_>, output_path: &Path) -> Result<(), SteptraderError> {
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(output_path, render(chart, self.bars))?;
        tracing::info!(path = %output_path.display(), "chart written");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct Panel {
    top: f64,
    height: f64,
    min: f64,
    max: f64,
}

impl Panel {
    fn new(top: f64, height: f64, range: Option<(f64, f64)>) -> Self {
        let (min, max) = match range {
            Some((lo, hi)) if hi > lo => (lo, hi),
            Some((v, _)) => (v - 1.0, v + 1.0),
            None => (0.0, 1.0),
        };
        Self {
            top,
            height,
            min,
            max,
        }
    }

    fn y(&self, value: f64) -> f64 {
        self.top + self.height - (value - self.min) / (self.max - self.min) * self.height
    }
}

#[derive(Debug, Clone, Copy)]
struct XAxis {
    step: f64,
}

impl XAxis {
    fn new(bars: usize) -> Self {
        Self {
            step: (WIDTH - LEFT - RIGHT) / bars.max(1) as f64,
        }
    }

    fn x(&self, i: usize) -> f64 {
        LEFT + (i as f64 + 0.5) * self.step
    }
}

fn finite_range(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// One `<polyline>` per run of finite values.
fn polylines(out: &mut String, values: &[f64], axis: XAxis, panel: Panel, color: &str) {
    let mut segment: Vec<String> = Vec::new();
    let flush = |segment: &mut Vec<String>, out: &mut String| {
        if segment.len() > 1 {
            let _ = writeln!(
                out,
                r#"<polyline fill="none" stroke="{color}" stroke-width="1.2" points="{}"/>"#,
                segment.join(" ")
            );
        }
        segment.clear();
    };
    for (i, &v) in values.iter().enumerate() {
        if v.is_finite() {
            segment.push(format!("{:.1},{:.1}", axis.x(i), panel.y(v)));
        } else {
            flush(&mut segment, out);
        }
    }
    flush(&mut segment, out);
}

fn frame(out: &mut String, panel: Panel, label: &str) {
    let _ = writeln!(
        out,
        r##"<rect x="{LEFT}" y="{:.1}" width="{:.1}" height="{:.1}" fill="white" stroke="#999"/>"##,
        panel.top,
        WIDTH - LEFT - RIGHT,
        panel.height
    );
    let _ = writeln!(
        out,
        r#"<text x="10" y="{:.1}" font-size="11">{}</text>"#,
        panel.top + 12.0,
        escape(label)
    );
    for value in [panel.max, panel.min] {
        let _ = writeln!(
            out,
            r#"<text x="{:.1}" y="{:.1}" font-size="9" text-anchor="end">{:.2}</text>"#,
            LEFT - 4.0,
            panel.y(value) + 3.0,
            value
        );
    }
}

fn price_panel(out: &mut String, bars: &[Bar], style: ChartStyle, axis: XAxis, panel: Panel) {
    frame(out, panel, "Price");
    match style {
        ChartStyle::Line => {
            let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
            polylines(out, &closes, axis, panel, PALETTE[0]);
        }
        ChartStyle::Ohlc => {
            let tick = (axis.step * 0.35).max(1.0);
            for (i, bar) in bars.iter().enumerate() {
                let x = axis.x(i);
                let color = if bar.close >= bar.open { UP_COLOR } else { DOWN_COLOR };
                let _ = writeln!(
                    out,
                    r#"<g stroke="{color}"><line x1="{x:.1}" y1="{:.1}" x2="{x:.1}" y2="{:.1}"/><line x1="{:.1}" y1="{:.1}" x2="{x:.1}" y2="{:.1}"/><line x1="{x:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}"/></g>"#,
                    panel.y(bar.high),
                    panel.y(bar.low),
                    x - tick,
                    panel.y(bar.open),
                    panel.y(bar.open),
                    panel.y(bar.close),
                    x + tick,
                    panel.y(bar.close),
                );
            }
        }
        ChartStyle::Candle => {
            let body = (axis.step * 0.7).max(1.0);
            for (i, bar) in bars.iter().enumerate() {
                let x = axis.x(i);
                let color = if bar.close >= bar.open { UP_COLOR } else { DOWN_COLOR };
                let top = panel.y(bar.open.max(bar.close));
                let bottom = panel.y(bar.open.min(bar.close));
                let _ = writeln!(
                    out,
                    r#"<g stroke="{color}" fill="{color}"><line x1="{x:.1}" y1="{:.1}" x2="{x:.1}" y2="{:.1}"/><rect x="{:.1}" y="{top:.1}" width="{body:.1}" height="{:.1}"/></g>"#,
                    panel.y(bar.high),
                    panel.y(bar.low),
                    x - body / 2.0,
                    (bottom - top).max(0.5),
                );
            }
        }
    }
}

fn signal_markers(out: &mut String, ledger: &Ledger, axis: XAxis, panel: Panel) {
    for (i, row) in ledger.rows.iter().enumerate() {
        let Some(action) = row.signal else { continue };
        let x = axis.x(i);
        let y = panel.y(row.close);
        let marker = match action {
            Action::Long => format!(
                r#"<path d="M{x:.1},{:.1} l-5,9 h10 z" fill="green"/>"#,
                y + 4.0
            ),
            Action::Short => format!(
                r#"<path d="M{x:.1},{:.1} l-5,-9 h10 z" fill="red"/>"#,
                y - 4.0
            ),
            Action::Flatten => {
                format!(r#"<circle cx="{x:.1}" cy="{y:.1}" r="4" fill="gold"/>"#)
            }
        };
        let _ = writeln!(out, "{marker}");
    }
}

fn volume_panel(out: &mut String, bars: &[Bar], axis: XAxis, panel: Panel) {
    frame(out, panel, "Volume");
    let width = (axis.step * 0.7).max(1.0);
    let base = panel.y(panel.min);
    for (i, bar) in bars.iter().enumerate() {
        let color = if bar.close >= bar.open { UP_COLOR } else { DOWN_COLOR };
        let top = panel.y(bar.volume);
        let _ = writeln!(
            out,
            r#"<rect x="{:.1}" y="{top:.1}" width="{width:.1}" height="{:.1}" fill="{color}" opacity="0.6"/>"#,
            axis.x(i) - width / 2.0,
            (base - top).max(0.0),
        );
    }
}

fn legend(out: &mut String, panel: Panel, entries: &[(String, &str)]) {
    for (n, (label, color)) in entries.iter().enumerate() {
        let y = panel.top + 14.0 + n as f64 * 13.0;
        let _ = writeln!(
            out,
            r#"<text x="{:.1}" y="{y:.1}" font-size="10" fill="{color}">{}</text>"#,
            LEFT + 8.0,
            escape(label)
        );
    }
}

/// The complete SVG document for `chart`.
pub fn render(chart: &ChartData<'_>, bars: &[Bar]) -> String {
    let ledger = chart.ledger;
    let axis = XAxis::new(bars.len());

    let price = Panel::new(
        50.0,
        320.0,
        finite_range(bars.iter().flat_map(|b| [b.high, b.low])),
    );
    let volume = Panel::new(
        380.0,
        80.0,
        finite_range(bars.iter().map(|b| b.volume).chain([0.0])),
    );
    let indicators = Panel::new(
        470.0,
        180.0,
        finite_range(
            ledger
                .indicators
                .iter()
                .flat_map(|i| i.lines().iter().flatten().copied()),
        ),
    );
    let capital = Panel::new(660.0, 150.0, finite_range(ledger.capital()));

    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif">"#
    );
    let _ = writeln!(
        out,
        r#"<rect width="100%" height="100%" fill="rgb(209,212,217)"/>"#
    );
    let _ = writeln!(
        out,
        r#"<text x="{:.1}" y="34" font-size="24" font-weight="bold" text-anchor="middle">{}</text>"#,
        WIDTH / 2.0,
        escape(chart.title)
    );

    price_panel(&mut out, bars, chart.style, axis, price);
    signal_markers(&mut out, ledger, axis, price);
    volume_panel(&mut out, bars, axis, volume);

    frame(&mut out, indicators, "Indicators");
    let mut entries: Vec<(String, &str)> = Vec::new();
    for indicator in &ledger.indicators {
        for (i, line) in indicator.lines().iter().enumerate() {
            let color = PALETTE[entries.len() % PALETTE.len()];
            polylines(&mut out, line, axis, indicators, color);
            let label = match i {
                0 => indicator.name().to_string(),
                _ => format!("{}[{}]", indicator.name(), i),
            };
            entries.push((label, color));
        }
    }
    legend(&mut out, indicators, &entries);

    frame(&mut out, capital, "Portfolio Value");
    polylines(&mut out, &ledger.capital(), axis, capital, PALETTE[0]);
    legend(&mut out, capital, &[("capital".to_string(), PALETTE[0])]);

    out.push_str("</svg>\n");
    out
}
