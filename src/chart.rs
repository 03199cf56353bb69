//! Bar and pie presentation of poll results.
//!
//! Everything here is a pure function of [`PollResults`]: a view model the
//! JSON API returns as-is, and an SVG rendering of that view model.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};
use uuid::Uuid;

use crate::models::PollResults;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Bar,
    Pie,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Color {
    pub name: &'static str,
    pub hex: &'static str,
}

pub const PALETTE: [Color; 8] = [
    Color { name: "blue", hex: "#3b82f6" },
    Color { name: "green", hex: "#10b981" },
    Color { name: "yellow", hex: "#f59e0b" },
    Color { name: "red", hex: "#ef4444" },
    Color { name: "purple", hex: "#8b5cf6" },
    Color { name: "pink", hex: "#ec4899" },
    Color { name: "indigo", hex: "#6366f1" },
    Color { name: "gray", hex: "#6b7280" },
];

pub fn color_for(index: usize) -> Color {
    PALETTE[index % PALETTE.len()]
}

/// Bars at or below this share show their label beside the bar, not on it.
const INLINE_LABEL_MIN_PERCENTAGE: f64 = 15.0;

pub const EMPTY_TITLE: &str = "No votes yet";
pub const EMPTY_HINT: &str = "Be the first to vote on this poll";

#[derive(Debug, Clone, Serialize)]
pub struct BarSegment {
    pub option_id: Uuid,
    pub label: String,
    pub votes: i64,
    pub percentage: i64,
    /// Width relative to the most-voted option, 0..=100.
    pub width: f64,
    pub inline_label: bool,
    pub color: Color,
}

#[derive(Debug, Clone, Serialize)]
pub struct PieWedge {
    pub option_id: Uuid,
    pub percentage: f64,
    pub dash_array: String,
    pub dash_offset: f64,
    pub color: Color,
}

#[derive(Debug, Clone, Serialize)]
pub struct LegendEntry {
    pub option_id: Uuid,
    pub label: String,
    pub votes: i64,
    pub percentage: i64,
    pub color: Color,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChartBody {
    Empty {
        title: &'static str,
        hint: &'static str,
    },
    Bar {
        bars: Vec<BarSegment>,
    },
    Pie {
        wedges: Vec<PieWedge>,
        legend: Vec<LegendEntry>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartView {
    pub question: String,
    pub total_votes: i64,
    pub total_label: String,
    pub chart_type: ChartType,
    pub show_toggle: bool,
    pub body: ChartBody,
}

fn votes_label(count: i64) -> &'static str {
    if count == 1 { "vote" } else { "votes" }
}

pub fn build_chart(results: &PollResults, chart_type: ChartType, show_toggle: bool) -> ChartView {
    let body = if results.is_empty() {
        ChartBody::Empty {
            title: EMPTY_TITLE,
            hint: EMPTY_HINT,
        }
    } else {
        match chart_type {
            ChartType::Bar => ChartBody::Bar {
                bars: bar_segments(results),
            },
            ChartType::Pie => ChartBody::Pie {
                wedges: pie_wedges(results),
                legend: legend(results),
            },
        }
    };

    ChartView {
        question: results.question.clone(),
        total_votes: results.total_votes,
        total_label: format!(
            "{} total {}",
            results.total_votes,
            votes_label(results.total_votes)
        ),
        chart_type,
        show_toggle: show_toggle && !results.is_empty(),
        body,
    }
}

fn bar_segments(results: &PollResults) -> Vec<BarSegment> {
    let max_votes = results.options.iter().map(|o| o.votes).max().unwrap_or(0);

    results
        .options
        .iter()
        .enumerate()
        .map(|(index, option)| BarSegment {
            option_id: option.option_id,
            label: option.option_text.clone(),
            votes: option.votes,
            percentage: option.rounded_percentage(),
            width: if max_votes > 0 {
                option.votes as f64 / max_votes as f64 * 100.0
            } else {
                0.0
            },
            inline_label: option.percentage > INLINE_LABEL_MIN_PERCENTAGE,
            color: color_for(index),
        })
        .collect()
}

fn pie_wedges(results: &PollResults) -> Vec<PieWedge> {
    let mut cumulative = 0.0;
    let mut wedges = Vec::new();

    // color stays tied to the option's index even when earlier wedges are skipped
    for (index, option) in results.options.iter().enumerate() {
        if option.percentage == 0.0 {
            continue;
        }
        wedges.push(PieWedge {
            option_id: option.option_id,
            percentage: option.percentage,
            dash_array: format!("{} {}", option.percentage, 100.0 - option.percentage),
            dash_offset: -cumulative,
            color: color_for(index),
        });
        cumulative += option.percentage;
    }

    wedges
}

fn legend(results: &PollResults) -> Vec<LegendEntry> {
    results
        .options
        .iter()
        .enumerate()
        .map(|(index, option)| LegendEntry {
            option_id: option.option_id,
            label: option.option_text.clone(),
            votes: option.votes,
            percentage: option.rounded_percentage(),
            color: color_for(index),
        })
        .collect()
}

fn escape_xml(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

const BAR_ROW_HEIGHT: usize = 56;
const BAR_TRACK_WIDTH: f64 = 400.0;

/// Render a chart view as a standalone SVG document.
pub fn render_svg(view: &ChartView) -> Result<String, fmt::Error> {
    let mut svg = String::new();
    write_svg(&mut svg, view)?;
    Ok(svg)
}

fn write_svg(svg: &mut String, view: &ChartView) -> fmt::Result {
    match &view.body {
        ChartBody::Empty { title, hint } => {
            write!(
                svg,
                r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 420 120" role="img"><text x="210" y="55" text-anchor="middle" font-weight="600">{}</text><text x="210" y="80" text-anchor="middle" font-size="12">{}</text></svg>"#,
                escape_xml(title),
                escape_xml(hint)
            )?;
        }
        ChartBody::Bar { bars } => {
            let height = bars.len() * BAR_ROW_HEIGHT + 8;
            write!(
                svg,
                r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 420 {}" role="img">"#,
                height
            )?;
            for (row, bar) in bars.iter().enumerate() {
                let y = row * BAR_ROW_HEIGHT;
                write!(
                    svg,
                    r#"<text x="10" y="{}" font-size="13">{}</text><text x="410" y="{}" font-size="12" text-anchor="end">{} {} ({}%)</text>"#,
                    y + 16,
                    escape_xml(&bar.label),
                    y + 16,
                    bar.votes,
                    votes_label(bar.votes),
                    bar.percentage
                )?;
                write!(
                    svg,
                    r##"<rect x="10" y="{}" width="{}" height="28" rx="4" fill="#f3f4f6"/><rect x="10" y="{}" width="{:.2}" height="28" rx="4" fill="{}"/>"##,
                    y + 22,
                    BAR_TRACK_WIDTH,
                    y + 22,
                    bar.width / 100.0 * BAR_TRACK_WIDTH,
                    bar.color.hex
                )?;
                if bar.inline_label {
                    write!(
                        svg,
                        r##"<text x="210" y="{}" font-size="12" fill="#fff" text-anchor="middle">{}%</text>"##,
                        y + 41,
                        bar.percentage
                    )?;
                }
            }
            svg.push_str("</svg>");
        }
        ChartBody::Pie { wedges, .. } => {
            svg.push_str(
                r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 42 42" role="img"><g transform="rotate(-90 21 21)">"#,
            );
            for wedge in wedges {
                write!(
                    svg,
                    r#"<circle cx="21" cy="21" r="15.915" fill="transparent" stroke="{}" stroke-width="3" stroke-dasharray="{}" stroke-dashoffset="{}"/>"#,
                    wedge.color.hex, wedge.dash_array, wedge.dash_offset
                )?;
            }
            write!(
                svg,
                r#"</g><text x="21" y="21" font-size="6" text-anchor="middle">{}</text><text x="21" y="27" font-size="3" text-anchor="middle">{}</text></svg>"#,
                view.total_votes,
                votes_label(view.total_votes)
            )?;
        }
    }

    Ok(())
}
