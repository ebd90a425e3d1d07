//! HTML report adapter implementing ReportPort.
//!
//! Renders one block per quote group, one table per timeframe inside it,
//! through an Askama template.

use std::fs;
use std::path::Path;

use askama::Template;

use crate::domain::error::ScannerError;
use crate::domain::ranking::Ranking;
use crate::domain::scan::{QuoteSection, ScanReport};
use crate::ports::report_port::ReportPort;

struct RowView {
    rank: usize,
    symbol: String,
    score: u32,
    price: String,
}

struct TimeframeView {
    heading: String,
    rows: Vec<RowView>,
    skipped: usize,
}

impl TimeframeView {
    fn from_ranking(ranking: &Ranking) -> Self {
        Self {
            heading: format!(
                "{} Timeframe ({}) - Top {}",
                ranking.timeframe.label,
                ranking.timeframe.code.to_uppercase(),
                ranking.records.len()
            ),
            rows: ranking
                .records
                .iter()
                .enumerate()
                .map(|(i, record)| RowView {
                    rank: i + 1,
                    symbol: record.display_symbol(),
                    score: record.score,
                    price: format!("{:.8}", record.last_close),
                })
                .collect(),
            skipped: ranking.skipped.len(),
        }
    }
}

struct QuoteView {
    heading: String,
    timeframes: Vec<TimeframeView>,
}

impl QuoteView {
    fn from_section(section: &QuoteSection) -> Self {
        Self {
            heading: format!("{}-Denominated Markets", section.quote),
            timeframes: section
                .rankings
                .iter()
                .map(TimeframeView::from_ranking)
                .collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "scan_report.html")]
struct ScanReportTemplate<'a> {
    title: &'a str,
    generated_at: String,
    quotes: Vec<QuoteView>,
}

pub fn render_html(report: &ScanReport) -> Result<String, ScannerError> {
    let template = ScanReportTemplate {
        title: &report.title,
        generated_at: report
            .generated_at
            .format("%B %d, %Y %H:%M UTC")
            .to_string(),
        quotes: report.quotes.iter().map(QuoteView::from_section).collect(),
    };
    template.render().map_err(|e| ScannerError::Report {
        reason: e.to_string(),
    })
}

pub struct HtmlReportAdapter;

impl HtmlReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HtmlReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for HtmlReportAdapter {
    fn write(&self, report: &ScanReport, output_path: &str) -> Result<(), ScannerError> {
        let html = render_html(report)?;

        let path = Path::new(output_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(ScannerError::Io)?;
        }
        fs::write(path, html).map_err(ScannerError::Io)?;
        Ok(())
    }
}
