//! Markdown report adapter: GitHub-style tables for stdout and `.md` files.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::domain::error::ScannerError;
use crate::domain::ranking::Ranking;
use crate::domain::scan::{QuoteSection, ScanReport};
use crate::ports::report_port::ReportPort;

const HEADERS: [&str; 3] = ["Symbol", "Score", "Price"];

/// Render a table with columns padded to their widest cell.
fn render_table(out: &mut String, rows: &[[String; 3]]) {
    let mut widths = HEADERS.map(str::len);
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let line = |out: &mut String, cells: [&str; 3]| {
        out.push('|');
        for (cell, width) in cells.iter().zip(widths) {
            let _ = write!(out, " {:<width$} |", cell, width = width);
        }
        out.push('\n');
    };

    line(&mut *out, HEADERS);
    out.push('|');
    for width in widths {
        out.push_str(&"-".repeat(width + 2));
        out.push('|');
    }
    out.push('\n');
    for row in rows {
        line(&mut *out, [&row[0], &row[1], &row[2]]);
    }
}

fn render_ranking(out: &mut String, ranking: &Ranking) {
    let _ = writeln!(
        out,
        "### {} ({})\n",
        ranking.timeframe.label,
        ranking.timeframe.code.to_uppercase()
    );

    if ranking.records.is_empty() {
        out.push_str("No qualifying assets.\n");
    } else {
        let rows: Vec<[String; 3]> = ranking
            .records
            .iter()
            .map(|r| {
                [
                    r.display_symbol(),
                    r.score.to_string(),
                    format!("{:.8}", r.last_close),
                ]
            })
            .collect();
        render_table(out, &rows);
    }

    if !ranking.skipped.is_empty() {
        let _ = writeln!(out, "\n_{} skipped_", ranking.skipped.len());
    }
    out.push('\n');
}

fn render_quote(out: &mut String, section: &QuoteSection) {
    let _ = writeln!(out, "## {}-Denominated Markets\n", section.quote);
    for ranking in &section.rankings {
        render_ranking(out, ranking);
    }
}

pub fn render_markdown(report: &ScanReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", report.title);
    let _ = writeln!(
        out,
        "Generated {}\n",
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    for section in &report.quotes {
        render_quote(&mut out, section);
    }
    out
}

pub struct MarkdownReportAdapter;

impl MarkdownReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MarkdownReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for MarkdownReportAdapter {
    fn write(&self, report: &ScanReport, output_path: &str) -> Result<(), ScannerError> {
        let path = Path::new(output_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, render_markdown(report))?;
        Ok(())
    }
}
