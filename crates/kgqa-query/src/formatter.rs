//! Report formatting: JSON, Table, and Markdown output.

use serde::Serialize;

use kgqa_core::template::TemplateCatalog;

use crate::ranker::RankedCandidate;

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Table,
    Markdown,
}

/// Rows of text cells under named columns.
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Serialize)]
struct JsonReport {
    rows: Vec<serde_json::Map<String, serde_json::Value>>,
    total: usize,
}

/// One row per ranked candidate, best first.
#[must_use]
pub fn ranking_report(ranked: &[RankedCandidate]) -> Report {
    Report {
        columns: ["rank", "score", "template", "question", "query"]
            .map(String::from)
            .to_vec(),
        rows: ranked
            .iter()
            .enumerate()
            .map(|(i, r)| {
                vec![
                    (i + 1).to_string(),
                    format!("{:.4}", r.score),
                    r.candidate.template.to_string(),
                    r.candidate.question.clone(),
                    r.candidate.query.clone(),
                ]
            })
            .collect(),
    }
}

/// One row per catalog template.
#[must_use]
pub fn catalog_report(catalog: &TemplateCatalog) -> Report {
    Report {
        columns: ["template", "slots", "question", "query", "answer"]
            .map(String::from)
            .to_vec(),
        rows: catalog
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let slots = t
                    .slots
                    .iter()
                    .map(|(category, n)| format!("{}:{n}", category.token()))
                    .collect::<Vec<_>>()
                    .join(",");
                vec![
                    i.to_string(),
                    slots,
                    t.question.render(),
                    t.query.render(),
                    t.answer.render(),
                ]
            })
            .collect(),
    }
}

/// Format a report in the specified output format.
#[must_use]
pub fn format_report(report: &Report, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_json(report),
        OutputFormat::Table => format_table(report),
        OutputFormat::Markdown => format_markdown(report),
    }
}

fn format_json(report: &Report) -> String {
    let rows = report
        .rows
        .iter()
        .map(|row| {
            report
                .columns
                .iter()
                .cloned()
                .zip(row.iter().cloned().map(serde_json::Value::String))
                .collect()
        })
        .collect();
    let doc = JsonReport {
        rows,
        total: report.rows.len(),
    };
    serde_json::to_string_pretty(&doc).unwrap_or_else(|_| "[]".to_string())
}

fn format_table(report: &Report) -> String {
    if report.rows.is_empty() {
        return "(no results)".to_string();
    }

    // Widths in characters, not bytes
    let mut widths: Vec<usize> = report.columns.iter().map(|c| c.chars().count()).collect();
    for row in &report.rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut output = String::new();

    let header: Vec<String> = report
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| pad(c, widths[i]))
        .collect();
    output.push_str(&header.join(" | "));
    output.push('\n');

    let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    output.push_str(&sep.join("-+-"));
    output.push('\n');

    for row in &report.rows {
        let vals: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, w)| pad(row.get(i).map_or("", String::as_str), *w))
            .collect();
        output.push_str(vals.join(" | ").trim_end());
        output.push('\n');
    }

    output
}

fn format_markdown(report: &Report) -> String {
    if report.rows.is_empty() {
        return "*No results*\n".to_string();
    }

    let mut output = String::new();

    output.push_str("| ");
    output.push_str(&report.columns.join(" | "));
    output.push_str(" |\n");

    output.push_str("| ");
    let seps: Vec<&str> = report.columns.iter().map(|_| "---").collect();
    output.push_str(&seps.join(" | "));
    output.push_str(" |\n");

    for row in &report.rows {
        output.push_str("| ");
        let vals: Vec<String> = row.iter().map(|cell| cell.replace('|', "\\|")).collect();
        output.push_str(&vals.join(" | "));
        output.push_str(" |\n");
    }

    output
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{text}{}", " ".repeat(width.saturating_sub(len)))
}
