use std::fmt::Write;

use serde::Serialize;

use crate::models::{ReportPage, ReportRow, Status};

#[derive(Debug, Serialize)]
pub struct RecapResponse<'a> {
    pub data: &'a [ReportRow],
    pub pagination: PaginationMeta,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_rows: usize,
    pub per_page: u32,
}

impl<'a> From<&'a ReportPage> for RecapResponse<'a> {
    fn from(page: &'a ReportPage) -> Self {
        RecapResponse {
            data: &page.rows,
            pagination: PaginationMeta {
                current_page: page.current_page,
                total_pages: page.total_pages,
                total_rows: page.total_rows,
                per_page: page.per_page,
            },
        }
    }
}

pub fn render_json(page: &ReportPage) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&RecapResponse::from(page))
}

fn cell(status: Status) -> &'static str {
    status.code().unwrap_or("-")
}

/// Keeps free text from splitting a markdown table cell.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

pub fn render_markdown(label: &str, page: &ReportPage) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Weekly Attendance Recap");
    let _ = writeln!(
        output,
        "Period {} (page {} of {}, {} students)",
        label, page.current_page, page.total_pages, page.total_rows
    );
    let _ = writeln!(output);

    let Some(first) = page.rows.first() else {
        let _ = writeln!(output, "No students on this page.");
        return output;
    };

    let mut header = String::from("| Student | Status |");
    let mut divider = String::from("| --- | --- |");
    for date in first.statuses.keys() {
        let _ = write!(header, " {date} |");
        divider.push_str(" :-: |");
    }
    header.push_str(" H | B | Absent |");
    divider.push_str(" --: | --: | --: |");
    let _ = writeln!(output, "{header}");
    let _ = writeln!(output, "{divider}");

    for row in &page.rows {
        let mut line = format!(
            "| {} | {} |",
            escape_cell(&row.student_name),
            row.student_status.as_str()
        );
        for status in row.statuses.values() {
            let _ = write!(line, " {} |", cell(*status));
        }
        let tally = row.tally();
        let _ = write!(line, " {} | {} | {} |", tally.present, tally.bonus, tally.absent);
        let _ = writeln!(output, "{line}");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Legend: H = present, B = bonus, - = absent");

    output
}
