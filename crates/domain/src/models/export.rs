//! CSV export of guest rows.

use chrono::NaiveDate;

use super::guest::GuestRow;
use super::response::SubEvent;

const HEADER: &str = "Code,Name,Status,Friday evening,Saturday lunch,Saturday wedding,Sunday brunch,Comment,Last modified";

/// Renders rows (already filtered and sorted) as a spreadsheet-friendly CSV document.
pub fn render_guest_csv(rows: &[GuestRow]) -> String {
    let mut csv = String::new();

    // Add UTF-8 BOM for Excel compatibility
    csv.push('\u{FEFF}');

    csv.push_str(HEADER);
    csv.push('\n');

    for row in rows {
        let events: Vec<&str> = SubEvent::ALL
            .iter()
            .map(|e| yes_no(row.attendance.attends(*e)))
            .collect();
        csv.push_str(&format!(
            "{},{},{},{},{},{}\n",
            escape_csv(&row.code),
            escape_csv(&row.name),
            row.status,
            events.join(","),
            escape_csv(&flatten_comment(&row.comment)),
            row.modified_at
                .map(|ts| ts.format("%d/%m/%Y").to_string())
                .unwrap_or_default(),
        ));
    }

    csv
}

/// Download name for an export taken on `date`.
pub fn export_filename(date: NaiveDate) -> String {
    format!("confirmations_{}.csv", date.format("%Y-%m-%d"))
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

/// Comments never carry separators or line breaks into the file.
fn flatten_comment(comment: &str) -> String {
    comment
        .replace(',', ";")
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
}

/// Escape a CSV value.
fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
