use std::io;

use chrono::NaiveDate;

use crate::models::ReportRow;

/// Writes the full matrix as CSV: identity columns, one column per anchor
/// (`H`, `B` or empty), then the per-student tallies.
pub fn write_csv<W: io::Write>(
    writer: W,
    anchors: &[NaiveDate],
    rows: &[ReportRow],
) -> anyhow::Result<()> {
    let mut out = csv::Writer::from_writer(writer);

    let mut header: Vec<String> = ["student_id", "student_name", "student_address", "student_status"]
        .iter()
        .map(|column| column.to_string())
        .collect();
    header.extend(anchors.iter().map(|anchor| anchor.to_string()));
    header.extend(["present", "bonus", "absent"].iter().map(|c| c.to_string()));
    out.write_record(&header)?;

    for row in rows {
        let mut record = vec![
            row.student_id.to_string(),
            row.student_name.clone(),
            row.student_address.clone(),
            row.student_status.as_str().to_string(),
        ];
        for anchor in anchors {
            let code = row
                .statuses
                .get(&anchor.to_string())
                .and_then(|status| status.code())
                .unwrap_or("");
            record.push(code.to_string());
        }
        let tally = row.tally();
        record.push(tally.present.to_string());
        record.push(tally.bonus.to_string());
        record.push(tally.absent.to_string());
        out.write_record(&record)?;
    }

    out.flush()?;
    Ok(())
}
