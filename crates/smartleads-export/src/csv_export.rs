use smartleads_core::{CompanyRecord, CsvQuoting};

use crate::error::ExportError;

/// Column order for CSV exports.
pub const CSV_HEADERS: [&str; 6] = ["Name", "Email", "Phone", "Website", "Category", "Address"];

fn row(record: &CompanyRecord) -> [&str; 6] {
    [
        record.name.as_str(),
        record.email.as_deref().unwrap_or(""),
        record.phone.as_deref().unwrap_or(""),
        record.website.as_deref().unwrap_or(""),
        record.category.as_str(),
        record.address.as_str(),
    ]
}

/// Legacy CSV: header line, `\n`, then data rows joined by `\n`.
///
/// Fields are joined with bare commas and never quoted, so a value containing
/// a comma or newline shifts columns. Existing consumers depend on this exact
/// byte layout; use [`CsvQuoting::Rfc4180`] through [`to_csv_with`] for
/// properly quoted output.
#[must_use]
pub fn to_csv(records: &[CompanyRecord]) -> String {
    let rows: Vec<String> = records.iter().map(|r| row(r).join(",")).collect();
    format!("{}\n{}", CSV_HEADERS.join(","), rows.join("\n"))
}

/// CSV in the requested quoting mode.
///
/// # Errors
///
/// Returns [`ExportError::Csv`] if the RFC 4180 writer fails. Legacy output
/// cannot fail.
pub fn to_csv_with(records: &[CompanyRecord], quoting: CsvQuoting) -> Result<String, ExportError> {
    match quoting {
        CsvQuoting::Legacy => Ok(to_csv(records)),
        CsvQuoting::Rfc4180 => to_rfc4180(records),
    }
}

fn to_rfc4180(records: &[CompanyRecord]) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADERS)?;
    for record in records {
        writer.write_record(row(record))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.into_error().into()))?;
    Ok(String::from_utf8(bytes)?)
}
