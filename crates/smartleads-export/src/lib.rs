//! Serializes company results into downloadable CSV and PDF documents.
//!
//! Both exporters are pure functions of the record slice: same records in the
//! same order always produce the same bytes.

mod csv_export;
mod error;
mod pdf_export;

use smartleads_core::{CompanyRecord, CsvQuoting};

pub use csv_export::{to_csv, to_csv_with, CSV_HEADERS};
pub use error::ExportError;
pub use pdf_export::{to_pdf, PDF_HEADERS, PDF_TITLE};

pub const CSV_FILENAME: &str = "leads.csv";
pub const PDF_FILENAME: &str = "leads.pdf";

/// Export formats offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Pdf,
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Pdf => write!(f, "pdf"),
        }
    }
}

/// A rendered export ready to be written or downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPayload {
    pub filename: &'static str,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Renders `records` in `format`.
///
/// `quoting` only affects CSV output.
///
/// # Errors
///
/// Returns [`ExportError`] if the CSV writer or the PDF encoder fails.
pub fn export(
    records: &[CompanyRecord],
    format: ExportFormat,
    quoting: CsvQuoting,
) -> Result<ExportPayload, ExportError> {
    match format {
        ExportFormat::Csv => Ok(ExportPayload {
            filename: CSV_FILENAME,
            content_type: "text/csv; charset=utf-8",
            bytes: to_csv_with(records, quoting)?.into_bytes(),
        }),
        ExportFormat::Pdf => Ok(ExportPayload {
            filename: PDF_FILENAME,
            content_type: "application/pdf",
            bytes: to_pdf(records)?,
        }),
    }
}
