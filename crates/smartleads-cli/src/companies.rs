//! Stored-company commands: `results`, `export`, and `send`.

use std::path::{Path, PathBuf};

use anyhow::Context;
use smartleads_client::{CompanyFilter, LeadsApiClient};
use smartleads_core::{CompanyCollection, CompanyRecord, CsvQuoting};
use smartleads_export::ExportFormat;

const NAME_WIDTH: usize = 32;

/// List stored companies matching `filter`.
///
/// # Errors
///
/// Returns an error if the API request fails.
pub(crate) async fn run_results(
    client: &LeadsApiClient,
    filter: &CompanyFilter,
) -> anyhow::Result<()> {
    let companies = client.list_companies(filter).await?;
    if companies.is_empty() {
        println!("no companies found; run `search` first");
        return Ok(());
    }
    print_table(&companies);
    println!(
        "\n{} companies, {} validated",
        companies.len(),
        companies.validated_count()
    );
    Ok(())
}

/// Export stored companies matching `filter` into `out`.
///
/// # Errors
///
/// Returns an error if the API request fails or the file cannot be written.
pub(crate) async fn run_export(
    client: &LeadsApiClient,
    filter: &CompanyFilter,
    format: ExportFormat,
    quoting: CsvQuoting,
    out: &Path,
) -> anyhow::Result<()> {
    let companies = client.list_companies(filter).await?;
    write_export(companies.as_slice(), format, quoting, out).await?;
    Ok(())
}

/// Trigger a server-side send of `template_id` to one company.
///
/// # Errors
///
/// Returns an error if the API request fails or the server reports the email
/// was not sent.
pub(crate) async fn run_send(
    client: &LeadsApiClient,
    company_id: &str,
    template_id: &str,
) -> anyhow::Result<()> {
    let sent = client.send_email(company_id, template_id).await?;
    anyhow::ensure!(
        sent,
        "server did not send template {template_id} to company {company_id}"
    );
    println!("sent template {template_id} to company {company_id}");
    Ok(())
}

/// Renders `records` and writes the export file into `out`.
///
/// # Errors
///
/// Returns an error if rendering fails or the file cannot be written.
pub(crate) async fn write_export(
    records: &[CompanyRecord],
    format: ExportFormat,
    quoting: CsvQuoting,
    out: &Path,
) -> anyhow::Result<PathBuf> {
    let payload = smartleads_export::export(records, format, quoting)
        .with_context(|| format!("rendering {format} export"))?;
    tokio::fs::create_dir_all(out)
        .await
        .with_context(|| format!("creating {}", out.display()))?;
    let path = out.join(payload.filename);
    tokio::fs::write(&path, &payload.bytes)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        records = records.len(),
        bytes = payload.bytes.len(),
        "export written"
    );
    println!("wrote {} ({} records)", path.display(), records.len());
    Ok(path)
}

pub(crate) fn print_table(companies: &CompanyCollection) {
    let header = format!(
        "{:<w$}  {:<30}  {:<18}  WEBSITE",
        "NAME",
        "EMAIL",
        "PHONE",
        w = NAME_WIDTH
    );
    println!("{header}");
    for record in companies {
        let marker = if record.validated { "*" } else { " " };
        println!(
            "{:<w$}  {:<30}  {:<18}  {}{marker}",
            truncate(&record.name, NAME_WIDTH),
            record.email.as_deref().unwrap_or("-"),
            record.phone.as_deref().unwrap_or("-"),
            record.website.as_deref().unwrap_or("-"),
            w = NAME_WIDTH
        );
    }
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() > max {
        format!("{}...", value.chars().take(max - 3).collect::<String>())
    } else {
        value.to_string()
    }
}
