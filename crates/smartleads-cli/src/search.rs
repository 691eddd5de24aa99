//! `search` command: submit a job, print progress until it ends, and
//! optionally export the results.

use std::path::Path;

use anyhow::Context;
use smartleads_client::LeadsApiClient;
use smartleads_core::{AppConfig, Category, Coordinates, SearchRequest};
use smartleads_export::ExportFormat;
use smartleads_search::{progress_label, CoordinatorConfig, JobStatus, SearchCoordinator};
use tokio::sync::watch;

/// Builds the request from CLI flags. Validation is left to the coordinator so
/// the user sees the same messages as any other caller.
pub(crate) fn build_request(
    category: Category,
    location: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    radius_km: u32,
) -> SearchRequest {
    SearchRequest {
        category,
        location,
        coordinates: lat
            .zip(lng)
            .map(|(latitude, longitude)| Coordinates {
                latitude,
                longitude,
            }),
        radius_km,
    }
}

/// Runs one search to completion. Ctrl-C stops polling and exits cleanly.
///
/// # Errors
///
/// Returns an error if the request is invalid, the backend rejects it, the
/// job fails, or the export cannot be written.
pub(crate) async fn run_search(
    client: LeadsApiClient,
    config: &AppConfig,
    request: SearchRequest,
    export: Option<ExportFormat>,
    out: &Path,
) -> anyhow::Result<()> {
    let mut coordinator = SearchCoordinator::new(client, CoordinatorConfig::from_app_config(config));
    let place = request
        .city()
        .map(str::to_string)
        .or_else(|| {
            request
                .coordinates
                .map(|c| format!("{:.4}, {:.4}", c.latitude, c.longitude))
        })
        .unwrap_or_default();
    println!(
        "searching {} within {} km of {place}",
        request.category.label(),
        request.radius_km
    );

    let printer = tokio::spawn(print_progress(coordinator.subscribe()));
    let handle = coordinator.submit(request).await?;
    let job_id = handle.job_id().clone();

    let outcome = tokio::select! {
        result = handle.finished() => result,
        _ = tokio::signal::ctrl_c() => {
            coordinator.cancel();
            printer.abort();
            println!("\ncancelled; job {job_id} keeps running on the server");
            return Ok(());
        }
    };
    printer.abort();

    let companies = outcome.with_context(|| format!("search job {job_id}"))?;
    println!(
        "\nfound {} companies ({} validated)",
        companies.len(),
        companies.validated_count()
    );
    crate::companies::print_table(&companies);

    if let Some(format) = export {
        crate::companies::write_export(companies.as_slice(), format, config.csv_quoting, out)
            .await?;
    }

    Ok(())
}

/// Prints a line whenever the progress value changes.
async fn print_progress(mut updates: watch::Receiver<JobStatus>) {
    let mut last = None;
    while updates.changed().await.is_ok() {
        let (progress, job_id) = {
            let status = updates.borrow_and_update();
            (status.progress, status.job_id.clone())
        };
        if job_id.is_none() || last == Some(progress) {
            continue;
        }
        last = Some(progress);
        println!("[{progress:>3}%] {}", progress_label(progress));
    }
}
