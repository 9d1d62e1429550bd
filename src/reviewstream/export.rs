//! Batch artifact export
//!
//! Renders batch reports as CSV and JSON artifacts and persists them
//! through a [`StorageGateway`]. Export failures are surfaced as warnings
//! after the retry budget; the numeric results have already been delivered
//! to the sink, so a lost artifact never fails the run.

use crate::reviewstream::datasource::storage::put_with_retry;
use crate::reviewstream::datasource::traits::StorageGateway;
use crate::reviewstream::error::StorageUnavailable;
use crate::reviewstream::model::BatchReport;
use log::{info, warn};

/// Header row for the metrics CSV artifact.
pub const METRICS_CSV_HEADER: &str =
    "mode,task,percent,records,time_sec,throughput_rps,latency_spr";

/// Render reports as a metrics CSV document.
pub fn reports_to_csv(reports: &[BatchReport]) -> String {
    let mut out = String::from(METRICS_CSV_HEADER);
    out.push('\n');
    for report in reports {
        out.push_str(&format!(
            "{},{},{},{},{:.4},{:.2},{:.6}\n",
            report.mode,
            report.task,
            report.load_fraction,
            report.record_count,
            report.elapsed_secs,
            report.throughput_rps,
            report.latency_per_record
        ));
    }
    out
}

/// Persist the CSV and JSON artifacts for a batch run.
///
/// Each artifact is retried independently; a failure skips that artifact
/// with a warning and the run continues.
pub async fn export_reports(
    gateway: &dyn StorageGateway,
    key_prefix: &str,
    reports: &[BatchReport],
) {
    let csv_key = format!("{}/metrics.csv", key_prefix);
    match put_with_retry(gateway, &csv_key, reports_to_csv(reports).as_bytes()).await {
        Ok(()) => info!("Exported {}", csv_key),
        Err(e) => warn_skipped(&e),
    }

    let json_key = format!("{}/reports.json", key_prefix);
    match serde_json::to_vec_pretty(reports) {
        Ok(bytes) => match put_with_retry(gateway, &json_key, &bytes).await {
            Ok(()) => info!("Exported {}", json_key),
            Err(e) => warn_skipped(&e),
        },
        Err(e) => warn!("Failed to encode reports as JSON: {}", e),
    }
}

fn warn_skipped(err: &StorageUnavailable) {
    warn!("{} - artifact skipped, run continues", err);
}
