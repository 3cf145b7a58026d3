//! Scan pipeline: validate and decode the upload, classify, present.

use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use medscan_ai::{ClassificationRequest, ClassifierClient, open_image};
use medscan_core::{ClassificationResult, ModelInfo, Presenter, ScanType, UploadPolicy};
use serde::Serialize;

/// One rendered scan, as shown on screen or printed with `--json`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    #[serde(flatten)]
    pub result: ClassificationResult,
    pub scan_type: Option<ScanType>,
    pub file_name: String,
    pub size_bytes: u64,
    pub inference_time_ms: u64,
    pub model_info: Option<ModelInfo>,
}

/// Run the full scan: upload checks -> decode -> classify -> present.
///
/// Upload problems are reported as-is; classifier failures get the generic
/// retry message with the cause attached.
pub async fn run_scan(
    client: &ClassifierClient,
    presenter: &Presenter,
    policy: &UploadPolicy,
    path: &Path,
    scan_type: Option<ScanType>,
) -> anyhow::Result<ScanReport> {
    let image = open_image(path, policy)?;
    let size_bytes = std::fs::metadata(path)
        .with_context(|| format!("reading {}", path.display()))?
        .len();

    let mut request = ClassificationRequest::new(image);
    if let Some(t) = scan_type {
        request = request.with_scan_type(t);
    }

    client
        .initialize()
        .await
        .context("Analysis failed. Please try again.")?;

    // Model is loaded; only the forward pass and ranking are timed.
    let start = Instant::now();
    let predictions = client
        .classify(request)
        .await
        .context("Analysis failed. Please try again.")?;
    let inference_time_ms = start.elapsed().as_millis() as u64;

    Ok(ScanReport {
        result: presenter.present(predictions),
        scan_type,
        file_name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        size_bytes,
        inference_time_ms,
        model_info: client.model_info().cloned(),
    })
}
