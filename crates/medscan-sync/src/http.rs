//! HTTP client for the diagnosis history service.

use medscan_core::record::{HistoryResponse, PredictResponse};
use medscan_core::{DiagnosisRecord, PatientStats};
use reqwest::multipart::{Form, Part};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid report id: {0:?}")]
    InvalidId(String),
}

/// An image sent to the service for analysis and storage.
#[derive(Debug, Clone)]
pub struct PredictionUpload {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
    /// Service-side scan type id, e.g. `chest-xray` or `blood-smear`.
    pub scan_type: String,
    pub symptoms: String,
}

/// Client for `/api/predict`, `/api/history`, `/api/stats/patient`, and `/api/reports/:id`.
pub struct HistoryClient {
    client: reqwest::Client,
    base_url: String,
}

impl HistoryClient {
    /// `base_url` should be like `http://localhost:3000` (no trailing slash).
    pub fn new(base_url: String) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Use a preconfigured `reqwest::Client` (timeouts, proxies, auth headers).
    pub fn with_client(base_url: String, client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Submit an image for server-side analysis; returns the stored record.
    ///
    /// A 2xx reply with `success: false` is reported as [`HistoryError::Server`].
    pub async fn submit_prediction(
        &self,
        upload: PredictionUpload,
    ) -> Result<DiagnosisRecord, HistoryError> {
        let url = format!("{}/api/predict", self.base_url);
        info!(
            url = %url,
            scan_type = %upload.scan_type,
            bytes = upload.bytes.len(),
            "submitting image for analysis"
        );
        let image = Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(&upload.media_type)?;
        let form = Form::new()
            .part("image", image)
            .text("scanType", upload.scan_type)
            .text("symptoms", upload.symptoms);

        let resp = self.client.post(&url).multipart(form).send().await?;
        let status = resp.status().as_u16();
        let body = read_body(resp).await?;
        match serde_json::from_slice::<PredictResponse>(&body)? {
            PredictResponse {
                success: true,
                prediction: Some(record),
                ..
            } => {
                info!(id = %record.id, disease = %record.disease, "prediction stored");
                Ok(record)
            }
            resp => Err(HistoryError::Server {
                status,
                body: resp
                    .error
                    .unwrap_or_else(|| String::from_utf8_lossy(&body).into_owned()),
            }),
        }
    }

    /// All stored diagnoses for the current user.
    pub async fn fetch_history(&self) -> Result<Vec<DiagnosisRecord>, HistoryError> {
        let url = format!("{}/api/history", self.base_url);
        info!(url = %url, "fetching diagnosis history");
        let body = self.get_bytes(&url).await?;
        let history: HistoryResponse = serde_json::from_slice(&body)?;
        info!(count = history.predictions.len(), "fetched diagnosis history");
        Ok(history.predictions)
    }

    pub async fn fetch_patient_stats(&self) -> Result<PatientStats, HistoryError> {
        let url = format!("{}/api/stats/patient", self.base_url);
        info!(url = %url, "fetching patient stats");
        let body = self.get_bytes(&url).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Raw report document for one record.
    pub async fn download_report(&self, id: &str) -> Result<Vec<u8>, HistoryError> {
        validate_id(id)?;
        let url = format!("{}/api/reports/{id}", self.base_url);
        info!(url = %url, "downloading report");
        let body = self.get_bytes(&url).await?;
        info!(bytes = body.len(), "report downloaded");
        Ok(body)
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, HistoryError> {
        let resp = self.client.get(url).send().await?;
        read_body(resp).await
    }
}

/// Body of a 2xx response; anything else becomes [`HistoryError::Server`].
async fn read_body(resp: reqwest::Response) -> Result<Vec<u8>, HistoryError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(HistoryError::Server {
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp.bytes().await?.to_vec())
}

/// Report ids are interpolated into the URL path, so only `[A-Za-z0-9_-]`.
fn validate_id(id: &str) -> Result<(), HistoryError> {
    let ok = !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if ok {
        Ok(())
    } else {
        Err(HistoryError::InvalidId(id.to_string()))
    }
}
