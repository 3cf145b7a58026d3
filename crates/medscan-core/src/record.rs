//! Wire types for the remote diagnosis history service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::severity::SeverityTier;

/// Severity as stored by the history service. Wider than [`SeverityTier`]:
/// records may carry `low` or `critical`, and unknown values are tolerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSeverity {
    Low,
    Normal,
    Moderate,
    High,
    Critical,
    #[serde(other)]
    Unknown,
}

impl RecordSeverity {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low Risk",
            Self::Normal => "Normal",
            Self::Moderate => "Moderate",
            Self::High => "High Risk",
            Self::Critical => "Critical",
            Self::Unknown => "Unknown",
        }
    }
}

impl From<SeverityTier> for RecordSeverity {
    fn from(tier: SeverityTier) -> Self {
        match tier {
            SeverityTier::Normal => Self::Normal,
            SeverityTier::Moderate => Self::Moderate,
            SeverityTier::High => Self::High,
        }
    }
}

/// One stored diagnosis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub scan_type: String,
    pub disease: String,
    pub confidence: f64,
    pub severity: RecordSeverity,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl DiagnosisRecord {
    /// File name the report for this record is saved under.
    pub fn report_file_name(&self) -> String {
        report_file_name(&self.id)
    }
}

pub fn report_file_name(id: &str) -> String {
    format!("diagnosis-report-{id}.pdf")
}

/// Body of `GET /api/history`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub predictions: Vec<DiagnosisRecord>,
}

/// Body of `POST /api/predict`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictResponse {
    pub success: bool,
    pub prediction: Option<DiagnosisRecord>,
    pub error: Option<String>,
}

/// Body of `GET /api/stats/patient`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientStats {
    pub total_scans: u64,
    pub last_diagnosis: Option<String>,
    pub health_score: f64,
    pub next_checkup: Option<String>,
}

/// Client-side filtering of history records.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    /// Exact scan type id; `None` matches all.
    pub scan_type: Option<String>,
    /// Case-insensitive substring over disease and scan type.
    pub query: String,
}

impl RecordFilter {
    pub fn matches(&self, record: &DiagnosisRecord) -> bool {
        if let Some(t) = &self.scan_type
            && !record.scan_type.eq_ignore_ascii_case(t)
        {
            return false;
        }
        let q = self.query.trim().to_lowercase();
        q.is_empty()
            || record.disease.to_lowercase().contains(&q)
            || record.scan_type.to_lowercase().contains(&q)
    }

    pub fn apply<'a>(&self, records: &'a [DiagnosisRecord]) -> Vec<&'a DiagnosisRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}
