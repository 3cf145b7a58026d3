pub mod prediction;
pub mod presenter;
pub mod record;
pub mod scan;
pub mod severity;
pub mod upload;
pub mod vitals;

pub use prediction::{
    LabelPrediction, ModelInfo, PipelineStep, PredictionError, TOP_K, TopPredictions,
};
pub use presenter::{ClassificationResult, Presenter, present};
pub use record::{DiagnosisRecord, PatientStats, RecordFilter, RecordSeverity};
pub use scan::ScanType;
pub use severity::{SeverityThresholds, SeverityTier};
pub use upload::{UploadError, UploadPolicy};
pub use vitals::{Trend, VitalKind, VitalLog, VitalReading, VitalStatus};
