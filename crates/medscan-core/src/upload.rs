//! Upload acceptance rules applied before an image reaches the classifier.

use std::path::Path;

use thiserror::Error;
use tracing::debug;

/// 10 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("Please upload an image file (got {0})")]
    NotAnImage(String),

    #[error("Only JPEG, PNG, and DICOM files are allowed (got {0})")]
    UnsupportedFormat(String),

    #[error("File size must be less than {limit_mb}MB (got {size} bytes)", limit_mb = .limit / (1024 * 1024))]
    TooLarge { size: u64, limit: u64 },

    #[error("could not determine the type of {0}")]
    UnknownType(String),
}

/// Which media types an upload surface accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptedTypes {
    /// Any `image/*` media type.
    AnyImage,
    /// An explicit allow-list.
    Only(&'static [&'static str]),
}

const SCAN_FORMATS: &[&str] = &["image/jpeg", "image/png", "image/dicom"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_bytes: u64,
    pub accepted: AcceptedTypes,
}

impl UploadPolicy {
    /// Scan page rules: any image type up to 10 MiB.
    pub fn any_image() -> Self {
        Self {
            max_bytes: MAX_UPLOAD_BYTES,
            accepted: AcceptedTypes::AnyImage,
        }
    }

    /// Patient upload rules: JPEG, PNG, or DICOM up to 10 MiB.
    pub fn scan_formats() -> Self {
        Self {
            max_bytes: MAX_UPLOAD_BYTES,
            accepted: AcceptedTypes::Only(SCAN_FORMATS),
        }
    }

    /// Check a file's media type and size against this policy.
    pub fn validate(&self, media_type: &str, size: u64) -> Result<(), UploadError> {
        let media_type = media_type.trim().to_ascii_lowercase();
        let type_ok = match &self.accepted {
            AcceptedTypes::AnyImage => media_type.starts_with("image/"),
            AcceptedTypes::Only(list) => list.contains(&media_type.as_str()),
        };
        if !type_ok {
            debug!(media_type = %media_type, "upload rejected: type");
            return Err(match self.accepted {
                AcceptedTypes::AnyImage => UploadError::NotAnImage(media_type),
                AcceptedTypes::Only(_) => UploadError::UnsupportedFormat(media_type),
            });
        }
        if size > self.max_bytes {
            debug!(size, limit = self.max_bytes, "upload rejected: size");
            return Err(UploadError::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }

    /// Validate a file on disk, guessing its media type from the extension.
    pub fn validate_path(&self, path: &Path, size: u64) -> Result<&'static str, UploadError> {
        let media_type = media_type_for(path)
            .ok_or_else(|| UploadError::UnknownType(path.display().to_string()))?;
        self.validate(media_type, size)?;
        Ok(media_type)
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::any_image()
    }
}

/// Guess a media type from a file extension.
pub fn media_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let media_type = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "dcm" | "dicom" => "image/dicom",
        "bmp" => "image/bmp",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        _ => return None,
    };
    Some(media_type)
}
