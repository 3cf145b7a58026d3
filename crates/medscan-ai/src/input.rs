//! Validate and decode an uploaded image file.

use std::path::Path;

use image::{DynamicImage, ImageFormat, ImageReader};
use medscan_core::UploadPolicy;
use tracing::debug;

use crate::error::InputError;

/// Check `path` against `policy`, then decode it into a bitmap.
///
/// Type and size checks happen before any bytes are decoded.
pub fn open_image(path: &Path, policy: &UploadPolicy) -> Result<DynamicImage, InputError> {
    let read_err = |source| InputError::Read {
        path: path.to_path_buf(),
        source,
    };
    let size = std::fs::metadata(path).map_err(read_err)?.len();
    let media_type = policy.validate_path(path, size)?;
    if !ImageFormat::from_mime_type(media_type).is_some_and(|f| f.reading_enabled()) {
        debug!(media_type, "no decoder for accepted upload");
        return Err(InputError::NoDecoder(media_type));
    }

    let image = ImageReader::open(path)
        .map_err(read_err)?
        .with_guessed_format()
        .map_err(read_err)?
        .decode()?;
    debug!(
        path = %path.display(),
        media_type,
        width = image.width(),
        height = image.height(),
        "image decoded"
    );
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use medscan_core::UploadError;

    #[test]
    fn decodes_valid_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lesion.png");
        RgbImage::from_pixel(8, 6, Rgb([200, 120, 90]))
            .save(&path)
            .unwrap();

        let img = open_image(&path, &UploadPolicy::any_image()).unwrap();
        assert_eq!((img.width(), img.height()), (8, 6));
    }

    #[test]
    fn rejects_non_image_before_decoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "not an image").unwrap();

        let err = open_image(&path, &UploadPolicy::any_image()).unwrap_err();
        assert!(matches!(
            err,
            InputError::Rejected(UploadError::NotAnImage(_))
        ));
    }

    #[test]
    fn rejects_oversized_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.png");
        std::fs::write(&path, vec![0u8; 64]).unwrap();

        let policy = UploadPolicy {
            max_bytes: 32,
            ..UploadPolicy::any_image()
        };
        let err = open_image(&path, &policy).unwrap_err();
        assert!(matches!(
            err,
            InputError::Rejected(UploadError::TooLarge { size: 64, limit: 32 })
        ));
    }

    #[test]
    fn dicom_passes_policy_but_has_no_decoder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chest.dcm");
        std::fs::write(&path, vec![0u8; 256]).unwrap();

        let err = open_image(&path, &UploadPolicy::scan_formats()).unwrap_err();
        assert!(matches!(err, InputError::NoDecoder("image/dicom")));
        assert!(err.to_string().contains("convert to JPEG or PNG"));
    }

    #[test]
    fn corrupt_image_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"\x89PNG\r\n\x1a\ngarbage").unwrap();

        let err = open_image(&path, &UploadPolicy::any_image()).unwrap_err();
        assert!(matches!(err, InputError::Decode(_)));
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = open_image(Path::new("/nonexistent/scan.png"), &UploadPolicy::any_image())
            .unwrap_err();
        assert!(matches!(err, InputError::Read { .. }));
    }
}
