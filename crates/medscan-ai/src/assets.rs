//! One-time download of model weights and labels.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::InferenceError;

/// ONNX model zoo MobileNet V2 (opset 12, NCHW, ImageNet normalization).
pub const DEFAULT_MODEL_URL: &str = "https://github.com/onnx/models/raw/main/validated/vision/classification/mobilenet/model/mobilenetv2-12.onnx";
/// ImageNet synset labels matching the model zoo classifiers.
pub const DEFAULT_LABELS_URL: &str =
    "https://raw.githubusercontent.com/onnx/models/main/validated/vision/classification/synset.txt";

/// Where each asset lives locally and where to fetch it from when missing.
#[derive(Debug, Clone)]
pub struct AssetSource {
    pub model_path: PathBuf,
    pub model_url: Option<String>,
    pub labels_path: PathBuf,
    pub labels_url: Option<String>,
}

/// Make sure both assets exist locally, downloading any that are missing.
pub async fn ensure_assets(source: &AssetSource) -> Result<(), InferenceError> {
    ensure_file(&source.model_path, source.model_url.as_deref()).await?;
    ensure_file(&source.labels_path, source.labels_url.as_deref()).await?;
    Ok(())
}

async fn ensure_file(path: &Path, url: Option<&str>) -> Result<(), InferenceError> {
    if tokio::fs::try_exists(path).await? {
        return Ok(());
    }
    let Some(url) = url else {
        return Err(InferenceError::Load(format!(
            "{} is missing and no download URL is configured",
            path.display()
        )));
    };
    download(url, path).await
}

/// Download `url` to `dest` through a `.part` file so an interrupted
/// transfer never leaves a truncated asset behind.
async fn download(url: &str, dest: &Path) -> Result<(), InferenceError> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    info!(url, dest = %dest.display(), "downloading model asset");
    let resp = reqwest::get(url).await?.error_for_status()?;
    let bytes = resp.bytes().await?;

    let part = part_path(dest);
    tokio::fs::write(&part, &bytes).await?;
    tokio::fs::rename(&part, dest).await?;
    info!(bytes = bytes.len(), dest = %dest.display(), "model asset saved");
    Ok(())
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn existing_files_need_no_url() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("model.onnx");
        let labels = dir.path().join("labels.txt");
        std::fs::write(&model, b"onnx").unwrap();
        std::fs::write(&labels, b"tench\n").unwrap();

        let source = AssetSource {
            model_path: model,
            model_url: None,
            labels_path: labels,
            labels_url: None,
        };
        ensure_assets(&source).await.unwrap();
    }

    #[tokio::test]
    async fn missing_file_without_url_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = AssetSource {
            model_path: dir.path().join("model.onnx"),
            model_url: None,
            labels_path: dir.path().join("labels.txt"),
            labels_url: None,
        };
        let err = ensure_assets(&source).await.unwrap_err();
        match err {
            InferenceError::Load(msg) => assert!(msg.contains("model.onnx")),
            other => panic!("expected Load, got {other:?}"),
        }
    }

    #[test]
    fn part_path_appends_suffix() {
        assert_eq!(
            part_path(Path::new("/m/model.onnx")),
            PathBuf::from("/m/model.onnx.part")
        );
    }
}
