use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::{
    errors::{AppError, AppResult},
    models::domain::SourceFile,
};

const TEXT_EXTENSIONS: [&str; 3] = ["txt", "md", "markdown"];

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, file: &SourceFile) -> AppResult<String>;
}

/// Reads plain-text uploads from the local upload directory.
pub struct FsTextExtractor {
    upload_root: PathBuf,
}

impl FsTextExtractor {
    pub fn new(upload_root: impl Into<PathBuf>) -> Self {
        Self {
            upload_root: upload_root.into(),
        }
    }

    fn resolve(&self, file: &SourceFile) -> AppResult<PathBuf> {
        let relative = Path::new(&file.filepath);
        if relative
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(AppError::ValidationError(format!(
                "Invalid path for file {}",
                file.id
            )));
        }

        if relative.is_absolute() {
            Ok(relative.to_path_buf())
        } else {
            Ok(self.upload_root.join(relative))
        }
    }
}

#[async_trait]
impl TextExtractor for FsTextExtractor {
    async fn extract_text(&self, file: &SourceFile) -> AppResult<String> {
        let extension = file.extension().unwrap_or_default();
        if !TEXT_EXTENSIONS.contains(&extension.as_str()) {
            return Err(AppError::ValidationError(format!(
                "Unsupported file type '{}' for file {}",
                extension, file.filename
            )));
        }

        let path = self.resolve(file)?;
        tokio::fs::read_to_string(&path).await.map_err(|e| {
            log::error!("Failed to read {}: {}", path.display(), e);
            AppError::InternalError(format!("Failed to read file {}", file.id))
        })
    }
}
