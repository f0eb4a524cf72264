//! File storage for attachments and invoice scans.

use std::path::{Path, PathBuf};

use thiserror::Error;
use url::Url;

/// Storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid storage path: {0}")]
    InvalidPath(String),

    #[error("upload failed: {0}")]
    Upload(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Upload target for binary content. Returns a URL the content can be
/// retrieved from.
pub trait FileStore: Send {
    fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> StorageResult<String>;
}

/// Stores files under a root directory and hands out `file://` URLs.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn resolve(&self, path: &str) -> StorageResult<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative.components().any(|c| {
            !matches!(c, std::path::Component::Normal(_))
        });
        if path.is_empty() || escapes {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl FileStore for LocalFileStore {
    fn upload(&self, path: &str, bytes: &[u8], _content_type: &str) -> StorageResult<String> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, bytes)?;

        let absolute = target.canonicalize()?;
        Url::from_file_path(&absolute)
            .map(String::from)
            .map_err(|_| StorageError::InvalidPath(absolute.display().to_string()))
    }
}

/// Keep letters, digits, dot, dash and underscore; everything else becomes `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches('.');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Storage path for a patient attachment.
pub fn patient_attachment_path(patient_id: &str, file_name: &str) -> String {
    format!(
        "patients/{}/attachments/{}_{}",
        sanitize_file_name(patient_id),
        uuid::Uuid::new_v4(),
        sanitize_file_name(file_name)
    )
}

/// Storage path for a supplier invoice scan.
pub fn invoice_scan_path(supplier_id: &str, invoice_id: &str, file_name: &str) -> String {
    format!(
        "suppliers/{}/invoices/{}/{}_{}",
        sanitize_file_name(supplier_id),
        sanitize_file_name(invoice_id),
        uuid::Uuid::new_v4(),
        sanitize_file_name(file_name)
    )
}
