//! Payment document storage
//!
//! One directory per reference month under the uploads root; filenames are
//! deterministic per (kind, physiotherapist, month) so re-uploads overwrite
//! instead of accumulating. Writes go to a temp file in the destination
//! directory and are renamed into place, and same-destination writes
//! serialize on a per-path lock so a re-upload can never race a reader
//! into a half-written file.

use fisiopay_domain::{DocumentKind, ReferenceMonth, UploadedDocument};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::info;

/// Storage error - fatal to the upload request, since without a stored
/// file there is nothing to reconcile
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem failure
    #[error("Failed to write uploaded file: {0}")]
    Io(#[from] std::io::Error),

    /// The atomic rename into place failed
    #[error("Failed to persist uploaded file: {0}")]
    Persist(String),
}

/// File store for uploaded payment documents
pub struct PaymentStore {
    root: PathBuf,
    locks: Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>,
}

impl PaymentStore {
    /// Create a store rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The uploads root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deterministic filename for a (kind, physiotherapist, month) triple
    pub fn file_name(
        kind: DocumentKind,
        physiotherapist_name: &str,
        month: &ReferenceMonth,
        original_name: &str,
    ) -> String {
        format!(
            "{}_{}_{}.{}",
            kind.file_prefix(),
            sanitize_name(physiotherapist_name),
            month.as_str(),
            extension_of(original_name),
        )
    }

    /// Store an uploaded document, overwriting any previous upload for the
    /// same (month, kind, physiotherapist)
    pub async fn store_document(
        &self,
        month: &ReferenceMonth,
        kind: DocumentKind,
        physiotherapist_id: u32,
        physiotherapist_name: &str,
        original_name: &str,
        data: Vec<u8>,
    ) -> Result<UploadedDocument, StorageError> {
        let month_dir = self.root.join(month.as_str());
        let file_name = Self::file_name(kind, physiotherapist_name, month, original_name);
        let stored_path = month_dir.join(&file_name);

        // Serialize writers to this destination; other destinations
        // proceed in parallel
        let lock = self.lock_for(&stored_path);
        let _guard = lock.lock().await;

        let dest = stored_path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), StorageError> {
            std::fs::create_dir_all(&month_dir)?;

            let mut tmp = NamedTempFile::new_in(&month_dir)?;
            tmp.write_all(&data)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&dest)
                .map_err(|e| StorageError::Persist(e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| StorageError::Persist(format!("write task failed: {}", e)))??;

        info!(path = %stored_path.display(), "payment document stored");

        Ok(UploadedDocument {
            physiotherapist_id,
            kind,
            original_name: original_name.to_string(),
            file_name,
            stored_path,
            reference_month: month.clone(),
        })
    }

    fn lock_for(&self, path: &Path) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        Arc::clone(locks.entry(path.to_path_buf()).or_default())
    }
}

/// Replace every non-alphanumeric character with `_`
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// File extension of the uploaded name, defaulting to `pdf`
fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(str::to_lowercase)
        .unwrap_or_else(|| "pdf".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn month() -> ReferenceMonth {
        ReferenceMonth::parse("2025-03").unwrap()
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Ana Souza"), "Ana_Souza");
        assert_eq!(sanitize_name("José d'Ávila"), "Jos__d__vila");
        assert_eq!(sanitize_name("abc123"), "abc123");
    }

    #[test]
    fn test_deterministic_file_name() {
        let name = PaymentStore::file_name(DocumentKind::Rpa, "Ana Souza", &month(), "recibo.PDF");
        assert_eq!(name, "RPA_Ana_Souza_2025-03.pdf");

        let no_ext = PaymentStore::file_name(DocumentKind::Invoice, "Ana", &month(), "nota");
        assert_eq!(no_ext, "NF_Ana_2025-03.pdf");
    }

    #[tokio::test]
    async fn test_store_creates_month_directory() {
        let dir = TempDir::new().unwrap();
        let store = PaymentStore::new(dir.path());

        let doc = store
            .store_document(&month(), DocumentKind::Rpa, 1, "Ana Souza", "recibo.pdf", b"pdf-bytes".to_vec())
            .await
            .unwrap();

        assert_eq!(doc.stored_path, dir.path().join("2025-03").join("RPA_Ana_Souza_2025-03.pdf"));
        assert_eq!(std::fs::read(&doc.stored_path).unwrap(), b"pdf-bytes");
    }

    #[tokio::test]
    async fn test_reupload_overwrites_same_path() {
        let dir = TempDir::new().unwrap();
        let store = PaymentStore::new(dir.path());

        let first = store
            .store_document(&month(), DocumentKind::Rpa, 1, "Ana", "a.pdf", b"v1".to_vec())
            .await
            .unwrap();
        let second = store
            .store_document(&month(), DocumentKind::Rpa, 1, "Ana", "b.pdf", b"v2".to_vec())
            .await
            .unwrap();

        assert_eq!(first.stored_path, second.stored_path);
        assert_eq!(std::fs::read(&second.stored_path).unwrap(), b"v2");

        // No extra files accumulate in the month directory
        let entries = std::fs::read_dir(dir.path().join("2025-03")).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn test_distinct_kinds_get_distinct_paths() {
        let dir = TempDir::new().unwrap();
        let store = PaymentStore::new(dir.path());

        let rpa = store
            .store_document(&month(), DocumentKind::Rpa, 1, "Ana", "a.pdf", b"r".to_vec())
            .await
            .unwrap();
        let nf = store
            .store_document(&month(), DocumentKind::Invoice, 1, "Ana", "a.pdf", b"n".to_vec())
            .await
            .unwrap();

        assert_ne!(rpa.stored_path, nf.stored_path);
    }
}
