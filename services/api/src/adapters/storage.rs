//! services/api/src/adapters/storage.rs
//!
//! Local-disk implementation of the `StorageService` port. Uploaded
//! onboarding documents are stored under `<root>/<user_id>/<file_name>` and
//! referenced by that relative path.

use async_trait::async_trait;
use meridian_core::ports::{PortError, PortResult, StorageService};
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Clone)]
pub struct LocalStorageAdapter {
    root: PathBuf,
}

impl LocalStorageAdapter {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Reduces a client-supplied name to its final path component so an
    /// upload can never escape the user's directory.
    fn sanitize(file_name: &str) -> PortResult<&str> {
        let name = Path::new(file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("");
        if name.is_empty() || name == "." || name == ".." {
            return Err(PortError::Unexpected(format!(
                "Invalid file name '{}'",
                file_name
            )));
        }
        Ok(name)
    }
}

#[async_trait]
impl StorageService for LocalStorageAdapter {
    async fn upload(&self, user_id: Uuid, file_name: &str, data: &[u8]) -> PortResult<String> {
        let name = Self::sanitize(file_name)?;
        let dir = self.root.join(user_id.to_string());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        tokio::fs::write(dir.join(name), data)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(format!("{}/{}", user_id, name))
    }
}
