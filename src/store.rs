//! Boundaries between the sync pipeline and the remote services.
//!
//! The pipeline only needs three things from the outside world: the photos to
//! export, a listing of the destination folder, and a way to ask the
//! destination to fetch a URL into a path. Errors are `anyhow::Result` because
//! what goes wrong at these boundaries is adapter-specific.

use anyhow::Result;
use async_trait::async_trait;

use crate::photo::Photo;
use crate::plan::RemoteFileSet;

/// Whether `ensure_folder` found the folder or had to create it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderStatus {
    Existing,
    Created,
}

/// Where photos come from
#[async_trait]
pub trait PhotoSource: Send + Sync {
    /// Human-readable name of the account being exported, for logs
    async fn owner_name(&self) -> Result<String>;

    /// All photos to export, in the order the service returns them
    async fn fetch_photos(&self) -> Result<Vec<Photo>>;
}

/// Folder-based storage that can fetch files by URL
#[async_trait]
pub trait DestinationStore: Send + Sync {
    /// Makes sure `folder` exists; "already exists" is success
    async fn ensure_folder(&self, folder: &str) -> Result<FolderStatus>;

    /// Names of the files currently in `folder`
    async fn list_files(&self, folder: &str) -> Result<RemoteFileSet>;

    /// Asks the store to download `source_url` into `path`, overwriting
    async fn upload_from_url(&self, path: &str, source_url: &str) -> Result<()>;
}
