//! In-memory stand-ins for VK and Yandex.Disk, used by the tests.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

use crate::error::ApiError;
use crate::photo::{Photo, PhotoVariant};
use crate::plan::RemoteFileSet;
use crate::store::{DestinationStore, FolderStatus, PhotoSource};

/// Creates a small profile with one like-count collision and one broken photo
pub fn create_mock_photos() -> Vec<Photo> {
    vec![
        Photo::new(
            12,
            vec![
                PhotoVariant::new(75, 50, "https://vk.test/12_s.jpg", "s"),
                PhotoVariant::new(1280, 853, "https://vk.test/12_z.jpg", "z"),
            ],
        ),
        Photo::new(
            4,
            vec![PhotoVariant::new(604, 403, "https://vk.test/4a_x.jpg", "x")],
        ),
        Photo::new(0, Vec::new()),
        Photo::new(
            4,
            vec![
                PhotoVariant::new(807, 538, "https://vk.test/4b_y.jpg", "y"),
                PhotoVariant::new(130, 87, "https://vk.test/4b_m.jpg", "m"),
            ],
        ),
    ]
}

/// Photo source returning a fixed collection
pub struct MockSource {
    owner: String,
    photos: Vec<Photo>,
}

impl MockSource {
    pub fn new(owner: &str, photos: Vec<Photo>) -> Self {
        Self {
            owner: owner.to_string(),
            photos,
        }
    }
}

#[async_trait]
impl PhotoSource for MockSource {
    async fn owner_name(&self) -> Result<String> {
        Ok(self.owner.clone())
    }

    async fn fetch_photos(&self) -> Result<Vec<Photo>> {
        Ok(self.photos.clone())
    }
}

#[derive(Default)]
struct DiskState {
    folders: HashSet<String>,
    /// Full paths of the files in the store
    files: HashSet<String>,
    /// (path, source url) in the order they were requested
    uploads: Vec<(String, String)>,
}

/// Destination store kept in memory
#[derive(Default)]
pub struct MockDisk {
    state: Mutex<DiskState>,
    failing: HashSet<String>,
}

impl MockDisk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an existing folder containing `names`
    pub fn with_folder(self, folder: &str, names: &[&str]) -> Self {
        {
            let mut state = self.lock();
            state.folders.insert(folder.to_string());
            for name in names {
                state.files.insert(format!("{folder}/{name}"));
            }
        }
        self
    }

    /// Makes uploads to `path` fail
    pub fn failing_on(mut self, path: &str) -> Self {
        self.failing.insert(path.to_string());
        self
    }

    /// Accepted uploads as (path, source url), in request order
    pub fn uploads(&self) -> Vec<(String, String)> {
        self.lock().uploads.clone()
    }

    pub fn has_folder(&self, folder: &str) -> bool {
        self.lock().folders.contains(folder)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DiskState> {
        // A poisoned lock only means another test thread panicked
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl DestinationStore for MockDisk {
    async fn ensure_folder(&self, folder: &str) -> Result<FolderStatus> {
        let mut state = self.lock();
        if state.folders.insert(folder.to_string()) {
            Ok(FolderStatus::Created)
        } else {
            Ok(FolderStatus::Existing)
        }
    }

    async fn list_files(&self, folder: &str) -> Result<RemoteFileSet> {
        let state = self.lock();
        if !state.folders.contains(folder) {
            return Err(ApiError::Disk {
                action: format!("list folder {folder}"),
                status: 404,
                body: r#"{"error": "DiskNotFoundError"}"#.to_string(),
            }
            .into());
        }
        let prefix = format!("{folder}/");
        Ok(state
            .files
            .iter()
            .filter_map(|path| path.strip_prefix(&prefix))
            .map(str::to_string)
            .collect())
    }

    async fn upload_from_url(&self, path: &str, source_url: &str) -> Result<()> {
        if self.failing.contains(path) {
            return Err(anyhow!("simulated upload failure for {path}"));
        }
        let mut state = self.lock();
        state.files.insert(path.to_string());
        state
            .uploads
            .push((path.to_string(), source_url.to_string()));
        Ok(())
    }
}

/// Source whose every call fails, for error-path tests
pub struct FailingSource;

#[async_trait]
impl PhotoSource for FailingSource {
    async fn owner_name(&self) -> Result<String> {
        Err(anyhow!("VK API error 5: User authorization failed"))
    }

    async fn fetch_photos(&self) -> Result<Vec<Photo>> {
        Err(anyhow!("VK API error 5: User authorization failed"))
    }
}
