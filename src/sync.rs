//! The export pipeline, end to end.
//!
//! One run:
//! - asks the photo source whose photos are exported and fetches them
//! - builds the export set (best variant per photo, popularity-based names)
//! - optionally writes the export manifest
//! - makes sure the destination folder exists and lists it
//! - plans which files to upload and which are already there
//! - uploads the planned files, one failure never stopping the rest
//!
//! [`run`] wires the real VK and Yandex.Disk clients from a [`Config`];
//! [`run_with`] takes any [`PhotoSource`] and [`DestinationStore`].

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::config::{Config, TokenFile};
use crate::disk::DiskClient;
use crate::error::{ApiError, ExportError};
use crate::export::{NameCollision, build_export_set};
use crate::manifest::Manifest;
use crate::naming::NamingPolicy;
use crate::plan::{RemoteFileSet, UploadPlan, plan};
use crate::store::{DestinationStore, FolderStatus, PhotoSource};
use crate::upload::{UploadOutcome, create_progress_bar, upload_plan};
use crate::vk::VkClient;

/// Switches given on the command line
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Plan and report, but do not create folders or upload anything
    pub dry_run: bool,
    pub no_progress: bool,
}

/// Everything a run needs besides the two services
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub folder: String,
    pub naming: NamingPolicy,
    pub concurrency: usize,
    pub manifest_path: Option<PathBuf>,
    pub options: SyncOptions,
}

impl SyncSettings {
    pub fn new(folder: &str) -> Self {
        Self {
            folder: folder.trim_end_matches('/').to_string(),
            naming: NamingPolicy::default(),
            concurrency: 1,
            manifest_path: None,
            options: SyncOptions::default(),
        }
    }

    /// Settings taken from a loaded config; relative paths resolve against `config_dir`
    pub fn from_config(config: &Config, config_dir: &Path, options: SyncOptions) -> Self {
        Self {
            naming: config.naming,
            concurrency: config.concurrency,
            manifest_path: config
                .manifest_file
                .as_deref()
                .map(|p| config.resolve(config_dir, p)),
            options,
            ..Self::new(&config.folder_name)
        }
    }
}

/// What one run found and did
#[derive(Debug, Clone)]
pub struct SyncSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub owner: String,
    pub folder: String,
    /// `None` on a dry run, where the folder is never created
    pub folder_status: Option<FolderStatus>,
    /// Photos returned by the source
    pub photo_count: usize,
    /// Unique file names in the export set
    pub exported_count: usize,
    pub collisions: Vec<NameCollision>,
    pub rejected: Vec<ExportError>,
    pub plan: UploadPlan,
    /// Empty on a dry run
    pub outcomes: Vec<UploadOutcome>,
    pub dry_run: bool,
}

impl SyncSummary {
    pub fn uploaded_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.plan.to_skip.len()
    }

    /// (file name, error message) of every failed upload
    pub fn failures(&self) -> Vec<(&str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                UploadOutcome::Failed(name, error) => Some((name.as_str(), error.as_str())),
                UploadOutcome::Uploaded(_) => None,
            })
            .collect()
    }
}

/// Lists `folder` without creating it; a missing folder lists as empty
async fn list_without_creating(store: &dyn DestinationStore, folder: &str) -> Result<RemoteFileSet> {
    match store.list_files(folder).await {
        Ok(remote) => Ok(remote),
        Err(e) if matches!(e.downcast_ref::<ApiError>(), Some(ApiError::Disk { status: 404, .. })) => {
            info!("Folder {folder} does not exist yet; every file would be uploaded");
            Ok(RemoteFileSet::new())
        }
        Err(e) => Err(e),
    }
}

/// Runs the pipeline against the given services
pub async fn run_with(
    source: &dyn PhotoSource,
    store: &dyn DestinationStore,
    settings: &SyncSettings,
) -> Result<SyncSummary> {
    let started_at = Utc::now();
    let dry_run = settings.options.dry_run;

    let owner = source
        .owner_name()
        .await
        .context("Failed to fetch the photo owner's profile")?;
    info!("Exporting profile photos of {owner}");

    let photos = source
        .fetch_photos()
        .await
        .context("Failed to fetch profile photos")?;
    info!("Fetched {} photos", photos.len());

    let export = build_export_set(&photos, settings.naming);
    info!(
        "Export set has {} files ({} collisions, {} photos rejected)",
        export.len(),
        export.collisions.len(),
        export.rejected.len()
    );

    if let Some(path) = &settings.manifest_path {
        Manifest::from_export(&export).save(path)?;
        info!("Wrote export manifest to {}", path.display());
    }

    let (folder_status, remote) = if dry_run {
        (None, list_without_creating(store, &settings.folder).await?)
    } else {
        let status = store
            .ensure_folder(&settings.folder)
            .await
            .with_context(|| format!("Failed to prepare folder {}", settings.folder))?;
        let remote = store
            .list_files(&settings.folder)
            .await
            .with_context(|| format!("Failed to list folder {}", settings.folder))?;
        (Some(status), remote)
    };
    info!("Folder {} holds {} files", settings.folder, remote.len());

    let sync_plan = plan(&export, &remote);
    info!(
        "{} files to upload, {} already present",
        sync_plan.to_upload.len(),
        sync_plan.to_skip.len()
    );

    let outcomes = if dry_run {
        Vec::new()
    } else {
        let progress = create_progress_bar(
            settings.options.no_progress,
            sync_plan.to_upload.len() as u64,
        );
        upload_plan(
            store,
            &settings.folder,
            &sync_plan,
            settings.concurrency,
            &progress,
        )
        .await
    };

    let summary = SyncSummary {
        started_at,
        finished_at: Utc::now(),
        owner,
        folder: settings.folder.clone(),
        folder_status,
        photo_count: photos.len(),
        exported_count: export.len(),
        collisions: export.collisions,
        rejected: export.rejected,
        plan: sync_plan,
        outcomes,
        dry_run,
    };

    let failed = summary.failures().len();
    if failed > 0 {
        warn!("{failed} uploads failed");
    }
    info!(
        "Uploaded {} photos, skipped {}, in {}s",
        summary.uploaded_count(),
        summary.skipped_count(),
        (summary.finished_at - summary.started_at).num_seconds()
    );

    Ok(summary)
}

/// Adds a pointer to the right token file when a service rejected our credentials
fn explain_auth_failure(err: anyhow::Error, vk_token: &Path, disk_token: &Path) -> anyhow::Error {
    let token_file = match err.downcast_ref::<ApiError>() {
        Some(api @ ApiError::Vk { .. }) if api.is_auth_failure() => Some(vk_token),
        Some(api) if api.is_auth_failure() => Some(disk_token),
        _ => None,
    };
    match token_file {
        Some(path) => err.context(format!(
            "Credentials were rejected; check the token in {}",
            path.display()
        )),
        None => err,
    }
}

/// Runs the pipeline against VK and Yandex.Disk as described by `config`.
///
/// Relative paths in the config resolve against `config_dir`.
pub async fn run(config: &Config, config_dir: &Path, options: SyncOptions) -> Result<SyncSummary> {
    let vk_token_path = config.resolve(config_dir, &config.vk_token_file);
    let disk_token_path = config.resolve(config_dir, &config.disk_token_file);

    let (vk_token, user_id) = TokenFile::load_with_id(&vk_token_path)?;
    let disk_token = TokenFile::load(&disk_token_path)?.token;

    let source = VkClient::new(&config.vk_api_url, &vk_token, &user_id, &config.api_version);
    let store = DiskClient::new(&config.disk_api_url, &disk_token);
    let settings = SyncSettings::from_config(config, config_dir, options);

    run_with(&source, &store, &settings)
        .await
        .map_err(|e| explain_auth_failure(e, &vk_token_path, &disk_token_path))
}
