//! Executing an upload plan against a destination store.
//!
//! Every planned file is an independent request: one failure is reported and
//! the remaining files are still attempted. With a concurrency of 1 files are
//! processed strictly one after another; higher values keep up to that many
//! requests in flight. Outcomes are always returned in plan order.

use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::io::IsTerminal;

use crate::photo::ExportedFile;
use crate::plan::UploadPlan;
use crate::store::DestinationStore;

/// Result of uploading one planned file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The store accepted the file
    Uploaded(String),
    /// The request failed: (file name, error message)
    Failed(String, String),
}

impl UploadOutcome {
    pub fn file_name(&self) -> &str {
        match self {
            UploadOutcome::Uploaded(name) | UploadOutcome::Failed(name, _) => name,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Uploaded(_))
    }
}

/// Destination path of `file_name` inside `folder`
pub fn remote_path(folder: &str, file_name: &str) -> String {
    format!("{}/{}", folder.trim_end_matches('/'), file_name)
}

/// Progress bar for the upload loop, hidden when disabled or not on a terminal
pub fn create_progress_bar(no_progress_bar: bool, total: u64) -> ProgressBar {
    if no_progress_bar || !std::io::stdout().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total);
    match ProgressStyle::with_template(
        "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
    ) {
        Ok(style) => pb.set_style(style.progress_chars("=> ")),
        Err(e) => warn!("Falling back to the default progress style: {e}"),
    }
    pb
}

async fn upload_one(
    store: &dyn DestinationStore,
    folder: &str,
    file: &ExportedFile,
    progress: &ProgressBar,
) -> UploadOutcome {
    let path = remote_path(folder, &file.file_name);
    let outcome = match store.upload_from_url(&path, &file.source_url).await {
        Ok(()) => {
            info!("Uploaded {} (size {})", file.file_name, file.size_tag);
            UploadOutcome::Uploaded(file.file_name.clone())
        }
        Err(e) => {
            warn!("Failed to upload {}: {e:#}", file.file_name);
            UploadOutcome::Failed(file.file_name.clone(), format!("{e:#}"))
        }
    };
    progress.set_message(file.file_name.clone());
    progress.inc(1);
    outcome
}

/// Uploads every file in `plan.to_upload` into `folder`.
///
/// `concurrency` is clamped to at least 1.
pub async fn upload_plan(
    store: &dyn DestinationStore,
    folder: &str,
    plan: &UploadPlan,
    concurrency: usize,
    progress: &ProgressBar,
) -> Vec<UploadOutcome> {
    for name in &plan.to_skip {
        info!("{name} already exists in {folder}, skipping");
    }

    let outcomes: Vec<UploadOutcome> = stream::iter(&plan.to_upload)
        .map(|file| upload_one(store, folder, file, progress))
        .buffered(concurrency.max(1))
        .collect()
        .await;

    progress.finish_and_clear();
    outcomes
}
