//! Upload planning: diffing the export set against the destination folder.

use std::collections::HashSet;

use crate::export::ExportSet;
use crate::photo::ExportedFile;

/// Names present in the destination folder when it was listed.
///
/// This is a snapshot; files may appear after listing. Uploads always
/// overwrite, so a stale listing only costs a redundant upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteFileSet {
    names: HashSet<String>,
}

impl RemoteFileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for RemoteFileSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// What a sync run will do with each file of the export set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadPlan {
    pub to_upload: Vec<ExportedFile>,
    pub to_skip: Vec<String>,
}

impl UploadPlan {
    /// Number of files the plan covers
    pub fn total(&self) -> usize {
        self.to_upload.len() + self.to_skip.len()
    }
}

/// Splits the export set into files to upload and files already present.
///
/// Order follows the export set's insertion order.
pub fn plan(export: &ExportSet, remote: &RemoteFileSet) -> UploadPlan {
    let mut plan = UploadPlan::default();

    for file in export.entries() {
        if remote.contains(&file.file_name) {
            plan.to_skip.push(file.file_name.clone());
        } else {
            plan.to_upload.push(file.clone());
        }
    }

    plan
}
