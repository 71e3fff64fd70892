//! Building the export set: what should exist in the destination folder.
//!
//! The export set is an ordered mapping from file name to [`ExportedFile`].
//! Names keep the position where they were first produced; when a later photo
//! produces a name that is already present, its entry replaces the earlier one
//! and the overwrite is recorded as a [`NameCollision`] so that lost photos
//! show up in the logs and in the run summary.

use log::warn;
use std::collections::HashMap;

use crate::error::ExportError;
use crate::naming::{NamingPolicy, assign_names};
use crate::photo::{ExportedFile, Photo};

/// A photo that was dropped because a later photo produced the same name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameCollision {
    pub file_name: String,
    pub replaced_url: String,
    pub kept_url: String,
}

/// Result of exporting one photo collection
#[derive(Debug, Clone, Default)]
pub struct ExportSet {
    /// Every named photo in input order, collided duplicates included
    files: Vec<ExportedFile>,
    /// Unique entries in first-insertion order
    entries: Vec<ExportedFile>,
    /// Position of each name in `entries`
    positions: HashMap<String, usize>,
    /// Overwrites, in the order they happened
    pub collisions: Vec<NameCollision>,
    /// Photos that could not be exported
    pub rejected: Vec<ExportError>,
}

impl ExportSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file, replacing any entry with the same name (last write wins)
    pub fn insert(&mut self, file: ExportedFile) {
        self.files.push(file.clone());

        if let Some(&position) = self.positions.get(&file.file_name) {
            let previous = std::mem::replace(&mut self.entries[position], file);
            let kept = &self.entries[position];
            warn!(
                "File name {} produced more than once; keeping {} and dropping {}",
                kept.file_name, kept.source_url, previous.source_url
            );
            self.collisions.push(NameCollision {
                file_name: kept.file_name.clone(),
                replaced_url: previous.source_url,
                kept_url: kept.source_url.clone(),
            });
        } else {
            self.positions
                .insert(file.file_name.clone(), self.entries.len());
            self.entries.push(file);
        }
    }

    /// Unique entries in first-insertion order
    pub fn entries(&self) -> &[ExportedFile] {
        &self.entries
    }

    /// Every named photo in input order, before collisions were resolved
    pub fn files(&self) -> &[ExportedFile] {
        &self.files
    }

    /// Source URL stored under `file_name`
    pub fn get(&self, file_name: &str) -> Option<&str> {
        self.positions
            .get(file_name)
            .map(|&position| self.entries[position].source_url.as_str())
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.positions.contains_key(file_name)
    }

    /// Number of unique file names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (file name, source URL) pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|f| (f.file_name.as_str(), f.source_url.as_str()))
    }
}

/// Selects, names and collects every photo into an export set.
///
/// Photos without variants are recorded in `rejected` and skipped; they do not
/// stop the export.
pub fn build_export_set(photos: &[Photo], policy: NamingPolicy) -> ExportSet {
    let mut export = ExportSet::new();

    for result in assign_names(photos, policy) {
        match result {
            Ok(file) => export.insert(file),
            Err(e) => {
                warn!("Skipping photo: {e}");
                export.rejected.push(e);
            }
        }
    }

    export
}
