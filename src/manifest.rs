//! JSON manifest of the files an export produced.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::export::ExportSet;

/// One exported photo as listed in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub file_name: String,
    /// VK size letter of the uploaded variant
    pub size: String,
}

/// Record of what one export produced, in input order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub generated_at: DateTime<Utc>,
    pub files: Vec<ManifestEntry>,
}

impl Manifest {
    /// Lists every named photo, including ones lost to a name collision
    pub fn from_export(export: &ExportSet) -> Self {
        Self {
            generated_at: Utc::now(),
            files: export
                .files()
                .iter()
                .map(|f| ManifestEntry {
                    file_name: f.file_name.clone(),
                    size: f.size_tag.clone(),
                })
                .collect(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create directory for {}", path.display())
                })?;
            }
        }

        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize export manifest")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write manifest to {}", path.display()))?;

        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest from {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse manifest from {}", path.display()))
    }
}
