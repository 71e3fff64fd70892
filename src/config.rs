//! YAML configuration and token files.
//!
//! Relative paths in the config resolve against the directory the config
//! file lives in.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

use crate::disk;
use crate::naming::NamingPolicy;
use crate::vk;

pub const DEFAULT_CONFIG_FILE: &str = "vk2yadisk.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// File with the VK access token on line 1 and the user ID on line 2
    pub vk_token_file: String,
    /// File with the Yandex.Disk OAuth token on line 1
    pub disk_token_file: String,
    /// Destination folder on Yandex.Disk
    pub folder_name: String,
    pub api_version: String,
    pub naming: NamingPolicy,
    /// Uploads kept in flight at once; 1 uploads strictly in order
    pub concurrency: usize,
    /// Where to write the JSON export manifest, if anywhere
    pub manifest_file: Option<String>,
    pub vk_api_url: String,
    pub disk_api_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vk_token_file: "token_id_vk.txt".to_string(),
            disk_token_file: "token_ya.txt".to_string(),
            folder_name: "vk_photos".to_string(),
            api_version: vk::DEFAULT_API_VERSION.to_string(),
            naming: NamingPolicy::Compatible,
            concurrency: 1,
            manifest_file: None,
            vk_api_url: vk::DEFAULT_API_URL.to_string(),
            disk_api_url: disk::DEFAULT_API_URL.to_string(),
        }
    }
}

/// Contents of a token file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenFile {
    pub token: String,
    pub user_id: Option<String>,
}

impl TokenFile {
    /// Reads the token from line 1 and an optional ID from line 2
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read token file {}", path.display()))?;

        let mut lines = contents.lines().map(str::trim);
        let token = lines
            .next()
            .filter(|t| !t.is_empty())
            .with_context(|| format!("Token file {} is empty", path.display()))?
            .to_string();
        let user_id = lines
            .next()
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        Ok(Self { token, user_id })
    }

    /// Like `load`, but the ID line is required
    pub fn load_with_id(path: &Path) -> Result<(String, String)> {
        let file = Self::load(path)?;
        let user_id = file.user_id.with_context(|| {
            format!(
                "Token file {} must contain the user ID on its second line",
                path.display()
            )
        })?;
        Ok((file.token, user_id))
    }
}

impl Config {
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;

        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let yaml = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&yaml)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config in {}", path.display()))?;

        Ok(config)
    }

    pub fn get_config_path(config_arg: &Option<PathBuf>) -> PathBuf {
        config_arg
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    pub fn validate(&self) -> Result<()> {
        if self.folder_name.trim().trim_matches('/').is_empty() {
            anyhow::bail!("folder_name must not be empty");
        }
        if self.concurrency == 0 {
            anyhow::bail!("concurrency must be at least 1");
        }
        Url::parse(&self.vk_api_url)
            .with_context(|| format!("vk_api_url is not a valid URL: {}", self.vk_api_url))?;
        Url::parse(&self.disk_api_url)
            .with_context(|| format!("disk_api_url is not a valid URL: {}", self.disk_api_url))?;
        Ok(())
    }

    /// Resolves a path from the config relative to the config file's directory
    pub fn resolve(&self, config_dir: &Path, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            config_dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.vk_token_file, "token_id_vk.txt");
        assert_eq!(config.disk_token_file, "token_ya.txt");
        assert_eq!(config.folder_name, "vk_photos");
        assert_eq!(config.api_version, "5.131");
        assert_eq!(config.naming, NamingPolicy::Compatible);
        assert_eq!(config.concurrency, 1);
        assert!(config.manifest_file.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load_config() -> Result<()> {
        let temp_dir = tempdir()?;
        let config_path = temp_dir.path().join("nested/vk2yadisk.yaml");

        let config = Config {
            naming: NamingPolicy::Indexed,
            concurrency: 4,
            manifest_file: Some("manifest.json".to_string()),
            ..Default::default()
        };
        config.save_to_file(&config_path)?;

        let loaded_config = Config::load_from_file(&config_path)?;

        assert_eq!(config.folder_name, loaded_config.folder_name);
        assert_eq!(loaded_config.naming, NamingPolicy::Indexed);
        assert_eq!(loaded_config.concurrency, 4);
        assert_eq!(loaded_config.manifest_file.as_deref(), Some("manifest.json"));

        Ok(())
    }

    #[test]
    fn test_partial_config_uses_defaults() -> Result<()> {
        let temp_dir = tempdir()?;
        let config_path = temp_dir.path().join("vk2yadisk.yaml");
        fs::write(&config_path, "folder_name: backups/vk\nnaming: indexed\n")?;

        let config = Config::load_from_file(&config_path)?;

        assert_eq!(config.folder_name, "backups/vk");
        assert_eq!(config.naming, NamingPolicy::Indexed);
        assert_eq!(config.vk_token_file, "token_id_vk.txt");
        assert_eq!(config.disk_api_url, disk::DEFAULT_API_URL);

        Ok(())
    }

    #[test]
    fn test_invalid_config_rejected() -> Result<()> {
        let temp_dir = tempdir()?;
        let config_path = temp_dir.path().join("vk2yadisk.yaml");

        fs::write(&config_path, "concurrency: 0\n")?;
        let err = Config::load_from_file(&config_path).unwrap_err();
        assert!(format!("{err:#}").contains("concurrency must be at least 1"));

        fs::write(&config_path, "folder_name: \"/\"\n")?;
        assert!(Config::load_from_file(&config_path).is_err());

        fs::write(&config_path, "vk_api_url: not a url\n")?;
        assert!(Config::load_from_file(&config_path).is_err());

        Ok(())
    }

    #[test]
    fn test_token_file_with_id() -> Result<()> {
        let temp_dir = tempdir()?;
        let path = temp_dir.path().join("token_id_vk.txt");
        fs::write(&path, "  vk1.a.secret  \n12345\n")?;

        let (token, user_id) = TokenFile::load_with_id(&path)?;

        assert_eq!(token, "vk1.a.secret");
        assert_eq!(user_id, "12345");
        Ok(())
    }

    #[test]
    fn test_token_file_without_id() -> Result<()> {
        let temp_dir = tempdir()?;
        let path = temp_dir.path().join("token_ya.txt");
        fs::write(&path, "y0_disk_token\n")?;

        let file = TokenFile::load(&path)?;
        assert_eq!(file.token, "y0_disk_token");
        assert_eq!(file.user_id, None);

        let err = TokenFile::load_with_id(&path).unwrap_err();
        assert!(err.to_string().contains("second line"));
        Ok(())
    }

    #[test]
    fn test_empty_or_missing_token_file() -> Result<()> {
        let temp_dir = tempdir()?;
        let path = temp_dir.path().join("empty.txt");
        fs::write(&path, "\n")?;

        assert!(TokenFile::load(&path).is_err());
        assert!(TokenFile::load(&temp_dir.path().join("missing.txt")).is_err());
        Ok(())
    }

    #[test]
    fn test_resolve_relative_paths() {
        let config = Config::default();
        let dir = Path::new("/etc/vk2yadisk");

        assert_eq!(
            config.resolve(dir, "token_ya.txt"),
            PathBuf::from("/etc/vk2yadisk/token_ya.txt")
        );
        assert_eq!(
            config.resolve(dir, "/secrets/token_ya.txt"),
            PathBuf::from("/secrets/token_ya.txt")
        );
    }
}
