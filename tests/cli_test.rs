//! End-to-end tests for the `vk2yadisk` binary.
//!
//! The VK and Yandex.Disk APIs are served by local mockito servers; the config
//! written for each test points the binary at them.

use assert_cmd::Command;
use mockito::{Matcher, Mock, Server, ServerGuard};
use predicates::prelude::*;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const PHOTOS_BODY: &str = r#"{
    "response": {
        "count": 3,
        "items": [
            {
                "likes": {"count": 3},
                "sizes": [
                    {"width": 10, "height": 20, "url": "https://vk.test/a.jpg", "type": "m"},
                    {"width": 30, "height": 10, "url": "https://vk.test/b.jpg", "type": "x"}
                ]
            },
            {
                "likes": {"count": 5},
                "sizes": [{"width": 100, "height": 100, "url": "https://vk.test/u1.jpg", "type": "x"}]
            },
            {
                "likes": {"count": 5},
                "sizes": [{"width": 50, "height": 50, "url": "https://vk.test/u2.jpg", "type": "m"}]
            }
        ]
    }
}"#;

const FOLDER_BODY: &str = r#"{
    "name": "vk_photos",
    "type": "dir",
    "_embedded": {
        "items": [{"name": "3.jpg", "type": "file"}],
        "limit": 100,
        "offset": 0,
        "total": 1
    }
}"#;

fn bin() -> Command {
    Command::cargo_bin("vk2yadisk").expect("Failed to find vk2yadisk binary")
}

/// Writes token files and a config pointing at `server`, returning the config path
fn write_config(dir: &Path, server: &ServerGuard) -> Result<PathBuf, Box<dyn Error>> {
    fs::write(dir.join("token_id_vk.txt"), "vk-token\n42\n")?;
    fs::write(dir.join("token_ya.txt"), "ya-token\n")?;

    let config_path = dir.join("vk2yadisk.yaml");
    let config = format!(
        r#"
vk_token_file: token_id_vk.txt
disk_token_file: token_ya.txt
folder_name: vk_photos
naming: compatible
manifest_file: manifest.json
vk_api_url: "{url}/method"
disk_api_url: "{url}/v1/disk/resources"
"#,
        url = server.url()
    );
    fs::write(&config_path, config)?;
    Ok(config_path)
}

/// Mocks must stay alive for the duration of the test; dropping one removes it
fn mock_vk(server: &mut ServerGuard) -> Vec<Mock> {
    let users = server
        .mock("GET", "/method/users.get")
        .match_query(Matcher::UrlEncoded("user_ids".into(), "42".into()))
        .with_status(200)
        .with_body(r#"{"response": [{"id": 42, "first_name": "Ivan", "last_name": "Petrov"}]}"#)
        .create();
    let photos = server
        .mock("GET", "/method/photos.get")
        .match_query(Matcher::UrlEncoded("owner_id".into(), "42".into()))
        .with_status(200)
        .with_body(PHOTOS_BODY)
        .create();
    vec![users, photos]
}

/// Returns (folder mock, upload mock)
fn mock_disk(server: &mut ServerGuard, expected_uploads: usize) -> (Mock, Mock) {
    let folder = server
        .mock("GET", "/v1/disk/resources")
        .match_query(Matcher::UrlEncoded("path".into(), "vk_photos".into()))
        .match_header("authorization", "OAuth ya-token")
        .with_status(200)
        .with_body(FOLDER_BODY)
        .create();
    let upload = server
        .mock("POST", "/v1/disk/resources/upload")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("path".into(), "vk_photos/5 5.jpg".into()),
            Matcher::UrlEncoded("url".into(), "https://vk.test/u2.jpg".into()),
            Matcher::UrlEncoded("overwrite".into(), "true".into()),
        ]))
        .with_status(202)
        .with_body(r#"{"href": "https://cloud-api.yandex.net/v1/disk/operations/1"}"#)
        .expect(expected_uploads)
        .create();
    (folder, upload)
}

#[test]
fn test_init_creates_config() -> Result<(), Box<dyn Error>> {
    let temp_dir = TempDir::new()?;
    let config_path = temp_dir.path().join("vk2yadisk.yaml");

    bin().arg("init")
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config file"));

    let content = fs::read_to_string(&config_path)?;
    assert!(content.contains("folder_name: vk_photos"));
    assert!(content.contains("vk_token_file"));
    assert!(content.contains("disk_token_file"));
    assert!(content.contains("naming: compatible"));

    Ok(())
}

#[test]
fn test_init_respects_force() -> Result<(), Box<dyn Error>> {
    let temp_dir = TempDir::new()?;
    let config_path = temp_dir.path().join("custom.yaml");
    fs::write(&config_path, "folder_name: mine\n")?;

    bin().arg("init")
        .arg("--config")
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Config file already exists"));
    assert_eq!(fs::read_to_string(&config_path)?, "folder_name: mine\n");

    bin().arg("init")
        .arg("--force")
        .arg("--config")
        .arg(&config_path)
        .assert()
        .success();
    assert!(fs::read_to_string(&config_path)?.contains("folder_name: vk_photos"));

    Ok(())
}

#[test]
fn test_missing_config_error() -> Result<(), Box<dyn Error>> {
    let temp_dir = TempDir::new()?;

    bin().arg("sync")
        .arg("--config")
        .arg(temp_dir.path().join("does_not_exist.yaml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"));

    Ok(())
}

#[test]
fn test_sync_uploads_missing_photos() -> Result<(), Box<dyn Error>> {
    let temp_dir = TempDir::new()?;
    let mut server = Server::new();
    let _vk = mock_vk(&mut server);
    let (_folder, upload) = mock_disk(&mut server, 1);
    let config_path = write_config(temp_dir.path(), &server)?;

    bin().arg("sync")
        .arg("--no-progress")
        .arg("--config")
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Profile: Ivan Petrov (id 42)"))
        .stdout(predicate::str::contains("Folder vk_photos already exists"))
        .stdout(predicate::str::contains("File 3.jpg already exists!"))
        .stdout(predicate::str::contains("Photos lost to duplicate names: 1"))
        .stdout(predicate::str::contains("Added 1 photos (1 skipped, 0 failed)"));

    upload.assert();

    let manifest = fs::read_to_string(temp_dir.path().join("manifest.json"))?;
    assert!(manifest.contains("\"3.jpg\""));
    assert!(manifest.contains("\"5 5.jpg\""));

    Ok(())
}

#[test]
fn test_status_uploads_nothing() -> Result<(), Box<dyn Error>> {
    let temp_dir = TempDir::new()?;
    let mut server = Server::new();
    let _vk = mock_vk(&mut server);
    let (_folder, upload) = mock_disk(&mut server, 0);
    let config_path = write_config(temp_dir.path(), &server)?;

    bin().arg("status")
        .arg("--config")
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("vk2yadisk Status"))
        .stdout(predicate::str::contains("Configuration:"))
        .stdout(predicate::str::contains("1 photos to upload, 1 already present"));

    upload.assert();

    Ok(())
}

#[test]
fn test_rejected_vk_token() -> Result<(), Box<dyn Error>> {
    let temp_dir = TempDir::new()?;
    let mut server = Server::new();
    let _users = server
        .mock("GET", "/method/users.get")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"error": {"error_code": 5, "error_msg": "User authorization failed"}}"#)
        .create();
    let config_path = write_config(temp_dir.path(), &server)?;

    bin().arg("sync")
        .arg("--no-progress")
        .arg("--config")
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("check the token in"))
        .stderr(predicate::str::contains("token_id_vk.txt"))
        .stderr(predicate::str::contains("VK API error 5"));

    Ok(())
}

#[test]
fn test_status_before_folder_exists() -> Result<(), Box<dyn Error>> {
    let temp_dir = TempDir::new()?;
    let mut server = Server::new();
    let _vk = mock_vk(&mut server);
    let _missing = server
        .mock("GET", "/v1/disk/resources")
        .match_query(Matcher::UrlEncoded("path".into(), "vk_photos".into()))
        .with_status(404)
        .with_body(r#"{"error": "DiskNotFoundError", "description": "Resource not found."}"#)
        .create();
    let create = server
        .mock("PUT", "/v1/disk/resources")
        .match_query(Matcher::Any)
        .expect(0)
        .create();
    let config_path = write_config(temp_dir.path(), &server)?;

    bin().arg("status")
        .arg("--config")
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 photos to upload, 0 already present"));

    create.assert();

    Ok(())
}
