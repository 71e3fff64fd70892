//! Yandex.Disk REST client.
//!
//! All calls go to the `resources` endpoint with an `OAuth` token. Uploads use
//! the "upload from URL" operation: Disk downloads the file itself, so photo
//! bytes never pass through this machine. The operation is asynchronous on the
//! Disk side and is acknowledged with `202 Accepted`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;

use crate::error::ApiError;
use crate::plan::RemoteFileSet;
use crate::store::{DestinationStore, FolderStatus};

pub const DEFAULT_API_URL: &str = "https://cloud-api.yandex.net/v1/disk/resources";

/// Page size used when listing a folder
const LIST_PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
struct Resource {
    #[serde(rename = "_embedded")]
    embedded: Option<ResourceList>,
}

#[derive(Debug, Deserialize)]
struct ResourceList {
    #[serde(default)]
    items: Vec<ResourceItem>,
    #[serde(default)]
    total: usize,
}

#[derive(Debug, Deserialize)]
struct ResourceItem {
    name: String,
}

/// Client for one Yandex.Disk account
pub struct DiskClient {
    client: Client,
    base_url: String,
    token: String,
}

impl DiskClient {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(AUTHORIZATION, format!("OAuth {}", self.token))
            .header(ACCEPT, "application/json")
    }

    async fn send(&self, builder: RequestBuilder, action: &str) -> Result<Response> {
        builder
            .send()
            .await
            .with_context(|| format!("Failed to reach Yandex.Disk to {action}"))
    }
}

/// Turns an unexpected response into an `ApiError`, keeping the body for the message
async fn unexpected(action: &str, response: Response) -> anyhow::Error {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ApiError::Disk {
        action: action.to_string(),
        status,
        body,
    }
    .into()
}

#[async_trait]
impl DestinationStore for DiskClient {
    async fn ensure_folder(&self, folder: &str) -> Result<FolderStatus> {
        let action = format!("check folder {folder}");
        let response = self
            .send(
                self.request(Method::GET, &self.base_url)
                    .query(&[("path", folder)]),
                &action,
            )
            .await?;

        match response.status() {
            StatusCode::OK => {
                info!("Folder {folder} already exists");
                Ok(FolderStatus::Existing)
            }
            StatusCode::NOT_FOUND => {
                let action = format!("create folder {folder}");
                let response = self
                    .send(
                        self.request(Method::PUT, &self.base_url)
                            .query(&[("path", folder)]),
                        &action,
                    )
                    .await?;
                match response.status() {
                    StatusCode::CREATED => {
                        info!("Created folder {folder}");
                        Ok(FolderStatus::Created)
                    }
                    // Someone else created it between the check and the create
                    StatusCode::CONFLICT => Ok(FolderStatus::Existing),
                    _ => Err(unexpected(&action, response).await),
                }
            }
            _ => Err(unexpected(&action, response).await),
        }
    }

    async fn list_files(&self, folder: &str) -> Result<RemoteFileSet> {
        let action = format!("list folder {folder}");
        let mut names = RemoteFileSet::new();
        let mut offset: usize = 0;

        loop {
            let limit = LIST_PAGE_SIZE.to_string();
            let page_offset = offset.to_string();
            let response = self
                .send(
                    self.request(Method::GET, &self.base_url).query(&[
                        ("path", folder),
                        ("limit", limit.as_str()),
                        ("offset", page_offset.as_str()),
                    ]),
                    &action,
                )
                .await?;

            if response.status() != StatusCode::OK {
                return Err(unexpected(&action, response).await);
            }

            let resource: Resource = response
                .json()
                .await
                .with_context(|| format!("Failed to parse listing of {folder}"))?;
            let Some(page) = resource.embedded else {
                break;
            };

            let received = page.items.len();
            for item in page.items {
                names.insert(item.name);
            }
            offset += received;
            debug!("Listed {offset} of {} entries in {folder}", page.total);

            if received == 0 || offset >= page.total {
                break;
            }
        }

        Ok(names)
    }

    async fn upload_from_url(&self, path: &str, source_url: &str) -> Result<()> {
        let action = format!("upload {path}");
        let response = self
            .send(
                self.request(Method::POST, &format!("{}/upload", self.base_url))
                    .query(&[("path", path), ("url", source_url), ("overwrite", "true")]),
                &action,
            )
            .await?;

        if response.status() == StatusCode::ACCEPTED {
            Ok(())
        } else {
            Err(unexpected(&action, response).await)
        }
    }
}
