//! VK API client.
//!
//! Only the two calls the exporter needs are implemented: `users.get`, to say
//! whose photos are being exported, and `photos.get` on the `profile` album
//! with per-size URLs. Every VK response is either `{"response": ...}` or
//! `{"error": {...}}`; the latter is turned into [`ApiError::Vk`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::photo::{Photo, PhotoVariant};
use crate::store::PhotoSource;

pub const DEFAULT_API_URL: &str = "https://api.vk.com/method";
pub const DEFAULT_API_VERSION: &str = "5.131";
/// Largest page `photos.get` accepts
pub const PHOTOS_PAGE_SIZE: usize = 1000;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    response: Option<T>,
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error_code: i64,
    error_msg: String,
}

/// A VK user as returned by `users.get`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VkUser {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl VkUser {
    pub fn display_name(&self) -> String {
        format!("{} {} (id {})", self.first_name, self.last_name, self.id)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Deserialize)]
struct PhotoList {
    #[serde(default)]
    count: u64,
    #[serde(default)]
    items: Vec<PhotoItem>,
}

#[derive(Debug, Deserialize)]
struct PhotoItem {
    likes: Option<Likes>,
    #[serde(default)]
    sizes: Vec<Size>,
}

#[derive(Debug, Deserialize)]
struct Likes {
    count: u64,
}

#[derive(Debug, Deserialize)]
struct Size {
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    url: String,
    #[serde(rename = "type", default)]
    size_type: String,
}

impl From<PhotoItem> for Photo {
    fn from(item: PhotoItem) -> Self {
        let like_count = item.likes.map(|l| l.count).unwrap_or(0);
        let variants = item
            .sizes
            .into_iter()
            .map(|s| PhotoVariant {
                width: s.width,
                height: s.height,
                url: s.url,
                size_tag: s.size_type,
            })
            .collect();
        Photo::new(like_count, variants)
    }
}

/// Client for one VK account
pub struct VkClient {
    client: Client,
    base_url: String,
    token: String,
    user_id: String,
    version: String,
}

impl VkClient {
    pub fn new(base_url: &str, token: &str, user_id: &str, version: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            user_id: user_id.to_string(),
            version: version.to_string(),
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}/{}", self.base_url, method);
        debug!("Calling VK method {method}");

        let response = self
            .client
            .get(&url)
            .query(&[("access_token", self.token.as_str()), ("v", self.version.as_str())])
            .query(params)
            .send()
            .await
            .with_context(|| format!("Failed to call VK method {method}"))?;

        let envelope: Envelope<T> = response
            .json()
            .await
            .with_context(|| format!("Failed to parse VK response for {method}"))?;

        if let Some(error) = envelope.error {
            return Err(ApiError::Vk {
                code: error.error_code,
                message: error.error_msg,
            }
            .into());
        }

        envelope.response.ok_or_else(|| {
            ApiError::Malformed {
                endpoint: method.to_string(),
                reason: "neither response nor error present".to_string(),
            }
            .into()
        })
    }

    /// The account whose photos are exported
    pub async fn user_info(&self) -> Result<VkUser> {
        let users: Vec<VkUser> = self
            .call("users.get", &[("user_ids", self.user_id.as_str())])
            .await?;

        users.into_iter().next().ok_or_else(|| {
            ApiError::Malformed {
                endpoint: "users.get".to_string(),
                reason: format!("no user returned for id {}", self.user_id),
            }
            .into()
        })
    }

    /// Profile photos with all their size variants, every page of them
    pub async fn profile_photos(&self) -> Result<Vec<Photo>> {
        let mut photos = Vec::new();
        let page_size = PHOTOS_PAGE_SIZE.to_string();

        loop {
            let offset = photos.len().to_string();
            let list: PhotoList = self
                .call(
                    "photos.get",
                    &[
                        ("owner_id", self.user_id.as_str()),
                        ("album_id", "profile"),
                        ("extended", "1"),
                        ("photo_sizes", "1"),
                        ("count", page_size.as_str()),
                        ("offset", offset.as_str()),
                    ],
                )
                .await?;

            let received = list.items.len();
            photos.extend(list.items.into_iter().map(Photo::from));
            debug!("Fetched {} of {} profile photos", photos.len(), list.count);

            if received == 0 || photos.len() as u64 >= list.count {
                if (photos.len() as u64) < list.count {
                    warn!(
                        "VK reports {} profile photos but only {} could be fetched",
                        list.count,
                        photos.len()
                    );
                }
                break;
            }
        }

        info!("Fetched {} profile photos", photos.len());
        Ok(photos)
    }
}

#[async_trait]
impl PhotoSource for VkClient {
    async fn owner_name(&self) -> Result<String> {
        Ok(self.user_info().await?.display_name())
    }

    async fn fetch_photos(&self) -> Result<Vec<Photo>> {
        self.profile_photos().await
    }
}
