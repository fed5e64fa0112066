// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Image Inventory Client
//!
//! Fetches the container images a user may launch from an external
//! inventory service.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Look up and cache per-user image tags
//! - **Integration:** External HTTP API → per-user TTL cache → container image type
//!
//! # Protocol
//!
//! `GET {api_url}/list/{user}` with the configured token sent verbatim as the
//! `Authorization` header. The response body looks like:
//!
//! ```json
//! {"images": [{"tag": ["registry/image:1.0"], "ENV": ["JUPYTER_IMAGE=YES"]}]}
//! ```
//!
//! Only successful lookups are cached. A failed lookup is retried on the
//! next call.

use lru::LruCache;
use parking_lot::Mutex;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::service_config::{resolve_secret, ContainerImageConfig};

/// Users tracked by the cache before the least recently used is evicted
const CACHE_CAPACITY: usize = 1024;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Inventory request failed: {0}")]
    Request(String),

    #[error("Inventory returned status {0}")]
    Status(u16),

    #[error("Inventory response could not be decoded: {0}")]
    Decode(String),

    #[error("Inventory client misconfigured: {0}")]
    Config(String),

    #[error("User name cannot be used as an inventory path segment")]
    InvalidUser,
}

#[derive(Debug, Default, Deserialize)]
struct InventoryResponse {
    #[serde(default)]
    images: Vec<InventoryImage>,
}

#[derive(Debug, Default, Deserialize)]
struct InventoryImage {
    #[serde(default)]
    tag: Vec<String>,

    #[serde(default, rename = "ENV")]
    env: Vec<String>,
}

pub struct ImageInventoryClient {
    base_url: Url,
    api_token: Option<String>,
    required_env: Option<String>,
    ttl: Duration,
    client: Client,
    cache: Mutex<LruCache<String, (Instant, Vec<String>)>>,
}

impl ImageInventoryClient {
    pub fn from_config(config: &ContainerImageConfig) -> Result<Self, InventoryError> {
        let api_token =
            resolve_secret(&config.api_token).map_err(|e| InventoryError::Config(e.to_string()))?;

        let base_url = Url::parse(&config.api_url)
            .map_err(|e| InventoryError::Config(format!("api_url: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(InventoryError::Config(format!(
                "api_url '{}' cannot carry a path",
                config.api_url
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| InventoryError::Config(e.to_string()))?;

        Ok(Self {
            base_url,
            api_token,
            required_env: config.required_env.clone(),
            ttl: Duration::from_secs(config.cache_ttl_secs),
            client,
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            )),
        })
    }

    /// Image tags the user may launch, served from cache while fresh.
    pub async fn images_for(&self, user: &str) -> Result<Vec<String>, InventoryError> {
        if let Some(images) = self.cached(user) {
            debug!(user = %user, "Image inventory cache hit");
            return Ok(images);
        }

        let images = self.fetch(user).await?;
        self.cache
            .lock()
            .put(user.to_string(), (Instant::now(), images.clone()));
        Ok(images)
    }

    /// Like [`Self::images_for`], but a failed lookup yields no images.
    pub async fn images_or_empty(&self, user: &str) -> Vec<String> {
        match self.images_for(user).await {
            Ok(images) => images,
            Err(e) => {
                warn!(user = %user, error = %e, "Image inventory lookup failed");
                Vec::new()
            }
        }
    }

    fn cached(&self, user: &str) -> Option<Vec<String>> {
        let mut cache = self.cache.lock();
        match cache.get(user) {
            Some((fetched_at, images)) => {
                if fetched_at.elapsed() < self.ttl {
                    return Some(images.clone());
                }
            }
            None => return None,
        }
        // Expired
        cache.pop(user);
        None
    }

    /// `{api_url}/list/{user}` with the user as one escaped segment.
    fn list_url(&self, user: &str) -> Result<Url, InventoryError> {
        if matches!(user, "" | "." | "..") {
            return Err(InventoryError::InvalidUser);
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| InventoryError::InvalidUser)?
            .pop_if_empty()
            .push("list")
            .push(user);
        Ok(url)
    }

    async fn fetch(&self, user: &str) -> Result<Vec<String>, InventoryError> {
        let url = self.list_url(user)?;

        let mut request = self.client.get(url);
        if let Some(token) = &self.api_token {
            request = request.header(reqwest::header::AUTHORIZATION, token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| InventoryError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(InventoryError::Status(response.status().as_u16()));
        }

        let body: InventoryResponse = response
            .json()
            .await
            .map_err(|e| InventoryError::Decode(e.to_string()))?;

        Ok(self.filter_images(body))
    }

    fn filter_images(&self, body: InventoryResponse) -> Vec<String> {
        body.images
            .into_iter()
            .filter(|image| match &self.required_env {
                Some(required) => image.env.iter().any(|entry| entry == required),
                None => true,
            })
            .flat_map(|image| image.tag)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    const BODY: &str = r#"{
        "images": [
            {
                "tag": ["registry/jupyter:1.0", "registry/jupyter:latest"],
                "ENV": ["PATH=/bin", "JUPYTER_IMAGE=YES"]
            },
            {"tag": ["registry/batch:2.0"], "ENV": ["PATH=/bin"]},
            {"tag": ["registry/bare:0.1"]}
        ]
    }"#;

    fn config(url: &str, required_env: Option<&str>) -> ContainerImageConfig {
        ContainerImageConfig {
            api_url: url.to_string(),
            api_token: Some("inventory-token".to_string()),
            required_env: required_env.map(str::to_string),
            cache_ttl_secs: 60,
            request_timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn test_filters_by_required_env() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/list/alice")
            .match_header("authorization", "inventory-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(BODY)
            .create_async()
            .await;

        let client =
            ImageInventoryClient::from_config(&config(&server.url(), Some("JUPYTER_IMAGE=YES")))
                .unwrap();
        let images = client.images_for("alice").await.unwrap();

        assert_eq!(images, vec!["registry/jupyter:1.0", "registry/jupyter:latest"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_without_required_env_returns_every_tag() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/list/alice")
            .with_status(200)
            .with_body(BODY)
            .create_async()
            .await;

        let client = ImageInventoryClient::from_config(&config(&server.url(), None)).unwrap();
        let images = client.images_for("alice").await.unwrap();
        assert_eq!(images.len(), 4);
    }

    #[tokio::test]
    async fn test_successful_lookup_is_cached() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/list/alice")
            .with_status(200)
            .with_body(BODY)
            .expect(1)
            .create_async()
            .await;

        let client = ImageInventoryClient::from_config(&config(&server.url(), None)).unwrap();
        let first = client.images_for("alice").await.unwrap();
        let second = client.images_for("alice").await.unwrap();

        assert_eq!(first, second);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/list/alice")
            .with_status(500)
            .expect(2)
            .create_async()
            .await;

        let client = ImageInventoryClient::from_config(&config(&server.url(), None)).unwrap();
        assert!(matches!(
            client.images_for("alice").await,
            Err(InventoryError::Status(500))
        ));
        assert!(client.images_or_empty("alice").await.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_body_degrades_to_empty() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/list/alice")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = ImageInventoryClient::from_config(&config(&server.url(), None)).unwrap();
        assert!(client.images_or_empty("alice").await.is_empty());
    }

    #[test]
    fn test_user_is_a_single_path_segment() {
        let client =
            ImageInventoryClient::from_config(&config("https://images.example.org/api/", None))
                .unwrap();

        assert_eq!(
            client.list_url("alice").unwrap().as_str(),
            "https://images.example.org/api/list/alice"
        );
        assert_eq!(
            client.list_url("alice/../bob").unwrap().path(),
            "/api/list/alice%2F..%2Fbob"
        );
        for user in ["", ".", ".."] {
            assert!(matches!(client.list_url(user), Err(InventoryError::InvalidUser)));
        }
    }

    #[tokio::test]
    async fn test_traversal_in_user_does_not_reach_other_user() {
        let mut server = Server::new_async().await;
        let bob = server
            .mock("GET", "/list/bob")
            .with_status(200)
            .with_body(BODY)
            .expect(0)
            .create_async()
            .await;

        let client = ImageInventoryClient::from_config(&config(&server.url(), None)).unwrap();
        assert!(client.images_or_empty("alice/../bob").await.is_empty());
        bob.assert_async().await;
    }

    #[test]
    fn test_rejects_unusable_api_url() {
        assert!(matches!(
            ImageInventoryClient::from_config(&config("not a url", None)),
            Err(InventoryError::Config(_))
        ));
        assert!(matches!(
            ImageInventoryClient::from_config(&config("mailto:images@example.org", None)),
            Err(InventoryError::Config(_))
        ));
    }
}
