//! Google Cloud Storage client over the public JSON API.

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::prelude::*;
use crate::store::{Listing, ObjectStore};

const DEFAULT_BASE_URL: &str = "https://storage.googleapis.com";

/// Unauthenticated GCS client. CI artifact buckets are public, so no
/// credentials are attached.
pub struct GcsClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectsPage {
    #[serde(default)]
    prefixes: Vec<String>,
    #[serde(default)]
    items: Vec<ObjectItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectItem {
    name: String,
}

impl GcsClient {
    /// Create a client against the public GCS endpoint.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a client against a custom endpoint. Tests point this at a
    /// local fake.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::ClientBuilder::new().build()?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    /// Walk the objects listing, following `nextPageToken` until the last
    /// page.
    async fn list_pages(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
    ) -> Result<(Vec<String>, Vec<String>)> {
        let url = format!("{}/storage/v1/b/{}/o", self.base_url, bucket);

        let mut dirs = Vec::new();
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut request = self
                .client
                .get(&url)
                .query(&[("prefix", prefix), ("fields", "prefixes,items(name),nextPageToken")]);
            if let Some(delimiter) = delimiter {
                request = request.query(&[("delimiter", delimiter)]);
            }
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request.send().await?;
            if !response.status().is_success() {
                return Err(Error::Status {
                    url: url.clone(),
                    status: response.status(),
                });
            }

            let page: ObjectsPage = response.json().await?;
            dirs.extend(page.prefixes);
            files.extend(page.items.into_iter().map(|item| item.name));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok((dirs, files))
    }
}

impl ObjectStore for GcsClient {
    async fn list_dir(&self, bucket: &str, prefix: &str) -> Result<Listing> {
        debug!("Listing gs://{}/{}...", bucket, prefix);

        let (dirs, files) = self.list_pages(bucket, prefix, Some("/")).await?;
        Ok(Listing { dirs, files })
    }

    async fn list_all(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        debug!("Listing recursively gs://{}/{}...", bucket, prefix);

        let (_, files) = self.list_pages(bucket, prefix, None).await?;
        Ok(files)
    }

    async fn read(&self, bucket: &str, object: &str) -> Result<Vec<u8>> {
        debug!("Downloading gs://{}/{}...", bucket, object);

        let url = format!("{}/{}/{}", self.base_url, bucket, object);
        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::ObjectNotFound {
                bucket: bucket.to_string(),
                object: object.to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(Error::Status {
                url,
                status: response.status(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}
