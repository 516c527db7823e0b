use crate::error::Result;
use async_trait::async_trait;

use super::ImageFetcher;

/// Fetches generated image bytes from the delivery host.
#[derive(Clone)]
pub struct DownloadClient {
    http: reqwest::Client,
}

impl DownloadClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ImageFetcher for DownloadClient {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        log::info!("Downloading image from {}", url);

        // Any non-2xx status becomes a network error, same as a failed connection.
        let response = self.http.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;

        log::debug!("Downloaded {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }
}
