pub mod download_client;
pub mod prediction_client;

use crate::{config::ReplicateConfig, error::Result, models::PredictionInput};
use async_trait::async_trait;
use serde_json::Value;

pub use download_client::DownloadClient;
pub use prediction_client::PredictionClient;

/// Runs a model to completion and returns its raw output.
#[async_trait]
pub trait PredictionProvider: Send + Sync {
    async fn run(&self, model: &str, input: &PredictionInput) -> Result<Value>;
}

/// Retrieves the bytes stored at an image location.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

#[derive(Clone)]
pub struct ReplicateClient {
    prediction_client: PredictionClient,
    download_client: DownloadClient,
}

impl ReplicateClient {
    /// Fails with a configuration error when no API token is set.
    pub fn new(config: &ReplicateConfig) -> Result<Self> {
        let token = config.require_token()?;
        log::debug!("Replicate token: {:?}", token);

        let http = reqwest::Client::builder()
            .user_agent(concat!("fluxgen/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            prediction_client: PredictionClient::new(
                http.clone(),
                token,
                config.base_url.clone(),
                config.poll_interval,
            ),
            download_client: DownloadClient::new(http),
        })
    }

    pub fn predictions(&self) -> &PredictionClient {
        &self.prediction_client
    }

    pub fn downloads(&self) -> &DownloadClient {
        &self.download_client
    }
}
