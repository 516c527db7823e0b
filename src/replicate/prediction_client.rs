use crate::{
    config::ApiToken,
    error::{FluxError, Result},
    models::{ApiErrorBody, CreatePredictionRequest, Prediction, PredictionInput, PredictionStatus},
};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::PredictionProvider;

#[derive(Clone)]
pub struct PredictionClient {
    http: reqwest::Client,
    token: ApiToken,
    base_url: String,
    poll_interval: Duration,
}

impl PredictionClient {
    pub fn new(
        http: reqwest::Client,
        token: ApiToken,
        base_url: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            http,
            token,
            base_url: base_url.into(),
            poll_interval,
        }
    }

    fn model_url(&self, model: &str) -> Result<String> {
        let (owner, name) = model
            .split_once('/')
            .filter(|(owner, name)| !owner.is_empty() && !name.is_empty())
            .ok_or_else(|| {
                FluxError::Internal(format!("model '{}' is not in owner/name form", model))
            })?;
        Ok(format!(
            "{}/models/{}/{}/predictions",
            self.base_url, owner, name
        ))
    }

    /// Starts a prediction. With `Prefer: wait` the API usually holds the
    /// connection until the prediction has finished.
    pub async fn create(&self, model: &str, input: &PredictionInput) -> Result<Prediction> {
        let url = self.model_url(model)?;
        log::info!("Creating prediction with model: {}", model);

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.token.expose())
            .header("Prefer", "wait")
            .json(&CreatePredictionRequest { input })
            .send()
            .await?;

        read_prediction(response).await
    }

    pub async fn get(&self, url: &str) -> Result<Prediction> {
        let response = self
            .http
            .get(url)
            .bearer_auth(self.token.expose())
            .send()
            .await?;

        read_prediction(response).await
    }

    /// Polls until the prediction reaches a terminal status. There is no deadline;
    /// the provider decides how long generation takes.
    pub async fn wait(&self, mut prediction: Prediction) -> Result<Prediction> {
        while !prediction.status.is_terminal() {
            let url = prediction
                .urls
                .get
                .clone()
                .unwrap_or_else(|| format!("{}/predictions/{}", self.base_url, prediction.id));

            log::debug!(
                "Prediction {} is {:?}, polling again in {}ms",
                prediction.id,
                prediction.status,
                self.poll_interval.as_millis()
            );
            tokio::time::sleep(self.poll_interval).await;
            prediction = self.get(&url).await?;
        }

        Ok(prediction)
    }
}

#[async_trait]
impl PredictionProvider for PredictionClient {
    async fn run(&self, model: &str, input: &PredictionInput) -> Result<Value> {
        let prediction = self.create(model, input).await?;
        let prediction = self.wait(prediction).await?;

        match prediction.status {
            PredictionStatus::Succeeded => {
                log::info!("Prediction {} succeeded", prediction.id);
                Ok(prediction.output.unwrap_or(Value::Null))
            }
            PredictionStatus::Canceled => Err(FluxError::PredictionFailed {
                message: prediction
                    .error_message()
                    .unwrap_or_else(|| "prediction was canceled".into()),
                id: prediction.id,
            }),
            _ => Err(FluxError::PredictionFailed {
                message: prediction
                    .error_message()
                    .unwrap_or_else(|| "unknown error".into()),
                id: prediction.id,
            }),
        }
    }
}

async fn read_prediction(response: reqwest::Response) -> Result<Prediction> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .ok()
            .and_then(|body| body.message())
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    status.canonical_reason().unwrap_or("unknown error").to_string()
                } else {
                    body.trim().to_string()
                }
            });
        log::error!("Replicate API returned {}: {}", status, message);
        return Err(FluxError::Provider {
            status: status.as_u16(),
            message,
        });
    }

    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> PredictionClient {
        PredictionClient::new(
            reqwest::Client::new(),
            ApiToken::new("r8_test"),
            "https://api.replicate.com/v1",
            Duration::from_millis(10),
        )
    }

    #[test]
    fn test_model_url() {
        assert_eq!(
            client().model_url("black-forest-labs/flux-1.1-pro").unwrap(),
            "https://api.replicate.com/v1/models/black-forest-labs/flux-1.1-pro/predictions"
        );
    }

    #[test]
    fn test_model_url_rejects_bare_name() {
        assert!(client().model_url("flux-1.1-pro").is_err());
        assert!(client().model_url("/flux").is_err());
    }
}
