//! Turns one form submission into one page state.
//!
//! Every submission runs validate → call provider → decode output → fetch bytes,
//! and every failure along the way is converted into a [`ViewState`] instead of
//! propagating. Nothing is kept between submissions.

use crate::{
    error::{FluxError, Result},
    models::{DownloadArtifact, GenerationRequest, ImageOutput, OutputFormat, DEFAULT_SEED, MODEL_ID},
    replicate::{ImageFetcher, PredictionProvider, ReplicateClient},
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Raw form fields as posted by the browser.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitForm {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub seed: Option<String>,
}

impl SubmitForm {
    pub fn seed_value(&self) -> Result<u32> {
        match self.seed.as_deref().map(str::trim) {
            None | Some("") => Ok(DEFAULT_SEED),
            Some(raw) => raw
                .parse()
                .map_err(|_| FluxError::InvalidInput(format!("Seed '{}' is not a whole number.", raw))),
        }
    }
}

#[derive(Debug, Clone)]
pub enum DownloadSlot {
    Ready(DownloadArtifact),
    /// The image is still shown; only the download could not be prepared.
    Failed { message: String },
}

#[derive(Debug, Clone)]
pub struct GeneratedView {
    pub prompt: String,
    pub seed: u32,
    pub image_url: String,
    pub download: DownloadSlot,
}

#[derive(Debug, Clone)]
pub enum ViewState {
    Idle,
    Warning { message: String },
    Failed { category: &'static str, message: String },
    Unrecognized { message: String, raw: String },
    Success(GeneratedView),
}

impl ViewState {
    pub fn from_error(error: &FluxError) -> Self {
        match error {
            FluxError::InvalidInput(message) => ViewState::Warning {
                message: message.clone(),
            },
            FluxError::UnrecognizedResponse(raw) => ViewState::Unrecognized {
                message: error.to_string(),
                raw: serde_json::to_string_pretty(raw).unwrap_or_else(|_| raw.to_string()),
            },
            other => ViewState::Failed {
                category: other.category(),
                message: other.to_string(),
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ViewState::Idle => "idle",
            ViewState::Warning { .. } => "warning",
            ViewState::Failed { .. } => "failed",
            ViewState::Unrecognized { .. } => "unrecognized",
            ViewState::Success(_) => "success",
        }
    }
}

#[derive(Clone)]
pub struct Orchestrator {
    provider: Arc<dyn PredictionProvider>,
    fetcher: Arc<dyn ImageFetcher>,
    output_format: OutputFormat,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn PredictionProvider>,
        fetcher: Arc<dyn ImageFetcher>,
        output_format: OutputFormat,
    ) -> Self {
        Self {
            provider,
            fetcher,
            output_format,
        }
    }

    pub fn from_client(client: ReplicateClient, output_format: OutputFormat) -> Self {
        Self::new(
            Arc::new(client.predictions().clone()),
            Arc::new(client.downloads().clone()),
            output_format,
        )
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub async fn submit_form(&self, form: &SubmitForm) -> ViewState {
        match form.seed_value() {
            Ok(seed) => self.submit(&form.prompt, seed).await,
            Err(e) => {
                log::warn!("Rejected submission: {}", e);
                ViewState::from_error(&e)
            }
        }
    }

    pub async fn submit(&self, prompt: &str, seed: u32) -> ViewState {
        let submission = Uuid::new_v4();

        let request = match GenerationRequest::new(prompt, seed, self.output_format) {
            Ok(request) => request,
            Err(e) => {
                log::warn!("[{}] Rejected submission: {}", submission, e);
                return ViewState::from_error(&e);
            }
        };

        log::info!(
            "[{}] Generating image with prompt: '{}' and seed: {}",
            submission,
            request.prompt,
            request.seed
        );

        let image_url = match self.generate(&request).await {
            Ok(url) => url,
            Err(e) => {
                log::error!("[{}] Generation failed ({}): {}", submission, e.category(), e);
                return ViewState::from_error(&e);
            }
        };

        let download = match self.fetcher.fetch(&image_url).await {
            Ok(bytes) => DownloadSlot::Ready(DownloadArtifact::new(
                request.seed,
                self.output_format,
                bytes,
            )),
            Err(e) => {
                log::error!("[{}] Download preparation failed: {}", submission, e);
                DownloadSlot::Failed {
                    message: e.to_string(),
                }
            }
        };

        ViewState::Success(GeneratedView {
            prompt: request.prompt,
            seed: request.seed,
            image_url,
            download,
        })
    }

    /// Runs the model and resolves the image location from its output.
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let output = {
            let _timer = crate::logger::timer("replicate prediction");
            self.provider.run(MODEL_ID, &request.to_input()).await?
        };
        log::debug!("Raw model output: {}", output);

        match ImageOutput::decode(output) {
            ImageOutput::Unrecognized(raw) => Err(FluxError::UnrecognizedResponse(raw)),
            decoded => decoded
                .primary_location()
                .map(str::to_string)
                .ok_or_else(|| FluxError::Internal("decoded output has no location".into())),
        }
    }
}
