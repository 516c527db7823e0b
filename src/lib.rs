//! fluxgen: a one-page image generator backed by Flux 1.1 Pro on Replicate.
//!
//! The browser posts a prompt and a seed, the [`orchestrator::Orchestrator`] runs
//! the model through the [`replicate`] client, and the [`server`] renders either the
//! image with a download link or the error that stopped it.

pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod replicate;
pub mod server;

pub use config::{ApiToken, Config, ReplicateConfig, ServerConfig};
pub use error::{FluxError, Result};
pub use models::{
    DownloadArtifact, GenerationRequest, ImageOutput, OutputFormat, PredictionInput, MODEL_ID,
};
pub use orchestrator::{DownloadSlot, GeneratedView, Orchestrator, SubmitForm, ViewState};
pub use replicate::{
    DownloadClient, ImageFetcher, PredictionClient, PredictionProvider, ReplicateClient,
};
