use crate::error::{FluxError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Replicate model that performs the generation.
pub const MODEL_ID: &str = "black-forest-labs/flux-1.1-pro";

pub const SEED_MIN: u32 = 0;
pub const SEED_MAX: u32 = 100_000;
pub const DEFAULT_SEED: u32 = 42;

pub const ASPECT_RATIO: &str = "1:1";
pub const OUTPUT_QUALITY: u8 = 80;
pub const SAFETY_TOLERANCE: f32 = 2.0;
pub const PROMPT_UPSAMPLING: bool = true;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpg,
    #[default]
    Webp,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpg => "jpg",
            OutputFormat::Webp => "webp",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Jpg => "image/jpeg",
            OutputFormat::Webp => "image/webp",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = FluxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(OutputFormat::Jpg),
            "webp" => Ok(OutputFormat::Webp),
            other => Err(FluxError::InvalidInput(format!(
                "unsupported output format '{}', expected 'jpg' or 'webp'",
                other
            ))),
        }
    }
}

/// A validated generation request. Only `prompt` and `seed` come from the user.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub seed: u32,
    pub output_format: OutputFormat,
}

impl GenerationRequest {
    /// Validates user input. Nothing reaches the provider unless this succeeds.
    pub fn new(prompt: impl Into<String>, seed: u32, output_format: OutputFormat) -> Result<Self> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(FluxError::InvalidInput(
                "Please enter a prompt to generate the image.".into(),
            ));
        }
        if !(SEED_MIN..=SEED_MAX).contains(&seed) {
            return Err(FluxError::InvalidInput(format!(
                "Seed must be between {} and {}, got {}.",
                SEED_MIN, SEED_MAX, seed
            )));
        }

        Ok(Self {
            prompt,
            seed,
            output_format,
        })
    }

    pub fn to_input(&self) -> PredictionInput {
        PredictionInput {
            seed: self.seed,
            prompt: self.prompt.clone(),
            aspect_ratio: ASPECT_RATIO.to_string(),
            output_format: self.output_format,
            output_quality: OUTPUT_QUALITY,
            safety_tolerance: SAFETY_TOLERANCE,
            prompt_upsampling: PROMPT_UPSAMPLING,
        }
    }
}

/// The `input` object sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionInput {
    pub seed: u32,
    pub prompt: String,
    pub aspect_ratio: String,
    pub output_format: OutputFormat,
    pub output_quality: u8,
    pub safety_tolerance: f32,
    pub prompt_upsampling: bool,
}
