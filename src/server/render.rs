use crate::{
    config::API_TOKEN_VAR,
    error::Result,
    models::{DEFAULT_SEED, MODEL_ID, SEED_MAX, SEED_MIN},
    orchestrator::{DownloadSlot, ViewState},
};
use minijinja::Environment;
use serde::Serialize;

const PAGE_TEMPLATE: &str = "index.html";

/// Values echoed back into the form so a failed submission can be retried.
#[derive(Debug, Clone)]
pub struct FormValues {
    pub prompt: String,
    pub seed: u32,
}

impl Default for FormValues {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            seed: DEFAULT_SEED,
        }
    }
}

#[derive(Serialize)]
struct DownloadContext {
    label: String,
    file_name: String,
    mime_type: &'static str,
    data_url: String,
}

#[derive(Serialize)]
struct ResultContext {
    prompt: String,
    seed: u32,
    image_url: String,
    download: Option<DownloadContext>,
    download_error: Option<String>,
}

#[derive(Serialize, Default)]
struct PageContext {
    model: &'static str,
    token_var: &'static str,
    config_error: Option<String>,
    prompt: String,
    seed: u32,
    seed_min: u32,
    seed_max: u32,
    state: &'static str,
    warning: Option<String>,
    error_message: Option<String>,
    error_category: Option<&'static str>,
    raw_output: Option<String>,
    result: Option<ResultContext>,
}

impl PageContext {
    fn base() -> Self {
        Self {
            model: MODEL_ID,
            token_var: API_TOKEN_VAR,
            seed: DEFAULT_SEED,
            seed_min: SEED_MIN,
            seed_max: SEED_MAX,
            state: "idle",
            ..Default::default()
        }
    }
}

pub struct PageRenderer {
    env: Environment<'static>,
}

impl PageRenderer {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template(PAGE_TEMPLATE, include_str!("../../templates/index.html"))?;
        Ok(Self { env })
    }

    pub fn render(&self, state: &ViewState, form: &FormValues) -> Result<String> {
        let mut context = PageContext::base();
        context.prompt = form.prompt.clone();
        context.seed = form.seed.clamp(SEED_MIN, SEED_MAX);
        context.state = state.name();

        match state {
            ViewState::Idle => {}
            ViewState::Warning { message } => context.warning = Some(message.clone()),
            ViewState::Failed { category, message } => {
                context.error_message = Some(message.clone());
                context.error_category = Some(*category);
            }
            ViewState::Unrecognized { message, raw } => {
                context.error_message = Some(message.clone());
                context.raw_output = Some(raw.clone());
            }
            ViewState::Success(view) => {
                let (download, download_error) = match &view.download {
                    DownloadSlot::Ready(artifact) => (
                        Some(DownloadContext {
                            label: artifact.label.clone(),
                            file_name: artifact.file_name.clone(),
                            mime_type: artifact.mime_type,
                            data_url: artifact.to_data_url(),
                        }),
                        None,
                    ),
                    DownloadSlot::Failed { message } => (None, Some(message.clone())),
                };
                context.result = Some(ResultContext {
                    prompt: view.prompt.clone(),
                    seed: view.seed,
                    image_url: view.image_url.clone(),
                    download,
                    download_error,
                });
            }
        }

        self.render_context(&context)
    }

    /// Page shown instead of the form while the credential is missing.
    pub fn render_config_error(&self, message: &str) -> Result<String> {
        let mut context = PageContext::base();
        context.config_error = Some(message.to_string());
        self.render_context(&context)
    }

    fn render_context(&self, context: &PageContext) -> Result<String> {
        let template = self.env.get_template(PAGE_TEMPLATE)?;
        Ok(template.render(context)?)
    }
}
