pub mod handlers;
pub mod render;

use crate::{
    config::{Config, API_TOKEN_VAR},
    error::{FluxError, Result},
    orchestrator::Orchestrator,
    replicate::ReplicateClient,
};
use actix_web::{
    http::{header::ContentType, StatusCode},
    middleware, web, App, HttpResponse, HttpServer, ResponseError,
};
use render::PageRenderer;
use serde_json::json;

pub use render::FormValues;

pub enum AppState {
    Ready(Orchestrator),
    /// The credential is missing: no form is served until the service is
    /// restarted with it.
    Misconfigured { message: String },
}

pub struct ServerState {
    pub app: AppState,
    pub pages: PageRenderer,
}

impl ServerState {
    pub fn new(app: AppState) -> Result<Self> {
        Ok(Self {
            app,
            pages: PageRenderer::new()?,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let app = match ReplicateClient::new(&config.replicate) {
            Ok(client) => AppState::Ready(Orchestrator::from_client(client, config.output_format)),
            Err(e) if e.is_fatal() => {
                log::error!("🛑 {}", e);
                log::error!(
                    "💡 Set the {} environment variable in your deployment and restart",
                    API_TOKEN_VAR
                );
                AppState::Misconfigured {
                    message: e.to_string(),
                }
            }
            Err(e) => return Err(e),
        };
        Self::new(app)
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::index))
        .route("/generate", web::post().to(handlers::generate))
        .route("/health", web::get().to(handlers::health));
}

pub async fn run(config: Config) -> Result<()> {
    let state = web::Data::new(ServerState::from_config(&config)?);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::new("%r %s %Dms"))
            .configure(configure)
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await?;

    Ok(())
}

impl ResponseError for FluxError {
    fn status_code(&self) -> StatusCode {
        match self {
            FluxError::ConfigurationMissing(_) => StatusCode::SERVICE_UNAVAILABLE,
            FluxError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            FluxError::Provider { .. }
            | FluxError::PredictionFailed { .. }
            | FluxError::Network(_)
            | FluxError::UnrecognizedResponse(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        log::error!("Request failed: {:?}", self);
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(json!({
                "error": self.to_string(),
                "category": self.category(),
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{OutputFormat, PredictionInput},
        replicate::{ImageFetcher, PredictionProvider},
    };
    use actix_web::test;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PredictionProvider for CountingProvider {
        async fn run(&self, _model: &str, input: &PredictionInput) -> Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if input.prompt == "fail" {
                return Err(FluxError::Provider {
                    status: 422,
                    message: "Prediction input failed validation".into(),
                });
            }
            Ok(json!("https://replicate.delivery/out-0.webp"))
        }
    }

    struct StaticFetcher;

    #[async_trait]
    impl ImageFetcher for StaticFetcher {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
            Ok(b"RIFF\x00\x00\x00\x00WEBP".to_vec())
        }
    }

    fn ready_state(provider: Arc<CountingProvider>) -> web::Data<ServerState> {
        let orchestrator = Orchestrator::new(provider, Arc::new(StaticFetcher), OutputFormat::Webp);
        web::Data::new(ServerState::new(AppState::Ready(orchestrator)).unwrap())
    }

    fn provider() -> Arc<CountingProvider> {
        Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
        })
    }

    async fn body_text(resp: actix_web::dev::ServiceResponse) -> String {
        let bytes = test::read_body(resp).await;
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[actix_web::test]
    async fn test_index_renders_form() {
        let app = test::init_service(
            App::new()
                .app_data(ready_state(provider()))
                .configure(configure),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("<form"));
    }

    #[actix_web::test]
    async fn test_generate_success_offers_download() {
        let provider = provider();
        let app = test::init_service(
            App::new()
                .app_data(ready_state(provider.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/generate")
            .set_form([("prompt", "A red bicycle on a beach"), ("seed", "42")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_text(resp).await;
        assert!(body.contains("generated_image_42.webp"));
        assert!(body.contains("A red bicycle on a beach"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[actix_web::test]
    async fn test_empty_prompt_warns_without_calling() {
        let provider = provider();
        let app = test::init_service(
            App::new()
                .app_data(ready_state(provider.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/generate")
            .set_form([("prompt", ""), ("seed", "42")])
            .to_request();
        let body = body_text(test::call_service(&app, req).await).await;

        assert!(body.contains("Please enter a prompt"));
        assert!(body.contains("<form"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[actix_web::test]
    async fn test_provider_error_page_keeps_form() {
        let app = test::init_service(
            App::new()
                .app_data(ready_state(provider()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/generate")
            .set_form([("prompt", "fail"), ("seed", "1")])
            .to_request();
        let body = body_text(test::call_service(&app, req).await).await;

        assert!(body.contains("Prediction input failed validation"));
        assert!(body.contains("Error type: ProviderError"));
        assert!(body.contains("<form"));
    }

    #[actix_web::test]
    async fn test_missing_token_serves_config_error_only() {
        let config = Config::new();
        let state = web::Data::new(ServerState::from_config(&config).unwrap());
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        for req in [
            test::TestRequest::get().uri("/").to_request(),
            test::TestRequest::post()
                .uri("/generate")
                .set_form([("prompt", "a cat"), ("seed", "42")])
                .to_request(),
        ] {
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
            let body = body_text(resp).await;
            assert!(!body.contains("<form"));
            assert!(body.contains("REPLICATE_API_TOKEN"));
        }

        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        let health: Value = test::read_body_json(resp).await;
        assert_eq!(health["configured"], json!(false));
    }

    #[actix_web::test]
    async fn test_error_status_codes() {
        assert_eq!(
            FluxError::InvalidInput("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            FluxError::UnrecognizedResponse(json!([])).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            FluxError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
