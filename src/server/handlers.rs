use super::{AppState, ServerState};
use crate::{
    error::FluxError,
    models::DEFAULT_SEED,
    orchestrator::{SubmitForm, ViewState},
    server::render::FormValues,
};
use actix_web::{http::header::ContentType, http::StatusCode, web, HttpResponse};
use serde_json::json;

fn html(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .insert_header(ContentType::html())
        .body(body)
}

fn config_error_page(state: &ServerState, message: &str) -> Result<HttpResponse, FluxError> {
    let body = state.pages.render_config_error(message)?;
    Ok(html(StatusCode::SERVICE_UNAVAILABLE, body))
}

pub async fn index(state: web::Data<ServerState>) -> Result<HttpResponse, FluxError> {
    match &state.app {
        AppState::Misconfigured { message } => config_error_page(&state, message),
        AppState::Ready(_) => {
            let body = state
                .pages
                .render(&ViewState::Idle, &FormValues::default())?;
            Ok(html(StatusCode::OK, body))
        }
    }
}

pub async fn generate(
    state: web::Data<ServerState>,
    form: web::Form<SubmitForm>,
) -> Result<HttpResponse, FluxError> {
    let orchestrator = match &state.app {
        AppState::Misconfigured { message } => return config_error_page(&state, message),
        AppState::Ready(orchestrator) => orchestrator,
    };

    let form = form.into_inner();
    let view = orchestrator.submit_form(&form).await;
    log::info!("Submission finished in state '{}'", view.name());

    let values = FormValues {
        seed: form.seed_value().unwrap_or(DEFAULT_SEED),
        prompt: form.prompt,
    };
    let body = state.pages.render(&view, &values)?;
    Ok(html(StatusCode::OK, body))
}

pub async fn health(state: web::Data<ServerState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "configured": matches!(state.app, AppState::Ready(_)),
    }))
}
