use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, get_service, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;

use crate::{llm::ProviderKind, models::Message, router::RequestRouter, telemetry};

/** \brief Request bodies carry base64 images, so the ceiling is generous. */
pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

type SharedRouter = Arc<RequestRouter>;

/**
 * \brief Start the HTTP service: the analyze API plus the static client build.
 * \param addr listen address, e.g. "127.0.0.1:5173"
 * \param ui_dir directory of the static client build
 */
pub async fn run(addr: &str, router: RequestRouter, ui_dir: &str) -> Result<()> {
    let app = app_with_ui(router, ui_dir);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/**
 * \brief API routes with unmatched paths falling back to files under `ui_dir`.
 */
pub fn app_with_ui(router: RequestRouter, ui_dir: &str) -> Router {
    let static_service =
        get_service(ServeDir::new(ui_dir).append_index_html_on_directories(true));
    app(router).fallback_service(static_service)
}

/**
 * \brief API routes without the static fallback.
 */
pub fn app(router: RequestRouter) -> Router {
    let shared: SharedRouter = Arc::new(router);
    Router::new()
        .route("/api/analyze", post(analyze))
        .route("/api/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(shared)
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub system_instruction: String,
    #[serde(default)]
    pub language: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AnalyzeResponse {
    pub text: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize, Debug)]
struct HealthResponse {
    ok: bool,
    providers: Vec<ProviderKind>,
    fallback: bool,
}

/**
 * \brief POST /api/analyze: run the conversation through the router.
 */
async fn analyze(
    State(router): State<SharedRouter>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Json(req) = payload.map_err(internal_err)?;
    telemetry::log_event(
        "server.analyze",
        &format!(
            "messages={} language={} instruction_len={}",
            req.messages.len(),
            req.language,
            req.system_instruction.len()
        ),
    );
    let text = router
        .analyze(&req.messages, &req.system_instruction, &req.language)
        .await
        .map_err(internal_err)?;
    Ok(Json(AnalyzeResponse { text }))
}

async fn health(State(router): State<SharedRouter>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: router.is_configured(),
        providers: router.providers(),
        fallback: router.fallback_on_error(),
    })
}

fn internal_err<E: std::fmt::Display>(e: E) -> (StatusCode, Json<ErrorResponse>) {
    telemetry::log_error("server.analyze", &e.to_string());
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}
