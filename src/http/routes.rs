use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::header::{HeaderName, AUTHORIZATION};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::error::{log_inference_error, ErrorCode, FeatureError, InferenceError};
use crate::inference::{InferencePipeline, ModelHandle, Prediction};

/// Largest accepted upload
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Multipart field carrying the audio file
const UPLOAD_FIELD: &str = "file";

/// Shared application state for HTTP handlers.
#[derive(Clone)]
pub struct ServingState {
    pipeline: Arc<InferencePipeline>,
    model: Arc<ModelHandle>,
    token: Arc<String>,
}

impl ServingState {
    pub fn new(pipeline: Arc<InferencePipeline>, model: Arc<ModelHandle>, token: String) -> Self {
        Self {
            pipeline,
            model,
            token: Arc::new(token),
        }
    }

    fn authorize(
        &self,
        headers: &HeaderMap,
        query_token: Option<&str>,
    ) -> Result<(), HttpServerError> {
        let provided = extract_token(headers, query_token);
        match provided {
            Some(value) if value == *self.token => Ok(()),
            _ => Err(HttpServerError::Unauthorized),
        }
    }
}

/// Query payload for extracting token from URL.
#[derive(Debug, Default, Deserialize)]
pub struct AuthQuery {
    pub token: Option<String>,
}

/// HTTP error variants mapped to JSON responses.
#[derive(Debug)]
pub enum HttpServerError {
    Unauthorized,
    BadRequest(String),
    Unprocessable { code: i32, message: String },
    ServiceUnavailable { code: i32, message: String },
    Internal { code: i32, message: String },
}

impl From<InferenceError> for HttpServerError {
    fn from(err: InferenceError) -> Self {
        let code = err.code();
        let message = err.message();
        match err {
            InferenceError::Decode { .. }
            | InferenceError::Feature(FeatureError::EmptyInput { .. })
            | InferenceError::Feature(FeatureError::NonFiniteOutput { .. }) => {
                Self::Unprocessable { code, message }
            }
            InferenceError::ModelNotLoaded => Self::ServiceUnavailable { code, message },
            _ => Self::Internal { code, message },
        }
    }
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                None,
                "missing or invalid token".to_string(),
            ),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, None, msg),
            Self::Unprocessable { code, message } => {
                (StatusCode::UNPROCESSABLE_ENTITY, Some(code), message)
            }
            Self::ServiceUnavailable { code, message } => {
                (StatusCode::SERVICE_UNAVAILABLE, Some(code), message)
            }
            Self::Internal { code, message } => {
                (StatusCode::INTERNAL_SERVER_ERROR, Some(code), message)
            }
        };

        (
            status,
            Json(serde_json::json!({ "error": message, "code": code })),
        )
            .into_response()
    }
}

/// Health endpoint response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
    pub input_shape: [usize; 3],
}

/// Labels endpoint response payload.
#[derive(Debug, Serialize)]
pub struct LabelsResponse {
    pub labels: Vec<String>,
    pub unknown_label: String,
    pub unknown_threshold_percent: f32,
}

/// Reload acknowledgement payload.
#[derive(Debug, Serialize)]
pub struct ReloadAck {
    pub reloaded: bool,
}

/// Build the Axum router with all handlers.
pub fn build_router(state: ServingState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/labels", get(labels))
        .route("/predict", post(predict))
        .route("/admin/reload", post(reload))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Run the HTTP server loop until Ctrl-C.
pub async fn run_http_server(state: ServingState, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("binding HTTP listener")?;
    let router = build_router(state);
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("[HTTP] Shutdown signal received");
        })
        .await
        .context("serving HTTP router")?;
    Ok(())
}

pub async fn health(State(state): State<ServingState>) -> Json<HealthResponse> {
    let (batch, frames, width) = state.pipeline.batch_shape();
    Json(HealthResponse {
        status: "ok",
        model_loaded: state.model.is_loaded(),
        input_shape: [batch, frames, width],
    })
}

pub async fn labels(State(state): State<ServingState>) -> Json<LabelsResponse> {
    // Never trigger a load from here; that happens on the blocking pool
    let model = state.model.is_loaded().then(|| state.model.get().ok()).flatten();
    let labels = model
        .as_ref()
        .and_then(|model| model.labels().map(<[String]>::to_vec))
        .unwrap_or_else(|| state.pipeline.labels().to_vec());
    let policy = state.pipeline.policy();
    Json(LabelsResponse {
        labels,
        unknown_label: policy.unknown_label.clone(),
        unknown_threshold_percent: policy.threshold_percent,
    })
}

pub async fn predict(
    State(state): State<ServingState>,
    mut multipart: Multipart,
) -> Result<Json<Prediction>, HttpServerError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| HttpServerError::BadRequest(err.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let name = field.file_name().unwrap_or("upload").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| HttpServerError::BadRequest(err.to_string()))?;
        upload = Some((name, bytes));
        break;
    }

    let Some((name, bytes)) = upload else {
        return Err(HttpServerError::BadRequest(format!(
            "multipart field '{}' is required",
            UPLOAD_FIELD
        )));
    };
    if bytes.is_empty() {
        return Err(HttpServerError::BadRequest("uploaded file is empty".to_string()));
    }

    let pipeline = Arc::clone(&state.pipeline);
    let model = Arc::clone(&state.model);
    let prediction = tokio::task::spawn_blocking(move || {
        let model = model.get()?;
        pipeline.classify_bytes(model.as_ref(), &bytes, &name)
    })
    .await
    .map_err(|err| HttpServerError::Internal {
        code: 0,
        message: format!("prediction task failed: {}", err),
    })?
    .map_err(|err| {
        log_inference_error(&err, "POST /predict");
        HttpServerError::from(err)
    })?;

    log::info!(
        "[HTTP] Predicted '{}' (top '{}')",
        prediction.label,
        prediction.top_label
    );
    Ok(Json(prediction))
}

pub async fn reload(
    State(state): State<ServingState>,
    Query(query): Query<AuthQuery>,
    headers: HeaderMap,
) -> Result<Json<ReloadAck>, HttpServerError> {
    state.authorize(&headers, query.token.as_deref())?;

    let model = Arc::clone(&state.model);
    tokio::task::spawn_blocking(move || model.reload())
        .await
        .map_err(|err| HttpServerError::Internal {
            code: 0,
            message: format!("reload task failed: {}", err),
        })??;

    Ok(Json(ReloadAck { reloaded: true }))
}

fn extract_token(headers: &HeaderMap, query_token: Option<&str>) -> Option<String> {
    if let Some(token) = query_token {
        return Some(token.to_string());
    }

    static X_ADMIN_TOKEN: HeaderName = HeaderName::from_static("x-admin-token");

    headers
        .get(&X_ADMIN_TOKEN)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
        .or_else(|| {
            headers
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|raw| raw.strip_prefix("Bearer ").map(|v| v.to_string()))
        })
}
