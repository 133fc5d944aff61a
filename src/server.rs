use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::error::ApiError;
use crate::model::ClassifierAdapter;
use crate::suggest::{suggest_outfit, Suggestion};

const IMAGE_FIELD: &str = "image";

/// Shared, read-only request state. Built once before serving starts.
pub struct AppState {
    pub classifier: ClassifierAdapter,
}

impl AppState {
    pub fn new(classifier: ClassifierAdapter) -> Self {
        Self { classifier }
    }
}

pub fn build_router(state: Arc<AppState>, body_limit_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/predict", post(predict_handler))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

async fn predict_handler(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Suggestion>, ApiError> {
    let mut multipart = multipart.map_err(|err| ApiError::Multipart(err.body_text()))?;
    let image_data = read_image_field(&mut multipart).await?;

    respond(&state, &image_data).map(Json)
}

async fn read_image_field(multipart: &mut Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::UploadRead(err.to_string()))?
    {
        if field.name() == Some(IMAGE_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|err| ApiError::UploadRead(err.to_string()))?;
            return Ok(bytes.to_vec());
        }
    }
    Err(ApiError::MissingImage)
}

fn respond(state: &AppState, image_data: &[u8]) -> Result<Suggestion, ApiError> {
    let mut rng = rand::rng();

    let classification = state.classifier.classify(image_data, &mut rng)?;
    tracing::info!(
        category = %classification.label,
        source = ?classification.source,
        "classified uploaded item"
    );

    Ok(suggest_outfit(&classification.label, &mut rng))
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "OK",
        "model_loaded": state.classifier.has_model(),
    }))
}
