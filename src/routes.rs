use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    controllers::{Outcome, Snapshot},
    encoder,
    error::EncodingError,
    models::{AspectRatio, EditParams, GenerateParams, ImageAsset, MockupParams, View, EDIT_SUGGESTIONS, PRODUCTS, STYLES},
    shell::Shell,
};

/// Uploads above this are refused by the HTTP layer before encoding.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub shell: Arc<Shell>,
}

#[derive(Debug, Serialize)]
pub struct TriggerResponse<P> {
    pub outcome: Outcome,
    pub state: Snapshot<P>,
}

#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub view: View,
}

#[derive(Debug, Deserialize)]
pub struct KeyPress {
    pub key: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/options", get(options))
        .route("/api/view", get(get_view).put(navigate))
        .route("/api/mockup", get(mockup_state))
        .route("/api/mockup/source", post(mockup_source))
        .route("/api/mockup/params", put(mockup_params))
        .route("/api/mockup/generate", post(mockup_generate))
        .route("/api/editor", get(editor_state))
        .route("/api/editor/source", post(editor_source))
        .route("/api/editor/instruction", put(editor_instruction))
        .route("/api/editor/suggestion/:index", post(editor_suggestion))
        .route("/api/editor/edit", post(editor_edit))
        .route("/api/editor/key", post(editor_key))
        .route("/api/editor/promote", post(editor_promote))
        .route("/api/editor/reset", post(editor_reset))
        .route("/api/generator", get(generator_state))
        .route("/api/generator/params", put(generator_params))
        .route("/api/generator/generate", post(generator_generate))
        .route("/api/results/:view", get(download_result))
        .route("/api/notices/:view", delete(dismiss_notice))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}

/// Accepts either a binary `file` part or a `data_url` text part.
async fn read_upload(mut multipart: Multipart) -> Result<ImageAsset, EncodingError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| EncodingError::Upload(e.to_string()))? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().map(str::to_owned);
                let data = field.bytes().await.map_err(|e| EncodingError::Upload(e.to_string()))?;
                return Ok(encoder::encode_bytes(file_name, data));
            }
            Some("data_url") => {
                let text = field.text().await.map_err(|e| EncodingError::Upload(e.to_string()))?;
                return encoder::parse_data_url(&text);
            }
            _ => continue,
        }
    }
    Err(EncodingError::Upload("no `file` or `data_url` field in upload".into()))
}

pub async fn options(State(state): State<AppState>) -> Json<Value> {
    let aspect_ratios: Vec<_> = AspectRatio::ALL.iter().map(|r| r.as_str()).collect();
    Json(json!({
        "products": PRODUCTS,
        "styles": STYLES,
        "suggestions": EDIT_SUGGESTIONS,
        "aspect_ratios": aspect_ratios,
        "views": state.shell.nav_items(),
    }))
}

pub async fn get_view(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "active": state.shell.active(), "items": state.shell.nav_items() }))
}

pub async fn navigate(State(state): State<AppState>, Json(body): Json<NavigateRequest>) -> Json<Value> {
    state.shell.navigate(body.view);
    get_view(State(state)).await
}

// --- mockup ---

pub async fn mockup_state(State(state): State<AppState>) -> Json<Snapshot<MockupParams>> {
    Json(state.shell.mockup.snapshot())
}

pub async fn mockup_source(State(state): State<AppState>, multipart: Multipart) -> Json<Snapshot<MockupParams>> {
    state.shell.mockup.accept_encoded(read_upload(multipart).await);
    Json(state.shell.mockup.snapshot())
}

pub async fn mockup_params(State(state): State<AppState>, Json(body): Json<MockupParams>) -> Json<Snapshot<MockupParams>> {
    state.shell.mockup.set_params(body);
    Json(state.shell.mockup.snapshot())
}

pub async fn mockup_generate(State(state): State<AppState>) -> Json<TriggerResponse<MockupParams>> {
    let outcome = state.shell.mockup.generate().await;
    Json(TriggerResponse { outcome, state: state.shell.mockup.snapshot() })
}

// --- editor ---

pub async fn editor_state(State(state): State<AppState>) -> Json<Snapshot<EditParams>> {
    Json(state.shell.editor.snapshot())
}

pub async fn editor_source(State(state): State<AppState>, multipart: Multipart) -> Json<Snapshot<EditParams>> {
    state.shell.editor.accept_encoded(read_upload(multipart).await);
    Json(state.shell.editor.snapshot())
}

pub async fn editor_instruction(State(state): State<AppState>, Json(body): Json<EditParams>) -> Json<Snapshot<EditParams>> {
    state.shell.editor.set_instruction(body.instruction);
    Json(state.shell.editor.snapshot())
}

pub async fn editor_suggestion(
    Path(index): Path<usize>,
    State(state): State<AppState>,
) -> Result<Json<Snapshot<EditParams>>, StatusCode> {
    if !state.shell.editor.apply_suggestion(index) {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(state.shell.editor.snapshot()))
}

pub async fn editor_edit(State(state): State<AppState>) -> Json<TriggerResponse<EditParams>> {
    let outcome = state.shell.editor.edit().await;
    Json(TriggerResponse { outcome, state: state.shell.editor.snapshot() })
}

pub async fn editor_key(State(state): State<AppState>, Json(body): Json<KeyPress>) -> Json<TriggerResponse<EditParams>> {
    let outcome = state.shell.editor.key_press(&body.key).await;
    Json(TriggerResponse { outcome, state: state.shell.editor.snapshot() })
}

pub async fn editor_promote(State(state): State<AppState>) -> Json<Snapshot<EditParams>> {
    state.shell.editor.use_result_as_source();
    Json(state.shell.editor.snapshot())
}

pub async fn editor_reset(State(state): State<AppState>) -> Json<Snapshot<EditParams>> {
    state.shell.editor.reset();
    Json(state.shell.editor.snapshot())
}

// --- generator ---

pub async fn generator_state(State(state): State<AppState>) -> Json<Snapshot<GenerateParams>> {
    Json(state.shell.generator.snapshot())
}

pub async fn generator_params(State(state): State<AppState>, Json(body): Json<GenerateParams>) -> Json<Snapshot<GenerateParams>> {
    state.shell.generator.set_params(body);
    Json(state.shell.generator.snapshot())
}

pub async fn generator_generate(State(state): State<AppState>) -> Json<TriggerResponse<GenerateParams>> {
    let outcome = state.shell.generator.generate().await;
    Json(TriggerResponse { outcome, state: state.shell.generator.snapshot() })
}

// --- shared ---

pub async fn download_result(Path(view): Path<View>, State(state): State<AppState>) -> Response {
    let result = match view {
        View::Mockup => state.shell.mockup.result(),
        View::Editor => state.shell.editor.result(),
        View::Generator => state.shell.generator.result(),
    };
    let Some(asset) = result else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let mut headers = HeaderMap::new();
    if let Ok(value) = asset.mime_type.parse() {
        headers.insert(header::CONTENT_TYPE, value);
    }
    let disposition = format!("attachment; filename=\"{}\"", asset.download_name(view.download_prefix()));
    if let Ok(value) = disposition.parse() {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    (StatusCode::OK, headers, asset.bytes).into_response()
}

pub async fn dismiss_notice(Path(view): Path<View>, State(state): State<AppState>) -> StatusCode {
    match view {
        View::Mockup => state.shell.mockup.dismiss_notice(),
        View::Editor => state.shell.editor.dismiss_notice(),
        View::Generator => state.shell.generator.dismiss_notice(),
    }
    StatusCode::NO_CONTENT
}
