//! HTTP routes of the profile server
//!
//! | Method | Path            | Action                                  |
//! |--------|-----------------|-----------------------------------------|
//! | GET    | `/`             | 302 to `/index.html`                    |
//! | GET    | `/profile.json` | serialized snapshot of the recorder     |
//! | POST   | `/record`       | clear, then start recording             |
//! | POST   | `/stop`         | stop recording                          |
//! | GET    | `/<asset>`      | allow-listed front-end file, 404 otherwise |
//!
//! Handlers hold no profiling state; they call into the shared recorder.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use log::{debug, warn};

use super::assets::AssetBundle;
use crate::domain::AssetError;
use crate::export::render_or_placeholder;
use crate::profiling::SampleRecorder;

const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Clone)]
struct AppState {
    recorder: Arc<SampleRecorder>,
    assets: Arc<AssetBundle>,
}

/// Build the router for one server instance
pub fn router(recorder: Arc<SampleRecorder>, assets: AssetBundle) -> Router {
    let state = AppState {
        recorder,
        assets: Arc::new(assets),
    };

    Router::new()
        .route("/", get(index_redirect))
        .route("/profile.json", get(profile))
        .route("/record", post(record))
        .route("/stop", post(stop))
        .fallback(static_asset)
        .with_state(state)
}

async fn index_redirect() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, "/index.html")]).into_response()
}

async fn profile(State(state): State<AppState>) -> Response {
    let snapshot = state.recorder.snapshot();
    let body = render_or_placeholder(&snapshot);
    debug!("Serving profile ({} bytes)", body.len());
    ([(header::CONTENT_TYPE, JSON_CONTENT_TYPE)], body).into_response()
}

async fn record(State(state): State<AppState>) -> Response {
    state.recorder.clear();
    state.recorder.start();
    debug!("Recording requested");
    empty_json()
}

async fn stop(State(state): State<AppState>) -> Response {
    state.recorder.stop();
    debug!("Stop requested");
    empty_json()
}

async fn static_asset(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    if method != Method::GET {
        return StatusCode::NOT_FOUND.into_response();
    }

    let name = uri.path().trim_start_matches('/');
    match state.assets.load(name).await {
        Ok(asset) => ([(header::CONTENT_TYPE, asset.content_type)], asset.bytes).into_response(),
        Err(AssetError::NotFound(name)) => {
            debug!("Rejected request for unlisted resource {name:?}");
            StatusCode::NOT_FOUND.into_response()
        }
        Err(e) => {
            match state.assets.override_dir() {
                Some(dir) => warn!("{e} (resource dir {})", dir.display()),
                None => warn!("{e}"),
            }
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

fn empty_json() -> Response {
    (StatusCode::OK, [(header::CONTENT_TYPE, JSON_CONTENT_TYPE)]).into_response()
}
