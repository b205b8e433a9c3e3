use crate::config::ApiConfig;
use crate::error::Error;
use crate::services::CameraIngestService;
use anyhow::Result;
use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Path as UrlPath, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::info;
use serde::Serialize;
use serde_json::Value;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeFile;

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub ingest: CameraIngestService,
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    pub status: u16,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        ApiError {
            fields: err.fields().map(|fields| fields.to_vec()),
            error: err.to_string(),
            status: status.as_u16(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError {
            error: format!("Invalid JSON body: {}", rejection.body_text()),
            fields: None,
            status: StatusCode::BAD_REQUEST.as_u16(),
        }
    }
}

/// Implement IntoResponse for ApiError
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(self);
        (status, body).into_response()
    }
}

/// Build the HTTP router.
///
/// `files_root` backs `GET /app/<folder>/<camera_id>/<filename>`.
pub fn router(state: AppState, files_root: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_credentials(false)
        .max_age(Duration::from_secs(3600));

    let files = Router::new()
        .route("/app/:folder/:camera_id/:filename", get(serve_camera_file))
        .with_state(Arc::new(files_root.to_path_buf()));

    Router::new()
        .route("/EventCameraDetails", post(update_camera_details))
        .with_state(state)
        .merge(files)
        .layer(cors)
}

pub struct RestApi {
    config: ApiConfig,
    files_root: PathBuf,
    state: AppState,
}

impl RestApi {
    pub fn new(config: &ApiConfig, files_root: &Path, ingest: CameraIngestService) -> Self {
        Self {
            config: config.clone(),
            files_root: files_root.to_path_buf(),
            state: AppState { ingest },
        }
    }

    /// Serve until Ctrl-C
    pub async fn run(self) -> Result<()> {
        let app = router(self.state, &self.files_root);

        let addr: SocketAddr = format!("{}:{}", self.config.address, self.config.port).parse()?;
        info!("API server listening on {}", addr);

        axum::Server::bind(&addr)
            .serve(app.into_make_service())
            .with_graceful_shutdown(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    log::error!("Failed to listen for shutdown signal: {}", e);
                }
                info!("Shutting down...");
            })
            .await?;

        Ok(())
    }
}

async fn update_camera_details(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let Json(body) = payload?;

    let report = state.ingest.ingest(&body).await?;
    info!(
        "Camera batch accepted: {} published, {} failed",
        report.published, report.failed
    );

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Cameras added/updated successfully!".to_string(),
        }),
    ))
}

/// A single decoded path segment that cannot leave its parent directory
fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && !segment.contains("..")
        && !segment.contains(['/', '\\', '\0'])
}

async fn serve_camera_file(
    State(files_root): State<Arc<PathBuf>>,
    UrlPath((folder, camera_id, filename)): UrlPath<(String, String, String)>,
    request: Request<Body>,
) -> Response {
    if ![&folder, &camera_id, &filename].iter().all(|s| is_plain_segment(s)) {
        return StatusCode::NOT_FOUND.into_response();
    }

    let path = files_root.join(folder).join(camera_id).join(filename);
    match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}
