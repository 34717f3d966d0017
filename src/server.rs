//! HTTP surface: routes, the conversion handler and error → response mapping.
//!
//! | Route               | Handler                         |
//! |---------------------|---------------------------------|
//! | `GET /`             | `{static_dir}/index.html`       |
//! | `POST /api/convert` | [`convert_pdf`]                 |
//! | `GET /api/health`   | [`health_check`]                |
//! | `GET /static/*`     | files under `static_dir`        |
//!
//! Every failure leaves as JSON `{"detail": "..."}` with status 400 or 500,
//! chosen by [`Pdf2JpgError::is_client_error`].

use crate::config::{ConversionParams, ServerConfig};
use crate::convert::convert_upload;
use crate::error::Pdf2JpgError;
use crate::pipeline::input::{check_filename, check_not_empty, Upload};
use crate::pipeline::render::PageRenderer;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub renderer: Arc<dyn PageRenderer>,
}

impl AppState {
    pub fn new(config: ServerConfig, renderer: Arc<dyn PageRenderer>) -> Self {
        Self {
            config: Arc::new(config),
            renderer,
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let index = ServeFile::new(state.config.index_file());
    let assets = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route_service("/", index)
        .route("/api/convert", post(convert_pdf))
        .route("/api/health", get(health_check))
        .nest_service("/static", assets)
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind, serve until Ctrl-C, then drain in-flight requests.
pub async fn serve(config: ServerConfig, renderer: Arc<dyn PageRenderer>) -> std::io::Result<()> {
    if !config.index_file().exists() {
        warn!(
            "Front-end page {} not found; GET / will return 404",
            config.index_file().display()
        );
    }

    let listener = tokio::net::TcpListener::bind(config.socket_addr()).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    let app = router(AppState::new(config, renderer));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

// ── Handlers ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct HealthBody {
    pub status: &'static str,
}

/// Liveness probe.
pub async fn health_check() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

/// Raw multipart fields before validation.
#[derive(Default)]
struct ConvertForm {
    filename: Option<String>,
    data: Vec<u8>,
    dpi: Option<String>,
    quality: Option<String>,
}

async fn read_form(multipart: &mut Multipart) -> Result<ConvertForm, Pdf2JpgError> {
    let mut form = ConvertForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Pdf2JpgError::ReadFailed(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                form.filename = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Pdf2JpgError::ReadFailed(e.body_text()))?;
                form.data = Vec::from(bytes);
            }
            "dpi" | "quality" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| Pdf2JpgError::ReadFailed(e.body_text()))?;
                if name == "dpi" {
                    form.dpi = Some(text);
                } else {
                    form.quality = Some(text);
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

/// `POST /api/convert`: multipart `file`, optional `dpi` and `quality`.
pub async fn convert_pdf(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let mut multipart = multipart.map_err(|e| Pdf2JpgError::ReadFailed(e.body_text()))?;
    let form = read_form(&mut multipart).await?;

    let filename = check_filename(form.filename.as_deref())?.to_string();
    let params = ConversionParams::from_form(form.dpi.as_deref(), form.quality.as_deref())?;
    check_not_empty(&form.data)?;

    let upload = Upload::new(filename, form.data)?;
    let output = convert_upload(upload, params, Arc::clone(&state.renderer)).await?;

    let disposition = HeaderValue::from_str(&output.content_disposition())
        .map_err(|e| Pdf2JpgError::Internal(format!("Bad Content-Disposition: {e}")))?;

    Ok((
        [
            (CONTENT_TYPE, HeaderValue::from_static("application/zip")),
            (CONTENT_DISPOSITION, disposition),
        ],
        output.archive,
    )
        .into_response())
}

// ── Errors ───────────────────────────────────────────────────────────────

/// A [`Pdf2JpgError`] on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub Pdf2JpgError);

impl From<Pdf2JpgError> for ApiError {
    fn from(e: Pdf2JpgError) -> Self {
        ApiError(e)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = self.0.to_string();
        let status = if self.0.is_client_error() {
            warn!("rejected request: {detail}");
            StatusCode::BAD_REQUEST
        } else {
            // The renderer's own message is passed through to the caller.
            error!("conversion failed: {:?}", self.0);
            StatusCode::INTERNAL_SERVER_ERROR
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn client_errors_are_400_with_detail() {
        let resp = ApiError(Pdf2JpgError::EmptyFile).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["detail"], "file is empty");
    }

    #[tokio::test]
    async fn render_failures_are_500_and_keep_the_reason() {
        let resp = ApiError(Pdf2JpgError::RenderFailed("engine exploded".into())).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let detail = body_json(resp).await["detail"].as_str().unwrap().to_string();
        assert!(detail.contains("engine exploded"), "got: {detail}");
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let Json(body) = health_check().await;
        assert_eq!(body.status, "ok");
    }
}
