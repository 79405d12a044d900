//! HTTP API for previewing column pages and saving reviewed results.
//!
//! | Route | |
//! |---|---|
//! | `POST /api/columns/preview` | `{urls}` → scraped records, in input order |
//! | `POST /api/columns/batch` | `{columns}` → rows saved in one transaction |
//! | `GET /api/performance` | timing stats per operation |
//! | `DELETE /api/performance` | clear timing stats |
//! | `GET /healthz` | liveness |

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::app::{AppContext, AppError};
use crate::domain::{Column, NewColumn, PreviewRecord};
use crate::metrics::{ScrapeMetrics, TimingStats};
use crate::scraper::{BatchError, BatchScraper, BrowserLauncher};
use crate::store::ColumnStore;

pub struct AppState<L: BrowserLauncher> {
    pub scraper: Arc<BatchScraper<L>>,
    pub store: Arc<dyn ColumnStore>,
    pub metrics: Arc<ScrapeMetrics>,
}

impl<L: BrowserLauncher> Clone for AppState<L> {
    fn clone(&self) -> Self {
        Self {
            scraper: self.scraper.clone(),
            store: self.store.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PreviewRequest {
    urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct BatchRequest {
    columns: Vec<NewColumn>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchResponse {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    saved_data: Option<Vec<Column>>,
}

#[derive(Debug, Serialize)]
struct MessageBody {
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

pub fn router<L: BrowserLauncher + 'static>(state: AppState<L>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/columns/preview", post(preview_handler::<L>))
        .route("/api/columns/batch", post(batch_handler::<L>))
        .route(
            "/api/performance",
            get(performance_handler::<L>).delete(clear_performance_handler::<L>),
        )
        .with_state(state)
}

/// Serve the API on `bind` until Ctrl-C.
pub async fn serve(ctx: AppContext, bind: &str) -> crate::app::Result<()> {
    let addr: SocketAddr = bind
        .parse()
        .map_err(|_| AppError::Validation(format!("invalid bind address {bind}")))?;

    let state = AppState {
        scraper: Arc::new(ctx.batch_scraper()),
        store: ctx.store.clone(),
        metrics: ctx.metrics.clone(),
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("column-scout listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;
    Ok(())
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn preview_handler<L: BrowserLauncher + 'static>(
    State(state): State<AppState<L>>,
    payload: Result<Json<PreviewRequest>, JsonRejection>,
) -> Result<Json<Vec<PreviewRecord>>, ApiError> {
    let config = state.scraper.config();
    if !config.enabled {
        return Err(error_body(
            StatusCode::SERVICE_UNAVAILABLE,
            "column preview is disabled",
        ));
    }

    let Json(request) = payload.map_err(|e| {
        warn!("Rejected preview request: {}", e);
        bad_request("request body must be {\"urls\": [string]}")
    })?;

    match state.scraper.run(&request.urls, config.max_batch_urls).await {
        Ok(records) => Ok(Json(records)),
        Err(e @ BatchError::TooMany { .. }) => Err(bad_request(e.to_string())),
        Err(e @ BatchError::BrowserUnavailable(_)) => {
            error!("Preview batch failed: {}", e);
            Err(error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

async fn batch_handler<L: BrowserLauncher + 'static>(
    State(state): State<AppState<L>>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> (StatusCode, Json<BatchResponse>) {
    let columns = match payload {
        Ok(Json(request)) if !request.columns.is_empty() => request.columns,
        Ok(_) => return batch_failure(StatusCode::BAD_REQUEST, "no columns to save"),
        Err(e) => {
            warn!("Rejected batch request: {}", e);
            return batch_failure(StatusCode::BAD_REQUEST, "request body must be {\"columns\": [...]}");
        }
    };

    let store = state.store.clone();
    let result = tokio::task::spawn_blocking(move || store.insert_columns(&columns)).await;

    match result {
        Ok(Ok(saved)) => (
            StatusCode::OK,
            Json(BatchResponse {
                success: true,
                message: format!("Saved {} columns", saved.len()),
                saved_data: Some(saved),
            }),
        ),
        Ok(Err(AppError::Validation(message))) => batch_failure(StatusCode::BAD_REQUEST, message),
        Ok(Err(e)) => {
            error!("Failed to save columns: {}", e);
            batch_failure(StatusCode::INTERNAL_SERVER_ERROR, "failed to save columns")
        }
        Err(e) => {
            error!("Save task failed: {}", e);
            batch_failure(StatusCode::INTERNAL_SERVER_ERROR, "failed to save columns")
        }
    }
}

async fn performance_handler<L: BrowserLauncher + 'static>(
    State(state): State<AppState<L>>,
) -> Json<BTreeMap<String, TimingStats>> {
    Json(state.metrics.all_stats())
}

async fn clear_performance_handler<L: BrowserLauncher + 'static>(
    State(state): State<AppState<L>>,
) -> Json<MessageBody> {
    state.metrics.clear();
    info!("Performance stats cleared");
    Json(MessageBody {
        message: "Performance stats cleared".to_string(),
    })
}

fn batch_failure(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<BatchResponse>) {
    (
        status,
        Json(BatchResponse {
            success: false,
            message: message.into(),
            saved_data: None,
        }),
    )
}

fn bad_request(message: impl Into<String>) -> ApiError {
    error_body(StatusCode::BAD_REQUEST, message)
}

fn error_body(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}
