use std::sync::Arc;

use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use tower_http::limit::RequestBodyLimitLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use commerce_core::error::AppError;
use commerce_core::models::{SkipPolicy, SourceKind};
use commerce_core::pipeline::read_source;
use commerce_core::{CommercePipeline, PipelineOptions, compute_hash};
use commerce_parsers::CatalogParser;

use crate::dto::{FileProcessRequest, HealthResponse, ProcessRequest, ProcessedResponse};
use crate::error::ApiError;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Largest accepted request body; bundles can run to several megabytes.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

const MARKDOWN_CONTENT_TYPE: &str = "text/markdown; charset=utf-8";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Build the full router with all routes and middleware.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/v1/process", post(process))
        .route("/v1/process/from-file", post(process_from_file))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES));

    let public = Router::new()
        .route("/health", get(health))
        .route("/commerce.txt", get(commerce_txt))
        .route("/robots.txt", get(robots_txt))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    public.merge(api).with_state(state)
}

fn parse_kind(raw: &str) -> Result<SourceKind, AppError> {
    raw.parse().map_err(AppError::InvalidRequest)
}

fn join_error(e: tokio::task::JoinError) -> AppError {
    AppError::Generic(format!("Background task failed: {e}"))
}

fn check_max_items(max_items: Option<usize>) -> Result<Option<usize>, AppError> {
    match max_items {
        Some(0) => Err(AppError::InvalidRequest(
            "max_items must be at least 1".into(),
        )),
        other => Ok(other),
    }
}

// ---------------------------------------------------------------------------
// Processing
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/v1/process",
    request_body = ProcessRequest,
    responses(
        (status = 200, description = "Rendered Markdown and validated products", body = ProcessedResponse),
        (status = 400, description = "Bad request or item rejected under abort policy", body = crate::dto::ErrorResponse),
        (status = 422, description = "Source not recognized for the given kind", body = crate::dto::ErrorResponse),
    ),
    tag = "process"
)]
pub async fn process(
    body: Result<axum::Json<ProcessRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let axum::Json(body) = body?;
    let kind = parse_kind(&body.kind)?;
    let skip_policy = body
        .skip_policy
        .as_deref()
        .map(|raw| raw.parse::<SkipPolicy>().map_err(AppError::InvalidRequest))
        .transpose()?
        .unwrap_or_default();
    let options = PipelineOptions {
        skip_policy,
        limit: check_max_items(body.max_items)?,
    };

    let rendered = CommercePipeline::new(CatalogParser::for_kind(kind))
        .with_options(options)
        .build_markdown(&body.content, body.title.as_deref())?;

    tracing::info!(
        %kind,
        extracted = rendered.catalog.extracted_count(),
        skipped = rendered.catalog.skipped_count(),
        "Processed inline source"
    );

    Ok(axum::Json(ProcessedResponse::from(rendered)))
}

#[utoipa::path(
    post,
    path = "/v1/process/from-file",
    request_body = FileProcessRequest,
    responses(
        (status = 200, description = "Rendered Markdown and validated products", body = ProcessedResponse),
        (status = 400, description = "Bad path, kind or limit", body = crate::dto::ErrorResponse),
        (status = 404, description = "File not found", body = crate::dto::ErrorResponse),
        (status = 422, description = "Source not recognized for the given kind", body = crate::dto::ErrorResponse),
    ),
    tag = "process"
)]
pub async fn process_from_file(
    State(state): State<Arc<AppState>>,
    body: Result<axum::Json<FileProcessRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let axum::Json(body) = body?;
    let path = state.config.data_path(&body.path)?;
    let kind = match body.kind.as_deref() {
        Some(raw) => parse_kind(raw)?,
        None => SourceKind::from_path(&path).ok_or_else(|| {
            AppError::InvalidRequest(format!(
                "cannot infer the source kind of '{}'; pass `kind`",
                body.path
            ))
        })?,
    };
    let options = PipelineOptions {
        skip_policy: state.config.skip_policy,
        limit: check_max_items(body.max_items)?,
    };

    let requested = body.path.clone();
    let rendered = tokio::task::spawn_blocking(move || {
        let content = read_source(&path).map_err(|e| match e {
            AppError::NotFound(_) => AppError::NotFound(format!("File not found: {}", body.path)),
            other => other,
        })?;
        CommercePipeline::new(CatalogParser::for_kind(kind))
            .with_options(options)
            .build_markdown(&content, body.title.as_deref())
    })
    .await
    .map_err(join_error)??;

    tracing::info!(
        path = %requested,
        extracted = rendered.catalog.extracted_count(),
        skipped = rendered.catalog.skipped_count(),
        "Processed data file"
    );

    Ok(axum::Json(ProcessedResponse::from(rendered)))
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

pub async fn commerce_txt(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    // Regeneration parses the source and rewrites the artifact on disk.
    let markdown = tokio::task::spawn_blocking(move || state.artifact())
        .await
        .map_err(join_error)?
        .map_err(|e| match e {
            AppError::NotFound(_) => e,
            other => AppError::Generic(format!("commerce.txt generation failed: {other}")),
        })?;

    let etag = format!("\"{}\"", compute_hash(&markdown));
    let fresh = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.split(',').any(|tag| tag.trim() == etag));

    let etag = HeaderValue::from_str(&etag)
        .map_err(|e| AppError::Generic(format!("Invalid ETag header: {e}")))?;
    let cache_headers = [
        (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
        (header::ETAG, etag),
    ];

    if fresh {
        return Ok((StatusCode::NOT_MODIFIED, cache_headers).into_response());
    }

    Ok((
        cache_headers,
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static(MARKDOWN_CONTENT_TYPE),
        )],
        markdown,
    )
        .into_response())
}

pub async fn robots_txt(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let robots = read_source(&state.config.robots).map_err(|e| match e {
        AppError::NotFound(_) => AppError::NotFound("robots.txt not found".into()),
        other => other,
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, TEXT_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        robots,
    )
        .into_response())
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse),
    ),
    tag = "system"
)]
pub async fn health() -> impl IntoResponse {
    axum::Json(HealthResponse { status: "ok" })
}
