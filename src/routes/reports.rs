use axum::{
    extract::State,
    http::{header, Method},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    error::AppError,
    models::Table,
    services::{
        aggregate,
        cleaning::DataCleaner,
        excel::{reader, report},
        file_loader,
    },
    AppState,
};

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub fn routes() -> Router<Arc<AppState>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/reports/clean", post(clean_report))
        .route("/reports/summary", post(summary_report))
        .layer(cors)
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    file_url: String,
}

#[axum::debug_handler]
async fn clean_report(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateRequest>,
) -> Result<Response, AppError> {
    let start = std::time::Instant::now();
    tracing::info!("Generating cleaned report from {}", request.file_url);

    let cleaned = load_and_clean(&request.file_url, state.config.max_file_size).await?;
    let bytes = report::write_cleaned_workbook(&cleaned)?;

    tracing::info!(
        "Cleaned report ready: {} rows, {}KB, took {:?}",
        cleaned.height(),
        bytes.len() / 1024,
        start.elapsed()
    );
    Ok(workbook_response("report_cleaned.xlsx", bytes))
}

#[axum::debug_handler]
async fn summary_report(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateRequest>,
) -> Result<Response, AppError> {
    let start = std::time::Instant::now();
    tracing::info!("Generating summary report from {}", request.file_url);

    let cleaned = load_and_clean(&request.file_url, state.config.max_file_size).await?;

    let aggregate_start = std::time::Instant::now();
    let summaries = aggregate::summarize(&cleaned)?;
    tracing::info!(
        "Aggregated {} regions, {} products, {} ship modes in {:?}",
        summaries.by_region.len(),
        summaries.by_product.len(),
        summaries.delivery_by_ship_mode.len(),
        aggregate_start.elapsed()
    );

    let bytes = report::build_summary_workbook(&cleaned, &summaries)?;

    tracing::info!(
        "Summary report ready: {}KB, took {:?}",
        bytes.len() / 1024,
        start.elapsed()
    );
    Ok(workbook_response("report_summary.xlsx", bytes))
}

async fn load_and_clean(file_url: &str, max_file_size: usize) -> Result<Table, AppError> {
    let download_start = std::time::Instant::now();
    let file_data = file_loader::load_file_from_url(file_url, max_file_size).await?;
    tracing::info!(
        "File downloaded, size: {}KB, took: {:?}",
        file_data.len() / 1024,
        download_start.elapsed()
    );

    let table = reader::read_raw_table(file_data)?;
    tracing::info!("Read {} raw rows", table.height());

    let cleaned = DataCleaner::new().clean(table)?;
    tracing::info!("Cleaned table has {} rows", cleaned.height());
    Ok(cleaned)
}

fn workbook_response(filename: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response()
}
