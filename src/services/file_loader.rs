use bytes::Bytes;
use reqwest::Client;

use crate::error::AppError;

/// Fetch the source workbook bytes from a caller-supplied URL, bounded by
/// the configured maximum file size.
pub async fn load_file_from_url(url: &str, max_size: usize) -> Result<Bytes, AppError> {
    let client = Client::new();
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::FileProcessingError(format!("Failed to fetch file: {}", e)))?;

    if !response.status().is_success() {
        return Err(AppError::FileProcessingError(format!(
            "Failed to fetch file. Status: {}",
            response.status()
        )));
    }

    let data = response
        .bytes()
        .await
        .map_err(|e| AppError::FileProcessingError(format!("Failed to read response bytes: {}", e)))?;

    if data.len() > max_size {
        return Err(AppError::InvalidInput(format!(
            "File is {} bytes, above the configured limit of {} bytes",
            data.len(),
            max_size
        )));
    }

    Ok(data)
}
