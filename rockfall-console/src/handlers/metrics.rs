use axum::response::IntoResponse;
use rockfall_core::error::AppError;

pub async fn metrics() -> Result<impl IntoResponse, AppError> {
    match crate::services::metrics::get_metrics() {
        Some(Ok(text)) => Ok(text),
        Some(Err(e)) => Err(AppError::InternalError(e.into())),
        None => Err(AppError::ServiceUnavailable),
    }
}
