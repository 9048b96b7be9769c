//! Transient error-page hand-off. A failing screen stores the status code
//! and message under a one-shot key, redirects, and the error page consumes
//! the state exactly once; a second read finds nothing.

use axum::{
    extract::{Path, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{utils::errors::AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct ErrorHandoffRequest {
    pub status_code: u16,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorHandoffCreated {
    pub key: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ErrorHandoffResponse {
    pub status_code: u16,
    pub message: String,
    pub variant: &'static str,
    pub stored_at: DateTime<Utc>,
}

/// Which presentational variant the error page should render.
pub fn variant_for(status_code: u16) -> &'static str {
    match status_code {
        401 => "unauthorized",
        403 => "forbidden",
        404 => "not_found",
        500..=599 => "server_error",
        _ => "generic",
    }
}

pub async fn create_handoff(
    State(state): State<AppState>,
    Json(payload): Json<ErrorHandoffRequest>,
) -> Result<Json<ErrorHandoffCreated>, AppError> {
    if payload.message.trim().is_empty() {
        return Err(AppError::BadRequest(
            "An error message is required".to_string(),
        ));
    }

    let key = state
        .store
        .put_error_handoff(payload.status_code, payload.message)
        .await;

    Ok(Json(ErrorHandoffCreated { key }))
}

pub async fn consume_handoff(
    State(state): State<AppState>,
    Path(key): Path<Uuid>,
) -> Result<Json<ErrorHandoffResponse>, AppError> {
    let handoff = state
        .store
        .take_error_handoff(key)
        .await
        .ok_or_else(|| {
            AppError::NotFound("Error state was already consumed or never stored".to_string())
        })?;

    Ok(Json(ErrorHandoffResponse {
        status_code: handoff.status_code,
        variant: variant_for(handoff.status_code),
        message: handoff.message,
        stored_at: handoff.stored_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_cover_the_error_taxonomy() {
        assert_eq!(variant_for(401), "unauthorized");
        assert_eq!(variant_for(403), "forbidden");
        assert_eq!(variant_for(404), "not_found");
        assert_eq!(variant_for(500), "server_error");
        assert_eq!(variant_for(503), "server_error");
        assert_eq!(variant_for(418), "generic");
    }
}
