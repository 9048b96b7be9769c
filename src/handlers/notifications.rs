use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    middleware::auth::AuthUser,
    models::resume::ResumeResponse,
    services::notification::NotificationService,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    pub days: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub message: String,
    pub notified_recruiters: usize,
    pub total_stale_resumes: usize,
}

pub async fn trigger_notifications(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<NotificationResponse>, StatusCode> {
    // Only admins can trigger notifications
    if !auth_user.is_admin() {
        return Err(StatusCode::FORBIDDEN);
    }

    let notification_service = NotificationService::new(state.store.clone());
    let days = query.days.unwrap_or(7);

    let stale_resumes = notification_service.find_stale_resumes(days).await;

    let notified = notification_service
        .process_stale_notifications_with_days(days)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(NotificationResponse {
        message: format!(
            "Notifications processed for resumes untouched for more than {} days",
            days
        ),
        notified_recruiters: notified,
        total_stale_resumes: stale_resumes.len(),
    }))
}

pub async fn get_stale_resumes(
    State(state): State<AppState>,
    Extension(_auth_user): Extension<AuthUser>,
    Query(query): Query<NotificationQuery>,
) -> Json<Vec<ResumeResponse>> {
    let notification_service = NotificationService::new(state.store.clone());
    let days = query.days.unwrap_or(7);

    let stale = notification_service
        .find_stale_resumes(days)
        .await
        .into_iter()
        .map(ResumeResponse::from)
        .collect();

    Json(stale)
}
