use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{
    middleware::auth::AuthUser, services::analytics::AnalyticsService, utils::logger::LOGGER,
    AppState,
};

#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub total_jobs: usize,
    pub total_resumes: usize,
    pub total_members: usize,
    pub active_jobs: usize,
    pub job_status_breakdown: HashMap<String, usize>,
    pub resume_status_breakdown: HashMap<String, usize>,
    pub department_stats: Vec<DepartmentStats>,
    pub pipeline_funnel: Vec<FunnelStage>,
    pub top_skills: Vec<SkillStat>,
    pub match_scores: MatchScoreStats,
    pub source_breakdown: HashMap<String, usize>,
}

#[derive(Debug, Serialize)]
pub struct DepartmentStats {
    pub department: String,
    pub open_jobs: usize,
    pub applicants: u32,
}

/// One pipeline stage of the dashboard funnel; `percentage` backs the
/// rendered bar width.
#[derive(Debug, Serialize)]
pub struct FunnelStage {
    pub stage: String,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Serialize)]
pub struct SkillStat {
    pub skill: String,
    pub resume_count: usize,
}

#[derive(Debug, Serialize)]
pub struct MatchScoreStats {
    pub scored_resumes: usize,
    pub average: f64,
    pub highest: u8,
    pub lowest: u8,
}

#[derive(Debug, Serialize)]
pub struct ActivityData {
    pub date: String,
    pub jobs_posted: usize,
    pub resumes_received: usize,
    pub total_activity: usize,
}

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub days: Option<i64>,
}

pub async fn get_analytics(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<AnalyticsResponse>, StatusCode> {
    if !auth_user.can_manage() {
        LOGGER.log_business_event(
            "unauthorized_analytics_access",
            Some(auth_user.member_id),
            [(
                "role".to_string(),
                serde_json::Value::String(auth_user.role_str().to_string()),
            )]
            .iter()
            .cloned()
            .collect(),
        );
        return Err(StatusCode::FORBIDDEN);
    }

    LOGGER.log_request("GET", "/admin/analytics", Some(auth_user.member_id), 200);

    let analytics_service = AnalyticsService::new(state.store.clone());
    Ok(Json(analytics_service.get_dashboard_analytics().await))
}

pub async fn get_activity(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<Vec<ActivityData>>, StatusCode> {
    if !auth_user.can_manage() {
        return Err(StatusCode::FORBIDDEN);
    }

    let days = query.days.unwrap_or(30).clamp(1, 365);

    LOGGER.log_request("GET", "/admin/activity", Some(auth_user.member_id), 200);

    let analytics_service = AnalyticsService::new(state.store.clone());
    Ok(Json(analytics_service.get_activity(days).await))
}
