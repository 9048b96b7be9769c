use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use serde::Deserialize;
use std::time::Instant;
use uuid::Uuid;
use validator::Validate;

use crate::{
    collection::{
        category_match, paginate, sort_records, text_match, PageRequest, Paged, SortDirection,
        SortValue, ViewMode,
    },
    middleware::auth::AuthUser,
    models::job::{
        CreateJobRequest, EmploymentType, ExperienceLevel, Job, JobAction, JobResponse, JobStatus,
        UpdateJobRequest,
    },
    utils::{errors::AppError, logger::LOGGER},
    AppState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobSortKey {
    Title,
    #[default]
    PostedDate,
    Applicants,
    Department,
}

#[derive(Debug, Deserialize)]
pub struct JobListQuery {
    pub q: Option<String>,
    pub status: Option<JobStatus>,
    pub department: Option<String>,
    pub employment_type: Option<EmploymentType>,
    pub experience: Option<ExperienceLevel>,
    pub sort: Option<JobSortKey>,
    pub order: Option<SortDirection>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
    pub view: Option<ViewMode>,
}

#[derive(Debug, Deserialize)]
pub struct JobActionRequest {
    pub action: JobAction,
}

fn sort_value(job: &Job, key: JobSortKey) -> SortValue {
    match key {
        JobSortKey::Title => SortValue::Text(job.title.clone()),
        JobSortKey::PostedDate => SortValue::Time(job.created_at),
        JobSortKey::Applicants => SortValue::Number(job.applicants as f64),
        JobSortKey::Department => SortValue::Text(job.department.clone()),
    }
}

pub async fn list_jobs(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<JobListQuery>,
) -> Json<Paged<JobResponse>> {
    let start_time = Instant::now();

    let mut jobs: Vec<Job> = state
        .store
        .list_jobs()
        .await
        .into_iter()
        .filter(|job| {
            text_match(
                &[&job.title, &job.department, &job.location],
                query.q.as_deref().unwrap_or(""),
            ) && category_match(&job.status, query.status.as_ref())
                && query
                    .department
                    .as_ref()
                    .map(|d| job.department.eq_ignore_ascii_case(d))
                    .unwrap_or(true)
                && category_match(&job.employment_type, query.employment_type.as_ref())
                && category_match(&job.experience_level, query.experience.as_ref())
        })
        .collect();

    let sort = query.sort.unwrap_or_default();
    let order = query.order.unwrap_or_default();
    sort_records(&mut jobs, order, |job| sort_value(job, sort));

    let page_request = PageRequest::new(query.page, query.per_page);
    let view = query.view.unwrap_or_default();
    let paged = paginate(
        jobs.into_iter().map(JobResponse::from).collect(),
        page_request,
        view,
    );

    LOGGER.log_collection_query(
        "jobs",
        &format!("{:?}", query),
        start_time.elapsed().as_millis(),
        Some(paged.items.len()),
    );
    LOGGER.log_request("GET", "/jobs", Some(auth_user.member_id), 200);

    Json(paged)
}

pub async fn get_job(
    State(state): State<AppState>,
    Extension(_auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobResponse>, AppError> {
    // Opening the detail view counts as a view.
    state.store.record_job_view(id).await?;
    let job = state.store.get_job(id).await?;
    Ok(Json(JobResponse::from(job)))
}

pub async fn create_job(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateJobRequest>,
) -> Result<Json<JobResponse>, AppError> {
    if !auth_user.can_edit() {
        return Err(AppError::Forbidden(
            "Viewers cannot create job postings".to_string(),
        ));
    }
    payload.validate()?;

    let now = Utc::now();
    let job = Job {
        id: Uuid::new_v4(),
        title: payload.title,
        department: payload.department,
        location: payload.location,
        employment_type: payload.employment_type,
        experience_level: payload.experience_level,
        salary: payload.salary,
        description: payload.description,
        requirements: payload.requirements,
        responsibilities: payload.responsibilities,
        benefits: payload.benefits,
        skills: payload.skills,
        status: payload.status.unwrap_or(JobStatus::Draft),
        applicants: 0,
        views: 0,
        posted_date: now.date_naive(),
        closing_date: payload.closing_date,
        created_by: auth_user.member_id,
        created_at: now,
        updated_at: now,
    };

    let job = state.store.insert_job(job).await;

    LOGGER.log_business_event(
        "job_created",
        Some(auth_user.member_id),
        [(
            "job_id".to_string(),
            serde_json::Value::String(job.id.to_string()),
        )]
        .iter()
        .cloned()
        .collect(),
    );

    Ok(Json(JobResponse::from(job)))
}

pub async fn update_job(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateJobRequest>,
) -> Result<Json<JobResponse>, AppError> {
    if !auth_user.can_edit() {
        return Err(AppError::Forbidden(
            "Viewers cannot edit job postings".to_string(),
        ));
    }
    payload.validate()?;

    let job = state
        .store
        .update_job(id, |job| {
            if let Some(title) = payload.title {
                job.title = title;
            }
            if let Some(department) = payload.department {
                job.department = department;
            }
            if let Some(location) = payload.location {
                job.location = location;
            }
            if let Some(employment_type) = payload.employment_type {
                job.employment_type = employment_type;
            }
            if let Some(experience_level) = payload.experience_level {
                job.experience_level = experience_level;
            }
            if let Some(salary) = payload.salary {
                job.salary = salary;
            }
            if let Some(description) = payload.description {
                job.description = description;
            }
            if let Some(requirements) = payload.requirements {
                job.requirements = requirements;
            }
            if let Some(responsibilities) = payload.responsibilities {
                job.responsibilities = responsibilities;
            }
            if let Some(benefits) = payload.benefits {
                job.benefits = benefits;
            }
            if let Some(skills) = payload.skills {
                job.skills = skills;
            }
            if let Some(status) = payload.status {
                job.status = status;
            }
            if let Some(closing_date) = payload.closing_date {
                job.closing_date = Some(closing_date);
            }
        })
        .await?;

    Ok(Json(JobResponse::from(job)))
}

pub async fn delete_job(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !auth_user.can_manage() {
        return Err(AppError::Forbidden(
            "Only admins and managers can delete job postings".to_string(),
        ));
    }

    state.store.delete_job(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Fire-and-forget list-item action. The mutation is applied to the store,
/// but the caller gets an empty 202 and only sees the effect on its next
/// full reload.
pub async fn dispatch_job_action(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<JobActionRequest>,
) -> Result<StatusCode, AppError> {
    if !auth_user.can_edit() {
        return Err(AppError::Forbidden(
            "Viewers cannot dispatch job actions".to_string(),
        ));
    }

    match payload.action {
        JobAction::Duplicate => {
            let source = state.store.get_job(id).await?;
            let now = Utc::now();
            let copy = Job {
                id: Uuid::new_v4(),
                title: format!("{} (Copy)", source.title),
                status: JobStatus::Draft,
                applicants: 0,
                views: 0,
                posted_date: now.date_naive(),
                created_by: auth_user.member_id,
                created_at: now,
                updated_at: now,
                ..source
            };
            state.store.insert_job(copy).await;
        }
        JobAction::Pause => {
            state
                .store
                .update_job(id, |job| job.status = JobStatus::Paused)
                .await?;
        }
        JobAction::Activate => {
            state
                .store
                .update_job(id, |job| job.status = JobStatus::Active)
                .await?;
        }
        JobAction::Close => {
            state
                .store
                .update_job(id, |job| job.status = JobStatus::Closed)
                .await?;
        }
    }

    LOGGER.log_business_event(
        "job_action_dispatched",
        Some(auth_user.member_id),
        [
            (
                "job_id".to_string(),
                serde_json::Value::String(id.to_string()),
            ),
            (
                "action".to_string(),
                serde_json::json!(payload.action),
            ),
        ]
        .iter()
        .cloned()
        .collect(),
    );

    Ok(StatusCode::ACCEPTED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::member::MemberRole;
    use crate::store::CollectionStore;
    use std::sync::Arc;

    fn test_state() -> AppState {
        AppState {
            store: Arc::new(CollectionStore::seeded()),
            jwt_secret: "test-secret".to_string(),
            upload_dir: "./storage/uploads".to_string(),
            linkedin_client_id: "client".to_string(),
            linkedin_redirect_uri: "http://localhost/callback".to_string(),
        }
    }

    fn manager() -> AuthUser {
        AuthUser {
            member_id: Uuid::new_v4(),
            role: MemberRole::Manager,
        }
    }

    fn viewer() -> AuthUser {
        AuthUser {
            member_id: Uuid::new_v4(),
            role: MemberRole::Viewer,
        }
    }

    #[tokio::test]
    async fn dispatched_action_lands_in_the_store_and_returns_empty_202() {
        let state = test_state();
        let job = state
            .store
            .list_jobs()
            .await
            .into_iter()
            .find(|j| j.status == JobStatus::Active)
            .unwrap();

        let status = dispatch_job_action(
            State(state.clone()),
            Extension(manager()),
            Path(job.id),
            Json(JobActionRequest {
                action: JobAction::Pause,
            }),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(
            state.store.get_job(job.id).await.unwrap().status,
            JobStatus::Paused
        );
    }

    #[tokio::test]
    async fn duplicate_inserts_a_fresh_draft_copy() {
        let state = test_state();
        let before = state.store.list_jobs().await.len();
        let job = state.store.list_jobs().await.into_iter().next().unwrap();

        dispatch_job_action(
            State(state.clone()),
            Extension(manager()),
            Path(job.id),
            Json(JobActionRequest {
                action: JobAction::Duplicate,
            }),
        )
        .await
        .unwrap();

        let jobs = state.store.list_jobs().await;
        assert_eq!(jobs.len(), before + 1);
        let copy = jobs
            .iter()
            .find(|j| j.title == format!("{} (Copy)", job.title))
            .unwrap();
        assert_eq!(copy.status, JobStatus::Draft);
        assert_eq!(copy.applicants, 0);
        assert_eq!(copy.views, 0);
    }

    #[tokio::test]
    async fn viewers_cannot_dispatch_actions() {
        let state = test_state();
        let job = state.store.list_jobs().await.into_iter().next().unwrap();

        let result = dispatch_job_action(
            State(state),
            Extension(viewer()),
            Path(job.id),
            Json(JobActionRequest {
                action: JobAction::Close,
            }),
        )
        .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn list_filters_sorts_and_pages_in_one_pass() {
        let state = test_state();
        let query = JobListQuery {
            q: Some("engineer".to_string()),
            status: None,
            department: None,
            employment_type: None,
            experience: None,
            sort: Some(JobSortKey::Title),
            order: Some(SortDirection::Asc),
            page: Some(1),
            per_page: Some(5),
            view: None,
        };

        let Json(paged) = list_jobs(State(state), Extension(manager()), Query(query)).await;

        assert!(paged.items.len() <= 5);
        assert!(!paged.items.is_empty());
        assert!(paged.items.iter().all(|job| {
            job.title.to_lowercase().contains("engineer")
                || job.department.to_lowercase().contains("engineer")
        }));
        for pair in paged.items.windows(2) {
            assert!(pair[0].title.to_lowercase() <= pair[1].title.to_lowercase());
        }
    }
}
