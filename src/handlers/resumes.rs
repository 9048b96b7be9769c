use axum::{
    extract::{Extension, Multipart, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tokio::fs;
use uuid::Uuid;
use validator::Validate;

use crate::{
    collection::{
        category_match, paginate, sort_records, text_match, PageRequest, Paged, SortDirection,
        SortValue, ViewMode,
    },
    middleware::auth::AuthUser,
    models::resume::{
        PipelineStatus, Resume, ResumeAction, ResumeResponse, UpdateResumeRequest,
    },
    services::upload::{AcceptedFile, UploadError, UploadPolicy},
    utils::{errors::AppError, logger::LOGGER},
    AppState,
};

const PROGRESS_STEP: u8 = 20;
const PROGRESS_TICK_MS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumeSortKey {
    Name,
    #[default]
    UploadedAt,
    MatchScore,
    YearsExperience,
}

#[derive(Debug, Deserialize)]
pub struct ResumeListQuery {
    pub q: Option<String>,
    pub status: Option<PipelineStatus>,
    pub source: Option<String>,
    pub min_score: Option<u8>,
    pub sort: Option<ResumeSortKey>,
    pub order: Option<SortDirection>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
    pub view: Option<ViewMode>,
}

#[derive(Debug, Deserialize)]
pub struct ResumeActionRequest {
    pub action: ResumeAction,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub batch_id: Uuid,
    pub accepted_files: usize,
    pub resume_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct UploadProgressResponse {
    pub batch_id: Uuid,
    pub percent: u8,
    pub done: bool,
}

fn sort_value(resume: &Resume, key: ResumeSortKey) -> SortValue {
    match key {
        ResumeSortKey::Name => SortValue::Text(resume.candidate_name.clone()),
        ResumeSortKey::UploadedAt => SortValue::Time(resume.uploaded_at),
        ResumeSortKey::MatchScore => {
            SortValue::Number(resume.match_score.map(|s| s as f64).unwrap_or(-1.0))
        }
        ResumeSortKey::YearsExperience => SortValue::Number(resume.years_experience as f64),
    }
}

impl From<UploadError> for AppError {
    fn from(error: UploadError) -> Self {
        match &error {
            UploadError::FileTooLarge(_, _) => AppError::PayloadTooLarge(error.to_string()),
            UploadError::UnsupportedType(_) => AppError::UnsupportedMediaType(error.to_string()),
            UploadError::TooManyFiles(_, _)
            | UploadError::BadFileName(_)
            | UploadError::BadArchive(_)
            | UploadError::NestedArchive => AppError::BadRequest(error.to_string()),
        }
    }
}

pub async fn list_resumes(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<ResumeListQuery>,
) -> Json<Paged<ResumeResponse>> {
    let start_time = Instant::now();

    let mut resumes: Vec<Resume> = state
        .store
        .list_resumes()
        .await
        .into_iter()
        .filter(|resume| {
            let skills = resume.skills.join(" ");
            text_match(
                &[&resume.candidate_name, &resume.title, &skills],
                query.q.as_deref().unwrap_or(""),
            ) && category_match(&resume.status, query.status.as_ref())
                && query
                    .source
                    .as_ref()
                    .map(|s| resume.source.eq_ignore_ascii_case(s))
                    .unwrap_or(true)
                && query
                    .min_score
                    .map(|min| resume.match_score.map(|s| s >= min).unwrap_or(false))
                    .unwrap_or(true)
        })
        .collect();

    let sort = query.sort.unwrap_or_default();
    let order = query.order.unwrap_or_default();
    sort_records(&mut resumes, order, |resume| sort_value(resume, sort));

    let page_request = PageRequest::new(query.page, query.per_page);
    let view = query.view.unwrap_or_default();
    let paged = paginate(
        resumes.into_iter().map(ResumeResponse::from).collect(),
        page_request,
        view,
    );

    LOGGER.log_collection_query(
        "resumes",
        &format!("{:?}", query),
        start_time.elapsed().as_millis(),
        Some(paged.items.len()),
    );
    LOGGER.log_request("GET", "/resumes", Some(auth_user.member_id), 200);

    Json(paged)
}

pub async fn get_resume(
    State(state): State<AppState>,
    Extension(_auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeResponse>, AppError> {
    let resume = state.store.get_resume(id).await?;
    Ok(Json(ResumeResponse::from(resume)))
}

pub async fn update_resume(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateResumeRequest>,
) -> Result<Json<ResumeResponse>, AppError> {
    if !auth_user.can_edit() {
        return Err(AppError::Forbidden(
            "Viewers cannot edit resumes".to_string(),
        ));
    }
    payload.validate()?;

    let resume = state
        .store
        .update_resume(id, |resume| {
            if let Some(candidate_name) = payload.candidate_name {
                resume.candidate_name = candidate_name;
            }
            if let Some(email) = payload.email {
                resume.email = email;
            }
            if let Some(phone) = payload.phone {
                resume.phone = Some(phone);
            }
            if let Some(title) = payload.title {
                resume.title = title;
            }
            if let Some(years_experience) = payload.years_experience {
                resume.years_experience = years_experience;
            }
            if let Some(skills) = payload.skills {
                resume.skills = skills;
            }
            if let Some(education) = payload.education {
                resume.education = education;
            }
            if let Some(summary) = payload.summary {
                resume.summary = summary;
            }
            if let Some(status) = payload.status {
                resume.status = status;
            }
            if let Some(match_score) = payload.match_score {
                resume.match_score = Some(match_score);
            }
            if let Some(tags) = payload.tags {
                resume.tags = tags;
            }
            if let Some(source) = payload.source {
                resume.source = source;
            }
        })
        .await?;

    Ok(Json(ResumeResponse::from(resume)))
}

pub async fn delete_resume(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !auth_user.can_manage() {
        return Err(AppError::Forbidden(
            "Only admins and managers can delete resumes".to_string(),
        ));
    }

    state.store.delete_resume(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Fire-and-forget pipeline action: the status overwrite lands in the
/// store, the response is an empty 202, and the list only changes on the
/// caller's next reload.
pub async fn dispatch_resume_action(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ResumeActionRequest>,
) -> Result<StatusCode, AppError> {
    if !auth_user.can_edit() {
        return Err(AppError::Forbidden(
            "Viewers cannot dispatch resume actions".to_string(),
        ));
    }

    let target = payload.action.target_status();
    state
        .store
        .update_resume(id, |resume| resume.status = target)
        .await?;

    LOGGER.log_business_event(
        "resume_action_dispatched",
        Some(auth_user.member_id),
        [
            (
                "resume_id".to_string(),
                serde_json::Value::String(id.to_string()),
            ),
            ("action".to_string(), serde_json::json!(payload.action)),
        ]
        .iter()
        .cloned()
        .collect(),
    );

    Ok(StatusCode::ACCEPTED)
}

/// Multipart intake for one file, several files, or a single zip bundle.
/// Every accepted file becomes a resume record in status `new`; parsing
/// fills in the rest later, so contact fields start empty.
pub async fn upload_resumes(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    if !auth_user.can_edit() {
        return Err(AppError::Forbidden(
            "Viewers cannot upload resumes".to_string(),
        ));
    }

    let policy = UploadPolicy::default();
    let mut accepted: Vec<AcceptedFile> = Vec::new();
    let mut source = "upload".to_string();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::BadRequest("Malformed multipart body".to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let filename = field
                    .file_name()
                    .ok_or_else(|| {
                        AppError::BadRequest("File field is missing a file name".to_string())
                    })?
                    .to_string();
                let declared_type = field.content_type().map(|ct| ct.to_string());

                let data = field.bytes().await.map_err(|_| {
                    AppError::BadRequest(format!("Could not read upload '{}'", filename))
                })?;

                let file = policy.validate(&filename, declared_type.as_deref(), &data)?;
                if file.is_archive() {
                    accepted.extend(policy.expand_archive(&file)?);
                } else {
                    accepted.push(file);
                }
            }
            "source" => {
                let data = field.bytes().await.map_err(|_| {
                    AppError::BadRequest("Could not read source field".to_string())
                })?;
                if let Ok(value) = String::from_utf8(data.to_vec()) {
                    if !value.trim().is_empty() {
                        source = value.trim().to_string();
                    }
                }
            }
            _ => {}
        }
    }

    if accepted.is_empty() {
        return Err(AppError::BadRequest(
            "No files were included in the upload".to_string(),
        ));
    }
    policy.check_file_count(accepted.len())?;

    let mut resume_ids = Vec::with_capacity(accepted.len());
    for file in &accepted {
        let stored_name = format!("{}.{}", Uuid::new_v4(), file.extension);
        let path = PathBuf::from(&state.upload_dir).join(&stored_name);
        fs::write(&path, &file.data).await.map_err(|_| {
            AppError::InternalServerError("Failed to store uploaded file".to_string())
        })?;

        let now = Utc::now();
        let resume = Resume {
            id: Uuid::new_v4(),
            candidate_name: candidate_name_from(&file.original_name),
            email: String::new(),
            phone: None,
            title: String::new(),
            years_experience: 0,
            skills: Vec::new(),
            education: Vec::new(),
            summary: format!("Imported from {}", file.original_name),
            status: PipelineStatus::New,
            uploaded_at: now,
            file_type: file.extension.clone(),
            file_size: file.data.len() as u64,
            file_path: Some(stored_name),
            match_score: None,
            tags: vec!["needs_review".to_string()],
            source: source.clone(),
            uploaded_by: auth_user.member_id,
            created_at: now,
            updated_at: now,
        };
        let resume = state.store.insert_resume(resume).await;
        resume_ids.push(resume.id);
    }

    let batch_id = Uuid::new_v4();
    state.store.set_upload_progress(batch_id, 0).await;
    spawn_progress_task(state.clone(), batch_id);

    LOGGER.log_business_event(
        "resumes_uploaded",
        Some(auth_user.member_id),
        [
            (
                "batch_id".to_string(),
                serde_json::Value::String(batch_id.to_string()),
            ),
            (
                "file_count".to_string(),
                serde_json::Value::Number(serde_json::Number::from(accepted.len())),
            ),
        ]
        .iter()
        .cloned()
        .collect(),
    );

    Ok(Json(UploadResponse {
        batch_id,
        accepted_files: accepted.len(),
        resume_ids,
    }))
}

/// Stand-in for the processing pipeline: the batch percentage climbs by a
/// fixed step on a fixed interval until it reaches 100.
fn spawn_progress_task(state: AppState, batch_id: Uuid) {
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(tokio::time::Duration::from_millis(PROGRESS_TICK_MS));
        let mut percent: u8 = 0;
        while percent < 100 {
            interval.tick().await;
            percent = percent.saturating_add(PROGRESS_STEP).min(100);
            state.store.set_upload_progress(batch_id, percent).await;
        }
    });
}

pub async fn upload_progress(
    State(state): State<AppState>,
    Extension(_auth_user): Extension<AuthUser>,
    Path(batch_id): Path<Uuid>,
) -> Result<Json<UploadProgressResponse>, AppError> {
    let percent = state
        .store
        .upload_progress(batch_id)
        .await
        .ok_or_else(|| AppError::NotFound("Unknown upload batch".to_string()))?;

    Ok(Json(UploadProgressResponse {
        batch_id,
        percent,
        done: percent >= 100,
    }))
}

/// "jane-doe_resume.pdf" -> "Jane Doe Resume"; a parser would overwrite
/// this with the real name.
fn candidate_name_from(original_name: &str) -> String {
    let stem = std::path::Path::new(original_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Candidate");

    stem.split(|c: char| c == '-' || c == '_' || c == ' ')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_name_is_humanized_from_the_file_name() {
        assert_eq!(candidate_name_from("jane-doe_resume.pdf"), "Jane Doe Resume");
        assert_eq!(candidate_name_from("ELENA.pdf"), "ELENA");
        assert_eq!(candidate_name_from(""), "Candidate");
    }

    #[test]
    fn unscored_resumes_sort_below_any_scored_resume() {
        let value = |score: Option<u8>| match score {
            Some(s) => s as f64,
            None => -1.0,
        };
        assert!(value(None) < value(Some(0)));
    }
}
