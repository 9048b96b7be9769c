use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resume {
    pub id: Uuid,
    pub candidate_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub title: String,
    pub years_experience: u32,
    pub skills: Vec<String>,
    pub education: Vec<Education>,
    pub summary: String,
    pub status: PipelineStatus,
    pub uploaded_at: DateTime<Utc>,
    pub file_type: String,
    pub file_size: u64,
    pub file_path: Option<String>,
    pub match_score: Option<u8>,
    pub tags: Vec<String>,
    pub source: String,
    pub uploaded_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Education {
    pub degree: String,
    pub school: String,
    pub year: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    New,
    Reviewed,
    Shortlisted,
    Interviewed,
    Rejected,
    Hired,
}

impl PipelineStatus {
    pub const PIPELINE_ORDER: [PipelineStatus; 6] = [
        PipelineStatus::New,
        PipelineStatus::Reviewed,
        PipelineStatus::Shortlisted,
        PipelineStatus::Interviewed,
        PipelineStatus::Rejected,
        PipelineStatus::Hired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStatus::New => "new",
            PipelineStatus::Reviewed => "reviewed",
            PipelineStatus::Shortlisted => "shortlisted",
            PipelineStatus::Interviewed => "interviewed",
            PipelineStatus::Rejected => "rejected",
            PipelineStatus::Hired => "hired",
        }
    }
}

/// Closed set of list-item actions the dashboard can dispatch on a resume.
/// Each verb maps onto a direct pipeline-status overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumeAction {
    MarkReviewed,
    Shortlist,
    ScheduleInterview,
    Reject,
    Hire,
}

impl ResumeAction {
    pub fn target_status(self) -> PipelineStatus {
        match self {
            ResumeAction::MarkReviewed => PipelineStatus::Reviewed,
            ResumeAction::Shortlist => PipelineStatus::Shortlisted,
            ResumeAction::ScheduleInterview => PipelineStatus::Interviewed,
            ResumeAction::Reject => PipelineStatus::Rejected,
            ResumeAction::Hire => PipelineStatus::Hired,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateResumeRequest {
    #[validate(length(min = 1))]
    pub candidate_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub title: Option<String>,
    pub years_experience: Option<u32>,
    pub skills: Option<Vec<String>>,
    pub education: Option<Vec<Education>>,
    pub summary: Option<String>,
    pub status: Option<PipelineStatus>,
    #[validate(range(min = 0, max = 100))]
    pub match_score: Option<u8>,
    pub tags: Option<Vec<String>>,
    pub source: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResumeResponse {
    pub id: Uuid,
    pub candidate_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub title: String,
    pub years_experience: u32,
    pub skills: Vec<String>,
    pub education: Vec<Education>,
    pub summary: String,
    pub status: PipelineStatus,
    pub uploaded_at: DateTime<Utc>,
    pub file_type: String,
    pub file_size: u64,
    pub file_path: Option<String>,
    pub match_score: Option<u8>,
    pub tags: Vec<String>,
    pub source: String,
    pub uploaded_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Resume> for ResumeResponse {
    fn from(resume: Resume) -> Self {
        Self {
            id: resume.id,
            candidate_name: resume.candidate_name,
            email: resume.email,
            phone: resume.phone,
            title: resume.title,
            years_experience: resume.years_experience,
            skills: resume.skills,
            education: resume.education,
            summary: resume.summary,
            status: resume.status,
            uploaded_at: resume.uploaded_at,
            file_type: resume.file_type,
            file_size: resume.file_size,
            file_path: resume.file_path,
            match_score: resume.match_score,
            tags: resume.tags,
            source: resume.source,
            uploaded_by: resume.uploaded_by,
            created_at: resume.created_at,
            updated_at: resume.updated_at,
        }
    }
}
