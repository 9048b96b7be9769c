use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub department: String,
    pub location: String,
    pub employment_type: EmploymentType,
    pub experience_level: ExperienceLevel,
    pub salary: SalaryRange,
    pub description: String,
    pub requirements: Vec<String>,
    pub responsibilities: Vec<String>,
    pub benefits: Vec<String>,
    pub skills: Vec<String>,
    pub status: JobStatus,
    pub applicants: u32,
    pub views: u32,
    pub posted_date: NaiveDate,
    pub closing_date: Option<NaiveDate>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Contract,
    Internship,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Entry,
    Mid,
    Senior,
    Executive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Draft,
    Active,
    Paused,
    Closed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Draft => "draft",
            JobStatus::Active => "active",
            JobStatus::Paused => "paused",
            JobStatus::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: u32,
    pub max: u32,
    pub currency: String,
}

/// Closed set of list-item actions the dashboard can dispatch on a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobAction {
    Duplicate,
    Pause,
    Activate,
    Close,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateJobRequest {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub department: String,
    #[validate(length(min = 1))]
    pub location: String,
    pub employment_type: EmploymentType,
    pub experience_level: ExperienceLevel,
    pub salary: SalaryRange,
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub status: Option<JobStatus>,
    pub closing_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateJobRequest {
    #[validate(length(min = 1))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub department: Option<String>,
    #[validate(length(min = 1))]
    pub location: Option<String>,
    pub employment_type: Option<EmploymentType>,
    pub experience_level: Option<ExperienceLevel>,
    pub salary: Option<SalaryRange>,
    pub description: Option<String>,
    pub requirements: Option<Vec<String>>,
    pub responsibilities: Option<Vec<String>>,
    pub benefits: Option<Vec<String>>,
    pub skills: Option<Vec<String>>,
    pub status: Option<JobStatus>,
    pub closing_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub id: Uuid,
    pub title: String,
    pub department: String,
    pub location: String,
    pub employment_type: EmploymentType,
    pub experience_level: ExperienceLevel,
    pub salary: SalaryRange,
    pub description: String,
    pub requirements: Vec<String>,
    pub responsibilities: Vec<String>,
    pub benefits: Vec<String>,
    pub skills: Vec<String>,
    pub status: JobStatus,
    pub applicants: u32,
    pub views: u32,
    pub posted_date: NaiveDate,
    pub closing_date: Option<NaiveDate>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            title: job.title,
            department: job.department,
            location: job.location,
            employment_type: job.employment_type,
            experience_level: job.experience_level,
            salary: job.salary,
            description: job.description,
            requirements: job.requirements,
            responsibilities: job.responsibilities,
            benefits: job.benefits,
            skills: job.skills,
            status: job.status,
            applicants: job.applicants,
            views: job.views,
            posted_date: job.posted_date,
            closing_date: job.closing_date,
            created_by: job.created_by,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}
