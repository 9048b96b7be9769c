//! Demo records the dashboard is seeded with at startup. Everything here
//! lives only in memory and is rebuilt on every restart.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::models::{
    job::{EmploymentType, ExperienceLevel, Job, JobStatus, SalaryRange},
    member::{MemberRole, MemberStatus, TeamMember},
    resume::{Education, PipelineStatus, Resume},
};

pub struct SeedData {
    pub members: Vec<TeamMember>,
    pub jobs: Vec<Job>,
    pub resumes: Vec<Resume>,
}

/// Password for every seeded active account.
pub const DEMO_PASSWORD: &str = "screening-demo";

fn days_ago(days: i64) -> DateTime<Utc> {
    Utc::now() - Duration::days(days)
}

fn date_days_ago(days: i64) -> NaiveDate {
    days_ago(days).date_naive()
}

#[allow(clippy::too_many_arguments)]
fn member(
    name: &str,
    email: &str,
    role: MemberRole,
    department: &str,
    status: MemberStatus,
    password_hash: Option<String>,
    joined_days_ago: i64,
) -> TeamMember {
    TeamMember {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: email.to_string(),
        phone: None,
        role,
        department: department.to_string(),
        status,
        password_hash,
        created_at: days_ago(joined_days_ago),
        updated_at: days_ago(joined_days_ago),
    }
}

#[allow(clippy::too_many_arguments)]
fn job(
    title: &str,
    department: &str,
    location: &str,
    employment_type: EmploymentType,
    experience_level: ExperienceLevel,
    salary_min: u32,
    salary_max: u32,
    skills: &[&str],
    status: JobStatus,
    applicants: u32,
    views: u32,
    posted_days_ago: i64,
    created_by: Uuid,
) -> Job {
    Job {
        id: Uuid::new_v4(),
        title: title.to_string(),
        department: department.to_string(),
        location: location.to_string(),
        employment_type,
        experience_level,
        salary: SalaryRange {
            min: salary_min,
            max: salary_max,
            currency: "USD".to_string(),
        },
        description: format!("We are hiring a {} to join the {} team.", title, department),
        requirements: vec![
            format!("Proven experience as a {}", title),
            "Strong written and verbal communication".to_string(),
        ],
        responsibilities: vec![
            "Own projects end to end".to_string(),
            "Collaborate across the team".to_string(),
        ],
        benefits: vec![
            "Health insurance".to_string(),
            "Remote-friendly".to_string(),
        ],
        skills: skills.iter().map(|s| s.to_string()).collect(),
        status,
        applicants,
        views,
        posted_date: date_days_ago(posted_days_ago),
        closing_date: Some(date_days_ago(posted_days_ago - 30)),
        created_by,
        created_at: days_ago(posted_days_ago),
        updated_at: days_ago(posted_days_ago),
    }
}

#[allow(clippy::too_many_arguments)]
fn resume(
    candidate_name: &str,
    email: &str,
    title: &str,
    years_experience: u32,
    skills: &[&str],
    degree: &str,
    school: &str,
    year: u16,
    status: PipelineStatus,
    match_score: Option<u8>,
    source: &str,
    uploaded_days_ago: i64,
    updated_days_ago: i64,
    uploaded_by: Uuid,
) -> Resume {
    Resume {
        id: Uuid::new_v4(),
        candidate_name: candidate_name.to_string(),
        email: email.to_string(),
        phone: None,
        title: title.to_string(),
        years_experience,
        skills: skills.iter().map(|s| s.to_string()).collect(),
        education: vec![Education {
            degree: degree.to_string(),
            school: school.to_string(),
            year,
        }],
        summary: format!(
            "{} with {} years of experience.",
            title, years_experience
        ),
        status,
        uploaded_at: days_ago(uploaded_days_ago),
        file_type: "pdf".to_string(),
        file_size: 180_000 + years_experience as u64 * 1_000,
        file_path: None,
        match_score,
        tags: Vec::new(),
        source: source.to_string(),
        uploaded_by,
        created_at: days_ago(uploaded_days_ago),
        updated_at: days_ago(updated_days_ago),
    }
}

pub fn demo_data() -> SeedData {
    let hash = bcrypt::hash(DEMO_PASSWORD, bcrypt::DEFAULT_COST)
        .expect("bcrypt hash of the demo password");

    let members = vec![
        member(
            "Alexandra Reyes",
            "alexandra@screening.dev",
            MemberRole::Admin,
            "Talent",
            MemberStatus::Active,
            Some(hash.clone()),
            240,
        ),
        member(
            "Marcus Webb",
            "marcus@screening.dev",
            MemberRole::Manager,
            "Engineering",
            MemberStatus::Active,
            Some(hash.clone()),
            180,
        ),
        member(
            "Priya Sharma",
            "priya@screening.dev",
            MemberRole::Member,
            "Talent",
            MemberStatus::Active,
            Some(hash.clone()),
            120,
        ),
        member(
            "Daniel Kim",
            "daniel@screening.dev",
            MemberRole::Member,
            "Engineering",
            MemberStatus::Active,
            Some(hash.clone()),
            90,
        ),
        member(
            "Sofia Rossi",
            "sofia@screening.dev",
            MemberRole::Viewer,
            "Finance",
            MemberStatus::Active,
            Some(hash),
            60,
        ),
        member(
            "James O'Connor",
            "james@screening.dev",
            MemberRole::Member,
            "Design",
            MemberStatus::Pending,
            None,
            3,
        ),
    ];

    let admin = members[0].id;
    let manager = members[1].id;
    let recruiter = members[2].id;

    let jobs = vec![
        job(
            "Senior Backend Engineer",
            "Engineering",
            "Berlin, Germany",
            EmploymentType::FullTime,
            ExperienceLevel::Senior,
            85_000,
            115_000,
            &["Rust", "PostgreSQL", "Kubernetes"],
            JobStatus::Active,
            34,
            412,
            21,
            manager,
        ),
        job(
            "Frontend Engineer",
            "Engineering",
            "Remote",
            EmploymentType::FullTime,
            ExperienceLevel::Mid,
            65_000,
            90_000,
            &["TypeScript", "React", "CSS"],
            JobStatus::Active,
            58,
            690,
            14,
            manager,
        ),
        job(
            "Product Designer",
            "Design",
            "Amsterdam, Netherlands",
            EmploymentType::FullTime,
            ExperienceLevel::Mid,
            60_000,
            80_000,
            &["Figma", "Prototyping", "User research"],
            JobStatus::Active,
            27,
            344,
            10,
            admin,
        ),
        job(
            "Data Analyst",
            "Analytics",
            "London, UK",
            EmploymentType::Contract,
            ExperienceLevel::Mid,
            55_000,
            70_000,
            &["SQL", "Python", "Tableau"],
            JobStatus::Paused,
            12,
            198,
            30,
            admin,
        ),
        job(
            "Talent Acquisition Partner",
            "Talent",
            "Paris, France",
            EmploymentType::FullTime,
            ExperienceLevel::Senior,
            50_000,
            68_000,
            &["Sourcing", "Interviewing", "ATS"],
            JobStatus::Active,
            19,
            240,
            7,
            recruiter,
        ),
        job(
            "Engineering Intern",
            "Engineering",
            "Berlin, Germany",
            EmploymentType::Internship,
            ExperienceLevel::Entry,
            24_000,
            28_000,
            &["Python", "Git"],
            JobStatus::Draft,
            0,
            12,
            2,
            manager,
        ),
        job(
            "Head of Finance",
            "Finance",
            "Zurich, Switzerland",
            EmploymentType::FullTime,
            ExperienceLevel::Executive,
            140_000,
            180_000,
            &["IFRS", "Forecasting", "Leadership"],
            JobStatus::Active,
            8,
            156,
            25,
            admin,
        ),
        job(
            "Customer Support Specialist",
            "Support",
            "Remote",
            EmploymentType::PartTime,
            ExperienceLevel::Entry,
            28_000,
            36_000,
            &["Zendesk", "Empathy"],
            JobStatus::Closed,
            73,
            820,
            65,
            recruiter,
        ),
    ];

    let resumes = vec![
        resume(
            "Elena Petrova",
            "elena.petrova@example.com",
            "Backend Engineer",
            7,
            &["Rust", "Go", "PostgreSQL"],
            "MSc Computer Science",
            "TU Munich",
            2017,
            PipelineStatus::Shortlisted,
            Some(92),
            "linkedin",
            12,
            2,
            recruiter,
        ),
        resume(
            "Tomás Silva",
            "tomas.silva@example.com",
            "Full-Stack Developer",
            5,
            &["TypeScript", "Node.js", "React"],
            "BSc Software Engineering",
            "University of Porto",
            2019,
            PipelineStatus::Interviewed,
            Some(84),
            "careers_page",
            18,
            4,
            recruiter,
        ),
        resume(
            "Aisha Bello",
            "aisha.bello@example.com",
            "Product Designer",
            6,
            &["Figma", "Design systems", "Accessibility"],
            "BA Interaction Design",
            "Goldsmiths",
            2018,
            PipelineStatus::Reviewed,
            Some(88),
            "referral",
            9,
            9,
            admin,
        ),
        resume(
            "Jonas Weber",
            "jonas.weber@example.com",
            "Data Analyst",
            3,
            &["SQL", "Python", "dbt"],
            "BSc Statistics",
            "LMU Munich",
            2021,
            PipelineStatus::New,
            Some(71),
            "linkedin",
            15,
            15,
            recruiter,
        ),
        resume(
            "Mei Lin",
            "mei.lin@example.com",
            "Frontend Engineer",
            4,
            &["React", "TypeScript", "Testing"],
            "BSc Computer Science",
            "NUS",
            2020,
            PipelineStatus::Hired,
            Some(95),
            "agency",
            60,
            20,
            recruiter,
        ),
        resume(
            "Oliver Grant",
            "oliver.grant@example.com",
            "DevOps Engineer",
            8,
            &["Kubernetes", "Terraform", "AWS"],
            "BEng Computer Engineering",
            "University of Edinburgh",
            2015,
            PipelineStatus::Rejected,
            Some(55),
            "careers_page",
            40,
            30,
            recruiter,
        ),
        resume(
            "Fatima Al-Sayed",
            "fatima.alsayed@example.com",
            "Talent Partner",
            9,
            &["Sourcing", "Employer branding"],
            "BA Psychology",
            "AUC",
            2014,
            PipelineStatus::Shortlisted,
            Some(90),
            "referral",
            6,
            1,
            admin,
        ),
        resume(
            "Pavel Novak",
            "pavel.novak@example.com",
            "Backend Engineer",
            2,
            &["Java", "Spring"],
            "BSc Informatics",
            "Charles University",
            2022,
            PipelineStatus::New,
            Some(62),
            "linkedin",
            11,
            11,
            recruiter,
        ),
        resume(
            "Ingrid Johansson",
            "ingrid.johansson@example.com",
            "Finance Manager",
            11,
            &["IFRS", "Excel", "SAP"],
            "MSc Finance",
            "Stockholm School of Economics",
            2012,
            PipelineStatus::Reviewed,
            Some(79),
            "agency",
            22,
            10,
            admin,
        ),
        resume(
            "Kwame Mensah",
            "kwame.mensah@example.com",
            "Support Specialist",
            3,
            &["Zendesk", "Intercom"],
            "BA Communications",
            "University of Ghana",
            2020,
            PipelineStatus::Interviewed,
            Some(81),
            "careers_page",
            28,
            5,
            recruiter,
        ),
        resume(
            "Lucia Fernandez",
            "lucia.fernandez@example.com",
            "QA Engineer",
            5,
            &["Cypress", "Playwright", "CI"],
            "BSc Computer Science",
            "UPM Madrid",
            2018,
            PipelineStatus::New,
            None,
            "linkedin",
            1,
            1,
            recruiter,
        ),
        resume(
            "Yusuf Demir",
            "yusuf.demir@example.com",
            "Mobile Engineer",
            6,
            &["Kotlin", "Swift"],
            "BSc Computer Engineering",
            "Bogazici University",
            2017,
            PipelineStatus::Reviewed,
            Some(74),
            "referral",
            14,
            12,
            recruiter,
        ),
    ];

    SeedData {
        members,
        jobs,
        resumes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_shape_matches_the_demo_dataset() {
        let data = demo_data();
        assert_eq!(data.members.len(), 6);
        assert_eq!(data.jobs.len(), 8);
        assert_eq!(data.resumes.len(), 12);
    }

    #[test]
    fn pending_member_has_no_credentials() {
        let data = demo_data();
        let pending: Vec<_> = data
            .members
            .iter()
            .filter(|m| m.status == MemberStatus::Pending)
            .collect();
        assert_eq!(pending.len(), 1);
        assert!(pending[0].password_hash.is_none());
    }

    #[test]
    fn seeded_jobs_reference_seeded_members() {
        let data = demo_data();
        for job in &data.jobs {
            assert!(data.members.iter().any(|m| m.id == job.created_by));
        }
    }

    #[test]
    fn some_seeded_resumes_are_stale() {
        // The notification sweep needs resumes stuck in early pipeline
        // stages for more than a week.
        let data = demo_data();
        let cutoff = Utc::now() - Duration::days(7);
        let stale = data
            .resumes
            .iter()
            .filter(|r| {
                matches!(r.status, PipelineStatus::New | PipelineStatus::Reviewed)
                    && r.updated_at < cutoff
            })
            .count();
        assert!(stale >= 2);
    }
}
