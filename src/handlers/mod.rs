pub mod analytics;
pub mod auth;
pub mod errors_handoff;
pub mod files;
pub mod jobs;
pub mod notifications;
pub mod resumes;
pub mod team;
