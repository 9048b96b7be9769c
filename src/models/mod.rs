pub mod job;
pub mod member;
pub mod resume;
