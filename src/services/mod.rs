pub mod analytics;
pub mod notification;
pub mod upload;
