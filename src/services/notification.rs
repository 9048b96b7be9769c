use anyhow::Result;
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::resume::{PipelineStatus, Resume};
use crate::store::CollectionStore;

pub struct NotificationService {
    pub store: Arc<CollectionStore>,
}

impl NotificationService {
    pub fn new(store: Arc<CollectionStore>) -> Self {
        Self { store }
    }

    /// Resumes sitting in the early pipeline stages with no movement for
    /// the given number of days, oldest first.
    pub async fn find_stale_resumes(&self, days: i32) -> Vec<Resume> {
        let cutoff_date = Utc::now() - Duration::days(days as i64);

        let mut stale: Vec<Resume> = self
            .store
            .list_resumes()
            .await
            .into_iter()
            .filter(|resume| {
                resume.updated_at < cutoff_date
                    && matches!(
                        resume.status,
                        PipelineStatus::New | PipelineStatus::Reviewed
                    )
            })
            .collect();
        stale.sort_by_key(|resume| resume.updated_at);
        stale
    }

    pub async fn send_notification(&self, recruiter_email: &str, resumes: &[Resume]) -> Result<()> {
        // In a real implementation, this would send emails or push notifications
        // For now, we'll just log the notification
        tracing::info!(
            "Notification: recruiter {} has {} stale resumes: {:?}",
            recruiter_email,
            resumes.len(),
            resumes
                .iter()
                .map(|r| &r.candidate_name)
                .collect::<Vec<_>>()
        );

        Ok(())
    }

    pub async fn process_stale_notifications(&self) -> Result<usize> {
        self.process_stale_notifications_with_days(7).await
    }

    /// Group stale resumes by the member who uploaded them and notify each.
    /// Returns the number of recruiters notified.
    pub async fn process_stale_notifications_with_days(&self, days: i32) -> Result<usize> {
        let stale_resumes = self.find_stale_resumes(days).await;

        let mut per_recruiter: std::collections::HashMap<Uuid, Vec<Resume>> =
            std::collections::HashMap::new();
        for resume in stale_resumes {
            per_recruiter
                .entry(resume.uploaded_by)
                .or_insert_with(Vec::new)
                .push(resume);
        }

        let mut notified = 0;
        for (member_id, resumes) in per_recruiter {
            let Ok(member) = self.store.get_member(member_id).await else {
                tracing::warn!("Stale resumes reference unknown member {}", member_id);
                continue;
            };

            if let Err(e) = self.send_notification(&member.email, &resumes).await {
                tracing::error!("Failed to send notification to {}: {}", member.email, e);
            } else {
                notified += 1;
            }
        }

        Ok(notified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stale_sweep_only_returns_early_stage_resumes_past_cutoff() {
        let service = NotificationService::new(Arc::new(CollectionStore::seeded()));
        let stale = service.find_stale_resumes(7).await;

        assert!(!stale.is_empty());
        let cutoff = Utc::now() - Duration::days(7);
        for resume in &stale {
            assert!(resume.updated_at < cutoff);
            assert!(matches!(
                resume.status,
                PipelineStatus::New | PipelineStatus::Reviewed
            ));
        }
    }

    #[tokio::test]
    async fn stale_sweep_is_oldest_first() {
        let service = NotificationService::new(Arc::new(CollectionStore::seeded()));
        let stale = service.find_stale_resumes(7).await;
        for pair in stale.windows(2) {
            assert!(pair[0].updated_at <= pair[1].updated_at);
        }
    }

    #[tokio::test]
    async fn huge_cutoff_finds_nothing() {
        let service = NotificationService::new(Arc::new(CollectionStore::seeded()));
        let stale = service.find_stale_resumes(10_000).await;
        assert!(stale.is_empty());
    }

    #[tokio::test]
    async fn processing_groups_by_uploader() {
        let service = NotificationService::new(Arc::new(CollectionStore::seeded()));
        let notified = service.process_stale_notifications().await.unwrap();
        assert!(notified >= 1);
    }
}
