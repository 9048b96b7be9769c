pub mod seed;

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    job::Job,
    member::TeamMember,
    resume::Resume,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
}

/// Transient error-page state handed off between screens; consumed exactly
/// once by the reader.
#[derive(Debug, Clone)]
pub struct ErrorHandoff {
    pub status_code: u16,
    pub message: String,
    pub stored_at: DateTime<Utc>,
}

/// The in-memory record sets backing every list view, plus the small
/// transient tables (OAuth state nonces, upload progress, error hand-offs).
/// All reads hand out snapshots; the query pipeline never holds a lock.
#[derive(Debug, Default)]
pub struct CollectionStore {
    jobs: RwLock<Vec<Job>>,
    resumes: RwLock<Vec<Resume>>,
    members: RwLock<Vec<TeamMember>>,
    oauth_states: RwLock<HashMap<String, DateTime<Utc>>>,
    upload_progress: RwLock<HashMap<Uuid, u8>>,
    error_handoffs: RwLock<HashMap<Uuid, ErrorHandoff>>,
}

impl CollectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the demo records the dashboard ships with.
    pub fn seeded() -> Self {
        let store = Self::new();
        let data = seed::demo_data();
        {
            let mut members = store.members.try_write().expect("fresh store");
            *members = data.members;
            let mut jobs = store.jobs.try_write().expect("fresh store");
            *jobs = data.jobs;
            let mut resumes = store.resumes.try_write().expect("fresh store");
            *resumes = data.resumes;
        }
        store
    }

    // ---- jobs ----

    pub async fn list_jobs(&self) -> Vec<Job> {
        self.jobs.read().await.clone()
    }

    pub async fn get_job(&self, id: Uuid) -> Result<Job, StoreError> {
        self.jobs
            .read()
            .await
            .iter()
            .find(|job| job.id == id)
            .cloned()
            .ok_or(StoreError::NotFound("job"))
    }

    pub async fn insert_job(&self, job: Job) -> Job {
        let mut jobs = self.jobs.write().await;
        jobs.push(job.clone());
        job
    }

    pub async fn update_job<F>(&self, id: Uuid, apply: F) -> Result<Job, StoreError>
    where
        F: FnOnce(&mut Job),
    {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .iter_mut()
            .find(|job| job.id == id)
            .ok_or(StoreError::NotFound("job"))?;
        apply(job);
        job.updated_at = Utc::now();
        Ok(job.clone())
    }

    /// View counters do not count as edits, so `updated_at` stays put.
    pub async fn record_job_view(&self, id: Uuid) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .iter_mut()
            .find(|job| job.id == id)
            .ok_or(StoreError::NotFound("job"))?;
        job.views += 1;
        Ok(())
    }

    pub async fn delete_job(&self, id: Uuid) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|job| job.id != id);
        if jobs.len() == before {
            return Err(StoreError::NotFound("job"));
        }
        Ok(())
    }

    // ---- resumes ----

    pub async fn list_resumes(&self) -> Vec<Resume> {
        self.resumes.read().await.clone()
    }

    pub async fn get_resume(&self, id: Uuid) -> Result<Resume, StoreError> {
        self.resumes
            .read()
            .await
            .iter()
            .find(|resume| resume.id == id)
            .cloned()
            .ok_or(StoreError::NotFound("resume"))
    }

    pub async fn insert_resume(&self, resume: Resume) -> Resume {
        let mut resumes = self.resumes.write().await;
        resumes.push(resume.clone());
        resume
    }

    pub async fn update_resume<F>(&self, id: Uuid, apply: F) -> Result<Resume, StoreError>
    where
        F: FnOnce(&mut Resume),
    {
        let mut resumes = self.resumes.write().await;
        let resume = resumes
            .iter_mut()
            .find(|resume| resume.id == id)
            .ok_or(StoreError::NotFound("resume"))?;
        apply(resume);
        resume.updated_at = Utc::now();
        Ok(resume.clone())
    }

    pub async fn delete_resume(&self, id: Uuid) -> Result<(), StoreError> {
        let mut resumes = self.resumes.write().await;
        let before = resumes.len();
        resumes.retain(|resume| resume.id != id);
        if resumes.len() == before {
            return Err(StoreError::NotFound("resume"));
        }
        Ok(())
    }

    // ---- team members ----

    pub async fn list_members(&self) -> Vec<TeamMember> {
        self.members.read().await.clone()
    }

    pub async fn get_member(&self, id: Uuid) -> Result<TeamMember, StoreError> {
        self.members
            .read()
            .await
            .iter()
            .find(|member| member.id == id)
            .cloned()
            .ok_or(StoreError::NotFound("team member"))
    }

    pub async fn find_member_by_email(&self, email: &str) -> Option<TeamMember> {
        let email = email.to_lowercase();
        self.members
            .read()
            .await
            .iter()
            .find(|member| member.email.to_lowercase() == email)
            .cloned()
    }

    pub async fn insert_member(&self, member: TeamMember) -> Result<TeamMember, StoreError> {
        let mut members = self.members.write().await;
        if members
            .iter()
            .any(|existing| existing.email.eq_ignore_ascii_case(&member.email))
        {
            return Err(StoreError::Conflict(format!(
                "a member with email {} already exists",
                member.email
            )));
        }
        members.push(member.clone());
        Ok(member)
    }

    pub async fn update_member<F>(&self, id: Uuid, apply: F) -> Result<TeamMember, StoreError>
    where
        F: FnOnce(&mut TeamMember),
    {
        let mut members = self.members.write().await;
        let member = members
            .iter_mut()
            .find(|member| member.id == id)
            .ok_or(StoreError::NotFound("team member"))?;
        apply(member);
        member.updated_at = Utc::now();
        Ok(member.clone())
    }

    // ---- oauth state nonces ----

    pub async fn insert_oauth_state(&self, state: String) {
        self.oauth_states
            .write()
            .await
            .insert(state, Utc::now());
    }

    /// Single-use check: the nonce is removed on first sight, so a replayed
    /// `state` fails even when it originally existed.
    pub async fn consume_oauth_state(&self, state: &str, max_age: Duration) -> bool {
        match self.oauth_states.write().await.remove(state) {
            Some(issued_at) => Utc::now() - issued_at <= max_age,
            None => false,
        }
    }

    // ---- upload progress ----

    pub async fn set_upload_progress(&self, batch_id: Uuid, percent: u8) {
        self.upload_progress
            .write()
            .await
            .insert(batch_id, percent.min(100));
    }

    pub async fn upload_progress(&self, batch_id: Uuid) -> Option<u8> {
        self.upload_progress.read().await.get(&batch_id).copied()
    }

    // ---- error-page hand-off ----

    pub async fn put_error_handoff(&self, status_code: u16, message: String) -> Uuid {
        let key = Uuid::new_v4();
        self.error_handoffs.write().await.insert(
            key,
            ErrorHandoff {
                status_code,
                message,
                stored_at: Utc::now(),
            },
        );
        key
    }

    /// One-shot read: the state is removed as it is returned.
    pub async fn take_error_handoff(&self, key: Uuid) -> Option<ErrorHandoff> {
        self.error_handoffs.write().await.remove(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::JobStatus;
    use crate::models::resume::PipelineStatus;

    #[tokio::test]
    async fn seeded_store_has_demo_collections() {
        let store = CollectionStore::seeded();
        assert_eq!(store.list_jobs().await.len(), 8);
        assert_eq!(store.list_resumes().await.len(), 12);
        assert_eq!(store.list_members().await.len(), 6);
    }

    #[tokio::test]
    async fn job_update_bumps_updated_at_and_overwrites_status() {
        let store = CollectionStore::seeded();
        let job = store.list_jobs().await.into_iter().next().unwrap();
        let before = job.updated_at;

        let updated = store
            .update_job(job.id, |job| job.status = JobStatus::Paused)
            .await
            .unwrap();
        assert_eq!(updated.status, JobStatus::Paused);
        assert!(updated.updated_at >= before);
    }

    #[tokio::test]
    async fn status_overwrite_is_unrestricted() {
        // No transition table: a hired resume can be set straight back to new.
        let store = CollectionStore::seeded();
        let resume = store.list_resumes().await.into_iter().next().unwrap();

        let hired = store
            .update_resume(resume.id, |r| r.status = PipelineStatus::Hired)
            .await
            .unwrap();
        assert_eq!(hired.status, PipelineStatus::Hired);

        let reverted = store
            .update_resume(resume.id, |r| r.status = PipelineStatus::New)
            .await
            .unwrap();
        assert_eq!(reverted.status, PipelineStatus::New);
    }

    #[tokio::test]
    async fn delete_unknown_job_is_not_found() {
        let store = CollectionStore::seeded();
        let err = store.delete_job(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn duplicate_member_email_conflicts() {
        let store = CollectionStore::seeded();
        let existing = store.list_members().await.into_iter().next().unwrap();
        let mut copy = existing.clone();
        copy.id = Uuid::new_v4();
        copy.email = existing.email.to_uppercase();

        let err = store.insert_member(copy).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn oauth_state_is_single_use() {
        let store = CollectionStore::new();
        store.insert_oauth_state("nonce-1".to_string()).await;

        assert!(store.consume_oauth_state("nonce-1", Duration::minutes(10)).await);
        assert!(!store.consume_oauth_state("nonce-1", Duration::minutes(10)).await);
        assert!(!store.consume_oauth_state("never-issued", Duration::minutes(10)).await);
    }

    #[tokio::test]
    async fn expired_oauth_state_is_rejected() {
        let store = CollectionStore::new();
        store.insert_oauth_state("nonce-2".to_string()).await;
        assert!(!store.consume_oauth_state("nonce-2", Duration::seconds(-1)).await);
    }

    #[tokio::test]
    async fn error_handoff_is_consumed_exactly_once() {
        let store = CollectionStore::new();
        let key = store
            .put_error_handoff(403, "You do not have access".to_string())
            .await;

        let first = store.take_error_handoff(key).await.unwrap();
        assert_eq!(first.status_code, 403);
        assert!(store.take_error_handoff(key).await.is_none());
    }

    #[tokio::test]
    async fn upload_progress_caps_at_one_hundred() {
        let store = CollectionStore::new();
        let batch = Uuid::new_v4();
        store.set_upload_progress(batch, 250).await;
        assert_eq!(store.upload_progress(batch).await, Some(100));
    }
}
