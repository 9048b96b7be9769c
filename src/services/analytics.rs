use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::handlers::analytics::{
    ActivityData, AnalyticsResponse, DepartmentStats, FunnelStage, MatchScoreStats, SkillStat,
};
use crate::models::{job::JobStatus, resume::PipelineStatus};
use crate::store::CollectionStore;
use crate::utils::logger::LOGGER;

#[derive(Debug)]
pub struct AnalyticsService {
    store: Arc<CollectionStore>,
}

impl AnalyticsService {
    pub fn new(store: Arc<CollectionStore>) -> Self {
        Self { store }
    }

    pub async fn get_dashboard_analytics(&self) -> AnalyticsResponse {
        let start_time = Instant::now();

        LOGGER.log_business_event("analytics_request_started", None, HashMap::new());

        let jobs = self.store.list_jobs().await;
        let resumes = self.store.list_resumes().await;
        let members = self.store.list_members().await;

        let mut job_status_breakdown: HashMap<String, usize> = HashMap::new();
        for job in &jobs {
            *job_status_breakdown
                .entry(job.status.as_str().to_string())
                .or_insert(0) += 1;
        }

        let mut resume_status_breakdown: HashMap<String, usize> = HashMap::new();
        for resume in &resumes {
            *resume_status_breakdown
                .entry(resume.status.as_str().to_string())
                .or_insert(0) += 1;
        }

        let mut by_department: HashMap<String, (usize, u32)> = HashMap::new();
        for job in &jobs {
            let entry = by_department.entry(job.department.clone()).or_insert((0, 0));
            if job.status == JobStatus::Active {
                entry.0 += 1;
            }
            entry.1 += job.applicants;
        }
        let mut department_stats: Vec<DepartmentStats> = by_department
            .into_iter()
            .map(|(department, (open_jobs, applicants))| DepartmentStats {
                department,
                open_jobs,
                applicants,
            })
            .collect();
        department_stats.sort_by(|a, b| b.applicants.cmp(&a.applicants));

        // Stage counts rendered by the dashboard as percentage bars.
        let pipeline_funnel: Vec<FunnelStage> = PipelineStatus::PIPELINE_ORDER
            .iter()
            .map(|stage| {
                let count = resumes.iter().filter(|r| r.status == *stage).count();
                let percentage = if resumes.is_empty() {
                    0.0
                } else {
                    (count as f64 / resumes.len() as f64 * 1000.0).round() / 10.0
                };
                FunnelStage {
                    stage: stage.as_str().to_string(),
                    count,
                    percentage,
                }
            })
            .collect();

        let mut skill_counts: HashMap<String, usize> = HashMap::new();
        for resume in &resumes {
            for skill in &resume.skills {
                *skill_counts.entry(skill.clone()).or_insert(0) += 1;
            }
        }
        let mut top_skills: Vec<SkillStat> = skill_counts
            .into_iter()
            .map(|(skill, resume_count)| SkillStat {
                skill,
                resume_count,
            })
            .collect();
        top_skills.sort_by(|a, b| {
            b.resume_count
                .cmp(&a.resume_count)
                .then_with(|| a.skill.cmp(&b.skill))
        });
        top_skills.truncate(10);

        let scores: Vec<u8> = resumes.iter().filter_map(|r| r.match_score).collect();
        let match_scores = MatchScoreStats {
            scored_resumes: scores.len(),
            average: if scores.is_empty() {
                0.0
            } else {
                let sum: u32 = scores.iter().map(|s| *s as u32).sum();
                (sum as f64 / scores.len() as f64 * 10.0).round() / 10.0
            },
            highest: scores.iter().copied().max().unwrap_or(0),
            lowest: scores.iter().copied().min().unwrap_or(0),
        };

        let mut source_breakdown: HashMap<String, usize> = HashMap::new();
        for resume in &resumes {
            *source_breakdown.entry(resume.source.clone()).or_insert(0) += 1;
        }

        let response = AnalyticsResponse {
            total_jobs: jobs.len(),
            total_resumes: resumes.len(),
            total_members: members.len(),
            active_jobs: jobs.iter().filter(|j| j.status == JobStatus::Active).count(),
            job_status_breakdown,
            resume_status_breakdown,
            department_stats,
            pipeline_funnel,
            top_skills,
            match_scores,
            source_breakdown,
        };

        let duration = start_time.elapsed();
        LOGGER.log_performance_metric(
            "analytics_total_duration",
            duration.as_millis() as f64,
            HashMap::new(),
        );
        LOGGER.log_business_event("analytics_request_completed", None, HashMap::new());

        response
    }

    /// Per-day posting/intake counts over the trailing window, oldest first.
    pub async fn get_activity(&self, days_back: i64) -> Vec<ActivityData> {
        let start_time = Instant::now();

        let jobs = self.store.list_jobs().await;
        let resumes = self.store.list_resumes().await;

        let today = Utc::now().date_naive();
        let mut activity = Vec::with_capacity(days_back as usize);
        for offset in (0..days_back).rev() {
            let date = today - Duration::days(offset);
            let jobs_posted = jobs.iter().filter(|j| j.posted_date == date).count();
            let resumes_received = resumes
                .iter()
                .filter(|r| r.uploaded_at.date_naive() == date)
                .count();
            activity.push(ActivityData {
                date: date.format("%Y-%m-%d").to_string(),
                jobs_posted,
                resumes_received,
                total_activity: jobs_posted + resumes_received,
            });
        }

        LOGGER.log_performance_metric(
            "activity_total_duration",
            start_time.elapsed().as_millis() as f64,
            HashMap::new(),
        );

        activity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn funnel_covers_every_stage_and_sums_to_all_resumes() {
        let service = AnalyticsService::new(Arc::new(CollectionStore::seeded()));
        let analytics = service.get_dashboard_analytics().await;

        assert_eq!(analytics.pipeline_funnel.len(), 6);
        let total: usize = analytics.pipeline_funnel.iter().map(|s| s.count).sum();
        assert_eq!(total, analytics.total_resumes);
        for stage in &analytics.pipeline_funnel {
            assert!(stage.percentage >= 0.0 && stage.percentage <= 100.0);
        }
    }

    #[tokio::test]
    async fn breakdown_totals_match_collection_sizes() {
        let service = AnalyticsService::new(Arc::new(CollectionStore::seeded()));
        let analytics = service.get_dashboard_analytics().await;

        let job_total: usize = analytics.job_status_breakdown.values().sum();
        assert_eq!(job_total, analytics.total_jobs);
        let resume_total: usize = analytics.resume_status_breakdown.values().sum();
        assert_eq!(resume_total, analytics.total_resumes);
    }

    #[tokio::test]
    async fn match_score_stats_stay_in_range() {
        let service = AnalyticsService::new(Arc::new(CollectionStore::seeded()));
        let analytics = service.get_dashboard_analytics().await;

        let scores = analytics.match_scores;
        assert!(scores.scored_resumes > 0);
        assert!(scores.lowest <= scores.highest);
        assert!(scores.average >= scores.lowest as f64);
        assert!(scores.average <= scores.highest as f64);
    }

    #[tokio::test]
    async fn activity_window_is_one_entry_per_day_oldest_first() {
        let service = AnalyticsService::new(Arc::new(CollectionStore::seeded()));
        let activity = service.get_activity(30).await;

        assert_eq!(activity.len(), 30);
        let last = activity.last().unwrap();
        assert_eq!(last.date, Utc::now().date_naive().format("%Y-%m-%d").to_string());
    }
}
