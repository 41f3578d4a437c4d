use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::filters::select_urgent;
use crate::core::Ranker;
use crate::models::{ScoredOpportunity, UserProfile};
use crate::services::cache::{CacheKey, RankingCache};
use crate::services::catalog::{CatalogError, OpportunitySource};
use crate::services::digest::{self, RenderedEmail, WeeklyFigures};
use crate::services::mailer::{DeliveryReceipt, MailError, Mailer};

/// Errors raised inside a digest task before it is folded into a report
#[derive(Debug, Error)]
pub enum DigestTaskError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    #[error("Statistics I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Statistics serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The periodic jobs the service knows how to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    #[default]
    Daily,
    Weekly,
    Urgent,
    Maintenance,
}

impl TaskKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::Daily => "daily",
            TaskKind::Weekly => "weekly",
            TaskKind::Urgent => "urgent",
            TaskKind::Maintenance => "maintenance",
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(TaskKind::Daily),
            "weekly" => Ok(TaskKind::Weekly),
            "urgent" => Ok(TaskKind::Urgent),
            "maintenance" => Ok(TaskKind::Maintenance),
            other => Err(format!("unknown task: {}", other)),
        }
    }
}

/// What one task run did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskReport {
    pub task: TaskKind,
    pub ran_at: DateTime<Utc>,
    pub emails_sent: u32,
    pub opportunities_found: u32,
    pub errors: u32,
    pub detail: String,
}

impl TaskReport {
    fn new(task: TaskKind, detail: impl Into<String>) -> Self {
        Self {
            task,
            ran_at: Utc::now(),
            emails_sent: 0,
            opportunities_found: 0,
            errors: 0,
            detail: detail.into(),
        }
    }

    fn failed(task: TaskKind, err: &DigestTaskError) -> Self {
        Self {
            errors: 1,
            ..Self::new(task, err.to_string())
        }
    }

    pub fn succeeded(&self) -> bool {
        self.errors == 0
    }
}

/// Running totals, owned by the scheduler and folded from [`TaskReport`]s
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStats {
    pub emails_sent: u64,
    pub opportunities_found: u64,
    pub errors: u64,
    pub runs: u64,
    pub last_run: Option<DateTime<Utc>>,
    pub started_at: DateTime<Utc>,
}

impl SchedulerStats {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            emails_sent: 0,
            opportunities_found: 0,
            errors: 0,
            runs: 0,
            last_run: None,
            started_at,
        }
    }

    /// Fold a report in, returning the updated totals
    #[must_use]
    pub fn with_report(mut self, report: &TaskReport) -> Self {
        self.emails_sent += u64::from(report.emails_sent);
        self.opportunities_found += u64::from(report.opportunities_found);
        self.errors += u64::from(report.errors);
        self.runs += 1;
        if report.succeeded() {
            self.last_run = Some(report.ran_at);
        }
        self
    }

    pub fn uptime_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.started_at).num_seconds()
    }
}

/// Everything a digest task needs, passed explicitly instead of held globally
pub struct DigestPipeline {
    source: Arc<dyn OpportunitySource>,
    mailer: Arc<dyn Mailer>,
    ranker: Ranker,
    cache: RankingCache,
    from_address: String,
    stats_path: PathBuf,
}

impl DigestPipeline {
    pub fn new(
        source: Arc<dyn OpportunitySource>,
        mailer: Arc<dyn Mailer>,
        ranker: Ranker,
        cache: RankingCache,
        from_address: impl Into<String>,
        stats_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            mailer,
            ranker,
            cache,
            from_address: from_address.into(),
            stats_path: stats_path.into(),
        }
    }

    pub fn ranker(&self) -> Ranker {
        self.ranker
    }

    pub fn cache(&self) -> &RankingCache {
        &self.cache
    }

    pub fn mail_transport(&self) -> &'static str {
        self.mailer.transport()
    }

    /// Ranked opportunities for a profile, served from cache when fresh
    pub async fn ranked(
        &self,
        profile: &UserProfile,
        limit: usize,
        today: NaiveDate,
    ) -> Result<Arc<Vec<ScoredOpportunity>>, CatalogError> {
        let key = CacheKey::ranking(profile, self.ranker.policy(), limit, today);
        if let Some(hit) = self.cache.get(&key).await {
            return Ok(hit);
        }

        let opportunities = self.source.fetch(today).await?;
        let result = self.ranker.rank_scored(&opportunities, profile, limit);
        tracing::debug!(
            "Ranked {} of {} opportunities from {}",
            result.ranked.len(),
            result.total_candidates,
            self.source.name()
        );

        Ok(self.cache.insert(key, result.ranked).await)
    }

    /// Render today's digest without sending it
    pub async fn preview_daily(
        &self,
        profile: &UserProfile,
        today: NaiveDate,
    ) -> Result<RenderedEmail, CatalogError> {
        let limit = usize::from(profile.max_opportunities_per_email);
        let ranked = self.ranked(profile, limit, today).await?;
        let opportunities: Vec<_> = ranked.iter().map(|s| s.opportunity.clone()).collect();
        Ok(digest::daily_digest(&opportunities, profile, today))
    }

    /// Run one task; failures are logged and counted, never propagated
    pub async fn run(&self, task: TaskKind, profile: &UserProfile, stats: &SchedulerStats) -> TaskReport {
        let today = Local::now().date_naive();
        let outcome = match task {
            TaskKind::Daily => self.daily(profile, today).await,
            TaskKind::Weekly => self.weekly(profile, stats, today).await,
            TaskKind::Urgent => self.urgent(profile, today).await,
            TaskKind::Maintenance => self.maintenance(stats).await,
        };

        match outcome {
            Ok(report) => {
                tracing::info!("Task {} finished: {}", task, report.detail);
                report
            }
            Err(e) => {
                tracing::error!("Error in {} task: {}", task, e);
                TaskReport::failed(task, &e)
            }
        }
    }

    /// Send a test message to `to`
    pub async fn send_test(&self, to: &str) -> Result<DeliveryReceipt, MailError> {
        let message = digest::test_email().into_message(&self.from_address, to);
        self.mailer.send(&message).await
    }

    async fn daily(&self, profile: &UserProfile, today: NaiveDate) -> Result<TaskReport, DigestTaskError> {
        tracing::info!(
            "Starting daily opportunities email generation (max {})",
            profile.max_opportunities_per_email
        );

        let limit = usize::from(profile.max_opportunities_per_email);
        let ranked = self.ranked(profile, limit, today).await?;
        if ranked.is_empty() {
            tracing::warn!("No opportunities found for daily email");
            return Ok(TaskReport::new(TaskKind::Daily, "no opportunities, nothing sent"));
        }

        let opportunities: Vec<_> = ranked.iter().map(|s| s.opportunity.clone()).collect();
        let message = digest::daily_digest(&opportunities, profile, today)
            .into_message(&self.from_address, &profile.email);
        self.mailer.send(&message).await?;

        Ok(TaskReport {
            emails_sent: 1,
            opportunities_found: opportunities.len() as u32,
            ..TaskReport::new(
                TaskKind::Daily,
                format!("sent {} opportunities to {}", opportunities.len(), profile.email),
            )
        })
    }

    async fn weekly(
        &self,
        profile: &UserProfile,
        stats: &SchedulerStats,
        today: NaiveDate,
    ) -> Result<TaskReport, DigestTaskError> {
        let figures = WeeklyFigures {
            opportunities_found: stats.opportunities_found,
            emails_sent: stats.emails_sent,
            uptime_secs: stats.uptime_secs(Utc::now()),
        };
        let message = digest::weekly_summary(profile, figures, today)
            .into_message(&self.from_address, &profile.email);
        self.mailer.send(&message).await?;

        Ok(TaskReport {
            emails_sent: 1,
            ..TaskReport::new(TaskKind::Weekly, format!("weekly summary sent to {}", profile.email))
        })
    }

    async fn urgent(&self, profile: &UserProfile, today: NaiveDate) -> Result<TaskReport, DigestTaskError> {
        tracing::debug!("Checking for urgent opportunities");

        let opportunities = self.source.fetch(today).await?;
        let urgent = select_urgent(&opportunities);
        if urgent.is_empty() {
            return Ok(TaskReport::new(TaskKind::Urgent, "no urgent deadlines"));
        }
        tracing::info!("Found {} urgent opportunities", urgent.len());

        let top = self.ranker.rank(&urgent, profile, 1);
        let Some(best) = top.first() else {
            return Ok(TaskReport::new(TaskKind::Urgent, "no urgent deadlines"));
        };

        let message = digest::urgent_alert(best, profile).into_message(&self.from_address, &profile.email);
        self.mailer.send(&message).await?;

        // Urgent alerts count sent mail only
        Ok(TaskReport {
            emails_sent: 1,
            ..TaskReport::new(TaskKind::Urgent, format!("alerted on {}", best.title()))
        })
    }

    async fn maintenance(&self, stats: &SchedulerStats) -> Result<TaskReport, DigestTaskError> {
        tracing::info!("Running daily maintenance");

        self.cache.purge_expired().await;

        if let Some(parent) = self.stats_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_vec_pretty(stats)?;
        tokio::fs::write(&self.stats_path, json).await?;
        tracing::debug!("Statistics saved to {}", self.stats_path.display());

        Ok(TaskReport::new(
            TaskKind::Maintenance,
            format!("cache purged, statistics saved to {}", self.stats_path.display()),
        ))
    }
}
