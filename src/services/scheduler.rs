//! Periodic digest scheduler.
//!
//! One tokio task owns the profile, the job table and the statistics.
//! Everything else talks to it through a cloneable [`SchedulerHandle`];
//! nothing here is process-global.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Duration as ChronoDuration, Local, NaiveDateTime, NaiveTime, Timelike, Utc, Weekday};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::models::{NotificationFrequency, UserProfile};
use crate::services::pipeline::{DigestPipeline, SchedulerStats, TaskKind, TaskReport};

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Scheduler is not running (channel closed)")]
    Closed,
}

/// When scheduled jobs fire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleSettings {
    pub tick: Duration,
    pub send_at: NaiveTime,
    pub maintenance_at: NaiveTime,
    pub weekly_on: Weekday,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(60),
            send_at: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            maintenance_at: NaiveTime::from_hms_opt(2, 0, 0).unwrap_or(NaiveTime::MIN),
            weekly_on: Weekday::Mon,
        }
    }
}

/// A job and the next local time it is due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Job {
    pub task: TaskKind,
    pub next_run: NaiveDateTime,
}

/// Public view of a job for status output
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub task: TaskKind,
    pub next_run: String,
}

impl From<&Job> for JobView {
    fn from(job: &Job) -> Self {
        Self {
            task: job.task,
            next_run: job.next_run.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Snapshot returned by [`SchedulerHandle::status`]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatus {
    pub running: bool,
    pub stats: SchedulerStats,
    pub next_runs: Vec<JobView>,
}

/// Next time-of-day `at` strictly after `now`
pub fn next_daily_run(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        today + ChronoDuration::days(1)
    }
}

/// Next `weekday` at `at` strictly after `now`
pub fn next_weekly_run(now: NaiveDateTime, weekday: Weekday, at: NaiveTime) -> NaiveDateTime {
    let ahead = (7 + weekday.num_days_from_monday() as i64
        - now.weekday().num_days_from_monday() as i64)
        % 7;
    let candidate = (now.date() + ChronoDuration::days(ahead)).and_time(at);
    if candidate > now {
        candidate
    } else {
        candidate + ChronoDuration::days(7)
    }
}

/// Top of the next hour
pub fn next_hourly_run(now: NaiveDateTime) -> NaiveDateTime {
    let truncated = now
        .date()
        .and_hms_opt(now.hour(), 0, 0)
        .unwrap_or(now);
    truncated + ChronoDuration::hours(1)
}

/// Job table for a notification frequency
///
/// Maintenance and the hourly urgent check run regardless of frequency.
pub fn build_jobs(
    frequency: NotificationFrequency,
    settings: &ScheduleSettings,
    now: NaiveDateTime,
) -> Vec<Job> {
    let mut jobs = Vec::with_capacity(4);

    match frequency {
        NotificationFrequency::Daily => jobs.push(Job {
            task: TaskKind::Daily,
            next_run: next_daily_run(now, settings.send_at),
        }),
        NotificationFrequency::Weekly => jobs.push(Job {
            task: TaskKind::Weekly,
            next_run: next_weekly_run(now, settings.weekly_on, settings.send_at),
        }),
        NotificationFrequency::UrgentOnly => {}
    }

    jobs.push(Job {
        task: TaskKind::Maintenance,
        next_run: next_daily_run(now, settings.maintenance_at),
    });
    jobs.push(Job {
        task: TaskKind::Urgent,
        next_run: next_hourly_run(now),
    });

    jobs
}

fn reschedule(job: &Job, settings: &ScheduleSettings, now: NaiveDateTime) -> NaiveDateTime {
    match job.task {
        TaskKind::Daily => next_daily_run(now, settings.send_at),
        TaskKind::Weekly => next_weekly_run(now, settings.weekly_on, settings.send_at),
        TaskKind::Maintenance => next_daily_run(now, settings.maintenance_at),
        TaskKind::Urgent => next_hourly_run(now),
    }
}

enum Command {
    Start,
    Stop,
    RunNow {
        task: TaskKind,
        reply: oneshot::Sender<TaskReport>,
    },
    Status(oneshot::Sender<SchedulerStatus>),
    Profile(oneshot::Sender<UserProfile>),
    UpdateProfile {
        profile: Box<UserProfile>,
        reply: oneshot::Sender<Vec<JobView>>,
    },
}

/// Handle to the scheduler task
#[derive(Clone)]
pub struct SchedulerHandle {
    tx: mpsc::Sender<Command>,
}

impl SchedulerHandle {
    /// Begin firing scheduled jobs; a second start is a no-op
    pub async fn start(&self) -> Result<(), SchedulerError> {
        self.send(Command::Start).await
    }

    pub async fn stop(&self) -> Result<(), SchedulerError> {
        self.send(Command::Stop).await
    }

    /// Run a task immediately, whether or not the scheduler is started
    pub async fn run_now(&self, task: TaskKind) -> Result<TaskReport, SchedulerError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::RunNow { task, reply }).await?;
        rx.await.map_err(|_| SchedulerError::Closed)
    }

    pub async fn status(&self) -> Result<SchedulerStatus, SchedulerError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Status(reply)).await?;
        rx.await.map_err(|_| SchedulerError::Closed)
    }

    pub async fn stats(&self) -> Result<SchedulerStats, SchedulerError> {
        Ok(self.status().await?.stats)
    }

    pub async fn next_runs(&self) -> Result<Vec<JobView>, SchedulerError> {
        Ok(self.status().await?.next_runs)
    }

    pub async fn is_running(&self) -> Result<bool, SchedulerError> {
        Ok(self.status().await?.running)
    }

    pub async fn profile(&self) -> Result<UserProfile, SchedulerError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Profile(reply)).await?;
        rx.await.map_err(|_| SchedulerError::Closed)
    }

    /// Replace the profile and rebuild the job table; returns the new jobs
    pub async fn update_profile(&self, profile: UserProfile) -> Result<Vec<JobView>, SchedulerError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::UpdateProfile {
            profile: Box::new(profile),
            reply,
        })
        .await?;
        rx.await.map_err(|_| SchedulerError::Closed)
    }

    async fn send(&self, command: Command) -> Result<(), SchedulerError> {
        self.tx.send(command).await.map_err(|_| SchedulerError::Closed)
    }
}

/// The scheduler actor
pub struct DigestScheduler {
    pipeline: Arc<DigestPipeline>,
    profile: UserProfile,
    settings: ScheduleSettings,
    jobs: Vec<Job>,
    stats: SchedulerStats,
    running: bool,
    rx: mpsc::Receiver<Command>,
}

impl DigestScheduler {
    pub fn new(
        pipeline: Arc<DigestPipeline>,
        profile: UserProfile,
        settings: ScheduleSettings,
    ) -> (Self, SchedulerHandle) {
        let (tx, rx) = mpsc::channel(32);
        let jobs = build_jobs(profile.notification_frequency, &settings, Local::now().naive_local());

        let scheduler = Self {
            pipeline,
            profile,
            settings,
            jobs,
            stats: SchedulerStats::new(Utc::now()),
            running: false,
            rx,
        };

        (scheduler, SchedulerHandle { tx })
    }

    /// Spawn onto the current tokio runtime and return the handle
    pub fn spawn(
        pipeline: Arc<DigestPipeline>,
        profile: UserProfile,
        settings: ScheduleSettings,
    ) -> SchedulerHandle {
        let (scheduler, handle) = Self::new(pipeline, profile, settings);
        tokio::spawn(scheduler.run());
        handle
    }

    /// Run until every handle is dropped
    pub async fn run(mut self) {
        info!(
            "Scheduler configured for {:?} notifications",
            self.profile.notification_frequency
        );

        let mut ticker = tokio::time::interval(self.settings.tick);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = self.rx.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => break,
                },
                _ = ticker.tick() => {
                    if self.running {
                        self.run_due(Local::now().naive_local()).await;
                    }
                }
            }
        }

        info!("Scheduler loop ended");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Start => {
                if self.running {
                    warn!("Scheduler is already running");
                } else {
                    self.running = true;
                    info!("Scheduler started");
                }
            }
            Command::Stop => {
                self.running = false;
                info!("Scheduler stopped");
            }
            Command::RunNow { task, reply } => {
                let report = self.execute(task).await;
                let _ = reply.send(report);
            }
            Command::Status(reply) => {
                let _ = reply.send(self.status());
            }
            Command::Profile(reply) => {
                let _ = reply.send(self.profile.clone());
            }
            Command::UpdateProfile { profile, reply } => {
                self.profile = *profile;
                self.jobs = build_jobs(
                    self.profile.notification_frequency,
                    &self.settings,
                    Local::now().naive_local(),
                );
                self.pipeline.cache().invalidate_all();
                info!("User profile updated and schedule reconfigured");
                let _ = reply.send(self.jobs.iter().map(JobView::from).collect());
            }
        }
    }

    /// Fire every job due at `now` and push each one's next run forward
    async fn run_due(&mut self, now: NaiveDateTime) {
        let due: Vec<usize> = self
            .jobs
            .iter()
            .enumerate()
            .filter(|(_, job)| job.next_run <= now)
            .map(|(i, _)| i)
            .collect();

        for i in due {
            let task = self.jobs[i].task;
            debug!("Job {} due", task);
            self.execute(task).await;
            let next = reschedule(&self.jobs[i], &self.settings, now);
            self.jobs[i].next_run = next;
        }
    }

    async fn execute(&mut self, task: TaskKind) -> TaskReport {
        let report = self.pipeline.run(task, &self.profile, &self.stats).await;
        self.stats = self.stats.clone().with_report(&report);
        report
    }

    fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            running: self.running,
            stats: self.stats.clone(),
            next_runs: self.jobs.iter().map(JobView::from).collect(),
        }
    }
}
