// Service exports
pub mod cache;
pub mod catalog;
pub mod digest;
pub mod mailer;
pub mod pipeline;
pub mod scheduler;

pub use cache::{CacheKey, CacheStats, RankingCache};
pub use catalog::{CatalogError, JsonFeedSource, OpportunitySource, StaticCatalog};
pub use digest::RenderedEmail;
pub use mailer::{DeliveryReceipt, DisabledMailer, EmailMessage, MailError, Mailer, MemoryMailer, OutboxMailer};
pub use pipeline::{DigestPipeline, DigestTaskError, SchedulerStats, TaskKind, TaskReport};
pub use scheduler::{DigestScheduler, JobView, ScheduleSettings, SchedulerError, SchedulerHandle, SchedulerStatus};
