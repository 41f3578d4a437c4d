use config::{Config, ConfigError, Environment, File};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use validator::{Validate, ValidateEmail};

use crate::models::{NotificationFrequency, UserProfile, WeakCriteriaPolicy};
use crate::services::catalog::{JsonFeedSource, OpportunitySource, StaticCatalog};
use crate::services::mailer::{DisabledMailer, Mailer, MemoryMailer, OutboxMailer};
use crate::services::scheduler::ScheduleSettings;

/// Sender used by transports that do not need a real address
const FALLBACK_FROM_ADDRESS: &str = "opportunities@localhost";

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub profile: UserProfile,
    /// Optional TOML file holding the profile; replaces `[profile]`
    pub profile_path: Option<PathBuf>,
    pub scoring: ScoringSettings,
    pub digest: DigestSettings,
    pub email: EmailSettings,
    pub scheduler: SchedulerSettings,
    pub cache: CacheSettings,
    pub catalog: CatalogSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            workers: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weak_criteria_policy: WeakCriteriaPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DigestSettings {
    #[serde(default = "default_digest_limit")]
    pub default_limit: usize,
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
}

impl Default for DigestSettings {
    fn default() -> Self {
        Self {
            default_limit: default_digest_limit(),
            max_limit: default_max_limit(),
        }
    }
}

impl DigestSettings {
    /// Requested limit, or the default, capped at `max_limit`
    pub fn clamp(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_limit).min(self.max_limit)
    }
}

fn default_digest_limit() -> usize { 10 }
fn default_max_limit() -> usize { 50 }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailTransport {
    #[default]
    Outbox,
    Memory,
    Disabled,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailSettings {
    #[serde(default)]
    pub transport: MailTransport,
    pub from_address: Option<String>,
    #[serde(default = "default_outbox_dir")]
    pub outbox_dir: PathBuf,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            transport: MailTransport::default(),
            from_address: None,
            outbox_dir: default_outbox_dir(),
        }
    }
}

fn default_outbox_dir() -> PathBuf { PathBuf::from("data/outbox") }

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSettings {
    #[serde(default = "default_autostart")]
    pub autostart: bool,
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
    /// Local time of the daily and weekly digests, `HH:MM`
    #[serde(default = "default_send_at")]
    pub send_at: String,
    #[serde(default = "default_maintenance_at")]
    pub maintenance_at: String,
    #[serde(default = "default_stats_path")]
    pub stats_path: PathBuf,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            autostart: default_autostart(),
            tick_secs: default_tick_secs(),
            send_at: default_send_at(),
            maintenance_at: default_maintenance_at(),
            stats_path: default_stats_path(),
        }
    }
}

impl SchedulerSettings {
    pub fn schedule(&self) -> Result<ScheduleSettings, ConfigError> {
        Ok(ScheduleSettings {
            tick: Duration::from_secs(self.tick_secs.max(1)),
            send_at: parse_time("scheduler.send_at", &self.send_at)?,
            maintenance_at: parse_time("scheduler.maintenance_at", &self.maintenance_at)?,
            ..ScheduleSettings::default()
        })
    }
}

fn parse_time(key: &str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value.trim(), "%H:%M:%S"))
        .map_err(|e| ConfigError::Message(format!("{} must be HH:MM, got {:?}: {}", key, value, e)))
}

fn default_autostart() -> bool { true }
fn default_tick_secs() -> u64 { 60 }
fn default_send_at() -> String { "08:00".to_string() }
fn default_maintenance_at() -> String { "02:00".to_string() }
fn default_stats_path() -> PathBuf { PathBuf::from("data/stats.json") }

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_cache_capacity")]
    pub capacity: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
            capacity: default_cache_capacity(),
        }
    }
}

fn default_cache_ttl() -> u64 { 300 }
fn default_cache_capacity() -> u64 { 1000 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogSettings {
    /// JSON feed to read instead of the built-in catalog
    pub feed_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

/// Outcome of [`Settings::validate`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigReport {
    pub email_config: bool,
    pub user_profile: bool,
    pub schedule: bool,
    pub errors: Vec<String>,
}

impl ConfigReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with OPPS_)
    /// 5. Profile file and the USER_* style profile variables
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., OPPS__SERVER__PORT -> server.port
            .add_source(env_source())
            .build()?;

        Self::finish(config)
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(env_source())
            .build()?;

        Self::finish(config)
    }

    fn finish(config: Config) -> Result<Self, ConfigError> {
        let mut settings: Settings = config.try_deserialize()?;

        if let Some(path) = &settings.profile_path {
            settings.profile = load_profile_file(path)?;
        }
        settings.profile = apply_profile_env(settings.profile, |key| std::env::var(key).ok());

        Ok(settings)
    }

    /// Check email, profile and schedule settings without failing startup
    pub fn validate(&self) -> ConfigReport {
        let mut report = ConfigReport::default();

        match self.email.transport {
            MailTransport::Outbox => match self.email.from_address.as_deref() {
                Some(from) if from.validate_email() => report.email_config = true,
                Some(from) => report.errors.push(format!("Invalid sender address: {}", from)),
                None => report.errors.push("Email sender address not configured".to_string()),
            },
            MailTransport::Memory => report.email_config = true,
            MailTransport::Disabled => report.errors.push("Email delivery disabled".to_string()),
        }

        match self.profile.validate() {
            Ok(()) => report.user_profile = true,
            Err(e) => report.errors.push(format!("User profile validation error: {}", e)),
        }

        match self.scheduler.schedule() {
            Ok(_) => report.schedule = true,
            Err(e) => report.errors.push(e.to_string()),
        }

        report
    }

    /// Transport selected by `email.transport`
    ///
    /// An outbox without a sender address is incomplete and falls back to
    /// a disabled transport.
    pub fn build_mailer(&self) -> Arc<dyn Mailer> {
        match (self.email.transport, self.email.from_address.as_deref()) {
            (MailTransport::Outbox, Some(_)) => Arc::new(OutboxMailer::new(&self.email.outbox_dir)),
            (MailTransport::Outbox, None) => {
                tracing::warn!("email.from_address is not set, email delivery disabled");
                Arc::new(DisabledMailer::new("email.from_address is not set"))
            }
            (MailTransport::Memory, _) => Arc::new(MemoryMailer::new()),
            (MailTransport::Disabled, _) => Arc::new(DisabledMailer::new("email.transport is disabled")),
        }
    }

    pub fn build_source(&self) -> Arc<dyn OpportunitySource> {
        match &self.catalog.feed_path {
            Some(path) => Arc::new(JsonFeedSource::new(path)),
            None => Arc::new(StaticCatalog::new()),
        }
    }

    pub fn from_address(&self) -> &str {
        self.email.from_address.as_deref().unwrap_or(FALLBACK_FROM_ADDRESS)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("OPPS")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Read a profile from its own TOML file
pub fn load_profile_file(path: &Path) -> Result<UserProfile, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Message(format!("Failed to read profile {}: {}", path.display(), e)))?;
    let profile: UserProfile = toml::from_str(&raw)
        .map_err(|e| ConfigError::Message(format!("Invalid profile {}: {}", path.display(), e)))?;
    Ok(profile.normalized())
}

/// Overlay the plain profile variables (`USER_NAME`, `WEAK_CRITERIA`, ...)
///
/// List variables are comma-separated. Values that fail to parse are
/// logged and ignored.
pub fn apply_profile_env<F>(mut profile: UserProfile, lookup: F) -> UserProfile
where
    F: Fn(&str) -> Option<String>,
{
    let list = |raw: String| raw.split(',').map(str::to_string).collect::<Vec<_>>();

    if let Some(name) = lookup("USER_NAME") {
        profile.name = name;
    }
    if let Some(email) = lookup("USER_EMAIL") {
        profile.email = email;
    }
    if let Some(field) = lookup("USER_FIELD") {
        profile.field = field;
    }
    if let Some(role) = lookup("USER_ROLE") {
        profile.role = role;
    }
    if let Some(location) = lookup("USER_LOCATION") {
        profile.location = location;
    }
    if let Some(weak) = lookup("WEAK_CRITERIA") {
        profile.weak_criteria = list(weak);
    }
    if let Some(strong) = lookup("STRONG_CRITERIA") {
        profile.strong_criteria = list(strong);
    }
    if let Some(keywords) = lookup("USER_KEYWORDS") {
        profile.keywords = list(keywords);
    }
    if let Some(raw) = lookup("NOTIFICATION_FREQUENCY") {
        match raw.parse::<NotificationFrequency>() {
            Ok(frequency) => profile.notification_frequency = frequency,
            Err(e) => tracing::warn!("Ignoring NOTIFICATION_FREQUENCY: {}", e),
        }
    }
    if let Some(raw) = lookup("MAX_OPPORTUNITIES") {
        match raw.trim().parse::<u16>() {
            Ok(max) => profile.max_opportunities_per_email = max,
            Err(e) => tracing::warn!("Ignoring MAX_OPPORTUNITIES={:?}: {}", raw, e),
        }
    }
    if let Some(timezone) = lookup("USER_TIMEZONE") {
        profile.timezone = timezone;
    }

    profile.normalized()
}
