use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{ScoredOpportunity, UserProfile, WeakCriteriaPolicy};

/// In-memory cache of ranked opportunity lists
///
/// Entries expire after the configured TTL, so a feed edit shows up
/// within one TTL window at the latest.
#[derive(Clone)]
pub struct RankingCache {
    inner: moka::future::Cache<String, Arc<Vec<ScoredOpportunity>>>,
    ttl_secs: u64,
}

impl RankingCache {
    pub fn new(capacity: u64, ttl_secs: u64) -> Self {
        let inner = moka::future::CacheBuilder::new(capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { inner, ttl_secs }
    }

    pub async fn get(&self, key: &str) -> Option<Arc<Vec<ScoredOpportunity>>> {
        let hit = self.inner.get(key).await;
        if hit.is_some() {
            tracing::trace!("Ranking cache hit: {}", key);
        } else {
            tracing::trace!("Ranking cache miss: {}", key);
        }
        hit
    }

    pub async fn insert(&self, key: String, ranked: Vec<ScoredOpportunity>) -> Arc<Vec<ScoredOpportunity>> {
        let ranked = Arc::new(ranked);
        self.inner.insert(key, Arc::clone(&ranked)).await;
        ranked
    }

    /// Drop everything, e.g. after the profile changes
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
        tracing::debug!("Ranking cache invalidated");
    }

    /// Evict expired entries now rather than lazily
    pub async fn purge_expired(&self) {
        self.inner.run_pending_tasks().await;
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.inner.entry_count(),
            ttl_secs: self.ttl_secs,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub entries: u64,
    pub ttl_secs: u64,
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Key for a ranked list: profile terms, policy, limit and day
    pub fn ranking(
        profile: &UserProfile,
        policy: WeakCriteriaPolicy,
        limit: usize,
        today: NaiveDate,
    ) -> String {
        format!(
            "ranking:{:016x}:{:?}:{}:{}",
            profile_fingerprint(profile),
            policy,
            limit,
            today
        )
    }
}

/// Hash of the profile fields that influence scoring
fn profile_fingerprint(profile: &UserProfile) -> u64 {
    let mut hasher = DefaultHasher::new();
    profile.keywords.hash(&mut hasher);
    profile.weak_criteria.hash(&mut hasher);
    hasher.finish()
}
