use crate::core::scoring::ScoringContext;
use crate::models::{Opportunity, ScoredOpportunity, UserProfile, WeakCriteriaPolicy};

/// Result of a ranking pass
#[derive(Debug, Clone)]
pub struct RankResult {
    pub ranked: Vec<ScoredOpportunity>,
    pub total_candidates: usize,
}

/// Scores opportunities against a profile and keeps the best `limit`
///
/// # Pipeline Stages
/// 1. Keyword overlap between tags and profile keywords
/// 2. Quality baseline (prestige + evidence value)
/// 3. Weak-criteria boost
/// 4. Quick-win effort discount
/// 5. Stable sort by score, then truncate
///
/// Ranking never filters on score: if fewer than `limit` opportunities
/// exist, all of them come back.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ranker {
    policy: WeakCriteriaPolicy,
}

impl Ranker {
    pub fn new(policy: WeakCriteriaPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> WeakCriteriaPolicy {
        self.policy
    }

    /// Rank opportunities and return the top `limit`, best first
    ///
    /// Equal scores keep their input order.
    pub fn rank(
        &self,
        opportunities: &[Opportunity],
        profile: &UserProfile,
        limit: usize,
    ) -> Vec<Opportunity> {
        self.rank_scored(opportunities, profile, limit)
            .ranked
            .into_iter()
            .map(|scored| scored.opportunity)
            .collect()
    }

    /// Same as [`Ranker::rank`] but keeps each score and the tags that matched
    pub fn rank_scored(
        &self,
        opportunities: &[Opportunity],
        profile: &UserProfile,
        limit: usize,
    ) -> RankResult {
        let total_candidates = opportunities.len();
        let ctx = ScoringContext::new(profile, self.policy);

        let mut ranked: Vec<ScoredOpportunity> = opportunities
            .iter()
            .map(|opportunity| {
                let breakdown = ctx.score(opportunity);
                ScoredOpportunity {
                    opportunity: opportunity.clone(),
                    score: breakdown.total(),
                    weak_criterion: breakdown.weak_criterion > 0,
                    matched_tags: breakdown.matched_tags,
                }
            })
            .collect();

        // `sort_by` is stable, so ties stay in input order
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked.truncate(limit);

        tracing::debug!(
            "Ranked {} opportunities, keeping {}",
            total_candidates,
            ranked.len()
        );

        RankResult {
            ranked,
            total_candidates,
        }
    }
}

/// Rank with the default policy (weak criteria taken from the profile)
pub fn rank(opportunities: &[Opportunity], profile: &UserProfile, limit: usize) -> Vec<Opportunity> {
    Ranker::default().rank(opportunities, profile, limit)
}
