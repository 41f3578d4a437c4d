use std::collections::HashSet;

use serde::Serialize;

use crate::models::{Category, Opportunity, UserProfile, WeakCriteriaPolicy};

/// Points per tag overlapping a profile keyword
pub const KEYWORD_MATCH_POINTS: u32 = 2;
/// Flat bonus for categories listed as weak criteria
pub const WEAK_CRITERIA_BOOST: u32 = 3;
/// Categories boosted under [`WeakCriteriaPolicy::Fixed`]
pub const FIXED_WEAK_CRITERIA: [Category; 3] = [Category::Judging, Category::Media, Category::Awards];

const QUICK_WIN_EFFORT_CEILING: u32 = 6;

/// Per-term contributions to an opportunity's score
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub keyword: u32,
    pub quality: u32,
    pub weak_criterion: u32,
    pub quick_win: u32,
    pub matched_tags: Vec<String>,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u32 {
        self.keyword + self.quality + self.weak_criterion + self.quick_win
    }
}

/// Profile terms prepared once per ranking pass
///
/// Keywords are lowercased up front so scoring a list does not redo it
/// for every tag.
#[derive(Debug, Clone)]
pub struct ScoringContext {
    keywords: Vec<String>,
    weak_categories: HashSet<Category>,
}

impl ScoringContext {
    pub fn new(profile: &UserProfile, policy: WeakCriteriaPolicy) -> Self {
        let keywords = profile
            .keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        let weak_categories = match policy {
            WeakCriteriaPolicy::Fixed => FIXED_WEAK_CRITERIA.into_iter().collect(),
            // Entries that are not categories ("publications", ...) never match
            WeakCriteriaPolicy::Profile => profile
                .weak_criteria
                .iter()
                .filter_map(|c| c.parse::<Category>().ok())
                .collect(),
        };

        Self {
            keywords,
            weak_categories,
        }
    }

    pub fn is_weak(&self, category: Category) -> bool {
        self.weak_categories.contains(&category)
    }

    /// Score a single opportunity
    ///
    /// score = 2 × matching tags
    ///       + prestige + evidence value
    ///       + 3 if the category is a weak criterion
    ///       + (6 − time investment) for quick wins only
    pub fn score(&self, opportunity: &Opportunity) -> ScoreBreakdown {
        let matched_tags: Vec<String> = opportunity
            .tags()
            .iter()
            .filter(|tag| self.tag_matches(tag))
            .cloned()
            .collect();

        let keyword = KEYWORD_MATCH_POINTS * matched_tags.len() as u32;
        let quality =
            u32::from(opportunity.prestige().get()) + u32::from(opportunity.evidence_value().get());
        let weak_criterion = if self.is_weak(opportunity.category()) {
            WEAK_CRITERIA_BOOST
        } else {
            0
        };
        let quick_win = quick_win_bonus(opportunity);

        ScoreBreakdown {
            keyword,
            quality,
            weak_criterion,
            quick_win,
            matched_tags,
        }
    }

    fn tag_matches(&self, tag: &str) -> bool {
        let tag = tag.to_lowercase();
        self.keywords
            .iter()
            .any(|keyword| tag.contains(keyword.as_str()) || keyword.contains(tag.as_str()))
    }
}

/// Lower effort scores higher, but only within the quick-win category
#[inline]
fn quick_win_bonus(opportunity: &Opportunity) -> u32 {
    match opportunity.category() {
        Category::QuickWin => {
            QUICK_WIN_EFFORT_CEILING - u32::from(opportunity.time_investment().get())
        }
        Category::Speaking
        | Category::Judging
        | Category::Media
        | Category::Awards
        | Category::Networking
        | Category::Writing => 0,
    }
}

/// Score an opportunity against a profile, returning the total and the matched tags
pub fn calculate_opportunity_score(
    opportunity: &Opportunity,
    profile: &UserProfile,
    policy: WeakCriteriaPolicy,
) -> (u32, Vec<String>) {
    let breakdown = ScoringContext::new(profile, policy).score(opportunity);
    (breakdown.total(), breakdown.matched_tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OpportunityDraft;
    use chrono::NaiveDate;

    fn create_test_opportunity(
        category: Category,
        prestige: u8,
        evidence_value: u8,
        time_investment: u8,
        tags: &[&str],
    ) -> Opportunity {
        OpportunityDraft {
            title: "Test Opportunity".to_string(),
            category,
            description: String::new(),
            deadline: "Ongoing".to_string(),
            link: String::new(),
            prestige,
            evidence_value,
            time_investment,
            rationale: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            discovered_on: NaiveDate::from_ymd_opt(2025, 7, 19).unwrap(),
        }
        .build()
        .unwrap()
    }

    fn create_test_profile(keywords: &[&str]) -> UserProfile {
        UserProfile::new(
            vec!["judging".to_string(), "media".to_string(), "awards".to_string()],
            vec!["publications".to_string()],
            keywords.iter().map(|k| k.to_string()).collect(),
        )
    }

    #[test]
    fn test_awards_example_score() {
        let opp = create_test_opportunity(Category::Awards, 4, 4, 4, &["AI"]);
        let profile = create_test_profile(&["AI"]);

        let (score, matched) = calculate_opportunity_score(&opp, &profile, WeakCriteriaPolicy::Profile);

        assert_eq!(score, 13);
        assert_eq!(matched, vec!["AI"]);
    }

    #[test]
    fn test_networking_example_score() {
        let opp = create_test_opportunity(Category::Networking, 2, 2, 4, &["AI"]);
        let profile = create_test_profile(&["AI"]);

        let (score, _) = calculate_opportunity_score(&opp, &profile, WeakCriteriaPolicy::Profile);

        assert_eq!(score, 6);
    }

    #[test]
    fn test_keyword_match_is_bidirectional_and_case_insensitive() {
        let opp = create_test_opportunity(
            Category::Writing,
            1,
            1,
            3,
            &["cybersecurity research", "ml", "Gardening"],
        );
        // "Cybersecurity" is contained in the first tag, "ml" is contained in "ML Systems"
        let profile = create_test_profile(&["Cybersecurity", "ML Systems"]);

        let breakdown = ScoringContext::new(&profile, WeakCriteriaPolicy::Profile).score(&opp);

        assert_eq!(breakdown.matched_tags.len(), 2);
        assert_eq!(breakdown.keyword, 4);
    }

    #[test]
    fn test_tag_counts_once_even_with_multiple_keyword_hits() {
        let opp = create_test_opportunity(Category::Writing, 1, 1, 3, &["AI ML"]);
        let profile = create_test_profile(&["AI", "ML"]);

        let breakdown = ScoringContext::new(&profile, WeakCriteriaPolicy::Profile).score(&opp);

        assert_eq!(breakdown.keyword, KEYWORD_MATCH_POINTS);
    }

    #[test]
    fn test_case_variant_tags_score_once_in_input_order() {
        let opp = create_test_opportunity(Category::Writing, 1, 1, 3, &["Security", "AI", "ai", "Cloud"]);
        let profile = create_test_profile(&["AI", "Security", "Cloud"]);

        let breakdown = ScoringContext::new(&profile, WeakCriteriaPolicy::Profile).score(&opp);

        assert_eq!(breakdown.keyword, 3 * KEYWORD_MATCH_POINTS);
        assert_eq!(
            breakdown.matched_tags,
            vec!["Security".to_string(), "AI".to_string(), "Cloud".to_string()]
        );
    }

    #[test]
    fn test_quick_win_discount() {
        let profile = create_test_profile(&[]);
        let ctx = ScoringContext::new(&profile, WeakCriteriaPolicy::Profile);

        let low_effort = create_test_opportunity(Category::QuickWin, 1, 1, 1, &[]);
        let high_effort = create_test_opportunity(Category::QuickWin, 1, 1, 5, &[]);

        assert_eq!(ctx.score(&low_effort).quick_win, 5);
        assert_eq!(ctx.score(&high_effort).quick_win, 1);
        assert!(ctx.score(&low_effort).total() > ctx.score(&high_effort).total());
    }

    #[test]
    fn test_no_time_discount_outside_quick_wins() {
        let profile = create_test_profile(&[]);
        let ctx = ScoringContext::new(&profile, WeakCriteriaPolicy::Profile);
        let opp = create_test_opportunity(Category::Speaking, 3, 3, 1, &[]);

        assert_eq!(ctx.score(&opp).quick_win, 0);
        assert_eq!(ctx.score(&opp).total(), 6);
    }

    #[test]
    fn test_weak_boost_follows_profile() {
        let opp = create_test_opportunity(Category::Speaking, 3, 3, 3, &[]);
        let profile = UserProfile::new(vec!["speaking".to_string()], vec![], vec![]);

        let profile_ctx = ScoringContext::new(&profile, WeakCriteriaPolicy::Profile);
        let fixed_ctx = ScoringContext::new(&profile, WeakCriteriaPolicy::Fixed);

        assert_eq!(profile_ctx.score(&opp).weak_criterion, WEAK_CRITERIA_BOOST);
        assert_eq!(fixed_ctx.score(&opp).weak_criterion, 0);
    }

    #[test]
    fn test_fixed_policy_ignores_profile_weak_criteria() {
        let opp = create_test_opportunity(Category::Media, 3, 3, 3, &[]);
        let profile = UserProfile::new(vec![], vec![], vec![]);

        let ctx = ScoringContext::new(&profile, WeakCriteriaPolicy::Fixed);
        assert_eq!(ctx.score(&opp).weak_criterion, WEAK_CRITERIA_BOOST);

        let ctx = ScoringContext::new(&profile, WeakCriteriaPolicy::Profile);
        assert_eq!(ctx.score(&opp).weak_criterion, 0);
    }
}
