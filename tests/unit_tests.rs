// Unit tests for opportunity ranking

use chrono::NaiveDate;
use opportunity_digest::core::{
    filters::{is_long_term, is_urgent_deadline, select_urgent},
    rank,
    scoring::calculate_opportunity_score,
    Ranker,
};
use opportunity_digest::models::{Category, Opportunity, OpportunityDraft, UserProfile, WeakCriteriaPolicy};

fn discovered() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 19).unwrap()
}

fn create_opportunity(
    title: &str,
    category: Category,
    tags: &[&str],
    prestige: u8,
    evidence: u8,
    time: u8,
) -> Opportunity {
    OpportunityDraft {
        title: title.to_string(),
        category,
        description: format!("{} description", title),
        deadline: "Rolling".to_string(),
        link: "https://example.com".to_string(),
        prestige,
        evidence_value: evidence,
        time_investment: time,
        rationale: String::new(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        discovered_on: discovered(),
    }
    .build()
    .unwrap()
}

fn profile(weak: &[&str], keywords: &[&str]) -> UserProfile {
    UserProfile::new(
        weak.iter().map(|s| s.to_string()).collect(),
        vec![],
        keywords.iter().map(|s| s.to_string()).collect(),
    )
}

/// Deterministic mixed catalog for property checks
fn create_catalog(count: usize) -> Vec<Opportunity> {
    let tag_pool = ["AI", "ML", "Security", "Web", "Cloud Native", "Rust", "Data"];
    (0..count)
        .map(|i| {
            let category = Category::ALL[i % Category::ALL.len()];
            let tags = [tag_pool[i % tag_pool.len()], tag_pool[(i * 3 + 1) % tag_pool.len()]];
            create_opportunity(
                &format!("Opportunity {}", i),
                category,
                &tags,
                (i % 5) as u8 + 1,
                ((i / 2) % 5) as u8 + 1,
                ((i / 3) % 5) as u8 + 1,
            )
        })
        .collect()
}

fn scores(ranked: &[Opportunity], profile: &UserProfile) -> Vec<u32> {
    ranked
        .iter()
        .map(|o| calculate_opportunity_score(o, profile, WeakCriteriaPolicy::Profile).0)
        .collect()
}

#[test]
fn test_two_opportunity_example() {
    let profile = profile(&["judging"], &["AI"]);
    let a = create_opportunity("A", Category::Judging, &["AI", "ML"], 4, 4, 3);
    let b = create_opportunity("B", Category::Speaking, &["Web"], 3, 3, 3);

    assert_eq!(calculate_opportunity_score(&a, &profile, WeakCriteriaPolicy::Profile).0, 13);
    assert_eq!(calculate_opportunity_score(&b, &profile, WeakCriteriaPolicy::Profile).0, 6);

    let ranked = rank(&[b, a.clone()], &profile, 1);
    assert_eq!(ranked, vec![a]);
}

#[test]
fn test_quick_win_effort_example() {
    let profile = profile(&[], &[]);
    let fast = create_opportunity("Fast", Category::QuickWin, &[], 1, 1, 1);
    let slow = create_opportunity("Slow", Category::QuickWin, &[], 1, 1, 5);

    assert_eq!(calculate_opportunity_score(&fast, &profile, WeakCriteriaPolicy::Profile).0, 2 + 5);
    assert_eq!(calculate_opportunity_score(&slow, &profile, WeakCriteriaPolicy::Profile).0, 2 + 1);
}

#[test]
fn test_output_length_is_min_of_limit_and_input() {
    let profile = profile(&["judging", "media"], &["AI", "Cloud"]);
    let catalog = create_catalog(40);

    for limit in [0, 1, 5, 39, 40, 41, 100] {
        let ranked = rank(&catalog, &profile, limit);
        assert_eq!(ranked.len(), limit.min(catalog.len()), "limit {}", limit);
    }
}

#[test]
fn test_output_is_sorted_descending() {
    let profile = profile(&["awards"], &["ml", "security"]);
    let catalog = create_catalog(60);

    let ranked = rank(&catalog, &profile, catalog.len());
    let scores = scores(&ranked, &profile);
    assert!(scores.windows(2).all(|w| w[0] >= w[1]), "{:?}", scores);
}

#[test]
fn test_equal_scores_keep_input_order() {
    let profile = profile(&[], &[]);
    let catalog: Vec<Opportunity> = (0..10)
        .map(|i| create_opportunity(&format!("Same {}", i), Category::Writing, &[], 2, 2, 2))
        .collect();

    let ranked = rank(&catalog, &profile, 10);
    assert_eq!(ranked, catalog);
}

#[test]
fn test_ranking_is_idempotent() {
    let profile = profile(&["judging"], &["AI", "Rust"]);
    let catalog = create_catalog(30);

    let once = rank(&catalog, &profile, 30);
    let twice = rank(&once, &profile, 30);
    assert_eq!(once, twice);
    assert_eq!(rank(&catalog, &profile, 30), once);
}

#[test]
fn test_top_k_is_prefix_of_full_ranking() {
    let profile = profile(&["media"], &["Data"]);
    let catalog = create_catalog(25);

    let full = rank(&catalog, &profile, catalog.len());
    let top = rank(&catalog, &profile, 7);
    assert_eq!(top.as_slice(), &full[..7]);
}

#[test]
fn test_fixed_policy_boosts_default_weak_set() {
    let profile = profile(&["writing"], &[]);
    let judging = create_opportunity("Judge", Category::Judging, &[], 1, 1, 1);
    let writing = create_opportunity("Write", Category::Writing, &[], 1, 1, 1);

    let by_profile = Ranker::new(WeakCriteriaPolicy::Profile).rank(&[judging.clone(), writing.clone()], &profile, 1);
    assert_eq!(by_profile, vec![writing.clone()]);

    let fixed = Ranker::new(WeakCriteriaPolicy::Fixed).rank(&[writing, judging.clone()], &profile, 1);
    assert_eq!(fixed, vec![judging]);
}

#[test]
fn test_blank_keywords_do_not_match_everything() {
    let profile = profile(&[], &["", "   "]);
    let opp = create_opportunity("Any", Category::Speaking, &["Anything"], 1, 1, 1);

    let (score, matched) = calculate_opportunity_score(&opp, &profile, WeakCriteriaPolicy::Profile);
    assert_eq!(score, 2);
    assert!(matched.is_empty());
}

#[test]
fn test_rating_out_of_range_is_rejected() {
    let draft = OpportunityDraft {
        title: "Broken".to_string(),
        category: Category::Media,
        description: String::new(),
        deadline: String::new(),
        link: String::new(),
        prestige: 6,
        evidence_value: 3,
        time_investment: 3,
        rationale: String::new(),
        tags: vec![],
        discovered_on: discovered(),
    };
    assert!(draft.build().is_err());
}

#[test]
fn test_deadline_heuristics() {
    assert!(is_urgent_deadline("Apply ASAP"));
    assert!(is_urgent_deadline("closes Tomorrow"));
    assert!(!is_urgent_deadline("Rolling"));

    let today = discovered();
    assert!(is_long_term("Annual event", today));
    assert!(is_long_term("March 2026", today));
    assert!(!is_long_term("Rolling", today));

    let urgent = create_opportunity("Now", Category::Media, &[], 3, 3, 3);
    assert!(select_urgent(&[urgent]).is_empty());
}
