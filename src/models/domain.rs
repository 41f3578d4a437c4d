use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

/// Errors raised when building domain values from untrusted input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("{field} must be between 1 and 5, got {value}")]
    RatingOutOfRange { field: &'static str, value: u8 },

    #[error("unknown opportunity category: {0}")]
    UnknownCategory(String),

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("unknown notification frequency: {0}")]
    UnknownFrequency(String),
}

/// Closed set of opportunity categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Speaking,
    Judging,
    Media,
    Awards,
    Networking,
    Writing,
    #[serde(rename = "quick_wins", alias = "quick_win", alias = "quickwin", alias = "quick-win")]
    QuickWin,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Speaking,
        Category::Judging,
        Category::Media,
        Category::Awards,
        Category::Networking,
        Category::Writing,
        Category::QuickWin,
    ];

    /// Wire name, also used when matching against weak criteria
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Speaking => "speaking",
            Category::Judging => "judging",
            Category::Media => "media",
            Category::Awards => "awards",
            Category::Networking => "networking",
            Category::Writing => "writing",
            Category::QuickWin => "quick_wins",
        }
    }

    /// Heading used in digests, e.g. `QUICK WINS`
    pub fn label(self) -> &'static str {
        match self {
            Category::Speaking => "SPEAKING",
            Category::Judging => "JUDGING",
            Category::Media => "MEDIA",
            Category::Awards => "AWARDS",
            Category::Networking => "NETWORKING",
            Category::Writing => "WRITING",
            Category::QuickWin => "QUICK WINS",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "speaking" => Ok(Category::Speaking),
            "judging" => Ok(Category::Judging),
            "media" => Ok(Category::Media),
            "awards" => Ok(Category::Awards),
            "networking" => Ok(Category::Networking),
            "writing" => Ok(Category::Writing),
            "quick_wins" | "quick_win" | "quickwin" | "quickwins" => Ok(Category::QuickWin),
            _ => Err(ModelError::UnknownCategory(s.to_string())),
        }
    }
}

/// A 1-5 star rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self, ModelError> {
        Self::for_field("rating", value)
    }

    fn for_field(field: &'static str, value: u8) -> Result<Self, ModelError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ModelError::RatingOutOfRange { field, value })
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Render as filled/empty stars, always five glyphs wide
    pub fn stars(self) -> String {
        let filled = usize::from(self.0);
        let mut out = "★".repeat(filled);
        out.push_str(&"☆".repeat(usize::from(Self::MAX) - filled));
        out
    }
}

impl TryFrom<u8> for Rating {
    type Error = ModelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rating::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(value: Rating) -> Self {
        value.0
    }
}

/// Unvalidated opportunity fields, as read from a catalog table or a feed file
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityDraft {
    pub title: String,
    pub category: Category,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub deadline: String,
    #[serde(default)]
    pub link: String,
    pub prestige: u8,
    pub evidence_value: u8,
    pub time_investment: u8,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub discovered_on: NaiveDate,
}

impl OpportunityDraft {
    pub fn build(self) -> Result<Opportunity, ModelError> {
        Opportunity::try_from(self)
    }
}

/// A single opportunity the user could pursue
///
/// Fields are private so every instance has passed validation; use
/// [`OpportunityDraft::build`] or deserialize to construct one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "OpportunityDraft")]
pub struct Opportunity {
    title: String,
    category: Category,
    description: String,
    deadline: String,
    link: String,
    prestige: Rating,
    evidence_value: Rating,
    time_investment: Rating,
    rationale: String,
    tags: Vec<String>,
    discovered_on: NaiveDate,
}

impl TryFrom<OpportunityDraft> for Opportunity {
    type Error = ModelError;

    fn try_from(draft: OpportunityDraft) -> Result<Self, Self::Error> {
        let title = draft.title.trim().to_string();
        if title.is_empty() {
            return Err(ModelError::EmptyField("title"));
        }

        Ok(Self {
            title,
            category: draft.category,
            description: draft.description,
            deadline: draft.deadline,
            link: draft.link,
            prestige: Rating::for_field("prestige", draft.prestige)?,
            evidence_value: Rating::for_field("evidenceValue", draft.evidence_value)?,
            time_investment: Rating::for_field("timeInvestment", draft.time_investment)?,
            rationale: draft.rationale,
            tags: dedupe_tags(draft.tags),
            discovered_on: draft.discovered_on,
        })
    }
}

/// Trimmed, non-blank tags in input order; case-insensitive duplicates keep the first spelling
fn dedupe_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty() && seen.insert(tag.to_lowercase()))
        .collect()
}

impl Opportunity {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn deadline(&self) -> &str {
        &self.deadline
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn prestige(&self) -> Rating {
        self.prestige
    }

    pub fn evidence_value(&self) -> Rating {
        self.evidence_value
    }

    pub fn time_investment(&self) -> Rating {
        self.time_investment
    }

    pub fn rationale(&self) -> &str {
        &self.rationale
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn discovered_on(&self) -> NaiveDate {
        self.discovered_on
    }
}

/// Opportunity together with the score the ranker assigned to it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredOpportunity {
    #[serde(flatten)]
    pub opportunity: Opportunity,
    pub score: u32,
    pub matched_tags: Vec<String>,
    pub weak_criterion: bool,
}

/// Which weak-criteria set drives the +3 boost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeakCriteriaPolicy {
    /// Use the `weakCriteria` listed on the profile being ranked for
    #[default]
    Profile,
    /// Always boost judging, media and awards regardless of profile
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationFrequency {
    #[default]
    Daily,
    Weekly,
    UrgentOnly,
}

impl FromStr for NotificationFrequency {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "urgent_only" | "urgent-only" => Ok(Self::UrgentOnly),
            other => Err(ModelError::UnknownFrequency(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailFormat {
    PlainText,
    #[default]
    Html,
    Both,
}

impl EmailFormat {
    pub fn wants_plain(self) -> bool {
        matches!(self, EmailFormat::PlainText | EmailFormat::Both)
    }

    pub fn wants_html(self) -> bool {
        matches!(self, EmailFormat::Html | EmailFormat::Both)
    }
}

/// The candidate's profile: what to reinforce and how to be notified
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub field: String,
    pub role: String,
    pub location: String,
    #[serde(alias = "weak_criteria")]
    pub weak_criteria: Vec<String>,
    #[serde(alias = "strong_criteria")]
    pub strong_criteria: Vec<String>,
    pub keywords: Vec<String>,
    #[serde(alias = "notification_frequency")]
    pub notification_frequency: NotificationFrequency,
    #[serde(alias = "email_format")]
    pub email_format: EmailFormat,
    #[validate(range(min = 1, max = 50))]
    #[serde(alias = "max_opportunities_per_email")]
    pub max_opportunities_per_email: u16,
    pub timezone: String,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: "EB-1A Candidate".to_string(),
            email: "user@example.com".to_string(),
            field: "Software Engineer, AI/ML research in Cloud Native, DevSecOps, Cybersecurity"
                .to_string(),
            role: "Full Stack Software Engineer, doing AI/ML research as PhD Student".to_string(),
            location: "Austin, Texas, or Remote anywhere".to_string(),
            weak_criteria: to_strings(&["judging", "media", "awards"]),
            strong_criteria: to_strings(&["publications", "speaking", "critical role"]),
            keywords: to_strings(&[
                "AI",
                "ML",
                "Cloud Native",
                "DevSecOps",
                "Cybersecurity",
                "Software Engineering",
            ]),
            notification_frequency: NotificationFrequency::Daily,
            email_format: EmailFormat::Html,
            max_opportunities_per_email: 10,
            timezone: "America/Chicago".to_string(),
        }
    }
}

impl UserProfile {
    /// Build a profile from the three matching lists, defaults elsewhere
    pub fn new(weak_criteria: Vec<String>, strong_criteria: Vec<String>, keywords: Vec<String>) -> Self {
        Self {
            weak_criteria,
            strong_criteria,
            keywords,
            ..Self::default()
        }
        .normalized()
    }

    /// Trim every list entry and drop blanks. A blank keyword would match every tag.
    pub fn normalized(mut self) -> Self {
        for list in [&mut self.weak_criteria, &mut self.strong_criteria, &mut self.keywords] {
            *list = std::mem::take(list)
                .into_iter()
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty())
                .collect();
        }
        self
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> OpportunityDraft {
        OpportunityDraft {
            title: "IEEE Transactions - Peer Reviewer".to_string(),
            category: Category::Judging,
            description: "Peer review for IEEE journals".to_string(),
            deadline: "Ongoing".to_string(),
            link: "https://www.ieee.org/publications/".to_string(),
            prestige: 4,
            evidence_value: 4,
            time_investment: 3,
            rationale: "Fulfills judging criterion".to_string(),
            tags: vec!["IEEE".to_string(), "Peer Review".to_string(), "IEEE".to_string()],
            discovered_on: NaiveDate::from_ymd_opt(2025, 7, 19).unwrap(),
        }
    }

    #[test]
    fn test_rating_bounds() {
        assert!(Rating::new(0).is_err());
        assert!(Rating::new(6).is_err());
        assert_eq!(Rating::new(1).unwrap().get(), 1);
        assert_eq!(Rating::new(5).unwrap().get(), 5);
    }

    #[test]
    fn test_rating_stars() {
        assert_eq!(Rating::new(3).unwrap().stars(), "★★★☆☆");
        assert_eq!(Rating::new(5).unwrap().stars(), "★★★★★");
    }

    #[test]
    fn test_build_rejects_out_of_range_rating() {
        let mut bad = draft();
        bad.time_investment = 9;

        let err = bad.build().unwrap_err();
        assert_eq!(
            err,
            ModelError::RatingOutOfRange { field: "timeInvestment", value: 9 }
        );
    }

    #[test]
    fn test_build_rejects_blank_title() {
        let mut bad = draft();
        bad.title = "   ".to_string();
        assert_eq!(bad.build().unwrap_err(), ModelError::EmptyField("title"));
    }

    #[test]
    fn test_tags_collapse_duplicates() {
        let opp = draft().build().unwrap();
        assert_eq!(opp.tags().len(), 2);
    }

    #[test]
    fn test_tag_dedupe_ignores_case_and_keeps_input_order() {
        let mut d = draft();
        d.tags = vec![
            "Zero Trust".to_string(),
            "AI".to_string(),
            " ai ".to_string(),
            "Ai".to_string(),
            "Cloud".to_string(),
        ];
        let opp = d.build().unwrap();
        assert_eq!(
            opp.tags(),
            &["Zero Trust".to_string(), "AI".to_string(), "Cloud".to_string()]
        );
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!("Judging".parse::<Category>().unwrap(), Category::Judging);
        assert_eq!("quick wins".parse::<Category>().unwrap(), Category::QuickWin);
        assert_eq!("quick-win".parse::<Category>().unwrap(), Category::QuickWin);
        assert!("critical role".parse::<Category>().is_err());
    }

    #[test]
    fn test_deserialize_rejects_unknown_category() {
        let json = r#"{
            "title": "Mystery",
            "category": "gardening",
            "prestige": 3,
            "evidenceValue": 3,
            "timeInvestment": 3,
            "discoveredOn": "2025-07-19"
        }"#;
        assert!(serde_json::from_str::<Opportunity>(json).is_err());
    }

    #[test]
    fn test_deserialize_validates_ratings() {
        let json = r#"{
            "title": "Too prestigious",
            "category": "awards",
            "prestige": 7,
            "evidenceValue": 3,
            "timeInvestment": 3,
            "discoveredOn": "2025-07-19"
        }"#;
        let err = serde_json::from_str::<Opportunity>(json).unwrap_err();
        assert!(err.to_string().contains("prestige"));
    }

    #[test]
    fn test_serialized_shape() {
        let opp = draft().build().unwrap();
        let value = serde_json::to_value(&opp).unwrap();
        assert_eq!(value["category"], "judging");
        assert_eq!(value["evidenceValue"], 4);
        assert_eq!(value["discoveredOn"], "2025-07-19");
    }

    #[test]
    fn test_profile_normalization_drops_blank_keywords() {
        let profile = UserProfile::new(
            vec!["media ".to_string()],
            vec![],
            vec!["AI".to_string(), "  ".to_string()],
        );
        assert_eq!(profile.keywords, vec!["AI"]);
        assert_eq!(profile.weak_criteria, vec!["media"]);
    }

    #[test]
    fn test_default_profile_is_valid() {
        assert!(UserProfile::default().validate().is_ok());
    }
}
