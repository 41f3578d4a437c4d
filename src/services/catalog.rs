use std::path::PathBuf;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{Category, ModelError, Opportunity, OpportunityDraft};

/// Errors that can occur while loading opportunities
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read feed {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed feed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid opportunity record: {0}")]
    Invalid(#[from] ModelError),
}

/// Anything that can supply the unranked opportunity list
#[async_trait]
pub trait OpportunitySource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self, today: NaiveDate) -> Result<Vec<Opportunity>, CatalogError>;
}

/// One literal catalog row
struct Listing {
    title: &'static str,
    description: &'static str,
    deadline: &'static str,
    link: &'static str,
    tags: &'static [&'static str],
}

const CALLS_FOR_PAPERS: &[Listing] = &[
    Listing {
        title: "Workshop-ai-in-space | AI ML Systems - Call for Papers Industry Track",
        description: "AI/ML in Space, Industry Track",
        deadline: "TBD - requires investigation",
        link: "https://www.aimlsystems.org/2025/workshop-ai-in-space/",
        tags: &["AI", "ML", "Space", "Industry"],
    },
    Listing {
        title: "ENTECH Online - Call for Articles",
        description: "AI, Cyber Security, Engineering, AR/VR, Computer Science, Robotics, IoT",
        deadline: "Ongoing",
        link: "https://entechonline.com/tag/ai/",
        tags: &["AI", "Cybersecurity", "Engineering"],
    },
    Listing {
        title: "IEEE Security & Privacy - Call for Papers",
        description: "Leading cybersecurity research conference",
        deadline: "December 15, 2025",
        link: "https://www.ieee-security.org/TC/SP2025/",
        tags: &["Cybersecurity", "Research", "IEEE"],
    },
    Listing {
        title: "ACM CCS 2025 - Call for Papers",
        description: "ACM Conference on Computer and Communications Security",
        deadline: "January 15, 2025",
        link: "https://www.sigsac.org/ccs/CCS2025/",
        tags: &["Cybersecurity", "ACM", "Research"],
    },
];

const JUDGING: &[Listing] = &[
    Listing {
        title: "Awards.AI - Become a Judge",
        description: "Judge AI awards and competitions",
        deadline: "Ongoing",
        link: "https://awards.ai/judges/become-a-judge/",
        tags: &["AI", "Awards", "Judging"],
    },
    Listing {
        title: "Baishideng Publishing Group - Peer Reviewer",
        description: "Peer review for academic journals",
        deadline: "Ongoing",
        link: "https://www.wjgnet.com/",
        tags: &["Peer Review", "Academic", "Research"],
    },
    Listing {
        title: "IEEE Transactions - Peer Reviewer",
        description: "Peer review for IEEE cybersecurity journals",
        deadline: "Ongoing",
        link: "https://www.ieee.org/publications/",
        tags: &["Peer Review", "IEEE", "Cybersecurity"],
    },
    Listing {
        title: "ACM Digital Library - Peer Reviewer",
        description: "Peer review for ACM computer science journals",
        deadline: "Ongoing",
        link: "https://www.acm.org/publications",
        tags: &["Peer Review", "ACM", "Computer Science"],
    },
];

const MEDIA: &[Listing] = &[
    Listing {
        title: "HARO - Help A Reporter Out",
        description: "Respond to journalist queries for expert commentary",
        deadline: "Daily",
        link: "https://www.helpareporter.com/",
        tags: &["Media", "Expert Commentary", "Journalism"],
    },
    Listing {
        title: "Dark Reading - Expert Commentary",
        description: "Cybersecurity threat intelligence commentary",
        deadline: "Ongoing",
        link: "https://www.darkreading.com/threat-intelligence",
        tags: &["Cybersecurity", "Media", "Commentary"],
    },
    Listing {
        title: "TechCrunch - Guest Contributor",
        description: "Write guest articles on AI and cybersecurity",
        deadline: "Ongoing",
        link: "https://www.techcrunch.com/",
        tags: &["Media", "Writing", "Technology"],
    },
    Listing {
        title: "Wired - Expert Source",
        description: "Provide expert commentary for technology articles",
        deadline: "Ongoing",
        link: "https://www.wired.com/",
        tags: &["Media", "Expert Commentary", "Technology"],
    },
];

const AWARDS: &[Listing] = &[
    Listing {
        title: "CSO Conference + Awards 2025",
        description: "Recognizes organizations for exceptional security projects",
        deadline: "TBD - requires investigation",
        link: "https://www.computerworld.com/events/",
        tags: &["Cybersecurity", "Awards", "Security Projects"],
    },
    Listing {
        title: "Stevie Awards - Technology",
        description: "International business awards for technology innovation",
        deadline: "March 15, 2025",
        link: "https://www.stevieawards.com/",
        tags: &["Awards", "Technology", "Innovation"],
    },
    Listing {
        title: "Fast Company Innovation Awards",
        description: "Recognition for innovative technology solutions",
        deadline: "April 30, 2025",
        link: "https://www.fastcompany.com/",
        tags: &["Awards", "Innovation", "Technology"],
    },
];

const NETWORKING: &[Listing] = &[
    Listing {
        title: "AILive! 360 - Live! 360 Events",
        description: "Major AI/ML and Cybersecurity networking event",
        deadline: "November 21, 2025",
        link: "https://live360events.com/events/orlando-2025/ailive.aspx",
        tags: &["AI", "ML", "Cybersecurity", "Networking"],
    },
    Listing {
        title: "Black Hat USA 2025",
        description: "Premier cybersecurity conference and networking",
        deadline: "August 5-8, 2025",
        link: "https://www.blackhat.com/us-25/",
        tags: &["Cybersecurity", "Networking", "Conference"],
    },
    Listing {
        title: "RSA Conference 2025",
        description: "World's leading cybersecurity conference",
        deadline: "May 6-9, 2025",
        link: "https://www.rsaconference.com/",
        tags: &["Cybersecurity", "Networking", "Conference"],
    },
];

/// Ratings and wording applied to a whole catalog section
struct Section {
    listings: &'static [Listing],
    category: fn(&Listing) -> Category,
    prestige: fn(&Listing) -> u8,
    evidence_value: u8,
    time_investment: fn(&Listing) -> u8,
    rationale: fn(&str) -> String,
}

fn sections() -> [Section; 5] {
    [
        Section {
            listings: CALLS_FOR_PAPERS,
            category: |l| {
                if l.title.contains("Papers") {
                    Category::Speaking
                } else {
                    Category::Writing
                }
            },
            prestige: |_| 4,
            evidence_value: 4,
            time_investment: |_| 4,
            rationale: |tags| format!("Aligns with {} expertise", tags),
        },
        Section {
            listings: JUDGING,
            category: |_| Category::Judging,
            prestige: |_| 4,
            evidence_value: 4,
            time_investment: |l| if l.title.contains("Awards.AI") { 2 } else { 3 },
            rationale: |tags| format!("Direct opportunity to fulfill judging criterion in {}", tags),
        },
        Section {
            listings: MEDIA,
            category: |_| Category::Media,
            prestige: |l| if l.title.contains("HARO") { 3 } else { 4 },
            evidence_value: 4,
            time_investment: |_| 3,
            rationale: |tags| format!("Addresses weak media criterion through {}", tags),
        },
        Section {
            listings: AWARDS,
            category: |_| Category::Awards,
            prestige: |_| 4,
            evidence_value: 4,
            time_investment: |_| 4,
            rationale: |tags| format!("Directly relevant to {} expertise", tags),
        },
        Section {
            listings: NETWORKING,
            category: |_| Category::Networking,
            prestige: |_| 4,
            evidence_value: 3,
            time_investment: |_| 4,
            rationale: |tags| {
                format!("Networking with key players in {} can lead to collaborations", tags)
            },
        },
    ]
}

/// The built-in, hand-curated opportunity list
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCatalog;

impl StaticCatalog {
    pub fn new() -> Self {
        Self
    }

    /// Build every catalog record, stamped as discovered on `today`
    pub fn opportunities(&self, today: NaiveDate) -> Result<Vec<Opportunity>, ModelError> {
        let sections = sections();
        sections
            .iter()
            .flat_map(|section| section.listings.iter().map(move |listing| (section, listing)))
            .map(|(section, listing)| {
                let tags = listing.tags.join(", ");
                OpportunityDraft {
                    title: listing.title.to_string(),
                    category: (section.category)(listing),
                    description: listing.description.to_string(),
                    deadline: listing.deadline.to_string(),
                    link: listing.link.to_string(),
                    prestige: (section.prestige)(listing),
                    evidence_value: section.evidence_value,
                    time_investment: (section.time_investment)(listing),
                    rationale: (section.rationale)(&tags),
                    tags: listing.tags.iter().map(|t| t.to_string()).collect(),
                    discovered_on: today,
                }
                .build()
            })
            .collect()
    }
}

#[async_trait]
impl OpportunitySource for StaticCatalog {
    fn name(&self) -> &str {
        "static-catalog"
    }

    async fn fetch(&self, today: NaiveDate) -> Result<Vec<Opportunity>, CatalogError> {
        Ok(self.opportunities(today)?)
    }
}

/// Reads opportunities from a JSON array on disk
///
/// The file is re-read on every fetch so edits show up in the next digest.
/// `discoveredOn` comes from the file, not from `today`.
#[derive(Debug, Clone)]
pub struct JsonFeedSource {
    path: PathBuf,
}

impl JsonFeedSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl OpportunitySource for JsonFeedSource {
    fn name(&self) -> &str {
        "json-feed"
    }

    async fn fetch(&self, _today: NaiveDate) -> Result<Vec<Opportunity>, CatalogError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| CatalogError::Io {
                path: self.path.clone(),
                source,
            })?;

        let opportunities: Vec<Opportunity> = serde_json::from_str(&raw)?;
        tracing::debug!(
            "Loaded {} opportunities from {}",
            opportunities.len(),
            self.path.display()
        );
        Ok(opportunities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 19).unwrap()
    }

    #[test]
    fn test_static_catalog_builds_every_section() {
        let all = StaticCatalog::new().opportunities(today()).unwrap();

        assert_eq!(all.len(), 18);
        for category in [
            Category::Speaking,
            Category::Writing,
            Category::Judging,
            Category::Media,
            Category::Awards,
            Category::Networking,
        ] {
            assert!(
                all.iter().any(|o| o.category() == category),
                "missing {category}"
            );
        }
    }

    #[test]
    fn test_static_catalog_has_no_quick_wins() {
        let all = StaticCatalog::new().opportunities(today()).unwrap();
        assert!(all.iter().all(|o| o.category() != Category::QuickWin));
    }

    #[test]
    fn test_cfp_category_rule() {
        let all = StaticCatalog::new().opportunities(today()).unwrap();

        let articles = all
            .iter()
            .find(|o| o.title().starts_with("ENTECH"))
            .unwrap();
        assert_eq!(articles.category(), Category::Writing);

        let papers = all
            .iter()
            .find(|o| o.title().starts_with("IEEE Security"))
            .unwrap();
        assert_eq!(papers.category(), Category::Speaking);
    }

    #[test]
    fn test_section_specific_ratings() {
        let all = StaticCatalog::new().opportunities(today()).unwrap();

        let haro = all.iter().find(|o| o.title().starts_with("HARO - ")).unwrap();
        assert_eq!(haro.prestige().get(), 3);

        let awards_ai = all.iter().find(|o| o.title().starts_with("Awards.AI")).unwrap();
        assert_eq!(awards_ai.time_investment().get(), 2);
        assert_eq!(awards_ai.discovered_on(), today());
    }

    #[tokio::test]
    async fn test_json_feed_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{
                "title": "Local Meetup Talk",
                "category": "speaking",
                "deadline": "Ongoing",
                "prestige": 2,
                "evidenceValue": 3,
                "timeInvestment": 2,
                "tags": ["Cloud Native"],
                "discoveredOn": "2025-07-01"
            }}]"#
        )
        .unwrap();

        let source = JsonFeedSource::new(file.path());
        let opportunities = source.fetch(today()).await.unwrap();

        assert_eq!(opportunities.len(), 1);
        assert_eq!(opportunities[0].category(), Category::Speaking);
    }

    #[tokio::test]
    async fn test_json_feed_rejects_invalid_record() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"title": "Bad", "category": "media", "prestige": 0,
                "evidenceValue": 3, "timeInvestment": 2, "discoveredOn": "2025-07-01"}}]"#
        )
        .unwrap();

        let result = JsonFeedSource::new(file.path()).fetch(today()).await;
        assert!(matches!(result, Err(CatalogError::Parse(_))));
    }

    #[tokio::test]
    async fn test_json_feed_missing_file() {
        let result = JsonFeedSource::new("/nonexistent/feed.json").fetch(today()).await;
        assert!(matches!(result, Err(CatalogError::Io { .. })));
    }
}
