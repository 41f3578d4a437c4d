use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{EmailFormat, NotificationFrequency, UserProfile};
use crate::services::pipeline::TaskKind;

/// Query for the ranked opportunity list
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ListOpportunitiesQuery {
    #[validate(range(max = 100))]
    pub limit: Option<u16>,
}

/// Body flavour requested from the preview endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewFormat {
    #[default]
    Html,
    #[serde(alias = "text", alias = "plain_text")]
    Plain,
}

impl From<PreviewFormat> for EmailFormat {
    fn from(format: PreviewFormat) -> Self {
        match format {
            PreviewFormat::Html => EmailFormat::Html,
            PreviewFormat::Plain => EmailFormat::PlainText,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewQuery {
    #[serde(default)]
    pub format: PreviewFormat,
}

/// Request to run a digest task immediately
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendDigestRequest {
    #[serde(default)]
    pub task: TaskKind,
}

/// Request to send a test email; defaults to the profile address
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct TestEmailRequest {
    #[validate(email)]
    pub email: Option<String>,
}

/// Partial profile update; absent fields keep their current value
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub field: Option<String>,
    pub role: Option<String>,
    pub location: Option<String>,
    #[serde(alias = "weak_criteria")]
    pub weak_criteria: Option<Vec<String>>,
    #[serde(alias = "strong_criteria")]
    pub strong_criteria: Option<Vec<String>>,
    pub keywords: Option<Vec<String>>,
    #[serde(alias = "notification_frequency")]
    pub notification_frequency: Option<NotificationFrequency>,
    #[serde(alias = "email_format")]
    pub email_format: Option<EmailFormat>,
    #[validate(range(min = 1, max = 50))]
    #[serde(alias = "max_opportunities_per_email")]
    pub max_opportunities_per_email: Option<u16>,
    pub timezone: Option<String>,
}

impl UpdateProfileRequest {
    /// Merge into `profile`, trimming list entries
    pub fn apply(self, mut profile: UserProfile) -> UserProfile {
        if let Some(name) = self.name {
            profile.name = name;
        }
        if let Some(email) = self.email {
            profile.email = email;
        }
        if let Some(field) = self.field {
            profile.field = field;
        }
        if let Some(role) = self.role {
            profile.role = role;
        }
        if let Some(location) = self.location {
            profile.location = location;
        }
        if let Some(weak) = self.weak_criteria {
            profile.weak_criteria = weak;
        }
        if let Some(strong) = self.strong_criteria {
            profile.strong_criteria = strong;
        }
        if let Some(keywords) = self.keywords {
            profile.keywords = keywords;
        }
        if let Some(frequency) = self.notification_frequency {
            profile.notification_frequency = frequency;
        }
        if let Some(format) = self.email_format {
            profile.email_format = format;
        }
        if let Some(max) = self.max_opportunities_per_email {
            profile.max_opportunities_per_email = max;
        }
        if let Some(timezone) = self.timezone {
            profile.timezone = timezone;
        }
        profile.normalized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_keeps_absent_fields() {
        let request: UpdateProfileRequest = serde_json::from_str(
            r#"{"keywords": ["Rust", "  ", "Kubernetes"], "notificationFrequency": "weekly"}"#,
        )
        .unwrap();
        assert!(request.validate().is_ok());

        let before = UserProfile::default();
        let after = request.apply(before.clone());

        assert_eq!(after.keywords, vec!["Rust".to_string(), "Kubernetes".to_string()]);
        assert_eq!(after.notification_frequency, NotificationFrequency::Weekly);
        assert_eq!(after.name, before.name);
        assert_eq!(after.weak_criteria, before.weak_criteria);
    }

    #[test]
    fn test_rejects_bad_email_and_range() {
        let request = UpdateProfileRequest {
            email: Some("nope".to_string()),
            max_opportunities_per_email: Some(0),
            ..Default::default()
        };
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("max_opportunities_per_email"));
    }

    #[test]
    fn test_send_digest_defaults_to_daily() {
        let request: SendDigestRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.task, TaskKind::Daily);

        let request: SendDigestRequest = serde_json::from_str(r#"{"task": "urgent"}"#).unwrap();
        assert_eq!(request.task, TaskKind::Urgent);
    }

    #[test]
    fn test_preview_format_aliases() {
        let query: PreviewQuery = serde_json::from_str(r#"{"format": "text"}"#).unwrap();
        assert_eq!(EmailFormat::from(query.format), EmailFormat::PlainText);
    }
}
