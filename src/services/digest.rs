//! Email content for daily digests, urgent alerts and weekly summaries.
//!
//! Rendering is pure: callers pass `today`/`now` so output is reproducible.

use std::fmt::Write as _;

use chrono::{Datelike, NaiveDate};

use crate::core::filters::{is_long_term, partition_quick_wins};
use crate::models::{EmailFormat, Opportunity, UserProfile};
use crate::services::mailer::EmailMessage;

const DAILY_TIPS: [&str; 8] = [
    "Focus on opportunities that address your weak criteria first - they'll have the biggest impact on your petition.",
    "Quality over quantity - it's better to excel in a few opportunities than to spread yourself too thin.",
    "Document everything - keep detailed records of your contributions and their impact.",
    "Network strategically - the connections you make can lead to future opportunities.",
    "Stay consistent - small daily actions compound into significant achievements.",
    "Leverage your PhD research - many opportunities can tie back to your academic work.",
    "Consider remote opportunities - they expand your reach beyond your home city.",
    "Follow up professionally - many opportunities require persistent but respectful follow-up.",
];

const DEFAULT_QUICK_WINS: [&str; 3] = [
    "Sign up for HARO/ProfNet and respond to daily queries (15-30 min)",
    "Apply to be a judge for industry awards (15 min application)",
    "Update your LinkedIn with recent achievements (20 min)",
];

const SIGNATURE: &str = "Your EB-1A Opportunity System";

/// Subject plus whichever bodies the profile's format asks for
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEmail {
    pub subject: String,
    pub plain: Option<String>,
    pub html: Option<String>,
}

impl RenderedEmail {
    pub fn into_message(self, from: &str, to: &str) -> EmailMessage {
        EmailMessage::new(from, to, self.subject, self.plain, self.html)
    }
}

/// Weekly figures fed into the summary email
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklyFigures {
    pub opportunities_found: u64,
    pub emails_sent: u64,
    pub uptime_secs: i64,
}

/// Tip of the day, rotating by day of year
pub fn daily_tip(today: NaiveDate) -> &'static str {
    DAILY_TIPS[today.ordinal() as usize % DAILY_TIPS.len()]
}

/// Format a duration in seconds as `Xd Yh Zm`
pub fn format_uptime(secs: i64) -> String {
    let secs = secs.max(0);
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    format!("{}d {}h {}m", days, hours, minutes)
}

/// Minimal escaping for values interpolated into HTML
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn daily_subject(today: NaiveDate) -> String {
    format!("Daily EB-1A Opportunities - {}", today.format("%Y-%m-%d"))
}

/// Render the daily digest in the profile's preferred format(s)
pub fn daily_digest(opportunities: &[Opportunity], profile: &UserProfile, today: NaiveDate) -> RenderedEmail {
    let format = profile.email_format;
    RenderedEmail {
        subject: daily_subject(today),
        plain: format
            .wants_plain()
            .then(|| daily_plain(opportunities, profile, today)),
        html: format
            .wants_html()
            .then(|| daily_html(opportunities, profile, today)),
    }
}

pub fn daily_plain(opportunities: &[Opportunity], profile: &UserProfile, today: NaiveDate) -> String {
    let (regular, quick_wins) = partition_quick_wins(opportunities);
    let long_term: Vec<&Opportunity> = opportunities
        .iter()
        .filter(|o| is_long_term(o.deadline(), today))
        .collect();

    let mut out = String::new();
    let _ = writeln!(out, "Dear {},\n", profile.name);
    let _ = writeln!(
        out,
        "Here are today's top {} opportunities to strengthen your extraordinary ability petition:\n",
        regular.len()
    );

    if regular.is_empty() {
        out.push_str("No new opportunities match your criteria today. Check back tomorrow!\n");
    }
    for (i, opp) in regular.iter().enumerate() {
        let _ = writeln!(out, "{}. {}: {}", i + 1, opp.category().label(), opp.title());
        let _ = writeln!(out, "   Topic: {}", opp.description());
        let _ = writeln!(out, "   Deadline: {}", opp.deadline());
        let _ = writeln!(out, "   Link: {}", opp.link());
        let _ = writeln!(
            out,
            "   Rating: Prestige {} | Evidence {} | Time {}",
            opp.prestige().stars(),
            opp.evidence_value().stars(),
            opp.time_investment().stars()
        );
        let _ = writeln!(out, "   Why it fits: {}\n", opp.rationale());
    }

    out.push_str("## Quick Wins (15-30 min tasks):\n");
    if quick_wins.is_empty() {
        for suggestion in DEFAULT_QUICK_WINS {
            let _ = writeln!(out, "- {}", suggestion);
        }
    }
    for opp in &quick_wins {
        let _ = writeln!(out, "- {}: {} ({})", opp.title(), opp.description(), opp.link());
    }

    out.push_str("\n## Long-term Opportunities Worth Tracking:\n");
    if long_term.is_empty() {
        out.push_str("No long-term opportunities currently tracked.\n");
    }
    for opp in &long_term {
        let _ = writeln!(out, "- {} (Deadline: {}) - {}", opp.title(), opp.deadline(), opp.link());
    }

    let weak = profile.weak_criteria.join(", ");
    out.push_str("\n## Action Items for Today:\n");
    out.push_str("- Review deadlines and add to your calendar\n");
    let _ = writeln!(out, "- Prioritize opportunities addressing your weak criteria: {}", weak);
    out.push_str("- Consider your current workload and select 1-2 opportunities to pursue\n");

    out.push_str("\n## Your EB-1A Progress Tracker:\n");
    let _ = writeln!(out, "- Strong Criteria: {}", profile.strong_criteria.join(", "));
    let _ = writeln!(out, "- Areas for Improvement: {}", weak);

    let _ = writeln!(out, "\nBest regards,\n{}\n", SIGNATURE);
    let _ = writeln!(out, "---\nPro Tip: {}", daily_tip(today));
    out
}

pub fn daily_html(opportunities: &[Opportunity], profile: &UserProfile, today: NaiveDate) -> String {
    let (regular, quick_wins) = partition_quick_wins(opportunities);

    let mut items = String::new();
    for (i, opp) in regular.iter().enumerate() {
        let link = escape_html(opp.link());
        let _ = write!(
            items,
            r#"<div class="opportunity">
<h3>{}. {}: {}</h3>
<p><strong>Topic/Field:</strong> {}</p>
<p><strong>Deadline:</strong> {}</p>
<p><strong>Link:</strong> <a href="{}" class="link">{}</a></p>
<p class="rating"><strong>Rating:</strong> Prestige: {}, Evidence: {}, Time: {}</p>
<p><strong>Why it fits:</strong> {}</p>
</div>
"#,
            i + 1,
            opp.category().label(),
            escape_html(opp.title()),
            escape_html(opp.description()),
            escape_html(opp.deadline()),
            link,
            link,
            opp.prestige().stars(),
            opp.evidence_value().stars(),
            opp.time_investment().stars(),
            escape_html(opp.rationale()),
        );
    }
    if regular.is_empty() {
        items.push_str("<p>No new opportunities match your criteria today.</p>\n");
    }

    let mut quick = String::new();
    for opp in &quick_wins {
        let _ = writeln!(
            quick,
            r#"<p>&bull; <strong>{}:</strong> {} (<a href="{}" class="link">Apply</a>)</p>"#,
            escape_html(opp.title()),
            escape_html(opp.description()),
            escape_html(opp.link()),
        );
    }
    if quick_wins.is_empty() {
        for suggestion in DEFAULT_QUICK_WINS {
            let _ = writeln!(quick, "<p>&bull; {}</p>", escape_html(suggestion));
        }
    }

    let mut long_term = String::new();
    for opp in opportunities.iter().filter(|o| is_long_term(o.deadline(), today)) {
        let _ = writeln!(
            long_term,
            r#"<p>&bull; <strong>{}</strong> (Deadline: {}) - <a href="{}" class="link">Details</a></p>"#,
            escape_html(opp.title()),
            escape_html(opp.deadline()),
            escape_html(opp.link()),
        );
    }
    if long_term.is_empty() {
        long_term.push_str("<p>No long-term opportunities tracked.</p>\n");
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>Daily EB-1A Opportunities</title>
<style>
body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 800px; margin: 0 auto; }}
.header {{ background-color: #f4f4f4; padding: 20px; border-radius: 5px; }}
.opportunity {{ margin: 20px 0; padding: 15px; border-left: 4px solid #007cba; background-color: #f9f9f9; }}
.rating {{ color: #ff6b35; }}
.link {{ color: #007cba; text-decoration: none; }}
.quick-wins {{ background-color: #e8f5e8; padding: 15px; border-radius: 5px; }}
.long-term {{ background-color: #fff3cd; padding: 15px; border-radius: 5px; }}
</style>
</head>
<body>
<div class="header">
<h1>Daily EB-1A Opportunities - {date}</h1>
<p>Dear {name}, here are your personalized opportunities to strengthen your extraordinary ability petition.</p>
</div>
<div class="content">
{items}</div>
<div class="quick-wins">
<h2>Quick Wins (15-30 min tasks)</h2>
{quick}</div>
<div class="long-term">
<h2>Long-term Opportunities</h2>
{long_term}</div>
<p><strong>Focus areas:</strong> {weak}</p>
<p><em>Pro Tip: {tip}</em></p>
<hr>
<p><small>{signature}</small></p>
</body>
</html>
"#,
        date = today.format("%Y-%m-%d"),
        name = escape_html(&profile.name),
        items = items,
        quick = quick,
        long_term = long_term,
        weak = escape_html(&profile.weak_criteria.join(", ")),
        tip = escape_html(daily_tip(today)),
        signature = SIGNATURE,
    )
}

/// Alert for a single opportunity with a tight deadline
pub fn urgent_alert(opportunity: &Opportunity, profile: &UserProfile) -> RenderedEmail {
    let plain = format!(
        "URGENT OPPORTUNITY ALERT\n\n\
         {title}\n\n\
         Description: {description}\n\
         Deadline: {deadline}\n\
         Link: {link}\n\n\
         Why this is perfect for you: {why}\n\n\
         Don't miss this opportunity to strengthen your EB-1A petition!\n\n\
         {signature}\n",
        title = opportunity.title(),
        description = opportunity.description(),
        deadline = opportunity.deadline(),
        link = opportunity.link(),
        why = opportunity.rationale(),
        signature = SIGNATURE,
    );

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<body>
<div class="urgent"><h1>URGENT OPPORTUNITY ALERT</h1><p>High-value opportunity with tight deadline!</p></div>
<div class="opportunity">
<h2>{}</h2>
<p><strong>Description:</strong> {}</p>
<p><strong>Deadline:</strong> {}</p>
<p><strong>Why it fits:</strong> {}</p>
<p><a href="{}" class="link">Apply Now</a></p>
</div>
<hr>
<p><small>{}</small></p>
</body>
</html>
"#,
        escape_html(opportunity.title()),
        escape_html(opportunity.description()),
        escape_html(opportunity.deadline()),
        escape_html(opportunity.rationale()),
        escape_html(opportunity.link()),
        SIGNATURE,
    );

    RenderedEmail {
        subject: format!(
            "URGENT: High-Value EB-1A Opportunity - Deadline {}",
            opportunity.deadline()
        ),
        plain: Some(plain),
        html: profile.email_format.wants_html().then_some(html),
    }
}

/// Weekly roll-up; always plain text
pub fn weekly_summary(profile: &UserProfile, figures: WeeklyFigures, today: NaiveDate) -> RenderedEmail {
    let plain = format!(
        "Weekly EB-1A Opportunity Summary\n\n\
         Dear {name},\n\n\
         Here's your weekly summary:\n\n\
         This Week's Stats:\n\
         - Opportunities identified: {found}\n\
         - Emails sent: {sent}\n\
         - System uptime: {uptime}\n\n\
         Focus Areas:\n\
         Your weak criteria that need attention: {weak}\n\n\
         Tip of the Week:\n\
         Consistency is key in building your EB-1A case. Small, regular actions compound into significant achievements.\n\n\
         Keep up the excellent work!\n\n\
         {signature}\n",
        name = profile.name,
        found = figures.opportunities_found,
        sent = figures.emails_sent,
        uptime = format_uptime(figures.uptime_secs),
        weak = profile.weak_criteria.join(", "),
        signature = SIGNATURE,
    );

    RenderedEmail {
        subject: format!("Weekly EB-1A Summary - {}", today.format("%Y-%m-%d")),
        plain: Some(plain),
        html: None,
    }
}

/// Confirms the delivery path end to end
pub fn test_email() -> RenderedEmail {
    RenderedEmail {
        subject: "EB-1A Opportunity System - Test Email".to_string(),
        plain: Some(format!(
            "This is a test email from your EB-1A Opportunity System.\n\n\
             If you received this email, your email configuration is working correctly!\n\n\
             Best regards,\n{}\n",
            SIGNATURE
        )),
        html: Some(format!(
            "<!DOCTYPE html>\n<html>\n<body>\n<h1>Test Email Successful</h1>\n\
             <p>This is a test email from your EB-1A Opportunity System.</p>\n\
             <p>Best regards,<br>{}</p>\n</body>\n</html>\n",
            SIGNATURE
        )),
    }
}

/// Pick the body matching a preview request
pub fn preview_body(rendered: &RenderedEmail, format: EmailFormat) -> Option<&str> {
    match format {
        EmailFormat::PlainText => rendered.plain.as_deref(),
        EmailFormat::Html | EmailFormat::Both => rendered.html.as_deref(),
    }
}
