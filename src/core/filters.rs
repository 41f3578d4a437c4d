use chrono::{Datelike, NaiveDate};

use crate::models::{Category, Opportunity};

const URGENT_MARKERS: [&str; 4] = ["today", "tomorrow", "urgent", "asap"];
const LONG_TERM_MARKERS: [&str; 4] = ["November", "December", "Annual", "Yearly"];

/// Whether a free-text deadline reads as due within the next few days
///
/// Deadlines are not parsed as dates; this looks for wording like
/// "today" or "ASAP".
#[inline]
pub fn is_urgent_deadline(deadline: &str) -> bool {
    let deadline = deadline.to_lowercase();
    URGENT_MARKERS.iter().any(|marker| deadline.contains(marker))
}

/// Whether a free-text deadline is worth tracking over the longer term
///
/// Matches late-year months, recurring events, and mentions of the
/// current or next calendar year.
pub fn is_long_term(deadline: &str, today: NaiveDate) -> bool {
    if LONG_TERM_MARKERS.iter().any(|marker| deadline.contains(marker)) {
        return true;
    }

    let year = today.year();
    [year, year + 1]
        .iter()
        .any(|y| deadline.contains(&y.to_string()))
}

/// Split into (regular, quick wins), preserving order within each side
pub fn partition_quick_wins(opportunities: &[Opportunity]) -> (Vec<&Opportunity>, Vec<&Opportunity>) {
    opportunities
        .iter()
        .partition(|opp| opp.category() != Category::QuickWin)
}

/// Opportunities whose deadline looks urgent, in input order
pub fn select_urgent(opportunities: &[Opportunity]) -> Vec<Opportunity> {
    opportunities
        .iter()
        .filter(|opp| is_urgent_deadline(opp.deadline()))
        .cloned()
        .collect()
}
