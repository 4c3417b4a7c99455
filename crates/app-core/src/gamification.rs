//! Streak and badge engine
//!
//! Pure functions over the entry list. A streak is the number of consecutive
//! local calendar days, ending today or yesterday, that have at least one
//! entry. Badges unlock when the streak reaches a catalog threshold.

use chrono::{Duration, Local, NaiveDate};
use std::collections::BTreeSet;

use crate::journal::JournalEntry;

/// A streak milestone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Badge {
    /// Stable id stored on the profile
    pub id: &'static str,
    /// Display label
    pub label: &'static str,
    /// Icon name
    pub icon: &'static str,
    /// Streak needed to earn the badge
    pub required_streak: u32,
}

/// Badge catalog in ascending threshold order
pub static BADGES: [Badge; 4] = [
    Badge { id: "start_journey", label: "İlk Adım", icon: "footprints", required_streak: 1 },
    Badge { id: "week_streak", label: "Bir Hafta", icon: "calendar-check", required_streak: 7 },
    Badge { id: "month_streak", label: "İstikrar", icon: "medal", required_streak: 30 },
    Badge { id: "master_streak", label: "Şükür Ustası", icon: "crown", required_streak: 100 },
];

/// Look up a badge by id
pub fn badge(id: &str) -> Option<&'static Badge> {
    BADGES.iter().find(|badge| badge.id == id)
}

/// Current streak relative to the device's local today
pub fn calculate_streak(entries: &[JournalEntry]) -> u32 {
    streak_as_of(entries, Local::now().date_naive())
}

/// Streak relative to `today`
///
/// Entries with unreadable timestamps are skipped.
pub fn streak_as_of(entries: &[JournalEntry], today: NaiveDate) -> u32 {
    let days: BTreeSet<NaiveDate> = entries.iter().filter_map(JournalEntry::local_date).collect();

    let Some(&latest) = days.iter().next_back() else {
        return 0;
    };

    let yesterday = today - Duration::days(1);
    if latest != today && latest != yesterday {
        return 0;
    }

    let mut streak = 0;
    let mut expected = latest;
    for day in days.iter().rev() {
        if *day != expected {
            break;
        }
        streak += 1;
        expected -= Duration::days(1);
    }

    streak
}

/// Badges earned at `streak` that are not in `current`, in catalog order
pub fn check_new_badges<S: AsRef<str>>(streak: u32, current: &[S]) -> Vec<String> {
    BADGES
        .iter()
        .filter(|badge| streak >= badge.required_streak)
        .filter(|badge| !current.iter().any(|id| id.as_ref() == badge.id))
        .map(|badge| badge.id.to_string())
        .collect()
}

/// The next badge still to earn, with the days remaining
pub fn next_badge(streak: u32) -> Option<(&'static Badge, u32)> {
    BADGES
        .iter()
        .find(|badge| badge.required_streak > streak)
        .map(|badge| (badge, badge.required_streak - streak))
}
