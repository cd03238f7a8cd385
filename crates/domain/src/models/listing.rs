//! Filtering and sorting of guest rows for the admin dashboard.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::guest::GuestRow;
use super::response::{GuestStatus, SubEvent};

/// Status predicate; `all` disables status filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(GuestStatus),
}

impl std::str::FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        trimmed.parse::<GuestStatus>().map(StatusFilter::Only)
    }
}

/// Combined row predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuestFilter {
    pub status: StatusFilter,
    /// Case-insensitive substring of the code.
    pub code: String,
    /// Case-insensitive substring of the guest name.
    pub name: String,
}

impl GuestFilter {
    pub fn matches(&self, row: &GuestRow) -> bool {
        let status_ok = match self.status {
            StatusFilter::All => true,
            StatusFilter::Only(status) => row.status == status,
        };
        status_ok && contains_ignore_case(&row.code, &self.code) && contains_ignore_case(&row.name, &self.name)
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.trim().to_lowercase())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Code,
    Name,
    Status,
    FridayEvening,
    SaturdayLunch,
    SaturdayWedding,
    SundayBrunch,
    ModifiedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Current sort selection of the dashboard table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            key: SortKey::Name,
            direction: SortDirection::Asc,
        }
    }
}

impl SortState {
    /// Clicking the current key flips the direction; a new key starts ascending.
    pub fn toggle(self, key: SortKey) -> Self {
        if self.key == key {
            Self {
                key,
                direction: self.direction.flipped(),
            }
        } else {
            Self {
                key,
                direction: SortDirection::Asc,
            }
        }
    }

    fn compare(&self, a: &GuestRow, b: &GuestRow) -> Ordering {
        let ordering = match self.key {
            SortKey::Code => compare_ignore_case(&a.code, &b.code),
            SortKey::Name => compare_ignore_case(&a.name, &b.name),
            SortKey::Status => a.status.sort_rank().cmp(&b.status.sort_rank()),
            SortKey::FridayEvening => compare_event(a, b, SubEvent::FridayEvening),
            SortKey::SaturdayLunch => compare_event(a, b, SubEvent::SaturdayLunch),
            SortKey::SaturdayWedding => compare_event(a, b, SubEvent::SaturdayWedding),
            SortKey::SundayBrunch => compare_event(a, b, SubEvent::SundayBrunch),
            SortKey::ModifiedAt => timestamp_or_epoch(a).cmp(&timestamp_or_epoch(b)),
        };
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

fn compare_event(a: &GuestRow, b: &GuestRow, event: SubEvent) -> Ordering {
    a.attendance.attends(event).cmp(&b.attendance.attends(event))
}

fn timestamp_or_epoch(row: &GuestRow) -> DateTime<Utc> {
    row.modified_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Filters then stably sorts a copy of the rows.
pub fn apply(rows: &[GuestRow], filter: &GuestFilter, sort: SortState) -> Vec<GuestRow> {
    let mut selected: Vec<GuestRow> = rows.iter().filter(|r| filter.matches(r)).cloned().collect();
    selected.sort_by(|a, b| sort.compare(a, b));
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::response::Attendance;
    use chrono::TimeZone;

    fn row(code: &str, name: &str, status: GuestStatus) -> GuestRow {
        GuestRow {
            status,
            ..GuestRow::pending(code, name)
        }
    }

    fn names(rows: &[GuestRow]) -> Vec<&str> {
        rows.iter().map(|r| r.name.as_str()).collect()
    }

    fn sample() -> Vec<GuestRow> {
        vec![
            row("ABC123", "charlie", GuestStatus::Accepted),
            row("ABC123", "Alice", GuestStatus::Pending),
            row("XYZ789", "Bob", GuestStatus::Declined),
        ]
    }

    #[test]
    fn test_status_all_returns_rows_unchanged() {
        let rows = sample();
        let filter = GuestFilter::default();
        let filtered: Vec<GuestRow> = rows.iter().filter(|r| filter.matches(r)).cloned().collect();
        assert_eq!(filtered, rows);
    }

    #[test]
    fn test_filter_by_status() {
        let filter = GuestFilter {
            status: StatusFilter::Only(GuestStatus::Declined),
            ..Default::default()
        };
        assert_eq!(names(&apply(&sample(), &filter, SortState::default())), vec!["Bob"]);
    }

    #[test]
    fn test_filter_text_is_case_insensitive() {
        let filter = GuestFilter {
            code: "abc".to_string(),
            name: "ALI".to_string(),
            ..Default::default()
        };
        assert_eq!(names(&apply(&sample(), &filter, SortState::default())), vec!["Alice"]);
    }

    #[test]
    fn test_status_filter_parse() {
        assert_eq!("all".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!("".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!(
            "pending".parse::<StatusFilter>().unwrap(),
            StatusFilter::Only(GuestStatus::Pending)
        );
        assert!("bogus".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn test_sort_by_name_ignores_case() {
        let sorted = apply(&sample(), &GuestFilter::default(), SortState::default());
        assert_eq!(names(&sorted), vec!["Alice", "Bob", "charlie"]);
    }

    #[test]
    fn test_toggle_twice_reverses_order() {
        let rows = sample();
        let asc = SortState::default().toggle(SortKey::Code);
        assert_eq!(asc.direction, SortDirection::Asc);
        let desc = asc.toggle(SortKey::Code);
        assert_eq!(desc.direction, SortDirection::Desc);

        let by_name = SortState::default();
        let forward = apply(&rows, &GuestFilter::default(), by_name);
        let mut backward = apply(&rows, &GuestFilter::default(), by_name.toggle(SortKey::Name));
        backward.reverse();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_new_key_resets_direction() {
        let state = SortState {
            key: SortKey::Name,
            direction: SortDirection::Desc,
        };
        assert_eq!(
            state.toggle(SortKey::Status),
            SortState {
                key: SortKey::Status,
                direction: SortDirection::Asc
            }
        );
    }

    #[test]
    fn test_status_sorts_accepted_pending_declined() {
        let rows = vec![
            row("ABC123", "Dora", GuestStatus::Declined),
            row("ABC123", "Paul", GuestStatus::Pending),
            row("ABC123", "Anna", GuestStatus::Accepted),
        ];
        let state = SortState {
            key: SortKey::Status,
            direction: SortDirection::Asc,
        };

        let asc = apply(&rows, &GuestFilter::default(), state);
        assert_eq!(names(&asc), vec!["Anna", "Paul", "Dora"]);

        let desc = apply(&rows, &GuestFilter::default(), state.toggle(SortKey::Status));
        assert_eq!(names(&desc), vec!["Dora", "Paul", "Anna"]);
    }

    #[test]
    fn test_sort_is_stable_in_both_directions() {
        let rows = vec![
            row("ABC123", "first", GuestStatus::Pending),
            row("ABC123", "second", GuestStatus::Pending),
            row("AAA000", "third", GuestStatus::Pending),
        ];
        let asc = apply(&rows, &GuestFilter::default(), SortState::default().toggle(SortKey::Code));
        assert_eq!(names(&asc), vec!["third", "first", "second"]);

        let desc = apply(
            &rows,
            &GuestFilter::default(),
            SortState {
                key: SortKey::Code,
                direction: SortDirection::Desc,
            },
        );
        assert_eq!(names(&desc), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_missing_timestamp_sorts_as_epoch() {
        let mut answered = row("ABC123", "Alice", GuestStatus::Accepted);
        answered.modified_at = Some(Utc.with_ymd_and_hms(2027, 5, 1, 12, 0, 0).unwrap());
        let pending = row("ABC123", "Bob", GuestStatus::Pending);

        let state = SortState {
            key: SortKey::ModifiedAt,
            direction: SortDirection::Asc,
        };
        let sorted = apply(&[answered, pending], &GuestFilter::default(), state);
        assert_eq!(names(&sorted), vec!["Bob", "Alice"]);
    }

    #[test]
    fn test_sort_by_event_false_first() {
        let mut brunch = row("ABC123", "Alice", GuestStatus::Accepted);
        brunch.attendance = Attendance {
            sunday_brunch: true,
            ..Default::default()
        };
        let other = row("ABC123", "Bob", GuestStatus::Accepted);

        let state = SortState::default().toggle(SortKey::SundayBrunch);
        let sorted = apply(&[brunch, other], &GuestFilter::default(), state);
        assert_eq!(names(&sorted), vec!["Bob", "Alice"]);
    }
}
