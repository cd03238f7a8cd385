//! Dashboard statistics.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::guest::GuestRow;
use super::invitation::InvitationRegistry;
use super::response::{GuestStatus, SubEvent};

/// Attendance count for one sub-event, with its bar width relative to the busiest event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventAttendance {
    pub event: SubEvent,
    pub label: String,
    pub count: usize,
    pub bar_percent: f64,
}

/// Share of accepted guests for one invitation code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeConfirmation {
    pub code: String,
    pub description: String,
    pub total: usize,
    pub confirmed: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    pub accepted: usize,
    pub declined: usize,
    pub pending: usize,
    pub events: Vec<EventAttendance>,
    pub codes: Vec<CodeConfirmation>,
    pub generated_at: DateTime<Utc>,
}

impl DashboardStats {
    pub fn compute(registry: &InvitationRegistry, rows: &[GuestRow]) -> Self {
        let count_status = |status: GuestStatus| rows.iter().filter(|r| r.status == status).count();

        let counts: Vec<(SubEvent, usize)> = SubEvent::ALL
            .iter()
            .map(|event| {
                let count = rows
                    .iter()
                    .filter(|r| r.status == GuestStatus::Accepted && r.attendance.attends(*event))
                    .count();
                (*event, count)
            })
            .collect();
        let max_count = counts.iter().map(|(_, c)| *c).max().unwrap_or(0).max(1);
        let events = counts
            .into_iter()
            .map(|(event, count)| EventAttendance {
                event,
                label: event.label().to_string(),
                count,
                bar_percent: count as f64 / max_count as f64 * 100.0,
            })
            .collect();

        let mut per_code: HashMap<&str, (usize, usize)> = HashMap::new();
        for row in rows {
            let entry = per_code.entry(row.code.as_str()).or_default();
            entry.0 += 1;
            if row.status == GuestStatus::Accepted {
                entry.1 += 1;
            }
        }

        let mut codes: Vec<CodeConfirmation> = registry
            .codes()
            .iter()
            .map(|invitation| {
                let (total, confirmed) = per_code.get(invitation.code.as_str()).copied().unwrap_or((0, 0));
                CodeConfirmation {
                    code: invitation.code.clone(),
                    description: invitation.description.clone(),
                    total,
                    confirmed,
                    percentage: percentage(confirmed, total),
                }
            })
            .collect();
        // Vec::sort_by is stable: equal percentages keep registry order.
        codes.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));

        Self {
            total: rows.len(),
            accepted: count_status(GuestStatus::Accepted),
            declined: count_status(GuestStatus::Declined),
            pending: count_status(GuestStatus::Pending),
            events,
            codes,
            generated_at: Utc::now(),
        }
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part.min(total) as f64 / total as f64) * 100.0
}
