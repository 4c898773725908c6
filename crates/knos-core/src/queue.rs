// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use chrono::TimeDelta;

use crate::leitner::DueStatus;
use crate::leitner::LeitnerBox;
use crate::leitner::Schedule;
use crate::leitner::ScheduleEntry;
use crate::leitner::classify_due;
use crate::types::card::Card;
use crate::types::timestamp::Timestamp;

/// A card that is due, with the reason it is due.
#[derive(Clone, Debug, PartialEq)]
pub struct QueueEntry {
    pub card: Card,
    /// `None` if the card has never been practiced.
    pub entry: Option<ScheduleEntry>,
    pub status: DueStatus,
    /// Human-readable due information, e.g. `overdue 2d 3h`.
    pub due_info: String,
}

impl QueueEntry {
    pub fn leitner_box(&self) -> Option<LeitnerBox> {
        self.entry.map(|e| e.leitner_box)
    }

    pub fn last_score(&self) -> Option<f64> {
        self.entry.map(|e| e.last_score)
    }
}

/// Build the drill queue: failed cards first (oldest failure first), then
/// overdue and due cards (earliest due first), then cards never practiced
/// (by name). Cards not yet due are left out.
pub fn build_queue(cards: &[Card], schedule: &Schedule, now: Timestamp) -> Vec<QueueEntry> {
    let mut failed = Vec::new();
    let mut overdue = Vec::new();
    let mut due_now = Vec::new();
    let mut new = Vec::new();
    for card in cards {
        let queued = queue_entry(card, schedule, now);
        let bucket = match queued.status {
            DueStatus::Failed => &mut failed,
            DueStatus::Overdue => &mut overdue,
            DueStatus::DueNow => &mut due_now,
            DueStatus::New => &mut new,
            DueStatus::Scheduled => continue,
        };
        bucket.push(queued);
    }

    failed.sort_by_key(|q| (last_reviewed(q), q.card.key().clone()));
    overdue.sort_by_key(|q| (next_due(q), q.card.key().clone()));
    due_now.sort_by_key(|q| (next_due(q), q.card.key().clone()));
    new.sort_by_key(|q| (q.card.name().to_lowercase(), q.card.key().clone()));

    let mut queue = failed;
    queue.extend(overdue);
    queue.extend(due_now);
    queue.extend(new);
    queue
}

/// Classify a single card, whether or not it is due.
pub fn queue_entry(card: &Card, schedule: &Schedule, now: Timestamp) -> QueueEntry {
    let entry = schedule.get(card.key()).copied();
    let status = classify_due(entry.as_ref(), now);
    QueueEntry {
        card: card.clone(),
        entry,
        status,
        due_info: due_info(status, entry.as_ref(), now),
    }
}

fn last_reviewed(q: &QueueEntry) -> Timestamp {
    q.entry.map(|e| e.last_reviewed).unwrap_or_default()
}

fn next_due(q: &QueueEntry) -> Timestamp {
    q.entry.map(|e| e.next_due).unwrap_or_default()
}

fn due_info(status: DueStatus, entry: Option<&ScheduleEntry>, now: Timestamp) -> String {
    match (status, entry) {
        (DueStatus::Failed, Some(entry)) if !entry.last_reviewed.is_min() => {
            format!("{} ago", format_time_delta(now.since(entry.last_reviewed)))
        }
        (DueStatus::Failed, _) => "failed".to_string(),
        (DueStatus::Overdue, Some(entry)) if !entry.next_due.is_min() => {
            format!("overdue {}", format_time_delta(now.since(entry.next_due)))
        }
        (DueStatus::Overdue, _) => "overdue".to_string(),
        (DueStatus::DueNow, _) => "due now".to_string(),
        (DueStatus::New, _) => "never practiced".to_string(),
        (DueStatus::Scheduled, Some(entry)) => {
            format!("in {}", format_time_delta(entry.next_due.since(now)))
        }
        (DueStatus::Scheduled, None) => String::new(),
    }
}

/// Render a duration at day/hour/minute granularity, dropping a zero
/// second unit: `3d`, `3d 4h`, `4h`, `4h 5m`, `5m`. Negative durations
/// and anything under a minute render as `now`.
pub fn format_time_delta(delta: TimeDelta) -> String {
    let total = delta.num_seconds();
    if total < 0 {
        return "now".to_string();
    }
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    if days > 0 {
        if hours == 0 {
            format!("{days}d")
        } else {
            format!("{days}d {hours}h")
        }
    } else if hours > 0 {
        if minutes == 0 {
            format!("{hours}h")
        } else {
            format!("{hours}h {minutes}m")
        }
    } else if minutes > 0 {
        format!("{minutes}m")
    } else {
        "now".to_string()
    }
}

/// Counts shown by `knos summary`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReviewerSummary {
    pub box_zero: usize,
    pub overdue: usize,
    pub due_now: usize,
    pub never_practiced: usize,
    pub total_focus: usize,
    /// The most recent review of any scheduled card.
    pub last_practiced: Option<Timestamp>,
}

impl ReviewerSummary {
    /// Cards that need attention now, practiced or not.
    pub fn total_due(&self) -> usize {
        self.box_zero + self.overdue + self.due_now + self.never_practiced
    }
}

pub fn summarize(schedule: &Schedule, focus_cards: &[Card], now: Timestamp) -> ReviewerSummary {
    let mut summary = ReviewerSummary {
        total_focus: focus_cards.len(),
        ..ReviewerSummary::default()
    };
    for (_, entry) in schedule.iter() {
        match classify_due(Some(entry), now) {
            DueStatus::Failed => summary.box_zero += 1,
            DueStatus::Overdue => summary.overdue += 1,
            DueStatus::DueNow => summary.due_now += 1,
            DueStatus::New | DueStatus::Scheduled => {}
        }
        if !entry.last_reviewed.is_min() {
            summary.last_practiced = summary.last_practiced.max(Some(entry.last_reviewed));
        }
    }
    summary.never_practiced = focus_cards
        .iter()
        .filter(|card| schedule.get(card.key()).is_none())
        .count();
    summary
}
