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

//! Leitner box scheduling.
//!
//! A perfect session moves a card up one box; anything less sends it back
//! to box 0. Box 0 is the "failed" lane and is always due, regardless of
//! its timer.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::fmt::Formatter;

use chrono::TimeDelta;
use serde::Deserialize;
use serde::Serialize;

use crate::error::Fallible;
use crate::types::aliases::CardKey;
use crate::types::timestamp::Timestamp;

/// Review interval per box, box 0 first.
pub const INTERVALS: [TimeDelta; 7] = [
    TimeDelta::hours(1),
    TimeDelta::hours(4),
    TimeDelta::days(1),
    TimeDelta::days(3),
    TimeDelta::days(7),
    TimeDelta::days(14),
    TimeDelta::days(30),
];

pub const MAX_BOX: u8 = (INTERVALS.len() - 1) as u8;

/// Only a session at or above this score advances a card.
pub const PERFECT_SCORE: f64 = 100.0;

/// How long past its due time a card may sit before it counts as overdue
/// rather than merely due.
pub const OVERDUE_GRACE: TimeDelta = TimeDelta::hours(1);

/// A Leitner box number in `0..=MAX_BOX`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct LeitnerBox(u8);

impl LeitnerBox {
    pub const ZERO: LeitnerBox = LeitnerBox(0);
    pub const MAX: LeitnerBox = LeitnerBox(MAX_BOX);

    /// Construct a box, clamping out-of-range numbers to [`MAX_BOX`].
    pub fn new(n: u8) -> Self {
        Self(n.min(MAX_BOX))
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// The next box up, capped at [`MAX_BOX`].
    pub fn promote(self) -> Self {
        Self::new(self.0.saturating_add(1))
    }

    pub fn interval(self) -> TimeDelta {
        INTERVALS[self.0 as usize]
    }
}

impl From<u32> for LeitnerBox {
    fn from(value: u32) -> Self {
        Self::new(value.min(MAX_BOX as u32) as u8)
    }
}

impl From<LeitnerBox> for u32 {
    fn from(value: LeitnerBox) -> u32 {
        value.0 as u32
    }
}

impl Display for LeitnerBox {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persistent scheduling state for one card.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    #[serde(rename = "box", default)]
    pub leitner_box: LeitnerBox,
    #[serde(default)]
    pub next_due: Timestamp,
    #[serde(default)]
    pub last_score: f64,
    #[serde(default)]
    pub last_reviewed: Timestamp,
}

/// Where a card stands with respect to review.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DueStatus {
    /// In box 0: failed last time, due immediately.
    Failed,
    /// Due for more than [`OVERDUE_GRACE`].
    Overdue,
    /// Due within the last [`OVERDUE_GRACE`].
    DueNow,
    /// Never practiced.
    New,
    /// Scheduled for the future; not due.
    Scheduled,
}

impl DueStatus {
    pub fn is_due(self) -> bool {
        !matches!(self, DueStatus::Scheduled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DueStatus::Failed => "failed",
            DueStatus::Overdue => "overdue",
            DueStatus::DueNow => "due",
            DueStatus::New => "new",
            DueStatus::Scheduled => "scheduled",
        }
    }
}

/// Classify a card given its schedule entry, if any.
pub fn classify_due(entry: Option<&ScheduleEntry>, now: Timestamp) -> DueStatus {
    let Some(entry) = entry else {
        return DueStatus::New;
    };
    if entry.leitner_box.is_zero() {
        return DueStatus::Failed;
    }
    if entry.next_due > now {
        return DueStatus::Scheduled;
    }
    if now.since(entry.next_due) > OVERDUE_GRACE {
        DueStatus::Overdue
    } else {
        DueStatus::DueNow
    }
}

/// The schedule table: every card's entry, keyed by card key.
///
/// The table is persisted whole. Two processes updating different cards at
/// once will lose one of the updates; this tool assumes a single user.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule {
    entries: BTreeMap<CardKey, ScheduleEntry>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a schedule table from JSON.
    pub fn from_json(text: &str) -> Fallible<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Fallible<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn get(&self, key: &str) -> Option<&ScheduleEntry> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<CardKey>, entry: ScheduleEntry) {
        self.entries.insert(key.into(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CardKey, &ScheduleEntry)> {
        self.entries.iter()
    }

    /// Record a session score for a card, creating its entry if needed.
    pub fn update(&mut self, key: &str, score: f64, now: Timestamp) -> ScheduleEntry {
        let old_box = self
            .entries
            .get(key)
            .map(|entry| entry.leitner_box)
            .unwrap_or_default();
        let entry = next_entry(old_box, score, now);
        self.entries.insert(key.to_string(), entry);
        entry
    }
}

/// The entry a card in `old_box` gets after scoring `score` at `now`.
pub fn next_entry(old_box: LeitnerBox, score: f64, now: Timestamp) -> ScheduleEntry {
    let new_box = if score >= PERFECT_SCORE {
        old_box.promote()
    } else {
        LeitnerBox::ZERO
    };
    ScheduleEntry {
        leitner_box: new_box,
        next_due: now.plus(new_box.interval()),
        last_score: score,
        last_reviewed: now,
    }
}
