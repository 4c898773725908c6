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

use std::fs::read_to_string;
use std::sync::Arc;
use std::sync::Mutex;

use knos_core::blocks::ParsedMarkdown;
use knos_core::blocks::parse_markdown;
use knos_core::leitner::ScheduleEntry;
use knos_core::queue::QueueEntry;
use knos_core::reveal::DrillSession;
use knos_core::reveal::Intent;
use knos_core::reveal::SessionResult;
use knos_core::types::card::Card;
use knos_core::types::timestamp::Timestamp;
use tokio::sync::oneshot::Sender;

use crate::error::Fallible;
use crate::store::HistoryLog;
use crate::store::ScheduleFile;

#[derive(Clone)]
pub struct ServerState {
    pub session_started_at: Timestamp,
    pub mutable: Arc<Mutex<MutableState>>,
    pub shutdown_tx: Arc<Mutex<Option<Sender<()>>>>,
}

/// The card being drilled, with its document as read when it came up.
pub struct DrillCard {
    pub queued: QueueEntry,
    pub parsed: ParsedMarkdown,
}

/// The recorded outcome of drilling one card.
pub struct CardOutcome {
    pub card: Card,
    pub result: SessionResult,
    /// The card's schedule entry after the update.
    pub entry: ScheduleEntry,
}

/// The drill run: a queue of cards drilled one after the other.
///
/// `outcomes` holds one entry per card drilled so far, in queue order, so
/// the current card has been recorded iff `outcomes.len() > index`. Cards
/// whose document cannot be read are dropped from the queue when they come
/// up.
pub struct MutableState {
    queue: Vec<QueueEntry>,
    index: usize,
    card: Option<DrillCard>,
    session: Option<DrillSession>,
    outcomes: Vec<CardOutcome>,
    schedule: ScheduleFile,
    history: HistoryLog,
    finished_at: Option<Timestamp>,
}

impl MutableState {
    pub fn new(queue: Vec<QueueEntry>, schedule: ScheduleFile, history: HistoryLog) -> Fallible<Self> {
        let mut state = Self {
            queue,
            index: 0,
            card: None,
            session: None,
            outcomes: Vec::new(),
            schedule,
            history,
            finished_at: None,
        };
        state.start_card()?;
        Ok(state)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of cards in the run.
    pub fn total(&self) -> usize {
        self.queue.len()
    }

    /// The card being drilled, unless the run is over.
    pub fn current(&self) -> Option<(&DrillCard, &DrillSession)> {
        if self.is_finished() {
            return None;
        }
        Some((self.card.as_ref()?, self.session.as_ref()?))
    }

    pub fn current_outcome(&self) -> Option<&CardOutcome> {
        self.outcomes.get(self.index)
    }

    pub fn outcomes(&self) -> &[CardOutcome] {
        &self.outcomes
    }

    pub fn finished_at(&self) -> Option<Timestamp> {
        self.finished_at
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    pub fn has_next(&self) -> bool {
        self.index + 1 < self.queue.len()
    }

    /// Feed an intent to the current card's session, recording the card
    /// once its session is over.
    pub fn apply(&mut self, intent: Intent) -> Fallible<()> {
        if self.is_finished() {
            return Ok(());
        }
        if let Some(session) = self.session.as_mut() {
            session.apply(intent);
        }
        self.record_if_finished()
    }

    /// Move to the next card. Ignored until the current card is recorded.
    pub fn next_card(&mut self) -> Fallible<()> {
        if self.is_finished() || !self.is_recorded() {
            return Ok(());
        }
        self.index += 1;
        self.start_card()
    }

    /// End the run, keeping whatever was done on the current card.
    pub fn end(&mut self) -> Fallible<()> {
        if self.is_finished() {
            return Ok(());
        }
        if let Some(session) = self.session.as_mut() {
            session.quit();
        }
        self.record_if_finished()?;
        self.finish();
        Ok(())
    }

    /// Read and parse the document at `index`, skipping unreadable ones.
    fn start_card(&mut self) -> Fallible<()> {
        while let Some(queued) = self.queue.get(self.index) {
            match read_to_string(queued.card.path()) {
                Ok(text) => {
                    log::debug!("Starting card {}", queued.card.key());
                    let parsed = parse_markdown(&text);
                    self.session = Some(DrillSession::new(queued.card.key().clone(), &parsed));
                    self.card = Some(DrillCard {
                        queued: queued.clone(),
                        parsed,
                    });
                    // Cards with nothing to drill finish immediately.
                    return self.record_if_finished();
                }
                Err(e) => {
                    log::warn!(
                        "Skipping unreadable card {}: {e}",
                        queued.card.path().display()
                    );
                    self.queue.remove(self.index);
                }
            }
        }
        self.finish();
        Ok(())
    }

    fn finish(&mut self) {
        self.card = None;
        self.session = None;
        self.finished_at = Some(Timestamp::now());
        log::debug!("Drill run finished after {} cards", self.outcomes.len());
    }

    fn is_recorded(&self) -> bool {
        self.outcomes.len() > self.index
    }

    /// Update the schedule, then append to the history log. The card counts
    /// as recorded once the schedule is written, so a failed append is
    /// reported but never repeats the update.
    fn record_if_finished(&mut self) -> Fallible<()> {
        if self.is_recorded() {
            return Ok(());
        }
        let Some(card) = self.card.as_ref().map(|c| c.queued.card.clone()) else {
            return Ok(());
        };
        let Some(result) = self.session.as_ref().and_then(|s| s.result(Timestamp::now())) else {
            return Ok(());
        };
        let entry = self
            .schedule
            .update(card.key(), result.score, result.completed_at)?;
        log::info!(
            "Drilled {}: {:.1}% ({}/{} lines), now in box {}",
            card.key(),
            result.score,
            result.correct_lines,
            result.total_lines,
            entry.leitner_box
        );
        self.outcomes.push(CardOutcome {
            card,
            result,
            entry,
        });
        match self.outcomes.last() {
            Some(outcome) => self.history.append(&outcome.result),
            None => Ok(()),
        }
    }
}
