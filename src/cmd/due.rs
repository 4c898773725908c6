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

use knos_core::leitner::DueStatus;
use knos_core::queue::QueueEntry;
use knos_core::queue::build_queue;
use knos_core::types::aliases::CardKey;
use knos_core::types::timestamp::Timestamp;
use serde::Serialize;

use crate::collection::Collection;
use crate::error::Fallible;

/// The due list in the form read by scripts.
#[derive(Debug, PartialEq, Serialize)]
pub struct DueReport {
    pub datetime: String,
    pub box_zero: Vec<CardKey>,
    pub overdue: Vec<CardKey>,
    pub due_now: Vec<CardKey>,
    pub never_practiced: Vec<CardKey>,
    /// Due cards that have been practiced before.
    pub total_due: usize,
}

pub fn print_due(directory: Option<String>, json: bool) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let now = Timestamp::now();
    let queue = build_queue(&coll.focus_cards()?, &coll.schedule.load(), now);
    if json {
        println!("{}", serde_json::to_string_pretty(&due_report(&queue, now))?);
    } else {
        print!("{}", format_due(&queue));
    }
    Ok(())
}

pub fn due_report(queue: &[QueueEntry], now: Timestamp) -> DueReport {
    let mut report = DueReport {
        datetime: now.into_inner().format("%Y-%m-%dT%H:%M").to_string(),
        box_zero: Vec::new(),
        overdue: Vec::new(),
        due_now: Vec::new(),
        never_practiced: Vec::new(),
        total_due: 0,
    };
    for queued in queue {
        let key = queued.card.key().clone();
        match queued.status {
            DueStatus::Failed => report.box_zero.push(key),
            DueStatus::Overdue => report.overdue.push(key),
            DueStatus::DueNow => report.due_now.push(key),
            DueStatus::New => report.never_practiced.push(key),
            DueStatus::Scheduled => {}
        }
    }
    report.total_due = report.box_zero.len() + report.overdue.len() + report.due_now.len();
    report
}

pub fn format_due(queue: &[QueueEntry]) -> String {
    if queue.is_empty() {
        return "Nothing due. All caught up.\n".to_string();
    }
    let mut out = format!("Due for review ({} cards):\n\n", queue.len());
    for queued in queue {
        let name = queued.card.name();
        match queued.entry {
            None => out.push_str(&format!("  • {name} (never practiced)\n")),
            Some(entry) => out.push_str(&format!(
                "  • {name} (box {}, last: {:.0}%) {}\n",
                entry.leitner_box, entry.last_score, queued.due_info
            )),
        }
    }
    out
}
