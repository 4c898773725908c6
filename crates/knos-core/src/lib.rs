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

//! knos-core: Core library for the knos recall drill.
//!
//! This library holds the platform-independent parts of the drill:
//! - Extracting drillable fenced blocks from solution documents
//! - The Leitner box scheduler and due classification
//! - The line-by-line reveal session state machine
//! - Building the ordered drill queue
//! - Session history records

pub mod blocks;
pub mod error;
pub mod history;
pub mod leitner;
pub mod queue;
pub mod reveal;
pub mod types;

// Re-exports for convenience
pub use blocks::{BlockType, CodeBlock, ParsedMarkdown, parse_markdown};
pub use error::{ErrorReport, Fallible, fail};
pub use history::HistoryRecord;
pub use leitner::{DueStatus, LeitnerBox, Schedule, ScheduleEntry, classify_due};
pub use queue::{
    QueueEntry, ReviewerSummary, build_queue, format_time_delta, queue_entry, summarize,
};
pub use reveal::{DrillSession, Intent, Phase, SessionResult};
pub use types::aliases::CardKey;
pub use types::card::Card;
pub use types::timestamp::Timestamp;
