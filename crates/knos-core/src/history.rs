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

use serde::Deserialize;
use serde::Serialize;

use crate::error::Fallible;
use crate::reveal::SessionResult;
use crate::types::timestamp::Timestamp;

/// One line of the session history log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// The card key, or `None` for sessions not tied to a document.
    pub solution: Option<String>,
    pub timestamp: Timestamp,
    pub total_lines: usize,
    pub correct_lines: usize,
    pub score: f64,
}

impl HistoryRecord {
    /// Serialize as a single JSON line, newline included.
    pub fn to_json_line(&self) -> Fallible<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

impl From<&SessionResult> for HistoryRecord {
    fn from(result: &SessionResult) -> Self {
        Self {
            solution: Some(result.card.clone()),
            timestamp: result.completed_at,
            total_lines: result.total_lines,
            correct_lines: result.correct_lines,
            score: result.score,
        }
    }
}
