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

//! On-disk persistence: the schedule table and the session history log.

use std::fs::OpenOptions;
use std::fs::create_dir_all;
use std::fs::read_to_string;
use std::fs::rename;
use std::fs::write;
use std::io::ErrorKind;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use knos_core::history::HistoryRecord;
use knos_core::leitner::Schedule;
use knos_core::leitner::ScheduleEntry;
use knos_core::reveal::SessionResult;
use knos_core::types::timestamp::Timestamp;

use crate::error::Fallible;

/// The schedule table, stored as a single JSON object.
///
/// The table is read and written whole on every update, so two processes
/// updating different cards at once can lose one of the updates.
#[derive(Clone, Debug)]
pub struct ScheduleFile {
    path: PathBuf,
}

impl ScheduleFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the table. A missing, unreadable or corrupt file yields an
    /// empty table.
    pub fn load(&self) -> Schedule {
        let text = match read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                log::debug!("No schedule table at {}", self.path.display());
                return Schedule::new();
            }
            Err(err) => {
                log::warn!(
                    "Ignoring unreadable schedule table {}: {err}",
                    self.path.display()
                );
                return Schedule::new();
            }
        };
        if text.trim().is_empty() {
            return Schedule::new();
        }
        match Schedule::from_json(&text) {
            Ok(schedule) => {
                log::debug!(
                    "Loaded {} schedule entries from {}",
                    schedule.len(),
                    self.path.display()
                );
                schedule
            }
            Err(err) => {
                log::warn!(
                    "Ignoring corrupt schedule table {}: {err}",
                    self.path.display()
                );
                Schedule::new()
            }
        }
    }

    /// Replace the table on disk.
    pub fn save(&self, schedule: &Schedule) -> Fallible<()> {
        if let Some(parent) = self.path.parent() {
            create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let mut json = schedule.to_json()?;
        json.push('\n');
        write(&tmp, json)?;
        rename(&tmp, &self.path)?;
        log::debug!(
            "Wrote {} schedule entries to {}",
            schedule.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Record a session score for `key` and persist the whole table.
    pub fn update(&self, key: &str, score: f64, now: Timestamp) -> Fallible<ScheduleEntry> {
        let mut schedule = self.load();
        let entry = schedule.update(key, score, now);
        self.save(&schedule)?;
        Ok(entry)
    }
}

/// The append-only session history, one JSON record per line.
#[derive(Clone, Debug)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, result: &SessionResult) -> Fallible<()> {
        if let Some(parent) = self.path.parent() {
            create_dir_all(parent)?;
        }
        let line = HistoryRecord::from(result).to_json_line()?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        log::debug!("Appended history record to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use knos_core::leitner::LeitnerBox;
    use knos_core::reveal::BlockResult;

    use super::*;
    use crate::helper::create_tmp_directory;

    fn now() -> Timestamp {
        Timestamp::parse_lenient("2024-05-01T08:00:00")
    }

    #[test]
    fn test_missing_table_is_empty() -> Fallible<()> {
        let dir = create_tmp_directory()?;
        let file = ScheduleFile::new(dir.join("plan/schedule.json"));
        assert!(file.load().is_empty());
        Ok(())
    }

    #[test]
    fn test_corrupt_table_is_empty() -> Fallible<()> {
        let dir = create_tmp_directory()?;
        let path = dir.join("schedule.json");
        write(&path, "{\"focus/a.md\": {\"box\": ")?;
        assert!(ScheduleFile::new(&path).load().is_empty());
        write(&path, "[1, 2, 3]")?;
        assert!(ScheduleFile::new(&path).load().is_empty());
        Ok(())
    }

    #[test]
    fn test_update_persists_whole_table() -> Fallible<()> {
        let dir = create_tmp_directory()?;
        let file = ScheduleFile::new(dir.join("plan/schedule.json"));
        file.update("focus/a.md", 100.0, now())?;
        file.update("focus/b.md", 50.0, now())?;
        let entry = file.update("focus/a.md", 100.0, now())?;
        assert_eq!(entry.leitner_box, LeitnerBox::new(2));

        let schedule = file.load();
        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule.get("focus/a.md"), Some(&entry));
        assert_eq!(
            schedule.get("focus/b.md").map(|e| e.leitner_box),
            Some(LeitnerBox::ZERO)
        );
        assert!(!dir.join("plan/schedule.json.tmp").exists());
        Ok(())
    }

    #[test]
    fn test_update_over_corrupt_table() -> Fallible<()> {
        let dir = create_tmp_directory()?;
        let path = dir.join("schedule.json");
        write(&path, "not json")?;
        let file = ScheduleFile::new(&path);
        file.update("focus/a.md", 100.0, now())?;
        assert_eq!(file.load().len(), 1);
        Ok(())
    }

    #[test]
    fn test_history_appends_lines() -> Fallible<()> {
        let dir = create_tmp_directory()?;
        let log = HistoryLog::new(dir.join("plan/history.jsonl"));
        let block = BlockResult {
            lines: vec!["x".into(), "y".into()],
            results: vec![true, false],
            quit: false,
        };
        log.append(&SessionResult::new("focus/a.md".into(), vec![block], now()))?;
        log.append(&SessionResult::new("focus/b.md".into(), vec![], now()))?;

        let text = read_to_string(log.path())?;
        let records: Vec<HistoryRecord> = text
            .lines()
            .map(serde_json::from_str)
            .collect::<Result<_, _>>()?;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].solution.as_deref(), Some("focus/a.md"));
        assert_eq!(records[0].score, 50.0);
        assert_eq!(records[1].total_lines, 0);
        assert_eq!(records[1].score, 100.0);
        Ok(())
    }
}
