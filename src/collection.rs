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

use std::env::current_dir;
use std::path::PathBuf;

use knos_core::types::card::Card;

use crate::config::Config;
use crate::error::Fallible;
use crate::error::fail;
use crate::inventory::walk_cards;
use crate::store::HistoryLog;
use crate::store::ScheduleFile;

/// A collection directory with its configured locations resolved.
pub struct Collection {
    pub directory: PathBuf,
    pub solutions_root: PathBuf,
    pub focus_dir: PathBuf,
    pub schedule: ScheduleFile,
    pub history: HistoryLog,
}

impl Collection {
    /// Open the collection at `directory`, or the current directory.
    pub fn new(directory: Option<String>) -> Fallible<Self> {
        let directory: PathBuf = match directory {
            Some(dir) => PathBuf::from(dir),
            None => current_dir()?,
        };
        if !directory.exists() {
            return fail("directory does not exist.");
        }
        let directory = directory.canonicalize()?;
        let Config { paths } = Config::load(&directory)?;
        log::debug!("Opened collection at {}", directory.display());
        Ok(Self {
            solutions_root: directory.join(paths.solutions),
            focus_dir: directory.join(paths.focus),
            schedule: ScheduleFile::new(directory.join(paths.schedule)),
            history: HistoryLog::new(directory.join(paths.history)),
            directory,
        })
    }

    /// The cards that are candidates for drilling.
    pub fn focus_cards(&self) -> Fallible<Vec<Card>> {
        walk_cards(&self.focus_dir, &self.solutions_root)
    }

    /// Every card under the solutions root, drilled or not.
    pub fn all_cards(&self) -> Fallible<Vec<Card>> {
        walk_cards(&self.solutions_root, &self.solutions_root)
    }

    /// Look up a card by key, or failing that by file name.
    pub fn find_card(&self, key: &str) -> Fallible<Card> {
        let cards = self.all_cards()?;
        let found = cards
            .iter()
            .find(|card| card.key() == key)
            .or_else(|| cards.iter().find(|card| card.name() == key));
        match found {
            Some(card) => Ok(card.clone()),
            None => fail(format!("no card named '{key}'.")),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use super::*;
    use crate::helper::create_sample_collection;
    use crate::helper::create_tmp_directory;

    #[test]
    fn test_non_existent_directory() {
        let result = Collection::new(Some("./derpherp".to_string()));
        assert_eq!(
            result.err().map(|e| e.to_string()),
            Some("error: directory does not exist.".to_string())
        );
    }

    #[test]
    fn test_default_layout() -> Fallible<()> {
        let dir = create_sample_collection()?;
        let coll = Collection::new(Some(dir.display().to_string()))?;
        let keys: Vec<String> = coll
            .focus_cards()?
            .iter()
            .map(|c| c.key().clone())
            .collect();
        assert_eq!(keys, vec!["focus/one.md", "focus/two.md"]);
        assert_eq!(coll.all_cards()?.len(), 3);
        assert_eq!(coll.schedule.path(), coll.directory.join("plan/schedule.json"));
        Ok(())
    }

    #[test]
    fn test_configured_layout() -> Fallible<()> {
        let dir = create_sample_collection()?;
        write(
            dir.join("knos.toml"),
            "[paths]\nfocus = \"solutions/archive\"\nschedule = \"state.json\"\n",
        )?;
        let coll = Collection::new(Some(dir.display().to_string()))?;
        let cards = coll.focus_cards()?;
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].key(), "archive/old.md");
        assert_eq!(coll.schedule.path(), coll.directory.join("state.json"));
        Ok(())
    }

    #[test]
    fn test_find_card() -> Fallible<()> {
        let dir = create_sample_collection()?;
        let coll = Collection::new(Some(dir.display().to_string()))?;
        assert_eq!(coll.find_card("focus/two.md")?.key(), "focus/two.md");
        assert_eq!(coll.find_card("old.md")?.key(), "archive/old.md");
        assert!(coll.find_card("missing.md").is_err());
        Ok(())
    }

    #[test]
    fn test_empty_directory() -> Fallible<()> {
        let dir = create_tmp_directory()?;
        let coll = Collection::new(Some(dir.display().to_string()))?;
        assert!(coll.focus_cards()?.is_empty());
        Ok(())
    }
}
