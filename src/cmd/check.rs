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

use std::collections::HashSet;
use std::fs::read_to_string;

use knos_core::blocks::parse_markdown;
use knos_core::leitner::Schedule;
use knos_core::reveal::RevealBlock;
use knos_core::types::aliases::CardKey;
use knos_core::types::card::Card;

use crate::collection::Collection;
use crate::error::ErrorReport;
use crate::error::Fallible;

/// What a card would drill.
#[derive(Debug, PartialEq)]
pub struct CardCheck {
    pub key: CardKey,
    pub blocks: usize,
    pub targets: usize,
    pub lines: usize,
}

impl CardCheck {
    pub fn is_vacuous(&self) -> bool {
        self.targets == 0
    }
}

pub fn check_collection(directory: Option<String>) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let cards = coll.all_cards()?;
    let (checks, unreadable) = check_cards(&cards);
    for check in &checks {
        println!(
            "{}: {} blocks, {} targets, {} lines",
            check.key, check.blocks, check.targets, check.lines
        );
    }
    let vacuous: Vec<&CardCheck> = checks.iter().filter(|c| c.is_vacuous()).collect();
    for check in &vacuous {
        println!("warning: {} has no target blocks", check.key);
    }
    for (key, e) in &unreadable {
        println!("warning: cannot read {key}: {}", e.message());
    }
    let schedule = coll.schedule.load();
    let orphans = orphan_keys(&schedule, &cards);
    for key in &orphans {
        println!("warning: schedule entry {key} has no card");
    }
    println!(
        "Checked {} cards in {} ({} without target blocks, {} unreadable).",
        cards.len(),
        coll.directory.display(),
        vacuous.len(),
        unreadable.len()
    );
    println!(
        "Schedule table {} has {} entries ({} orphaned).",
        coll.schedule.path().display(),
        schedule.len(),
        orphans.len()
    );
    println!("History log: {}", coll.history.path().display());
    Ok(())
}

/// Keys in the schedule table with no card under the solutions root.
pub fn orphan_keys(schedule: &Schedule, cards: &[Card]) -> Vec<CardKey> {
    let known: HashSet<&str> = cards.iter().map(|c| c.key().as_str()).collect();
    schedule
        .iter()
        .filter(|(key, _)| !known.contains(key.as_str()))
        .map(|(key, _)| key.clone())
        .collect()
}

/// Check every card, setting aside the ones that cannot be read.
pub fn check_cards(cards: &[Card]) -> (Vec<CardCheck>, Vec<(CardKey, ErrorReport)>) {
    let mut checks = Vec::new();
    let mut unreadable = Vec::new();
    for card in cards {
        match check_card(card) {
            Ok(check) => checks.push(check),
            Err(e) => unreadable.push((card.key().clone(), e)),
        }
    }
    (checks, unreadable)
}

/// Count the blocks, target blocks and drillable lines of one card.
pub fn check_card(card: &Card) -> Fallible<CardCheck> {
    let parsed = parse_markdown(&read_to_string(card.path())?);
    Ok(CardCheck {
        key: card.key().clone(),
        blocks: parsed.blocks.len(),
        targets: parsed.target_blocks.len(),
        lines: parsed
            .target_blocks
            .iter()
            .map(|b| RevealBlock::new(b.clone()).drillable_count())
            .sum(),
    })
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use knos_core::types::timestamp::Timestamp;

    use super::*;
    use crate::helper::create_sample_collection;

    #[test]
    fn test_check_cards() -> Fallible<()> {
        let dir = create_sample_collection()?;
        let coll = Collection::new(Some(dir.display().to_string()))?;
        let (checks, unreadable) = check_cards(&coll.all_cards()?);
        assert!(unreadable.is_empty());
        assert_eq!(
            checks,
            vec![
                CardCheck {
                    key: "archive/old.md".to_string(),
                    blocks: 0,
                    targets: 0,
                    lines: 0,
                },
                CardCheck {
                    key: "focus/one.md".to_string(),
                    blocks: 3,
                    targets: 2,
                    lines: 3,
                },
                CardCheck {
                    key: "focus/two.md".to_string(),
                    blocks: 1,
                    targets: 1,
                    lines: 1,
                },
            ]
        );
        assert!(checks[0].is_vacuous());
        Ok(())
    }

    #[test]
    fn test_orphan_keys() -> Fallible<()> {
        let dir = create_sample_collection()?;
        let coll = Collection::new(Some(dir.display().to_string()))?;
        let now = Timestamp::parse_lenient("2024-01-01T00:00");
        let mut schedule = Schedule::new();
        schedule.update("focus/one.md", 100.0, now);
        schedule.update("focus/renamed.md", 100.0, now);
        assert_eq!(
            orphan_keys(&schedule, &coll.all_cards()?),
            vec!["focus/renamed.md"]
        );
        Ok(())
    }

    #[test]
    fn test_check_collection() -> Fallible<()> {
        let dir = create_sample_collection()?;
        check_collection(Some(dir.display().to_string()))
    }

    #[test]
    fn test_unreadable_cards_are_reported() -> Fallible<()> {
        let dir = create_sample_collection()?;
        write(dir.join("solutions/focus/bad.md"), b"\xff\xfe")?;
        let coll = Collection::new(Some(dir.display().to_string()))?;
        let (checks, unreadable) = check_cards(&coll.all_cards()?);
        assert_eq!(checks.len(), 3);
        assert_eq!(unreadable.len(), 1);
        assert_eq!(unreadable[0].0, "focus/bad.md");
        check_collection(Some(dir.display().to_string()))
    }
}
