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

//! Line-by-line self-assessment of a card's target blocks.
//!
//! Each block hides its lines (or, for slots blocks, its answers) until the
//! user marks them known or unknown. A [`DrillSession`] walks the blocks in
//! source order and produces a [`SessionResult`] once every block is done or
//! the user quits.

use crate::blocks::BlockType;
use crate::blocks::CodeBlock;
use crate::blocks::ParsedMarkdown;
use crate::blocks::SlotLine;
use crate::blocks::parse_slot_line;
use crate::types::aliases::CardKey;
use crate::types::timestamp::Timestamp;

/// Outcome of drilling one block.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockResult {
    /// The drillable lines, in order.
    pub lines: Vec<String>,
    /// One entry per line reached: true if recalled.
    pub results: Vec<bool>,
    /// True if the session was quit during this block, in which case
    /// `results` may be shorter than `lines`.
    pub quit: bool,
}

impl BlockResult {
    pub fn correct(&self) -> usize {
        self.results.iter().filter(|r| **r).count()
    }
}

/// Outcome of drilling one card.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionResult {
    pub card: CardKey,
    /// The blocks actually drilled, in order. Blocks never reached are
    /// absent.
    pub blocks: Vec<BlockResult>,
    pub total_lines: usize,
    pub correct_lines: usize,
    /// Percentage in `0.0..=100.0`.
    pub score: f64,
    pub completed_at: Timestamp,
}

impl SessionResult {
    pub fn new(card: CardKey, blocks: Vec<BlockResult>, completed_at: Timestamp) -> Self {
        let total_lines: usize = blocks.iter().map(|b| b.results.len()).sum();
        let correct_lines: usize = blocks.iter().map(BlockResult::correct).sum();
        Self {
            card,
            blocks,
            total_lines,
            correct_lines,
            score: score(correct_lines, total_lines),
            completed_at,
        }
    }

    pub fn is_perfect(&self) -> bool {
        self.score >= crate::leitner::PERFECT_SCORE
    }

    pub fn was_quit(&self) -> bool {
        self.blocks.iter().any(|b| b.quit)
    }
}

/// `100 * correct / total`, or `100.0` when there is nothing to get wrong.
pub fn score(correct: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        100.0 * correct as f64 / total as f64
    }
}

/// How a line should be shown to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineMark {
    /// Revealed and marked known.
    Correct,
    /// Revealed and marked unknown.
    Incorrect,
    /// The hidden line currently being recalled.
    Current,
    /// Hidden, not yet reached.
    Hidden,
    /// A slots header line: always visible, never tested.
    Context,
}

/// One display row of a block.
#[derive(Clone, Debug, PartialEq)]
pub struct RevealRow<'a> {
    /// 1-based position among drillable lines; `None` for context rows.
    pub number: Option<usize>,
    /// The full line for code blocks, the prompt for slot lines.
    pub text: &'a str,
    /// The hidden part of a slot line.
    pub answer: Option<&'a str>,
    pub mark: LineMark,
}

/// Reveal state for one block.
#[derive(Clone, Debug)]
pub struct RevealBlock {
    block: CodeBlock,
    /// Parsed slot lines; empty for code blocks.
    slots: Vec<SlotLine>,
    /// Indices into `block.lines` that are tested.
    drillable: Vec<usize>,
    results: Vec<bool>,
    complete: bool,
}

impl RevealBlock {
    pub fn new(block: CodeBlock) -> Self {
        let (slots, drillable): (Vec<SlotLine>, Vec<usize>) = match block.block_type {
            BlockType::Slots => {
                let slots: Vec<SlotLine> = block.lines.iter().map(|l| parse_slot_line(l)).collect();
                let drillable = slots
                    .iter()
                    .enumerate()
                    .filter(|(_, slot)| slot.is_drillable())
                    .map(|(i, _)| i)
                    .collect();
                (slots, drillable)
            }
            BlockType::Code => (Vec::new(), (0..block.lines.len()).collect()),
        };
        let complete = drillable.is_empty();
        Self {
            block,
            slots,
            drillable,
            results: Vec::new(),
            complete,
        }
    }

    pub fn block(&self) -> &CodeBlock {
        &self.block
    }

    /// Index of the next drillable line to reveal.
    pub fn current(&self) -> usize {
        self.results.len()
    }

    pub fn drillable_count(&self) -> usize {
        self.drillable.len()
    }

    pub fn results(&self) -> &[bool] {
        &self.results
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Mark the current line and advance.
    pub fn reveal(&mut self, success: bool) {
        if self.complete {
            return;
        }
        self.results.push(success);
        if self.results.len() >= self.drillable.len() {
            self.complete = true;
        }
    }

    /// Count every remaining line as unknown and complete the block.
    pub fn skip_remaining(&mut self) {
        if self.complete {
            return;
        }
        self.results.resize(self.drillable.len(), false);
        self.complete = true;
    }

    pub fn result(&self, quit: bool) -> BlockResult {
        BlockResult {
            lines: self
                .drillable
                .iter()
                .map(|&i| self.block.lines[i].clone())
                .collect(),
            results: self.results.clone(),
            quit,
        }
    }

    /// Number correct and number marked so far.
    pub fn tally(&self) -> (usize, usize) {
        (self.results.iter().filter(|r| **r).count(), self.results.len())
    }

    /// Every line of the block with its display state.
    pub fn rows(&self) -> Vec<RevealRow<'_>> {
        match self.block.block_type {
            BlockType::Code => self
                .block
                .lines
                .iter()
                .enumerate()
                .map(|(i, line)| RevealRow {
                    number: Some(i + 1),
                    text: line,
                    answer: None,
                    mark: self.mark(i),
                })
                .collect(),
            BlockType::Slots => {
                let mut drillable_idx = 0;
                self.slots
                    .iter()
                    .map(|slot| match &slot.answer {
                        None => RevealRow {
                            number: None,
                            text: &slot.prompt,
                            answer: None,
                            mark: LineMark::Context,
                        },
                        Some(answer) => {
                            let row = RevealRow {
                                number: Some(drillable_idx + 1),
                                text: &slot.prompt,
                                answer: Some(answer.as_str()),
                                mark: self.mark(drillable_idx),
                            };
                            drillable_idx += 1;
                            row
                        }
                    })
                    .collect()
            }
        }
    }

    fn mark(&self, drillable_idx: usize) -> LineMark {
        match self.results.get(drillable_idx) {
            Some(true) => LineMark::Correct,
            Some(false) => LineMark::Incorrect,
            None if drillable_idx == self.current() && !self.complete => LineMark::Current,
            None => LineMark::Hidden,
        }
    }
}

/// Discrete user intents that drive a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    Correct,
    Incorrect,
    SkipBlock,
    Continue,
    Quit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Lines of the current block are being revealed.
    Revealing,
    /// The current block is done and more remain; waiting for the user to
    /// continue.
    BlockDone,
    /// The session is over, either normally or by quitting.
    Finished,
}

/// Drives one card through all of its target blocks.
#[derive(Clone, Debug)]
pub struct DrillSession {
    card: CardKey,
    blocks: Vec<RevealBlock>,
    current: usize,
    phase: Phase,
    quit: bool,
}

impl DrillSession {
    pub fn new(card: CardKey, parsed: &ParsedMarkdown) -> Self {
        let blocks = parsed
            .target_blocks
            .iter()
            .cloned()
            .map(RevealBlock::new)
            .collect();
        let mut session = Self {
            card,
            blocks,
            current: 0,
            phase: Phase::Revealing,
            quit: false,
        };
        session.settle();
        session
    }

    pub fn card(&self) -> &CardKey {
        &self.card
    }

    pub fn blocks(&self) -> &[RevealBlock] {
        &self.blocks
    }

    /// Index of the block being drilled (or last drilled).
    pub fn current_block(&self) -> usize {
        self.current
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub fn apply(&mut self, intent: Intent) {
        match intent {
            Intent::Correct => self.reveal(true),
            Intent::Incorrect => self.reveal(false),
            Intent::SkipBlock => self.skip_block(),
            Intent::Continue => self.continue_to_next_block(),
            Intent::Quit => self.quit(),
        }
    }

    pub fn reveal(&mut self, success: bool) {
        if self.phase != Phase::Revealing {
            return;
        }
        self.blocks[self.current].reveal(success);
        self.after_block_step();
    }

    pub fn skip_block(&mut self) {
        if self.phase != Phase::Revealing {
            return;
        }
        self.blocks[self.current].skip_remaining();
        self.after_block_step();
    }

    /// Move past the pause between blocks.
    pub fn continue_to_next_block(&mut self) {
        if self.phase != Phase::BlockDone {
            return;
        }
        self.current += 1;
        self.phase = Phase::Revealing;
        self.settle();
    }

    /// End the session now. Work already recorded is kept; blocks not yet
    /// reached are not counted.
    pub fn quit(&mut self) {
        if self.phase == Phase::Finished {
            return;
        }
        self.quit = self.phase == Phase::Revealing;
        self.phase = Phase::Finished;
    }

    /// The session's result, once finished.
    pub fn result(&self, completed_at: Timestamp) -> Option<SessionResult> {
        if !self.is_finished() {
            return None;
        }
        let attempted = if self.blocks.is_empty() {
            0
        } else {
            self.current + 1
        };
        let blocks = self.blocks[..attempted]
            .iter()
            .enumerate()
            .map(|(i, block)| block.result(self.quit && i == self.current))
            .collect();
        Some(SessionResult::new(self.card.clone(), blocks, completed_at))
    }

    fn after_block_step(&mut self) {
        if !self.blocks[self.current].is_complete() {
            return;
        }
        if self.current + 1 < self.blocks.len() {
            self.phase = Phase::BlockDone;
        } else {
            self.phase = Phase::Finished;
        }
    }

    /// Pass over blocks with nothing to drill, finishing the session if
    /// none are left.
    fn settle(&mut self) {
        while self.phase == Phase::Revealing {
            match self.blocks.get(self.current) {
                None => self.phase = Phase::Finished,
                Some(block) if block.is_complete() => {
                    if self.current + 1 < self.blocks.len() {
                        self.current += 1;
                    } else {
                        self.phase = Phase::Finished;
                    }
                }
                Some(_) => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;
    use crate::blocks::parse_markdown;
    use crate::leitner::LeitnerBox;
    use crate::leitner::Schedule;

    fn now() -> Timestamp {
        Timestamp::new(
            NaiveDateTime::parse_from_str("2024-01-01T12:00:00", "%Y-%m-%dT%H:%M:%S").unwrap(),
        )
    }

    fn code(n: usize) -> String {
        let lines: Vec<String> = (0..n).map(|i| format!("line_{i}()")).collect();
        format!("```python\n{}\n```\n", lines.join("\n"))
    }

    fn session(blocks: &[usize]) -> DrillSession {
        let text: String = blocks.iter().map(|n| code(*n)).collect::<Vec<_>>().join("\nprose\n\n");
        DrillSession::new("focus/card.md".to_string(), &parse_markdown(&text))
    }

    #[test]
    fn test_reveal_block_progression() {
        let parsed = parse_markdown(&code(3));
        let mut block = RevealBlock::new(parsed.blocks[0].clone());
        assert_eq!(block.drillable_count(), 3);
        block.reveal(true);
        block.reveal(false);
        assert_eq!(block.current(), 2);
        assert!(!block.is_complete());
        block.reveal(true);
        assert!(block.is_complete());
        // No-op once complete.
        block.reveal(false);
        assert_eq!(block.results(), &[true, false, true]);
    }

    #[test]
    fn test_skip_counts_remaining_as_wrong() {
        let parsed = parse_markdown(&code(4));
        let mut block = RevealBlock::new(parsed.blocks[0].clone());
        block.reveal(true);
        block.skip_remaining();
        assert!(block.is_complete());
        assert_eq!(block.current(), 4);
        assert_eq!(block.results(), &[true, false, false, false]);
        block.skip_remaining();
        assert_eq!(block.results().len(), 4);
    }

    #[test]
    fn test_rows_for_code_block() {
        let parsed = parse_markdown(&code(3));
        let mut block = RevealBlock::new(parsed.blocks[0].clone());
        block.reveal(false);
        let marks: Vec<LineMark> = block.rows().iter().map(|r| r.mark).collect();
        assert_eq!(marks, vec![LineMark::Incorrect, LineMark::Current, LineMark::Hidden]);
    }

    #[test]
    fn test_slots_only_count_answers() {
        let text = "```slots\n# Regex\nsplit :: re.split(p, s)\nfind all :: re.findall(p, s)\n```\n";
        let parsed = parse_markdown(text);
        let mut block = RevealBlock::new(parsed.blocks[0].clone());
        assert_eq!(block.drillable_count(), 2);
        let rows = block.rows();
        assert_eq!(rows[0].mark, LineMark::Context);
        assert_eq!(rows[0].number, None);
        assert_eq!(rows[1].text, "split");
        assert_eq!(rows[1].answer, Some("re.split(p, s)"));
        assert_eq!(rows[1].mark, LineMark::Current);
        assert_eq!(rows[2].number, Some(2));
        block.reveal(true);
        block.reveal(true);
        assert!(block.is_complete());
        let result = block.result(false);
        assert_eq!(
            result.lines,
            vec!["split :: re.split(p, s)", "find all :: re.findall(p, s)"]
        );
        assert_eq!(result.results, vec![true, true]);
    }

    #[test]
    fn test_slots_block_of_headers_is_complete() {
        let parsed = parse_markdown("```slots\njust a header\n```\n");
        let block = RevealBlock::new(parsed.blocks[0].clone());
        assert!(block.is_complete());
    }

    #[test]
    fn test_score_over_blocks() {
        let mut s = session(&[3, 2]);
        s.reveal(true);
        s.reveal(true);
        s.reveal(false);
        assert_eq!(s.phase(), Phase::BlockDone);
        s.continue_to_next_block();
        s.reveal(true);
        s.reveal(true);
        assert!(s.is_finished());
        let result = s.result(now()).unwrap();
        assert_eq!(result.total_lines, 5);
        assert_eq!(result.correct_lines, 4);
        assert_eq!(result.score, 80.0);
        assert!(!result.was_quit());
    }

    #[test]
    fn test_pause_between_blocks_ignores_answers() {
        let mut s = session(&[1, 1]);
        s.reveal(true);
        assert_eq!(s.phase(), Phase::BlockDone);
        s.reveal(false);
        s.skip_block();
        assert_eq!(s.current_block(), 0);
        assert_eq!(s.blocks()[1].results().len(), 0);
        s.apply(Intent::Continue);
        assert_eq!(s.current_block(), 1);
        assert_eq!(s.phase(), Phase::Revealing);
    }

    #[test]
    fn test_quit_preserves_partial_work() {
        let mut s = session(&[4, 5, 3]);
        for _ in 0..4 {
            s.reveal(true);
        }
        s.continue_to_next_block();
        s.reveal(true);
        s.reveal(false);
        s.quit();
        assert!(s.is_finished());
        let result = s.result(now()).unwrap();
        assert_eq!(result.blocks.len(), 2);
        assert_eq!(result.total_lines, 6);
        assert_eq!(result.correct_lines, 5);
        let partial = &result.blocks[1];
        assert!(partial.quit);
        assert_eq!(partial.results.len(), 2);
        assert_eq!(partial.lines.len(), 5);
        assert!(!result.blocks[0].quit);
        assert!(result.was_quit());
    }

    #[test]
    fn test_quit_does_not_count_unreached_blocks_but_skip_does() {
        // Quit: the unreached lines vanish from the total.
        let mut quitter = session(&[2, 2]);
        quitter.reveal(true);
        quitter.quit();
        let quit_result = quitter.result(now()).unwrap();
        assert_eq!(quit_result.total_lines, 1);
        assert_eq!(quit_result.score, 100.0);

        // Skip: the remaining lines count as wrong.
        let mut skipper = session(&[2, 2]);
        skipper.reveal(true);
        skipper.skip_block();
        skipper.continue_to_next_block();
        skipper.skip_block();
        let skip_result = skipper.result(now()).unwrap();
        assert_eq!(skip_result.total_lines, 4);
        assert_eq!(skip_result.correct_lines, 1);
        assert_eq!(skip_result.score, 25.0);
    }

    #[test]
    fn test_quit_during_pause() {
        let mut s = session(&[1, 1]);
        s.reveal(false);
        s.apply(Intent::Quit);
        let result = s.result(now()).unwrap();
        assert_eq!(result.blocks.len(), 1);
        assert!(!result.blocks[0].quit);
        assert_eq!(result.total_lines, 1);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn test_no_result_until_finished() {
        let mut s = session(&[2]);
        s.reveal(true);
        assert!(s.result(now()).is_none());
    }

    #[test]
    fn test_zero_target_blocks_is_vacuously_perfect() {
        let text = "# Notes\n\n<!-- INFO -->\n```\nreference\n```\n";
        let s = DrillSession::new("focus/notes.md".to_string(), &parse_markdown(text));
        assert!(s.is_finished());
        let result = s.result(now()).unwrap();
        assert_eq!(result.total_lines, 0);
        assert_eq!(result.score, 100.0);
        assert!(result.blocks.is_empty());

        // It still advances the card.
        let mut schedule = Schedule::new();
        let entry = schedule.update(&result.card, result.score, now());
        assert_eq!(entry.leitner_box, LeitnerBox::new(1));
    }

    #[test]
    fn test_empty_blocks_are_passed_over() {
        let text = "```\n```\n\n```\nonly()\n```\n\n```\n```\n";
        let mut s = DrillSession::new("c.md".to_string(), &parse_markdown(text));
        assert_eq!(s.current_block(), 1);
        s.reveal(true);
        assert_eq!(s.phase(), Phase::BlockDone);
        s.continue_to_next_block();
        assert!(s.is_finished());
        let result = s.result(now()).unwrap();
        assert_eq!(result.blocks.len(), 3);
        assert_eq!(result.total_lines, 1);
    }

    #[test]
    fn test_finished_session_ignores_intents() {
        let mut s = session(&[1]);
        s.reveal(false);
        assert!(s.is_finished());
        s.apply(Intent::Correct);
        s.apply(Intent::Quit);
        let result = s.result(now()).unwrap();
        assert_eq!(result.blocks[0].results, vec![false]);
        assert!(!result.was_quit());
    }
}
