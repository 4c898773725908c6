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

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use knos_core::blocks::CodeBlock;
use knos_core::blocks::ParsedMarkdown;
use knos_core::queue::QueueEntry;
use knos_core::queue::format_time_delta;
use knos_core::reveal::DrillSession;
use knos_core::reveal::LineMark;
use knos_core::reveal::Phase;
use knos_core::reveal::RevealBlock;
use knos_core::reveal::RevealRow;
use maud::Markup;
use maud::PreEscaped;
use maud::html;

use crate::cmd::drill::state::CardOutcome;
use crate::cmd::drill::state::DrillCard;
use crate::cmd::drill::state::MutableState;
use crate::cmd::drill::state::ServerState;
use crate::cmd::drill::template::page_template;
use crate::markdown::markdown_to_html;

pub async fn get_handler(State(state): State<ServerState>) -> (StatusCode, Html<String>) {
    let body = {
        let mutable = state.mutable.lock().unwrap();
        match mutable.current() {
            Some((card, session)) => render_card(&mutable, card, session),
            None => render_completion(&state, &mutable),
        }
    };
    (StatusCode::OK, Html(page_template(body).into_string()))
}

/// A piece of a solution document, in source order.
enum Segment<'a> {
    Prose(&'a str),
    /// A block that is shown but never drilled.
    Info(&'a CodeBlock),
    /// The index of a block among the session's blocks.
    Target(usize),
}

fn segments(parsed: &ParsedMarkdown) -> Vec<Segment<'_>> {
    let text = parsed.raw_text.as_str();
    let mut segments = Vec::new();
    let mut cursor = 0;
    let mut target = 0;
    for block in &parsed.blocks {
        if block.start_pos > cursor {
            segments.push(Segment::Prose(&text[cursor..block.start_pos]));
        }
        if block.is_target {
            segments.push(Segment::Target(target));
            target += 1;
        } else {
            segments.push(Segment::Info(block));
        }
        cursor = block.end_pos;
    }
    if cursor < text.len() {
        segments.push(Segment::Prose(&text[cursor..]));
    }
    segments
}

fn render_card(
    mutable: &MutableState,
    card: &DrillCard,
    session: &DrillSession,
) -> Markup {
    let progress = format!("Card {} of {}", mutable.index() + 1, mutable.total());
    html! {
        div.root {
            div.header {
                div.progress { (progress) }
                div.card-name { (card.queued.card.key()) }
                div.due-info { (status_line(&card.queued)) }
            }
            div.document {
                @for segment in segments(&card.parsed) {
                    @match segment {
                        Segment::Prose(text) => {
                            (PreEscaped(markdown_to_html(text)))
                        }
                        Segment::Info(block) => {
                            pre.info-block { code { (block.content) } }
                        }
                        Segment::Target(idx) => {
                            (render_block(session, idx))
                        }
                    }
                }
            }
            (render_controls(mutable, session))
        }
    }
}

fn status_line(queued: &QueueEntry) -> String {
    match queued.leitner_box() {
        Some(leitner_box) => format!("Box {leitner_box}, {}", queued.due_info),
        None => queued.due_info.clone(),
    }
}

/// `Block i of n (lang)`, followed by the tally once the block is done.
pub fn block_title(block: &RevealBlock, idx: usize, total: usize) -> String {
    let mut title = format!("Block {} of {} ({})", idx + 1, total, block.block().language);
    if block.is_complete() {
        let (correct, marked) = block.tally();
        let pct = if marked == 0 { 100 } else { correct * 100 / marked };
        title.push_str(&format!(" - DONE ({correct}/{marked} {pct}%)"));
    }
    title
}

fn render_block(session: &DrillSession, idx: usize) -> Markup {
    let blocks = session.blocks();
    let block = &blocks[idx];
    let active = idx == session.current_block() && session.phase() == Phase::Revealing;
    let class = if active {
        "block active"
    } else if block.is_complete() {
        let (correct, marked) = block.tally();
        if correct == marked { "block perfect" } else { "block imperfect" }
    } else {
        "block"
    };
    html! {
        div class=(class) {
            div.block-title { (block_title(block, idx, blocks.len())) }
            table.lines {
                @for row in block.rows() {
                    (render_row(&row))
                }
            }
        }
    }
}

fn render_row(row: &RevealRow<'_>) -> Markup {
    let number = row.number.map(|n| n.to_string()).unwrap_or_default();
    let (class, mark, text) = match row.mark {
        LineMark::Correct => ("correct", "✓", shown(row)),
        LineMark::Incorrect => ("incorrect", "✗", shown(row)),
        LineMark::Current => ("current", "▶", hinted(row, '▓')),
        LineMark::Hidden => ("hidden", "", hinted(row, '░')),
        LineMark::Context => ("context", "", row.text.to_string()),
    };
    html! {
        tr class=(class) {
            td.mark { (mark) }
            td.number { (number) }
            td.text { code { (text) } }
        }
    }
}

fn shown(row: &RevealRow<'_>) -> String {
    match row.answer {
        Some(answer) => format!("{} :: {answer}", row.text),
        None => row.text.to_string(),
    }
}

fn hinted(row: &RevealRow<'_>, fill: char) -> String {
    match row.answer {
        Some(answer) => format!("{} :: {}", row.text, hint(answer, fill)),
        None => hint(row.text, fill),
    }
}

/// Replace the line with `fill` characters, keeping its indentation.
pub fn hint(line: &str, fill: char) -> String {
    let body = line.trim_start();
    let indent = &line[..line.len() - body.len()];
    let width = body.chars().count().max(1);
    format!("{indent}{}", fill.to_string().repeat(width))
}

fn render_controls(mutable: &MutableState, session: &DrillSession) -> Markup {
    match session.phase() {
        Phase::Revealing => html! {
            form.controls action="/" method="post" {
                button id="correct" type="submit" name="action" value="Correct" { "Knew it (y)" }
                button id="incorrect" type="submit" name="action" value="Incorrect" { "Missed it (n)" }
                button id="skip" type="submit" name="action" value="Skip" { "Skip block (s)" }
                button id="quit" type="submit" name="action" value="Quit" { "Quit card (q)" }
                button id="end" type="submit" name="action" value="End" { "End" }
            }
        },
        Phase::BlockDone => html! {
            form.controls action="/" method="post" {
                button id="continue" type="submit" name="action" value="Continue" { "Continue (Enter)" }
                button id="quit" type="submit" name="action" value="Quit" { "Quit card (q)" }
                button id="end" type="submit" name="action" value="End" { "End" }
            }
        },
        Phase::Finished => {
            let next_label = if mutable.has_next() { "Next card (Enter)" } else { "Finish (Enter)" };
            html! {
                @if let Some(outcome) = mutable.current_outcome() {
                    div.outcome {
                        p.score { (outcome_message(outcome)) }
                        p.next-due {
                            "Now in box " (outcome.entry.leitner_box) ", due again in "
                            (format_time_delta(outcome.entry.next_due.since(outcome.result.completed_at)))
                            "."
                        }
                    }
                }
                form.controls action="/" method="post" {
                    button id="next" type="submit" name="action" value="Next" { (next_label) }
                    button id="end" type="submit" name="action" value="End" { "End" }
                }
            }
        }
    }
}

fn outcome_message(outcome: &CardOutcome) -> String {
    let result = &outcome.result;
    let verdict = if result.is_perfect() {
        "PERFECT! Next box."
    } else {
        "Reset to Box 0."
    };
    format!(
        "Score: {:.1}% ({}/{} lines) - {verdict}",
        result.score, result.correct_lines, result.total_lines
    )
}

fn render_completion(state: &ServerState, mutable: &MutableState) -> Markup {
    let elapsed = mutable
        .finished_at()
        .map(|at| format_time_delta(at.since(state.session_started_at)))
        .unwrap_or_default();
    html! {
        div.finished {
            h1 { "Session Completed" }
            p {
                "Drilled " (mutable.outcomes().len()) " of " (mutable.total()) " cards"
                @if elapsed != "now" && !elapsed.is_empty() { " in " (elapsed) }
                "."
            }
            table.summary {
                thead {
                    tr { th { "Card" } th { "Score" } th { "Lines" } th { "Box" } }
                }
                tbody {
                    @for outcome in mutable.outcomes() {
                        tr {
                            td { (outcome.card.key()) }
                            td { (format!("{:.1}%", outcome.result.score)) }
                            td { (outcome.result.correct_lines) "/" (outcome.result.total_lines) }
                            td { (outcome.entry.leitner_box) }
                        }
                    }
                }
            }
            form.controls action="/" method="post" {
                button id="shutdown" type="submit" name="action" value="Shutdown" { "Shutdown" }
            }
        }
    }
}
