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

use knos_core::queue::ReviewerSummary;
use knos_core::queue::summarize;
use knos_core::types::timestamp::Timestamp;

use crate::collection::Collection;
use crate::error::Fallible;

pub fn print_summary(directory: Option<String>) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let summary = summarize(&coll.schedule.load(), &coll.focus_cards()?, Timestamp::now());
    print!("{}", format_summary(&summary));
    Ok(())
}

pub fn format_summary(summary: &ReviewerSummary) -> String {
    let mut lines = vec!["Reviewer Status".to_string(), "=".repeat(40)];
    let counts = [
        ("Box 0 (failed):", summary.box_zero),
        ("Overdue:", summary.overdue),
        ("Due now:", summary.due_now),
        ("Never practiced:", summary.never_practiced),
    ];
    for (label, count) in counts {
        if count > 0 {
            lines.push(format!("  {label:<19}{count}"));
        }
    }
    if summary.total_due() == 0 {
        lines.push("  All caught up!".to_string());
    }
    lines.push(String::new());
    lines.push(format!("  {:<19}{}", "Total in focus:", summary.total_focus));
    if let Some(date) = summary.last_practiced.and_then(Timestamp::date_string) {
        lines.push(format!("  {:<19}{date}", "Last practiced:"));
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}
