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

//! Extraction of drillable fenced code blocks from solution documents.

/// A block preceded by this marker is shown but never drilled.
pub const INFO_MARKER: &str = "<!-- INFO -->";

/// How many characters before an opening fence are searched for
/// [`INFO_MARKER`].
pub const INFO_LOOKBACK: usize = 50;

/// Blocks tagged with this language are drilled as prompt/answer slots.
pub const SLOTS_LANGUAGE: &str = "slots";

/// Separates the visible prompt from the hidden answer in a slot line.
pub const SLOT_DELIMITER: &str = "::";

const FENCE: &str = "```";

const DEFAULT_LANGUAGE: &str = "text";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockType {
    /// Every line is recalled verbatim.
    Code,
    /// Lines are `prompt :: answer` pairs; only answers are recalled.
    Slots,
}

/// A fenced code block extracted from Markdown.
#[derive(Clone, Debug, PartialEq)]
pub struct CodeBlock {
    pub language: String,
    /// The block body, without the trailing newline(s).
    pub content: String,
    pub lines: Vec<String>,
    /// Byte offset of the opening fence.
    pub start_pos: usize,
    /// Byte offset just past the closing fence's backticks.
    pub end_pos: usize,
    /// False if the block is preceded by [`INFO_MARKER`].
    pub is_target: bool,
    pub block_type: BlockType,
}

/// The result of parsing a solution document.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedMarkdown {
    pub raw_text: String,
    /// Every fenced block, in source order.
    pub blocks: Vec<CodeBlock>,
    /// The blocks that will be drilled, in source order.
    pub target_blocks: Vec<CodeBlock>,
}

/// One line of a slots block.
#[derive(Clone, Debug, PartialEq)]
pub struct SlotLine {
    pub prompt: String,
    /// `None` for header lines, which are context and never tested.
    pub answer: Option<String>,
}

impl SlotLine {
    pub fn is_drillable(&self) -> bool {
        self.answer.is_some()
    }
}

pub fn parse_slot_line(line: &str) -> SlotLine {
    match line.split_once(SLOT_DELIMITER) {
        Some((prompt, answer)) => SlotLine {
            prompt: prompt.trim().to_string(),
            answer: Some(answer.trim().to_string()),
        },
        None => SlotLine {
            prompt: line.to_string(),
            answer: None,
        },
    }
}

/// Extract fenced code blocks from Markdown text.
///
/// An opening fence is three backticks at the start of a line, an optional
/// word-character language tag, and a newline. The block ends at the next
/// line that starts with three backticks, whatever follows them. An
/// unterminated fence yields no block.
pub fn parse_markdown(text: &str) -> ParsedMarkdown {
    let mut blocks = Vec::new();
    let mut line_start = Some(0);
    while let Some(pos) = line_start {
        match match_block(text, pos) {
            Some(block) => {
                line_start = next_line_start(text, block.end_pos);
                blocks.push(block);
            }
            None => {
                line_start = next_line_start(text, pos);
            }
        }
    }
    let target_blocks = blocks.iter().filter(|b| b.is_target).cloned().collect();
    ParsedMarkdown {
        raw_text: text.to_string(),
        blocks,
        target_blocks,
    }
}

/// Try to match a complete fenced block whose opening fence begins at
/// `start`, which must be the start of a line.
fn match_block(text: &str, start: usize) -> Option<CodeBlock> {
    if !text[start..].starts_with(FENCE) {
        return None;
    }
    let tag_start = start + FENCE.len();
    let tag_len: usize = text[tag_start..]
        .chars()
        .take_while(|c| is_word_char(*c))
        .map(char::len_utf8)
        .sum();
    let tag_end = tag_start + tag_len;
    if !text[tag_end..].starts_with('\n') {
        return None;
    }
    let content_start = tag_end + 1;

    let mut candidate = Some(content_start);
    let close = loop {
        let pos = candidate?;
        if text[pos..].starts_with(FENCE) {
            break pos;
        }
        candidate = next_line_start(text, pos);
    };

    let tag = &text[tag_start..tag_end];
    let language = if tag.is_empty() {
        DEFAULT_LANGUAGE.to_string()
    } else {
        tag.to_string()
    };
    let content = text[content_start..close].trim_end_matches('\n').to_string();
    let lines = if content.is_empty() {
        Vec::new()
    } else {
        content.split('\n').map(str::to_string).collect()
    };
    let block_type = if language == SLOTS_LANGUAGE {
        BlockType::Slots
    } else {
        BlockType::Code
    };
    Some(CodeBlock {
        language,
        content,
        lines,
        start_pos: start,
        end_pos: close + FENCE.len(),
        is_target: !preceded_by_info_marker(text, start),
        block_type,
    })
}

fn preceded_by_info_marker(text: &str, start: usize) -> bool {
    let before = &text[..start];
    let window_start = before
        .char_indices()
        .rev()
        .take(INFO_LOOKBACK)
        .last()
        .map(|(idx, _)| idx)
        .unwrap_or(start);
    before[window_start..].contains(INFO_MARKER)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// The byte offset of the first line start strictly after `pos`.
fn next_line_start(text: &str, pos: usize) -> Option<usize> {
    text[pos..].find('\n').map(|idx| pos + idx + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_string() {
        let parsed = parse_markdown("");
        assert!(parsed.blocks.is_empty());
        assert!(parsed.target_blocks.is_empty());
    }

    #[test]
    fn test_prose_only() {
        let parsed = parse_markdown("# Title\n\nSome words.\n");
        assert!(parsed.blocks.is_empty());
    }

    #[test]
    fn test_single_block() {
        let text = "# Tokenizer\n\n```python\nimport re\ntext = 'hi'\n```\n\nAfter.\n";
        let parsed = parse_markdown(text);
        assert_eq!(parsed.blocks.len(), 1);
        let block = &parsed.blocks[0];
        assert_eq!(block.language, "python");
        assert_eq!(block.content, "import re\ntext = 'hi'");
        assert_eq!(block.lines, vec!["import re", "text = 'hi'"]);
        assert_eq!(&text[block.start_pos..block.end_pos], "```python\nimport re\ntext = 'hi'\n```");
        assert!(block.is_target);
        assert_eq!(block.block_type, BlockType::Code);
        assert_eq!(parsed.raw_text, text);
    }

    #[test]
    fn test_language_defaults_to_text() {
        let parsed = parse_markdown("```\nfoo\n```\n");
        assert_eq!(parsed.blocks[0].language, "text");
    }

    #[test]
    fn test_blank_lines_inside_block() {
        let parsed = parse_markdown("```rust\nfn a() {}\n\nfn b() {}\n\n\n```\n");
        let block = &parsed.blocks[0];
        assert_eq!(block.lines, vec!["fn a() {}", "", "fn b() {}"]);
    }

    #[test]
    fn test_empty_block_has_no_lines() {
        let parsed = parse_markdown("```\n```\n");
        assert_eq!(parsed.blocks.len(), 1);
        assert_eq!(parsed.blocks[0].content, "");
        assert!(parsed.blocks[0].lines.is_empty());
    }

    #[test]
    fn test_lines_rejoin_to_content() {
        let text = "```\na\n\nb\n```\n```c\n\n\nx\n```\n```\n```\n";
        for block in parse_markdown(text).blocks {
            assert_eq!(block.lines.join("\n"), block.content);
        }
    }

    #[test]
    fn test_unterminated_fence_is_ignored() {
        let parsed = parse_markdown("```python\nprint(1)\n");
        assert!(parsed.blocks.is_empty());
    }

    #[test]
    fn test_first_closing_fence_wins() {
        let text = "```md\nouter\n```inner\nrest\n```\n";
        let parsed = parse_markdown(text);
        assert_eq!(parsed.blocks.len(), 1);
        assert_eq!(parsed.blocks[0].lines, vec!["outer"]);
    }

    #[test]
    fn test_fence_must_start_a_line() {
        let parsed = parse_markdown("inline ```python\nfoo\n```\n");
        assert!(parsed.blocks.is_empty());
    }

    #[test]
    fn test_tag_with_spaces_does_not_open() {
        let parsed = parse_markdown("```rust title\nfoo\n```\n");
        assert!(parsed.blocks.is_empty());
    }

    #[test]
    fn test_info_marker_filters_target() {
        let text = "\
Intro.

```python
a = 1
```

<!-- INFO -->
```python
# reference only
```

```python
b = 2
c = 3
```
";
        let parsed = parse_markdown(text);
        assert_eq!(parsed.blocks.len(), 3);
        assert_eq!(parsed.target_blocks.len(), 2);
        assert!(parsed.blocks[0].is_target);
        assert!(!parsed.blocks[1].is_target);
        assert!(parsed.blocks[2].is_target);
        assert_eq!(parsed.target_blocks[0].lines, vec!["a = 1"]);
        assert_eq!(parsed.target_blocks[1].lines, vec!["b = 2", "c = 3"]);
    }

    #[test]
    fn test_info_marker_outside_window() {
        let padding = "x".repeat(INFO_LOOKBACK);
        let text = format!("<!-- INFO -->\n{padding}\n```\nfoo\n```\n");
        let parsed = parse_markdown(&text);
        assert!(parsed.blocks[0].is_target);
    }

    #[test]
    fn test_info_window_counts_characters() {
        // Multi-byte characters must not split the lookback window.
        let text = "<!-- INFO --> ééééé\n```\nfoo\n```\n";
        let parsed = parse_markdown(text);
        assert!(!parsed.blocks[0].is_target);
    }

    #[test]
    fn test_slots_block_type() {
        let parsed = parse_markdown("```slots\nLists\nappend :: xs.append(x)\n```\n");
        assert_eq!(parsed.blocks[0].block_type, BlockType::Slots);
    }

    #[test]
    fn test_parse_slot_line() {
        assert_eq!(
            parse_slot_line("split words :: re.split(r'\\s', text)"),
            SlotLine {
                prompt: "split words".to_string(),
                answer: Some("re.split(r'\\s', text)".to_string()),
            }
        );
        let header = parse_slot_line("# Regex basics");
        assert!(!header.is_drillable());
        assert_eq!(header.prompt, "# Regex basics");
    }

    #[test]
    fn test_slot_line_splits_on_first_delimiter() {
        let slot = parse_slot_line("path :: std::fs::read");
        assert_eq!(slot.answer.as_deref(), Some("std::fs::read"));
    }
}
