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

use std::path::Path;
use std::path::PathBuf;

use crate::types::aliases::CardKey;

/// A drillable solution document: the join of a Markdown file on disk and
/// its (possibly absent) schedule entry, which is looked up by `key`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Card {
    key: CardKey,
    path: PathBuf,
}

impl Card {
    pub fn new(key: impl Into<CardKey>, path: impl Into<PathBuf>) -> Self {
        Self {
            key: key.into(),
            path: path.into(),
        }
    }

    pub fn key(&self) -> &CardKey {
        &self.key
    }

    /// Absolute path to the Markdown document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The file name, used for display and as the ordering key of cards
    /// that have never been practiced.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.key.clone())
    }

    /// The file name without its extension.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        let card = Card::new("focus/ch02/tokenizer.md", "/tmp/sol/focus/ch02/tokenizer.md");
        assert_eq!(card.key(), "focus/ch02/tokenizer.md");
        assert_eq!(card.name(), "tokenizer.md");
        assert_eq!(card.stem(), "tokenizer");
    }
}
