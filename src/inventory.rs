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

use std::fs::File;
use std::path::Path;

use knos_core::types::aliases::CardKey;
use knos_core::types::card::Card;
use walkdir::DirEntry;
use walkdir::WalkDir;

use crate::error::ErrorReport;
use crate::error::Fallible;

/// Find every Markdown card under `directory`, keyed relative to `root`.
///
/// Hidden files and directories are skipped, as are files that cannot be
/// opened. A missing directory is an empty inventory.
pub fn walk_cards(directory: &Path, root: &Path) -> Fallible<Vec<Card>> {
    if !directory.is_dir() {
        log::debug!("No card directory at {}", directory.display());
        return Ok(Vec::new());
    }
    let mut cards = Vec::new();
    let walker = WalkDir::new(directory)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(ErrorReport::new(format!(
                    "failed to read {}: {err}",
                    directory.display()
                )));
            }
            Err(err) => {
                log::warn!("Skipping unreadable entry: {err}");
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "md") {
            continue;
        }
        if let Err(err) = File::open(path) {
            log::warn!("Skipping unreadable card {}: {err}", path.display());
            continue;
        }
        cards.push(Card::new(card_key(root, path), path));
    }
    Ok(cards)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

/// The path of a card relative to `root`, with `/` separators. Files
/// outside `root` are keyed by their file name.
pub fn card_key(root: &Path, path: &Path) -> CardKey {
    match path.strip_prefix(root) {
        Ok(relative) => relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use std::fs::create_dir_all;
    use std::fs::write;
    use std::path::PathBuf;

    use super::*;
    use crate::helper::create_tmp_directory;

    #[test]
    fn test_walk_cards() -> Fallible<()> {
        let root = create_tmp_directory()?;
        let focus = root.join("focus");
        create_dir_all(focus.join("ch02"))?;
        create_dir_all(focus.join(".drafts"))?;
        write(focus.join("b.md"), "")?;
        write(focus.join("ch02/a.md"), "")?;
        write(focus.join("notes.txt"), "")?;
        write(focus.join(".hidden.md"), "")?;
        write(focus.join(".drafts/wip.md"), "")?;
        let cards = walk_cards(&focus, &root)?;
        let keys: Vec<&str> = cards.iter().map(|c| c.key().as_str()).collect();
        assert_eq!(keys, vec!["focus/b.md", "focus/ch02/a.md"]);
        assert_eq!(cards[1].path(), focus.join("ch02/a.md"));
        Ok(())
    }

    #[test]
    fn test_missing_directory_is_empty() -> Fallible<()> {
        let root = create_tmp_directory()?;
        assert!(walk_cards(&root.join("focus"), &root)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_card_key() {
        let root = PathBuf::from("/home/u/solutions");
        assert_eq!(
            card_key(&root, &root.join("focus/ch01/lexer.md")),
            "focus/ch01/lexer.md"
        );
        assert_eq!(
            card_key(&root, Path::new("/elsewhere/stray.md")),
            "stray.md"
        );
    }
}
