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

use std::fs::create_dir_all;
use std::fs::write;
use std::path::PathBuf;

use tempfile::tempdir;

use crate::error::Fallible;

pub const CARD_ONE: &str = "\
# Word count

Split the text into words.

```python
words = text.split()
count = len(words)
```

<!-- INFO -->
```text
reference output
```

Then print them.

```python
print(count)
```
";

pub const CARD_TWO: &str = "\
# Regex

```slots
Regex basics
split :: re.split(p, s)
```
";

pub fn create_tmp_directory() -> Fallible<PathBuf> {
    let dir = tempdir()?.keep();
    Ok(dir.canonicalize()?)
}

/// A collection with two focus cards, a hidden draft and an archived card
/// outside the focus directory.
pub fn create_sample_collection() -> Fallible<PathBuf> {
    let dir = create_tmp_directory()?;
    let focus = dir.join("solutions/focus");
    create_dir_all(focus.join(".drafts"))?;
    create_dir_all(dir.join("solutions/archive"))?;
    write(focus.join("one.md"), CARD_ONE)?;
    write(focus.join("two.md"), CARD_TWO)?;
    write(focus.join(".drafts/wip.md"), "```\nwip\n```\n")?;
    write(dir.join("solutions/archive/old.md"), "# Old\n\nNo code here.\n")?;
    Ok(dir)
}
