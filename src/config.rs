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

use std::fs::read_to_string;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ErrorReport;
use crate::error::Fallible;

/// Name of the optional configuration file at the collection root.
pub const CONFIG_FILE: &str = "knos.toml";

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub paths: PathsConfig,
}

/// Locations of the collection's parts. Relative paths are resolved
/// against the collection directory.
#[derive(Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Card keys are relative to this directory.
    pub solutions: PathBuf,
    /// Cards under this directory are drilled.
    pub focus: PathBuf,
    pub schedule: PathBuf,
    pub history: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            solutions: PathBuf::from("solutions"),
            focus: PathBuf::from("solutions/focus"),
            schedule: PathBuf::from("plan/schedule.json"),
            history: PathBuf::from("plan/history.jsonl"),
        }
    }
}

impl Config {
    /// Load the configuration of the collection at `directory`. A missing
    /// file yields the defaults.
    pub fn load(directory: &Path) -> Fallible<Self> {
        let path = directory.join(CONFIG_FILE);
        if !path.exists() {
            log::debug!("No {CONFIG_FILE} in {}, using defaults", directory.display());
            return Ok(Self::default());
        }
        let text = read_to_string(&path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Fallible<Self> {
        toml::from_str(text)
            .map_err(|e| ErrorReport::new(format!("failed to parse {CONFIG_FILE}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use super::*;
    use crate::helper::create_tmp_directory;

    #[test]
    fn test_missing_file_is_default() -> Fallible<()> {
        let dir = create_tmp_directory()?;
        assert_eq!(Config::load(&dir)?, Config::default());
        Ok(())
    }

    #[test]
    fn test_partial_override() -> Fallible<()> {
        let dir = create_tmp_directory()?;
        write(
            dir.join(CONFIG_FILE),
            "[paths]\nfocus = \"solutions/this-week\"\n",
        )?;
        let config = Config::load(&dir)?;
        assert_eq!(config.paths.focus, PathBuf::from("solutions/this-week"));
        assert_eq!(config.paths.solutions, PathBuf::from("solutions"));
        assert_eq!(config.paths.schedule, PathBuf::from("plan/schedule.json"));
        Ok(())
    }

    #[test]
    fn test_empty_file_is_default() -> Fallible<()> {
        assert_eq!(Config::parse("")?, Config::default());
        Ok(())
    }

    #[test]
    fn test_malformed_file_is_error() {
        let err = Config::parse("[paths\nfocus = ").unwrap_err();
        assert!(err.to_string().starts_with("error: failed to parse knos.toml"));
    }

    #[test]
    fn test_unknown_key_is_error() {
        assert!(Config::parse("[paths]\nfocsu = \"x\"\n").is_err());
    }
}
