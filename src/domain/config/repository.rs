// Copyright 2025 JiangLong.
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

use super::state::JeraConfig;
use crate::shared::error::{JeraError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory under the home directory holding the state file.
pub const CONFIG_DIR: &str = ".jera";

/// State file name.
pub const CONFIG_FILE: &str = "config";

/// Environment variable overriding the state file location.
pub const CONFIG_ENV: &str = "JERA_CONFIG";

/// Storage of the current selection.
pub trait ConfigRepository: Send + Sync {
    fn load(&self) -> Result<JeraConfig>;

    fn save(&self, config: &JeraConfig) -> Result<()>;

    /// Read, mutate in memory, write back the whole document.
    fn update(&self, apply: &mut dyn FnMut(&mut JeraConfig)) -> Result<JeraConfig> {
        let mut config = self.load()?;
        apply(&mut config);
        self.save(&config)?;
        Ok(config)
    }
}

/// YAML file backed repository, `~/.jera/config` by default.
#[derive(Debug, Clone)]
pub struct FileConfigRepository {
    path: PathBuf,
}

impl FileConfigRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR)
            .join(CONFIG_FILE)
    }

    /// Explicit path if given, the default location otherwise.
    pub fn from_override(path: Option<PathBuf>) -> Self {
        Self::new(path.unwrap_or_else(Self::default_path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigRepository for FileConfigRepository {
    fn load(&self) -> Result<JeraConfig> {
        if !self.path.exists() {
            tracing::debug!("No state file at {}, using defaults", self.path.display());
            return Ok(JeraConfig::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(JeraConfig::default());
        }

        serde_yaml::from_str(&content).map_err(|e| {
            JeraError::config_error(format!(
                "Failed to parse {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    fn save(&self, config: &JeraConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(config)?;
        fs::write(&self.path, content)?;
        tracing::debug!("Saved state file {}", self.path.display());
        Ok(())
    }
}
