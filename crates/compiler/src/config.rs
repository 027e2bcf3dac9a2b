//! Compiler configuration
//!
//! Include search paths come from CLI flags and, optionally, a `mica.toml`
//! next to the source file:
//!
//! ```toml
//! [include]
//! user = ["include", "../shared"]
//! system = ["/opt/mica/include"]
//! ```
//!
//! CLI-supplied directories take precedence (they are searched first); no
//! environment variables are consulted.

use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "mica.toml";

#[derive(Debug, Clone, Default)]
pub struct CompilerConfig {
    /// Directories searched for `#include <...>` (then for `"..."` as a
    /// fallback).
    pub system_include_dirs: Vec<PathBuf>,
    /// Directories searched for `#include "..."` after the including
    /// file's own directory.
    pub user_include_dirs: Vec<PathBuf>,
}

impl CompilerConfig {
    pub fn new() -> Self {
        CompilerConfig::default()
    }

    /// Add a user include directory (builder pattern).
    pub fn with_user_include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_include_dirs.push(dir.into());
        self
    }

    /// Add a system include directory.
    pub fn with_system_include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.system_include_dirs.push(dir.into());
        self
    }

    /// Parse a configuration file body.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        let file: ConfigFile = toml::from_str(content)?;
        let include = file.include.unwrap_or_default();
        Ok(CompilerConfig {
            system_include_dirs: include.system.into_iter().map(PathBuf::from).collect(),
            user_include_dirs: include.user.into_iter().map(PathBuf::from).collect(),
        })
    }

    /// Load `mica.toml` from the source file's directory, if present, and
    /// append its directories after the ones already configured. Relative
    /// paths in the file resolve against that directory.
    pub fn merge_config_file_for(mut self, source: &Path) -> Self {
        let dir = match source.parent() {
            Some(dir) => dir,
            None => return self,
        };
        let path = dir.join(CONFIG_FILE_NAME);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(_) => return self,
        };
        match CompilerConfig::from_toml(&content) {
            Ok(file_config) => {
                self.user_include_dirs
                    .extend(file_config.user_include_dirs.iter().map(|p| dir.join(p)));
                self.system_include_dirs
                    .extend(file_config.system_include_dirs.iter().map(|p| dir.join(p)));
                self
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config file");
                self
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    include: Option<IncludeSection>,
}

#[derive(Debug, Default, Deserialize)]
struct IncludeSection {
    #[serde(default)]
    user: Vec<String>,
    #[serde(default)]
    system: Vec<String>,
}
