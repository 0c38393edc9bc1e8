//! Local configuration overrides.
//!
//! A project may carry `.wrapforge/config.toml` next to its manifest to
//! point the pipeline at different tools without editing Wrapforge.toml
//! (which is usually committed):
//!
//! ```toml
//! [tools]
//! swig = "/opt/swig-4/bin/swig"
//! cxx = "clang++"
//! cxxflags = ["-O2"]
//! ```
//!
//! Settings present here take precedence over the manifest's `[tools]`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::manifest::ToolsConfig;
use crate::util::fs::read_to_string;

/// Directory holding local state and configuration.
pub const CONFIG_DIR: &str = ".wrapforge";

/// Local configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Tool overrides
    pub tools: ToolOverrides,
}

/// Tool overrides; every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ToolOverrides {
    pub swig: Option<PathBuf>,
    pub cxx: Option<PathBuf>,
    pub cxxflags: Vec<String>,
    pub ldflags: Vec<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = read_to_string(path)?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file doesn't exist
    /// or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Check if any override is set.
    pub fn has_overrides(&self) -> bool {
        self.tools.swig.is_some()
            || self.tools.cxx.is_some()
            || !self.tools.cxxflags.is_empty()
            || !self.tools.ldflags.is_empty()
    }

    /// Apply overrides on top of the manifest's tools (overrides win; flag
    /// lists are replaced, not appended).
    pub fn apply(&self, tools: &mut ToolsConfig) {
        if let Some(ref swig) = self.tools.swig {
            tools.swig = swig.clone();
        }
        if let Some(ref cxx) = self.tools.cxx {
            tools.cxx = cxx.clone();
        }
        if !self.tools.cxxflags.is_empty() {
            tools.cxxflags = self.tools.cxxflags.clone();
        }
        if !self.tools.ldflags.is_empty() {
            tools.ldflags = self.tools.ldflags.clone();
        }
    }
}

/// Path of the local config file for a project root.
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR).join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(!config.has_overrides());
    }

    #[test]
    fn test_config_load_and_apply() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[tools]
cxx = "/usr/bin/clang++"
cxxflags = ["-O2", "-Wall"]
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert!(config.has_overrides());

        let mut tools = ToolsConfig {
            cxxflags: vec!["-g".to_string()],
            ..ToolsConfig::default()
        };
        config.apply(&mut tools);

        assert_eq!(tools.cxx, PathBuf::from("/usr/bin/clang++"));
        // swig untouched
        assert_eq!(tools.swig, PathBuf::from("swig"));
        // flags replaced, not merged
        assert_eq!(tools.cxxflags, vec!["-O2", "-Wall"]);
    }

    #[test]
    fn test_load_or_default_on_garbage() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[tools\nswig = ").unwrap();

        let config = Config::load_or_default(&path);
        assert!(!config.has_overrides());
    }

    #[test]
    fn test_project_config_path() {
        assert_eq!(
            project_config_path(Path::new("/p")),
            PathBuf::from("/p/.wrapforge/config.toml")
        );
    }
}
