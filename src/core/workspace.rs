//! Workspace - the project root, its manifest, and local overrides.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::core::manifest::{Manifest, MANIFEST_NAME};
use crate::util::config::{project_config_path, Config};

/// Failure to locate a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("could not find `{MANIFEST_NAME}` in `{}` or any parent directory", dir.display())]
    NotFound { dir: PathBuf },
}

/// Find the manifest starting at `start` and searching upward.
pub fn find_manifest(start: &Path) -> Result<PathBuf, ManifestError> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(MANIFEST_NAME);
        if candidate.is_file() {
            return Ok(candidate);
        }
        if !current.pop() {
            return Err(ManifestError::NotFound {
                dir: start.to_path_buf(),
            });
        }
    }
}

/// A loaded project: manifest plus the directory everything is relative to.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    manifest_path: PathBuf,
    manifest: Manifest,
}

impl Workspace {
    /// Load a workspace from a manifest path, applying `.wrapforge/config.toml`.
    pub fn new(manifest_path: &Path) -> Result<Self> {
        let mut manifest = Manifest::load(manifest_path)?;
        // Tools run with the root as their working directory, so it must not
        // depend on the caller's.
        let dir = manifest_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let root = dir
            .canonicalize()
            .with_context(|| format!("failed to resolve project root: {}", dir.display()))?;

        let config = Config::load_or_default(&project_config_path(&root));
        if config.has_overrides() {
            tracing::debug!("applying tool overrides from {}", project_config_path(&root).display());
            config.apply(&mut manifest.tools);
        }

        Ok(Workspace {
            root,
            manifest_path: manifest_path.to_path_buf(),
            manifest,
        })
    }

    /// Locate the manifest (explicit path, or search upward from `cwd`) and load it.
    pub fn discover(cwd: &Path, explicit: Option<&Path>) -> Result<Self> {
        let manifest_path = match explicit {
            Some(path) => path.to_path_buf(),
            None => find_manifest(cwd)?,
        };
        Self::new(&manifest_path)
    }

    /// Build a workspace from an in-memory manifest.
    pub fn from_manifest(root: impl Into<PathBuf>, manifest: Manifest) -> Self {
        let root = root.into();
        Workspace {
            manifest_path: root.join(MANIFEST_NAME),
            root,
            manifest,
        }
    }

    /// Project root directory; every rule path is relative to it.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the manifest this workspace was loaded from.
    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// The effective manifest (with local overrides applied).
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Resolve a root-relative path.
    pub fn path(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::manifest::default_manifest;
    use tempfile::TempDir;

    #[test]
    fn test_find_manifest_searches_upward() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(MANIFEST_NAME), default_manifest("SerialInterface")).unwrap();
        let nested = tmp.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_manifest(&nested).unwrap();
        assert_eq!(found, tmp.path().join(MANIFEST_NAME));
    }

    #[test]
    fn test_find_manifest_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = find_manifest(tmp.path());
        // An ancestor of the temp dir may hold a manifest.
        if let Err(ManifestError::NotFound { dir }) = err {
            assert_eq!(dir, tmp.path());
        }
    }

    #[test]
    fn test_workspace_root_is_absolute_and_normalized() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(MANIFEST_NAME), default_manifest("SerialInterface")).unwrap();
        std::fs::create_dir(tmp.path().join("sub")).unwrap();

        let ws = Workspace::new(&tmp.path().join("sub/./../Wrapforge.toml")).unwrap();
        assert!(ws.root().is_absolute());
        assert_eq!(ws.root(), tmp.path().canonicalize().unwrap());
    }

    #[test]
    fn test_workspace_applies_local_overrides() {
        let tmp = TempDir::new().unwrap();
        let manifest_path = tmp.path().join(MANIFEST_NAME);
        std::fs::write(&manifest_path, default_manifest("SerialInterface")).unwrap();
        std::fs::create_dir_all(tmp.path().join(".wrapforge")).unwrap();
        std::fs::write(
            tmp.path().join(".wrapforge/config.toml"),
            "[tools]\ncxx = \"clang++\"\n",
        )
        .unwrap();

        let ws = Workspace::new(&manifest_path).unwrap();
        assert_eq!(ws.root(), tmp.path().canonicalize().unwrap());
        assert_eq!(ws.manifest().tools.cxx, PathBuf::from("clang++"));
        assert_eq!(ws.manifest().tools.swig, PathBuf::from("swig"));
    }
}
