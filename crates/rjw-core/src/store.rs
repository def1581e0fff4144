//! Artifact persistence seam.
//!
//! The governance core only tracks identifiers and reference edges. Document
//! bodies (evidence write-ups, specs, guarded code) go through an
//! [`ArtifactStore`] so the caller decides where they land.

use crate::error::{Result, RjwError};
use crate::io;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

pub trait ArtifactStore {
    /// Persist `content` under `name`, replacing any previous content.
    fn persist(&mut self, name: &str, content: &str) -> Result<()>;

    fn read(&self, name: &str) -> Result<String>;

    fn exists(&self, name: &str) -> bool;
}

// ---------------------------------------------------------------------------
// FsStore
// ---------------------------------------------------------------------------

/// Stores artifacts as files below `root`.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> Result<PathBuf> {
        let rel = Path::new(name);
        if name.is_empty()
            || rel
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(RjwError::InvalidInput(format!(
                "artifact name '{name}' must be a relative path inside the project"
            )));
        }
        Ok(self.root.join(rel))
    }
}

impl ArtifactStore for FsStore {
    fn persist(&mut self, name: &str, content: &str) -> Result<()> {
        let path = self.resolve(name)?;
        io::atomic_write(&path, content.as_bytes())
    }

    fn read(&self, name: &str) -> Result<String> {
        let path = self.resolve(name)?;
        if !path.exists() {
            return Err(RjwError::ArtifactNotFound(name.to_string()));
        }
        Ok(std::fs::read_to_string(path)?)
    }

    fn exists(&self, name: &str) -> bool {
        self.resolve(name).map(|p| p.exists()).unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    files: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }
}

impl ArtifactStore for MemoryStore {
    fn persist(&mut self, name: &str, content: &str) -> Result<()> {
        self.files.insert(name.to_string(), content.to_string());
        Ok(())
    }

    fn read(&self, name: &str) -> Result<String> {
        self.files
            .get(name)
            .cloned()
            .ok_or_else(|| RjwError::ArtifactNotFound(name.to_string()))
    }

    fn exists(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn fs_store_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut store = FsStore::new(dir.path());
        store.persist("src/app.rs", "fn main() {}").unwrap();
        assert!(store.exists("src/app.rs"));
        assert_eq!(store.read("src/app.rs").unwrap(), "fn main() {}");
        assert!(dir.path().join("src/app.rs").exists());
    }

    #[test]
    fn fs_store_rejects_escaping_paths() {
        let dir = TempDir::new().unwrap();
        let mut store = FsStore::new(dir.path());
        assert!(store.persist("../outside.rs", "x").is_err());
        assert!(store.persist("/etc/passwd", "x").is_err());
        assert!(!store.exists("../outside.rs"));
    }

    #[test]
    fn missing_artifact_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.read("nope.md"),
            Err(RjwError::ArtifactNotFound(_))
        ));
    }
}
