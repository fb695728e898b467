//! Throw-away efivarfs stand-in for tests and demos.
//!
//! A real efivarfs mount needs root and UEFI firmware. This crate builds a plain
//! directory with the same shape (one `Name-GUID` file per variable, attributes
//! prefix then payload) under the OS temp dir, hands out a [`VariableStore`]
//! bound to it, and removes it again on drop.
//!
//! # Example
//!
//! ```no_run
//! use sim_efivarfs::SimEfivarfs;
//! use uuid::Uuid;
//!
//! let sim = SimEfivarfs::start("doc").unwrap();
//! sim.seed("Lang", &Uuid::nil(), 0x7, b"en-US").unwrap();
//! let names = sim.store().list_variable_names().unwrap();
//! ```

use anyhow::{Context, Result};
use common::{Attributes, StoreConfig, StoredVariable};
use efivarfs_store::VariableStore;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// A temporary variable directory. Deleted when dropped unless [`SimEfivarfs::keep`] was called.
#[derive(Debug)]
pub struct SimEfivarfs {
    root: PathBuf,
    keep: bool,
}

impl SimEfivarfs {
    /// Create an empty store directory; `label` only makes the path readable.
    pub fn start(label: &str) -> Result<Self> {
        let root = std::env::temp_dir().join(format!(
            "sim-efivarfs-{}-{}-{}",
            label,
            std::process::id(),
            Uuid::new_v4().simple()
        ));
        fs::create_dir_all(&root)
            .with_context(|| format!("creating simulated efivarfs at {}", root.display()))?;
        info!(root = %root.display(), "Starting efivarfs simulation");
        Ok(Self { root, keep: false })
    }

    /// A path inside the temp dir that is never created, for absent-store cases.
    pub fn missing_root(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "sim-efivarfs-missing-{}-{}",
            label,
            Uuid::new_v4().simple()
        ))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> StoreConfig {
        StoreConfig::with_root(&self.root)
    }

    pub fn store(&self) -> VariableStore {
        VariableStore::new(self.config())
    }

    /// Write a variable file directly, bypassing the accessor.
    pub fn seed(
        &self,
        name: &str,
        guid: &Uuid,
        attributes: u32,
        payload: &[u8],
    ) -> Result<PathBuf> {
        let bytes = StoredVariable::new(Attributes::from(attributes), payload).to_bytes();
        self.seed_raw(&format!("{}-{}", name, guid), &bytes)
    }

    /// Write an arbitrary entry, well-formed or not.
    pub fn seed_raw(&self, entry_name: &str, contents: &[u8]) -> Result<PathBuf> {
        let path = self.root.join(entry_name);
        fs::write(&path, contents).with_context(|| format!("seeding {}", path.display()))?;
        debug!(entry = entry_name, bytes = contents.len(), "Seeded entry");
        Ok(path)
    }

    /// Raw bytes of an entry as they sit on disk.
    pub fn raw_entry(&self, entry_name: &str) -> Result<Vec<u8>> {
        let path = self.root.join(entry_name);
        fs::read(&path).with_context(|| format!("reading {}", path.display()))
    }

    /// Entry names currently present, sorted.
    pub fn entries(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    /// Leave the directory behind after drop, for post-mortem inspection.
    pub fn keep(mut self) -> PathBuf {
        self.keep = true;
        self.root.clone()
    }
}

impl Drop for SimEfivarfs {
    fn drop(&mut self) {
        if !self.keep {
            let _ = fs::remove_dir_all(&self.root);
        }
    }
}
