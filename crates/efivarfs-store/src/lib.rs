//! Read, enumerate and write firmware variables through an efivarfs-style directory.
//!
//! Each variable is one regular file named `Name-GUID` under the store root;
//! its content is a little-endian `u32` attribute word followed by the payload.
//! [`VariableStore`] holds nothing but its [`StoreConfig`]: every call opens,
//! uses and releases its own file handles, and no locking is done across calls.
//! Concurrent writers to the same variable get whatever the filesystem's
//! last-writer-wins behaviour gives them.
//!
//! Writes are not atomic. A failed write can leave a truncated variable file.

mod error;

use common::{Attributes, Status, StoreConfig, StoredVariable, VariableIdentity};
use efivar_codec::{decode_entry_name, encode_entry_name, encode_name_records};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub use error::{StoreError, StoreResult};

/// What a [`VariableStore::write_variable`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The variable file was created or replaced with `bytes` bytes.
    Written { bytes: usize },
    /// The variable file was removed.
    Deleted,
    /// Deletion was requested but no such variable existed.
    NothingToDelete,
}

impl WriteOutcome {
    /// Truthy status: `false` only when a delete found nothing to remove.
    pub fn is_success(&self) -> bool {
        self.status().is_success()
    }

    pub fn status(&self) -> Status {
        match self {
            WriteOutcome::NothingToDelete => Status::NotFound,
            _ => Status::Success,
        }
    }
}

/// Stateless accessor bound to one store root.
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    config: StoreConfig,
}

impl VariableStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Accessor over `root` with default attributes.
    pub fn open<P: AsRef<Path>>(root: P) -> Self {
        Self::new(StoreConfig::with_root(root.as_ref()))
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Full path of the file backing `(name, guid)`.
    pub fn entry_path(&self, name: &str, guid: &Uuid) -> StoreResult<PathBuf> {
        let entry = encode_entry_name(&VariableIdentity::new(name, *guid))?;
        Ok(self.config.root.join(entry))
    }

    /// Raw file contents of a variable, attributes prefix included.
    pub fn read_variable(&self, name: &str, guid: &Uuid) -> StoreResult<Vec<u8>> {
        let path = self.entry_path(name, guid)?;
        read_entry(&path)
    }

    /// A variable split into its attribute word and payload.
    pub fn read_stored_variable(&self, name: &str, guid: &Uuid) -> StoreResult<StoredVariable> {
        let path = self.entry_path(name, guid)?;
        let raw = read_entry(&path)?;
        StoredVariable::from_bytes(&raw).ok_or(StoreError::TruncatedVariable {
            path,
            len: raw.len(),
        })
    }

    /// Every variable in the store, sorted by entry name.
    ///
    /// Any entry that is not `Name-GUID` fails the whole call; no partial list
    /// is returned.
    pub fn list_variables(&self) -> StoreResult<Vec<VariableIdentity>> {
        let root = &self.config.root;
        let dir = fs::read_dir(root).map_err(|e| StoreError::from_io("list", root, e))?;

        let mut entries = Vec::new();
        for entry in dir {
            let entry = entry.map_err(|e| StoreError::io("list", root, e))?;
            let name = entry.file_name().into_string().map_err(|raw| {
                let lossy = raw.to_string_lossy().into_owned();
                warn!(entry = %lossy, "Rejecting non UTF-8 store entry");
                StoreError::from(efivar_codec::CodecError::malformed_entry(
                    lossy,
                    "entry name is not valid UTF-8",
                ))
            })?;
            entries.push(name);
        }
        entries.sort();

        let mut identities = Vec::with_capacity(entries.len());
        for entry in &entries {
            match decode_entry_name(entry) {
                Ok(identity) => identities.push(identity),
                Err(e) => {
                    warn!(entry = %entry, error = %e, "Aborting enumeration on malformed entry");
                    return Err(e.into());
                }
            }
        }

        debug!(root = %root.display(), variables = identities.len(), "Listed store");
        Ok(identities)
    }

    /// All variable names packed as `NextEntryOffset / VendorGuid / Name` records.
    ///
    /// Records follow entry-name order. Every record but the last carries its own
    /// length as `NextEntryOffset`; the last carries 0.
    pub fn list_variable_names(&self) -> StoreResult<Vec<u8>> {
        let identities = self.list_variables()?;
        let buffer = encode_name_records(&identities)?;
        info!(
            root = %self.config.root.display(),
            records = identities.len(),
            bytes = buffer.len(),
            "Enumerated variable names"
        );
        Ok(buffer)
    }

    /// Write or delete a variable.
    ///
    /// `payload: None` deletes. `attributes: None` uses the configured default
    /// (`0x7` unless overridden).
    pub fn write_variable(
        &self,
        name: &str,
        guid: &Uuid,
        payload: Option<&[u8]>,
        attributes: Option<Attributes>,
    ) -> StoreResult<WriteOutcome> {
        let payload = match payload {
            Some(payload) => payload,
            None => return self.delete_variable(name, guid),
        };

        let path = self.entry_path(name, guid)?;
        let attributes = attributes.unwrap_or_else(|| self.config.default_attributes());
        let packed = StoredVariable::new(attributes, payload).to_bytes();

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| StoreError::io("open", &path, e))?;
        // efivarfs takes attributes and data in a single write.
        file.write_all(&packed)
            .map_err(|e| StoreError::io("write", &path, e))?;

        debug!(
            path = %path.display(),
            attributes = attributes.bits(),
            bytes = packed.len(),
            "Wrote variable"
        );
        Ok(WriteOutcome::Written {
            bytes: packed.len(),
        })
    }

    /// Remove a variable. Removing one that does not exist is not an error.
    pub fn delete_variable(&self, name: &str, guid: &Uuid) -> StoreResult<WriteOutcome> {
        let path = self.entry_path(name, guid)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(path = %path.display(), "Deleted variable");
                Ok(WriteOutcome::Deleted)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Nothing to delete");
                Ok(WriteOutcome::NothingToDelete)
            }
            Err(e) => Err(StoreError::io("delete", &path, e)),
        }
    }
}

fn read_entry(path: &Path) -> StoreResult<Vec<u8>> {
    let data = fs::read(path).map_err(|e| StoreError::from_io("read", path, e))?;
    debug!(path = %path.display(), bytes = data.len(), "Read variable");
    Ok(data)
}
