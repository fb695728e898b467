use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub mod attributes;
pub mod config;
pub use attributes::Attributes;
pub use config::{ConfigError, StoreConfig};

/// Mount point of the Linux efivarfs pseudo-filesystem.
pub const EFIVARFS_ROOT: &str = "/sys/firmware/efi/efivars";

/// Conventional upper bound for a single variable. Sizing hint, not enforced.
pub const EFI_VAR_MAX_BUFFER_SIZE: usize = 1024 * 1024; // 1 MiB

/// Win32 `ERROR_ENVVAR_NOT_FOUND`, reported when a variable or the store is absent.
pub const ERROR_ENVVAR_NOT_FOUND: u32 = 0xCB;

/// Width of the little-endian attributes prefix on every stored variable.
pub const ATTRIBUTES_LEN: usize = 4;

/// A variable's key in the store: its name plus the vendor GUID namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariableIdentity {
    pub name: String,
    pub guid: Uuid,
}

impl VariableIdentity {
    pub fn new(name: impl Into<String>, guid: Uuid) -> Self {
        Self {
            name: name.into(),
            guid,
        }
    }
}

impl fmt::Display for VariableIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.name, self.guid)
    }
}

/// A variable's content as it sits in the store: attributes followed by payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredVariable {
    pub attributes: Attributes,
    pub payload: Vec<u8>,
}

impl StoredVariable {
    pub fn new(attributes: Attributes, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            attributes,
            payload: payload.into(),
        }
    }

    /// On-disk form: `attributes (u32 LE) || payload`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(ATTRIBUTES_LEN + self.payload.len());
        out.extend_from_slice(&self.attributes.bits().to_le_bytes());
        out.extend_from_slice(&self.payload);
        out
    }

    /// Split raw file contents into attributes and payload.
    ///
    /// Returns `None` when fewer than four bytes are present.
    pub fn from_bytes(raw: &[u8]) -> Option<Self> {
        if raw.len() < ATTRIBUTES_LEN {
            return None;
        }
        let (prefix, payload) = raw.split_at(ATTRIBUTES_LEN);
        let bits = u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]);
        Some(Self {
            attributes: Attributes::from_bits_retain(bits),
            payload: payload.to_vec(),
        })
    }
}

/// Caller-facing status of an accessor operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    NotFound,
    InvalidIdentity,
    MalformedEntryName,
    TruncatedVariable,
    IoError,
}

impl Status {
    /// Numeric code handed to callers that speak Win32-style error codes.
    pub fn code(self) -> u32 {
        match self {
            Status::Success => 0,
            Status::NotFound => ERROR_ENVVAR_NOT_FOUND,
            // ERROR_INVALID_PARAMETER
            Status::InvalidIdentity => 0x57,
            // ERROR_INVALID_DATA
            Status::MalformedEntryName => 0x0D,
            Status::TruncatedVariable => 0x0D,
            // ERROR_GEN_FAILURE
            Status::IoError => 0x1F,
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, Status::Success)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Status::Success => "success",
            Status::NotFound => "not found",
            Status::InvalidIdentity => "invalid identity",
            Status::MalformedEntryName => "malformed entry name",
            Status::TruncatedVariable => "truncated variable",
            Status::IoError => "I/O error",
        };
        write!(f, "{} (0x{:X})", label, self.code())
    }
}
