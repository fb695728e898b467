use thiserror::Error;

/// Errors produced by the entry-name and record codecs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The identity cannot be rendered as an entry name.
    #[error("Invalid variable identity: {reason}")]
    InvalidIdentity { reason: String },

    /// A store entry name is not `Name-GUID`.
    #[error("Malformed entry name {entry:?}: {reason}")]
    MalformedEntryName { entry: String, reason: String },

    /// A name-record buffer does not follow the packed record layout.
    #[error("Malformed name record at offset {offset}: {reason}")]
    MalformedRecord { offset: usize, reason: String },
}

impl CodecError {
    pub fn invalid_identity(reason: impl Into<String>) -> Self {
        CodecError::InvalidIdentity {
            reason: reason.into(),
        }
    }

    pub fn malformed_entry(entry: impl Into<String>, reason: impl Into<String>) -> Self {
        CodecError::MalformedEntryName {
            entry: entry.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed_record(offset: usize, reason: impl Into<String>) -> Self {
        CodecError::MalformedRecord {
            offset,
            reason: reason.into(),
        }
    }
}
