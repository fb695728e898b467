use common::Status;
use efivar_codec::CodecError;
use std::path::PathBuf;
use thiserror::Error;

/// Accessor level failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The variable, or the store root itself, does not exist.
    #[error("Not found: {path}")]
    NotFound { path: PathBuf },

    /// Caller supplied a name that cannot become an entry name.
    #[error("Invalid variable identity: {source}")]
    InvalidIdentity {
        #[source]
        source: CodecError,
    },

    /// A store entry is not `Name-GUID`; enumeration is abandoned.
    #[error("Store entry rejected: {source}")]
    MalformedEntryName {
        #[source]
        source: CodecError,
    },

    /// The variable file is too short to hold its attributes prefix.
    #[error("Variable {path} holds {len} bytes, too short for its attributes")]
    TruncatedVariable { path: PathBuf, len: usize },

    /// Filesystem failure other than absence.
    #[error("I/O error during `{operation}` on {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Map an I/O error, treating `NotFound` as absence rather than failure.
    pub(crate) fn from_io(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound { path }
        } else {
            StoreError::io(operation, path, source)
        }
    }

    pub fn status(&self) -> Status {
        match self {
            StoreError::NotFound { .. } => Status::NotFound,
            StoreError::InvalidIdentity { .. } => Status::InvalidIdentity,
            StoreError::MalformedEntryName { .. } => Status::MalformedEntryName,
            StoreError::TruncatedVariable { .. } => Status::TruncatedVariable,
            StoreError::Io { .. } => Status::IoError,
        }
    }

    /// Numeric status code; `0xCB` for [`StoreError::NotFound`].
    pub fn code(&self) -> u32 {
        self.status().code()
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

impl From<CodecError> for StoreError {
    fn from(source: CodecError) -> Self {
        match source {
            CodecError::InvalidIdentity { .. } => StoreError::InvalidIdentity { source },
            _ => StoreError::MalformedEntryName { source },
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
