//! Codecs shared by every efivarfs accessor operation.
//!
//! * [`name_guid`] maps a `(name, GUID)` pair to and from the `Name-GUID` file
//!   names efivarfs uses.
//! * [`record`] packs a set of identities into the contiguous
//!   `NextEntryOffset / VendorGuid / Name` record buffer that enumeration
//!   consumers expect, and walks such buffers back.

mod error;
pub mod name_guid;
pub mod record;

pub use error::CodecError;
pub use name_guid::{decode_entry_name, encode_entry_name};
pub use record::{
    decode_name_records, encode_name_records, record_len, NameRecord, VariableNameRecords,
    RECORD_HEADER_LEN,
};

pub type CodecResult<T> = std::result::Result<T, CodecError>;
