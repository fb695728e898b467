//! Packed variable-name records.
//!
//! Layout of one record, with no padding between records:
//!
//! ```text
//! u32 LE   NextEntryOffset   distance to the next record, 0 on the last one
//! [u8;16]  VendorGuid        mixed-endian GUID (Data1/2/3 little-endian)
//! [u16]    Name              UTF-16LE, no terminator, runs to the record end
//! ```
//!
//! The last record's name runs to the end of the buffer.

use common::VariableIdentity;
use tracing::debug;
use uuid::Uuid;

use crate::error::CodecError;

/// Bytes in the `NextEntryOffset` field.
pub const OFFSET_FIELD_LEN: usize = 4;
/// Bytes in the `VendorGuid` field.
pub const GUID_FIELD_LEN: usize = 16;
/// Fixed header preceding every name.
pub const RECORD_HEADER_LEN: usize = OFFSET_FIELD_LEN + GUID_FIELD_LEN;

/// Encoded size of one record: header plus two bytes per UTF-16 code unit.
pub fn record_len(identity: &VariableIdentity) -> usize {
    RECORD_HEADER_LEN + 2 * identity.name.encode_utf16().count()
}

/// Pack identities into one contiguous buffer, in the order given.
///
/// The buffer is sized up front to the exact sum of record lengths. Every record
/// but the last carries its own length as `NextEntryOffset`; the last carries 0.
pub fn encode_name_records(identities: &[VariableIdentity]) -> Result<Vec<u8>, CodecError> {
    let lengths: Vec<usize> = identities.iter().map(record_len).collect();
    let total: usize = lengths.iter().sum();

    let mut buffer = Vec::with_capacity(total);
    let last = identities.len().saturating_sub(1);

    for (index, (identity, len)) in identities.iter().zip(&lengths).enumerate() {
        let next_offset = if index == last {
            0
        } else {
            u32::try_from(*len).map_err(|_| {
                CodecError::invalid_identity(format!(
                    "record for {:?} is {} bytes, beyond a u32 offset",
                    identity.name, len
                ))
            })?
        };

        buffer.extend_from_slice(&next_offset.to_le_bytes());
        buffer.extend_from_slice(&identity.guid.to_bytes_le());
        for unit in identity.name.encode_utf16() {
            buffer.extend_from_slice(&unit.to_le_bytes());
        }
    }

    debug_assert_eq!(buffer.len(), total);
    debug!(
        records = identities.len(),
        bytes = buffer.len(),
        "Packed variable name records"
    );
    Ok(buffer)
}

/// One decoded record from a name-record buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRecord {
    /// Byte offset of the record within the buffer.
    pub offset: usize,
    pub next_entry_offset: u32,
    pub guid: Uuid,
    pub name: String,
}

impl NameRecord {
    pub fn identity(&self) -> VariableIdentity {
        VariableIdentity::new(self.name.clone(), self.guid)
    }
}

/// Walks a buffer produced by [`encode_name_records`], following `NextEntryOffset`.
///
/// Yields an error and stops on the first record that does not fit the layout.
pub struct VariableNameRecords<'a> {
    buffer: &'a [u8],
    position: usize,
    done: bool,
}

impl<'a> VariableNameRecords<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
            done: buffer.is_empty(),
        }
    }

    fn fail(
        &mut self,
        offset: usize,
        reason: impl Into<String>,
    ) -> Option<Result<NameRecord, CodecError>> {
        self.done = true;
        Some(Err(CodecError::malformed_record(offset, reason)))
    }
}

impl Iterator for VariableNameRecords<'_> {
    type Item = Result<NameRecord, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let start = self.position;
        let remaining = self.buffer.len() - start;
        if remaining < RECORD_HEADER_LEN {
            return self.fail(
                start,
                format!("{} bytes left, header needs {}", remaining, RECORD_HEADER_LEN),
            );
        }

        let header = &self.buffer[start..start + RECORD_HEADER_LEN];
        let next_entry_offset = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let mut guid_bytes = [0u8; GUID_FIELD_LEN];
        guid_bytes.copy_from_slice(&header[OFFSET_FIELD_LEN..]);
        let guid = Uuid::from_bytes_le(guid_bytes);

        let end = if next_entry_offset == 0 {
            self.buffer.len()
        } else {
            let step = next_entry_offset as usize;
            if step < RECORD_HEADER_LEN {
                return self.fail(start, format!("offset {} is shorter than the header", step));
            }
            match start.checked_add(step) {
                Some(end) if end < self.buffer.len() => end,
                Some(end) if end == self.buffer.len() => {
                    return self.fail(start, "final record must carry a zero offset");
                }
                _ => return self.fail(start, format!("offset {} overruns buffer", step)),
            }
        };

        let name_bytes = &self.buffer[start + RECORD_HEADER_LEN..end];
        if name_bytes.len() % 2 != 0 {
            return self.fail(start, "name splits a UTF-16 code unit");
        }
        let units: Vec<u16> = name_bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        let name = match String::from_utf16(&units) {
            Ok(name) => name,
            Err(_) => return self.fail(start, "name is not valid UTF-16"),
        };

        self.position = end;
        self.done = next_entry_offset == 0;

        Some(Ok(NameRecord {
            offset: start,
            next_entry_offset,
            guid,
            name,
        }))
    }
}

impl std::iter::FusedIterator for VariableNameRecords<'_> {}

/// Decode a whole buffer, failing on the first malformed record.
pub fn decode_name_records(buffer: &[u8]) -> Result<Vec<NameRecord>, CodecError> {
    VariableNameRecords::new(buffer).collect()
}
