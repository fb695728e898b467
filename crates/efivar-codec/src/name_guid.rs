//! `Name-GUID` entry names.
//!
//! efivarfs exposes each variable as a file named after the variable with its
//! vendor GUID appended. Variable names may contain hyphens themselves, so the
//! GUID is always taken positionally from the end: the last five
//! hyphen-separated segments, in `8-4-4-4-12` form.

use common::VariableIdentity;
use uuid::Uuid;

use crate::error::CodecError;

/// Widths of the five hyphen-separated GUID groups.
const GUID_GROUPS: [usize; 5] = [8, 4, 4, 4, 12];

/// Render an identity as its store entry name, `{name}-{guid}`.
///
/// The GUID is always lower-case hyphenated, matching what efivarfs shows.
pub fn encode_entry_name(identity: &VariableIdentity) -> Result<String, CodecError> {
    if identity.name.is_empty() {
        return Err(CodecError::invalid_identity("variable name is empty"));
    }
    if identity.name.contains('/') || identity.name.contains('\0') {
        return Err(CodecError::invalid_identity(format!(
            "variable name {:?} contains a path separator or NUL",
            identity.name
        )));
    }
    Ok(format!(
        "{}-{}",
        identity.name,
        identity.guid.as_hyphenated()
    ))
}

/// Split a store entry name back into name and GUID.
pub fn decode_entry_name(entry: &str) -> Result<VariableIdentity, CodecError> {
    let segments: Vec<&str> = entry.split('-').collect();
    if segments.len() < GUID_GROUPS.len() {
        return Err(CodecError::malformed_entry(
            entry,
            format!(
                "expected at least {} hyphen-separated segments, found {}",
                GUID_GROUPS.len(),
                segments.len()
            ),
        ));
    }

    let split = segments.len() - GUID_GROUPS.len();
    let (name_parts, guid_parts) = segments.split_at(split);

    for (part, width) in guid_parts.iter().zip(GUID_GROUPS) {
        if part.len() != width || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CodecError::malformed_entry(
                entry,
                format!("GUID group {:?} is not {} hex digits", part, width),
            ));
        }
    }

    let guid = Uuid::parse_str(&guid_parts.join("-"))
        .map_err(|e| CodecError::malformed_entry(entry, format!("invalid GUID: {}", e)))?;

    let name = name_parts.join("-");
    if name.is_empty() {
        return Err(CodecError::malformed_entry(entry, "variable name is empty"));
    }

    Ok(VariableIdentity { name, guid })
}

#[cfg(test)]
mod tests {
    use super::*;

    const GLOBAL: &str = "8be4df61-93ca-11d2-aa0d-00e098032b8c";

    fn global() -> Uuid {
        Uuid::parse_str(GLOBAL).unwrap()
    }

    #[test]
    fn encodes_name_then_guid() {
        let id = VariableIdentity::new("BootOrder", global());
        assert_eq!(
            encode_entry_name(&id).unwrap(),
            "BootOrder-8be4df61-93ca-11d2-aa0d-00e098032b8c"
        );
    }

    #[test]
    fn empty_name_is_invalid() {
        let id = VariableIdentity::new("", global());
        assert!(matches!(
            encode_entry_name(&id),
            Err(CodecError::InvalidIdentity { .. })
        ));
    }

    #[test]
    fn name_with_separator_is_invalid() {
        let id = VariableIdentity::new("../escape", global());
        assert!(matches!(
            encode_entry_name(&id),
            Err(CodecError::InvalidIdentity { .. })
        ));
    }

    #[test]
    fn round_trip_preserves_identity() {
        for name in ["Lang", "Boot0001", "Setup Data", "ÜnïcødeVar", "a"] {
            let id = VariableIdentity::new(name, Uuid::new_v4());
            let decoded = decode_entry_name(&encode_entry_name(&id).unwrap()).unwrap();
            assert_eq!(decoded, id);
        }
    }

    #[test]
    fn hyphenated_names_keep_their_hyphens() {
        let entry = format!("my-var-name-{}", GLOBAL);
        let id = decode_entry_name(&entry).unwrap();
        assert_eq!(id.name, "my-var-name");
        assert_eq!(id.guid, global());
    }

    #[test]
    fn upper_case_guid_is_accepted() {
        let entry = format!("Lang-{}", GLOBAL.to_uppercase());
        let id = decode_entry_name(&entry).unwrap();
        assert_eq!(id.guid, global());
        assert_eq!(encode_entry_name(&id).unwrap(), format!("Lang-{}", GLOBAL));
    }

    #[test]
    fn too_few_segments_is_malformed() {
        let err = decode_entry_name("Boot-0000").unwrap_err();
        assert!(matches!(err, CodecError::MalformedEntryName { .. }));
        assert!(err.to_string().contains("found 2"));
    }

    #[test]
    fn bare_guid_has_no_name() {
        let err = decode_entry_name(GLOBAL).unwrap_err();
        assert!(err.to_string().contains("variable name is empty"));
    }

    #[test]
    fn bad_group_widths_are_malformed() {
        // Five trailing segments, but not 8-4-4-4-12.
        assert!(decode_entry_name("Var-1-2-3-4-5").is_err());
        assert!(decode_entry_name("Var-8be4df61-93ca-11d2-aa0d-00e098032b8").is_err());
        assert!(decode_entry_name("Var-8be4df6g-93ca-11d2-aa0d-00e098032b8c").is_err());
    }

    #[test]
    fn braced_guid_is_rejected() {
        let entry = "Var-{8be4df61-93ca-11d2-aa0d-00e098032b8c}";
        assert!(decode_entry_name(entry).is_err());
    }
}
