use common::{Attributes, Status, StoreConfig, VariableIdentity};
use efivar_codec::{decode_name_records, record_len, NameRecord};
use efivarfs_store::{StoreError, VariableStore, WriteOutcome};
use sim_efivarfs::SimEfivarfs;
use uuid::Uuid;

const GLOBAL: &str = "8be4df61-93ca-11d2-aa0d-00e098032b8c";
const VENDOR: &str = "12345678-9abc-def0-1122-334455667788";

fn global() -> Uuid {
    Uuid::parse_str(GLOBAL).unwrap()
}

fn vendor() -> Uuid {
    Uuid::parse_str(VENDOR).unwrap()
}

#[test]
fn write_then_raw_read_has_attribute_prefix() {
    let sim = SimEfivarfs::start("write-raw").unwrap();
    let store = sim.store();

    let outcome = store
        .write_variable("Test", &global(), Some(&b"\x01\x02"[..]), Some(Attributes::from(0x7)))
        .unwrap();
    assert_eq!(outcome, WriteOutcome::Written { bytes: 6 });

    let raw = sim.raw_entry(&format!("Test-{}", GLOBAL)).unwrap();
    assert_eq!(raw, b"\x07\x00\x00\x00\x01\x02");

    // read_variable hands back the same raw bytes, prefix included.
    assert_eq!(store.read_variable("Test", &global()).unwrap(), raw);
}

#[test]
fn write_without_attributes_uses_configured_default() {
    let sim = SimEfivarfs::start("write-default").unwrap();

    sim.store()
        .write_variable("Plain", &vendor(), Some(&b"x"[..]), None)
        .unwrap();
    assert_eq!(
        sim.raw_entry(&format!("Plain-{}", VENDOR)).unwrap(),
        vec![0x07, 0, 0, 0, b'x']
    );

    let mut config = sim.config();
    config.default_attributes = 0x3;
    VariableStore::new(config)
        .write_variable("Volatile", &vendor(), Some(&b"y"[..]), None)
        .unwrap();
    assert_eq!(
        sim.raw_entry(&format!("Volatile-{}", VENDOR)).unwrap(),
        vec![0x03, 0, 0, 0, b'y']
    );
}

#[test]
fn overwrite_truncates_previous_payload() {
    let sim = SimEfivarfs::start("overwrite").unwrap();
    let store = sim.store();

    store
        .write_variable("Boot0001", &global(), Some(&[0xAA; 64][..]), None)
        .unwrap();
    store
        .write_variable("Boot0001", &global(), Some(&[0xBB][..]), None)
        .unwrap();

    let stored = store.read_stored_variable("Boot0001", &global()).unwrap();
    assert_eq!(stored.payload, vec![0xBB]);
    assert_eq!(stored.attributes, Attributes::default());
}

#[test]
fn read_missing_variable_is_not_found() {
    let sim = SimEfivarfs::start("read-missing").unwrap();
    let err = sim.store().read_variable("Nope", &global()).unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.status(), Status::NotFound);
    assert_eq!(err.code(), 0xCB);
}

#[test]
fn read_stored_variable_rejects_short_file() {
    let sim = SimEfivarfs::start("read-short").unwrap();
    sim.seed_raw(&format!("Short-{}", GLOBAL), &[0x07, 0x00]).unwrap();

    let err = sim
        .store()
        .read_stored_variable("Short", &global())
        .unwrap_err();
    assert!(matches!(err, StoreError::TruncatedVariable { len: 2, .. }));
}

#[test]
fn delete_twice_is_deleted_then_nothing() {
    let sim = SimEfivarfs::start("delete").unwrap();
    let store = sim.store();
    sim.seed("Gone", &global(), 0x7, b"bye").unwrap();

    let first = store.write_variable("Gone", &global(), None, None).unwrap();
    let second = store.write_variable("Gone", &global(), None, None).unwrap();

    assert_eq!(first, WriteOutcome::Deleted);
    assert!(first.is_success());
    assert_eq!(second, WriteOutcome::NothingToDelete);
    assert!(!second.is_success());
    assert!(sim.entries().unwrap().is_empty());
}

#[test]
fn delete_variable_matches_write_none() {
    let sim = SimEfivarfs::start("delete-direct").unwrap();
    let store = sim.store();
    sim.seed("Lang", &global(), 0x7, b"en").unwrap();

    assert_eq!(store.delete_variable("Lang", &global()).unwrap(), WriteOutcome::Deleted);
    assert_eq!(
        store.delete_variable("Lang", &global()).unwrap(),
        WriteOutcome::NothingToDelete
    );
}

#[test]
fn list_names_packs_sorted_records() {
    let sim = SimEfivarfs::start("list").unwrap();
    sim.seed("Timeout", &global(), 0x7, &[5, 0]).unwrap();
    sim.seed("my-var-name", &vendor(), 0x7, b"v").unwrap();
    sim.seed("BootOrder", &global(), 0x7, &[0, 0]).unwrap();

    let buffer = sim.store().list_variable_names().unwrap();

    let expected = vec![
        VariableIdentity::new("BootOrder", global()),
        VariableIdentity::new("Timeout", global()),
        VariableIdentity::new("my-var-name", vendor()),
    ];
    let total: usize = expected.iter().map(record_len).sum();
    assert_eq!(buffer.len(), total);

    let records = decode_name_records(&buffer).unwrap();
    let identities: Vec<VariableIdentity> = records.iter().map(NameRecord::identity).collect();
    assert_eq!(identities, expected);
}

#[test]
fn list_names_offset_chain_ends_at_buffer_end() {
    let sim = SimEfivarfs::start("chain").unwrap();
    for index in 0..5 {
        sim.seed(&format!("Boot{:04X}", index), &global(), 0x7, b"")
            .unwrap();
    }

    let buffer = sim.store().list_variable_names().unwrap();

    let mut position = 0usize;
    let mut visited = 0usize;
    loop {
        visited += 1;
        let next = u32::from_le_bytes(buffer[position..position + 4].try_into().unwrap());
        if next == 0 {
            // Last record: header plus "BootNNNN" in UTF-16.
            assert_eq!(position + 20 + 16, buffer.len());
            break;
        }
        assert_eq!(next, 36);
        position += next as usize;
    }
    assert_eq!(visited, 5);
}

#[test]
fn list_empty_store_gives_empty_buffer() {
    let sim = SimEfivarfs::start("empty").unwrap();
    assert!(sim.store().list_variable_names().unwrap().is_empty());
    assert!(sim.store().list_variables().unwrap().is_empty());
}

#[test]
fn list_missing_root_is_not_found() {
    let store = VariableStore::new(StoreConfig::with_root(SimEfivarfs::missing_root("list")));
    let err = store.list_variable_names().unwrap_err();
    assert_eq!(err.status(), Status::NotFound);
}

#[test]
fn list_aborts_on_malformed_entry() {
    let sim = SimEfivarfs::start("malformed").unwrap();
    sim.seed("Lang", &global(), 0x7, b"en").unwrap();
    sim.seed_raw("not-a-guid", b"\x07\x00\x00\x00").unwrap();

    let err = sim.store().list_variable_names().unwrap_err();
    assert_eq!(err.status(), Status::MalformedEntryName);
    assert!(err.to_string().contains("not-a-guid"));
}

#[cfg(unix)]
#[test]
fn list_aborts_on_non_utf8_entry() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let sim = SimEfivarfs::start("non-utf8").unwrap();
    sim.seed("Lang", &global(), 0x7, b"en").unwrap();
    let mut entry = b"\xffbad-".to_vec();
    entry.extend_from_slice(GLOBAL.as_bytes());
    std::fs::write(sim.root().join(OsStr::from_bytes(&entry)), b"\x07\x00\x00\x00").unwrap();

    let result = sim.store().list_variable_names();
    let err = result.expect_err("listing must not return a buffer");
    assert_eq!(err.status(), Status::MalformedEntryName);
    assert!(err.to_string().contains("not valid UTF-8"));
    assert!(sim.store().list_variables().is_err());
}

#[test]
fn read_stored_missing_variable_is_not_found() {
    let sim = SimEfivarfs::start("read-stored-missing").unwrap();
    let err = sim
        .store()
        .read_stored_variable("Nope", &global())
        .unwrap_err();

    assert_eq!(err.status(), Status::NotFound);
    match err {
        StoreError::NotFound { path } => {
            assert_eq!(path, sim.root().join(format!("Nope-{}", GLOBAL)));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn round_trip_through_the_accessor() {
    let sim = SimEfivarfs::start("round-trip").unwrap();
    let store = sim.store();
    let payload: Vec<u8> = (0..=255u8).collect();

    store
        .write_variable(
            "Setup-Data",
            &vendor(),
            Some(payload.as_slice()),
            Some(Attributes::NON_VOLATILE | Attributes::BOOTSERVICE_ACCESS),
        )
        .unwrap();

    let stored = store.read_stored_variable("Setup-Data", &vendor()).unwrap();
    assert_eq!(stored.attributes.bits(), 0x3);
    assert_eq!(stored.payload, payload);

    let listed = store.list_variables().unwrap();
    assert_eq!(listed, vec![VariableIdentity::new("Setup-Data", vendor())]);
}
