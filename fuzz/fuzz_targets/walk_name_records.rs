#![no_main]
use efivar_codec::{encode_name_records, VariableNameRecords};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut identities = Vec::new();
    for record in VariableNameRecords::new(data) {
        match record {
            Ok(record) => identities.push(record.identity()),
            Err(_) => return,
        }
    }
    // A buffer that walks cleanly is exactly what the encoder would produce.
    let packed = encode_name_records(&identities).expect("walked identities must pack");
    assert_eq!(packed.as_slice(), data);
});
