#![no_main]
use efivar_codec::{decode_entry_name, encode_entry_name};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(entry) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(identity) = decode_entry_name(entry) {
        // Whatever decodes must re-encode and decode to the same identity.
        if let Ok(encoded) = encode_entry_name(&identity) {
            let again = decode_entry_name(&encoded).expect("re-encoded entry must decode");
            assert_eq!(again, identity);
        }
    }
});
