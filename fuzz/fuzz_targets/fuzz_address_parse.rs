//! Fuzz target: address parsing
//!
//! Arbitrary strings must either fail to parse or round-trip through Display.
//!
//! Run: cargo +nightly fuzz run fuzz_address_parse

#![no_main]
use libfuzzer_sys::fuzz_target;
use tip3_vm::Address;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(address) = s.parse::<Address>() {
            let rendered = address.to_string();
            assert_eq!(rendered.parse::<Address>().ok(), Some(address));
        }
    }
});
