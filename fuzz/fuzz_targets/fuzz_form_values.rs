//! Fuzz target: urlencoded parsing and first-value lookup.

#![no_main]

use libfuzzer_sys::fuzz_target;
use reason_core::FormValues;

fuzz_target!(|data: &[u8]| {
    let values = FormValues::parse(data);
    let _ = values.get("name");
    assert!(values.len() <= data.len() + 1, "more pairs than input bytes");
});
