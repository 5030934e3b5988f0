//! Fuzz target: decoding arbitrary urlencoded forms into a typed record.
//!
//! Every primitive kind is represented so each coercion path sees hostile
//! input. Decode errors are expected; panics are not.

#![no_main]

use libfuzzer_sys::fuzz_target;
use reason_core::{decode, FieldCache, FormValues};

#[derive(Debug, Default, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
struct Everything {
    text: String,
    small: i8,
    big: i64,
    count: u32,
    size: usize,
    ratio: f32,
    amount: f64,
    flag: bool,
    maybe: Option<u16>,
    list: Vec<String>,
}

fuzz_target!(|data: &[u8]| {
    let cache = FieldCache::new();
    let _ = decode::<Everything>(&cache, &FormValues::parse(data));
});
