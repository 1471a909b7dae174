#![no_main]

use libfuzzer_sys::fuzz_target;
use palisade_response::{FilterSet, Sentinel, args, format_message, wrap};

fuzz_target!(|data: &[u8]| {
    let Ok(template) = std::str::from_utf8(data) else {
        return;
    };
    let filters = FilterSet::default();
    let args = args![
        -17i64,
        3.25f64,
        "text",
        'x',
        false,
        wrap("ctx", Sentinel::Hidden),
        wrap("ctx", Sentinel::Skip)
    ];
    let _ = format_message(template, &args, &filters);
});
