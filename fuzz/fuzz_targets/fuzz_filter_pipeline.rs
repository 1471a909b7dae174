#![no_main]

use libfuzzer_sys::fuzz_target;
use palisade_response::router::route;
use palisade_response::{BoxError, FilterSet, Sentinel, Severity, force_fatal, force_normal, wrap};

fn error_for(byte: u8, text: &str) -> Option<BoxError> {
    match byte % 7 {
        0 => None,
        1 => Some(Sentinel::NoRows.into()),
        2 => Some(Sentinel::Skip.into()),
        3 => Some(wrap(text.to_owned(), Sentinel::Hidden)),
        4 => Some(force_fatal(text.to_owned())),
        5 => Some(force_normal(text.to_owned())),
        _ => Some(text.to_owned().into()),
    }
}

fuzz_target!(|data: &[u8]| {
    let Some((&mode, rest)) = data.split_first() else {
        return;
    };
    let text = String::from_utf8_lossy(rest);
    let errors: Vec<_> = rest.iter().take(32).map(|b| error_for(*b, &text)).collect();
    let present = errors.iter().filter(|e| e.is_some()).count();
    let initial = if mode & 1 == 0 { Severity::Normal } else { Severity::Fatal };

    let routed = route(initial, String::new(), "an error occurred", errors, &FilterSet::default());
    assert_eq!(routed.shown.len() + routed.filtered, present);
    assert!(!(routed.suppressed && routed.severity.is_fatal()));
});
