//! Property-based tests for palisade_response
//!
//! These tests use proptest to generate random inputs and verify invariants hold.

use palisade_response::logging::CallerInfo;
use palisade_response::router::route;
use palisade_response::sink::ResponseSink;
use palisade_response::{
    BoxError, FatalLogRecord, FilterSet, REDACTED_MARKER, Renderer, RingBufferLogger, Sentinel,
    Severity, args, format_message, sanitize, wrap,
};
use proptest::prelude::*;
use std::panic::Location;

fn record(message: &str, primary: &str) -> FatalLogRecord {
    FatalLogRecord::new(CallerInfo::at(Location::caller()), message, primary)
}

/// One generated error: plain text or one of the sentinels.
fn error_strategy() -> impl Strategy<Value = Option<BoxError>> {
    (0u8..5, "[a-z ]{1,20}").prop_map(|(kind, text)| match kind {
        0 => None,
        1 => Some(BoxError::from(text)),
        2 => Some(BoxError::from(Sentinel::NoRows)),
        3 => Some(BoxError::from(Sentinel::Skip)),
        _ => Some(BoxError::from(Sentinel::Hidden)),
    })
}

// ============================================================================
// SANITIZATION PROPERTIES
// ============================================================================

proptest! {
    /// Sanitized text is bounded and free of control characters
    #[test]
    fn sanitize_bounds_and_strips(s in "\\PC*|[\\x00-\\x1f]{0,40}") {
        let clean = sanitize(&s);
        prop_assert!(clean.len() <= 280);
        prop_assert!(!clean.chars().any(char::is_control));
    }

    /// Printable ASCII under the limit passes through unchanged
    #[test]
    fn sanitize_keeps_short_printable(s in "[ -~]{1,200}") {
        prop_assert_eq!(sanitize(&s), s);
    }
}

// ============================================================================
// TEMPLATE PROPERTIES
// ============================================================================

proptest! {
    /// Templates never panic, whatever the verbs and arguments
    #[test]
    fn format_never_panics(template in "[%a-z0-9.+# -]{0,60}", n in any::<i64>(), f in any::<f64>()) {
        let filters = FilterSet::default();
        let _ = format_message(&template, &args![n, f, "text", true], &filters);
    }

    /// A template without verbs is returned as-is
    #[test]
    fn plain_template_is_identity(template in "[a-zA-Z0-9 ,.:]{0,80}") {
        let filters = FilterSet::default();
        prop_assert_eq!(format_message(&template, &args![], &filters), template);
    }

    /// A redacted argument never leaks into the message, whatever the verb
    #[test]
    fn redacted_argument_never_leaks(secret in "[A-Z]{12}", verb in "[vsdxXqcTfe]") {
        let filters = FilterSet::default();
        let message = format_message(
            &format!("failed: %{verb}"),
            &args![wrap(secret.clone(), Sentinel::Hidden)],
            &filters,
        );
        prop_assert!(!message.contains(&secret));
        if verb != "T" {
            prop_assert_eq!(message, format!("failed: {REDACTED_MARKER}"));
        }
    }
}

// ============================================================================
// ROUTING PROPERTIES
// ============================================================================

proptest! {
    /// Every present error is either shown or counted as filtered
    #[test]
    fn routing_accounts_for_every_error(errors in prop::collection::vec(error_strategy(), 0..12)) {
        let present = errors.iter().filter(|e| e.is_some()).count();
        let routed = route(Severity::Normal, String::new(), "an error occurred", errors, &FilterSet::default());
        prop_assert_eq!(routed.shown.len() + routed.filtered, present);
        prop_assert_eq!(routed.fatal_bucket + routed.normal_bucket, routed.shown.len());
        prop_assert_eq!(routed.log_errors.len(), routed.shown.len());
    }

    /// Fatal routing is never suppressed
    #[test]
    fn fatal_is_never_suppressed(errors in prop::collection::vec(error_strategy(), 0..12)) {
        let routed = route(Severity::Fatal, String::new(), "internal server error", errors, &FilterSet::default());
        prop_assert!(!routed.suppressed);
        prop_assert!(routed.severity.is_fatal());
    }

    /// Suppression only happens when nothing is left to show
    #[test]
    fn suppression_implies_empty_view(errors in prop::collection::vec(error_strategy(), 0..12)) {
        let routed = route(Severity::Normal, String::new(), "an error occurred", errors, &FilterSet::default());
        if routed.suppressed {
            prop_assert!(routed.shown.is_empty());
            prop_assert!(!routed.had_redacted);
            prop_assert!(routed.filtered > 0);
        }
    }

    /// A redacted error never reaches the client body
    #[test]
    fn redacted_error_never_in_body(secret in "[A-Z]{12}") {
        let mut sink = ResponseSink::new();
        Renderer::default()
            .respond(&mut sink)
            .error("failed", [wrap(secret.clone(), Sentinel::Hidden)])
            .unwrap();
        let body = String::from_utf8(sink.body().to_vec()).unwrap();
        prop_assert!(!body.contains(&secret));
    }
}

// ============================================================================
// FATAL LOG PROPERTIES
// ============================================================================

proptest! {
    /// Record output is bounded no matter how large the inputs
    #[test]
    fn record_output_is_bounded(message in "\\PC{0,4000}", primary in "\\PC{0,4000}") {
        let record = record(&message, &primary);
        let mut buffer = String::new();
        record.write_to(&mut buffer).unwrap();
        prop_assert!(buffer.len() < 4096);
    }

    /// Ring buffer never exceeds capacity
    #[test]
    fn ring_buffer_respects_capacity(
        capacity in 1usize..100,
        num_logs in 0usize..200,
    ) {
        let logger = RingBufferLogger::new(capacity, 1024);
        for i in 0..num_logs {
            logger.record(&record("fatal", &format!("error {i}")));
        }
        prop_assert_eq!(logger.len(), num_logs.min(capacity));
        prop_assert_eq!(logger.eviction_count(), num_logs.saturating_sub(capacity) as u64);
    }

    /// Entry size stays within the configured bound
    #[test]
    fn ring_buffer_entries_bounded(
        max_entry in 256usize..2048,
        len in 0usize..10000,
    ) {
        let logger = RingBufferLogger::new(4, max_entry);
        logger.record(&record("fatal", &"X".repeat(len)));
        for entry in logger.get_all() {
            prop_assert!(entry.size_bytes <= max_entry);
        }
    }

    /// Ring buffer handles concurrent writes
    #[test]
    fn concurrent_ring_buffer_writes(
        capacity in 10usize..100,
        thread_count in 1usize..8,
        writes_per_thread in 1usize..50,
    ) {
        let logger = RingBufferLogger::new(capacity, 1024);

        let handles: Vec<_> = (0..thread_count)
            .map(|t| {
                let logger = logger.clone();
                std::thread::spawn(move || {
                    for i in 0..writes_per_thread {
                        logger.record(&record(&format!("thread_{t}"), &format!("error_{i}")));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        prop_assert_eq!(logger.len(), (thread_count * writes_per_thread).min(capacity));
    }
}
