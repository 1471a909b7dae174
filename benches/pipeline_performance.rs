// benches/pipeline_performance.rs
//! Benchmarks for the response pipeline.
//!
//! Covers the hot paths of a call: error routing, template formatting,
//! envelope encoding per content type, and a full dispatch into memory.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use palisade_response::encoding::{Document, EncoderRegistry, JSON, MSGPACK, TEXT, XML};
use palisade_response::logging::CallerInfo;
use palisade_response::router::route;
use palisade_response::sink::ResponseSink;
use palisade_response::{
    BoxError, Envelope, FatalLogRecord, FilterSet, Renderer, RingBufferLogger, Sentinel,
    Severity, Status, args, format_message, wrap,
};
use serde_json::json;
use std::panic::Location;

fn mixed_errors(n: usize) -> Vec<Option<BoxError>> {
    (0..n)
        .map(|i| match i % 4 {
            0 => Some(BoxError::from(Sentinel::NoRows)),
            1 => Some(wrap("loading row", Sentinel::Hidden)),
            2 => None,
            _ => Some(BoxError::from(format!("field {i} is invalid"))),
        })
        .collect()
}

// ============================================================================
// Routing
// ============================================================================

fn bench_route(c: &mut Criterion) {
    let filters = FilterSet::default();
    let mut group = c.benchmark_group("route");
    for n in [1usize, 8, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(
                || mixed_errors(n),
                |errors| {
                    black_box(route(
                        Severity::Normal,
                        String::new(),
                        "an error occurred",
                        errors,
                        &filters,
                    ))
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_format(c: &mut Criterion) {
    let filters = FilterSet::default();
    c.bench_function("format_message", |b| {
        b.iter_batched(
            || args!["report.pdf", 3, 2.5f64, BoxError::from("disk full")],
            |args| {
                black_box(format_message(
                    black_box("upload %q failed after %d tries (%.1fs): %v"),
                    &args,
                    &filters,
                ))
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

// ============================================================================
// Encoding
// ============================================================================

fn bench_encoders(c: &mut Criterion) {
    let registry = EncoderRegistry::default();
    let envelope = Envelope::new(Status::Error)
        .with_message("Validation failed")
        .with_data(json!({"id": 42, "fields": ["email", "name"], "retry": true}))
        .with_errors(vec!["email is required".into(), "[REDACTED]".into()]);

    let mut group = c.benchmark_group("encode");
    for content_type in [JSON, MSGPACK, XML, TEXT] {
        let Some(encoder) = registry.get(content_type) else {
            continue;
        };
        group.bench_function(content_type, |b| {
            let mut buf = Vec::with_capacity(512);
            b.iter(|| {
                buf.clear();
                let _ = encoder.marshal(&Document::Envelope(black_box(&envelope)), &mut buf);
                black_box(buf.len())
            });
        });
    }
    group.finish();
}

// ============================================================================
// Dispatch
// ============================================================================

fn bench_dispatch(c: &mut Criterion) {
    let renderer = Renderer::default();
    c.bench_function("dispatch_ok", |b| {
        b.iter(|| {
            let mut sink = ResponseSink::new();
            let _ = renderer.respond(&mut sink).ok(black_box("User found"));
            black_box(sink.body().len())
        });
    });

    c.bench_function("dispatch_error_mixed", |b| {
        b.iter_batched(
            || mixed_errors(8),
            |errors| {
                let mut sink = ResponseSink::new();
                let _ = renderer.respond(&mut sink).error("Operation failed", errors);
                black_box(sink.body().len())
            },
            criterion::BatchSize::SmallInput,
        );
    });

    let logged = Renderer::default().with_logger(RingBufferLogger::new(64, 1024));
    c.bench_function("dispatch_fatal", |b| {
        b.iter(|| {
            let mut sink = ResponseSink::new();
            let _ = logged
                .respond(&mut sink)
                .fatal("db down", [BoxError::from("connection refused")]);
            black_box(sink.body().len())
        });
    });
}

fn bench_ring_buffer(c: &mut Criterion) {
    let logger = RingBufferLogger::new(256, 1024);
    let record = FatalLogRecord::new(
        CallerInfo::at(Location::caller()),
        "payment failed",
        "gateway timeout after 30s",
    )
    .with_auxiliary(["retry budget exhausted".to_owned()]);
    c.bench_function("ring_buffer_record", |b| {
        b.iter(|| logger.record(black_box(&record)));
    });
}

criterion_group!(routing_benches, bench_route, bench_format);
criterion_group!(encoding_benches, bench_encoders);
criterion_group!(dispatch_benches, bench_dispatch, bench_ring_buffer);

criterion_main!(routing_benches, encoding_benches, dispatch_benches);
