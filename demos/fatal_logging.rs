//! Fatal responses are always written and always logged.

use palisade_response::sink::ResponseSink;
use palisade_response::{
    BoxError, FatalLogRecord, FatalLogger, Renderer, RingBufferLogger, Sentinel, TracingLogger,
    force_fatal, wrap,
};

/// Sends every record to both tracing and the in-memory buffer.
struct Tee {
    memory: RingBufferLogger,
}

impl FatalLogger for Tee {
    fn log_fatal(&self, record: &FatalLogRecord) {
        TracingLogger.log_fatal(record);
        self.memory.log_fatal(record);
    }
}

fn charge_card() -> Vec<BoxError> {
    vec![
        wrap("charging card", Sentinel::Hidden),
        force_fatal("ledger write failed"),
        Sentinel::NoRows.into(),
    ]
}

fn main() {
    println!("--- Fatal Logging Example ---\n");

    let memory = RingBufferLogger::new(32, 1024);
    let renderer = Renderer::default()
        .with_logger(Tee {
            memory: memory.clone(),
        })
        .with_request_id("req-9f2c");

    let mut sink = ResponseSink::new();
    let _ = renderer.respond(&mut sink).error("Payment failed", charge_card());

    println!("1. [CLIENT] escalated by a forced marker:");
    println!("   status: {}", sink.status());
    println!("   body:   {}\n", String::from_utf8_lossy(sink.body()));

    println!("2. [LOG] original text, skipped errors excluded:");
    for entry in memory.get_all() {
        println!("   at:       {} ({})", entry.location, entry.function);
        println!("   message:  {}", entry.message);
        println!("   error:    {}", entry.primary);
        for (key, value) in entry.auxiliary.iter() {
            println!("   {key}:  {value}");
        }
        println!("   filtered: {}", entry.filtered);
        println!("   request:  {}", entry.request_id.as_deref().unwrap_or("-"));
    }

    // A fatal call whose errors were all skipped still logs something useful
    let mut sink = ResponseSink::new();
    let _ = renderer
        .respond(&mut sink)
        .fatal("", [BoxError::from(Sentinel::NoRows)]);
    if let Some(entry) = memory.get_recent(1).first() {
        println!("\n3. [LOG] nothing survived:");
        println!("   error:    {}", entry.primary);
    }
}
