use palisade_response::sink::ResponseSink;
use palisade_response::{BoxError, FilterSet, Renderer, Sentinel, args, wrap};

#[derive(Debug)]
struct Unauthorized(&'static str);

impl std::fmt::Display for Unauthorized {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "token rejected for {}", self.0)
    }
}

impl std::error::Error for Unauthorized {}

fn lookup_user(id: u32) -> Result<&'static str, BoxError> {
    match id {
        1 => Ok("ada"),
        2 => Err(wrap("loading user 2", Sentinel::NoRows)),
        _ => Err(Unauthorized("admin@internal").into()),
    }
}

fn show(label: &str, sink: &ResponseSink) {
    println!("{label}");
    println!("   status: {}", sink.status());
    println!("   body:   {}\n", String::from_utf8_lossy(sink.body()));
}

fn main() {
    println!("--- Basic Usage Example ---\n");

    let renderer = Renderer::default()
        .map_filters(|f: FilterSet| f.with_redact(|e| e.is::<Unauthorized>()));

    // 1. Success with data
    let mut sink = ResponseSink::new();
    let name = lookup_user(1).unwrap_or("unknown");
    let _ = renderer
        .respond(&mut sink)
        .data(serde_json::json!({ "id": 1, "name": name }))
        .ok("User found");
    show("1. [SUCCESS]", &sink);

    // 2. A not-found error with a custom message is still written
    let mut sink = ResponseSink::new();
    let errors = [lookup_user(2).err()];
    let _ = renderer.respond(&mut sink).error("User not found", errors);
    show("2. [FILTERED, CUSTOM MESSAGE]", &sink);

    // 3. The same error without a message is suppressed
    let mut sink = ResponseSink::new();
    let outcome = renderer.respond(&mut sink).error("", [lookup_user(2).err()]);
    println!("3. [SUPPRESSED]");
    println!("   outcome: {outcome:?}, bytes written: {}\n", sink.body().len());

    // 4. Redacted errors keep their slot but not their text
    let mut sink = ResponseSink::new();
    let _ = renderer.respond(&mut sink).errorf(
        "access check failed for %d: %v",
        args![3, lookup_user(3).err()],
    );
    show("4. [REDACTED]", &sink);
}
