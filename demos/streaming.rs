//! Streaming chunks as server-sent events into a raw byte stream.

use palisade_response::encoding::EVENT_STREAM;
use palisade_response::{BoxError, Payload, Renderer, StreamProtocol};
use serde_json::json;

fn main() -> Result<(), BoxError> {
    println!("--- Streaming Example ---\n");

    let renderer = Renderer::default()
        .with_format(EVENT_STREAM)
        .with_protocol(StreamProtocol);

    let rows = ["alpha", "beta", "gamma"];
    let mut next = 0usize;
    let mut wire: Vec<u8> = Vec::new();

    let outcome = renderer.respond(&mut wire).stream(|| {
        let chunk = rows
            .get(next)
            .map(|name| Payload::from(json!({ "row": next, "name": name })));
        next += 1;
        Ok(chunk)
    })?;

    println!("{}", String::from_utf8_lossy(&wire));
    println!("{outcome:?}");
    Ok(())
}
