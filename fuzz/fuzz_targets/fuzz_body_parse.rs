#![no_main]

use libfuzzer_sys::fuzz_target;
use palisade_response::BodyParser;
use palisade_response::body::Target;
use palisade_response::encoding::{FORM, JSON, MSGPACK, TEXT, XML};

fuzz_target!(|data: &[u8]| {
    let parser = BodyParser::default();
    for content_type in [JSON, XML, MSGPACK, TEXT, FORM] {
        for target in [Target::Text, Target::Bytes, Target::Map, Target::Value] {
            let _ = parser.parse(content_type, Some(data), target);
        }
    }
});
