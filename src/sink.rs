//! Output sinks and protocol header application.
//!
//! A [`Sink`] is any `io::Write`. Sinks that can also carry an HTTP status and
//! header map expose that through [`Sink::as_header_sink`]; the default is
//! `None`, and protocol handlers treat a missing capability as a no-op.

use crate::BoxError;
use http::header::{HeaderMap, HeaderValue};
use http::{Response, StatusCode};
use std::io::{self, Write};

/// Optional HTTP capability of a sink.
pub trait HeaderSink {
    fn headers_mut(&mut self) -> &mut HeaderMap;
    fn set_status(&mut self, status: StatusCode);
}

/// Where a rendered response goes.
pub trait Sink: Write {
    /// The HTTP capability of this sink, if it has one.
    fn as_header_sink(&mut self) -> Option<&mut dyn HeaderSink> {
        None
    }
}

impl Sink for Vec<u8> {}
impl Sink for io::Sink {}
impl Sink for io::Stdout {}
impl Sink for std::net::TcpStream {}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn as_header_sink(&mut self) -> Option<&mut dyn HeaderSink> {
        (**self).as_header_sink()
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn as_header_sink(&mut self) -> Option<&mut dyn HeaderSink> {
        (**self).as_header_sink()
    }
}

/// Status and headers for one response.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl ResponseHead {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
        }
    }
}

/// How status and headers reach a particular kind of sink.
pub trait ProtocolHandler: Send + Sync {
    fn apply_headers(&self, sink: &mut dyn Sink, head: &ResponseHead) -> Result<(), BoxError>;
}

/// Applies status and headers through the sink's HTTP capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpProtocol;

impl ProtocolHandler for HttpProtocol {
    fn apply_headers(&self, sink: &mut dyn Sink, head: &ResponseHead) -> Result<(), BoxError> {
        if let Some(target) = sink.as_header_sink() {
            target.set_status(head.status);
            let headers = target.headers_mut();
            for (name, value) in &head.headers {
                headers.insert(name.clone(), value.clone());
            }
        }
        Ok(())
    }
}

/// Writes an HTTP/1.1 status line and header block into a bare byte stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamProtocol;

impl ProtocolHandler for StreamProtocol {
    fn apply_headers(&self, sink: &mut dyn Sink, head: &ResponseHead) -> Result<(), BoxError> {
        let mut block = Vec::with_capacity(64 + head.headers.len() * 32);
        write!(
            block,
            "HTTP/1.1 {} {}\r\n",
            head.status.as_u16(),
            head.status.canonical_reason().unwrap_or("")
        )?;
        for (name, value) in &head.headers {
            block.extend_from_slice(name.as_str().as_bytes());
            block.extend_from_slice(b": ");
            block.extend_from_slice(value.as_bytes());
            block.extend_from_slice(b"\r\n");
        }
        block.extend_from_slice(b"\r\n");
        sink.write_all(&block)?;
        Ok(())
    }
}

/// In-memory HTTP sink.
///
/// ```rust
/// use palisade_response::sink::{HttpProtocol, ProtocolHandler, ResponseHead, ResponseSink};
/// use http::StatusCode;
/// use std::io::Write;
///
/// let mut sink = ResponseSink::new();
/// HttpProtocol.apply_headers(&mut sink, &ResponseHead::new(StatusCode::CREATED)).unwrap();
/// sink.write_all(b"{}").unwrap();
/// let response = sink.into_response();
/// assert_eq!(response.status(), StatusCode::CREATED);
/// ```
#[derive(Debug, Default)]
pub struct ResponseSink {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
    flushes: usize,
}

impl ResponseSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status applied so far; `200 OK` if none was.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v: &HeaderValue| v.to_str().ok())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// How many times the sink was flushed.
    pub fn flushes(&self) -> usize {
        self.flushes
    }

    pub fn into_response(self) -> Response<Vec<u8>> {
        let mut response = Response::new(self.body);
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = self.headers;
        response
    }
}

impl Write for ResponseSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

impl HeaderSink for ResponseSink {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }
}

impl Sink for ResponseSink {
    fn as_header_sink(&mut self) -> Option<&mut dyn HeaderSink> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::CONTENT_TYPE;

    fn head() -> ResponseHead {
        let mut head = ResponseHead::new(StatusCode::BAD_REQUEST);
        head.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        head
    }

    #[test]
    fn http_protocol_uses_capability() {
        let mut sink = ResponseSink::new();
        HttpProtocol.apply_headers(&mut sink, &head()).unwrap();
        assert_eq!(sink.status(), StatusCode::BAD_REQUEST);
        assert_eq!(sink.header("content-type"), Some("application/json"));
        assert!(sink.body().is_empty());
    }

    #[test]
    fn http_protocol_without_capability_is_noop() {
        let mut sink: Vec<u8> = Vec::new();
        HttpProtocol.apply_headers(&mut sink, &head()).unwrap();
        assert!(sink.is_empty());
    }

    #[test]
    fn stream_protocol_writes_head_block() {
        let mut sink: Vec<u8> = Vec::new();
        StreamProtocol.apply_headers(&mut sink, &head()).unwrap();
        assert_eq!(
            String::from_utf8(sink).unwrap(),
            "HTTP/1.1 400 Bad Request\r\ncontent-type: application/json\r\n\r\n"
        );
    }

    #[test]
    fn capability_passes_through_references() {
        let mut inner = ResponseSink::new();
        let mut outer: &mut ResponseSink = &mut inner;
        assert!(Sink::as_header_sink(&mut outer).is_some());
    }

    #[test]
    fn into_response_carries_everything() {
        let mut sink = ResponseSink::new();
        HttpProtocol.apply_headers(&mut sink, &head()).unwrap();
        sink.write_all(b"body").unwrap();
        sink.flush().unwrap();
        assert_eq!(sink.flushes(), 1);

        let response = sink.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.body(), b"body");
        assert!(response.headers().contains_key(CONTENT_TYPE));
    }
}
