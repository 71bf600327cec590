//! Adapting foreign values into stream nodes.
//!
//! [`convert`] is the single conversion entry point. Values that already are
//! stream nodes pass through untouched; collections, text, readers and
//! writers are wrapped in a suitable [`Source`] or [`Sink`].

use crate::error::StreamResult;
use crate::pipeline::nodes::write_sink::WriteSink;
use crate::stream::{Chunk, Mode, Sink, Source, StreamNode, StreamRef};
use serde_json::Value;
use std::io::{Read, Write};
use std::rc::Rc;

/// Default number of bytes read per chunk from a [`Reader`].
pub const DEFAULT_READ_CHUNK_SIZE: usize = 64 * 1024;

/// Anything that can be turned into a stream node.
pub trait IntoStream {
    fn into_stream(self) -> StreamRef;
}

/// Convert a value into a stream node.
pub fn convert(value: impl IntoStream) -> StreamRef {
    value.into_stream()
}

impl IntoStream for StreamRef {
    fn into_stream(self) -> StreamRef {
        self
    }
}

impl<T: StreamNode + 'static> IntoStream for Rc<T> {
    fn into_stream(self) -> StreamRef {
        self
    }
}

/// Records become an object-mode source.
impl IntoStream for Vec<Value> {
    fn into_stream(self) -> StreamRef {
        Source::from_chunks("Records", true, self.into_iter().map(Chunk::Object))
    }
}

/// Chunks become a source whose mode follows the first chunk.
impl IntoStream for Vec<Chunk> {
    fn into_stream(self) -> StreamRef {
        let object_mode = self.first().is_some_and(Chunk::is_object);
        Source::from_chunks("Chunks", object_mode, self)
    }
}

impl IntoStream for String {
    fn into_stream(self) -> StreamRef {
        Source::from_chunks("Text", false, std::iter::once(Chunk::Text(self)))
    }
}

impl IntoStream for &str {
    fn into_stream(self) -> StreamRef {
        self.to_string().into_stream()
    }
}

impl IntoStream for Vec<u8> {
    fn into_stream(self) -> StreamRef {
        Source::from_chunks("Bytes", false, std::iter::once(Chunk::Bytes(self)))
    }
}

/// Wraps an `io::Read` as a data-mode source.
pub struct Reader<R> {
    inner: R,
    chunk_size: usize,
}

impl<R: Read + 'static> Reader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_chunk_size(inner, DEFAULT_READ_CHUNK_SIZE)
    }

    pub fn with_chunk_size(inner: R, chunk_size: usize) -> Self {
        Self {
            inner,
            chunk_size: chunk_size.max(1),
        }
    }
}

impl<R: Read + 'static> IntoStream for Reader<R> {
    fn into_stream(self) -> StreamRef {
        let Reader {
            mut inner,
            chunk_size,
        } = self;
        let mut buf = vec![0u8; chunk_size];
        let pull = move || -> Option<StreamResult<Chunk>> {
            loop {
                match inner.read(&mut buf) {
                    Ok(0) => return None,
                    Ok(n) => return Some(Ok(Chunk::Bytes(buf[..n].to_vec()))),
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => return Some(Err(e.into())),
                }
            }
        };
        Source::from_pull("Reader", false, Box::new(pull))
    }
}

/// Wraps an `io::Write` as a data-mode sink.
pub struct Writer<W> {
    inner: W,
}

impl<W: Write + 'static> Writer<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: Write + 'static> IntoStream for Writer<W> {
    fn into_stream(self) -> StreamRef {
        Sink::new("Writer", WriteSink::new(Box::new(self.inner)), Mode::data())
    }
}

/// A connection target: either a node or a foreign value awaiting conversion.
pub enum Endpoint {
    Node(StreamRef),
    Foreign(Box<dyn FnOnce() -> StreamRef>),
}

impl Endpoint {
    /// Wrap a foreign value; it is converted only if the connection allows it.
    pub fn foreign(value: impl IntoStream + 'static) -> Self {
        Endpoint::Foreign(Box::new(move || convert(value)))
    }

    pub fn is_stream_node(&self) -> bool {
        matches!(self, Endpoint::Node(_))
    }
}

impl From<StreamRef> for Endpoint {
    fn from(node: StreamRef) -> Self {
        Endpoint::Node(node)
    }
}

impl From<&StreamRef> for Endpoint {
    fn from(node: &StreamRef) -> Self {
        Endpoint::Node(node.clone())
    }
}

impl<T: StreamNode + 'static> From<Rc<T>> for Endpoint {
    fn from(node: Rc<T>) -> Self {
        Endpoint::Node(node)
    }
}

impl<W: Write + 'static> From<Writer<W>> for Endpoint {
    fn from(writer: Writer<W>) -> Self {
        Endpoint::foreign(writer)
    }
}
