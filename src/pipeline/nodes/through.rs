//! ThroughStage: caller-supplied per-chunk transform.
//!
//! Caller functions come in two shapes, a data-mode `(bytes, encoding, done)`
//! and an object-mode `(record, done)`. Both are normalized into one
//! `FnMut(Chunk, Done)` before the stage is built.

use crate::stream::{Chunk, Done, Encoding, TransformLogic};
use serde_json::Value;
use std::fmt::Display;

/// Normalized transform signature.
pub type ChunkFn = Box<dyn FnMut(Chunk, Done)>;

/// A transform function in one of its two accepted shapes.
pub enum ThroughFn {
    /// Receives raw bytes plus the encoding they were pushed with.
    Data(Box<dyn FnMut(Vec<u8>, Encoding, Done)>),
    /// Receives a structured record.
    Object(Box<dyn FnMut(Value, Done)>),
}

impl ThroughFn {
    pub fn data(f: impl FnMut(Vec<u8>, Encoding, Done) + 'static) -> Self {
        ThroughFn::Data(Box::new(f))
    }

    pub fn object(f: impl FnMut(Value, Done) + 'static) -> Self {
        ThroughFn::Object(Box::new(f))
    }

    /// Collapse both shapes into the chunk-level signature.
    pub fn normalize(self) -> ChunkFn {
        match self {
            ThroughFn::Data(mut f) => Box::new(move |chunk: Chunk, done: Done| {
                let encoding = chunk.encoding();
                f(chunk.into_bytes(), encoding, done)
            }),
            ThroughFn::Object(mut f) => {
                Box::new(move |chunk: Chunk, done: Done| f(chunk.into_value(), done))
            }
        }
    }
}

impl std::fmt::Debug for ThroughFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThroughFn::Data(_) => f.write_str("ThroughFn::Data"),
            ThroughFn::Object(_) => f.write_str("ThroughFn::Object"),
        }
    }
}

/// Wrap a synchronous transform into the asynchronous contract. An `Err`
/// settles the chunk as a failure of the stage.
pub fn from_sync<E, F>(mut f: F) -> ChunkFn
where
    E: Display + 'static,
    F: FnMut(Chunk) -> Result<Chunk, E> + 'static,
{
    Box::new(move |chunk: Chunk, done: Done| match f(chunk) {
        Ok(out) => done.emit(out),
        Err(e) => done.error(e),
    })
}

/// Transform stage running a normalized function.
pub struct ThroughStage {
    f: ChunkFn,
}

impl ThroughStage {
    pub fn new(f: ChunkFn) -> Self {
        Self { f }
    }
}

impl TransformLogic for ThroughStage {
    fn transform(&mut self, chunk: Chunk, done: Done) {
        (self.f)(chunk, done);
    }
}
