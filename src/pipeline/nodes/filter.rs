//! FilterStage: predicate-based chunk filtering.
//!
//! The predicate sees each chunk by reference together with a [`Verdict`]
//! that owns the chunk's completion. Keeping forwards the chunk unchanged;
//! rejecting drops it.

use crate::error::StreamError;
use crate::stream::{Chunk, Done, TransformLogic};
use std::fmt::Display;

/// Asynchronous predicate signature.
pub type PredicateFn = Box<dyn FnMut(&Chunk, Verdict)>;

/// Single-use decision for one chunk.
#[derive(Debug)]
pub struct Verdict {
    chunk: Chunk,
    done: Done,
}

impl Verdict {
    /// Pass the chunk through.
    pub fn keep(self) {
        self.done.emit(self.chunk);
    }

    /// Drop the chunk.
    pub fn reject(self) {
        self.done.ok();
    }

    /// Keep the chunk when `keep` is true, drop it otherwise.
    pub fn decide(self, keep: bool) {
        if keep {
            self.keep();
        } else {
            self.reject();
        }
    }

    /// Fail the stage.
    pub fn fail(self, err: StreamError) {
        self.done.fail(err);
    }

    /// Fail the stage with any printable error.
    pub fn error(self, message: impl Display) {
        self.done.error(message);
    }
}

/// Wrap a synchronous predicate into the asynchronous contract.
pub fn from_sync<E, F>(mut f: F) -> PredicateFn
where
    E: Display + 'static,
    F: FnMut(&Chunk) -> Result<bool, E> + 'static,
{
    Box::new(move |chunk: &Chunk, verdict: Verdict| match f(chunk) {
        Ok(keep) => verdict.decide(keep),
        Err(e) => verdict.error(e),
    })
}

/// Filter stage.
pub struct FilterStage {
    predicate: PredicateFn,
    /// Chunks seen.
    seen: u64,
}

impl FilterStage {
    pub fn new(predicate: PredicateFn) -> Self {
        Self { predicate, seen: 0 }
    }

    pub fn seen(&self) -> u64 {
        self.seen
    }
}

impl TransformLogic for FilterStage {
    fn transform(&mut self, chunk: Chunk, done: Done) {
        self.seen += 1;
        let verdict = Verdict {
            chunk: chunk.clone(),
            done,
        };
        (self.predicate)(&chunk, verdict);
    }
}
