//! Completion handles for asynchronous per-chunk work.
//!
//! A [`Done`] is handed to every transform and per-item sink callback along
//! with the chunk. Settling consumes the handle, so each chunk completes at
//! most once; dropping it unsettled fails the stage instead of stalling it.

use crate::error::{StreamError, StreamResult};
use crate::stream::chunk::Chunk;
use std::rc::Weak;

/// A stage that can receive the outcome of one chunk's processing.
pub(crate) trait Settle {
    fn settle(&self, outcome: StreamResult<Option<Chunk>>);

    /// Push an extra output chunk before settling.
    fn push_extra(&self, chunk: Chunk);

    fn label(&self) -> String;
}

/// Single-use completion handle for one chunk.
pub struct Done {
    target: Option<Weak<dyn Settle>>,
}

impl Done {
    pub(crate) fn new(target: Weak<dyn Settle>) -> Self {
        Self {
            target: Some(target),
        }
    }

    /// Push an output chunk without completing. May be called any number of
    /// times before the handle is settled.
    pub fn push(&self, chunk: impl Into<Chunk>) {
        if let Some(target) = self.target.as_ref().and_then(Weak::upgrade) {
            target.push_extra(chunk.into());
        }
    }

    /// Complete without output.
    pub fn ok(self) {
        self.complete(Ok(None));
    }

    /// Complete with a single output chunk.
    pub fn emit(self, chunk: impl Into<Chunk>) {
        self.complete(Ok(Some(chunk.into())));
    }

    /// Complete with a failure.
    pub fn fail(self, err: StreamError) {
        self.complete(Err(err));
    }

    /// Complete with a failure described by any printable error.
    pub fn error(self, message: impl std::fmt::Display) {
        let stage = self.label();
        self.fail(StreamError::transform(stage, message));
    }

    /// Complete with an explicit outcome.
    pub fn complete(mut self, outcome: StreamResult<Option<Chunk>>) {
        if let Some(target) = self.target.take().and_then(|w| w.upgrade()) {
            target.settle(outcome);
        }
    }

    fn label(&self) -> String {
        self.target
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|t| t.label())
            .unwrap_or_else(|| "stage".to_string())
    }
}

impl Drop for Done {
    fn drop(&mut self) {
        if let Some(target) = self.target.take().and_then(|w| w.upgrade()) {
            let label = target.label();
            tracing::warn!("Completion handle of {} dropped unsettled", label);
            target.settle(Err(StreamError::CallbackDropped(label)));
        }
    }
}

impl std::fmt::Debug for Done {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Done")
            .field("settled", &self.target.is_none())
            .finish()
    }
}
