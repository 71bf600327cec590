//! IntersperseStage: insert a separator between consecutive chunks.

use crate::stream::{Chunk, Done, TransformLogic};

/// Intersperse stage. Nothing is emitted before the first chunk or after the
/// last one.
#[derive(Debug)]
pub struct IntersperseStage {
    separator: Chunk,
    started: bool,
}

impl IntersperseStage {
    /// `None` selects a newline in the stage's readable mode. An explicit
    /// empty separator is kept as-is.
    pub fn new(separator: Option<Chunk>, object_mode: bool) -> Self {
        Self {
            separator: separator.unwrap_or_else(|| Chunk::text_for_mode("\n".into(), object_mode)),
            started: false,
        }
    }

    pub fn separator(&self) -> &Chunk {
        &self.separator
    }
}

impl TransformLogic for IntersperseStage {
    fn transform(&mut self, chunk: Chunk, done: Done) {
        if self.started {
            done.push(self.separator.clone());
        }
        self.started = true;
        done.emit(chunk);
    }
}
