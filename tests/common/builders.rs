//! Test data builders for creating test pipelines

use serde_json::{json, Value};
use streamchain::stream::{Done, Mode, Source, Transform, TransformLogic};
use streamchain::{convert, Chunk, StreamRef};

/// Builder for creating test sources
pub struct SourceBuilder {
    name: String,
    object_mode: bool,
    chunks: Vec<Chunk>,
}

impl SourceBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            object_mode: false,
            chunks: Vec::new(),
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        self.chunks.push(Chunk::from(text));
        self
    }

    pub fn record(mut self, value: Value) -> Self {
        self.object_mode = true;
        self.chunks.push(Chunk::Object(value));
        self
    }

    pub fn build(self) -> StreamRef {
        Source::from_chunks(self.name, self.object_mode, self.chunks)
    }
}

/// Object-mode source over integers.
pub fn numbers(values: &[i64]) -> StreamRef {
    convert(values.iter().map(|v| json!(v)).collect::<Vec<_>>())
}

/// A source that never produces anything until pushed to.
pub fn idle(name: &str) -> StreamRef {
    Source::new(name, false)
}

struct Pass;

impl TransformLogic for Pass {
    fn transform(&mut self, chunk: Chunk, done: Done) {
        done.emit(chunk);
    }
}

/// A pass-through stage.
pub fn pass(name: &str) -> StreamRef {
    Transform::new(name, Pass, Mode::data())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_builder_mode() {
        let source = SourceBuilder::new("src").record(json!(1)).build();
        assert!(source.core().readable_object_mode());

        let source = SourceBuilder::new("src").text("a").build();
        assert!(!source.core().readable_object_mode());
    }
}
