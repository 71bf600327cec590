//! PluckStage: extract one property from each record.

use crate::stream::{Chunk, Done, TransformLogic};
use serde_json::Value;

pub const DEFAULT_PLUCK_KEY: &str = "value";

/// Pluck stage. Records without the key, and non-record chunks, are skipped.
#[derive(Debug)]
pub struct PluckStage {
    key: String,
    object_mode: bool,
    skipped: u64,
}

impl PluckStage {
    pub fn new(key: Option<&str>, object_mode: bool) -> Self {
        Self {
            key: key.unwrap_or(DEFAULT_PLUCK_KEY).to_string(),
            object_mode,
            skipped: 0,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    fn extract(&self, chunk: Chunk) -> Option<Value> {
        match chunk {
            Chunk::Object(Value::Object(mut map)) => map.remove(&self.key),
            _ => None,
        }
    }
}

impl TransformLogic for PluckStage {
    fn transform(&mut self, chunk: Chunk, done: Done) {
        match self.extract(chunk) {
            Some(value) if self.object_mode => done.emit(Chunk::Object(value)),
            Some(value) => done.emit(Chunk::Object(value).to_text().into_owned()),
            None => {
                self.skipped += 1;
                tracing::trace!("Pluck skipped a record without {:?}", self.key);
                done.ok();
            }
        }
    }
}
