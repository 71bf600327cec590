//! BatchStage: group consecutive chunks into arrays.
//!
//! Always emits records: each batch is a JSON array of the input chunks'
//! values. A partial batch is emitted when the upstream ends.

use crate::error::StreamResult;
use crate::stream::{Chunk, Done, Outlet, TransformLogic};
use serde_json::Value;

pub const DEFAULT_BATCH_SIZE: usize = 10;

/// A coerced batch size. Anything that is not a positive integer falls back
/// to [`DEFAULT_BATCH_SIZE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSize(usize);

impl BatchSize {
    pub fn get(self) -> usize {
        self.0
    }

    fn from_float(f: f64) -> Self {
        if f.is_finite() && f >= 1.0 && f.fract() == 0.0 && f <= usize::MAX as f64 {
            BatchSize(f as usize)
        } else {
            BatchSize::default()
        }
    }

    fn from_signed(n: i64) -> Self {
        if n > 0 {
            BatchSize(n as usize)
        } else {
            BatchSize::default()
        }
    }
}

impl Default for BatchSize {
    fn default() -> Self {
        BatchSize(DEFAULT_BATCH_SIZE)
    }
}

impl From<usize> for BatchSize {
    fn from(n: usize) -> Self {
        if n == 0 {
            BatchSize::default()
        } else {
            BatchSize(n)
        }
    }
}

impl From<u32> for BatchSize {
    fn from(n: u32) -> Self {
        BatchSize::from(n as usize)
    }
}

impl From<i32> for BatchSize {
    fn from(n: i32) -> Self {
        BatchSize::from_signed(n as i64)
    }
}

impl From<i64> for BatchSize {
    fn from(n: i64) -> Self {
        BatchSize::from_signed(n)
    }
}

impl From<f64> for BatchSize {
    fn from(f: f64) -> Self {
        BatchSize::from_float(f)
    }
}

impl From<&str> for BatchSize {
    fn from(s: &str) -> Self {
        let s = s.trim();
        match s.parse::<i64>() {
            Ok(n) => BatchSize::from_signed(n),
            Err(_) => s
                .parse::<f64>()
                .map(BatchSize::from_float)
                .unwrap_or_default(),
        }
    }
}

impl From<String> for BatchSize {
    fn from(s: String) -> Self {
        BatchSize::from(s.as_str())
    }
}

impl<T: Into<BatchSize>> From<Option<T>> for BatchSize {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or_default()
    }
}

/// Batch stage.
#[derive(Debug)]
pub struct BatchStage {
    size: usize,
    pending: Vec<Value>,
}

impl BatchStage {
    pub fn new(size: BatchSize) -> Self {
        Self {
            size: size.get(),
            pending: Vec::with_capacity(size.get()),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn take_batch(&mut self) -> Chunk {
        let batch = std::mem::replace(&mut self.pending, Vec::with_capacity(self.size));
        Chunk::Object(Value::Array(batch))
    }
}

impl TransformLogic for BatchStage {
    fn transform(&mut self, chunk: Chunk, done: Done) {
        self.pending.push(chunk.into_value());
        if self.pending.len() >= self.size {
            done.emit(self.take_batch());
        } else {
            done.ok();
        }
    }

    fn flush(&mut self, out: &Outlet<'_>) -> StreamResult<()> {
        if !self.pending.is_empty() {
            out.push(self.take_batch());
        }
        Ok(())
    }
}
