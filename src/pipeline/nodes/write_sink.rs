//! WriteSink: write chunks to any `io::Write`.
//!
//! Bytes and text are written as-is. Records are written as one JSON
//! document per line. The writer is flushed when the upstream ends.

use crate::error::{ResultExt, StreamResult};
use crate::stream::{Chunk, Done, SinkLogic};
use std::io::Write;

pub struct WriteSink {
    writer: Box<dyn Write>,
    bytes_written: u64,
}

impl WriteSink {
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self {
            writer,
            bytes_written: 0,
        }
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    fn write_chunk(&mut self, chunk: &Chunk) -> StreamResult<()> {
        match chunk {
            Chunk::Object(value) => {
                let mut line = serde_json::to_vec(value)?;
                line.push(b'\n');
                self.writer.write_all(&line)?;
                self.bytes_written += line.len() as u64;
            }
            data => {
                let bytes = data.as_bytes();
                self.writer.write_all(&bytes)?;
                self.bytes_written += bytes.len() as u64;
            }
        }
        Ok(())
    }
}

impl SinkLogic for WriteSink {
    fn write(&mut self, chunk: Chunk, done: Done) {
        match self.write_chunk(&chunk) {
            Ok(()) => done.ok(),
            Err(e) => done.fail(e),
        }
    }

    fn finish(&mut self) -> StreamResult<()> {
        self.writer.flush().context("Failed to flush output")?;
        tracing::debug!("WriteSink finished after {} bytes", self.bytes_written);
        Ok(())
    }
}
