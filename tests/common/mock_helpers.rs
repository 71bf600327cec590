//! Mock construction helpers

use mockall::mock;
use std::path::Path;
use streamchain::pipeline::nodes::{ArraySink, Collected};
use streamchain::pipeline::WriteSinkFactory;
use streamchain::stream::{Mode, Sink};
use streamchain::{Chunk, FileSinkOptions, StreamRef, StreamResult};

mock! {
    pub SinkFactory {}

    impl WriteSinkFactory for SinkFactory {
        fn create_write_sink(&self, path: &Path, options: &FileSinkOptions) -> StreamResult<StreamRef>;
    }
}

/// An in-memory sink standing in for a file, plus its contents.
pub fn memory_sink() -> (StreamRef, Collected<Vec<Chunk>>) {
    let logic = ArraySink::new();
    let collected = logic.collected();
    let sink: StreamRef = Sink::new("Memory", logic, Mode::data());
    (sink, collected)
}
