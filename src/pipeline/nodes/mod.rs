//! Built-in stage implementations.
//!
//! Each stage is a [`TransformLogic`](crate::stream::TransformLogic) or
//! [`SinkLogic`](crate::stream::SinkLogic) receiving its behavior and
//! configuration through its constructor. The composition layer in
//! [`crate::pipeline::compose`] builds nodes from them and wires them.

pub mod batch;
pub mod collect;
pub mod each;
pub mod file_sink;
pub mod filter;
pub mod intersperse;
pub mod pluck;
pub mod split;
pub mod through;
pub mod write_sink;

pub use batch::{BatchSize, BatchStage, DEFAULT_BATCH_SIZE};
pub use collect::{ArraySink, Collected, StringSink};
pub use each::EachSink;
pub use file_sink::{FileSinkOptions, FsSinkFactory, WriteSinkFactory};
pub use filter::{FilterStage, PredicateFn, Verdict};
pub use intersperse::IntersperseStage;
pub use pluck::{PluckStage, DEFAULT_PLUCK_KEY};
pub use split::{Delimiter, SplitStage};
pub use through::{ThroughFn, ThroughStage};
pub use write_sink::WriteSink;
