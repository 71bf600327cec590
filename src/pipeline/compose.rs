//! Chained pipeline construction.
//!
//! [`StreamExt`] adds the convenience constructors to every [`StreamRef`].
//! Each one builds a stage from [`crate::pipeline::nodes`], wires it with
//! [`connect`](crate::pipeline::connection::connect) and returns it, so calls
//! chain:
//!
//! ```ignore
//! convert(vec![json!(1), json!(2), json!(3)])
//!     .through_obj_sync(|v| Ok::<_, String>(json!(v.as_i64().unwrap_or(0) * 2)))?
//!     .filter_sync(|c| Ok::<_, String>(c.to_text() != "4"))?
//!     .into_array(|res| println!("{res:?}"))?;
//! streamchain::run();
//! ```
//!
//! # Object mode
//!
//! A new stage's writable side takes the upstream's readable mode. Its
//! readable side uses the same mode unless [`StageOptions`] overrides it or
//! the stage always emits records.
//!
//! # Sinks
//!
//! `into_array`, `into_string` and `into_file*` register exactly one
//! completion listener, so their callback fires exactly once with either the
//! result or the first failure seen upstream. When the wiring itself is
//! rejected the error is returned and the callback is never called.

use crate::convert::Endpoint;
use crate::error::{StreamError, StreamResult};
use crate::pipeline::chain::{self, ChainView};
use crate::pipeline::connection::{self, ConnectOptions};
use crate::pipeline::nodes::collect::{deliver_on_complete, ArraySink, StringSink};
use crate::pipeline::nodes::{
    filter, through, BatchSize, BatchStage, Delimiter, EachSink, FileSinkOptions, FilterStage,
    FsSinkFactory, IntersperseStage, PluckStage, SplitStage, ThroughFn, ThroughStage, Verdict,
    WriteSinkFactory,
};
use crate::stream::{
    scheduler, Chunk, Done, Encoding, Mode, Sink, SinkLogic, StreamRef, Transform, TransformLogic,
};
use serde_json::Value;
use std::fmt::Display;
use std::path::Path;
use std::rc::Rc;

/// Per-stage overrides.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageOptions {
    /// Readable mode of the new stage; defaults to the upstream's mode.
    pub readable_object_mode: Option<bool>,
}

impl StageOptions {
    pub fn readable_object_mode(object_mode: bool) -> Self {
        Self {
            readable_object_mode: Some(object_mode),
        }
    }
}

/// Mode of a stage consuming from `upstream`.
pub fn stage_mode(upstream: &StreamRef, options: StageOptions) -> Mode {
    let writable = upstream.core().readable_object_mode();
    Mode {
        writable_object_mode: writable,
        readable_object_mode: options.readable_object_mode.unwrap_or(writable),
    }
}

fn attach_transform(
    upstream: &StreamRef,
    name: &str,
    logic: Box<dyn TransformLogic>,
    mode: Mode,
) -> StreamResult<StreamRef> {
    let stage: StreamRef = Transform::from_boxed(name, logic, mode);
    connection::connect(upstream, &stage, ConnectOptions::default())
}

fn attach_sink(
    upstream: &StreamRef,
    name: &str,
    logic: impl SinkLogic + 'static,
) -> StreamResult<StreamRef> {
    let sink: StreamRef = Sink::new(name, logic, stage_mode(upstream, StageOptions::default()));
    connection::connect(upstream, &sink, ConnectOptions::default())
}

/// Composition methods available on every stream node handle.
pub trait StreamExt {
    /// Connect to `target`, converting foreign values. Returns the consumer.
    fn pipe(&self, target: impl Into<Endpoint>) -> StreamResult<StreamRef>;

    fn pipe_with(&self, target: impl Into<Endpoint>, options: ConnectOptions) -> StreamResult<StreamRef>;

    /// Disconnect one consumer, or all of them.
    fn unpipe(&self, consumer: Option<&StreamRef>) -> StreamResult<()>;

    /// Connect to `target` but return this node.
    fn tee(&self, target: impl Into<Endpoint>) -> StreamResult<StreamRef>;

    fn downstream_nodes(&self) -> Vec<StreamRef>;

    /// Whether this node emits records rather than raw chunks.
    fn is_readable_object_mode(&self) -> bool;

    fn chain_view(&self) -> Rc<ChainView>;

    fn through(&self, f: ThroughFn) -> StreamResult<StreamRef>;

    fn through_with(&self, f: ThroughFn, options: StageOptions) -> StreamResult<StreamRef>;

    /// Object-mode transform on both sides.
    fn through_obj(&self, f: impl FnMut(Value, Done) + 'static) -> StreamResult<StreamRef>;

    /// Data-mode transform on both sides.
    fn through_data(&self, f: impl FnMut(Vec<u8>, Encoding, Done) + 'static) -> StreamResult<StreamRef>;

    /// Synchronous transform; an `Err` fails the stage.
    fn through_sync<E: Display + 'static>(
        &self,
        f: impl FnMut(Chunk) -> Result<Chunk, E> + 'static,
    ) -> StreamResult<StreamRef>;

    fn through_obj_sync<E: Display + 'static>(
        &self,
        f: impl FnMut(Value) -> Result<Value, E> + 'static,
    ) -> StreamResult<StreamRef>;

    fn through_data_sync<E: Display + 'static>(
        &self,
        f: impl FnMut(Vec<u8>) -> Result<Vec<u8>, E> + 'static,
    ) -> StreamResult<StreamRef>;

    fn filter(&self, f: impl FnMut(&Chunk, Verdict) + 'static) -> StreamResult<StreamRef>;

    /// Keep chunks for which `f` returns `Ok(true)`; an `Err` fails the stage.
    fn filter_sync<E: Display + 'static>(
        &self,
        f: impl FnMut(&Chunk) -> Result<bool, E> + 'static,
    ) -> StreamResult<StreamRef>;

    /// Split on `delimiter`, or on line breaks when `None`.
    fn split(&self, delimiter: Option<Delimiter>) -> StreamResult<StreamRef>;

    /// Group chunks into arrays of `size` records (10 when unusable).
    fn batch(&self, size: impl Into<BatchSize>) -> StreamResult<StreamRef>;

    /// Extract `key` (default `"value"`) from each record.
    fn pluck(&self, key: Option<&str>) -> StreamResult<StreamRef>;

    /// Insert `separator` (default newline) between chunks.
    fn intersperse(&self, separator: Option<Chunk>) -> StreamResult<StreamRef>;

    /// Sink calling `f` for every chunk. The sink is returned so callers can
    /// observe its completion.
    fn each(&self, f: impl FnMut(Chunk, Done) + 'static) -> StreamResult<StreamRef>;

    fn into_array(&self, cb: impl FnOnce(StreamResult<Vec<Chunk>>) + 'static) -> StreamResult<()>;

    fn into_string(&self, cb: impl FnOnce(StreamResult<String>) + 'static) -> StreamResult<()>;

    /// Write to `path` with default options.
    fn into_file(
        &self,
        path: impl AsRef<Path>,
        cb: impl FnOnce(StreamResult<()>) + 'static,
    ) -> StreamResult<()>;

    fn into_file_with(
        &self,
        path: impl AsRef<Path>,
        options: FileSinkOptions,
        cb: impl FnOnce(StreamResult<()>) + 'static,
    ) -> StreamResult<()>;

    /// Write to a sink obtained from `factory`. Open failures are delivered
    /// to `cb` on the next scheduler turn.
    fn into_file_using(
        &self,
        factory: &dyn WriteSinkFactory,
        path: impl AsRef<Path>,
        options: FileSinkOptions,
        cb: impl FnOnce(StreamResult<()>) + 'static,
    ) -> StreamResult<()>;
}

impl StreamExt for StreamRef {
    fn pipe(&self, target: impl Into<Endpoint>) -> StreamResult<StreamRef> {
        connection::connect(self, target, ConnectOptions::default())
    }

    fn pipe_with(&self, target: impl Into<Endpoint>, options: ConnectOptions) -> StreamResult<StreamRef> {
        connection::connect(self, target, options)
    }

    fn unpipe(&self, consumer: Option<&StreamRef>) -> StreamResult<()> {
        connection::disconnect(self, consumer)
    }

    fn tee(&self, target: impl Into<Endpoint>) -> StreamResult<StreamRef> {
        connection::tee(self, target, ConnectOptions::default())
    }

    fn downstream_nodes(&self) -> Vec<StreamRef> {
        self.core().downstream_nodes()
    }

    fn is_readable_object_mode(&self) -> bool {
        self.core().readable_object_mode()
    }

    fn chain_view(&self) -> Rc<ChainView> {
        chain::chain_view(self)
    }

    fn through(&self, f: ThroughFn) -> StreamResult<StreamRef> {
        self.through_with(f, StageOptions::default())
    }

    fn through_with(&self, f: ThroughFn, options: StageOptions) -> StreamResult<StreamRef> {
        let logic = ThroughStage::new(f.normalize());
        attach_transform(self, "Through", Box::new(logic), stage_mode(self, options))
    }

    fn through_obj(&self, f: impl FnMut(Value, Done) + 'static) -> StreamResult<StreamRef> {
        let logic = ThroughStage::new(ThroughFn::object(f).normalize());
        attach_transform(self, "Through", Box::new(logic), Mode::object())
    }

    fn through_data(&self, f: impl FnMut(Vec<u8>, Encoding, Done) + 'static) -> StreamResult<StreamRef> {
        let logic = ThroughStage::new(ThroughFn::data(f).normalize());
        attach_transform(self, "Through", Box::new(logic), Mode::data())
    }

    fn through_sync<E: Display + 'static>(
        &self,
        f: impl FnMut(Chunk) -> Result<Chunk, E> + 'static,
    ) -> StreamResult<StreamRef> {
        let logic = ThroughStage::new(through::from_sync(f));
        attach_transform(self, "ThroughSync", Box::new(logic), stage_mode(self, StageOptions::default()))
    }

    fn through_obj_sync<E: Display + 'static>(
        &self,
        mut f: impl FnMut(Value) -> Result<Value, E> + 'static,
    ) -> StreamResult<StreamRef> {
        let logic = ThroughStage::new(through::from_sync(move |chunk: Chunk| {
            f(chunk.into_value()).map(Chunk::Object)
        }));
        attach_transform(self, "ThroughSync", Box::new(logic), Mode::object())
    }

    fn through_data_sync<E: Display + 'static>(
        &self,
        mut f: impl FnMut(Vec<u8>) -> Result<Vec<u8>, E> + 'static,
    ) -> StreamResult<StreamRef> {
        let logic = ThroughStage::new(through::from_sync(move |chunk: Chunk| {
            f(chunk.into_bytes()).map(Chunk::Bytes)
        }));
        attach_transform(self, "ThroughSync", Box::new(logic), Mode::data())
    }

    fn filter(&self, f: impl FnMut(&Chunk, Verdict) + 'static) -> StreamResult<StreamRef> {
        let logic = FilterStage::new(Box::new(f));
        attach_transform(self, "Filter", Box::new(logic), stage_mode(self, StageOptions::default()))
    }

    fn filter_sync<E: Display + 'static>(
        &self,
        f: impl FnMut(&Chunk) -> Result<bool, E> + 'static,
    ) -> StreamResult<StreamRef> {
        let logic = FilterStage::new(filter::from_sync(f));
        attach_transform(self, "Filter", Box::new(logic), stage_mode(self, StageOptions::default()))
    }

    fn split(&self, delimiter: Option<Delimiter>) -> StreamResult<StreamRef> {
        let mode = stage_mode(self, StageOptions::default());
        let logic = SplitStage::new(delimiter, mode.readable_object_mode);
        attach_transform(self, "Split", Box::new(logic), mode)
    }

    fn batch(&self, size: impl Into<BatchSize>) -> StreamResult<StreamRef> {
        let logic = BatchStage::new(size.into());
        let mode = stage_mode(self, StageOptions::readable_object_mode(true));
        attach_transform(self, "Batch", Box::new(logic), mode)
    }

    fn pluck(&self, key: Option<&str>) -> StreamResult<StreamRef> {
        let mode = stage_mode(self, StageOptions::default());
        let logic = PluckStage::new(key, mode.readable_object_mode);
        attach_transform(self, "Pluck", Box::new(logic), mode)
    }

    fn intersperse(&self, separator: Option<Chunk>) -> StreamResult<StreamRef> {
        let mode = stage_mode(self, StageOptions::default());
        let logic = IntersperseStage::new(separator, mode.readable_object_mode);
        attach_transform(self, "Intersperse", Box::new(logic), mode)
    }

    fn each(&self, f: impl FnMut(Chunk, Done) + 'static) -> StreamResult<StreamRef> {
        attach_sink(self, "Each", EachSink::new(Box::new(f)))
    }

    fn into_array(&self, cb: impl FnOnce(StreamResult<Vec<Chunk>>) + 'static) -> StreamResult<()> {
        let logic = ArraySink::new();
        let collected = logic.collected();
        let sink = attach_sink(self, "IntoArray", logic)?;
        deliver_on_complete(&sink, collected, cb);
        Ok(())
    }

    fn into_string(&self, cb: impl FnOnce(StreamResult<String>) + 'static) -> StreamResult<()> {
        let logic = StringSink::new();
        let collected = logic.collected();
        let sink = attach_sink(self, "IntoString", logic)?;
        deliver_on_complete(&sink, collected, cb);
        Ok(())
    }

    fn into_file(
        &self,
        path: impl AsRef<Path>,
        cb: impl FnOnce(StreamResult<()>) + 'static,
    ) -> StreamResult<()> {
        self.into_file_with(path, FileSinkOptions::default(), cb)
    }

    fn into_file_with(
        &self,
        path: impl AsRef<Path>,
        options: FileSinkOptions,
        cb: impl FnOnce(StreamResult<()>) + 'static,
    ) -> StreamResult<()> {
        self.into_file_using(&FsSinkFactory, path, options, cb)
    }

    fn into_file_using(
        &self,
        factory: &dyn WriteSinkFactory,
        path: impl AsRef<Path>,
        options: FileSinkOptions,
        cb: impl FnOnce(StreamResult<()>) + 'static,
    ) -> StreamResult<()> {
        let path = path.as_ref();
        // A refused wiring must leave the target untouched.
        if !self.is_readable() {
            return Err(StreamError::NotReadable(self.core().id()));
        }
        match factory.create_write_sink(path, &options) {
            Ok(sink) => {
                connection::connect(self, &sink, ConnectOptions::default())?;
                sink.core().on_complete(cb);
            }
            Err(e) => {
                tracing::warn!("Could not open {}: {}", path.display(), e);
                scheduler::defer(move || cb(Err(e)));
            }
        }
        Ok(())
    }
}
