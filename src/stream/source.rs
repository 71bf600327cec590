//! Producer-only node.
//!
//! A `Source` is either fed manually (`push`/`close`) or pulls its chunks
//! lazily from a closure whenever its buffer runs dry while flowing.

use crate::error::{StreamError, StreamResult};
use crate::stream::chunk::{Chunk, Mode};
use crate::stream::core::NodeCore;
use crate::stream::node::{StreamNode, StreamRef};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Pull callback: `None` ends the stream, `Some(Err)` fails it.
pub type Pull = Box<dyn FnMut() -> Option<StreamResult<Chunk>>>;

/// Chunks pulled per read turn.
pub const READ_BATCH: usize = 16;

pub struct Source {
    core: NodeCore,
    pull: RefCell<Option<Pull>>,
}

impl Source {
    /// A source fed by explicit `push` and `close` calls.
    pub fn new(name: impl Into<String>, object_mode: bool) -> Rc<Self> {
        Self::build(name.into(), object_mode, None)
    }

    /// A source that pulls chunks on demand.
    pub fn from_pull(name: impl Into<String>, object_mode: bool, pull: Pull) -> Rc<Self> {
        Self::build(name.into(), object_mode, Some(pull))
    }

    /// A source over a finite sequence of chunks.
    pub fn from_chunks<I>(name: impl Into<String>, object_mode: bool, chunks: I) -> Rc<Self>
    where
        I: IntoIterator<Item = Chunk>,
        I::IntoIter: 'static,
    {
        let mut iter = chunks.into_iter();
        Self::from_pull(name, object_mode, Box::new(move || iter.next().map(Ok)))
    }

    fn build(name: String, object_mode: bool, pull: Option<Pull>) -> Rc<Self> {
        Rc::new_cyclic(|me: &Weak<Source>| {
            let owner: Weak<dyn StreamNode> = me.clone();
            Source {
                core: NodeCore::new(owner, name, Mode::uniform(object_mode)),
                pull: RefCell::new(pull),
            }
        })
    }

    pub fn into_ref(self: Rc<Self>) -> StreamRef {
        self
    }

    pub fn push(&self, chunk: impl Into<Chunk>) {
        self.core.push(chunk.into());
    }

    /// End the stream after everything pushed so far.
    pub fn close(&self) {
        self.core.push_end();
    }
}

impl StreamNode for Source {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn is_readable(&self) -> bool {
        true
    }

    fn is_writable(&self) -> bool {
        false
    }

    fn write(&self, _chunk: Chunk) {
        self.core.fail(StreamError::NotWritable(self.core.id()));
    }

    fn end(&self) {}

    fn on_read(&self) {
        let mut slot = self.pull.borrow_mut();
        let Some(pull) = slot.as_mut() else {
            return;
        };
        for _ in 0..READ_BATCH {
            match pull() {
                Some(Ok(chunk)) => self.core.push(chunk),
                Some(Err(e)) => {
                    *slot = None;
                    drop(slot);
                    self.core.fail(e);
                    return;
                }
                None => {
                    *slot = None;
                    drop(slot);
                    self.core.push_end();
                    return;
                }
            }
        }
    }
}
