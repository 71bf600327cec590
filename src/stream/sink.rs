//! Consumer-only node.
//!
//! A `Sink` feeds each written chunk to its [`SinkLogic`] and completes once
//! the upstream has ended and the logic has finished. Completion, success or
//! failure, is reported exactly once through `NodeCore::on_complete`.

use crate::error::{StreamError, StreamResult};
use crate::stream::chunk::{Chunk, Mode};
use crate::stream::core::NodeCore;
use crate::stream::done::{Done, Settle};
use crate::stream::inbox::{Inbox, Step};
use crate::stream::node::{StreamNode, StreamRef};
use crate::stream::scheduler;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Per-chunk behavior of a sink.
pub trait SinkLogic {
    /// Consume one chunk; settle `done` when it has been handled.
    fn write(&mut self, chunk: Chunk, done: Done);

    /// Finalize after the last chunk.
    fn finish(&mut self) -> StreamResult<()> {
        Ok(())
    }
}

pub struct Sink {
    me: Weak<Sink>,
    core: NodeCore,
    logic: RefCell<Box<dyn SinkLogic>>,
    inbox: RefCell<Inbox>,
}

impl Sink {
    /// Build a sink. Only `mode.writable_object_mode` is meaningful.
    pub fn new(name: impl Into<String>, logic: impl SinkLogic + 'static, mode: Mode) -> Rc<Self> {
        let name = name.into();
        let logic: Box<dyn SinkLogic> = Box::new(logic);
        Rc::new_cyclic(|me: &Weak<Sink>| {
            let owner: Weak<dyn StreamNode> = me.clone();
            Sink {
                me: me.clone(),
                core: NodeCore::new(owner, name, mode),
                logic: RefCell::new(logic),
                inbox: RefCell::new(Inbox::default()),
            }
        })
    }

    pub fn into_ref(self: Rc<Self>) -> StreamRef {
        self
    }

    fn schedule(&self) {
        if !self.inbox.borrow_mut().try_schedule() {
            return;
        }
        let Some(me) = self.me.upgrade() else {
            return;
        };
        scheduler::defer(move || me.turn());
    }

    fn turn(&self) {
        if self.core.is_failed() {
            self.inbox.borrow_mut().abort();
            return;
        }
        let step = self.inbox.borrow_mut().next_step();
        match step {
            Step::Process(chunk) => {
                let target: Weak<dyn Settle> = self.me.clone();
                self.logic.borrow_mut().write(chunk, Done::new(target));
            }
            Step::Finish => {
                let result = self.logic.borrow_mut().finish();
                match result {
                    Ok(()) => {
                        tracing::debug!("{} ({}) finished", self.core.name(), self.core.id());
                        self.core.complete(Ok(()));
                    }
                    Err(e) => self.core.fail(e),
                }
            }
            Step::Idle => {}
        }
    }
}

impl StreamNode for Sink {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn is_readable(&self) -> bool {
        false
    }

    fn is_writable(&self) -> bool {
        true
    }

    fn write(&self, chunk: Chunk) {
        if self.inbox.borrow().is_input_ended() {
            self.core.fail(StreamError::WriteAfterEnd(self.core.id()));
            return;
        }
        self.inbox.borrow_mut().enqueue(chunk);
        self.schedule();
    }

    fn end(&self) {
        self.inbox.borrow_mut().end_input();
        self.schedule();
    }
}

impl Settle for Sink {
    fn settle(&self, outcome: StreamResult<Option<Chunk>>) {
        self.inbox.borrow_mut().settled();
        if let Err(e) = outcome {
            self.inbox.borrow_mut().abort();
            self.core.fail(e);
            return;
        }
        self.schedule();
    }

    fn push_extra(&self, _chunk: Chunk) {
        tracing::trace!("{} ignores pushed output", self.core.name());
    }

    fn label(&self) -> String {
        self.core.name().to_string()
    }
}
