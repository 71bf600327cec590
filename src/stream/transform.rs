//! Duplex node whose output is derived from its input.
//!
//! A `Transform` drives a boxed [`TransformLogic`] one chunk at a time and
//! pushes whatever the logic emits on its readable half. When the upstream
//! ends, the logic is flushed and the readable half ends in turn.

use crate::error::{StreamError, StreamResult};
use crate::stream::chunk::{Chunk, Mode};
use crate::stream::core::NodeCore;
use crate::stream::done::{Done, Settle};
use crate::stream::inbox::{Inbox, Step};
use crate::stream::node::{StreamNode, StreamRef};
use crate::stream::scheduler;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Per-chunk behavior of a transform stage.
pub trait TransformLogic {
    /// Process one chunk. Outputs go through `done.push`/`done.emit`; the
    /// stage does not receive the next chunk until `done` is settled.
    fn transform(&mut self, chunk: Chunk, done: Done);

    /// Emit any trailing output once the upstream has ended.
    fn flush(&mut self, _out: &Outlet<'_>) -> StreamResult<()> {
        Ok(())
    }
}

/// Push access to a stage's readable half during `flush`.
pub struct Outlet<'a> {
    core: &'a NodeCore,
}

impl Outlet<'_> {
    pub fn push(&self, chunk: impl Into<Chunk>) {
        self.core.push(chunk.into());
    }

    pub fn object_mode(&self) -> bool {
        self.core.readable_object_mode()
    }
}

/// A writable and readable stage.
pub struct Transform {
    me: Weak<Transform>,
    core: NodeCore,
    logic: RefCell<Box<dyn TransformLogic>>,
    inbox: RefCell<Inbox>,
}

impl Transform {
    pub fn new(name: impl Into<String>, logic: impl TransformLogic + 'static, mode: Mode) -> Rc<Self> {
        Self::from_boxed(name, Box::new(logic), mode)
    }

    pub fn from_boxed(name: impl Into<String>, logic: Box<dyn TransformLogic>, mode: Mode) -> Rc<Self> {
        let name = name.into();
        Rc::new_cyclic(|me: &Weak<Transform>| {
            let owner: Weak<dyn StreamNode> = me.clone();
            Transform {
                me: me.clone(),
                core: NodeCore::new(owner, name, mode),
                logic: RefCell::new(logic),
                inbox: RefCell::new(Inbox::default()),
            }
        })
    }

    /// Erase the concrete type.
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
                let done = Done::new(target);
                self.logic.borrow_mut().transform(chunk, done);
            }
            Step::Finish => {
                let result = {
                    let out = Outlet { core: &self.core };
                    self.logic.borrow_mut().flush(&out)
                };
                match result {
                    Ok(()) => self.core.push_end(),
                    Err(e) => self.core.fail(e),
                }
            }
            Step::Idle => {}
        }
    }
}

impl StreamNode for Transform {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn is_readable(&self) -> bool {
        true
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

impl Settle for Transform {
    fn settle(&self, outcome: StreamResult<Option<Chunk>>) {
        self.inbox.borrow_mut().settled();
        match outcome {
            Ok(Some(chunk)) => self.core.push(chunk),
            Ok(None) => {}
            Err(e) => {
                self.inbox.borrow_mut().abort();
                self.core.fail(e);
                return;
            }
        }
        self.schedule();
    }

    fn push_extra(&self, chunk: Chunk) {
        self.core.push(chunk);
    }

    fn label(&self) -> String {
        self.core.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::source::Source;
    use std::cell::RefCell;

    struct Upper;

    impl TransformLogic for Upper {
        fn transform(&mut self, chunk: Chunk, done: Done) {
            done.emit(chunk.to_text().to_uppercase());
        }
    }

    struct Trailer;

    impl TransformLogic for Trailer {
        fn transform(&mut self, chunk: Chunk, done: Done) {
            done.emit(chunk);
        }

        fn flush(&mut self, out: &Outlet<'_>) -> StreamResult<()> {
            out.push("!");
            Ok(())
        }
    }

    fn collect(node: &StreamRef) -> Rc<RefCell<Vec<Chunk>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        node.core().on_data(move |c| s.borrow_mut().push(c.clone()));
        seen
    }

    #[test]
    fn test_transform_processes_in_order() {
        let source: StreamRef = Source::from_chunks("src", false, vec!["a".into(), "b".into()]);
        let upper = Transform::new("Upper", Upper, Mode::data()).into_ref();
        source.core().native_pipe(&upper).unwrap();
        let seen = collect(&upper);

        scheduler::run();
        assert_eq!(*seen.borrow(), vec![Chunk::from("A"), Chunk::from("B")]);
        assert!(upper.core().is_ended());
    }

    #[test]
    fn test_flush_runs_before_end() {
        let source: StreamRef = Source::from_chunks("src", false, vec!["x".into()]);
        let trailer = Transform::new("Trailer", Trailer, Mode::data()).into_ref();
        source.core().native_pipe(&trailer).unwrap();
        let seen = collect(&trailer);

        scheduler::run();
        assert_eq!(*seen.borrow(), vec![Chunk::from("x"), Chunk::from("!")]);
    }

    #[test]
    fn test_dropped_done_fails_stage() {
        struct Forgetful;
        impl TransformLogic for Forgetful {
            fn transform(&mut self, _chunk: Chunk, _done: Done) {}
        }

        let source: StreamRef = Source::from_chunks("src", false, vec!["x".into()]);
        let stage = Transform::new("Forgetful", Forgetful, Mode::data()).into_ref();
        source.core().native_pipe(&stage).unwrap();
        stage.core().remove_first_default_error_listener();

        scheduler::run();
        assert!(stage.core().is_failed());
    }
}
