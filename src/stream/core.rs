//! Shared per-node state of the stream primitive.
//!
//! `NodeCore` implements the readable half (buffering, flowing, end of
//! stream), native pipe routes, listener registration and the single
//! completion outcome. It also stores the connection layer's bookkeeping (the
//! fanout list and the attached chain view); the primitive never reads or
//! writes those itself.

use crate::error::{StreamError, StreamResult};
use crate::pipeline::chain::ChainView;
use crate::stream::chunk::{Chunk, Mode};
use crate::stream::emitter::{Emitter, ErrorListenerKind};
use crate::stream::id::{ListenerId, NodeId};
use crate::stream::node::{same_node, StreamNode, StreamRef};
use crate::stream::scheduler;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

type CompletionListener = Box<dyn FnOnce(StreamResult<()>)>;

/// A live primitive-level connection to a consumer.
struct PipeRoute {
    consumer: StreamRef,
    /// Default error listener this route attached to the consumer.
    error_listener: ListenerId,
}

#[derive(Default)]
struct FlowState {
    buffer: VecDeque<Chunk>,
    flowing: bool,
    /// No more chunks will be pushed.
    ended: bool,
    end_emitted: bool,
    drain_scheduled: bool,
}

#[derive(Default)]
struct Completion {
    outcome: Option<StreamResult<()>>,
    listeners: Vec<CompletionListener>,
}

/// Bookkeeping shared by every stream node.
pub struct NodeCore {
    id: NodeId,
    name: String,
    mode: Mode,
    owner: Weak<dyn StreamNode>,
    emitter: Emitter,
    flow: RefCell<FlowState>,
    pipes: RefCell<Vec<PipeRoute>>,
    downstream: RefCell<Vec<StreamRef>>,
    chain: RefCell<Option<Rc<ChainView>>>,
    completion: RefCell<Completion>,
}

impl NodeCore {
    /// Create the core for a node. `owner` must point back at the node that
    /// embeds this core (build it with `Rc::new_cyclic`).
    pub fn new(owner: Weak<dyn StreamNode>, name: impl Into<String>, mode: Mode) -> Self {
        Self {
            id: NodeId::next(),
            name: name.into(),
            mode,
            owner,
            emitter: Emitter::new(),
            flow: RefCell::new(FlowState::default()),
            pipes: RefCell::new(Vec::new()),
            downstream: RefCell::new(Vec::new()),
            chain: RefCell::new(None),
            completion: RefCell::new(Completion::default()),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn readable_object_mode(&self) -> bool {
        self.mode.readable_object_mode
    }

    pub fn writable_object_mode(&self) -> bool {
        self.mode.writable_object_mode
    }

    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    fn owner(&self) -> Option<StreamRef> {
        self.owner.upgrade()
    }

    // ── Readable half ──

    /// Queue a chunk for delivery to consumers.
    pub fn push(&self, chunk: Chunk) {
        {
            let mut flow = self.flow.borrow_mut();
            if flow.ended {
                tracing::warn!("{} ({}) dropped a chunk pushed after end", self.name, self.id);
                return;
            }
            flow.buffer.push_back(chunk);
        }
        self.schedule_drain();
    }

    /// Mark the readable half finished. Consumers see the end once the
    /// buffer has been delivered.
    pub fn push_end(&self) {
        self.flow.borrow_mut().ended = true;
        self.schedule_drain();
    }

    pub fn is_flowing(&self) -> bool {
        self.flow.borrow().flowing
    }

    pub fn buffered_len(&self) -> usize {
        self.flow.borrow().buffer.len()
    }

    pub fn is_ended(&self) -> bool {
        self.flow.borrow().end_emitted
    }

    /// Start delivering buffered and future chunks.
    pub fn resume(&self) {
        self.flow.borrow_mut().flowing = true;
        self.schedule_drain();
    }

    /// Stop delivering; chunks accumulate in the buffer.
    pub fn pause(&self) {
        self.flow.borrow_mut().flowing = false;
    }

    fn schedule_drain(&self) {
        {
            let mut flow = self.flow.borrow_mut();
            if !flow.flowing || flow.drain_scheduled || flow.end_emitted {
                return;
            }
            flow.drain_scheduled = true;
        }
        let Some(owner) = self.owner() else {
            return;
        };
        scheduler::defer(move || owner.core().drain(&owner));
    }

    fn drain(&self, owner: &StreamRef) {
        self.flow.borrow_mut().drain_scheduled = false;
        if self.is_failed() {
            return;
        }

        loop {
            let chunk = {
                let mut flow = self.flow.borrow_mut();
                if !flow.flowing {
                    return;
                }
                match flow.buffer.pop_front() {
                    Some(chunk) => chunk,
                    None => break,
                }
            };
            tracing::trace!("{} ({}) delivering chunk", self.name, self.id);
            for consumer in self.route_consumers() {
                consumer.write(chunk.clone());
            }
            self.emitter.emit_data(&chunk);
        }

        let emit_end = {
            let mut flow = self.flow.borrow_mut();
            if flow.ended && !flow.end_emitted {
                flow.end_emitted = true;
                true
            } else {
                false
            }
        };

        if emit_end {
            tracing::debug!("{} ({}) ended", self.name, self.id);
            for consumer in self.route_consumers() {
                consumer.end();
            }
            self.emitter.emit_end();
            self.complete(Ok(()));
        } else if !self.flow.borrow().ended {
            owner.on_read();
        }
    }

    fn route_consumers(&self) -> Vec<StreamRef> {
        self.pipes
            .borrow()
            .iter()
            .map(|r| r.consumer.clone())
            .collect()
    }

    // ── Listeners ──

    /// Listen for data. Attaching a data listener starts the flow.
    pub fn on_data(&self, f: impl Fn(&Chunk) + 'static) -> ListenerId {
        let id = self.emitter.on_data(Rc::new(f));
        self.resume();
        id
    }

    pub fn on_end(&self, f: impl Fn() + 'static) -> ListenerId {
        self.emitter.on_end(Rc::new(f))
    }

    /// Attach an explicit error listener.
    pub fn on_error(&self, f: impl Fn(&StreamError) + 'static) -> ListenerId {
        self.emitter.on_error(ErrorListenerKind::Explicit, Rc::new(f))
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.emitter.remove(id)
    }

    /// Remove the first default error listener, if any. Used by the
    /// connection layer after every successful native pipe.
    pub fn remove_first_default_error_listener(&self) -> Option<ListenerId> {
        self.emitter.remove_first_default_error_listener()
    }

    // ── Native pipe ──

    /// Primitive-level wiring: route every chunk and the end of this node to
    /// `consumer`, and attach a default error listener to the consumer that
    /// detaches the route when the consumer fails.
    pub fn native_pipe(&self, consumer: &StreamRef) -> StreamResult<()> {
        let producer = self.owner().ok_or(StreamError::NotReadable(self.id))?;
        if !producer.is_readable() {
            return Err(StreamError::NotReadable(self.id));
        }
        if !consumer.is_writable() {
            return Err(StreamError::NotWritable(consumer.core().id()));
        }

        let weak_producer = Rc::downgrade(&producer);
        let weak_consumer = Rc::downgrade(consumer);
        let error_listener = consumer.core().emitter.on_error(
            ErrorListenerKind::Default,
            Rc::new(move |err: &StreamError| {
                if let (Some(p), Some(c)) = (weak_producer.upgrade(), weak_consumer.upgrade()) {
                    tracing::error!(
                        "Unhandled error on {} ({}), detaching from {}: {}",
                        c.core().name(),
                        c.core().id(),
                        p.core().id(),
                        err
                    );
                    let _ = p.core().native_unpipe(Some(&c));
                }
            }),
        );

        self.pipes.borrow_mut().push(PipeRoute {
            consumer: consumer.clone(),
            error_listener,
        });
        tracing::trace!("native pipe {} -> {}", self.id, consumer.core().id());
        self.resume();
        Ok(())
    }

    /// Primitive-level unwiring. Removes the first route to `consumer`, or
    /// all routes when `None`.
    pub fn native_unpipe(&self, consumer: Option<&StreamRef>) -> StreamResult<()> {
        let removed: Vec<PipeRoute> = {
            let mut pipes = self.pipes.borrow_mut();
            match consumer {
                Some(target) => match pipes.iter().position(|r| same_node(&r.consumer, target)) {
                    Some(pos) => vec![pipes.remove(pos)],
                    None => Vec::new(),
                },
                None => pipes.drain(..).collect(),
            }
        };

        for route in &removed {
            route.consumer.core().emitter.remove(route.error_listener);
        }

        if self.pipes.borrow().is_empty() && self.emitter.data_listener_count() == 0 {
            self.pause();
        }
        Ok(())
    }

    pub fn pipe_count(&self) -> usize {
        self.pipes.borrow().len()
    }

    // ── Fanout bookkeeping (mutated only by the connection layer) ──

    /// Current downstream consumers in connection order.
    pub fn downstream_nodes(&self) -> Vec<StreamRef> {
        self.downstream.borrow().clone()
    }

    pub(crate) fn push_downstream(&self, consumer: StreamRef) {
        self.downstream.borrow_mut().push(consumer);
    }

    pub(crate) fn remove_downstream(&self, consumer: Option<&StreamRef>) {
        let mut downstream = self.downstream.borrow_mut();
        match consumer {
            Some(target) => {
                if let Some(pos) = downstream.iter().position(|n| same_node(n, target)) {
                    downstream.remove(pos);
                }
            }
            None => downstream.clear(),
        }
    }

    // ── Chain view ──

    /// The chain view currently attached to this node, if one was computed.
    pub fn current_chain(&self) -> Option<Rc<ChainView>> {
        self.chain.borrow().clone()
    }

    /// Attach `chain`. A different view previously attached here no longer
    /// describes this node and is marked dirty.
    pub(crate) fn set_chain(&self, chain: Rc<ChainView>) {
        let previous = self.chain.borrow_mut().replace(chain.clone());
        if let Some(previous) = previous {
            if !Rc::ptr_eq(&previous, &chain) {
                previous.mark_dirty();
            }
        }
    }

    /// Mark the attached chain view stale. Returns whether one was attached.
    pub(crate) fn mark_chain_dirty(&self) -> bool {
        match self.chain.borrow().as_ref() {
            Some(chain) => {
                chain.mark_dirty();
                true
            }
            None => false,
        }
    }

    // ── Completion ──

    /// Register a single-shot completion listener. It runs as a deferred
    /// task once the node ends, finishes or fails.
    pub fn on_complete(&self, f: impl FnOnce(StreamResult<()>) + 'static) {
        let mut completion = self.completion.borrow_mut();
        match &completion.outcome {
            Some(outcome) => {
                let outcome = outcome.clone();
                scheduler::defer(move || f(outcome));
            }
            None => completion.listeners.push(Box::new(f)),
        }
    }

    /// Record the node's outcome. Only the first call has any effect.
    pub fn complete(&self, outcome: StreamResult<()>) -> bool {
        let listeners = {
            let mut completion = self.completion.borrow_mut();
            if completion.outcome.is_some() {
                return false;
            }
            completion.outcome = Some(outcome.clone());
            std::mem::take(&mut completion.listeners)
        };
        for f in listeners {
            let outcome = outcome.clone();
            scheduler::defer(move || f(outcome));
        }
        true
    }

    pub fn is_complete(&self) -> bool {
        self.completion.borrow().outcome.is_some()
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.completion.borrow().outcome, Some(Err(_)))
    }

    /// Fail the node: record the error as its outcome, notify explicit and
    /// default error listeners, and forward the error along the tracked
    /// fanout so the pipeline's sinks observe it. A node fails at most once.
    pub fn fail(&self, err: StreamError) {
        if !self.complete(Err(err.clone())) {
            return;
        }
        {
            let mut flow = self.flow.borrow_mut();
            flow.buffer.clear();
            flow.flowing = false;
        }
        tracing::debug!("{} ({}) failed: {}", self.name, self.id, err);

        let observed = self.emitter.emit_error(&err);
        let downstream = self.downstream_nodes();
        if observed == 0 && downstream.is_empty() {
            tracing::warn!("Unobserved error on {} ({}): {}", self.name, self.id, err);
        }
        for consumer in downstream {
            let err = err.clone();
            scheduler::defer(move || consumer.core().fail(err));
        }
    }
}

impl std::fmt::Debug for NodeCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeCore")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("pipes", &self.pipe_count())
            .field("downstream", &self.downstream.borrow().len())
            .finish()
    }
}
