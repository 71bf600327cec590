//! Write-side queue shared by transforms and sinks.
//!
//! Chunks written to a node wait here until the node's logic has settled the
//! previous one, which keeps per-node processing strictly sequential even
//! when callbacks complete later.

use crate::stream::chunk::Chunk;
use std::collections::VecDeque;

#[derive(Default)]
pub(crate) struct Inbox {
    queue: VecDeque<Chunk>,
    /// A chunk is being processed and its `Done` is unsettled.
    busy: bool,
    /// A processing task is queued on the scheduler.
    scheduled: bool,
    /// The writable half was ended by the upstream.
    input_ended: bool,
    /// Flush/finish already ran.
    finished: bool,
}

/// What the node should do on its next processing turn.
pub(crate) enum Step {
    Process(Chunk),
    Finish,
    Idle,
}

impl Inbox {
    pub fn is_input_ended(&self) -> bool {
        self.input_ended
    }

    pub fn enqueue(&mut self, chunk: Chunk) {
        self.queue.push_back(chunk);
    }

    pub fn end_input(&mut self) {
        self.input_ended = true;
    }

    /// Claim a scheduling slot. Returns `false` when a turn is already queued
    /// or a chunk is in flight.
    pub fn try_schedule(&mut self) -> bool {
        if self.busy || self.scheduled || self.finished {
            return false;
        }
        if self.queue.is_empty() && !self.input_ended {
            return false;
        }
        self.scheduled = true;
        true
    }

    /// Take the next step. Called from the scheduled turn.
    pub fn next_step(&mut self) -> Step {
        self.scheduled = false;
        if self.busy || self.finished {
            return Step::Idle;
        }
        if let Some(chunk) = self.queue.pop_front() {
            self.busy = true;
            return Step::Process(chunk);
        }
        if self.input_ended {
            self.finished = true;
            return Step::Finish;
        }
        Step::Idle
    }

    /// The in-flight chunk was settled.
    pub fn settled(&mut self) {
        self.busy = false;
    }

    /// Drop everything after a failure.
    pub fn abort(&mut self) {
        self.queue.clear();
        self.finished = true;
    }
}
