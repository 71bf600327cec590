//! Cooperative task queue driving all data delivery.
//!
//! Every push, write and completion callback runs as a deferred task on a
//! thread-local FIFO queue. Wiring calls therefore never observe data moving
//! in the middle of their own bookkeeping. Callers drive the queue with
//! [`run`].

use std::cell::RefCell;
use std::collections::VecDeque;

type Task = Box<dyn FnOnce()>;

thread_local! {
    static QUEUE: RefCell<VecDeque<Task>> = RefCell::new(VecDeque::new());
}

/// Queue a task to run after everything already queued.
pub fn defer(task: impl FnOnce() + 'static) {
    QUEUE.with(|q| q.borrow_mut().push_back(Box::new(task)));
}

/// Run queued tasks until the queue is empty. Returns the number executed.
pub fn run() -> usize {
    let mut executed = 0;
    // The borrow is released before the task runs so tasks may defer more work.
    while let Some(task) = QUEUE.with(|q| q.borrow_mut().pop_front()) {
        task();
        executed += 1;
    }
    if executed > 0 {
        tracing::trace!("Scheduler drained {} tasks", executed);
    }
    executed
}

/// Run at most `limit` tasks. Returns the number executed.
pub fn run_for(limit: usize) -> usize {
    let mut executed = 0;
    while executed < limit {
        let Some(task) = QUEUE.with(|q| q.borrow_mut().pop_front()) else {
            break;
        };
        task();
        executed += 1;
    }
    executed
}

/// Whether no tasks are pending on this thread.
pub fn is_idle() -> bool {
    QUEUE.with(|q| q.borrow().is_empty())
}
