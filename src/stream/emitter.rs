//! Listener registry for stream events.
//!
//! Listeners are stored as `Rc` closures and cloned out before invocation, so
//! a listener may register or remove listeners on the same node while running.

use crate::error::StreamError;
use crate::stream::chunk::Chunk;
use crate::stream::id::ListenerId;
use std::cell::RefCell;
use std::rc::Rc;

pub type DataListener = Rc<dyn Fn(&Chunk)>;
pub type EndListener = Rc<dyn Fn()>;
pub type ErrorListener = Rc<dyn Fn(&StreamError)>;

/// Who attached an error listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorListenerKind {
    /// Attached implicitly by the primitive's native pipe.
    Default,
    /// Attached by user code.
    Explicit,
}

struct ErrorEntry {
    id: ListenerId,
    kind: ErrorListenerKind,
    f: ErrorListener,
}

#[derive(Default)]
struct Listeners {
    data: Vec<(ListenerId, DataListener)>,
    end: Vec<(ListenerId, EndListener)>,
    error: Vec<ErrorEntry>,
}

/// Per-node event listener registry.
#[derive(Default)]
pub struct Emitter {
    listeners: RefCell<Listeners>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_data(&self, f: DataListener) -> ListenerId {
        let id = ListenerId::next();
        self.listeners.borrow_mut().data.push((id, f));
        id
    }

    pub fn on_end(&self, f: EndListener) -> ListenerId {
        let id = ListenerId::next();
        self.listeners.borrow_mut().end.push((id, f));
        id
    }

    pub fn on_error(&self, kind: ErrorListenerKind, f: ErrorListener) -> ListenerId {
        let id = ListenerId::next();
        self.listeners
            .borrow_mut()
            .error
            .push(ErrorEntry { id, kind, f });
        id
    }

    /// Remove a listener of any kind. Returns whether it was found.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut l = self.listeners.borrow_mut();
        let before = l.data.len() + l.end.len() + l.error.len();
        l.data.retain(|(lid, _)| *lid != id);
        l.end.retain(|(lid, _)| *lid != id);
        l.error.retain(|e| e.id != id);
        before != l.data.len() + l.end.len() + l.error.len()
    }

    /// Remove the earliest-registered default error listener, and only that one.
    pub fn remove_first_default_error_listener(&self) -> Option<ListenerId> {
        let mut l = self.listeners.borrow_mut();
        let pos = l
            .error
            .iter()
            .position(|e| e.kind == ErrorListenerKind::Default)?;
        Some(l.error.remove(pos).id)
    }

    pub fn data_listener_count(&self) -> usize {
        self.listeners.borrow().data.len()
    }

    pub fn error_listener_count(&self, kind: ErrorListenerKind) -> usize {
        self.listeners
            .borrow()
            .error
            .iter()
            .filter(|e| e.kind == kind)
            .count()
    }

    pub fn emit_data(&self, chunk: &Chunk) {
        let listeners: Vec<DataListener> = self
            .listeners
            .borrow()
            .data
            .iter()
            .map(|(_, f)| f.clone())
            .collect();
        for f in listeners {
            f(chunk);
        }
    }

    pub fn emit_end(&self) {
        let listeners: Vec<EndListener> = self
            .listeners
            .borrow()
            .end
            .iter()
            .map(|(_, f)| f.clone())
            .collect();
        for f in listeners {
            f();
        }
    }

    /// Emit an error. Returns the number of listeners that observed it.
    pub fn emit_error(&self, err: &StreamError) -> usize {
        let listeners: Vec<ErrorListener> = self
            .listeners
            .borrow()
            .error
            .iter()
            .map(|e| e.f.clone())
            .collect();
        for f in &listeners {
            f(err);
        }
        listeners.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_remove_first_default_only() {
        let emitter = Emitter::new();
        let explicit = emitter.on_error(ErrorListenerKind::Explicit, Rc::new(|_| {}));
        let first = emitter.on_error(ErrorListenerKind::Default, Rc::new(|_| {}));
        let _second = emitter.on_error(ErrorListenerKind::Default, Rc::new(|_| {}));

        assert_eq!(emitter.remove_first_default_error_listener(), Some(first));
        assert_eq!(emitter.error_listener_count(ErrorListenerKind::Default), 1);
        assert_eq!(emitter.error_listener_count(ErrorListenerKind::Explicit), 1);
        assert!(emitter.remove(explicit));
    }

    #[test]
    fn test_remove_first_default_none() {
        let emitter = Emitter::new();
        emitter.on_error(ErrorListenerKind::Explicit, Rc::new(|_| {}));
        assert_eq!(emitter.remove_first_default_error_listener(), None);
        assert_eq!(emitter.error_listener_count(ErrorListenerKind::Explicit), 1);
    }

    #[test]
    fn test_emit_data_reaches_all() {
        let emitter = Emitter::new();
        let hits = Rc::new(Cell::new(0));
        for _ in 0..2 {
            let hits = hits.clone();
            emitter.on_data(Rc::new(move |_| hits.set(hits.get() + 1)));
        }
        emitter.emit_data(&Chunk::from("x"));
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_listener_may_remove_itself() {
        let emitter = Rc::new(Emitter::new());
        let id_cell = Rc::new(Cell::new(None));
        let e = emitter.clone();
        let ids = id_cell.clone();
        let id = emitter.on_end(Rc::new(move || {
            if let Some(id) = ids.get() {
                e.remove(id);
            }
        }));
        id_cell.set(Some(id));
        emitter.emit_end();
        assert!(!emitter.remove(id));
    }
}
