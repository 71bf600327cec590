//! In-memory sinks: accumulate everything written into a `Vec` or `String`.
//!
//! The accumulator is shared with the caller through [`Collected`] so the
//! result can be handed out once the sink completes.

use crate::error::StreamResult;
use crate::stream::{Chunk, Done, SinkLogic, StreamRef};
use std::cell::RefCell;
use std::rc::Rc;

/// Shared accumulator handle.
#[derive(Debug, Default)]
pub struct Collected<T>(Rc<RefCell<T>>);

impl<T> Clone for Collected<T> {
    fn clone(&self) -> Self {
        Collected(self.0.clone())
    }
}

impl<T: Default> Collected<T> {
    pub fn new() -> Self {
        Collected(Rc::new(RefCell::new(T::default())))
    }

    /// Move the accumulated value out, leaving an empty one behind.
    pub fn take(&self) -> T {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.0.borrow_mut());
    }
}

/// Register the single completion listener that hands the accumulated value
/// (or the failure) to `cb`.
pub fn deliver_on_complete<T, F>(sink: &StreamRef, collected: Collected<T>, cb: F)
where
    T: Default + 'static,
    F: FnOnce(StreamResult<T>) + 'static,
{
    sink.core()
        .on_complete(move |outcome| cb(outcome.map(|()| collected.take())));
}

/// Collects chunks unchanged.
#[derive(Debug, Default)]
pub struct ArraySink {
    items: Collected<Vec<Chunk>>,
}

impl ArraySink {
    pub fn new() -> Self {
        Self {
            items: Collected::new(),
        }
    }

    pub fn collected(&self) -> Collected<Vec<Chunk>> {
        self.items.clone()
    }
}

impl SinkLogic for ArraySink {
    fn write(&mut self, chunk: Chunk, done: Done) {
        self.items.update(|items| items.push(chunk));
        done.ok();
    }
}

/// Concatenates the text view of every chunk.
#[derive(Debug, Default)]
pub struct StringSink {
    text: Collected<String>,
}

impl StringSink {
    pub fn new() -> Self {
        Self {
            text: Collected::new(),
        }
    }

    pub fn collected(&self) -> Collected<String> {
        self.text.clone()
    }
}

impl SinkLogic for StringSink {
    fn write(&mut self, chunk: Chunk, done: Done) {
        self.text.update(|text| text.push_str(&chunk.to_text()));
        done.ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StreamError;
    use crate::stream::{scheduler, Mode, Sink, Source};
    use serde_json::json;
    use std::cell::Cell;

    #[test]
    fn test_array_sink_delivers_once() {
        let source: StreamRef = Source::from_chunks("src", false, vec!["a".into(), "b".into()]);
        let logic = ArraySink::new();
        let collected = logic.collected();
        let sink: StreamRef = Sink::new("Array", logic, Mode::data());
        source.core().native_pipe(&sink).unwrap();

        let calls = Rc::new(Cell::new(0));
        let result = Rc::new(RefCell::new(None));
        let (c, r) = (calls.clone(), result.clone());
        deliver_on_complete(&sink, collected, move |res| {
            c.set(c.get() + 1);
            *r.borrow_mut() = Some(res);
        });

        scheduler::run();
        assert_eq!(calls.get(), 1);
        let items = result.borrow_mut().take().unwrap().unwrap();
        assert_eq!(items, vec![Chunk::from("a"), Chunk::from("b")]);
    }

    #[test]
    fn test_string_sink_renders_records() {
        let source: StreamRef = Source::from_chunks(
            "src",
            true,
            vec![Chunk::Object(json!("x")), Chunk::Object(json!({"k": 1}))],
        );
        let logic = StringSink::new();
        let collected = logic.collected();
        let sink: StreamRef = Sink::new("String", logic, Mode::object());
        source.core().native_pipe(&sink).unwrap();

        scheduler::run();
        assert_eq!(collected.take(), r#"x{"k":1}"#);
    }

    #[test]
    fn test_failure_is_delivered_instead_of_result() {
        let logic = ArraySink::new();
        let collected = logic.collected();
        let sink: StreamRef = Sink::new("Array", logic, Mode::data());

        let result = Rc::new(RefCell::new(None));
        let r = result.clone();
        deliver_on_complete(&sink, collected, move |res| *r.borrow_mut() = Some(res));
        sink.core().fail(StreamError::transform("upstream", "boom"));
        scheduler::run();

        let res = result.borrow_mut().take().unwrap();
        assert!(res.is_err());
    }
}
