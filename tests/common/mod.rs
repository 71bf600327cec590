//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use std::cell::RefCell;
use std::rc::Rc;
use streamchain::{Chunk, StreamResult};

/// Slot a single-shot callback writes its outcome into.
pub type Outcome<T> = Rc<RefCell<Option<StreamResult<T>>>>;

/// Create an empty outcome slot and a callback that fills it.
///
/// Panics if the callback fires twice.
pub fn capture<T: 'static>() -> (Outcome<T>, impl FnOnce(StreamResult<T>) + 'static) {
    let slot: Outcome<T> = Rc::new(RefCell::new(None));
    let writer = slot.clone();
    let cb = move |res: StreamResult<T>| {
        let previous = writer.borrow_mut().replace(res);
        assert!(previous.is_none(), "callback fired more than once");
    };
    (slot, cb)
}

/// Drive the scheduler and take the captured outcome.
pub fn run_and_take<T>(slot: &Outcome<T>) -> StreamResult<T> {
    streamchain::run();
    slot.borrow_mut()
        .take()
        .expect("callback did not fire")
}

/// Text view of each chunk.
pub fn texts(chunks: &[Chunk]) -> Vec<String> {
    chunks.iter().map(|c| c.to_text().into_owned()).collect()
}
