//! EachSink: run a caller callback for every chunk.

use crate::stream::{Chunk, Done, SinkLogic};

pub type EachFn = Box<dyn FnMut(Chunk, Done)>;

pub struct EachSink {
    f: EachFn,
}

impl EachSink {
    pub fn new(f: EachFn) -> Self {
        Self { f }
    }
}

impl SinkLogic for EachSink {
    fn write(&mut self, chunk: Chunk, done: Done) {
        (self.f)(chunk, done);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{scheduler, Mode, Sink, Source, StreamRef};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_callback_sees_every_chunk_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let source: StreamRef = Source::from_chunks("src", false, vec!["1".into(), "2".into()]);
        let sink: StreamRef = Sink::new(
            "Each",
            EachSink::new(Box::new(move |chunk, done| {
                s.borrow_mut().push(chunk);
                done.ok();
            })),
            Mode::data(),
        );
        source.core().native_pipe(&sink).unwrap();

        let ok = Rc::new(RefCell::new(None));
        let o = ok.clone();
        sink.core().on_complete(move |res| *o.borrow_mut() = Some(res.is_ok()));
        scheduler::run();

        assert_eq!(*seen.borrow(), vec![Chunk::from("1"), Chunk::from("2")]);
        assert_eq!(*ok.borrow(), Some(true));
    }

    #[test]
    fn test_callback_error_fails_sink() {
        let source: StreamRef = Source::from_chunks("src", false, vec!["1".into()]);
        let sink: StreamRef = Sink::new(
            "Each",
            EachSink::new(Box::new(|_, done| done.error("refused"))),
            Mode::data(),
        );
        source.core().native_pipe(&sink).unwrap();
        sink.core().remove_first_default_error_listener();
        scheduler::run();
        assert!(sink.core().is_failed());
    }
}
