//! End-to-end pipelines built with the convenience constructors.

mod common;

use common::builders::{numbers, SourceBuilder};
use common::mock_helpers::{memory_sink, MockSinkFactory};
use common::{capture, run_and_take, texts};
use serde_json::json;
use std::convert::Infallible;
use streamchain::stream::Done;
use streamchain::{convert, Chunk, FileSinkOptions, StreamError, StreamExt, ThroughFn, Verdict};

#[test]
fn test_split_default_into_array() {
    let (slot, cb) = capture();
    convert(b"a\nb\nc".to_vec())
        .split(None)
        .unwrap()
        .into_array(cb)
        .unwrap();

    let items = run_and_take(&slot).unwrap();
    assert_eq!(items, vec![Chunk::from("a"), Chunk::from("b"), Chunk::from("c")]);
}

#[test]
fn test_split_on_literal_comma() {
    let (slot, cb) = capture();
    convert("x,y\nz")
        .split(Some(",".into()))
        .unwrap()
        .into_array(cb)
        .unwrap();
    assert_eq!(texts(&run_and_take(&slot).unwrap()), vec!["x", "y\nz"]);
}

#[test]
fn test_through_sync_doubles_records() {
    let (slot, cb) = capture();
    numbers(&[1, 2, 3])
        .through_obj_sync(|v| Ok::<_, Infallible>(json!(v.as_i64().unwrap_or(0) * 2)))
        .unwrap()
        .into_array(cb)
        .unwrap();

    let items = run_and_take(&slot).unwrap();
    assert_eq!(
        items,
        vec![Chunk::Object(json!(2)), Chunk::Object(json!(4)), Chunk::Object(json!(6))]
    );
}

#[test]
fn test_filter_sync_keeps_greater_than_one() {
    let (slot, cb) = capture();
    numbers(&[1, 2, 3])
        .filter_sync(|chunk| {
            Ok::<_, Infallible>(matches!(chunk, Chunk::Object(v) if v.as_i64() > Some(1)))
        })
        .unwrap()
        .into_array(cb)
        .unwrap();

    let items = run_and_take(&slot).unwrap();
    assert_eq!(items, vec![Chunk::Object(json!(2)), Chunk::Object(json!(3))]);
}

#[test]
fn test_sync_failure_reaches_callback() {
    let (slot, cb) = capture();
    numbers(&[1, 2, 3])
        .through_obj_sync(|v| {
            if v == json!(2) {
                Err(format!("cannot handle {}", v))
            } else {
                Ok(v)
            }
        })
        .unwrap()
        .into_array(cb)
        .unwrap();

    let err = run_and_take(&slot).unwrap_err();
    assert!(matches!(err, StreamError::Transform { .. }));
    assert!(err.to_string().contains("cannot handle 2"));
}

#[test]
fn test_failure_travels_through_later_stages() {
    let (slot, cb) = capture();
    numbers(&[1, 2])
        .filter_sync(|_| Err::<bool, _>("predicate exploded"))
        .unwrap()
        .pluck(None)
        .unwrap()
        .batch(2usize)
        .unwrap()
        .into_string(cb)
        .unwrap();

    let err = run_and_take(&slot).unwrap_err();
    assert!(err.to_string().contains("predicate exploded"));
}

#[test]
fn test_async_filter_and_through() {
    let (slot, cb) = capture();
    numbers(&[1, 2, 3, 4])
        .filter(|chunk: &Chunk, verdict: Verdict| {
            let even = matches!(chunk, Chunk::Object(v) if v.as_i64().unwrap_or(1) % 2 == 0);
            verdict.decide(even)
        })
        .unwrap()
        .through(ThroughFn::object(|v, done: Done| done.emit(json!({ "value": v }))))
        .unwrap()
        .pluck(None)
        .unwrap()
        .into_array(cb)
        .unwrap();

    let items = run_and_take(&slot).unwrap();
    assert_eq!(items, vec![Chunk::Object(json!(2)), Chunk::Object(json!(4))]);
}

#[test]
fn test_pluck_named_key() {
    let (slot, cb) = capture();
    SourceBuilder::new("people")
        .record(json!({"id": 7, "name": "ada"}))
        .record(json!({"name": "anonymous"}))
        .record(json!({"id": 9}))
        .build()
        .pluck(Some("id"))
        .unwrap()
        .into_array(cb)
        .unwrap();

    let items = run_and_take(&slot).unwrap();
    assert_eq!(items, vec![Chunk::Object(json!(7)), Chunk::Object(json!(9))]);
}

#[test]
fn test_batch_defaults_and_coercion() {
    let (slot, cb) = capture();
    numbers(&(1..=12).collect::<Vec<_>>())
        .batch("not a number")
        .unwrap()
        .into_array(cb)
        .unwrap();
    let batches = run_and_take(&slot).unwrap();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0], Chunk::Object(json!([1, 2, 3, 4, 5, 6, 7, 8, 9, 10])));

    let (slot, cb) = capture();
    numbers(&(1..=6).collect::<Vec<_>>())
        .batch("5")
        .unwrap()
        .into_array(cb)
        .unwrap();
    let batches = run_and_take(&slot).unwrap();
    assert_eq!(
        batches,
        vec![Chunk::Object(json!([1, 2, 3, 4, 5])), Chunk::Object(json!([6]))]
    );
}

#[test]
fn test_intersperse_default_and_empty() {
    let source = || SourceBuilder::new("words").text("a").text("b").build();

    let (slot, cb) = capture();
    source().intersperse(None).unwrap().into_string(cb).unwrap();
    assert_eq!(run_and_take(&slot).unwrap(), "a\nb");

    let (slot, cb) = capture();
    source()
        .intersperse(Some(Chunk::from("")))
        .unwrap()
        .into_string(cb)
        .unwrap();
    assert_eq!(run_and_take(&slot).unwrap(), "ab");
}

#[test]
fn test_fanout_to_two_sinks() {
    let source = numbers(&[1, 2]);
    let (left, left_cb) = capture();
    let (right, right_cb) = capture();

    source
        .through_obj(|v, done| done.emit(v))
        .unwrap()
        .into_array(left_cb)
        .unwrap();
    source.into_string(right_cb).unwrap();

    streamchain::run();
    assert_eq!(left.borrow_mut().take().unwrap().unwrap().len(), 2);
    assert_eq!(right.borrow_mut().take().unwrap().unwrap(), "12");
    assert_eq!(source.downstream_nodes().len(), 2);
}

#[test]
fn test_each_completes_independently() {
    let sink = numbers(&[5, 6])
        .each(|chunk, done| {
            if chunk == Chunk::Object(json!(6)) {
                done.error("six is unlucky");
            } else {
                done.ok();
            }
        })
        .unwrap();

    let (slot, cb) = capture();
    sink.core().on_complete(cb);
    let err = run_and_take(&slot).unwrap_err();
    assert!(err.to_string().contains("six is unlucky"));
}

#[test]
fn test_into_file_using_mock_factory() {
    let (memory, contents) = memory_sink();
    let mut factory = MockSinkFactory::new();
    factory
        .expect_create_write_sink()
        .withf(|path, options| path.ends_with("records.jsonl") && options.append)
        .times(1)
        .returning_st(move |_, _| Ok(memory.clone()));

    let options = FileSinkOptions {
        append: true,
        ..Default::default()
    };
    let (slot, cb) = capture();
    numbers(&[1, 2])
        .into_file_using(&factory, "out/records.jsonl", options, cb)
        .unwrap();

    run_and_take(&slot).unwrap();
    assert_eq!(contents.take().len(), 2);
}

#[test]
fn test_into_file_open_failure_fires_once() {
    let mut factory = MockSinkFactory::new();
    factory
        .expect_create_write_sink()
        .times(1)
        .returning_st(|_, _| Err(StreamError::Config("disk full".into())));

    let (slot, cb) = capture();
    numbers(&[1])
        .into_file_using(&factory, "x.txt", FileSinkOptions::default(), cb)
        .unwrap();

    let err = run_and_take(&slot).unwrap_err();
    assert!(err.to_string().contains("disk full"));
}
