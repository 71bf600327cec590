//! File output against a real filesystem.

mod common;

use common::builders::SourceBuilder;
use common::{capture, run_and_take};
use serde_json::json;
use std::fs;
use streamchain::{FileSinkOptions, StreamError, StreamExt};
use tempfile::tempdir;

#[test]
fn test_into_file_writes_split_lines() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("out.txt");

    let (slot, cb) = capture();
    streamchain::convert("one\ntwo\nthree")
        .split(None)
        .unwrap()
        .intersperse(None)
        .unwrap()
        .into_file(&path, cb)
        .unwrap();

    run_and_take(&slot).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "one\ntwo\nthree");
}

#[test]
fn test_into_file_with_append() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("log.jsonl");
    fs::write(&path, "{\"n\":0}\n").unwrap();

    let options = FileSinkOptions {
        append: true,
        ..Default::default()
    };
    let (slot, cb) = capture();
    SourceBuilder::new("records")
        .record(json!({"n": 1}))
        .record(json!({"n": 2}))
        .build()
        .into_file_with(&path, options, cb)
        .unwrap();

    run_and_take(&slot).unwrap();
    let contents = fs::read_to_string(&path).unwrap();
    let lines: Vec<_> = contents.lines().collect();
    assert_eq!(lines, vec!["{\"n\":0}", "{\"n\":1}", "{\"n\":2}"]);
}

#[test]
fn test_into_file_truncates_by_default() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.txt");
    fs::write(&path, "stale contents").unwrap();

    let (slot, cb) = capture();
    streamchain::convert("fresh").into_file(&path, cb).unwrap();

    run_and_take(&slot).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "fresh");
}

#[test]
fn test_open_failure_is_reported_asynchronously() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "a file, not a directory").unwrap();
    let path = blocker.join("out.txt");

    let (slot, cb) = capture();
    streamchain::convert("ignored").into_file(&path, cb).unwrap();

    // Nothing is reported until the scheduler turns.
    assert!(slot.borrow().is_none());
    let err = run_and_take(&slot).unwrap_err();
    assert!(err.to_string().contains("blocker"));
}

#[test]
fn test_refused_wiring_leaves_existing_file_alone() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("keep.txt");
    fs::write(&path, "precious").unwrap();

    let sink = SourceBuilder::new("words")
        .text("x")
        .build()
        .each(|_, done| done.ok())
        .unwrap();
    let (slot, cb) = capture::<()>();
    let err = sink.into_file(&path, cb).unwrap_err();
    assert!(matches!(err, StreamError::NotReadable(_)));

    streamchain::run();
    assert!(slot.borrow().is_none());
    assert_eq!(fs::read_to_string(&path).unwrap(), "precious");
}
