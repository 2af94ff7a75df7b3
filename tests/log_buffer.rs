// tests/log_buffer.rs

mod common;

use std::sync::Arc;

use xbot::log_buffer::{LogBuffer, DEFAULT_CAPACITY};

use crate::common::messages;

#[test]
fn newest_entry_comes_first() {
    let log = LogBuffer::new(10);
    log.append("first");
    log.append("second");
    log.append("third");

    assert_eq!(messages(&log), vec!["third", "second", "first"]);
}

#[test]
fn overflow_evicts_exactly_the_oldest_entries() {
    let capacity = 5;
    let extra = 3;
    let log = LogBuffer::new(capacity);

    for i in 0..capacity + extra {
        log.append(format!("entry {i}"));
    }

    let got = messages(&log);
    assert_eq!(got.len(), capacity);
    let expected: Vec<String> = (extra..capacity + extra)
        .rev()
        .map(|i| format!("entry {i}"))
        .collect();
    assert_eq!(got, expected);
}

#[test]
fn zero_capacity_keeps_one_entry() {
    let log = LogBuffer::new(0);
    assert_eq!(log.capacity(), 1);

    log.append("a");
    log.append("b");
    assert_eq!(messages(&log), vec!["b"]);
}

#[test]
fn default_capacity_is_one_hundred() {
    let log = LogBuffer::default();
    assert_eq!(log.capacity(), DEFAULT_CAPACITY);
    assert_eq!(DEFAULT_CAPACITY, 100);
    assert!(log.is_empty());
}

#[test]
fn entry_renders_with_timestamp_separator() {
    let log = LogBuffer::new(3);
    log.append("Runner is awake");

    let rendered = log.snapshot()[0].to_string();
    let (stamp, message) = rendered.split_once(" :: ").expect("separator");
    assert_eq!(message, "Runner is awake");
    // "YYYY-MM-DD HH:MM:SS"
    assert_eq!(stamp.len(), 19);
}

#[test]
fn snapshot_is_independent_of_later_appends() {
    let log = LogBuffer::new(3);
    log.append("one");
    let snap = log.snapshot();
    log.append("two");

    assert_eq!(snap.len(), 1);
    assert_eq!(log.len(), 2);
}

#[test]
fn concurrent_appends_never_exceed_capacity() {
    let log = Arc::new(LogBuffer::new(50));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let log = Arc::clone(&log);
            std::thread::spawn(move || {
                for i in 0..100 {
                    log.append(format!("t{t} #{i}"));
                    assert!(log.snapshot().len() <= 50);
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(log.len(), 50);
}
