//! Integration tests for the spool buffer

use sluice_buffer::{Error, Spool, SpoolConfig};
use sluice_message::{Batch, Part};
use std::thread;
use std::time::Duration;

fn config_at(dir: &tempfile::TempDir) -> SpoolConfig {
    SpoolConfig::new(dir.path())
}

fn batch_of(payload: &[u8]) -> Batch {
    Batch::new(vec![Part::new(payload.to_vec())])
}

fn payload_of(batch: &Batch) -> &[u8] {
    batch.part(0).expect("batch has a part").as_bytes()
}

#[test]
fn test_fifo_under_no_nack() {
    let dir = tempfile::tempdir().unwrap();
    let spool = Spool::open(config_at(&dir)).unwrap();

    for payload in [b"m1", b"m2", b"m3"] {
        spool.push(&batch_of(payload)).unwrap();
    }

    for expected in [b"m1", b"m2", b"m3"] {
        let (batch, ack) = spool.take().unwrap();
        assert_eq!(payload_of(&batch), expected);
        ack.resolve(true).unwrap();
    }

    spool.close();
}

#[test]
fn test_backlog_is_reported_in_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let spool = Spool::open(config_at(&dir)).unwrap();

    let backlog = spool.push(&batch_of(b"payload")).unwrap();
    assert!(backlog > 0);

    spool.close();
}

#[test]
fn test_at_least_once_across_reopen() {
    let dir = tempfile::tempdir().unwrap();

    {
        let spool = Spool::open(config_at(&dir)).unwrap();
        spool.push(&batch_of(b"X")).unwrap();
        let (batch, _ack) = spool.take().unwrap();
        assert_eq!(payload_of(&batch), b"X");
        // Simulated crash: close without resolving the ack.
        spool.close();
    }

    let spool = Spool::open(config_at(&dir)).unwrap();
    let (batch, ack) = spool.take().unwrap();
    assert_eq!(payload_of(&batch), b"X");
    ack.resolve(true).unwrap();
    spool.close();
}

#[test]
fn test_acked_records_do_not_reappear_after_reopen() {
    let dir = tempfile::tempdir().unwrap();

    {
        let spool = Spool::open(config_at(&dir)).unwrap();
        for payload in [b"A", b"B", b"C"] {
            spool.push(&batch_of(payload)).unwrap();
        }
        for _ in 0..2 {
            let (_batch, ack) = spool.take().unwrap();
            ack.resolve(true).unwrap();
        }
        spool.close();
    }

    let spool = Spool::open(config_at(&dir)).unwrap();
    let (batch, ack) = spool.take().unwrap();
    assert_eq!(payload_of(&batch), b"C");
    ack.resolve(true).unwrap();
    spool.close();
}

#[test]
fn test_nack_returns_message_to_head() {
    let dir = tempfile::tempdir().unwrap();
    let spool = Spool::open(config_at(&dir)).unwrap();

    spool.push(&batch_of(b"m1")).unwrap();
    spool.push(&batch_of(b"m2")).unwrap();

    let (batch, ack) = spool.take().unwrap();
    assert_eq!(payload_of(&batch), b"m1");
    ack.resolve(false).unwrap();

    let (batch, ack) = spool.take().unwrap();
    assert_eq!(payload_of(&batch), b"m1");
    ack.resolve(true).unwrap();

    let (batch, ack) = spool.take().unwrap();
    assert_eq!(payload_of(&batch), b"m2");
    ack.resolve(true).unwrap();

    spool.close();
}

#[test]
fn test_keys_issued_after_reopen_stay_fifo() {
    let dir = tempfile::tempdir().unwrap();

    {
        let spool = Spool::open(config_at(&dir)).unwrap();
        spool.push(&batch_of(b"old")).unwrap();
        spool.close();
    }

    let spool = Spool::open(config_at(&dir)).unwrap();
    spool.push(&batch_of(b"new")).unwrap();

    let (batch, ack) = spool.take().unwrap();
    assert_eq!(payload_of(&batch), b"old");
    ack.resolve(true).unwrap();

    let (batch, ack) = spool.take().unwrap();
    assert_eq!(payload_of(&batch), b"new");
    ack.resolve(true).unwrap();

    spool.close();
}

#[test]
fn test_close_releases_blocked_takers() {
    let dir = tempfile::tempdir().unwrap();
    let spool = Spool::open(config_at(&dir)).unwrap();

    let taker = {
        let spool = spool.clone();
        thread::spawn(move || spool.take())
    };

    // Give the taker time to block on the empty buffer.
    thread::sleep(Duration::from_millis(50));
    spool.close();

    let result = taker.join().unwrap();
    assert!(matches!(result, Err(Error::Closed)));
}

#[test]
fn test_close_once_empty_drains() {
    let dir = tempfile::tempdir().unwrap();
    let spool = Spool::open(config_at(&dir)).unwrap();

    const COUNT: usize = 8;
    for i in 0..COUNT {
        spool.push(&batch_of(format!("m{i}").as_bytes())).unwrap();
    }

    let consumer = {
        let spool = spool.clone();
        thread::spawn(move || {
            for _ in 0..COUNT {
                let (_batch, ack) = spool.take().unwrap();
                ack.resolve(true).unwrap();
            }
        })
    };

    spool.close_once_empty();
    consumer.join().unwrap();

    assert!(matches!(spool.push(&batch_of(b"late")), Err(Error::Closed)));
}

#[test]
fn test_operations_fail_after_close() {
    let dir = tempfile::tempdir().unwrap();
    let spool = Spool::open(config_at(&dir)).unwrap();
    spool.push(&batch_of(b"m1")).unwrap();
    let (_batch, ack) = spool.take().unwrap();

    spool.close();

    assert!(matches!(spool.push(&batch_of(b"m2")), Err(Error::Closed)));
    assert!(matches!(spool.take(), Err(Error::Closed)));
    assert!(matches!(ack.resolve(true), Err(Error::Closed)));
}

#[test]
fn test_close_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let spool = Spool::open(config_at(&dir)).unwrap();
    spool.close();
    spool.close();
    spool.close_once_empty();
}

#[test]
fn test_metadata_survives_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let spool = Spool::open(config_at(&dir)).unwrap();

    let mut part = Part::new(b"{}".to_vec());
    part.metadata_mut().insert("topic", "orders");
    spool.push(&Batch::new(vec![part])).unwrap();

    let (batch, ack) = spool.take().unwrap();
    assert_eq!(batch.part(0).unwrap().metadata().get("topic"), Some("orders"));
    ack.resolve(true).unwrap();

    spool.close();
}

#[test]
fn test_parallel_producers_and_consumers() {
    let dir = tempfile::tempdir().unwrap();
    let spool = Spool::open(
        config_at(&dir).with_sync_writes(false),
    )
    .unwrap();

    const PER_PRODUCER: usize = 20;
    let producers: Vec<_> = (0..2)
        .map(|p| {
            let spool = spool.clone();
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    spool
                        .push(&batch_of(format!("p{p}-{i}").as_bytes()))
                        .unwrap();
                }
            })
        })
        .collect();

    let consumers: Vec<_> = (0..2)
        .map(|_| {
            let spool = spool.clone();
            thread::spawn(move || {
                let mut seen = Vec::new();
                for _ in 0..PER_PRODUCER {
                    let (batch, ack) = spool.take().unwrap();
                    seen.push(payload_of(&batch).to_vec());
                    ack.resolve(true).unwrap();
                }
                seen
            })
        })
        .collect();

    for producer in producers {
        producer.join().unwrap();
    }
    let mut all: Vec<Vec<u8>> = Vec::new();
    for consumer in consumers {
        all.extend(consumer.join().unwrap());
    }

    assert_eq!(all.len(), 2 * PER_PRODUCER);
    all.sort();
    all.dedup();
    assert_eq!(all.len(), 2 * PER_PRODUCER, "every message delivered once");

    spool.close();
}
