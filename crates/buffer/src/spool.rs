//! The parallel spool buffer
//!
//! A single mutex protects the pending key list, the pending count and the
//! open/closed state; a paired condition variable gates consumers on
//! non-empty-or-closed and [`Spool::close_once_empty`] on
//! drained-or-closed. Every state change broadcasts so both wait predicates
//! re-evaluate. The record read on the take path runs outside the critical
//! section so disk I/O never blocks peers.

use crate::config::SpoolConfig;
use crate::error::{Error, Result};
use crate::sequence::{SEQUENCE_KEY, Sequence};
use fjall::{
    GarbageCollection, Keyspace, KvSeparationOptions, PartitionCreateOptions, PartitionHandle,
    PersistMode,
};
use parking_lot::{Condvar, Mutex};
use sluice_message::Batch;
use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;

/// Name of the partition holding message records
const RECORDS_PARTITION: &str = "records";

/// Rewrite ratio handed to the value-log GC: reclaim segments that are at
/// least half garbage.
const GC_STALENESS: f32 = 0.5;

/// Record keys are 20-digit zero-padded decimals, so the store's
/// lexicographic key order equals numeric order and ascending iteration is
/// FIFO.
fn record_key(id: u64) -> Vec<u8> {
    format!("{id:020}").into_bytes()
}

struct Store {
    keyspace: Keyspace,
    records: PartitionHandle,
    sequence: Sequence,
}

struct State {
    /// Backing store; `None` once the buffer is closed
    store: Option<Store>,

    /// Keys of records awaiting a consumer, oldest first
    pending: VecDeque<Vec<u8>>,

    /// Records pushed but not yet positively acked. Exceeds `pending.len()`
    /// while consumers hold unresolved acks.
    pending_count: u64,
}

struct Inner {
    state: Mutex<State>,
    cond: Condvar,
    persist_mode: PersistMode,
}

/// A disk-backed FIFO buffer shared by parallel producers and consumers.
///
/// Cloning is cheap and every clone operates on the same buffer.
#[derive(Clone)]
pub struct Spool {
    inner: Arc<Inner>,
}

impl Spool {
    /// Open a spool at the configured directory, rebuilding the pending
    /// list from any records that survived a previous process, and start
    /// the background garbage collector.
    pub fn open(config: SpoolConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.directory)?;

        let keyspace = fjall::Config::new(&config.directory).open()?;
        let records = keyspace.open_partition(
            RECORDS_PARTITION,
            PartitionCreateOptions::default().with_kv_separation(KvSeparationOptions::default()),
        )?;

        let persist_mode = if config.sync_writes {
            PersistMode::SyncAll
        } else {
            PersistMode::Buffer
        };
        let sequence = Sequence::reserve(keyspace.clone(), records.clone(), persist_mode)?;

        let mut pending = VecDeque::new();
        for key in records.keys() {
            let key = key?;
            if key.as_ref() == SEQUENCE_KEY {
                continue;
            }
            pending.push_back(key.to_vec());
        }
        let pending_count = pending.len() as u64;
        tracing::debug!(recovered = pending.len(), "opened spool buffer");

        let inner = Arc::new(Inner {
            state: Mutex::new(State {
                store: Some(Store {
                    keyspace,
                    records,
                    sequence,
                }),
                pending,
                pending_count,
            }),
            cond: Condvar::new(),
            persist_mode,
        });

        let weak = Arc::downgrade(&inner);
        let interval = config.gc_interval();
        thread::spawn(move || gc_loop(weak, interval));

        Ok(Self { inner })
    }

    /// Append a batch, returning the store's reported on-disk size in
    /// bytes. The figure is a backlog indicator, not a queue depth.
    pub fn push(&self, batch: &Batch) -> Result<u64> {
        let mut state = self.inner.state.lock();
        let Some(store) = state.store.as_mut() else {
            return Err(Error::Closed);
        };

        let key = record_key(store.sequence.next()?);
        store.records.insert(key.as_slice(), batch.to_bytes())?;
        store.keyspace.persist(self.inner.persist_mode)?;
        let backlog = store.keyspace.disk_space();

        state.pending.push_back(key);
        state.pending_count += 1;

        self.inner.cond.notify_all();
        Ok(backlog)
    }

    /// Remove and return the oldest batch together with its ack handle,
    /// blocking while the buffer is open and empty. The returned batch is
    /// owned by the caller; the record stays on disk until the ack resolves
    /// positively.
    pub fn take(&self) -> Result<(Batch, Ack)> {
        let (key, records) = {
            let mut state = self.inner.state.lock();
            while state.pending.is_empty() && state.store.is_some() {
                self.inner.cond.wait(&mut state);
            }

            let Some(store) = state.store.as_ref() else {
                return Err(Error::Closed);
            };
            let records = store.records.clone();
            match state.pending.pop_front() {
                Some(key) => (key, records),
                None => return Err(Error::Closed),
            }
        };

        // Read outside the critical section; restore the head on failure so
        // other consumers may retry.
        match read_record(&records, &key) {
            Ok(batch) => {
                let ack = Ack {
                    inner: Arc::clone(&self.inner),
                    key,
                };
                Ok((batch, ack))
            }
            Err(err) => {
                let mut state = self.inner.state.lock();
                state.pending.push_front(key);
                self.inner.cond.notify_all();
                Err(err)
            }
        }
    }

    /// Block until every pushed record has been positively acked, then
    /// close the store and release all waiters.
    pub fn close_once_empty(&self) {
        let mut state = self.inner.state.lock();
        while state.pending_count > 0 && state.store.is_some() {
            self.inner.cond.wait(&mut state);
        }
        shutdown(&mut state);
        self.inner.cond.notify_all();
    }

    /// Close immediately, releasing blocked callers with
    /// [`Error::Closed`]. Unacked records stay on disk and reappear at the
    /// next open.
    pub fn close(&self) {
        let mut state = self.inner.state.lock();
        shutdown(&mut state);
        self.inner.cond.notify_all();
    }
}

/// Handle committing or returning one taken batch.
///
/// Resolve exactly once. Dropping the handle unresolved leaves the record
/// on disk, where it reappears at the next open.
pub struct Ack {
    inner: Arc<Inner>,
    key: Vec<u8>,
}

impl Ack {
    /// Positive: delete the record durably and count it drained. Negative:
    /// return the key to the head of the pending list. Returns the store's
    /// reported on-disk size in bytes (a backlog indicator, not a queue
    /// depth).
    pub fn resolve(self, positive: bool) -> Result<u64> {
        let Ack { inner, key } = self;

        let mut state = inner.state.lock();
        let State {
            store,
            pending,
            pending_count,
        } = &mut *state;
        let Some(store) = store.as_mut() else {
            return Err(Error::Closed);
        };

        let outcome = if positive {
            match store
                .records
                .remove(key.as_slice())
                .and_then(|()| store.keyspace.persist(inner.persist_mode))
            {
                Ok(()) => {
                    *pending_count -= 1;
                    Ok(())
                }
                Err(err) => Err(Error::Store(err)),
            }
        } else {
            pending.push_front(key);
            Ok(())
        };
        let backlog = store.keyspace.disk_space();

        inner.cond.notify_all();
        outcome.map(|()| backlog)
    }
}

fn read_record(records: &PartitionHandle, key: &[u8]) -> Result<Batch> {
    let bytes = records
        .get(key)?
        .ok_or_else(|| Error::MissingRecord(String::from_utf8_lossy(key).into_owned()))?;
    Ok(Batch::from_bytes(&bytes)?)
}

fn shutdown(state: &mut State) {
    let Some(mut store) = state.store.take() else {
        return;
    };
    if let Err(err) = store.sequence.release() {
        tracing::warn!(error = %err, "failed to release sequence");
    }
    if let Err(err) = store.keyspace.persist(PersistMode::SyncAll) {
        tracing::warn!(error = %err, "failed to persist store on close");
    }
    tracing::debug!("closed spool buffer");
    // Dropping the handles closes the keyspace.
}

/// Periodically reclaim value-log space. The pass runs under the state
/// lock so it cannot race a concurrent close. Exits when the buffer closes
/// or is dropped.
fn gc_loop(inner: Weak<Inner>, interval: Duration) {
    loop {
        thread::sleep(interval);
        let Some(inner) = inner.upgrade() else {
            return;
        };
        let state = inner.state.lock();
        let Some(store) = state.store.as_ref() else {
            return;
        };
        if let Err(err) = store.records.gc_with_staleness_threshold(GC_STALENESS) {
            tracing::warn!(error = %err, "value log gc failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_key_orders_lexicographically() {
        let low = record_key(9);
        let high = record_key(10);
        assert_eq!(low.len(), 20);
        assert!(low < high);
    }
}
