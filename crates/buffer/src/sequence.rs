//! Persistent monotonic key allocator
//!
//! Hands out record key numbers in leased batches so a push does not
//! synchronously persist the counter on every message. The lease end is
//! written durably before any key from the lease is handed out, which keeps
//! keys strictly increasing across process restarts even when the tail of a
//! lease is never used.

use crate::error::Result;
use fjall::{Keyspace, PartitionHandle, PersistMode};

/// Reserved key the allocator persists its lease under. Skipped when the
/// pending list is rebuilt at open.
pub(crate) const SEQUENCE_KEY: &[u8] = b"_spool_seq";

/// Keys reserved per lease
const LEASE_BATCH: u64 = 1000;

pub(crate) struct Sequence {
    keyspace: Keyspace,
    partition: PartitionHandle,
    persist_mode: PersistMode,
    next: u64,
    leased: u64,
}

impl Sequence {
    /// Reserve the allocator, resuming from the lease persisted by a
    /// previous process (if any).
    pub fn reserve(
        keyspace: Keyspace,
        partition: PartitionHandle,
        persist_mode: PersistMode,
    ) -> Result<Self> {
        let next = match partition.get(SEQUENCE_KEY)? {
            Some(bytes) if bytes.len() == 8 => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(&bytes);
                u64::from_be_bytes(buf)
            }
            Some(_) => {
                tracing::warn!("malformed sequence record, restarting allocator");
                0
            }
            None => 0,
        };

        Ok(Self {
            keyspace,
            partition,
            persist_mode,
            next,
            leased: next,
        })
    }

    /// The next key number, extending the persisted lease when the current
    /// one is exhausted.
    pub fn next(&mut self) -> Result<u64> {
        if self.next == self.leased {
            let leased = self.next + LEASE_BATCH;
            self.partition.insert(SEQUENCE_KEY, leased.to_be_bytes())?;
            self.keyspace.persist(self.persist_mode)?;
            self.leased = leased;
        }
        let id = self.next;
        self.next += 1;
        Ok(id)
    }

    /// Write back the unconsumed head of the lease so the next open resumes
    /// from it instead of skipping the remainder.
    pub fn release(&mut self) -> Result<()> {
        self.partition.insert(SEQUENCE_KEY, self.next.to_be_bytes())?;
        self.keyspace.persist(self.persist_mode)?;
        self.leased = self.next;
        Ok(())
    }
}
