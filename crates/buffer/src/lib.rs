//! Disk-backed parallel message buffer
//!
//! A [`Spool`] is a first-in-first-out persistent queue with at-least-once
//! delivery, shared by any number of producer and consumer threads.
//! Producers push byte-serialised batches; consumers take the oldest batch
//! together with an [`Ack`] handle that either commits deletion or returns
//! the batch to the head of the queue. Records persist in an embedded
//! ordered key/value store and reappear after a process restart until they
//! are positively acked. A background thread reclaims value-log space.

pub mod config;
pub mod error;
mod sequence;
pub mod spool;

pub use config::SpoolConfig;
pub use error::{Error, Result};
pub use spool::{Ack, Spool};
