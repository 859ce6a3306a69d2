//! An in memory implementation of [EventStore](strata::EventStore) and
//! [KeyStore](strata::KeyStore).
//!
//! This is useful for testing, but is not recommended
//! for production as the data does not persist to disk.
//!
//! Each stream is a `Vec<EventDescriptor>` behind its own lock, so appends to
//! different streams never block each other.

#![deny(missing_docs)]

pub use error::Error;
pub use event_store::InMemoryEventStore;
pub use key_store::InMemoryKeyStore;

mod error;
mod event_store;
mod key_store;
