//! Event sourcing core with crypto-shredding field encryption.
//!
//! Aggregates are rebuilt from an ordered log of immutable events, and new
//! events are appended under an optimistic concurrency check. Events are
//! encoded through a [`Codec`] into a tree of primitives, encrypting the
//! fields configured per record type with a key owned by a subject. Deleting
//! a subject's key makes its encrypted data permanently unreadable.
//!
//! # Example
//!
//! ```
//! use std::sync::OnceLock;
//!
//! use strata::{Aggregate, Apply, Event, Handlers, Record, Root};
//!
//! #[derive(Clone, Debug, PartialEq, Record, Event)]
//! struct Incremented {
//!     amount: u64,
//! }
//!
//! #[derive(Default)]
//! struct Counter {
//!     count: u64,
//! }
//!
//! impl Aggregate for Counter {
//!     fn aggregate_type() -> &'static str {
//!         "counter"
//!     }
//!
//!     fn handlers() -> &'static Handlers<Self> {
//!         static HANDLERS: OnceLock<Handlers<Counter>> = OnceLock::new();
//!         HANDLERS.get_or_init(|| Handlers::new().on::<Incremented>())
//!     }
//! }
//!
//! impl Apply<Incremented> for Counter {
//!     fn apply(&mut self, event: &Incremented) {
//!         self.count += event.amount;
//!     }
//! }
//!
//! let mut counter = Root::<Counter>::new();
//! counter.record_change(Incremented { amount: 2 });
//! assert_eq!(counter.count, 2);
//! assert_eq!(counter.version(), -1);
//! ```

extern crate self as strata;

#[macro_use]
mod macros;

pub mod aggregate;
pub mod codec;
pub mod encryption;
mod error;
pub mod event;
pub mod event_store;
pub mod registry;
mod stream_name;

pub use aggregate::{Aggregate, Apply, Handlers, Root};
pub use codec::{Codec, CodecBuilder, Decode, Encode, Record};
pub use encryption::{EncryptionKey, KeyRepository, KeyStore, Protected};
pub use error::{ConfigError, Error};
pub use event::{Event, EventType};
pub use event_store::{AppendError, EventDescriptor, EventStore};
pub use registry::EventRegistry;
pub use stream_name::{EmptyStreamName, StreamName};
pub use strata_derive::{Event, Record};

#[cfg(any(test, feature = "tests-cfg"))]
pub mod tests_cfg;

#[doc(hidden)]
pub mod __macro_helpers {
    pub use serde_json;
}
