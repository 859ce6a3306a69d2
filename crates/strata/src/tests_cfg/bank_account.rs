mod aggregate;
mod command;
mod event;

pub use aggregate::*;
pub use command::*;
pub use event::*;

use crate::{Codec, EventRegistry, KeyRepository};

/// Registry of every bank account event.
pub fn registry() -> EventRegistry {
    let mut registry = EventRegistry::new();
    registry
        .register_event::<AccountOpened>()
        .and_then(|registry| registry.register_event::<FundsDeposited>())
        .and_then(|registry| registry.register_event::<FundsWithdrawn>())
        .and_then(|registry| registry.register_event::<StatementIssued>())
        .expect("bank account events are unique");
    registry
}

/// Codec encrypting the account holder's name with the account's key.
pub fn codec(keys: KeyRepository) -> Codec {
    Codec::builder(keys)
        .encrypt::<AccountOpened>("id", &["holder_name"])
        .expect("account opened has an id and holder name")
        .build()
}
