use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::codec::{Codec, Record};
use crate::event::{Event, EventType};
use crate::{ConfigError, Error};

type DecodeEvent = fn(Value, &Codec) -> Result<Box<dyn Event>, Error>;

#[derive(Clone, Copy)]
enum Entry {
    Event(DecodeEvent),
    /// A known record which is not an event.
    Record,
}

/// Maps type tags found in stored events back to their decoders.
///
/// Populated once at startup and handed to the event store.
///
/// # Examples
///
/// ```
/// use strata::{Codec, EventRegistry};
/// # use strata::{Event, Record};
/// # #[derive(Clone, Debug, PartialEq, Record, Event)]
/// # struct AccountOpened { id: String }
///
/// let mut registry = EventRegistry::new();
/// registry.register_event::<AccountOpened>()?;
///
/// let event = registry.decode(
///     "AccountOpened",
///     serde_json::json!({ "id": "1" }),
///     &Codec::new(),
/// )?;
/// assert!(event.is::<AccountOpened>());
/// # Ok::<_, Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Default)]
pub struct EventRegistry {
    entries: HashMap<&'static str, Entry>,
}

impl EventRegistry {
    pub fn new() -> Self {
        EventRegistry::default()
    }

    /// Registers an event under its [`EventType::EVENT_TYPE`] tag.
    pub fn register_event<E>(&mut self) -> Result<&mut Self, ConfigError>
    where
        E: Event + EventType + Record,
    {
        self.insert(E::EVENT_TYPE, Entry::Event(decode_event::<E>))
    }

    /// Registers a record which is not an event under its schema name.
    ///
    /// Resolving it afterwards fails with [`Error::NotAnEvent`] instead of
    /// [`Error::UnknownEventType`].
    pub fn register_record<R>(&mut self) -> Result<&mut Self, ConfigError>
    where
        R: Record,
    {
        self.insert(R::schema().name(), Entry::Record)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    /// Resolves the decoder of an event type tag.
    pub fn resolve(&self, tag: &str) -> Result<DecodeEvent, Error> {
        match self.entries.get(tag) {
            Some(Entry::Event(decode)) => Ok(*decode),
            Some(Entry::Record) => Err(Error::NotAnEvent(tag.to_string())),
            None => Err(Error::UnknownEventType(tag.to_string())),
        }
    }

    /// Decodes an event payload by its type tag.
    pub fn decode(&self, tag: &str, value: Value, codec: &Codec) -> Result<Box<dyn Event>, Error> {
        let decode = self.resolve(tag)?;
        decode(value, codec)
    }

    fn insert(&mut self, tag: &'static str, entry: Entry) -> Result<&mut Self, ConfigError> {
        if self.entries.contains_key(tag) {
            return Err(ConfigError::DuplicateType(tag.to_string()));
        }
        self.entries.insert(tag, entry);
        Ok(self)
    }
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut events: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, entry)| matches!(entry, Entry::Event(_)))
            .map(|(tag, _)| *tag)
            .collect();
        events.sort_unstable();

        f.debug_struct("EventRegistry")
            .field("events", &events)
            .finish_non_exhaustive()
    }
}

fn decode_event<E>(value: Value, codec: &Codec) -> Result<Box<dyn Event>, Error>
where
    E: Event + Record,
{
    let event: E = codec.decode_record(value)?;
    Ok(Box::new(event))
}
