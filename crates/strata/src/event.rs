use std::any::Any;
use std::fmt;

use serde_json::Value;

use crate::codec::{Codec, Record};
use crate::Error;

/// Static type tag of an event.
///
/// Usually implemented with `#[derive(Event)]`, which uses the struct name
/// unless `#[event(name = "...")]` is given.
pub trait EventType {
    const EVENT_TYPE: &'static str;
}

/// An immutable fact recorded by an aggregate.
///
/// Implemented for every [`EventType`] record, and used as `Box<dyn Event>`
/// wherever the concrete type is only known at runtime.
pub trait Event: Any + fmt::Debug + Send + Sync {
    fn event_type(&self) -> &'static str;

    /// Encodes the event payload, applying any configured encryption.
    fn encode_payload(&self, codec: &Codec) -> Result<Value, Error>;

    fn as_any(&self) -> &dyn Any;

    fn clone_event(&self) -> Box<dyn Event>;

    fn eq_event(&self, other: &dyn Event) -> bool;
}

impl<T> Event for T
where
    T: EventType + Record + Clone + fmt::Debug + PartialEq + Send + Sync + 'static,
{
    fn event_type(&self) -> &'static str {
        T::EVENT_TYPE
    }

    fn encode_payload(&self, codec: &Codec) -> Result<Value, Error> {
        codec.encode_record(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_event(&self) -> Box<dyn Event> {
        Box::new(self.clone())
    }

    fn eq_event(&self, other: &dyn Event) -> bool {
        other.downcast_ref::<T>().is_some_and(|other| self == other)
    }
}

impl dyn Event {
    pub fn is<E: Event>(&self) -> bool {
        self.as_any().is::<E>()
    }

    pub fn downcast_ref<E: Event>(&self) -> Option<&E> {
        self.as_any().downcast_ref()
    }
}

impl PartialEq for dyn Event {
    fn eq(&self, other: &Self) -> bool {
        self.eq_event(other)
    }
}

impl Clone for Box<dyn Event> {
    fn clone(&self) -> Self {
        self.clone_event()
    }
}

#[cfg(test)]
mod tests {
    use super::{Event, EventType};
    use crate::tests_cfg::bank_account::{AccountOpened, FundsDeposited};

    #[test]
    fn events_are_tagged() {
        assert_eq!(FundsDeposited::EVENT_TYPE, "FundsDeposited");
        assert_eq!(AccountOpened::EVENT_TYPE, "AccountOpened");

        let event: Box<dyn Event> = Box::new(FundsDeposited { amount: 10.0 });
        assert_eq!(event.event_type(), "FundsDeposited");
    }

    #[test]
    fn boxed_events_downcast() {
        let event: Box<dyn Event> = Box::new(FundsDeposited { amount: 10.0 });

        assert!(event.is::<FundsDeposited>());
        assert!(!event.is::<AccountOpened>());
        assert_eq!(
            event.downcast_ref::<FundsDeposited>(),
            Some(&FundsDeposited { amount: 10.0 })
        );
    }

    #[test]
    fn boxed_events_compare_by_type_and_value() {
        let a: Box<dyn Event> = Box::new(FundsDeposited { amount: 10.0 });
        let b = a.clone();
        let c: Box<dyn Event> = Box::new(FundsDeposited { amount: 5.0 });
        let d: Box<dyn Event> = Box::new(AccountOpened {
            id: "1".to_string(),
            holder_name: "Alice".to_string(),
        });

        assert!(*a == *b);
        assert!(*a != *c);
        assert!(*a != *d);
    }
}
