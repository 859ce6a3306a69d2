//! Aggregates

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::ops::Deref;

use heck::ToLowerCamelCase;
use tracing::trace;

use crate::event::Event;
use crate::stream_name::StreamName;

/// Consistency boundary around a domain entity whose state is rebuilt from its
/// events.
pub trait Aggregate: Default + Send + Sync + 'static {
    /// Returns a unique identifier for the aggregate type.
    fn aggregate_type() -> &'static str;

    /// Handlers applying each event type to the state.
    ///
    /// Typically built once in a `OnceLock`.
    fn handlers() -> &'static Handlers<Self>;

    /// Name of the stream holding the events of the aggregate `id`.
    fn stream_name(id: &str) -> StreamName<'static> {
        StreamName::entity(Self::aggregate_type().to_lower_camel_case(), id)
    }
}

/// Applies an event of type `E` to update internal state.
pub trait Apply<E> {
    fn apply(&mut self, event: &E);
}

/// Lookup table from event type to its handler on `A`.
pub struct Handlers<A> {
    handlers: HashMap<TypeId, fn(&mut A, &dyn Event)>,
}

impl<A> Handlers<A> {
    pub fn new() -> Self {
        Handlers {
            handlers: HashMap::new(),
        }
    }

    /// Registers the [`Apply`] handler of `A` for events of type `E`.
    pub fn on<E>(mut self) -> Self
    where
        A: Apply<E>,
        E: Event,
    {
        self.handlers.insert(TypeId::of::<E>(), apply_event::<A, E>);
        self
    }

    pub fn handles(&self, event: &dyn Event) -> bool {
        self.handlers.contains_key(&event_type_id(event))
    }

    /// Applies `event` to `state`. Events without a handler are ignored.
    pub fn apply(&self, state: &mut A, event: &dyn Event) {
        match self.handlers.get(&event_type_id(event)) {
            Some(handler) => handler(state, event),
            None => trace!(
                event_type = event.event_type(),
                "no handler for event, ignoring"
            ),
        }
    }
}

impl<A> Default for Handlers<A> {
    fn default() -> Self {
        Handlers::new()
    }
}

/// Type id of the concrete event behind the trait object.
fn event_type_id(event: &dyn Event) -> TypeId {
    Any::type_id(event.as_any())
}

fn apply_event<A, E>(state: &mut A, event: &dyn Event)
where
    A: Apply<E>,
    E: Event,
{
    if let Some(event) = event.downcast_ref::<E>() {
        state.apply(event);
    }
}

/// Aggregate state together with its version and uncommitted changes.
///
/// The version starts at `-1` and only advances when events are loaded from
/// history. Recording a change applies it immediately but leaves the version
/// untouched until the aggregate is reloaded.
#[derive(Debug)]
pub struct Root<A> {
    state: A,
    version: i64,
    changes: Vec<Box<dyn Event>>,
}

impl<A: Aggregate> Root<A> {
    pub fn new() -> Self {
        Root {
            state: A::default(),
            version: -1,
            changes: Vec::new(),
        }
    }

    /// Creates an aggregate from its creation event.
    pub fn create<E: Event>(event: E) -> Self {
        let mut root = Self::new();
        root.record_change(event);
        root
    }

    /// Replays historical events, in order.
    ///
    /// Discards any uncommitted changes. After `n` events the version is
    /// `n - 1`.
    pub fn load_from_history<I>(&mut self, events: I)
    where
        I: IntoIterator<Item = Box<dyn Event>>,
    {
        self.changes.clear();
        let handlers = A::handlers();
        for event in events {
            handlers.apply(&mut self.state, &*event);
            self.version += 1;
        }
    }

    /// Applies a new event and queues it for persistence.
    pub fn record_change<E: Event>(&mut self, event: E) {
        A::handlers().apply(&mut self.state, &event);
        self.changes.push(Box::new(event));
    }

    /// Runs a command against the current state, recording the event it
    /// produces.
    pub fn handle<E, Err, F>(&mut self, command: F) -> Result<(), Err>
    where
        E: Event,
        F: FnOnce(&A) -> Result<E, Err>,
    {
        let event = command(&self.state)?;
        self.record_change(event);
        Ok(())
    }

    pub fn mark_changes_as_committed(&mut self) {
        self.changes.clear();
    }

    pub fn uncommitted_changes(&self) -> &[Box<dyn Event>] {
        &self.changes
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    /// The version to expect when appending uncommitted changes, `None` when
    /// no events have been loaded.
    pub fn expected_version(&self) -> Option<u64> {
        u64::try_from(self.version).ok()
    }

    pub fn state(&self) -> &A {
        &self.state
    }

    pub fn into_state(self) -> A {
        self.state
    }
}

impl<A: Aggregate> Default for Root<A> {
    fn default() -> Self {
        Root::new()
    }
}

impl<A> Deref for Root<A> {
    type Target = A;

    fn deref(&self) -> &Self::Target {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::{Aggregate, Root};
    use crate::event::Event;
    use crate::tests_cfg::bank_account::{
        AccountOpened, BankAccount, BankAccountError, FundsDeposited, FundsWithdrawn,
        StatementIssued,
    };

    fn opened() -> AccountOpened {
        AccountOpened {
            id: "123".to_string(),
            holder_name: "Alice".to_string(),
        }
    }

    #[test]
    fn new_root_is_empty() {
        let root = Root::<BankAccount>::new();

        assert_eq!(root.version(), -1);
        assert_eq!(root.expected_version(), None);
        assert!(root.uncommitted_changes().is_empty());
        assert_eq!(root.balance, 0.0);
    }

    #[test]
    fn recording_applies_without_versioning() {
        let mut root = Root::<BankAccount>::create(opened());
        root.record_change(FundsDeposited { amount: 10.0 });

        assert_eq!(root.id, "123");
        assert_eq!(root.balance, 10.0);
        assert_eq!(root.version(), -1);
        assert_eq!(root.uncommitted_changes().len(), 2);
        assert!(root.uncommitted_changes()[0].is::<AccountOpened>());
    }

    #[test]
    fn loading_history_advances_version() {
        let history: Vec<Box<dyn Event>> = vec![
            Box::new(opened()),
            Box::new(FundsDeposited { amount: 10.0 }),
            Box::new(FundsWithdrawn { amount: 4.0 }),
        ];

        let mut root = Root::<BankAccount>::new();
        root.record_change(FundsDeposited { amount: 1.0 });
        root.load_from_history(history);

        assert_eq!(root.version(), 2);
        assert_eq!(root.expected_version(), Some(2));
        assert_eq!(root.balance, 7.0);
        assert!(root.uncommitted_changes().is_empty());
    }

    #[test]
    fn committing_keeps_version() {
        let mut root = Root::<BankAccount>::create(opened());
        root.mark_changes_as_committed();

        assert!(root.uncommitted_changes().is_empty());
        assert_eq!(root.version(), -1);
        assert_eq!(root.id, "123");
    }

    #[test]
    fn commands_record_their_events() {
        let mut root = Root::<BankAccount>::create(opened());

        root.handle(|account| account.deposit_funds(20.0)).unwrap();
        let res = root.handle(|account| account.withdraw_funds(50.0));

        assert!(matches!(res, Err(BankAccountError::InsufficientFunds)));
        assert_eq!(root.balance, 20.0);
        assert_eq!(root.uncommitted_changes().len(), 2);
    }

    #[test]
    fn unhandled_events_are_ignored() {
        let mut root = Root::<BankAccount>::new();
        root.load_from_history([Box::new(StatementIssued {
            id: "123".to_string(),
        }) as Box<dyn Event>]);

        assert_eq!(root.version(), 0);
        assert_eq!(root.balance, 0.0);
    }

    #[test]
    fn default_stream_name() {
        assert_eq!(BankAccount::stream_name("123"), "bankAccount-123");
    }
}
