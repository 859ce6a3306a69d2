use std::error::Error as StdError;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregate::{Aggregate, Root};
use crate::codec::Codec;
use crate::event::Event;
use crate::registry::EventRegistry;
use crate::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AppendError<E> {
    #[error(transparent)]
    Error(E),
    /// The expected version did not match.
    #[error("wrong expected version {expected} for stream '{stream_name}', current version is {current:?}")]
    WrongExpectedVersion {
        stream_name: String,
        expected: u64,
        current: Option<u64>,
    },
}

/// Append-only storage of event streams with optimistic concurrency.
#[async_trait]
pub trait EventStore: Send + Sync {
    type Error: StdError + Send + Sync + 'static;

    /// Appends events to a stream, in order.
    ///
    /// With `expected_version` set, the append fails with
    /// [`AppendError::WrongExpectedVersion`] and writes nothing unless the last
    /// version in an existing stream matches it. `None` skips the check.
    async fn append(
        &self,
        stream_name: &str,
        events: &[Box<dyn Event>],
        expected_version: Option<u64>,
    ) -> Result<(), AppendError<Self::Error>>;

    /// Reads every event of a stream in version order, or `None` if the stream
    /// holds no events.
    async fn read_all(&self, stream_name: &str)
        -> Result<Option<Vec<Box<dyn Event>>>, Self::Error>;

    /// Loads an aggregate by replaying its stream.
    ///
    /// An aggregate without events is returned empty, with version `-1`.
    async fn load<A>(&self, id: &str) -> Result<Root<A>, Self::Error>
    where
        A: Aggregate,
    {
        let mut root = Root::<A>::new();
        if let Some(events) = self.read_all(&A::stream_name(id)).await? {
            root.load_from_history(events);
        }

        Ok(root)
    }

    /// Appends the uncommitted changes of an aggregate, expecting the version
    /// it was loaded at, and marks them as committed.
    async fn save<A>(&self, id: &str, root: &mut Root<A>) -> Result<(), AppendError<Self::Error>>
    where
        A: Aggregate,
    {
        self.append(
            &A::stream_name(id),
            root.uncommitted_changes(),
            root.expected_version(),
        )
        .await?;
        root.mark_changes_as_committed();

        Ok(())
    }
}

/// A stored event with its payload encoded as JSON text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDescriptor {
    pub stream_name: String,
    pub event_type: String,
    pub data: String,
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

impl EventDescriptor {
    /// Encodes an event for storage at `version`.
    pub fn encode(
        stream_name: &str,
        event: &dyn Event,
        version: u64,
        codec: &Codec,
    ) -> Result<Self, Error> {
        let data = serde_json::to_string(&event.encode_payload(codec)?)?;

        Ok(EventDescriptor {
            stream_name: stream_name.to_string(),
            event_type: event.event_type().to_string(),
            data,
            version,
            created_at: Utc::now(),
        })
    }

    /// Decodes the stored payload back into its concrete event.
    pub fn decode(&self, registry: &EventRegistry, codec: &Codec) -> Result<Box<dyn Event>, Error> {
        let decode = registry.resolve(&self.event_type)?;
        let value = serde_json::from_str(&self.data)?;
        decode(value, codec)
    }
}
