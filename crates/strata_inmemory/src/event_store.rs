use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use strata::{AppendError, Codec, Event, EventDescriptor, EventRegistry, EventStore};
use tracing::{debug, trace};

use crate::Error;

type Stream = Arc<RwLock<Vec<EventDescriptor>>>;

/// An in memory event store.
///
/// This is useful for testing, but is not recommended
/// for production as the data does not persist to disk.
///
/// See [crate] documentation for more info.
#[derive(Debug)]
pub struct InMemoryEventStore {
    streams: RwLock<HashMap<String, Stream>>,
    codec: Codec,
    registry: EventRegistry,
}

impl InMemoryEventStore {
    /// Creates an empty event store encoding events with `codec`, and decoding
    /// them through `registry`.
    pub fn new(codec: Codec, registry: EventRegistry) -> Self {
        InMemoryEventStore {
            streams: RwLock::new(HashMap::new()),
            codec,
            registry,
        }
    }

    /// Codec used to encode and decode event payloads.
    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Returns the stored descriptors of a stream, in version order.
    pub fn descriptors(&self, stream_name: &str) -> Result<Vec<EventDescriptor>, Error> {
        match self.stream(stream_name)? {
            Some(stream) => {
                let stream_lock = stream.read().map_err(|_| Error::RwPoison)?;
                Ok(stream_lock.clone())
            }
            None => Ok(vec![]),
        }
    }

    fn stream(&self, stream_name: &str) -> Result<Option<Stream>, Error> {
        let streams_lock = self.streams.read().map_err(|_| Error::RwPoison)?;
        Ok(streams_lock.get(stream_name).cloned())
    }

    fn stream_or_insert(&self, stream_name: &str) -> Result<Stream, Error> {
        let mut streams_lock = self.streams.write().map_err(|_| Error::RwPoison)?;
        Ok(streams_lock
            .entry(stream_name.to_string())
            .or_default()
            .clone())
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    type Error = Error;

    async fn append(
        &self,
        stream_name: &str,
        events: &[Box<dyn Event>],
        expected_version: Option<u64>,
    ) -> Result<(), AppendError<Self::Error>> {
        // Versions are assigned once the stream is locked.
        let mut descriptors = events
            .iter()
            .map(|event| EventDescriptor::encode(stream_name, event.as_ref(), 0, &self.codec))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| AppendError::Error(Error::EncodeEvent(err)))?;

        let stream = match self.stream(stream_name).map_err(AppendError::Error)? {
            Some(stream) => stream,
            None if descriptors.is_empty() => return Ok(()),
            None => self
                .stream_or_insert(stream_name)
                .map_err(AppendError::Error)?,
        };

        let mut stream_lock = stream
            .write()
            .map_err(|_| AppendError::Error(Error::RwPoison))?;

        let current = stream_lock.last().map(|descriptor| descriptor.version);
        if let (Some(expected), Some(current)) = (expected_version, current) {
            if expected != current {
                return Err(AppendError::WrongExpectedVersion {
                    stream_name: stream_name.to_string(),
                    expected,
                    current: Some(current),
                });
            }
        }

        let next_version = current.map(|version| version + 1).unwrap_or(0);
        for (index, descriptor) in descriptors.iter_mut().enumerate() {
            descriptor.version = next_version + index as u64;
        }

        debug!(
            stream_name,
            count = descriptors.len(),
            first_version = next_version,
            "appending events"
        );
        stream_lock.append(&mut descriptors);

        Ok(())
    }

    async fn read_all(
        &self,
        stream_name: &str,
    ) -> Result<Option<Vec<Box<dyn Event>>>, Self::Error> {
        let descriptors = self.descriptors(stream_name)?;
        if descriptors.is_empty() {
            return Ok(None);
        }

        descriptors
            .iter()
            .map(|descriptor| {
                trace!(
                    stream_name,
                    version = descriptor.version,
                    event_type = %descriptor.event_type,
                    "reading event"
                );
                descriptor
                    .decode(&self.registry, &self.codec)
                    .map_err(Error::DecodeEvent)
            })
            .collect::<Result<_, _>>()
            .map(Some)
    }
}

#[cfg(feature = "debug")]
impl InMemoryEventStore {
    /// Print the event store as a table to stdout.
    pub fn print(&self) -> Result<(), Error> {
        let streams_lock = self.streams.read().map_err(|_| Error::RwPoison)?;

        let mut table = prettytable::Table::new();
        table.set_titles(
            [
                "Stream Name",
                "Version",
                "Created At",
                "Event Type",
                "Event Data",
            ]
            .into(),
        );

        let mut stream_names: Vec<_> = streams_lock.keys().collect();
        stream_names.sort();
        let mut rows = 0;
        for stream_name in stream_names {
            let stream_lock = streams_lock[stream_name]
                .read()
                .map_err(|_| Error::RwPoison)?;
            for descriptor in stream_lock.iter() {
                table.add_row(
                    [
                        descriptor.stream_name.clone(),
                        descriptor.version.to_string(),
                        descriptor.created_at.to_string(),
                        descriptor.event_type.clone(),
                        descriptor.data.clone(),
                    ]
                    .into(),
                );
                rows += 1;
            }
        }
        if rows == 0 {
            table.add_row(["", "", "", "", ""].into());
        }

        table.printstd();
        Ok(())
    }
}
