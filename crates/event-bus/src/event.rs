//! The event record delivered to subscribers.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A single published event: a topic name plus an opaque JSON payload.
///
/// Events are not persisted; one exists only for the duration of a dispatch.
/// Subscribers decode the payload into whatever view they need, so producers
/// and consumers stay decoupled at the type level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// The topic this event was published on.
    pub topic: String,

    /// The payload as published, untouched by the bus.
    pub payload: serde_json::Value,
}

impl Event {
    /// Creates an event from a topic and a raw JSON payload.
    pub fn new(topic: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }

    /// Creates an event by serializing a typed payload.
    pub fn from_payload<T: Serialize>(
        topic: impl Into<String>,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            topic: topic.into(),
            payload: serde_json::to_value(payload)?,
        })
    }

    /// Decodes the payload into a subscriber-side view type.
    ///
    /// Views typically declare only the fields the subscriber reads, with
    /// `#[serde(rename_all = "camelCase")]` to match the wire contract.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}
