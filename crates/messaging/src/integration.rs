//! Integration events exchanged between services.

use chrono::{DateTime, Utc};
use common::{CausationId, CorrelationId};
use event_store::{EventEnvelope, EventId};
use serde::{Deserialize, Serialize};

/// An event published across service boundaries.
///
/// Unlike [`EventEnvelope`], which is tied to an aggregate stream, an
/// integration event is addressed by type and schema version. The schema
/// version lets consumers on older contracts keep working while the
/// [`crate::VersionRouter`] upcasts payloads step by step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationEvent {
    /// Unique identifier, used for idempotent consumption.
    pub id: EventId,

    /// The type of the event (e.g., "OrderPaid").
    pub event_type: String,

    /// Schema version of the payload, starting at 1.
    pub schema_version: u32,

    /// The service or aggregate type that published the event.
    pub source: String,

    /// When the event was published.
    pub timestamp: DateTime<Utc>,

    /// The event payload as JSON.
    pub payload: serde_json::Value,

    /// Correlation ID tying the event to one saga execution.
    pub correlation_id: Option<CorrelationId>,

    /// ID of the event or command that caused this event.
    pub causation_id: Option<CausationId>,
}

impl IntegrationEvent {
    /// Creates a new integration event builder.
    pub fn builder() -> IntegrationEventBuilder {
        IntegrationEventBuilder::default()
    }

    /// Creates an integration event from a stored envelope.
    ///
    /// The envelope's event ID is carried over so consumers dedup against
    /// the same identifier the store committed.
    pub fn from_envelope(envelope: &EventEnvelope, schema_version: u32) -> Self {
        Self {
            id: envelope.event_id,
            event_type: envelope.event_type.clone(),
            schema_version,
            source: envelope.aggregate_type.clone(),
            timestamp: envelope.timestamp,
            payload: envelope.payload.clone(),
            correlation_id: envelope.correlation_id(),
            causation_id: envelope.causation_id(),
        }
    }
}

/// Builder for constructing integration events.
#[derive(Debug, Default)]
pub struct IntegrationEventBuilder {
    id: Option<EventId>,
    event_type: Option<String>,
    schema_version: Option<u32>,
    source: Option<String>,
    timestamp: Option<DateTime<Utc>>,
    payload: Option<serde_json::Value>,
    correlation_id: Option<CorrelationId>,
    causation_id: Option<CausationId>,
}

impl IntegrationEventBuilder {
    /// Sets the event ID. If not set, a new ID will be generated.
    pub fn id(mut self, id: EventId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the event type.
    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    /// Sets the schema version. Defaults to 1.
    pub fn schema_version(mut self, version: u32) -> Self {
        self.schema_version = Some(version);
        self
    }

    /// Sets the publishing source.
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the timestamp. If not set, the current time will be used.
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Sets the payload from a serializable value.
    pub fn payload<T: Serialize>(mut self, payload: &T) -> Result<Self, serde_json::Error> {
        self.payload = Some(serde_json::to_value(payload)?);
        Ok(self)
    }

    /// Sets the payload from a raw JSON value.
    pub fn payload_raw(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Sets the correlation ID.
    pub fn correlation_id(mut self, correlation_id: CorrelationId) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Sets the causation ID.
    pub fn causation_id(mut self, causation_id: CausationId) -> Self {
        self.causation_id = Some(causation_id);
        self
    }

    /// Builds the integration event.
    ///
    /// # Panics
    ///
    /// Panics if required fields (event_type, source, payload) are not set.
    pub fn build(self) -> IntegrationEvent {
        IntegrationEvent {
            id: self.id.unwrap_or_default(),
            event_type: self.event_type.expect("event_type is required"),
            schema_version: self.schema_version.unwrap_or(1),
            source: self.source.expect("source is required"),
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            payload: self.payload.expect("payload is required"),
            correlation_id: self.correlation_id,
            causation_id: self.causation_id,
        }
    }
}
