//! Domain event publishing.

use crate::domain::events::DomainEvent;

/// Where domain events go. NATS when configured, otherwise the log.
#[derive(Clone, Default)]
pub enum EventSink {
    #[default]
    Log,
    Nats(async_nats::Client),
}

impl EventSink {
    /// Best effort: a failed publish is logged and never fails the operation.
    pub async fn publish(&self, event: DomainEvent) {
        match self {
            Self::Log => tracing::info!(subject = event.subject(), ?event, "domain event"),
            Self::Nats(client) => {
                let payload = match serde_json::to_vec(&event) {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::warn!(error = %e, subject = event.subject(), "failed to encode domain event");
                        return;
                    }
                };
                if let Err(e) = client.publish(event.subject().to_string(), payload.into()).await {
                    tracing::warn!(error = %e, subject = event.subject(), "failed to publish domain event");
                }
            }
        }
    }
}
