//! Redis-backed event publisher for multi-server deployments.
//!
//! Publishes each envelope as JSON on a per-event-type channel under a shared
//! prefix (`billing.events.<event_type>`), so consumers can subscribe to the
//! whole stream with a pattern or to a single event type.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope};
use crate::ports::EventPublisher;

/// Channel prefix for all published billing events.
const CHANNEL_PREFIX: &str = "billing.events";

/// Redis PUBLISH-based event publisher.
///
/// Delivery is fire-and-forget pub/sub: consumers that are offline miss
/// events, which is acceptable because read models rebuild from the store.
#[derive(Clone)]
pub struct RedisEventPublisher {
    conn: MultiplexedConnection,
}

impl RedisEventPublisher {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }

    fn channel_for(event_type: &str) -> String {
        format!("{}.{}", CHANNEL_PREFIX, event_type)
    }
}

#[async_trait]
impl EventPublisher for RedisEventPublisher {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        let channel = Self::channel_for(&event.event_type);
        let body = serde_json::to_string(&event).map_err(|e| {
            DomainError::new(
                ErrorCode::InternalError,
                format!("Failed to serialize event: {}", e),
            )
        })?;

        let mut conn = self.conn.clone();
        conn.publish::<_, _, ()>(&channel, body)
            .await
            .map_err(|e: redis::RedisError| {
                DomainError::new(
                    ErrorCode::InternalError,
                    format!("Failed to publish event to Redis: {}", e),
                )
            })?;

        tracing::debug!(
            event_id = %event.event_id.as_str(),
            event_type = %event.event_type,
            channel = %channel,
            "Published event"
        );

        Ok(())
    }

    async fn publish_all(&self, events: Vec<EventEnvelope>) -> Result<(), DomainError> {
        for event in events {
            self.publish(event).await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for RedisEventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisEventPublisher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_name_includes_event_type() {
        assert_eq!(
            RedisEventPublisher::channel_for("billing.payment.succeeded"),
            "billing.events.billing.payment.succeeded"
        );
    }

    // Redis integration tests require a running Redis instance and are run
    // separately from unit tests.
}
