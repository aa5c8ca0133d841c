//! Change-notification publishing
//!
//! The realtime transport (socket fan-out to terminals) is a collaborator
//! outside this service; the workflow's obligation is an observable,
//! non-blocking publish. Each event is written to the outbox table and
//! forwarded on an in-process broadcast channel. Publishing never fails the
//! mutation that caused it: failures are logged and the outbox row stays
//! pending for redelivery.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::PosEvent;

#[derive(Clone)]
pub struct EventPublisher {
    db: PgPool,
    sender: broadcast::Sender<PosEvent>,
}

/// A stored event awaiting (re)delivery
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct OutboxEntry {
    pub id: Uuid,
    pub event_name: String,
    pub session_id: Option<Uuid>,
    pub payload: serde_json::Value,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

impl EventPublisher {
    pub fn new(db: PgPool) -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { db, sender }
    }

    /// Subscribe to the live event stream. The transport layer holds one of
    /// these receivers and fans events out to session-scoped rooms.
    pub fn subscribe(&self) -> broadcast::Receiver<PosEvent> {
        self.sender.subscribe()
    }

    /// Publish a change notification. Best-effort by contract: errors are
    /// logged, never returned, so a failed publish cannot fail the workflow
    /// mutation that triggered it.
    pub async fn publish(&self, event: PosEvent) {
        let payload = match serde_json::to_value(&event) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(event = event.name(), "failed to serialize event: {}", e);
                return;
            }
        };

        // Outbox row first: if the broadcast finds no subscriber the row
        // stays pending and the transport drains it later.
        let outbox_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO event_outbox (event_name, session_id, payload, status)
            VALUES ($1, $2, $3, 'pending')
            RETURNING id
            "#,
        )
        .bind(event.name())
        .bind(event.session_scope())
        .bind(&payload)
        .fetch_one(&self.db)
        .await;

        let outbox_id = match outbox_id {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(event = event.name(), "failed to store event in outbox: {}", e);
                None
            }
        };

        let delivered = self.sender.send(event.clone()).is_ok();

        if let (true, Some(id)) = (delivered, outbox_id) {
            if let Err(e) = self.mark_published(id).await {
                tracing::warn!(event = event.name(), "failed to mark event published: {}", e);
            }
        } else if !delivered {
            tracing::debug!(
                event = event.name(),
                "no event subscribers; left pending in outbox"
            );
        }
    }

    /// Events not yet handed to the transport
    pub async fn pending(&self) -> AppResult<Vec<OutboxEntry>> {
        let entries = sqlx::query_as::<_, OutboxEntry>(
            r#"
            SELECT id, event_name, session_id, payload, status, created_at, published_at
            FROM event_outbox
            WHERE status = 'pending'
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }

    /// Re-deliver pending events to the broadcast channel. Returns how many
    /// were delivered; events that still find no subscriber stay pending.
    pub async fn process_pending(&self) -> AppResult<u64> {
        let entries = self.pending().await?;
        let mut delivered = 0;

        for entry in entries {
            let event: PosEvent = match serde_json::from_value(entry.payload.clone()) {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!(outbox_id = %entry.id, "unreadable outbox payload: {}", e);
                    self.mark_failed(entry.id).await?;
                    continue;
                }
            };

            if self.sender.send(event).is_ok() {
                self.mark_published(entry.id).await?;
                delivered += 1;
            }
        }

        Ok(delivered)
    }

    async fn mark_published(&self, id: Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE event_outbox SET status = 'published', published_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE event_outbox SET status = 'failed' WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
