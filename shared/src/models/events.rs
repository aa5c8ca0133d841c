//! Realtime event payloads published by the core workflow
//!
//! The transport (socket fan-out to connected terminals) lives outside the
//! core; these types define the names and payloads it carries.

use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::{SessionStatus, TicketStatus};

/// A change notification emitted after a workflow mutation commits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum PosEvent {
    #[serde(rename = "ticket:changed")]
    TicketChanged {
        session_id: Uuid,
        action: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<TicketStatus>,
    },
    #[serde(rename = "orderSession:changed")]
    OrderSessionChanged {
        action: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        session_id: Option<Uuid>,
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<SessionStatus>,
    },
    #[serde(rename = "invoice:created")]
    InvoiceCreated { session_id: Uuid, invoice_id: Uuid },
    #[serde(rename = "cashSession:changed")]
    CashSessionChanged { action: String, session_id: Uuid },
}

impl PosEvent {
    /// Channel name the transport publishes under
    pub fn name(&self) -> &'static str {
        match self {
            PosEvent::TicketChanged { .. } => "ticket:changed",
            PosEvent::OrderSessionChanged { .. } => "orderSession:changed",
            PosEvent::InvoiceCreated { .. } => "invoice:created",
            PosEvent::CashSessionChanged { .. } => "cashSession:changed",
        }
    }

    /// The table session this event is scoped to, where one applies;
    /// the transport uses it to fan out to per-session rooms.
    pub fn session_scope(&self) -> Option<Uuid> {
        match self {
            PosEvent::TicketChanged { session_id, .. } => Some(*session_id),
            PosEvent::OrderSessionChanged { session_id, .. } => *session_id,
            PosEvent::InvoiceCreated { session_id, .. } => Some(*session_id),
            PosEvent::CashSessionChanged { .. } => None,
        }
    }

    /// Wire payload without the event-name tag
    pub fn payload(&self) -> serde_json::Value {
        match self {
            PosEvent::TicketChanged {
                session_id,
                action,
                status,
            } => json!({
                "session_id": session_id,
                "action": action,
                "status": status,
            }),
            PosEvent::OrderSessionChanged {
                action,
                session_id,
                status,
            } => json!({
                "action": action,
                "session_id": session_id,
                "status": status,
            }),
            PosEvent::InvoiceCreated {
                session_id,
                invoice_id,
            } => json!({
                "session_id": session_id,
                "invoice_id": invoice_id,
            }),
            PosEvent::CashSessionChanged { action, session_id } => json!({
                "action": action,
                "session_id": session_id,
            }),
        }
    }
}
