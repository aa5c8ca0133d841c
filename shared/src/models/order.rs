//! Table sessions, tickets, and ticket details

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a table session
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Open,
    Closed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Open => "open",
            SessionStatus::Closed => "closed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "open" => Some(SessionStatus::Open),
            "closed" => Some(SessionStatus::Closed),
            _ => None,
        }
    }
}

/// A table's open/closed seating period. A table identifier may accumulate
/// many closed sessions over time but holds at most one open session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSession {
    pub id: Uuid,
    pub table_identifier: String,
    /// Free-text seating tag ("VIP", "terrace"). Cleared on close.
    pub tag: Option<String>,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle of an order ticket. Approved and Rejected are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Pending,
    Approved,
    Rejected,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Pending => "pending",
            TicketStatus::Approved => "approved",
            TicketStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TicketStatus::Pending),
            "approved" => Some(TicketStatus::Approved),
            "rejected" => Some(TicketStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TicketStatus::Pending)
    }

    /// Only pending tickets may move, and only into a terminal state.
    pub fn can_transition_to(&self, next: TicketStatus) -> bool {
        matches!(self, TicketStatus::Pending) && next.is_terminal()
    }
}

/// An order ticket raised by a waiter against a table session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub session_id: Uuid,
    pub waiter_id: Uuid,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
}

/// One product line on a ticket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketDetail {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub product_id: Uuid,
    pub quantity: Decimal,
    /// Price captured when the line was added; later product price changes
    /// do not affect it.
    pub unit_price_at_sale: Decimal,
}

impl TicketDetail {
    pub fn subtotal(&self) -> Decimal {
        self.quantity * self.unit_price_at_sale
    }
}

/// An open session annotated for the floor view: how many tickets still
/// await approval and what the table has consumed so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionWithActivity {
    #[serde(flatten)]
    pub session: OrderSession,
    pub pending_tickets: i64,
    /// Total across all the session's tickets, pending and approved combined
    pub total_amount: Decimal,
}
