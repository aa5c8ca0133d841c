//! HTTP handlers for the Cantina POS backend

pub mod cash_sessions;
pub mod events;
pub mod health;
pub mod inventory;
pub mod invoices;
pub mod products;
pub mod sessions;
pub mod ticket_details;
pub mod tickets;

pub use cash_sessions::*;
pub use events::*;
pub use health::*;
pub use inventory::*;
pub use invoices::*;
pub use products::*;
pub use sessions::*;
pub use ticket_details::*;
pub use tickets::*;
