//! Business logic services for the Cantina POS backend

pub mod cash;
pub mod events;
pub mod inventory;
pub mod invoice;
pub mod product;
pub mod session;
pub mod stock;
pub mod ticket;

pub use cash::CashSessionService;
pub use events::EventPublisher;
pub use inventory::InventoryService;
pub use invoice::InvoiceService;
pub use product::ProductService;
pub use session::SessionService;
pub use stock::StockService;
pub use ticket::TicketService;
