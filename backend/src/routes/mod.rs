//! Route definitions for the Cantina POS backend

use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - table sessions
        .nest("/sessions", session_routes())
        // Protected routes - tickets
        .nest("/tickets", ticket_routes())
        // Protected routes - ticket lines
        .nest("/ticket-details", ticket_detail_routes())
        // Protected routes - inventory ledger
        .nest("/inventory", inventory_routes())
        // Protected routes - products and recipes
        .nest("/products", product_routes())
        // Protected routes - invoices and reporting
        .nest("/invoices", invoice_routes())
        // Protected routes - cash drawer
        .nest("/cash-sessions", cash_session_routes())
        // Protected routes - event outbox
        .nest("/events", event_routes())
}

/// Table session routes (protected)
fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_sessions).post(handlers::open_session))
        .route("/active", get(handlers::list_active_sessions))
        .route(
            "/:session_id",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/:session_id/status", patch(handlers::update_session_status))
        .route("/:session_id/tag", patch(handlers::update_session_tag))
        .route("/table/:table_identifier", get(handlers::get_session_by_table))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Ticket routes (protected)
fn ticket_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_tickets).post(handlers::create_ticket))
        .route(
            "/:ticket_id",
            get(handlers::get_ticket).delete(handlers::delete_ticket),
        )
        .route("/:ticket_id/details", get(handlers::get_ticket_with_details))
        .route("/:ticket_id/status", patch(handlers::update_ticket_status))
        .route("/session/:session_id", get(handlers::list_tickets_by_session))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Ticket line routes (protected)
fn ticket_detail_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::add_ticket_detail))
        .route("/:detail_id", delete(handlers::remove_ticket_detail))
        .route(
            "/:detail_id/quantity",
            patch(handlers::update_ticket_detail_quantity),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Inventory ledger routes (protected)
fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_inventory).post(handlers::create_inventory_item),
        )
        .route("/low-stock", get(handlers::list_low_stock))
        .route(
            "/:item_id",
            get(handlers::get_inventory_item)
                .put(handlers::update_inventory_item)
                .delete(handlers::delete_inventory_item),
        )
        .route("/:item_id/stock", patch(handlers::adjust_stock))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Product and recipe routes (protected)
fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_products).post(handlers::create_product))
        .route(
            "/:product_id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::deactivate_product),
        )
        .route("/:product_id/stock-check", get(handlers::check_product_stock))
        .route(
            "/:product_id/recipe",
            get(handlers::get_recipe)
                .post(handlers::add_recipe_line)
                .delete(handlers::clear_recipe),
        )
        .route(
            "/recipe/:line_id",
            put(handlers::update_recipe_line).delete(handlers::remove_recipe_line),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Invoice and reporting routes (protected)
fn invoice_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_invoices))
        .route("/generate", post(handlers::generate_invoice))
        .route("/report", get(handlers::sales_report))
        .route(
            "/:invoice_id",
            get(handlers::get_invoice).delete(handlers::delete_invoice),
        )
        .route("/session/:session_id", get(handlers::get_invoice_by_session))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Cash drawer routes (protected)
fn cash_session_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_cash_sessions))
        .route("/open", post(handlers::open_cash_session).get(handlers::get_open_cash_session))
        .route(
            "/open/user/:user_id",
            get(handlers::get_open_cash_sessions_by_user),
        )
        .route("/:session_id", get(handlers::get_cash_session))
        .route("/:session_id/summary", get(handlers::get_cash_session_summary))
        .route("/:session_id/close", patch(handlers::close_cash_session))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Event outbox routes (protected)
fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/pending", get(handlers::list_pending_events))
        .route("/process", post(handlers::process_pending_events))
        .route_layer(middleware::from_fn(auth_middleware))
}
