pub mod auth;
pub mod middleware;
pub mod pages;
pub mod protocol;
pub mod state;
pub mod ws_handler;

// Re-export the main WebSocket handler to make it easily accessible
// to the binary that will build the web server router.
pub use middleware::require_auth;
pub use pages::{
    application_handler, dashboard_handler, documents_handler, page_gate_handler, transfer_handler,
};
pub use ws_handler::ws_handler;
