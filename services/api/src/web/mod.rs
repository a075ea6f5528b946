pub mod middleware;
pub mod protocol;
pub mod rest;
pub mod state;
pub mod ws_handler;

// Re-export the handlers the server binary wires into the router.
pub use middleware::require_identity;
pub use ws_handler::ws_handler;
