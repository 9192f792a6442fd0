//! Axum HTTP server, routing, and middleware.
//!
//! # Responsibilities
//! - Serve the app descriptor and the platform's lifecycle callbacks.
//! - Gate tenant API routes behind per-request JWT verification.
//! - Inject shared application state (`AppState`) into handlers.
//!
//! TLS is terminated by the hosting environment in front of this server.

pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
