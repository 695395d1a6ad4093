//! Server core functionality
//!
//! This module contains the server bootstrap, shared request state,
//! and router construction.

pub mod core;
pub mod router;
pub mod state;

pub use self::core::Server;
pub use router::build_router;
pub use state::AppState;
