//! godfs - date-partitioned HTTP file storage.
//!
//! `POST /upload` stores a multipart file under `/YYYY/MM/DD/` with a
//! generated name; `GET /<path>` streams it back.

pub mod config;
pub mod error;
pub mod middleware;
pub mod server;
pub mod storage;
pub mod transfer;
pub mod utils;

pub use config::{Cli, ServerConfig};
pub use server::{AppState, Server, build_router};
