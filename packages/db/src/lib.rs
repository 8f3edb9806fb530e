//! SurrealDB-backed store for the task queue.
//!
//! This crate provides the store connection, the pending-job queue, the
//! terminal-status registries and the worker control channel.
//!
//! # Features
//!
//! - `memory` (default): Use in-memory storage for testing
//! - `rocksdb`: Use RocksDB for persistent file-based storage
//! - `remote`: Connect to a shared SurrealDB server over WebSocket

mod connection;
mod queue;
mod registry;
mod schema;
pub mod repositories;

pub use connection::{Database, DbConfig, DbError, connect};
pub use queue::TaskQueue;
pub use registry::JobRegistry;
pub use schema::init_schema;
