//! Schema worker communication.
//!
//! The worker is an external process that knows how to introspect a specific
//! storage engine. It is spoken to over NDJSON on stdin/stdout; each request
//! carries an ID so several requests can be in flight at once.
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │ WorkerProvider                            │
//! │   └─ WorkerClient (tokio)                 │
//! │        stdin (NDJSON) │ stdout (NDJSON)   │
//! └───────────────────────┼───────────────────┘
//!                         ▼
//!            schema worker (child process)
//! ```

mod client;
mod error;
pub mod protocol;

pub use client::WorkerClient;
pub use error::{WorkerError, WorkerResult};
