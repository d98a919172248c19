//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace, timeout layers)
//!     → request.rs (bounded body read, JSON payload decode)
//!     → routing dispatcher (first matching task route)
//!     → tasks.rs (validate, call the document store)
//!     → response.rs (JSON / empty bodies, error mapping)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod tasks;

pub use request::X_REQUEST_ID;
pub use response::ApiError;
pub use server::HttpServer;
pub use tasks::{task_routes, TaskState};
