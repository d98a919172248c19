//! Task service library: route dispatching, a JSON document store and the
//! HTTP surface that ties them together.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod store;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use store::DocumentStore;
