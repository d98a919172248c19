//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path?query, decoded body)
//!     → router.rs (scan routes in declaration order)
//!     → matcher.rs (compare method-agnostic path shape, capture segments)
//!     → Return: handler response or "Endpoint not found"
//!
//! Route Compilation (at startup):
//!     (method, "/tasks/:id/complete", handler)[]
//!     → Compile patterns into segment matchers
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (segment comparison only)
//! - Deterministic: same input always matches same route
//! - First match wins (declaration order)

pub mod matcher;
pub mod router;

pub use matcher::{PathMatch, PathPattern, PatternError};
pub use router::{Handler, MatchedRoute, Payload, RequestContext, Router};
