//! Client for the task service HTTP API, plus the CSV import helpers used by
//! the `task-import` binary.

pub mod client;
pub mod import;

pub use client::{ClientError, NewTask, Task, TaskClient, TaskQuery, TaskUpdate};
