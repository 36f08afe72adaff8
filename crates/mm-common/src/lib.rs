//! Shared plumbing for the membership matrix workspace.

pub mod logging;

pub use logging::{init_logging, LogFormat};
