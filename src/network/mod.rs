//! Network layer - HTTP request and lookup execution
//!
//! The Network actor receives execution commands and sends back responses.

pub mod actor;
pub mod client;

pub use actor::NetworkActor;
