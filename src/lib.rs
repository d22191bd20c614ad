//! # Schemaquest
//!
//! A schema-aware terminal API client. Loads an OpenAPI description,
//! turns each operation's parameters and request body schema into a
//! flat, navigable form, executes the assembled request, and lets the
//! operator walk the JSON response as a collapsible tree - capturing
//! values into `{{variables}}` and reusable lookups along the way.
//!
//! ## Features
//! - Schema-driven request forms (objects, arrays, enums, nullable
//!   unions, date/date-time formats)
//! - Per-type editors: boolean/enum cycling, filtered numeric entry,
//!   segment-based date editing
//! - `{{variable}}` references with live display resolution
//! - Saved lookups: re-run a request and pick values out of its body
//! - Response tree with incremental search and value capture
//! - Request history with field-level replay
//! - cURL export
//!
//! ## Architecture
//! Actor-based with channels:
//! - UI Layer (Ratatui) - synchronous
//! - App Layer (State machine)
//! - Network Layer (Tokio runtime)

pub mod app;
pub mod catalog;
pub mod constants;
pub mod curl;
pub mod form;
pub mod messages;
pub mod models;
pub mod network;
pub mod schema;
pub mod storage;
pub mod tree;
pub mod ui;
pub mod vars;

// Re-export commonly used types
pub use app::{AppActor, AppState};
pub use catalog::{ApiCatalog, Endpoint};
pub use curl::to_curl;
pub use form::{FormSession, NavTarget};
pub use messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};
pub use models::{HttpMethod, Lookup, Request, VariableSet};
pub use network::NetworkActor;
pub use schema::{build_fields, FieldDescriptor, Resolver, SchemaNode};
pub use storage::Storage;
