//! Application constants
//!
//! Centralized location for magic strings and configuration defaults.

/// Default base URL used when the catalog declares no server
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Maximum schema nesting depth expanded into form fields.
/// Properties below this depth become opaque object/array leaves.
pub const MAX_FIELD_DEPTH: usize = 2;

/// Recursion guard for schema resolution ($ref cycles fall soft to `any`)
pub const MAX_RESOLVE_DEPTH: usize = 16;

/// Calendar bounds for the date/date-time editors
pub const YEAR_MIN: i32 = 1900;
pub const YEAR_MAX: i32 = 2100;

/// Maximum number of request history entries kept
pub const MAX_HISTORY: usize = 50;

/// Application name
#[allow(dead_code)]
pub const APP_NAME: &str = "Schemaquest";

/// Application version
#[allow(dead_code)]
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
