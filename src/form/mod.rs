//! Form layer - flat value store with bidirectional JSON serialization,
//! the navigation/edit state machine, and the per-type editors

pub mod editors;
pub mod session;
pub mod values;

pub use session::{ActivateOutcome, BaseField, FormMode, FormSession, NavTarget};
