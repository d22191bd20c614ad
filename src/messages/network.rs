//! Network messages - communication between App and Network layers

use serde_json::Value;
use std::collections::HashMap;

use crate::models::{Lookup, Request};

/// Commands sent from App layer to Network layer
#[derive(Debug, Clone)]
pub enum NetworkCommand {
    /// Execute an assembled HTTP request
    ExecuteRequest {
        id: u64,
        request: Request,
        /// Live variable dictionary for `{{token}}` substitution
        variables: HashMap<String, String>,
    },
    /// Execute a saved lookup; the response body must parse as JSON
    ExecuteLookup {
        id: u64,
        lookup: Lookup,
        variables: HashMap<String, String>,
    },
    /// Shutdown the network actor
    Shutdown,
}

/// Responses sent from Network layer to App layer
#[derive(Debug, Clone)]
pub enum NetworkResponse {
    /// HTTP request completed
    Completed {
        id: u64,
        status: u16,
        body: String,
        time_ms: u64,
    },
    /// Lookup completed with a parsed JSON body
    LookupCompleted {
        id: u64,
        status: u16,
        body: Value,
        time_ms: u64,
    },
    /// Network error, unreadable body, or an unparsable lookup response
    Error {
        id: u64,
        message: String,
        time_ms: u64,
    },
}

impl NetworkResponse {
    /// Get the request ID from the response
    pub fn id(&self) -> u64 {
        match self {
            NetworkResponse::Completed { id, .. } => *id,
            NetworkResponse::LookupCompleted { id, .. } => *id,
            NetworkResponse::Error { id, .. } => *id,
        }
    }
}
