//! API catalog - loads an OpenAPI description into endpoint and schema
//! objects the form layer consumes
//!
//! The loader stops at "resolved enough": request body schemas stay as
//! raw JSON values (including `$ref`s) and are only canonicalized by the
//! schema resolver when an endpoint's form is actually built.

pub mod openapi;

use serde_json::Value;
use std::collections::HashMap;

use crate::models::HttpMethod;

pub use openapi::parse_openapi;

/// Authentication requirement declared for an endpoint
#[derive(Clone, Debug, PartialEq)]
pub enum AuthRequirement {
    None,
    Bearer,
    Basic,
    Custom(String),
}

impl AuthRequirement {
    pub fn as_str(&self) -> &str {
        match self {
            AuthRequirement::None => "None",
            AuthRequirement::Bearer => "Bearer",
            AuthRequirement::Basic => "Basic",
            AuthRequirement::Custom(s) => s,
        }
    }
}

/// Where a declared parameter is sent
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
}

/// A declared endpoint parameter; becomes a base form field
#[derive(Clone, Debug)]
pub struct EndpointParam {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub param_type: String,
    pub description: Option<String>,
    pub default: Option<String>,
}

/// One operation of the API description
#[derive(Clone, Debug)]
pub struct Endpoint {
    pub method: HttpMethod,
    /// URL path, e.g. `/api/users/{id}`
    pub path: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub parameters: Vec<EndpointParam>,
    /// Raw request body schema, if the operation declares one
    pub body_schema: Option<Value>,
    pub auth: AuthRequirement,
    pub deprecated: bool,
}

impl Endpoint {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Endpoint {
            method,
            path: path.into(),
            summary: None,
            description: None,
            parameters: Vec::new(),
            body_schema: None,
            auth: AuthRequirement::None,
            deprecated: false,
        }
    }

    /// Stable identity used for field-model caching and history
    pub fn key(&self) -> String {
        format!("{} {}", self.method.as_str(), self.path)
    }
}

/// A loaded API description
#[derive(Clone, Debug, Default)]
pub struct ApiCatalog {
    pub title: Option<String>,
    pub version: Option<String>,
    pub base_url: Option<String>,
    pub endpoints: Vec<Endpoint>,
    /// `components.schemas` (or 2.0-style `definitions`) by name, raw
    pub definitions: HashMap<String, Value>,
}
