use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// HTTP Method enum
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    PATCH,
    DELETE,
}

impl HttpMethod {
    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::DELETE => "DELETE",
        }
    }

    /// Parse from a catalog method string, defaulting to GET
    pub fn parse(s: &str) -> HttpMethod {
        match s.to_uppercase().as_str() {
            "POST" => HttpMethod::POST,
            "PUT" => HttpMethod::PUT,
            "PATCH" => HttpMethod::PATCH,
            "DELETE" => HttpMethod::DELETE,
            _ => HttpMethod::GET,
        }
    }

    pub fn has_body(&self) -> bool {
        matches!(self, HttpMethod::POST | HttpMethod::PUT | HttpMethod::PATCH)
    }
}

/// Authentication type
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub enum AuthType {
    #[default]
    None,
    Bearer(String),
    Basic {
        username: String,
        password: String,
    },
}

/// HTTP Header
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Header {
    pub key: String,
    pub value: String,
    pub enabled: bool,
}

impl Header {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Header {
            key: key.into(),
            value: value.into(),
            enabled: true,
        }
    }
}

/// A single HTTP request, fully assembled and ready for execution
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Request {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<Header>,
    pub body: String,
    pub auth: AuthType,
}

impl Default for Request {
    fn default() -> Self {
        Request {
            method: HttpMethod::GET,
            url: String::new(),
            headers: vec![
                Header::new("Content-Type", "application/json"),
                Header::new("Accept", "application/json"),
            ],
            body: String::new(),
            auth: AuthType::None,
        }
    }
}

/// A named dictionary of `{{token}}` variables
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VariableSet {
    pub name: String,
    pub variables: HashMap<String, String>,
}

impl VariableSet {
    pub fn new(name: impl Into<String>) -> Self {
        VariableSet {
            name: name.into(),
            variables: HashMap::new(),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.variables.get(key)
    }
}

/// A saved lookup: a request plus a path pair for extracting pickable values
/// from its response body
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Lookup {
    pub name: String,
    pub method: HttpMethod,
    pub url: String,
    /// Static JSON body sent with the lookup request (empty = none)
    #[serde(default)]
    pub body: String,
    /// Lookup path yielding the values to pick from, e.g. `fields[].id`
    pub value_path: String,
    /// Optional parallel path yielding display labels
    #[serde(default)]
    pub label_path: Option<String>,
}

/// Response from HTTP request
#[derive(Clone, Debug)]
pub struct Response {
    pub status_code: Option<u16>,
    pub body: String,
    pub time_ms: u64,
}

impl Default for Response {
    fn default() -> Self {
        Response {
            status_code: None,
            body: String::from(
                r#"Quick Reference:
────────────────────────────
  Tab     Next panel
  j/k ↑↓  Move focus
  Enter   Edit field / toggle group
  s       Submit request
  t       Open response tree
  v       Insert variable
  l       Run lookup
  ?       Full help
  q       Quit
────────────────────────────
Pick an endpoint, fill the form, submit."#,
            ),
            time_ms: 0,
        }
    }
}

/// History entry - carries the flattened body-field snapshot for replay
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub method: HttpMethod,
    pub url: String,
    /// Stable key of the endpoint this request was built from
    pub endpoint_key: String,
    pub status_code: Option<u16>,
    pub time_ms: u64,
    /// Flat `full_key -> raw string` snapshot of the form at submit time
    #[serde(default)]
    pub fields: HashMap<String, String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}
