//! HTTP client wrapper - executes requests and formats responses

use base64::Engine;
use std::collections::HashMap;
use std::time::Instant;

use crate::messages::NetworkResponse;
use crate::models::{AuthType, HttpMethod, Lookup, Request};
use crate::vars;

/// Build a request with `{{token}}` substitution applied
fn build_request(
    client: &reqwest::Client,
    request: &Request,
    variables: &HashMap<String, String>,
) -> reqwest::RequestBuilder {
    let url = vars::resolve_tokens(&request.url, variables);

    let mut req_builder = match request.method {
        HttpMethod::GET => client.get(&url),
        HttpMethod::POST => client.post(&url),
        HttpMethod::PUT => client.put(&url),
        HttpMethod::PATCH => client.patch(&url),
        HttpMethod::DELETE => client.delete(&url),
    };

    for header in &request.headers {
        if header.enabled {
            let value = vars::resolve_tokens(&header.value, variables);
            req_builder = req_builder.header(&header.key, value);
        }
    }

    match &request.auth {
        AuthType::Bearer(token) => {
            let token = vars::resolve_tokens(token, variables);
            req_builder = req_builder.header("Authorization", format!("Bearer {}", token));
        }
        AuthType::Basic { username, password } => {
            let credentials = format!(
                "{}:{}",
                vars::resolve_tokens(username, variables),
                vars::resolve_tokens(password, variables)
            );
            let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
            req_builder = req_builder.header("Authorization", format!("Basic {}", encoded));
        }
        AuthType::None => {}
    }

    if request.method.has_body() && !request.body.is_empty() {
        let body = vars::resolve_tokens(&request.body, variables);
        req_builder = req_builder.body(body);
    }

    req_builder
}

/// Execute an HTTP request and return the response
pub async fn execute_request(
    client: &reqwest::Client,
    request: Request,
    variables: HashMap<String, String>,
    request_id: u64,
) -> NetworkResponse {
    let start = Instant::now();
    let req_builder = build_request(client, &request, &variables);

    let result = req_builder.send().await;
    let elapsed = start.elapsed().as_millis() as u64;

    match result {
        Ok(resp) => {
            let status = resp.status().as_u16();
            match resp.text().await {
                Ok(body) => {
                    let formatted =
                        if let Ok(json) = serde_json::from_str::<serde_json::Value>(&body) {
                            serde_json::to_string_pretty(&json).unwrap_or(body)
                        } else {
                            body
                        };
                    NetworkResponse::Completed {
                        id: request_id,
                        status,
                        body: formatted,
                        time_ms: elapsed,
                    }
                }
                Err(e) => NetworkResponse::Error {
                    id: request_id,
                    message: format!("Error reading body: {}", e),
                    time_ms: elapsed,
                },
            }
        }
        Err(e) => NetworkResponse::Error {
            id: request_id,
            message: connect_error_message(&e),
            time_ms: elapsed,
        },
    }
}

/// Execute a saved lookup; its response body must be JSON so the value
/// path can be applied to it
pub async fn execute_lookup(
    client: &reqwest::Client,
    lookup: Lookup,
    variables: HashMap<String, String>,
    request_id: u64,
) -> NetworkResponse {
    let request = Request {
        method: lookup.method,
        url: lookup.url.clone(),
        headers: Request::default().headers,
        body: lookup.body.clone(),
        auth: AuthType::None,
    };

    let start = Instant::now();
    let result = build_request(client, &request, &variables).send().await;
    let elapsed = start.elapsed().as_millis() as u64;

    match result {
        Ok(resp) => {
            let status = resp.status().as_u16();
            match resp.text().await {
                Ok(body) if body.trim().is_empty() => NetworkResponse::Error {
                    id: request_id,
                    message: format!("Lookup '{}' returned an empty body", lookup.name),
                    time_ms: elapsed,
                },
                Ok(body) => match serde_json::from_str::<serde_json::Value>(&body) {
                    Ok(json) => NetworkResponse::LookupCompleted {
                        id: request_id,
                        status,
                        body: json,
                        time_ms: elapsed,
                    },
                    Err(e) => NetworkResponse::Error {
                        id: request_id,
                        message: format!("Lookup '{}' body is not JSON: {}", lookup.name, e),
                        time_ms: elapsed,
                    },
                },
                Err(e) => NetworkResponse::Error {
                    id: request_id,
                    message: format!("Error reading body: {}", e),
                    time_ms: elapsed,
                },
            }
        }
        Err(e) => NetworkResponse::Error {
            id: request_id,
            message: connect_error_message(&e),
            time_ms: elapsed,
        },
    }
}

fn connect_error_message(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timed out (30s)".to_string()
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else {
        format!("Request failed: {}", e)
    }
}

/// Create an HTTP client with default configuration
pub fn create_client() -> reqwest::Client {
    use std::time::Duration;

    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
