//! OpenAPI 3.x specification parser

use anyhow::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::catalog::{ApiCatalog, AuthRequirement, Endpoint, EndpointParam, ParameterLocation};
use crate::models::HttpMethod;

/// Parse an OpenAPI spec file into a catalog
pub fn parse_openapi(spec_path: &Path) -> Result<ApiCatalog> {
    let content = fs::read_to_string(spec_path)?;

    // Determine if JSON or YAML
    let spec: Value = if spec_path.extension().map(|e| e == "json").unwrap_or(false) {
        serde_json::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };

    let mut catalog = ApiCatalog::default();

    if let Some(info) = spec.get("info") {
        catalog.title = info.get("title").and_then(|v| v.as_str()).map(String::from);
        catalog.version = info.get("version").and_then(|v| v.as_str()).map(String::from);
    }

    if let Some(servers) = spec.get("servers").and_then(|s| s.as_array()) {
        if let Some(first) = servers.first() {
            catalog.base_url = first.get("url").and_then(|v| v.as_str()).map(String::from);
        }
    }

    catalog.definitions = extract_definitions(&spec);

    let security_schemes = extract_security_schemes(&spec);
    let global_auth = spec
        .get("security")
        .map(|s| auth_from_requirement(s, &security_schemes))
        .unwrap_or(AuthRequirement::None);

    if let Some(paths) = spec.get("paths").and_then(|p| p.as_object()) {
        for (path, methods) in paths {
            let Some(methods_obj) = methods.as_object() else {
                continue;
            };
            for (method, operation) in methods_obj {
                // Skip non-HTTP method keys like "parameters"
                if !is_http_method(method) {
                    continue;
                }

                let mut endpoint = Endpoint::new(HttpMethod::parse(method), path.as_str());

                if let Some(op) = operation.as_object() {
                    endpoint.summary = op.get("summary").and_then(|v| v.as_str()).map(String::from);
                    endpoint.description = op
                        .get("description")
                        .and_then(|v| v.as_str())
                        .map(String::from);
                    endpoint.deprecated = op
                        .get("deprecated")
                        .and_then(|v| v.as_bool())
                        .unwrap_or(false);

                    if let Some(params) = op.get("parameters").and_then(|p| p.as_array()) {
                        for param in params {
                            if let Some(p) = parse_parameter(param) {
                                endpoint.parameters.push(p);
                            }
                        }
                    }

                    // Path-level parameters apply to every operation
                    if let Some(params) = methods.get("parameters").and_then(|p| p.as_array()) {
                        for param in params {
                            if let Some(p) = parse_parameter(param) {
                                if !endpoint.parameters.iter().any(|ep| ep.name == p.name) {
                                    endpoint.parameters.push(p);
                                }
                            }
                        }
                    }

                    endpoint.body_schema = op.get("requestBody").and_then(extract_body_schema);

                    endpoint.auth = match op.get("security") {
                        Some(security) => auth_from_requirement(security, &security_schemes),
                        None => global_auth.clone(),
                    };
                }

                catalog.endpoints.push(endpoint);
            }
        }
    }

    tracing::info!(
        endpoints = catalog.endpoints.len(),
        schemas = catalog.definitions.len(),
        "Loaded API catalog"
    );

    Ok(catalog)
}

fn is_http_method(s: &str) -> bool {
    matches!(
        s.to_lowercase().as_str(),
        "get" | "post" | "put" | "patch" | "delete"
    )
}

fn extract_definitions(spec: &Value) -> HashMap<String, Value> {
    let defs = spec
        .get("components")
        .and_then(|c| c.get("schemas"))
        .or_else(|| spec.get("definitions"))
        .or_else(|| spec.get("$defs"));

    let mut out = HashMap::new();
    if let Some(obj) = defs.and_then(|d| d.as_object()) {
        for (name, schema) in obj {
            out.insert(name.clone(), schema.clone());
        }
    }
    out
}

fn extract_security_schemes(spec: &Value) -> Vec<(String, AuthRequirement)> {
    let mut schemes = Vec::new();

    if let Some(sec_schemes) = spec
        .get("components")
        .and_then(|c| c.get("securitySchemes"))
        .and_then(|s| s.as_object())
    {
        for (name, scheme) in sec_schemes {
            let scheme_type = scheme.get("type").and_then(|t| t.as_str()).unwrap_or("");
            let auth = match scheme_type {
                "http" => {
                    let http_scheme = scheme.get("scheme").and_then(|s| s.as_str()).unwrap_or("");
                    match http_scheme {
                        "bearer" => AuthRequirement::Bearer,
                        "basic" => AuthRequirement::Basic,
                        other => AuthRequirement::Custom(other.to_string()),
                    }
                }
                other => AuthRequirement::Custom(other.to_string()),
            };
            schemes.push((name.clone(), auth));
        }
    }

    schemes
}

fn auth_from_requirement(security: &Value, schemes: &[(String, AuthRequirement)]) -> AuthRequirement {
    if let Some(arr) = security.as_array() {
        if arr.is_empty() {
            return AuthRequirement::None;
        }
        // Take the first declared requirement
        if let Some(first) = arr.first().and_then(|v| v.as_object()) {
            if let Some(scheme_name) = first.keys().next() {
                for (name, auth) in schemes {
                    if name == scheme_name {
                        return auth.clone();
                    }
                }
                return AuthRequirement::Custom(scheme_name.clone());
            }
        }
    }
    AuthRequirement::None
}

fn parse_parameter(param: &Value) -> Option<EndpointParam> {
    let name = param.get("name")?.as_str()?.to_string();
    let location = match param.get("in")?.as_str()? {
        "path" => ParameterLocation::Path,
        "query" => ParameterLocation::Query,
        "header" => ParameterLocation::Header,
        _ => return None,
    };

    let required = param
        .get("required")
        .and_then(|r| r.as_bool())
        .unwrap_or(location == ParameterLocation::Path);

    let param_type = param
        .get("schema")
        .and_then(|s| s.get("type"))
        .and_then(|t| t.as_str())
        .unwrap_or("string")
        .to_string();

    let description = param
        .get("description")
        .and_then(|d| d.as_str())
        .map(String::from);

    let default = param
        .get("schema")
        .and_then(|s| s.get("default"))
        .map(|d| match d {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });

    Some(EndpointParam {
        name,
        location,
        required,
        param_type,
        description,
        default,
    })
}

/// Pull the JSON request body schema out of an operation, raw
fn extract_body_schema(body: &Value) -> Option<Value> {
    let content = body.get("content").and_then(|c| c.as_object())?;
    let media = content
        .get("application/json")
        .or_else(|| content.values().next())?;
    media.get("schema").cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_openapi() {
        let yaml = r#"
openapi: 3.0.0
info:
  title: Test API
  version: 1.0.0
servers:
  - url: https://api.test.local
paths:
  /users:
    get:
      summary: List users
      parameters:
        - name: limit
          in: query
          schema:
            type: integer
            default: 20
      responses:
        200:
          description: OK
    post:
      summary: Create user
      requestBody:
        content:
          application/json:
            schema:
              $ref: '#/components/schemas/User'
      responses:
        201:
          description: Created
components:
  schemas:
    User:
      type: object
      properties:
        name:
          type: string
"#;

        let temp_dir = tempfile::tempdir().unwrap();
        let spec_path = temp_dir.path().join("openapi.yaml");
        std::fs::write(&spec_path, yaml).unwrap();

        let catalog = parse_openapi(&spec_path).unwrap();
        assert_eq!(catalog.title, Some("Test API".to_string()));
        assert_eq!(catalog.base_url, Some("https://api.test.local".to_string()));
        assert_eq!(catalog.endpoints.len(), 2);
        assert!(catalog.definitions.contains_key("User"));

        let get = &catalog.endpoints[0];
        assert_eq!(get.method, HttpMethod::GET);
        assert_eq!(get.parameters.len(), 1);
        assert_eq!(get.parameters[0].default.as_deref(), Some("20"));

        let post = &catalog.endpoints[1];
        assert!(post.body_schema.is_some());
        assert_eq!(post.key(), "POST /users");
    }

    #[test]
    fn test_path_parameters_default_required() {
        let json = r#"{
            "openapi": "3.0.0",
            "info": { "title": "T", "version": "1" },
            "paths": {
                "/items/{id}": {
                    "parameters": [
                        { "name": "id", "in": "path", "schema": { "type": "string" } }
                    ],
                    "get": { "responses": { "200": { "description": "OK" } } }
                }
            }
        }"#;

        let temp_dir = tempfile::tempdir().unwrap();
        let spec_path = temp_dir.path().join("openapi.json");
        std::fs::write(&spec_path, json).unwrap();

        let catalog = parse_openapi(&spec_path).unwrap();
        let ep = &catalog.endpoints[0];
        assert_eq!(ep.parameters.len(), 1);
        assert!(ep.parameters[0].required);
    }

    #[test]
    fn test_bearer_security_scheme() {
        let yaml = r#"
openapi: 3.0.0
info:
  title: T
  version: "1"
security:
  - bearerAuth: []
paths:
  /secure:
    get:
      responses:
        200:
          description: OK
components:
  securitySchemes:
    bearerAuth:
      type: http
      scheme: bearer
"#;

        let temp_dir = tempfile::tempdir().unwrap();
        let spec_path = temp_dir.path().join("openapi.yaml");
        std::fs::write(&spec_path, yaml).unwrap();

        let catalog = parse_openapi(&spec_path).unwrap();
        assert_eq!(catalog.endpoints[0].auth, AuthRequirement::Bearer);
    }
}
