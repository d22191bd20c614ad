use crate::models::{AuthType, Request};

/// Format a request as a copyable cURL command
pub fn to_curl(request: &Request) -> String {
    let mut parts = vec!["curl".to_string()];

    if request.method != crate::models::HttpMethod::GET {
        parts.push(format!("-X {}", request.method.as_str()));
    }

    parts.push(format!("'{}'", request.url));

    for header in &request.headers {
        if header.enabled {
            parts.push(format!("-H '{}: {}'", header.key, header.value));
        }
    }

    match &request.auth {
        AuthType::Bearer(token) => {
            parts.push(format!("-H 'Authorization: Bearer {}'", token));
        }
        AuthType::Basic { username, password } => {
            parts.push(format!("-u '{}:{}'", username, password));
        }
        AuthType::None => {}
    }

    if !request.body.is_empty() {
        parts.push(format!("-d '{}'", request.body.replace('\'', "'\\''")));
    }

    parts.join(" \\\n  ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Header, HttpMethod};

    #[test]
    fn test_render_get_without_method_flag() {
        let request = Request {
            method: HttpMethod::GET,
            url: "https://api.example.com/users".to_string(),
            headers: vec![],
            body: String::new(),
            auth: AuthType::None,
        };
        assert_eq!(to_curl(&request), "curl 'https://api.example.com/users'");
    }

    #[test]
    fn test_render_post_with_body_and_headers() {
        let request = Request {
            method: HttpMethod::POST,
            url: "https://api.example.com/users".to_string(),
            headers: vec![
                Header::new("Content-Type", "application/json"),
                Header {
                    key: "X-Debug".to_string(),
                    value: "1".to_string(),
                    enabled: false,
                },
            ],
            body: r#"{"name":"it's"}"#.to_string(),
            auth: AuthType::Bearer("tok".to_string()),
        };

        let curl = to_curl(&request);
        assert!(curl.contains("-X POST"));
        assert!(curl.contains("-H 'Content-Type: application/json'"));
        // Disabled headers are skipped
        assert!(!curl.contains("X-Debug"));
        assert!(curl.contains("-H 'Authorization: Bearer tok'"));
        // Single quotes in the body are shell-escaped
        assert!(curl.contains(r#"{"name":"it'\''s"}"#));
    }
}
