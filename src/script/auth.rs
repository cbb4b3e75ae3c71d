use std::collections::BTreeMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::config::{AuthSpec, CustomHeader};

const AUTHORIZATION: &str = "Authorization";

impl AuthSpec {
    /// Flattens the auth variant into request headers. Variants with missing
    /// credentials contribute nothing.
    #[must_use]
    pub fn headers(&self) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        match self {
            AuthSpec::None => {}
            AuthSpec::Bearer { token } => {
                if !token.is_empty() {
                    headers.insert(AUTHORIZATION.to_owned(), format!("Bearer {}", token));
                }
            }
            AuthSpec::ApiKey { header, value } => {
                if !value.is_empty() {
                    let name = if header.trim().is_empty() {
                        "X-API-Key"
                    } else {
                        header.trim()
                    };
                    headers.insert(name.to_owned(), value.clone());
                }
            }
            AuthSpec::Basic { username, password } => {
                if !username.is_empty() && !password.is_empty() {
                    let encoded = STANDARD.encode(format!("{}:{}", username, password));
                    headers.insert(AUTHORIZATION.to_owned(), format!("Basic {}", encoded));
                }
            }
        }
        headers
    }
}

/// Auth headers overlaid with custom headers; custom headers win on collision.
#[must_use]
pub fn merge_headers(auth: &AuthSpec, custom: &[CustomHeader]) -> BTreeMap<String, String> {
    let mut headers = auth.headers();
    for header in custom {
        if header.key.is_empty() || header.value.is_empty() {
            continue;
        }
        headers.insert(header.key.clone(), header.value.clone());
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_auth_is_base64_encoded() -> Result<(), String> {
        let auth = AuthSpec::Basic {
            username: "user".to_owned(),
            password: "pass".to_owned(),
        };
        let headers = auth.headers();
        if headers.get("Authorization").map(String::as_str) != Some("Basic dXNlcjpwYXNz") {
            return Err(format!("Unexpected headers: {:?}", headers));
        }
        Ok(())
    }

    #[test]
    fn incomplete_credentials_produce_no_headers() -> Result<(), String> {
        let cases = [
            AuthSpec::Bearer {
                token: String::new(),
            },
            AuthSpec::ApiKey {
                header: "X-Key".to_owned(),
                value: String::new(),
            },
            AuthSpec::Basic {
                username: "user".to_owned(),
                password: String::new(),
            },
        ];
        for auth in cases {
            if !auth.headers().is_empty() {
                return Err(format!("Expected no headers for {:?}", auth));
            }
        }
        Ok(())
    }

    #[test]
    fn custom_headers_override_auth_headers() -> Result<(), String> {
        let auth = AuthSpec::Bearer {
            token: "from-auth".to_owned(),
        };
        let custom = vec![
            CustomHeader {
                key: "Authorization".to_owned(),
                value: "Bearer from-custom".to_owned(),
            },
            CustomHeader {
                key: "X-Ignored".to_owned(),
                value: String::new(),
            },
        ];
        let headers = merge_headers(&auth, &custom);
        if headers.get("Authorization").map(String::as_str) != Some("Bearer from-custom") {
            return Err(format!("Unexpected headers: {:?}", headers));
        }
        if headers.contains_key("X-Ignored") {
            return Err("Expected empty custom header to be skipped".to_owned());
        }
        Ok(())
    }
}
