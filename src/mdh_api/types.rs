use std::fmt;

/// MyDataHelps integration error type
///
/// Every component boundary returns this error instead of panicking. The
/// caller decides locally whether a failure aborts the run or is logged
/// and skipped.
#[derive(Debug)]
pub enum MdhError {
    /// Required configuration or credentials could not be resolved
    Config(String),
    /// The client assertion could not be signed (bad key or algorithm)
    Signing(String),
    /// The signed assertion could not be exchanged for an access token
    TokenExchange(String),
    /// API request failed (network, HTTP, or response parsing error)
    Api(ApiError),
    /// Secret store lookup failed
    Secret(crate::secrets::SecretError),
}

impl fmt::Display for MdhError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MdhError::Config(msg) => write!(f, "Configuration error: {}", msg),
            MdhError::Signing(msg) => write!(f, "Assertion signing failed: {}", msg),
            MdhError::TokenExchange(msg) => write!(f, "Token exchange failed: {}", msg),
            MdhError::Api(err) => write!(f, "API error: {}", err),
            MdhError::Secret(err) => write!(f, "Secret store error: {}", err),
        }
    }
}

impl std::error::Error for MdhError {}

impl From<ApiError> for MdhError {
    fn from(err: ApiError) -> Self {
        MdhError::Api(err)
    }
}

impl From<crate::secrets::SecretError> for MdhError {
    fn from(err: crate::secrets::SecretError) -> Self {
        MdhError::Secret(err)
    }
}

impl From<crate::config::ConfigError> for MdhError {
    fn from(err: crate::config::ConfigError) -> Self {
        MdhError::Config(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for MdhError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        MdhError::Signing(err.to_string())
    }
}

/// API-specific errors
#[derive(Debug)]
pub enum ApiError {
    /// Network error (connection, timeout, DNS, TLS)
    Network(String),
    /// Any response other than HTTP 200
    Http { status: u16, message: String },
    /// Failed to parse response
    Parse(String),
    /// Request building failed
    Request(String),
}

impl ApiError {
    /// HTTP status of the failed response, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(msg) => write!(f, "Network error: {}", msg),
            ApiError::Http { status, message } => {
                write!(f, "HTTP {} error: {}", status, message)
            }
            ApiError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ApiError::Request(msg) => write!(f, "Request error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Network("Request timeout".to_string())
        } else if err.is_connect() {
            ApiError::Network(format!("Connection failed: {}", err))
        } else if err.is_builder() {
            ApiError::Request(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_display_includes_status() {
        let err = MdhError::Api(ApiError::Http {
            status: 404,
            message: "Not Found".to_string(),
        });
        let rendered = err.to_string();
        assert!(rendered.contains("404"));
        assert!(rendered.contains("Not Found"));
    }

    #[test]
    fn test_api_error_status() {
        let http = ApiError::Http {
            status: 500,
            message: String::new(),
        };
        assert_eq!(http.status(), Some(500));
        assert_eq!(ApiError::Network("down".to_string()).status(), None);
    }

    #[test]
    fn test_config_error_converts_to_config_variant() {
        let err: MdhError = crate::config::ConfigError::MissingVariable {
            name: "RKS_PROJECT_ID".to_string(),
        }
        .into();
        assert!(matches!(err, MdhError::Config(ref msg) if msg.contains("RKS_PROJECT_ID")));
    }
}
