//! Credentials attached to every request

use reqwest::RequestBuilder;

/// Header carrying the API key on OSDI APIs
pub const DEFAULT_API_KEY_HEADER: &str = "OSDI-API-Token";

/// How requests authenticate
#[derive(Clone, Default, PartialEq, Eq)]
pub enum AuthConfig {
    /// Anonymous requests
    #[default]
    None,

    /// API key sent in a request header
    ApiKey {
        /// Header name
        header_name: String,
        /// The API key value
        value: String,
    },
}

impl AuthConfig {
    /// API key sent in the given header
    pub fn api_key_header(header_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::ApiKey {
            header_name: header_name.into(),
            value: value.into(),
        }
    }

    /// API key in the standard OSDI header
    pub fn osdi(token: impl Into<String>) -> Self {
        Self::api_key_header(DEFAULT_API_KEY_HEADER, token)
    }

    /// True when requests carry credentials
    pub fn is_configured(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Attach the credentials to a request
    pub fn apply(&self, req: RequestBuilder) -> RequestBuilder {
        match self {
            Self::None => req,
            Self::ApiKey { header_name, value } => req.header(header_name.as_str(), value),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::ApiKey { header_name, .. } => f
                .debug_struct("ApiKey")
                .field("header_name", header_name)
                .field("value", &"<redacted>")
                .finish(),
        }
    }
}
