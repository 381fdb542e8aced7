/// Errors that can occur while fetching a provider feed.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Provider rejected the credentials (HTTP {0})")]
    Unauthorized(u16),

    #[error("Server error (HTTP {status}) for {action}")]
    Http { status: u16, action: String },

    #[error("Empty response body for {0}")]
    EmptyBody(String),

    #[error("Malformed response for {action}: {message}")]
    Malformed { action: String, message: String },

    #[error("Credential error: {0}")]
    Credentials(#[from] CredentialError),

}

/// Missing or malformed provider credentials. Raised before any network call.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Provider '{0}' has no base URL")]
    MissingUrl(String),

    #[error("Provider '{provider}' has an invalid URL '{url}': expected http:// or https://")]
    InvalidUrl { provider: String, url: String },

    #[error("Provider '{provider}' is missing {field}")]
    MissingField {
        provider: String,
        field: &'static str,
    },

    #[error("Invalid provider id '{0}': use letters, digits, '-' or '_'")]
    InvalidId(String),
}
