use vodsync_catalog::types::{Provider, ProviderKind};

use crate::error::CredentialError;

/// Validated connection details for one provider.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    /// Validate a provider descriptor before any network call.
    ///
    /// Xtream providers need a username and password; M3U providers only
    /// need the playlist URL.
    pub fn from_provider(provider: &Provider) -> Result<Self, CredentialError> {
        validate_provider_id(&provider.id)?;

        let base_url = provider.base_url.trim();
        if base_url.is_empty() {
            return Err(CredentialError::MissingUrl(provider.id.clone()));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(CredentialError::InvalidUrl {
                provider: provider.id.clone(),
                url: base_url.to_string(),
            });
        }

        let username = non_blank(provider.username.as_deref());
        let password = non_blank(provider.password.as_deref());

        if provider.kind == ProviderKind::Xtream {
            if username.is_none() {
                return Err(CredentialError::MissingField {
                    provider: provider.id.clone(),
                    field: "username",
                });
            }
            if password.is_none() {
                return Err(CredentialError::MissingField {
                    provider: provider.id.clone(),
                    field: "password",
                });
            }
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            username,
            password,
        })
    }

    /// Username, or an empty string for credential-less providers.
    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or_default()
    }

    pub fn password(&self) -> &str {
        self.password.as_deref().unwrap_or_default()
    }
}

/// Provider ids are embedded in provider-unique ids (`movie:{id}:{native}`),
/// so they must not contain the `:` separator or whitespace.
pub fn validate_provider_id(id: &str) -> Result<(), CredentialError> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(CredentialError::InvalidId(id.to_string()))
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
