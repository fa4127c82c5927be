use reqwest::blocking::Client;
use serde::Deserialize;

use crate::AuthError;

pub const CLIENT_ID_VAR: &str = "DIGIKEY_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "DIGIKEY_CLIENT_SECRET";

/// OAuth2 client credentials issued for a Digi-Key API application.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build credentials from an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AuthError> {
        let read = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(AuthError::MissingCredential(name))
        };

        Ok(Self {
            client_id: read(CLIENT_ID_VAR)?,
            client_secret: read(CLIENT_SECRET_VAR)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Exchange client credentials for a bearer token (`grant_type=client_credentials`).
pub fn fetch_access_token(
    client: &Client,
    base_url: &str,
    credentials: &Credentials,
) -> Result<AccessToken, AuthError> {
    let url = format!("{base_url}{}", crate::AUTH_PATH);
    log::debug!("Requesting access token from {url}");

    let response = client
        .post(&url)
        .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
        .form(&[("grant_type", "client_credentials")])
        .send()?;

    let status = response.status();
    let body = response.text()?;
    if !status.is_success() {
        return Err(AuthError::Rejected {
            status: status.as_u16(),
            body,
        });
    }

    let token = parse_token(&body)?;
    log::debug!(
        "Received {} token valid for {}s",
        token.token_type.as_deref().unwrap_or("bearer"),
        token.expires_in.unwrap_or_default()
    );
    Ok(token)
}

fn parse_token(body: &str) -> Result<AccessToken, AuthError> {
    let token: AccessToken =
        serde_json::from_str(body).map_err(|e| AuthError::MalformedResponse(e.to_string()))?;
    if token.access_token.is_empty() {
        return Err(AuthError::MalformedResponse(
            "access_token is empty".to_string(),
        ));
    }
    Ok(token)
}
