use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{AccessToken, AuthError, Credentials, SearchError};

pub const DEFAULT_ATTEMPTS: u32 = 3;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Locale headers sent with every search. Prices come back in `currency`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Locale {
    pub site: String,
    pub language: String,
    pub currency: String,
    pub customer_id: String,
}

impl Default for Locale {
    fn default() -> Self {
        Self {
            site: "US".to_string(),
            language: "en".to_string(),
            currency: "USD".to_string(),
            customer_id: "0".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchBody {
    Json(Value),
    /// Body that was not valid JSON, kept verbatim for diagnostics.
    Text(String),
}

/// Status and body of one keyword search, whatever the status was.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub status: u16,
    pub body: SearchBody,
}

impl SearchOutcome {
    pub fn new(status: u16, raw: String) -> Self {
        let body = match serde_json::from_str(&raw) {
            Ok(json) => SearchBody::Json(json),
            Err(_) => SearchBody::Text(raw),
        };
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    /// Parsed payload of a successful search.
    pub fn payload(&self) -> Option<&Value> {
        match (&self.body, self.is_success()) {
            (SearchBody::Json(value), true) => Some(value),
            _ => None,
        }
    }
}

/// A source of keyword-search payloads.
pub trait KeywordSearch {
    fn keyword_search(&self, keyword: &str) -> Result<SearchOutcome, SearchError>;
}

/// Whether a response status is worth another attempt.
pub fn should_retry(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// Run `op` up to `attempts` times, stopping at the first result `retryable` rejects.
pub fn with_retries<T, E>(
    attempts: u32,
    mut op: impl FnMut(u32) -> Result<T, E>,
    retryable: impl Fn(&Result<T, E>) -> bool,
) -> Result<T, E> {
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        let result = op(attempt);
        if attempt >= attempts || !retryable(&result) {
            return result;
        }
        attempt += 1;
    }
}

pub struct DigikeyClient {
    http: Client,
    base_url: String,
    client_id: String,
    token: String,
    locale: Locale,
    attempts: u32,
}

impl DigikeyClient {
    /// Authenticate with `credentials` and return a client ready to search.
    pub fn connect(
        base_url: &str,
        credentials: &Credentials,
        locale: Locale,
        attempts: u32,
    ) -> Result<Self, AuthError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;
        let AccessToken { access_token, .. } =
            crate::fetch_access_token(&http, base_url, credentials)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id: credentials.client_id.clone(),
            token: access_token,
            locale,
            attempts: attempts.max(1),
        })
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    fn search_once(&self, keyword: &str) -> reqwest::Result<SearchOutcome> {
        let url = format!("{}{}", self.base_url, crate::KEYWORD_SEARCH_PATH);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .header("X-DIGIKEY-Client-Id", &self.client_id)
            .header("X-DIGIKEY-Locale-Site", &self.locale.site)
            .header("X-DIGIKEY-Locale-Language", &self.locale.language)
            .header("X-DIGIKEY-Locale-Currency", &self.locale.currency)
            .header("X-DIGIKEY-Customer-Id", &self.locale.customer_id)
            .json(&serde_json::json!({ "Keywords": keyword }))
            .send()?;

        let status = response.status().as_u16();
        let raw = response.text()?;
        Ok(SearchOutcome::new(status, raw))
    }
}

impl KeywordSearch for DigikeyClient {
    fn keyword_search(&self, keyword: &str) -> Result<SearchOutcome, SearchError> {
        let attempts = self.attempts;
        let result = with_retries(
            attempts,
            |attempt| {
                log::debug!("Searching '{keyword}' (attempt {attempt}/{attempts})");
                self.search_once(keyword)
            },
            |result| match result {
                Ok(outcome) if should_retry(outcome.status) => {
                    log::warn!("Search for '{keyword}' returned {}", outcome.status);
                    true
                }
                Ok(_) => false,
                Err(e) => {
                    log::warn!("Search for '{keyword}' failed: {e}");
                    true
                }
            },
        );

        result.map_err(|source| SearchError::Transport {
            keyword: keyword.to_string(),
            attempts,
            source,
        })
    }
}
