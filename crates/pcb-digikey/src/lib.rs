pub mod auth;
mod error;
pub mod search;

pub use auth::{AccessToken, Credentials, fetch_access_token};
pub use error::{AuthError, SearchError};
pub use search::{
    DEFAULT_ATTEMPTS, DigikeyClient, KeywordSearch, Locale, SearchBody, SearchOutcome,
    should_retry, with_retries,
};

const AUTH_PATH: &str = "/v1/oauth2/token";
const KEYWORD_SEARCH_PATH: &str = "/products/v4/search/keyword";

/// Base URL of the Digi-Key API, overridable with `DIGIKEY_API_URL`.
pub fn get_api_base_url() -> String {
    if let Ok(url) = std::env::var("DIGIKEY_API_URL") {
        return url.trim_end_matches('/').to_string();
    }

    "https://api.digikey.com".to_string()
}
