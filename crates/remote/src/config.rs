use serde::{Deserialize, Serialize};

/// Settings for the font-serving API client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteConfig {
    /// Stylesheet endpoint the `family` query is appended to.
    pub stylesheet_url: String,
    /// Upper bound for each individual network call.
    pub request_timeout_ms: u64,
    /// Sent as `User-Agent`. Left unset the API serves plain TrueType, which
    /// needs no decoding.
    pub user_agent: Option<String>,
    /// Remote resolutions allowed in flight at once within a job.
    pub max_concurrent_fetches: usize,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            stylesheet_url: "https://fonts.googleapis.com/css2".to_string(),
            request_timeout_ms: 10_000,
            user_agent: None,
            max_concurrent_fetches: 6,
        }
    }
}
