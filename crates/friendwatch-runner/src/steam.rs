//! Steam Web API friend-count source.
//!
//! Calls `ISteamUser/GetFriendList/v0001` once per account and classifies
//! the response:
//!
//! | Response | Outcome |
//! |----------|---------|
//! | 200 with JSON body | `Count(len(friendslist.friends))` |
//! | 403 | `Unavailable(Private)` |
//! | any other status | `Unavailable(Error)` |
//! | transport failure, timeout, non-JSON body | `Unavailable(Error)` |

use friendwatch_core::FriendSource;
use friendwatch_types::{Account, FetchOutcome, UnavailableReason};
use reqwest::StatusCode;

use crate::config::SteamConfig;

/// Friend-count source backed by the Steam Web API.
pub struct SteamClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl SteamClient {
    /// Create a Steam client sharing the given HTTP client.
    ///
    /// The HTTP client's own timeout bounds each request.
    pub fn new(client: reqwest::Client, config: &SteamConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    async fn request(&self, account: &Account) -> Result<FetchOutcome, reqwest::Error> {
        let url = format!("{}/ISteamUser/GetFriendList/v0001/", self.api_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("steamid", account.id.as_str()),
                ("relationship", "friend"),
            ])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Ok(classify_status(status));
        }

        let body = response.text().await?;
        Ok(parse_friend_list(&body))
    }
}

impl FriendSource for SteamClient {
    async fn fetch(&self, account: &Account) -> FetchOutcome {
        // The request URL carries the API key, so transport errors are
        // reported without it.
        match self.request(account).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_timeout() => FetchOutcome::error("request timed out"),
            Err(e) => FetchOutcome::error(format!("request failed: {}", e.without_url())),
        }
    }
}

/// Outcome for a non-200 status.
fn classify_status(status: StatusCode) -> FetchOutcome {
    if status == StatusCode::FORBIDDEN {
        FetchOutcome::Unavailable(UnavailableReason::Private)
    } else {
        FetchOutcome::error(format!("API error {status}"))
    }
}

/// Count the entries of `friendslist.friends` in a 200 response body.
///
/// A JSON body without the list means no friends; anything that is not
/// JSON, or a list of the wrong shape, is an error.
fn parse_friend_list(body: &str) -> FetchOutcome {
    let json: serde_json::Value = match serde_json::from_str(body) {
        Ok(json) => json,
        Err(e) => return FetchOutcome::error(format!("malformed response: {e}")),
    };

    match json.get("friendslist").and_then(|list| list.get("friends")) {
        None => FetchOutcome::Count(0),
        Some(serde_json::Value::Array(friends)) => {
            FetchOutcome::Count(u64::try_from(friends.len()).unwrap_or(u64::MAX))
        }
        Some(_) => FetchOutcome::error("malformed response: friends is not a list"),
    }
}
