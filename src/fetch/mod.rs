mod basic;
mod client;
pub mod auth;
#[cfg(test)]
pub(crate) mod testing;

pub use auth::ApiKey;
pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::Result;

/// Header carrying the developer key the upstream API expects on every call.
pub const DEV_API_KEY_HEADER: &str = "Z-Dev-ApiKey";
/// Header carrying the per-session token returned by login.
pub const AUTH_TOKEN_HEADER: &str = "Z-Auth-Token";

/// Client used to reach the upstream API: a [`BasicClient`] that sends the
/// developer key and the mobile app user agent on every request.
pub type UpstreamClient = ApiKey<ApiKey<BasicClient>>;

pub fn upstream_client(api_key: &str, user_agent: &str) -> Result<UpstreamClient> {
    let keyed = ApiKey::new(BasicClient::new()?, DEV_API_KEY_HEADER, api_key)?;
    ApiKey::new(keyed, "User-Agent", user_agent)
}
