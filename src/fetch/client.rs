use async_trait::async_trait;
use reqwest::{Request, Response};

/// Anything that can send a prepared [`Request`]. Wrappers stack on top of
/// each other to add headers before the innermost client sends.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
