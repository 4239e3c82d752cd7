use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, Request, Response};
use tracing::{debug, info, warn};

use crate::fetch::{AUTH_TOKEN_HEADER, HttpClient};
use crate::services::school_api::{LoginRequest, LoginResponse, SchoolApi};

/// Client for the ClasseViva REST API.
///
/// `C` is expected to add the developer key and user agent itself (see
/// [`crate::fetch::upstream_client`]); this type only shapes the endpoints.
pub struct ClassevivaClient<C> {
    base_url: String,
    http: C,
}

impl<C: HttpClient> ClassevivaClient<C> {
    pub fn new(base_url: impl Into<String>, http: C) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    fn request(&self, method: Method, endpoint: &str) -> Result<Request> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut req = Request::new(method, url.parse()?);
        req.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(req)
    }

    async fn send(&self, req: Request) -> Result<Response> {
        let url = req.url().to_string();
        debug!(method = %req.method(), url = %url, "Sending upstream request");

        self.http.execute(req).await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                warn!(url = %url, error = %e, "Upstream unreachable");
                anyhow!("Network error: cannot connect to server ({e})")
            } else {
                anyhow!("Request to {url} failed: {e}")
            }
        })
    }
}

#[async_trait]
impl<C: HttpClient> SchoolApi for ClassevivaClient<C> {
    #[tracing::instrument(skip(self, pass))]
    async fn login(&self, uid: &str, pass: &str) -> Result<LoginResponse> {
        let mut req = self.request(Method::POST, "/auth/login")?;
        let body = serde_json::to_vec(&LoginRequest {
            ident: None,
            pass,
            uid,
        })?;
        *req.body_mut() = Some(body.into());

        let response = self.send(req).await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let mut message = format!("Login failed: {status}");
            // Upstream usually explains itself in an `error` field.
            if let Some(detail) = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v["error"].as_str().map(str::to_string))
            {
                message.push_str(&format!(" - {detail}"));
            }
            return Err(anyhow!(message));
        }

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse login response: {e}"))?;

        if login.token().is_none() {
            return Err(anyhow!("Invalid token"));
        }

        info!(ident = login.ident.as_deref().unwrap_or(""), "Logged in");
        Ok(login)
    }

    #[tracing::instrument(skip(self, token))]
    async fn grades(&self, student_id: &str, token: &str) -> Result<serde_json::Value> {
        let mut req = self.request(Method::GET, &format!("/students/{student_id}/grades"))?;
        req.headers_mut().insert(
            AUTH_TOKEN_HEADER,
            HeaderValue::from_str(token).map_err(|_| anyhow!("Invalid token"))?,
        );

        let response = self.send(req).await?;

        if !response.status().is_success() {
            return Err(anyhow!("Failed to fetch grades: {}", response.status()));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse grades response: {e}"))?;

        debug!(
            records = payload["grades"].as_array().map(Vec::len).unwrap_or(0),
            "Grades received"
        );
        Ok(payload)
    }
}
