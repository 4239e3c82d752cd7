//! In-process [`HttpClient`] fake for unit tests.

use super::client::HttpClient;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use std::collections::VecDeque;
use std::sync::Mutex;

/// What the fake saw for one request.
#[derive(Debug, Clone)]
pub struct SentRequest {
    pub method: reqwest::Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

/// Replies with queued `(status, body)` pairs, repeating the last one, and
/// records every request it receives.
pub struct RecordingClient {
    replies: Mutex<VecDeque<(u16, String)>>,
    sent: Mutex<Vec<SentRequest>>,
}

impl RecordingClient {
    pub fn new(replies: Vec<(u16, &str)>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(|(s, b)| (s, b.to_string())).collect()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn ok(body: &str) -> Self {
        Self::new(vec![(200, body)])
    }

    pub fn requests(&self) -> Vec<SentRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<SentRequest> {
        self.sent.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl HttpClient for RecordingClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.sent.lock().unwrap().push(SentRequest {
            method: req.method().clone(),
            url: req.url().to_string(),
            headers: req.headers().clone(),
            body: req.body().and_then(|b| b.as_bytes()).map(|b| b.to_vec()),
        });

        let (status, body) = {
            let mut replies = self.replies.lock().unwrap();
            if replies.len() > 1 {
                replies.pop_front().unwrap()
            } else {
                replies.front().cloned().unwrap_or((200, "{}".to_string()))
            }
        };

        let response = axum::http::Response::builder()
            .status(status)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        Ok(reqwest::Response::from(response))
    }
}
