use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{header::USER_AGENT, Client};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Path of the `Say` procedure.
pub const SAY_PATH: &str = "/chat.v1.ChatService/Say";

/// Per-call timeout header, in milliseconds.
pub const TIMEOUT_HEADER: &str = "connect-timeout-ms";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SayRequest {
    pub sentence: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SayResponse {
    pub sentence: String,
    #[serde(default)]
    pub responded_at: Option<DateTime<Utc>>,
}

/// Error body returned by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcStatus {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: Vec<ViolationDetail>,
}

/// One failed validation rule, as reported by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViolationDetail {
    pub field: String,
    pub rule: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("rpc error [{}]: {}", .0.code, .0.message)]
    Rpc(RpcStatus),

    #[error("server returned status {status}: {body}")]
    Http { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// The RPC error code, when the server sent one.
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Rpc(status) => Some(&status.code),
            _ => None,
        }
    }
}

pub struct ChatClient {
    client: Client,
    base_url: String,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl ChatClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Use a preconfigured HTTP client (proxies, pools, TLS).
    pub fn with_client(base_url: &str, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: None,
            user_agent: None,
        }
    }

    /// Ask the server to give up on calls after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Call `Say` with `sentence`.
    pub async fn say(&self, sentence: &str) -> Result<SayResponse, ClientError> {
        let mut request = self
            .client
            .post(format!("{}{}", self.base_url, SAY_PATH))
            .json(&SayRequest {
                sentence: sentence.to_string(),
            });
        if let Some(timeout) = self.timeout {
            request = request.header(TIMEOUT_HEADER, timeout.as_millis().to_string());
        }
        if let Some(user_agent) = &self.user_agent {
            request = request.header(USER_AGENT, user_agent);
        }

        let resp = request.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if status.is_success() {
            return Ok(serde_json::from_str(&text)?);
        }

        match serde_json::from_str::<RpcStatus>(&text) {
            Ok(rpc_status) => Err(ClientError::Rpc(rpc_status)),
            Err(_) => Err(ClientError::Http {
                status: status.as_u16(),
                body: text,
            }),
        }
    }
}
