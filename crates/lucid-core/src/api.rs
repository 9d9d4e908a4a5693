use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{LucidError, LucidResult, GENERIC_FAILURE};
use crate::models::{
    AuthToken, ChatMessage, ChatSession, Envelope, LoginRequest, NewMessage, NewSession, Page,
    RegisterRequest, SendMessageReply, SessionUpdate, User,
};

/// The external chat API as seen by the client state machine.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> LucidResult<AuthToken>;

    async fn register(&self, request: &RegisterRequest) -> LucidResult<AuthToken>;

    async fn current_user(&self, token: &str) -> LucidResult<User>;

    async fn list_sessions(&self, token: &str, size: u32, page: u32)
        -> LucidResult<Vec<ChatSession>>;

    async fn create_session(&self, token: &str, title: Option<String>) -> LucidResult<ChatSession>;

    async fn rename_session(
        &self,
        token: &str,
        session_id: &str,
        title: &str,
    ) -> LucidResult<ChatSession>;

    async fn list_messages(
        &self,
        token: &str,
        session_id: &str,
        size: u32,
        page: u32,
    ) -> LucidResult<Vec<ChatMessage>>;

    async fn send_message(
        &self,
        token: &str,
        session_id: &str,
        content: &str,
    ) -> LucidResult<SendMessageReply>;
}

pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> LucidResult<Self> {
        Self::with_timeouts(base_url, Duration::from_secs(60), Duration::from_secs(5))
    }

    pub fn from_config(config: &ClientConfig) -> LucidResult<Self> {
        Self::with_timeouts(
            config.api_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
            Duration::from_secs(config.connect_timeout_secs),
        )
    }

    pub fn with_timeouts(
        base_url: impl Into<String>,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> LucidResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| LucidError::Config(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Shared request path for every endpoint: bearer auth, JSON body, and
    /// non-2xx responses mapped to `LucidError::Api` with the server's message.
    async fn request<B, T>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&B>,
    ) -> LucidResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let mut req = self.client.request(method.clone(), &url);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;

        if !status.is_success() {
            let message = error_message(&bytes);
            warn!("{} {} failed with {}: {}", method, path, status, message);
            return Err(LucidError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = if bytes.is_empty() && status == StatusCode::NO_CONTENT {
            b"null".as_slice()
        } else {
            bytes.as_ref()
        };
        serde_json::from_slice(body).map_err(|e| LucidError::Decode(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, token: &str) -> LucidResult<T> {
        self.request::<Value, T>(Method::GET, path, Some(token), None)
            .await
    }
}

/// Pulls a human readable message out of an error body: `detail` (a string or
/// the first entry of a validation error list), then `message`.
pub fn error_message(body: &[u8]) -> String {
    let Ok(value) = serde_json::from_slice::<Value>(body) else {
        return GENERIC_FAILURE.to_string();
    };

    let detail = match value.get("detail") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Array(items)) => items
            .first()
            .and_then(|item| item.get("msg"))
            .and_then(|m| m.as_str())
            .map(str::to_string),
        Some(Value::Object(obj)) => obj
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string),
        _ => None,
    };

    detail
        .or_else(|| {
            value
                .get("message")
                .and_then(|m| m.as_str())
                .filter(|m| !m.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| GENERIC_FAILURE.to_string())
}

/// Characters left as-is inside a single path segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Percent-encodes `id` as one path segment. Dot segments would be resolved
/// away by the URL parser, so they are refused.
fn encode_segment(id: &str) -> LucidResult<String> {
    if id.is_empty() || id == "." || id == ".." {
        return Err(LucidError::Validation(format!("invalid id '{}'", id)));
    }
    Ok(utf8_percent_encode(id, SEGMENT).to_string())
}

#[async_trait]
impl ChatApi for ApiClient {
    async fn login(&self, request: &LoginRequest) -> LucidResult<AuthToken> {
        let env: Envelope<AuthToken> = self
            .request(Method::POST, "/login", None, Some(request))
            .await?;
        Ok(env.data)
    }

    async fn register(&self, request: &RegisterRequest) -> LucidResult<AuthToken> {
        let env: Envelope<AuthToken> = self
            .request(Method::POST, "/login/register", None, Some(request))
            .await?;
        Ok(env.data)
    }

    async fn current_user(&self, token: &str) -> LucidResult<User> {
        let env: Envelope<User> = self.get("/user", token).await?;
        Ok(env.data)
    }

    async fn list_sessions(
        &self,
        token: &str,
        size: u32,
        page: u32,
    ) -> LucidResult<Vec<ChatSession>> {
        let path = format!("/chat/sessions?size={}&page={}", size, page);
        let env: Envelope<Page<ChatSession>> = self.get(&path, token).await?;
        Ok(env.data.items)
    }

    async fn create_session(&self, token: &str, title: Option<String>) -> LucidResult<ChatSession> {
        let body = NewSession { title };
        let env: Envelope<ChatSession> = self
            .request(Method::POST, "/chat/sessions", Some(token), Some(&body))
            .await?;
        Ok(env.data)
    }

    async fn rename_session(
        &self,
        token: &str,
        session_id: &str,
        title: &str,
    ) -> LucidResult<ChatSession> {
        let path = format!("/chat/sessions/{}", encode_segment(session_id)?);
        let body = SessionUpdate {
            title: title.to_string(),
        };
        let env: Envelope<ChatSession> = self
            .request(Method::PUT, &path, Some(token), Some(&body))
            .await?;
        Ok(env.data)
    }

    async fn list_messages(
        &self,
        token: &str,
        session_id: &str,
        size: u32,
        page: u32,
    ) -> LucidResult<Vec<ChatMessage>> {
        let path = format!(
            "/chat/sessions/{}/messages?size={}&page={}",
            encode_segment(session_id)?,
            size,
            page
        );
        let env: Envelope<Page<ChatMessage>> = self.get(&path, token).await?;
        Ok(env.data.items)
    }

    async fn send_message(
        &self,
        token: &str,
        session_id: &str,
        content: &str,
    ) -> LucidResult<SendMessageReply> {
        let path = format!("/chat/sessions/{}/messages", encode_segment(session_id)?);
        let body = NewMessage::user(content);
        let env: Envelope<SendMessageReply> = self
            .request(Method::POST, &path, Some(token), Some(&body))
            .await?;
        Ok(env.data)
    }
}
