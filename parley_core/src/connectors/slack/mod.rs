use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::SlackConfig;
use crate::error::ConnectorError;

pub mod types;

pub use types::*;

const USER_AGENT: &str = concat!("parley/", env!("CARGO_PKG_VERSION"), " slack-connector");
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The Slack Web API methods the tools need. One call per method, no
/// pagination loops and no retries; callers get Slack's JSON body back
/// untouched once `ok` has been checked.
#[async_trait]
pub trait SlackApi: Send + Sync {
    async fn conversations_list(
        &self,
        params: &ConversationsListParams,
    ) -> Result<Value, ConnectorError>;

    async fn conversations_history(
        &self,
        params: &ConversationsHistoryParams,
    ) -> Result<Value, ConnectorError>;

    async fn conversations_replies(
        &self,
        params: &ConversationsRepliesParams,
    ) -> Result<Value, ConnectorError>;

    async fn chat_post_message(&self, params: &PostMessageParams)
        -> Result<Value, ConnectorError>;

    async fn reactions_add(&self, params: &ReactionsAddParams) -> Result<Value, ConnectorError>;

    async fn users_list(&self, params: &UsersListParams) -> Result<Value, ConnectorError>;

    async fn users_info(&self, params: &UsersInfoParams) -> Result<Value, ConnectorError>;
}

/// reqwest-backed client for `https://slack.com/api`.
#[derive(Clone, Debug)]
pub struct SlackClient {
    client: reqwest::Client,
    token: SecretString,
    api_base: String,
}

impl SlackClient {
    pub fn new(config: &SlackConfig) -> Result<Self, ConnectorError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            token: SecretString::from(config.bot_token().to_owned()),
            api_base: config.api_base.clone(),
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.api_base, method)
    }

    async fn api_get<P: Serialize + ?Sized>(
        &self,
        method: &str,
        params: &P,
    ) -> Result<Value, ConnectorError> {
        debug!(method, "slack GET");
        let resp = self
            .client
            .get(self.url(method))
            .bearer_auth(self.token.expose_secret())
            .query(params)
            .send()
            .await?;
        Self::read_body(resp).await
    }

    async fn api_post<P: Serialize + ?Sized>(
        &self,
        method: &str,
        body: &P,
    ) -> Result<Value, ConnectorError> {
        debug!(method, "slack POST");
        let resp = self
            .client
            .post(self.url(method))
            .bearer_auth(self.token.expose_secret())
            .json(body)
            .send()
            .await?;
        Self::read_body(resp).await
    }

    async fn read_body(resp: reqwest::Response) -> Result<Value, ConnectorError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ConnectorError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        let v: Value = resp.json().await?;
        check_ok(v)
    }
}

/// Slack reports failures in-band with HTTP 200 and `"ok": false`.
fn check_ok(v: Value) -> Result<Value, ConnectorError> {
    if v.get("ok").and_then(|x| x.as_bool()) == Some(true) {
        return Ok(v);
    }
    let err = v
        .get("error")
        .and_then(|e| e.as_str())
        .unwrap_or("unknown_error");
    Err(ConnectorError::SlackApi(err.to_string()))
}

#[async_trait]
impl SlackApi for SlackClient {
    async fn conversations_list(
        &self,
        params: &ConversationsListParams,
    ) -> Result<Value, ConnectorError> {
        self.api_get("conversations.list", params).await
    }

    async fn conversations_history(
        &self,
        params: &ConversationsHistoryParams,
    ) -> Result<Value, ConnectorError> {
        self.api_get("conversations.history", params).await
    }

    async fn conversations_replies(
        &self,
        params: &ConversationsRepliesParams,
    ) -> Result<Value, ConnectorError> {
        self.api_get("conversations.replies", params).await
    }

    async fn chat_post_message(
        &self,
        params: &PostMessageParams,
    ) -> Result<Value, ConnectorError> {
        self.api_post("chat.postMessage", params).await
    }

    async fn reactions_add(&self, params: &ReactionsAddParams) -> Result<Value, ConnectorError> {
        self.api_post("reactions.add", params).await
    }

    async fn users_list(&self, params: &UsersListParams) -> Result<Value, ConnectorError> {
        self.api_get("users.list", params).await
    }

    async fn users_info(&self, params: &UsersInfoParams) -> Result<Value, ConnectorError> {
        self.api_get("users.info", params).await
    }
}
