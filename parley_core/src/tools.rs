//! The Slack tool table.
//!
//! Each tool is one [`SlackTool`] value: its descriptor (name, description,
//! input schema) and its handler live side by side, and [`ToolRegistry`] is
//! the only place the set of tools is spelled out. The catalog returned by
//! `tools/list` and the dispatch table used by `tools/call` both come from it.

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use rmcp::model::{JsonObject, Tool};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::SlackConfig;
use crate::connectors::slack::{
    ConversationsHistoryParams, ConversationsListParams, ConversationsRepliesParams,
    PostMessageParams, ReactionsAddParams, SlackApi, UsersInfoParams, UsersListParams,
};
use crate::error::ConnectorError;

/// Upper bound Slack accepts for `conversations.list` and `users.list` pages.
pub const MAX_PAGE_LIMIT: u32 = 200;
pub const DEFAULT_PAGE_LIMIT: u32 = 100;
pub const DEFAULT_HISTORY_LIMIT: u32 = 10;

/// Everything a handler may touch during one call.
pub struct ToolContext<'a> {
    pub slack: &'a dyn SlackApi,
    pub config: &'a SlackConfig,
}

#[async_trait]
pub trait SlackTool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON Schema for the `arguments` object.
    fn input_schema(&self) -> JsonObject;

    /// Run the tool. Makes exactly one Slack call and returns the payload to
    /// be rendered into the result's text block.
    async fn call(
        &self,
        ctx: &ToolContext<'_>,
        args: JsonObject,
    ) -> Result<Value, ConnectorError>;

    fn descriptor(&self) -> Tool {
        Tool {
            name: Cow::Borrowed(self.name()),
            title: None,
            description: Some(Cow::Borrowed(self.description())),
            input_schema: Arc::new(self.input_schema()),
            output_schema: None,
            annotations: None,
            icons: None,
        }
    }
}

pub struct ToolRegistry {
    tools: Vec<Box<dyn SlackTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// The eight Slack tools, in catalog order.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ListChannels));
        registry.register(Box::new(PostMessage));
        registry.register(Box::new(ReplyToThread));
        registry.register(Box::new(AddReaction));
        registry.register(Box::new(GetChannelHistory));
        registry.register(Box::new(GetThreadReplies));
        registry.register(Box::new(GetUsers));
        registry.register(Box::new(GetUserProfile));
        registry
    }

    /// Adds a tool. A later registration with the same name replaces the
    /// earlier one in place so names stay unique.
    pub fn register(&mut self, tool: Box<dyn SlackTool>) {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(idx) => self.tools[idx] = tool,
            None => self.tools.push(tool),
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn SlackTool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn descriptors(&self) -> Vec<Tool> {
        self.tools.iter().map(|t| t.descriptor()).collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

fn parse_args<T: DeserializeOwned>(args: JsonObject) -> Result<T, ConnectorError> {
    serde_json::from_value(Value::Object(args))
        .map_err(|e| ConnectorError::InvalidParams(e.to_string()))
}

fn object_schema(schema: Value) -> JsonObject {
    match schema {
        Value::Object(map) => map,
        _ => JsonObject::new(),
    }
}

/// `limit` arrives as a JSON number; fractions are dropped and negatives
/// become 0.
pub fn whole_limit(requested: Option<f64>, default: u32) -> u32 {
    requested.map(|n| n.trunc() as u32).unwrap_or(default)
}

/// `limit` as sent upstream: the default when absent, never above `max`.
pub fn page_limit(requested: Option<f64>, default: u32, max: u32) -> u32 {
    whole_limit(requested, default).min(max)
}

/// Take one field out of a Slack response; absent fields render as `null`.
fn take_field(mut v: Value, key: &str) -> Value {
    v.get_mut(key).map(Value::take).unwrap_or(Value::Null)
}

// ---------------------------------------------------------------------------
// Channels
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ListChannelsInput {
    #[serde(default)]
    limit: Option<f64>,
    #[serde(default)]
    cursor: Option<String>,
}

pub struct ListChannels;

#[async_trait]
impl SlackTool for ListChannels {
    fn name(&self) -> &'static str {
        "slack_list_channels"
    }

    fn description(&self) -> &'static str {
        "List public or pre-defined channels in the workspace"
    }

    fn input_schema(&self) -> JsonObject {
        object_schema(json!({
            "type": "object",
            "properties": {
                "limit": {
                    "type": "number",
                    "description": "Maximum number of channels to return (max: 200)",
                    "default": DEFAULT_PAGE_LIMIT,
                    "maximum": MAX_PAGE_LIMIT
                },
                "cursor": {
                    "type": "string",
                    "description": "Pagination cursor for next page"
                }
            }
        }))
    }

    async fn call(
        &self,
        ctx: &ToolContext<'_>,
        args: JsonObject,
    ) -> Result<Value, ConnectorError> {
        let input: ListChannelsInput = parse_args(args)?;
        let params = ConversationsListParams {
            limit: page_limit(input.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT),
            cursor: input.cursor,
            types: "public_channel".to_string(),
            team_id: ctx.config.team_id.clone(),
        };
        let v = ctx.slack.conversations_list(&params).await?;

        let channels = match take_field(v, "channels") {
            Value::Array(items) => items,
            _ => Vec::new(),
        };
        let channels: Vec<Value> = channels
            .into_iter()
            .filter(|c| {
                let id = c.get("id").and_then(|id| id.as_str()).unwrap_or_default();
                ctx.config.allows_channel(id)
            })
            .collect();
        Ok(Value::Array(channels))
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PostMessageInput {
    channel_id: String,
    text: String,
}

pub struct PostMessage;

#[async_trait]
impl SlackTool for PostMessage {
    fn name(&self) -> &'static str {
        "slack_post_message"
    }

    fn description(&self) -> &'static str {
        "Post a new message to a Slack channel"
    }

    fn input_schema(&self) -> JsonObject {
        object_schema(json!({
            "type": "object",
            "properties": {
                "channel_id": {
                    "type": "string",
                    "description": "The ID of the channel to post to"
                },
                "text": {
                    "type": "string",
                    "description": "The message text to post"
                }
            },
            "required": ["channel_id", "text"]
        }))
    }

    async fn call(
        &self,
        ctx: &ToolContext<'_>,
        args: JsonObject,
    ) -> Result<Value, ConnectorError> {
        let input: PostMessageInput = parse_args(args)?;
        let params = PostMessageParams {
            channel: input.channel_id,
            text: input.text,
            thread_ts: None,
        };
        ctx.slack.chat_post_message(&params).await
    }
}

#[derive(Debug, Deserialize)]
struct ReplyToThreadInput {
    channel_id: String,
    thread_ts: String,
    text: String,
}

pub struct ReplyToThread;

#[async_trait]
impl SlackTool for ReplyToThread {
    fn name(&self) -> &'static str {
        "slack_reply_to_thread"
    }

    fn description(&self) -> &'static str {
        "Reply to a specific message thread"
    }

    fn input_schema(&self) -> JsonObject {
        object_schema(json!({
            "type": "object",
            "properties": {
                "channel_id": {
                    "type": "string",
                    "description": "The channel containing the thread"
                },
                "thread_ts": {
                    "type": "string",
                    "description": "Timestamp of the parent message"
                },
                "text": {
                    "type": "string",
                    "description": "The reply text"
                }
            },
            "required": ["channel_id", "thread_ts", "text"]
        }))
    }

    async fn call(
        &self,
        ctx: &ToolContext<'_>,
        args: JsonObject,
    ) -> Result<Value, ConnectorError> {
        let input: ReplyToThreadInput = parse_args(args)?;
        let params = PostMessageParams {
            channel: input.channel_id,
            text: input.text,
            thread_ts: Some(input.thread_ts),
        };
        ctx.slack.chat_post_message(&params).await
    }
}

#[derive(Debug, Deserialize)]
struct AddReactionInput {
    channel_id: String,
    timestamp: String,
    reaction: String,
}

pub struct AddReaction;

#[async_trait]
impl SlackTool for AddReaction {
    fn name(&self) -> &'static str {
        "slack_add_reaction"
    }

    fn description(&self) -> &'static str {
        "Add an emoji reaction to a message"
    }

    fn input_schema(&self) -> JsonObject {
        object_schema(json!({
            "type": "object",
            "properties": {
                "channel_id": {
                    "type": "string",
                    "description": "The channel containing the message"
                },
                "timestamp": {
                    "type": "string",
                    "description": "Message timestamp to react to"
                },
                "reaction": {
                    "type": "string",
                    "description": "Emoji name without colons"
                }
            },
            "required": ["channel_id", "timestamp", "reaction"]
        }))
    }

    async fn call(
        &self,
        ctx: &ToolContext<'_>,
        args: JsonObject,
    ) -> Result<Value, ConnectorError> {
        let input: AddReactionInput = parse_args(args)?;
        let params = ReactionsAddParams {
            channel: input.channel_id,
            timestamp: input.timestamp,
            name: input.reaction,
        };
        ctx.slack.reactions_add(&params).await
    }
}

#[derive(Debug, Deserialize)]
struct GetChannelHistoryInput {
    channel_id: String,
    #[serde(default)]
    limit: Option<f64>,
}

pub struct GetChannelHistory;

#[async_trait]
impl SlackTool for GetChannelHistory {
    fn name(&self) -> &'static str {
        "slack_get_channel_history"
    }

    fn description(&self) -> &'static str {
        "Get recent messages from a channel"
    }

    fn input_schema(&self) -> JsonObject {
        object_schema(json!({
            "type": "object",
            "properties": {
                "channel_id": {
                    "type": "string",
                    "description": "The channel ID"
                },
                "limit": {
                    "type": "number",
                    "description": "Number of messages to retrieve",
                    "default": DEFAULT_HISTORY_LIMIT
                }
            },
            "required": ["channel_id"]
        }))
    }

    async fn call(
        &self,
        ctx: &ToolContext<'_>,
        args: JsonObject,
    ) -> Result<Value, ConnectorError> {
        let input: GetChannelHistoryInput = parse_args(args)?;
        // History has no advertised maximum; the limit goes up as given.
        let params = ConversationsHistoryParams {
            channel: input.channel_id,
            limit: whole_limit(input.limit, DEFAULT_HISTORY_LIMIT),
        };
        let v = ctx.slack.conversations_history(&params).await?;
        Ok(take_field(v, "messages"))
    }
}

#[derive(Debug, Deserialize)]
struct GetThreadRepliesInput {
    channel_id: String,
    thread_ts: String,
}

pub struct GetThreadReplies;

#[async_trait]
impl SlackTool for GetThreadReplies {
    fn name(&self) -> &'static str {
        "slack_get_thread_replies"
    }

    fn description(&self) -> &'static str {
        "Get all replies in a message thread"
    }

    fn input_schema(&self) -> JsonObject {
        object_schema(json!({
            "type": "object",
            "properties": {
                "channel_id": {
                    "type": "string",
                    "description": "The channel containing the thread"
                },
                "thread_ts": {
                    "type": "string",
                    "description": "Timestamp of the parent message"
                }
            },
            "required": ["channel_id", "thread_ts"]
        }))
    }

    async fn call(
        &self,
        ctx: &ToolContext<'_>,
        args: JsonObject,
    ) -> Result<Value, ConnectorError> {
        let input: GetThreadRepliesInput = parse_args(args)?;
        let params = ConversationsRepliesParams {
            channel: input.channel_id,
            ts: input.thread_ts,
        };
        let v = ctx.slack.conversations_replies(&params).await?;
        Ok(take_field(v, "messages"))
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GetUsersInput {
    #[serde(default)]
    cursor: Option<String>,
    #[serde(default)]
    limit: Option<f64>,
}

pub struct GetUsers;

#[async_trait]
impl SlackTool for GetUsers {
    fn name(&self) -> &'static str {
        "slack_get_users"
    }

    fn description(&self) -> &'static str {
        "Get list of workspace users with basic profile information"
    }

    fn input_schema(&self) -> JsonObject {
        object_schema(json!({
            "type": "object",
            "properties": {
                "cursor": {
                    "type": "string",
                    "description": "Pagination cursor for next page"
                },
                "limit": {
                    "type": "number",
                    "description": "Maximum users to return (max: 200)",
                    "default": DEFAULT_PAGE_LIMIT,
                    "maximum": MAX_PAGE_LIMIT
                }
            }
        }))
    }

    async fn call(
        &self,
        ctx: &ToolContext<'_>,
        args: JsonObject,
    ) -> Result<Value, ConnectorError> {
        let input: GetUsersInput = parse_args(args)?;
        let params = UsersListParams {
            limit: page_limit(input.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT),
            cursor: input.cursor,
        };
        let v = ctx.slack.users_list(&params).await?;
        Ok(take_field(v, "members"))
    }
}

#[derive(Debug, Deserialize)]
struct GetUserProfileInput {
    user_id: String,
}

pub struct GetUserProfile;

#[async_trait]
impl SlackTool for GetUserProfile {
    fn name(&self) -> &'static str {
        "slack_get_user_profile"
    }

    fn description(&self) -> &'static str {
        "Get detailed profile information for a specific user"
    }

    fn input_schema(&self) -> JsonObject {
        object_schema(json!({
            "type": "object",
            "properties": {
                "user_id": {
                    "type": "string",
                    "description": "The user's ID"
                }
            },
            "required": ["user_id"]
        }))
    }

    async fn call(
        &self,
        ctx: &ToolContext<'_>,
        args: JsonObject,
    ) -> Result<Value, ConnectorError> {
        let input: GetUserProfileInput = parse_args(args)?;
        let params = UsersInfoParams {
            user: input.user_id,
        };
        let v = ctx.slack.users_info(&params).await?;
        Ok(take_field(v, "user"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalog_lists_every_tool_once_in_order() {
        let registry = ToolRegistry::standard();
        assert_eq!(
            registry.names(),
            vec![
                "slack_list_channels",
                "slack_post_message",
                "slack_reply_to_thread",
                "slack_add_reaction",
                "slack_get_channel_history",
                "slack_get_thread_replies",
                "slack_get_users",
                "slack_get_user_profile",
            ]
        );
        let unique: HashSet<_> = registry.names().into_iter().collect();
        assert_eq!(unique.len(), registry.len());
    }

    #[test]
    fn descriptors_carry_schema_defaults_and_maxima() {
        let registry = ToolRegistry::standard();
        let tools = registry.descriptors();

        let list = tools
            .iter()
            .find(|t| t.name == "slack_list_channels")
            .unwrap();
        let limit = &list.input_schema["properties"]["limit"];
        assert_eq!(limit["default"], 100);
        assert_eq!(limit["maximum"], 200);
        assert!(list.input_schema.get("required").is_none());

        let history = tools
            .iter()
            .find(|t| t.name == "slack_get_channel_history")
            .unwrap();
        assert_eq!(history.input_schema["properties"]["limit"]["default"], 10);
        assert!(history.input_schema["properties"]["limit"]
            .get("maximum")
            .is_none());

        let reaction = tools
            .iter()
            .find(|t| t.name == "slack_add_reaction")
            .unwrap();
        assert_eq!(
            reaction.input_schema["required"],
            json!(["channel_id", "timestamp", "reaction"])
        );
    }

    #[test]
    fn every_schema_is_an_object_schema() {
        for tool in ToolRegistry::standard().descriptors() {
            assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
            assert!(tool.description.is_some());
        }
    }

    #[test]
    fn page_limit_defaults_and_clamps() {
        assert_eq!(page_limit(None, 100, 200), 100);
        assert_eq!(page_limit(Some(50.0), 100, 200), 50);
        assert_eq!(page_limit(Some(500.0), 100, 200), 200);
        assert_eq!(page_limit(Some(200.0), 100, 200), 200);
        assert_eq!(page_limit(Some(50.5), 100, 200), 50);
    }

    #[test]
    fn whole_limit_saturates_out_of_range_numbers() {
        assert_eq!(whole_limit(None, 10), 10);
        assert_eq!(whole_limit(Some(300.0), 10), 300);
        assert_eq!(whole_limit(Some(-5.0), 10), 0);
        assert_eq!(whole_limit(Some(1e12), 10), u32::MAX);
    }

    #[test]
    fn take_field_missing_is_null() {
        assert_eq!(take_field(json!({"ok": true}), "messages"), Value::Null);
        assert_eq!(
            take_field(json!({"ok": true, "user": {"id": "U1"}}), "user"),
            json!({"id": "U1"})
        );
    }

    #[test]
    fn registering_same_name_replaces() {
        let mut registry = ToolRegistry::standard();
        registry.register(Box::new(GetUsers));
        assert_eq!(registry.len(), 8);
        assert!(registry.get("slack_get_users").is_some());
        assert!(registry.get("slack_archive_channel").is_none());
    }
}
