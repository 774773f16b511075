use serde::Serialize;

/// `conversations.list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationsListParams {
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    pub types: String,
    pub team_id: String,
}

/// `conversations.history`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationsHistoryParams {
    pub channel: String,
    pub limit: u32,
}

/// `conversations.replies`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationsRepliesParams {
    pub channel: String,
    pub ts: String,
}

/// `chat.postMessage`. A message is a thread reply iff `thread_ts` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostMessageParams {
    pub channel: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
}

/// `reactions.add`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReactionsAddParams {
    pub channel: String,
    pub timestamp: String,
    pub name: String,
}

/// `users.list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsersListParams {
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// `users.info`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsersInfoParams {
    pub user: String,
}
