pub mod discord;

use anyhow::Result;
use async_trait::async_trait;

/// A message received from the gateway
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub author_id: u64,
    pub channel_id: u64,
    /// `None` for direct messages
    pub guild_id: Option<u64>,
    /// The triggering message, target of reactions and replies
    pub message_id: u64,
    pub content: String,
}

/// A reaction added to some message
#[derive(Debug, Clone)]
pub struct IncomingReaction {
    /// Missing on some gateway payloads
    pub user_id: Option<u64>,
    pub channel_id: u64,
    pub message_id: u64,
    pub emoji: EmojiRecord,
}

/// The bot's own user, known once the gateway reports ready
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelfIdentity {
    pub user_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmojiRecord {
    pub name: String,
    /// Identifier the REST API expects: the character itself for unicode
    /// emoji, `name:id` for custom ones.
    pub api_name: String,
}

/// Outbound operations the router needs from a chat platform.
#[async_trait]
pub trait Session: Send + Sync {
    async fn send_message(&self, channel_id: u64, text: &str) -> Result<()>;

    async fn send_reply(&self, channel_id: u64, text: &str, reply_to: u64) -> Result<()>;

    async fn add_reaction(&self, channel_id: u64, message_id: u64, emoji: &str) -> Result<()>;

    async fn list_guild_emoji(&self, guild_id: u64) -> Result<Vec<EmojiRecord>>;
}
