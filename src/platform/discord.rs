use std::sync::{Arc, OnceLock};

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serenity::builder::CreateMessage;
use serenity::http::Http;
use serenity::model::channel::{Message, Reaction, ReactionType};
use serenity::model::gateway::{GatewayIntents, Ready};
use serenity::model::id::{ChannelId, EmojiId, GuildId, MessageId};
use serenity::prelude::{Context, EventHandler};
use serenity::Client;
use tracing::{debug, error, info};

use crate::platform::{EmojiRecord, IncomingMessage, IncomingReaction, SelfIdentity, Session};
use crate::router::Router;

/// Discord rejects messages over 2000 characters; stay a bit below.
const MAX_MESSAGE_LEN: usize = 1950;

/// Split long messages for Discord's length limit. Chunks are trimmed and
/// never blank: Discord rejects whitespace-only messages.
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut remaining = text.trim();

    while remaining.len() > max_len {
        let mut end = max_len;
        // Walk back to a valid UTF-8 char boundary so slicing doesn't panic
        while end > 0 && !remaining.is_char_boundary(end) {
            end -= 1;
        }
        if end == 0 {
            end = remaining.chars().next().map_or(remaining.len(), char::len_utf8);
        }

        let window = &remaining[..end];
        let split_at = window
            .rfind('\n')
            .or_else(|| window.rfind(' '))
            .unwrap_or(end);

        let chunk = remaining[..split_at].trim_end();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }
        remaining = remaining[split_at..].trim_start();
    }

    if !remaining.is_empty() {
        chunks.push(remaining.to_string());
    }

    chunks
}

/// Send every chunk of `text`, carrying on past failed chunks so one
/// rejected piece does not swallow the rest. Blank text sends nothing.
async fn send_chunks<F, Fut>(text: &str, mut send: F) -> Result<()>
where
    F: FnMut(String) -> Fut,
    Fut: std::future::Future<Output = Result<()>>,
{
    let mut failed = 0usize;
    let mut last_error = None;

    for chunk in split_message(text, MAX_MESSAGE_LEN) {
        if let Err(e) = send(chunk).await {
            failed += 1;
            last_error = Some(e);
        }
    }

    match last_error {
        Some(e) => Err(e.context(format!("{} message chunk(s) failed", failed))),
        None => Ok(()),
    }
}

/// Parse an API emoji identifier (`name:id` or a unicode character).
fn parse_reaction_type(emoji: &str) -> ReactionType {
    if let Some((name, id)) = emoji.rsplit_once(':') {
        if let Ok(id) = id.parse::<u64>() {
            return ReactionType::Custom {
                animated: false,
                id: EmojiId::new(id),
                name: Some(name.to_string()),
            };
        }
    }
    ReactionType::Unicode(emoji.to_string())
}

/// `None` for custom emoji without a name (deleted emoji): the REST API
/// cannot address them.
fn emoji_record(emoji: &ReactionType) -> Option<EmojiRecord> {
    match emoji {
        ReactionType::Custom { id, name, .. } => {
            let name = name.clone()?;
            Some(EmojiRecord {
                api_name: format!("{}:{}", name, id),
                name,
            })
        }
        ReactionType::Unicode(s) => Some(EmojiRecord {
            name: s.clone(),
            api_name: s.clone(),
        }),
        other => Some(EmojiRecord {
            name: other.to_string(),
            api_name: other.to_string(),
        }),
    }
}

/// [`Session`] backed by the Discord REST API.
pub struct DiscordSession {
    http: Arc<Http>,
}

impl DiscordSession {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Session for DiscordSession {
    async fn send_message(&self, channel_id: u64, text: &str) -> Result<()> {
        let channel = ChannelId::new(channel_id);
        let http: &Http = &self.http;
        send_chunks(text, |chunk| async move {
            channel
                .say(http, chunk)
                .await
                .map(|_| ())
                .map_err(anyhow::Error::from)
        })
        .await
        .with_context(|| format!("Failed to send message to channel {}", channel_id))
    }

    async fn send_reply(&self, channel_id: u64, text: &str, reply_to: u64) -> Result<()> {
        let channel = ChannelId::new(channel_id);
        let builder = CreateMessage::new()
            .content(text)
            .reference_message((channel, MessageId::new(reply_to)));
        channel
            .send_message(&*self.http, builder)
            .await
            .with_context(|| format!("Failed to reply to message {}", reply_to))?;
        Ok(())
    }

    async fn add_reaction(&self, channel_id: u64, message_id: u64, emoji: &str) -> Result<()> {
        let reaction = parse_reaction_type(emoji);
        self.http
            .create_reaction(
                ChannelId::new(channel_id),
                MessageId::new(message_id),
                &reaction,
            )
            .await
            .with_context(|| format!("Failed to add reaction {} to message {}", emoji, message_id))
    }

    async fn list_guild_emoji(&self, guild_id: u64) -> Result<Vec<EmojiRecord>> {
        let emojis = GuildId::new(guild_id)
            .emojis(&*self.http)
            .await
            .with_context(|| format!("Failed to list emoji of guild {}", guild_id))?;

        Ok(emojis
            .into_iter()
            .map(|e| EmojiRecord {
                api_name: format!("{}:{}", e.name, e.id),
                name: e.name,
            })
            .collect())
    }
}

/// Serenity event handler feeding the router. Serenity runs every event on
/// its own task, so handlers may overlap.
struct Handler {
    router: Arc<Router>,
    me: OnceLock<SelfIdentity>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        self.me
            .set(SelfIdentity {
                user_id: ready.user.id.get(),
            })
            .ok();
        info!("Connected to Discord as {}", ready.user.name);
    }

    async fn message(&self, ctx: Context, msg: Message) {
        let Some(me) = self.me.get().copied() else {
            return;
        };

        let incoming = IncomingMessage {
            author_id: msg.author.id.get(),
            channel_id: msg.channel_id.get(),
            guild_id: msg.guild_id.map(|g| g.get()),
            message_id: msg.id.get(),
            content: msg.content,
        };

        let session = DiscordSession::new(Arc::clone(&ctx.http));
        self.router.on_message(&incoming, me, &session).await;
    }

    async fn reaction_add(&self, ctx: Context, reaction: Reaction) {
        let Some(me) = self.me.get().copied() else {
            return;
        };

        let Some(emoji) = emoji_record(&reaction.emoji) else {
            debug!(
                "Ignoring unnamed custom reaction on message {}",
                reaction.message_id
            );
            return;
        };

        let incoming = IncomingReaction {
            user_id: reaction.user_id.map(|u| u.get()),
            channel_id: reaction.channel_id.get(),
            message_id: reaction.message_id.get(),
            emoji,
        };

        let session = DiscordSession::new(Arc::clone(&ctx.http));
        self.router.on_reaction(&incoming, me, &session).await;
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Run the Discord platform until the gateway stops or the process is told
/// to shut down.
pub async fn run(router: Arc<Router>, bot_token: &str) -> Result<()> {
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_EMOJIS_AND_STICKERS
        | GatewayIntents::GUILD_MESSAGE_REACTIONS;

    let handler = Handler {
        router,
        me: OnceLock::new(),
    };

    let mut client = match Client::builder(bot_token, intents)
        .event_handler(handler)
        .await
    {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create Discord client: {}", e);
            return Err(e).context("Failed to create Discord client");
        }
    };

    let shard_manager = Arc::clone(&client.shard_manager);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutting down Discord connection...");
        shard_manager.shutdown_all().await;
    });

    info!("Starting Discord platform...");
    if let Err(e) = client.start().await {
        error!("Discord gateway error: {}", e);
        return Err(e).context("Discord gateway error");
    }

    Ok(())
}
