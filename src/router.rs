use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::TriggersConfig;
use crate::dictionary::Dictionary;
use crate::platform::{IncomingMessage, IncomingReaction, SelfIdentity, Session};

pub const HELP_MESSAGE: &str = "
!help            Na pewno nie wyświetli tej listy komend
\t!sjp    <wyraz>  Znaczenie wyrazu z sjp.pl
\t!echo   <tekst>  Wypisuje tekst
";

const GO_AWAY_PHRASE: &str = "idź sobie";
const GO_AWAY_ANSWER: &str = "Nie";

/// What a message asks the bot to do. Classification is ordered: the first
/// matching rule wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// `!echo <text>`
    Echo(&'a str),
    /// `!help`
    Help,
    /// `!sjp <word>`
    Define(&'a str),
    /// "kek", "lol" or anything containing "kekw"
    Laugh,
    /// "idź sobie"
    GoAway,
}

impl<'a> Command<'a> {
    pub fn parse(content: &'a str) -> Option<Self> {
        if let Some(rest) = content.strip_prefix("!echo") {
            return Some(Command::Echo(rest.trim()));
        }
        if content.starts_with("!help") {
            return Some(Command::Help);
        }
        if let Some(rest) = content.strip_prefix("!sjp") {
            return Some(Command::Define(rest.trim()));
        }

        let lower = content.to_lowercase();
        if lower == "kek" || lower == "lol" || lower.contains("kekw") {
            return Some(Command::Laugh);
        }
        if lower == GO_AWAY_PHRASE {
            return Some(Command::GoAway);
        }

        None
    }
}

/// Maps inbound events to bot behavior. Platform-agnostic: every outbound
/// action goes through a [`Session`], and failures are logged, never returned.
pub struct Router {
    dictionary: Arc<dyn Dictionary>,
    triggers: TriggersConfig,
}

impl Router {
    pub fn new(dictionary: Arc<dyn Dictionary>, triggers: TriggersConfig) -> Self {
        Self {
            dictionary,
            triggers,
        }
    }

    pub async fn on_message(
        &self,
        msg: &IncomingMessage,
        me: SelfIdentity,
        session: &dyn Session,
    ) {
        if msg.author_id == me.user_id {
            return;
        }

        let Some(command) = Command::parse(&msg.content) else {
            return;
        };

        debug!(
            "Message {} from {} in channel {} classified as {:?}",
            msg.message_id, msg.author_id, msg.channel_id, command
        );

        match command {
            Command::Echo(text) => {
                if let Err(e) = session.send_message(msg.channel_id, text).await {
                    warn!("Failed to send echo: {:#}", e);
                }
            }
            Command::Help => {
                if let Err(e) = session.send_message(msg.channel_id, HELP_MESSAGE).await {
                    warn!("Failed to send help: {:#}", e);
                }
            }
            Command::Define(term) => {
                info!("Dictionary lookup for '{}'", term);
                let answer = self.dictionary.define(term).await;
                if let Err(e) = session.send_message(msg.channel_id, &answer).await {
                    warn!("Failed to send definition of '{}': {:#}", term, e);
                }
            }
            Command::Laugh => {
                let Some(emoji) = self.find_laugh_emoji(msg.guild_id, session).await else {
                    return;
                };
                if let Err(e) = session
                    .add_reaction(msg.channel_id, msg.message_id, &emoji)
                    .await
                {
                    warn!("Failed to react to message {}: {:#}", msg.message_id, e);
                }
            }
            Command::GoAway => {
                if let Err(e) = session
                    .send_reply(msg.channel_id, GO_AWAY_ANSWER, msg.message_id)
                    .await
                {
                    warn!("Failed to reply to message {}: {:#}", msg.message_id, e);
                }
            }
        }
    }

    /// Mirror every reaction that is not the bot's own.
    pub async fn on_reaction(
        &self,
        reaction: &IncomingReaction,
        me: SelfIdentity,
        session: &dyn Session,
    ) {
        if reaction.user_id == Some(me.user_id) {
            return;
        }

        debug!(
            "Mirroring reaction {} on message {}",
            reaction.emoji.name, reaction.message_id
        );

        if let Err(e) = session
            .add_reaction(
                reaction.channel_id,
                reaction.message_id,
                &reaction.emoji.api_name,
            )
            .await
        {
            warn!(
                "Failed to mirror reaction on message {}: {:#}",
                reaction.message_id, e
            );
        }
    }

    /// API name of the configured guild emoji, if the guild has one.
    /// The list is fetched fresh on every call.
    async fn find_laugh_emoji(
        &self,
        guild_id: Option<u64>,
        session: &dyn Session,
    ) -> Option<String> {
        let guild_id = guild_id?;
        let emojis = match session.list_guild_emoji(guild_id).await {
            Ok(emojis) => emojis,
            Err(e) => {
                warn!("Failed to list emoji of guild {}: {:#}", guild_id, e);
                return None;
            }
        };

        emojis
            .into_iter()
            .find(|e| e.name == self.triggers.laugh_emoji)
            .map(|e| e.api_name)
    }
}
