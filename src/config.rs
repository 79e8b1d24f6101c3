use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// How the dictionary page is cut into paragraphs.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// One match runs to the last `</p>` on the same line, so several
    /// paragraphs on one line come back as a single entry.
    #[default]
    Greedy,
    /// Each match ends at the first following `</p>`, across lines.
    Paragraph,
}

impl std::fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchPolicy::Greedy => write!(f, "greedy"),
            MatchPolicy::Paragraph => write!(f, "paragraph"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub discord: DiscordConfig,
    #[serde(default = "default_dictionary_config")]
    pub dictionary: DictionaryConfig,
    #[serde(default = "default_triggers_config")]
    pub triggers: TriggersConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DiscordConfig {
    pub bot_token: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DictionaryConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub match_policy: MatchPolicy,
    #[serde(default = "default_not_found_message")]
    pub not_found_message: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TriggersConfig {
    /// Guild emoji added to messages like "kek" or "lol"
    #[serde(default = "default_laugh_emoji")]
    pub laugh_emoji: String,
}

fn default_base_url() -> String {
    "https://sjp.pl/".to_string()
}

fn default_not_found_message() -> String {
    "Nie występuje w słowniku".to_string()
}

fn default_laugh_emoji() -> String {
    "KEKW".to_string()
}

fn default_dictionary_config() -> DictionaryConfig {
    DictionaryConfig {
        base_url: default_base_url(),
        match_policy: MatchPolicy::default(),
        not_found_message: default_not_found_message(),
    }
}

fn default_triggers_config() -> TriggersConfig {
    TriggersConfig {
        laugh_emoji: default_laugh_emoji(),
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config")?;

        if config.discord.bot_token.trim().is_empty() {
            anyhow::bail!("discord.bot_token is empty");
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::parse("[discord]\nbot_token = \"abc\"\n").unwrap();
        assert_eq!(config.discord.bot_token, "abc");
        assert_eq!(config.dictionary.base_url, "https://sjp.pl/");
        assert_eq!(config.dictionary.match_policy, MatchPolicy::Greedy);
        assert_eq!(config.dictionary.not_found_message, "Nie występuje w słowniku");
        assert_eq!(config.triggers.laugh_emoji, "KEKW");
    }

    #[test]
    fn test_full_config() {
        let config = Config::parse(
            r#"
            [discord]
            bot_token = "abc"

            [dictionary]
            base_url = "http://localhost:8080/"
            match_policy = "paragraph"
            not_found_message = "brak"

            [triggers]
            laugh_emoji = "LUL"
            "#,
        )
        .unwrap();
        assert_eq!(config.dictionary.base_url, "http://localhost:8080/");
        assert_eq!(config.dictionary.match_policy, MatchPolicy::Paragraph);
        assert_eq!(config.dictionary.not_found_message, "brak");
        assert_eq!(config.triggers.laugh_emoji, "LUL");
    }

    #[test]
    fn test_partial_dictionary_section() {
        let config = Config::parse(
            "[discord]\nbot_token = \"abc\"\n[dictionary]\nmatch_policy = \"paragraph\"\n",
        )
        .unwrap();
        assert_eq!(config.dictionary.base_url, "https://sjp.pl/");
        assert_eq!(config.dictionary.match_policy, MatchPolicy::Paragraph);
    }

    #[test]
    fn test_empty_token_rejected() {
        let err = Config::parse("[discord]\nbot_token = \"  \"\n").unwrap_err();
        assert!(err.to_string().contains("bot_token"));
    }

    #[test]
    fn test_missing_discord_section_rejected() {
        assert!(Config::parse("[triggers]\nlaugh_emoji = \"KEKW\"\n").is_err());
    }

    #[test]
    fn test_unknown_policy_rejected() {
        assert!(Config::parse(
            "[discord]\nbot_token = \"abc\"\n[dictionary]\nmatch_policy = \"lazy\"\n"
        )
        .is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/panbot.toml")).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read config file"));
    }
}
