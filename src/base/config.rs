//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, sync::Arc};

use serde::Deserialize;
use url::Url;

use super::types::Res;

/// Default content warning placed on every reply.
fn default_spoiler_text() -> String {
    "bot-generated IASIP".to_string()
}

/// Default title card width, in pixels.
fn default_title_card_width() -> u32 {
    1920
}

/// Default title card height, in pixels.
fn default_title_card_height() -> u32 {
    1080
}

/// Default title card font size, in pixels.
fn default_title_card_font_size() -> f32 {
    96.0
}

/// How strictly the bot must be addressed before it responds.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MentionPolicy {
    /// The bot must be the first and only leading mention.
    #[default]
    SoleMention,
    /// The bot may appear anywhere among the leading mentions.
    AnyLeadingMention,
}

/// Configuration for the iasip-bot application.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Shared, immutable settings.
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// The settings themselves, each read from the file or an `IASIP_BOT_*` variable.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConfigInner {
    /// Base URL of the Mastodon instance (`MASTODON_SERVER`).
    pub mastodon_server: String,
    /// Access token of the bot account (`MASTODON_ACCESS_TOKEN`).
    pub mastodon_access_token: String,
    /// Optional streaming API base URL (`MASTODON_STREAMING_URL`).
    /// Derived from the server URL when omitted.
    #[serde(default)]
    pub mastodon_streaming_url: Option<String>,
    /// Path to the font used to render title cards (`FONT_PATH`).
    pub font_path: String,
    /// Content warning placed on replies (`SPOILER_TEXT`).
    #[serde(default = "default_spoiler_text")]
    pub spoiler_text: String,
    /// Which leading mentions count as addressing the bot (`MENTION_POLICY`).
    #[serde(default)]
    pub mention_policy: MentionPolicy,
    /// Title card width in pixels (`TITLE_CARD_WIDTH`).
    #[serde(default = "default_title_card_width")]
    pub title_card_width: u32,
    /// Title card height in pixels (`TITLE_CARD_HEIGHT`).
    #[serde(default = "default_title_card_height")]
    pub title_card_height: u32,
    /// Title card font size in pixels (`TITLE_CARD_FONT_SIZE`).
    #[serde(default = "default_title_card_font_size")]
    pub title_card_font_size: f32,
}

impl Config {
    /// Load from `explicit_path` (or `.hidden/config.toml` when present), let
    /// the environment override it, and validate the result.
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder();

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        cfg = cfg.add_source(config::Environment::default().prefix("IASIP_BOT"));

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        result.validate()?;

        Ok(result)
    }

    /// Check the loaded values for anything that would only fail later at runtime.
    pub fn validate(&self) -> Res<()> {
        let server = Url::parse(&self.mastodon_server).map_err(|e| anyhow::anyhow!("Mastodon server URL `{}` is invalid: {}", self.mastodon_server, e))?;
        if !matches!(server.scheme(), "http" | "https") {
            return Err(anyhow::anyhow!("Mastodon server URL must use http or https."));
        }

        if let Some(streaming) = &self.mastodon_streaming_url {
            let streaming = Url::parse(streaming).map_err(|e| anyhow::anyhow!("Mastodon streaming URL `{}` is invalid: {}", streaming, e))?;
            if !matches!(streaming.scheme(), "http" | "https" | "ws" | "wss") {
                return Err(anyhow::anyhow!("Mastodon streaming URL must use http, https, ws, or wss."));
            }
        }

        if self.mastodon_access_token.trim().is_empty() {
            return Err(anyhow::anyhow!("Mastodon access token must not be empty."));
        }

        if self.font_path.trim().is_empty() {
            return Err(anyhow::anyhow!("Font path must not be empty."));
        }

        if self.title_card_width < 1 || self.title_card_width > 4096 {
            return Err(anyhow::anyhow!("Title card width must be between 1 and 4096."));
        }

        if self.title_card_height < 1 || self.title_card_height > 4096 {
            return Err(anyhow::anyhow!("Title card height must be between 1 and 4096."));
        }

        if !(8.0..=512.0).contains(&self.title_card_font_size) {
            return Err(anyhow::anyhow!("Title card font size must be between 8 and 512."));
        }

        Ok(())
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn create_test_config() -> Config {
        Config {
            inner: Arc::new(ConfigInner {
                mastodon_server: "https://paddys.pub".to_string(),
                mastodon_access_token: "token".to_string(),
                font_path: "fonts/textile.ttf".to_string(),
                spoiler_text: default_spoiler_text(),
                title_card_width: 1920,
                title_card_height: 1080,
                title_card_font_size: 96.0,
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_load_applies_defaults() {
        let file = write_config(
            r#"
            mastodon_server = "https://paddys.pub"
            mastodon_access_token = "token"
            font_path = "fonts/textile.ttf"
            "#,
        );

        let config = Config::load(Some(file.path())).unwrap();

        assert_eq!(config.spoiler_text, "bot-generated IASIP");
        assert_eq!(config.mention_policy, MentionPolicy::SoleMention);
        assert_eq!(config.title_card_width, 1920);
        assert_eq!(config.title_card_height, 1080);
        assert_eq!(config.mastodon_streaming_url, None);
    }

    #[test]
    fn test_load_reads_mention_policy() {
        let file = write_config(
            r#"
            mastodon_server = "https://paddys.pub"
            mastodon_access_token = "token"
            font_path = "fonts/textile.ttf"
            mention_policy = "any_leading_mention"
            "#,
        );

        let config = Config::load(Some(file.path())).unwrap();

        assert_eq!(config.mention_policy, MentionPolicy::AnyLeadingMention);
    }

    #[test]
    fn test_load_fails_without_required_fields() {
        let file = write_config(r#"mastodon_server = "https://paddys.pub""#);

        assert!(Config::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_validate_accepts_test_config() {
        create_test_config().validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_server_scheme() {
        let mut config = create_test_config();
        Arc::make_mut(&mut config.inner).mastodon_server = "ftp://paddys.pub".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_token() {
        let mut config = create_test_config();
        Arc::make_mut(&mut config.inner).mastodon_access_token = "  ".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_card() {
        let mut config = create_test_config();
        Arc::make_mut(&mut config.inner).title_card_width = 0;
        assert!(config.validate().is_err());

        let mut config = create_test_config();
        Arc::make_mut(&mut config.inner).title_card_font_size = 1000.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_websocket_streaming_url() {
        let mut config = create_test_config();
        Arc::make_mut(&mut config.inner).mastodon_streaming_url = Some("wss://streaming.paddys.pub".to_string());

        config.validate().unwrap();
    }
}
