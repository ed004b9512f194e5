//! Event handling and user interactions for iasip-bot.
//!
//! This module provides the mention-triggered response pipeline:
//! - Deciding whether a message addresses the bot directly
//! - Generating, uploading, and replying with a title card
//! - Driving both from the live event stream

pub mod dispatch;
pub mod respond;
pub mod trigger;

use crate::{
    base::{
        config::{Config, MentionPolicy},
        types::Account,
    },
    service::{generator::ImageGenerator, social::SocialClient},
};

/// Everything the event loop needs, threaded explicitly into it.
///
/// Nothing here changes after startup.
#[derive(Clone)]
pub struct BotContext {
    /// The bot's own account.
    pub identity: Account,
    pub social: SocialClient,
    pub generator: ImageGenerator,
    /// Content warning placed on replies.
    pub spoiler_text: String,
    pub mention_policy: MentionPolicy,
}

impl BotContext {
    pub fn new(identity: Account, social: SocialClient, generator: ImageGenerator, config: &Config) -> Self {
        Self {
            identity,
            social,
            generator,
            spoiler_text: config.spoiler_text.clone(),
            mention_policy: config.mention_policy,
        }
    }
}
