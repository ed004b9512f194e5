//! Runtime services and shared state for the iasip-bot.

use tracing::{info, instrument, warn};

use crate::{
    base::{
        config::Config,
        types::{Res, Void},
    },
    interaction::{BotContext, dispatch::run_event_loop},
    service::{generator::ImageGenerator, social::SocialClient},
};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the social client, image generator, and configuration.
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The social network client instance.
    pub social: SocialClient,
    /// The image generator instance.
    pub generator: ImageGenerator,
}

impl Runtime {
    /// Create a new runtime instance.
    #[instrument(skip_all)]
    pub fn new(config: Config) -> Res<Self> {
        // Load the font into the generator.
        let generator = ImageGenerator::title_card(&config)?;

        // Initialize the social client.
        let social = SocialClient::mastodon(&config)?;

        Ok(Self { config, social, generator })
    }

    /// Connect, then process events until the stream fails or Ctrl-C is pressed.
    #[instrument(skip_all)]
    pub async fn start(&self) -> Void {
        // Get info about the bot user.
        let identity = self.social.current_user().await?;
        info!("Running as @{} ({})", identity.username, identity.acct);

        // Establish the event stream.
        let events = self.social.open_event_stream().await?;

        let ctx = BotContext::new(identity, self.social.clone(), self.generator.clone(), &self.config);

        tokio::select! {
            result = run_event_loop(events, &ctx) => result,
            signal = tokio::signal::ctrl_c() => {
                warn!("Received Ctrl-C, shutting down ...");
                Ok(signal?)
            }
        }
    }
}
