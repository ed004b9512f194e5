//! Library root for `iasip-bot`.
//!
//! Iasip-bot is a Mastodon bot that turns direct mentions into title cards:
//! - Watches the bot account's notification stream for mentions
//! - Responds only when the bot is addressed directly (first and only leading mention)
//! - Renders the rest of the message as an "It's Always Sunny" title card
//! - Replies with the card attached, mirroring the visibility of the mention
//!
//! The bot integrates with Mastodon for events and replies, and renders
//! cards locally. The architecture is built around extensible traits that
//! allow for different implementations of each service.

#[deny(missing_docs)]
pub mod base;
pub mod interaction;
pub mod runtime;
pub mod service;

use base::{config::Config, types::Void};
use rustls::crypto;
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the iasip-bot runtime:
/// - Initializes the crypto provider
/// - Creates the runtime context with the generator and social clients
/// - Starts the main event loop for processing mentions
pub async fn start(config: Config) -> Void {
    info!("Starting iasip-bot ...");

    // Start the crypto provider.
    crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install the default crypto provider."))?;

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config)?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
