pub mod mastodon;

use std::{ops::Deref, pin::Pin, sync::Arc};

use async_trait::async_trait;
use futures::Stream;

use crate::base::types::{Account, EncodedImage, Event, MediaRef, ReplyParams, Res, StatusId};

// Types.

/// Live, ordered stream of events from the social network.
///
/// Dropping the stream tears down the underlying subscription.
pub type EventStream = Pin<Box<dyn Stream<Item = Event> + Send>>;

// Traits.

/// Generic "social network" trait that clients must implement.
///
/// This trait defines the operations the bot needs from a social network:
/// learning who it is, observing events addressed to it, and replying with
/// media attached.
#[async_trait]
pub trait GenericSocialClient: Send + Sync + 'static {
    /// Get the account the client is authenticated as.
    ///
    /// The bot's username is what the directness rule compares mentions against.
    async fn current_user(&self) -> Res<Account>;

    /// Open the realtime event subscription for the authenticated user.
    async fn open_event_stream(&self) -> Res<EventStream>;

    /// Upload an encoded image, returning a reference to attach to a status.
    async fn upload_media(&self, media: EncodedImage) -> Res<MediaRef>;

    /// Publish a reply, returning the identifier of the new status.
    async fn publish_reply(&self, params: &ReplyParams) -> Res<StatusId>;
}

// Structs.

/// Social network client for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct SocialClient {
    inner: Arc<dyn GenericSocialClient>,
}

impl Deref for SocialClient {
    type Target = dyn GenericSocialClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl SocialClient {
    pub fn new(inner: Arc<dyn GenericSocialClient>) -> Self {
        Self { inner }
    }
}
