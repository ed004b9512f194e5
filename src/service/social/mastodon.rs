//! Mastodon integration for iasip-bot.
//!
//! This module provides the Mastodon implementation of `GenericSocialClient`:
//! - REST calls (identity, media upload, status publishing) over `reqwest`
//! - The user event stream over a websocket subscription
//!
//! Streaming frames are decoded into `Event`s here so the rest of the bot never
//! sees the wire format.

use std::sync::Arc;

use async_trait::async_trait;
use futures::{StreamExt, future};
use reqwest::{
    StatusCode,
    multipart::{Form, Part},
};
use serde::{Deserialize, Serialize};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        self, Message,
        client::IntoClientRequest,
        http::{HeaderValue, header::AUTHORIZATION},
    },
};
use tracing::{info, instrument, warn};
use url::Url;

use crate::base::{
    config::Config,
    types::{Account, EncodedImage, Event, MediaRef, Notification, ReplyParams, Res, StatusId, Visibility},
};

use super::{EventStream, GenericSocialClient, SocialClient};

// API paths, relative to the instance base URL.

const VERIFY_CREDENTIALS_PATH: &str = "api/v1/accounts/verify_credentials";
const STREAMING_PATH: &str = "api/v1/streaming";
const MEDIA_PATH: &str = "api/v1/media";
const STATUSES_PATH: &str = "api/v1/statuses";

// Extra methods on `SocialClient` applied by the mastodon implementation.

impl SocialClient {
    /// Creates a new Mastodon social client.
    pub fn mastodon(config: &Config) -> Res<Self> {
        let client = MastodonSocialClient::new(config)?;
        Ok(Self { inner: Arc::new(client) })
    }
}

// Wire types.

/// Envelope of every message on the streaming websocket.
#[derive(Debug, Deserialize)]
struct StreamFrame {
    event: String,
    /// JSON-encoded payload, itself a string.
    #[serde(default)]
    payload: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MediaAttachment {
    id: MediaRef,
}

#[derive(Debug, Serialize)]
struct StatusRequest<'a> {
    status: &'a str,
    in_reply_to_id: &'a StatusId,
    media_ids: &'a [MediaRef],
    sensitive: bool,
    spoiler_text: &'a str,
    visibility: Visibility,
}

impl<'a> From<&'a ReplyParams> for StatusRequest<'a> {
    fn from(params: &'a ReplyParams) -> Self {
        Self {
            status: &params.body,
            in_reply_to_id: &params.in_reply_to,
            media_ids: &params.media,
            sensitive: params.sensitive,
            spoiler_text: &params.spoiler_text,
            visibility: params.visibility,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatedStatus {
    id: StatusId,
}

// Structs.

/// Mastodon client implementation.
#[derive(Clone)]
struct MastodonSocialClient {
    http: reqwest::Client,
    server: Url,
    streaming: Url,
    access_token: String,
}

impl MastodonSocialClient {
    /// Create a new Mastodon client.
    #[instrument(name = "MastodonSocialClient::new", skip_all)]
    pub fn new(config: &Config) -> Res<Self> {
        let server = as_base_url(Url::parse(&config.mastodon_server)?);
        let streaming = streaming_endpoint(&server, config.mastodon_streaming_url.as_deref())?;

        let http = reqwest::Client::builder().user_agent(concat!("iasip-bot/", env!("CARGO_PKG_VERSION"))).build()?;

        info!("Using Mastodon instance {} (streaming at {})", server, streaming);

        Ok(Self {
            http,
            server,
            streaming,
            access_token: config.mastodon_access_token.clone(),
        })
    }

    fn api_url(&self, path: &str) -> Res<Url> {
        Ok(self.server.join(path)?)
    }
}

#[async_trait]
impl GenericSocialClient for MastodonSocialClient {
    #[instrument(skip(self))]
    async fn current_user(&self) -> Res<Account> {
        let account = self
            .http
            .get(self.api_url(VERIFY_CREDENTIALS_PATH)?)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| anyhow::anyhow!("Failed to verify credentials: {}", e))?
            .json::<Account>()
            .await?;

        Ok(account)
    }

    #[instrument(skip(self))]
    async fn open_event_stream(&self) -> Res<EventStream> {
        let mut request = self.streaming.as_str().into_client_request()?;
        request.headers_mut().insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", self.access_token))?);

        let (socket, response) = connect_async(request).await.map_err(|e| anyhow::anyhow!("Failed to open event stream: {}", e))?;

        info!("Event stream connected ({})", response.status());

        let events = socket.filter_map(|message| future::ready(frame_to_event(message)));

        Ok(Box::pin(events))
    }

    #[instrument(skip_all, fields(file_name = %media.file_name, size = media.bytes.len()))]
    async fn upload_media(&self, media: EncodedImage) -> Res<MediaRef> {
        let part = Part::bytes(media.bytes).file_name(media.file_name).mime_str(media.mime_type)?;

        let mut form = Form::new().part("file", part);
        if let Some(description) = media.description {
            form = form.text("description", description);
        }

        let response = self
            .http
            .post(self.api_url(MEDIA_PATH)?)
            .bearer_auth(&self.access_token)
            .multipart(form)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| anyhow::anyhow!("Failed to upload media: {}", e))?;

        ensure_media_ready(response.status())?;

        let attachment = response.json::<MediaAttachment>().await?;

        Ok(attachment.id)
    }

    #[instrument(skip(self))]
    async fn publish_reply(&self, params: &ReplyParams) -> Res<StatusId> {
        let created = self
            .http
            .post(self.api_url(STATUSES_PATH)?)
            .bearer_auth(&self.access_token)
            .json(&StatusRequest::from(params))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| anyhow::anyhow!("Failed to publish reply: {}", e))?
            .json::<CreatedStatus>()
            .await?;

        Ok(created.id)
    }
}

// Helpers.

/// Build the user stream endpoint, preferring an explicit streaming base URL.
fn streaming_endpoint(server: &Url, streaming: Option<&str>) -> Res<Url> {
    let base = match streaming {
        Some(streaming) => as_base_url(Url::parse(streaming)?),
        None => as_base_url(server.clone()),
    };

    let mut url = base.join(STREAMING_PATH)?;

    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        _ => "ws",
    };
    url.set_scheme(scheme).map_err(|_| anyhow::anyhow!("Cannot use scheme `{}` for streaming URL `{}`", scheme, url))?;

    url.query_pairs_mut().append_pair("stream", "user");

    Ok(url)
}

/// Make `url` usable as a base for relative joins by giving its path a
/// trailing slash, so a sub-path install (`https://host/masto`) is kept.
fn as_base_url(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    url
}

/// Media that is still being processed cannot be attached to a status yet.
fn ensure_media_ready(status: StatusCode) -> Res<()> {
    if status == StatusCode::ACCEPTED {
        return Err(anyhow::anyhow!("Failed to upload media: the instance is still processing it ({})", status));
    }

    Ok(())
}

/// Map one websocket read onto an event, or `None` for control traffic.
fn frame_to_event(message: Result<Message, tungstenite::Error>) -> Option<Event> {
    match message {
        Ok(Message::Text(text)) => Some(parse_stream_frame(text.as_str())),
        Ok(Message::Close(frame)) => Some(Event::TransportError(match frame {
            Some(frame) => format!("Stream closed by server: {} {}", u16::from(frame.code), frame.reason.as_str()),
            None => "Stream closed by server".to_string(),
        })),
        Ok(_) => None,
        Err(e) => Some(Event::TransportError(e.to_string())),
    }
}

/// Decode a streaming text frame.
///
/// Frames that cannot be decoded are reported as `Event::Other` so a single
/// malformed payload never takes the subscription down.
fn parse_stream_frame(text: &str) -> Event {
    let frame = match serde_json::from_str::<StreamFrame>(text) {
        Ok(frame) => frame,
        Err(e) => {
            warn!("Failed to decode stream frame: {}", e);
            return Event::Other("unknown".to_string());
        }
    };

    if frame.event != "notification" {
        return Event::Other(frame.event);
    }

    let Some(payload) = frame.payload else {
        warn!("Notification frame without a payload.");
        return Event::Other(frame.event);
    };

    match serde_json::from_str::<Notification>(&payload) {
        Ok(notification) => Event::Notification(notification),
        Err(e) => {
            warn!("Failed to decode notification payload: {}", e);
            Event::Other(frame.event)
        }
    }
}

// Tests.
