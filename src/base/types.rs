//! Shared types: result aliases, the Mastodon entities the bot reads, and the
//! values passed between pipeline stages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error type used across the crate.
pub type Err = anyhow::Error;
/// Result with the crate error type.
pub type Res<T> = Result<T, Err>;
/// Result carrying no value.
pub type Void = Res<()>;

// Identifiers.

/// Opaque identifier of a status on the instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusId(pub String);

/// Opaque reference to an uploaded media attachment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaRef(pub String);

impl std::fmt::Display for StatusId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for MediaRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// Social network entities.

/// Publication scope of a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Visible to everyone and listed on public timelines.
    Public,
    /// Visible to everyone but kept off public timelines.
    Unlisted,
    /// Followers-only.
    Private,
    /// Only the mentioned accounts.
    Direct,
}

/// An account on the instance.
///
/// `username` is the bare local name (`iasipbot`), while `acct` is the
/// webfinger-style handle relative to our instance (`someone` for local
/// accounts, `someone@elsewhere.social` for remote ones).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Instance-local account id.
    pub id: String,
    /// Bare local name.
    pub username: String,
    /// Handle relative to our instance.
    pub acct: String,
}

/// A single post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Id of the status.
    pub id: StatusId,
    /// Raw HTML body as rendered by the instance.
    pub content: String,
    /// Author.
    pub account: Account,
    /// Who can see the status.
    pub visibility: Visibility,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Public permalink, when the instance provides one.
    #[serde(default)]
    pub url: Option<String>,
}

/// Notification kinds pushed on the user stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Someone mentioned the account.
    Mention,
    /// A subscribed account posted.
    Status,
    /// A status of ours was boosted.
    Reblog,
    /// Someone followed the account.
    Follow,
    /// Someone asked to follow the account.
    FollowRequest,
    /// A status of ours was favourited.
    Favourite,
    /// A poll we voted in or created has ended.
    Poll,
    /// A status we interacted with was edited.
    Update,
    /// Any kind this client does not know about.
    #[serde(other)]
    Other,
}

/// A notification delivered to the bot account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Id of the notification.
    pub id: String,
    /// What happened.
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// The status involved, for kinds that carry one.
    #[serde(default)]
    pub status: Option<Status>,
}

/// One item pulled off the event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A notification for the bot account.
    Notification(Notification),
    /// The subscription itself failed; no further events will arrive.
    TransportError(String),
    /// Any other stream event, named by its event tag.
    Other(String),
}

// Pipeline values.

/// The result of successfully parsing a directly addressed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTrigger {
    /// Leading mention tokens, in order, including the `@`.
    pub mentions: Vec<String>,
    /// Free text following the mention block, trimmed.
    pub payload: String,
}

/// Parameters for a reply status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyParams {
    /// The status being answered.
    pub in_reply_to: StatusId,
    /// Hide the media behind a warning.
    pub sensitive: bool,
    /// Content warning text.
    pub spoiler_text: String,
    /// Reply text, including the author mention.
    pub body: String,
    /// Attachments, in display order.
    pub media: Vec<MediaRef>,
    /// Scope of the reply.
    pub visibility: Visibility,
}

/// An encoded image ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Encoded file contents.
    pub bytes: Vec<u8>,
    /// File name sent with the upload.
    pub file_name: String,
    /// MIME type of `bytes`.
    pub mime_type: &'static str,
    /// Alt text attached to the upload.
    pub description: Option<String>,
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_notification_deserializes_mention() {
        let value = json!({
            "id": "42",
            "type": "mention",
            "status": {
                "id": "109",
                "content": "<p>@iasipbot hi</p>",
                "account": { "id": "7", "username": "charlie", "acct": "charlie@paddys.pub" },
                "visibility": "direct",
                "created_at": "2024-01-01T00:00:00.000Z"
            }
        });

        let notification: Notification = serde_json::from_value(value).unwrap();

        assert_eq!(notification.kind, NotificationKind::Mention);
        let status = notification.status.unwrap();
        assert_eq!(status.id, StatusId("109".to_string()));
        assert_eq!(status.visibility, Visibility::Direct);
        assert_eq!(status.account.acct, "charlie@paddys.pub");
        assert_eq!(status.url, None);
    }

    #[test]
    fn test_unknown_notification_kind_is_other() {
        let value = json!({ "id": "1", "type": "admin.sign_up" });

        let notification: Notification = serde_json::from_value(value).unwrap();

        assert_eq!(notification.kind, NotificationKind::Other);
        assert!(notification.status.is_none());
    }

    #[test]
    fn test_visibility_wire_names() {
        for (visibility, name) in [
            (Visibility::Public, "public"),
            (Visibility::Unlisted, "unlisted"),
            (Visibility::Private, "private"),
            (Visibility::Direct, "direct"),
        ] {
            assert_eq!(serde_json::to_value(visibility).unwrap(), json!(name));
        }
    }
}
