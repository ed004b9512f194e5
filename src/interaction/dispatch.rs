//! The event loop.
//!
//! Events are handled strictly one at a time: a triggered response runs to a
//! terminal state before the next event is pulled off the stream.

use futures::StreamExt;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    base::types::{Event, NotificationKind, ParsedTrigger, Status, Void},
    service::social::EventStream,
};

use super::{
    BotContext,
    respond::{ResponseOutcome, respond},
    trigger::{TriggerResult, parse_content},
};

/// What the loop should do with one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Ignore the event and continue.
    Skip(&'static str),
    /// Run the response pipeline for this status.
    Respond { trigger: ParsedTrigger, status: Box<Status> },
    /// The stream is broken; stop the loop.
    Terminate(String),
}

/// Decide how to handle `event`.
pub fn classify(event: Event, ctx: &BotContext) -> Dispatch {
    let notification = match event {
        Event::Notification(notification) => notification,
        Event::TransportError(reason) => return Dispatch::Terminate(reason),
        Event::Other(_) => return Dispatch::Skip("not a notification"),
    };

    if notification.kind != NotificationKind::Mention {
        return Dispatch::Skip("not a mention");
    }

    let Some(status) = notification.status else {
        return Dispatch::Skip("mention without a status");
    };

    match parse_content(&status.content, &ctx.identity.username, ctx.mention_policy) {
        TriggerResult::Trigger(trigger) => Dispatch::Respond { trigger, status: Box::new(status) },
        TriggerResult::NoTrigger => Dispatch::Skip("not directly addressed"),
    }
}

/// Consume `events` until the stream ends or reports a transport error.
///
/// Per-response failures are absorbed by the response pipeline. A transport
/// error drops the stream and is returned as an error.
#[instrument(skip_all)]
pub async fn run_event_loop(mut events: EventStream, ctx: &BotContext) -> Void {
    info!("Entering event loop.");

    while let Some(event) = events.next().await {
        match classify(event, ctx) {
            Dispatch::Skip(reason) => debug!("Skipping event: {}", reason),
            Dispatch::Respond { trigger, status } => {
                info!("Received trigger from {} (posted {}) ...", status.account.acct, status.created_at);

                match respond(&trigger, &status, ctx).await {
                    ResponseOutcome::Published(reply_id) => debug!("Response to {} published as {}", status.id, reply_id),
                    ResponseOutcome::Abandoned(err) => debug!("Response to {} abandoned at {:?}", status.id, err.stage()),
                }
            }
            Dispatch::Terminate(reason) => {
                error!("Error in event stream: {}", reason);
                return Err(anyhow::anyhow!("Event stream failed: {}", reason));
            }
        }
    }

    warn!("Event stream ended.");

    Ok(())
}
