//! Decide whether a message addresses the bot directly.
//!
//! A message triggers the bot when it *opens* by speaking to the bot: it must
//! begin with a block of whitespace-separated `@handle` or `@handle@domain`
//! tokens, and (under the default policy) that block must be exactly
//! `@<bot username>`. Everything after the block is the payload.
//!
//! - `@iasipbot the gang opens a bar` triggers with `the gang opens a bar`.
//! - `@alice @iasipbot hello` does not: the bot is merely cc'd.
//! - `hey @iasipbot` does not: the bot is being talked about.

use crate::base::{
    config::MentionPolicy,
    html,
    types::ParsedTrigger,
};

/// Outcome of parsing a message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerResult {
    NoTrigger,
    Trigger(ParsedTrigger),
}

/// Sanitize raw status HTML, then parse it.
pub fn parse_content(raw_html: &str, self_handle: &str, policy: MentionPolicy) -> TriggerResult {
    parse_trigger(&html::to_plain_text(raw_html), self_handle, policy)
}

/// Parse a plain-text message body.
pub fn parse_trigger(text: &str, self_handle: &str, policy: MentionPolicy) -> TriggerResult {
    let Some((mentions, payload)) = split_leading_mentions(text) else {
        return TriggerResult::NoTrigger;
    };

    let own = format!("@{self_handle}");
    let addressed = match policy {
        MentionPolicy::SoleMention => mentions.len() == 1 && mentions[0] == own,
        MentionPolicy::AnyLeadingMention => mentions.iter().any(|m| *m == own),
    };

    if !addressed {
        return TriggerResult::NoTrigger;
    }

    TriggerResult::Trigger(ParsedTrigger {
        mentions: mentions.into_iter().map(str::to_string).collect(),
        payload: payload.trim().to_string(),
    })
}

/// Split `text` into its leading mention tokens and the remainder.
///
/// Returns `None` when the text (after leading whitespace) does not open with
/// a mention. Consecutive mentions must be separated by whitespace; anything
/// else ends the block, so `@a,@b` yields `[@a]` and `,@b`.
fn split_leading_mentions(text: &str) -> Option<(Vec<&str>, &str)> {
    let mut rest = text.trim_start();
    let mut mentions = Vec::new();

    let (first, after) = take_mention(rest)?;
    mentions.push(first);
    rest = after;

    loop {
        let next = rest.trim_start();
        if next.len() == rest.len() {
            break;
        }

        match take_mention(next) {
            Some((mention, after)) => {
                mentions.push(mention);
                rest = after;
            }
            None => break,
        }
    }

    Some((mentions, rest))
}

/// Take one `@handle` or `@handle@domain` token from the start of `text`.
fn take_mention(text: &str) -> Option<(&str, &str)> {
    let body = text.strip_prefix('@')?;

    let handle_len = prefix_len(body, is_handle_char);
    if handle_len == 0 {
        return None;
    }

    let mut end = 1 + handle_len;

    if let Some(domain) = text[end..].strip_prefix('@') {
        let domain_len = prefix_len(domain, is_domain_char);
        if domain_len > 0 {
            end += 1 + domain_len;
        }
    }

    Some(text.split_at(end))
}

/// Byte length of the longest prefix of `s` whose chars satisfy `pred`.
fn prefix_len(s: &str, pred: fn(char) -> bool) -> usize {
    s.find(|c: char| !pred(c)).unwrap_or(s.len())
}

fn is_handle_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn is_domain_char(c: char) -> bool {
    is_handle_char(c) || c == '.'
}

// Tests.
