//! Reduce status HTML to plain text.

use scraper::{Html, Node};

/// Elements whose text content is never user-visible.
const HIDDEN_ELEMENTS: [&str; 2] = ["script", "style"];

/// Strip all markup from an HTML fragment and decode its entities.
///
/// `<br>` becomes a newline, and consecutive paragraphs are separated by a
/// blank line, so the structure a reader sees survives as whitespace.
pub fn to_plain_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());

    for node in fragment.root_element().descendants() {
        match node.value() {
            Node::Text(text) => {
                let hidden = node
                    .parent()
                    .and_then(|parent| parent.value().as_element().map(|e| HIDDEN_ELEMENTS.contains(&e.name())))
                    .unwrap_or(false);

                if !hidden {
                    out.push_str(text);
                }
            }
            Node::Element(element) => match element.name() {
                "br" => out.push('\n'),
                "p" if !out.is_empty() => out.push_str("\n\n"),
                _ => {}
            },
            _ => {}
        }
    }

    out
}

// Tests.
