//! HTML parsing support.
//!
//! Turns a saved page (or any HTML fragment) into the CDP-style [`Node`]
//! tree and locates the summary container inside it.

use scraper::{ElementRef, Html, Node as ScraperNode, Selector};
use tracing::debug;

use crate::node::Node;
use crate::serialize::MarkdownSerializer;
use crate::style::StyleResolver;
use crate::{MinutesError, Result};

/// Selector of the rendered summary panel on a minutes page
pub const DEFAULT_CONTAINER_SELECTOR: &str = ".minutes-editable.ai-summary-content-editable";

/// Parse an HTML fragment into a Node tree.
///
/// # Example
///
/// ```rust
/// use minutes_md::{parse_html, to_markdown};
///
/// let node = parse_html("<div>Hello <span style=\"font-weight: bold\">World</span></div>");
/// assert_eq!(to_markdown(&node), "Hello **World**");
/// ```
pub fn parse_html(html: &str) -> Node {
    let document = Html::parse_fragment(html);
    scraper_to_node(document.root_element())
}

/// Parse a full HTML document and return the first element matching
/// `selector`, converted to a Node tree.
pub fn find_container(html: &str, selector: &str) -> Result<Node> {
    let parsed = parse_selector(selector)?;
    let document = Html::parse_document(html);

    let container = document
        .select(&parsed)
        .next()
        .ok_or_else(|| MinutesError::ContainerNotFound(selector.to_string()))?;

    debug!(
        tag = container.value().name(),
        children = container.children().count(),
        "Located content container"
    );
    Ok(scraper_to_node(container))
}

/// Locate the container in `html` and serialize it.
pub fn html_to_markdown<R: StyleResolver>(
    html: &str,
    selector: &str,
    serializer: &MarkdownSerializer<R>,
) -> Result<String> {
    let container = find_container(html, selector)?;
    Ok(serializer.serialize(&container))
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| MinutesError::InvalidSelector(format!("{selector}: {e}")))
}

/// Convert a scraper ElementRef to our Node structure
fn scraper_to_node(element: ElementRef) -> Node {
    let tag = element.value().name();

    let attrs: Vec<(&str, &str)> = element.value().attrs().collect();

    let mut node = if attrs.is_empty() {
        Node::element(tag)
    } else {
        Node::element_with_attrs(tag, attrs)
    };

    for child in element.children() {
        match child.value() {
            ScraperNode::Text(text) => {
                node.add_child(Node::text(&text.text));
            }
            ScraperNode::Comment(comment) => {
                node.add_child(Node::comment(&comment.comment));
            }
            ScraperNode::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    node.add_child(scraper_to_node(child_element));
                }
            }
            _ => {}
        }
    }

    node
}
