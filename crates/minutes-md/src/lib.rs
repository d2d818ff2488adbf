//! # minutes-md
//!
//! Convert the rendered summary of a meeting-minutes page to lightweight
//! Markdown: newline-separated blocks, `- ` bullets indented two spaces per
//! nesting level, and `**bold**` runs.
//!
//! ## Design
//!
//! The serializer walks a CDP-style [`Node`] tree. Where the tree comes from
//! (a live page, a saved HTML file) and where the text goes (clipboard,
//! stdout) is up to the host:
//!
//! - **Tree provider**: [`parse_html`] / [`find_container`] behind the `html` feature
//! - **Style resolution**: the [`StyleResolver`] trait decides which spans are bold
//! - **Page glue**: the [`host`] module keeps the page expanded and the copy button wired
//!
//! ## Example
//!
//! ```rust
//! use minutes_md::{to_markdown, Node};
//!
//! let mut ul = Node::element("ul");
//! for text in ["A", "B"] {
//!     let mut li = Node::element("li");
//!     li.add_child(Node::text(text));
//!     ul.add_child(li);
//! }
//!
//! assert_eq!(to_markdown(&ul), "- A\n- B");
//! ```

pub mod host;
#[cfg(feature = "html")]
pub mod html;
pub mod node;
mod serialize;
mod style;

#[cfg(feature = "html")]
pub use html::{find_container, html_to_markdown, parse_html, DEFAULT_CONTAINER_SELECTOR};
pub use node::{ElementKind, Node, NodeType};
pub use serialize::{normalize, to_markdown, MarkdownSerializer, SerializerOptions};
pub use style::{is_bold_weight, ClassStyleSheet, InlineStyleResolver, StyleResolver};

/// Error type for minutes-md operations
#[derive(Debug, thiserror::Error)]
pub enum MinutesError {
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("No element matches {0}")]
    ContainerNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, MinutesError>;
