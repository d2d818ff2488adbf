//! The markup-to-Markdown tree walk.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::node::{ElementKind, Node, NodeType};
use crate::style::{InlineStyleResolver, StyleResolver};

/// Newline, any whitespace, newline: a blank line.
///
/// Whitespace is the ECMAScript set: Unicode `White_Space` plus U+FEFF,
/// minus U+0085, so copied text matches what the page itself produces.
static BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[\s\x{FEFF}&&[^\x{85}]]*\n").unwrap());

fn is_page_whitespace(c: char) -> bool {
    c == '\u{feff}' || (c.is_whitespace() && c != '\u{85}')
}

/// Collapse blank lines to a single newline and trim the result.
///
/// Applying it twice gives the same output as applying it once.
pub fn normalize(output: &str) -> String {
    BLANK_LINES
        .replace_all(output, "\n")
        .trim_matches(is_page_whitespace)
        .to_string()
}

/// Options for [`MarkdownSerializer`]
#[derive(Debug, Clone)]
pub struct SerializerOptions {
    /// Class marking a block as list-item internals (no trailing newline)
    pub list_wrapper_class: String,

    /// Attribute marking a span as a line-break artifact to drop
    pub soft_break_attribute: String,

    /// Indent unit repeated once per nesting level below the first
    pub indent: String,

    /// Bullet written before every list item
    pub bullet: String,

    /// Delimiter wrapped around bold spans
    pub strong_delimiter: String,
}

impl Default for SerializerOptions {
    fn default() -> Self {
        Self {
            list_wrapper_class: "list-div".to_string(),
            soft_break_attribute: "data-enter".to_string(),
            indent: "  ".to_string(),
            bullet: "- ".to_string(),
            strong_delimiter: "**".to_string(),
        }
    }
}

/// Serializes a markup tree to Markdown-style text.
pub struct MarkdownSerializer<R = InlineStyleResolver> {
    options: SerializerOptions,
    resolver: R,
}

impl MarkdownSerializer<InlineStyleResolver> {
    /// Serializer with default options that only knows inline styles
    pub fn new() -> Self {
        Self::with_resolver(InlineStyleResolver)
    }
}

impl Default for MarkdownSerializer<InlineStyleResolver> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: StyleResolver> MarkdownSerializer<R> {
    pub fn with_resolver(resolver: R) -> Self {
        Self {
            options: SerializerOptions::default(),
            resolver,
        }
    }

    pub fn with_options(options: SerializerOptions, resolver: R) -> Self {
        Self { options, resolver }
    }

    /// Serialize the tree rooted at `root`, then normalize the result
    pub fn serialize(&self, root: &Node) -> String {
        normalize(&self.serialize_raw(root))
    }

    /// The accumulated output before normalization
    pub fn serialize_raw(&self, root: &Node) -> String {
        let mut output = String::new();
        self.write_node(root, 0, &mut output);
        output
    }

    fn write_node(&self, node: &Node, depth: usize, output: &mut String) {
        match node.node_type {
            NodeType::Text => {
                if let Some(text) = node.node_value.as_deref() {
                    output.push_str(text);
                }
            }
            NodeType::Element => {
                let kind = node.kind().unwrap_or(ElementKind::Transparent);
                self.write_element(node, kind, depth, output)
            }
            NodeType::Document | NodeType::DocumentFragment => {
                self.write_children(node, depth, output)
            }
            NodeType::Comment => {}
        }
    }

    fn write_children(&self, node: &Node, depth: usize, output: &mut String) {
        for child in node.children() {
            self.write_node(child, depth, output);
        }
    }

    fn write_element(&self, node: &Node, kind: ElementKind, depth: usize, output: &mut String) {
        let (prefix, suffix) = match kind {
            ElementKind::Block => {
                if node.has_class(&self.options.list_wrapper_class) {
                    (String::new(), String::new())
                } else {
                    (String::new(), "\n".to_string())
                }
            }
            ElementKind::UnorderedList | ElementKind::OrderedList => {
                self.write_children(node, depth + 1, output);
                return;
            }
            ElementKind::ListItem => {
                let mut prefix = self.options.indent.repeat(depth.saturating_sub(1));
                prefix.push_str(&self.options.bullet);
                (prefix, "\n".to_string())
            }
            ElementKind::Span => {
                if node.has_attr(&self.options.soft_break_attribute) {
                    trace!("Skipping soft line marker");
                    return;
                }
                if self.resolver.is_bold(node) {
                    let delimiter = self.options.strong_delimiter.clone();
                    (delimiter.clone(), delimiter)
                } else {
                    (String::new(), String::new())
                }
            }
            ElementKind::Transparent => (String::new(), String::new()),
        };

        output.push_str(&prefix);
        self.write_children(node, depth, output);
        output.push_str(&suffix);
    }
}

/// Serialize with default options and inline styles only
pub fn to_markdown(root: &Node) -> String {
    MarkdownSerializer::new().serialize(root)
}
