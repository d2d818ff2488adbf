//! Font-weight resolution for emphasis detection.

use indexmap::IndexMap;
use tracing::trace;

use crate::node::Node;
use crate::{MinutesError, Result};

/// Whether a CSS font-weight value renders as bold.
///
/// Only `bold` and `700` count; that is what the page's summary editor emits
/// and what a browser reports as the computed weight for both.
pub fn is_bold_weight(value: &str) -> bool {
    let value = value.trim();
    value.eq_ignore_ascii_case("bold") || value == "700"
}

/// Answers "is this run of text bold?" for a node.
///
/// Implementors only supply the computed weight; the inline `style`
/// attribute is consulted first by [`StyleResolver::is_bold`].
pub trait StyleResolver {
    /// Effective font weight of `node`, or `None` when it cannot be determined
    fn computed_font_weight(&self, node: &Node) -> Option<String>;

    fn is_bold(&self, node: &Node) -> bool {
        if let Some(weight) = node.style_property("font-weight") {
            return is_bold_weight(&weight);
        }
        match self.computed_font_weight(node) {
            Some(weight) => is_bold_weight(&weight),
            None => {
                trace!(tag = %node.tag_name(), "No computed font weight, treating as regular");
                false
            }
        }
    }
}

impl<R: StyleResolver + ?Sized> StyleResolver for &R {
    fn computed_font_weight(&self, node: &Node) -> Option<String> {
        (**self).computed_font_weight(node)
    }

    fn is_bold(&self, node: &Node) -> bool {
        (**self).is_bold(node)
    }
}

/// Resolver for detached trees: only inline styles are known.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineStyleResolver;

impl StyleResolver for InlineStyleResolver {
    fn computed_font_weight(&self, _node: &Node) -> Option<String> {
        None
    }
}

/// Computed weights from class rules, e.g. `.bold { font-weight: 700 }`.
///
/// Rules are kept in insertion order and a later matching rule wins.
#[derive(Debug, Clone, Default)]
pub struct ClassStyleSheet {
    rules: IndexMap<String, String>,
}

impl ClassStyleSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or move to the end) a `class -> font-weight` rule
    pub fn rule(&mut self, class: &str, font_weight: &str) -> &mut Self {
        self.rules.shift_remove(class);
        self.rules
            .insert(class.to_string(), font_weight.trim().to_string());
        self
    }

    /// Parse a `class=weight` pair such as `text-bold=700`
    pub fn parse_rule(&mut self, spec: &str) -> Result<&mut Self> {
        let (class, weight) = spec
            .split_once('=')
            .map(|(c, w)| (c.trim().trim_start_matches('.'), w.trim()))
            .filter(|(c, w)| !c.is_empty() && !w.is_empty())
            .ok_or_else(|| {
                MinutesError::InvalidInput(format!("expected <class>=<font-weight>, got {spec:?}"))
            })?;
        Ok(self.rule(class, weight))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl StyleResolver for ClassStyleSheet {
    fn computed_font_weight(&self, node: &Node) -> Option<String> {
        self.rules
            .iter()
            .rev()
            .find(|(class, _)| node.has_class(class))
            .map(|(_, weight)| weight.clone())
    }
}
