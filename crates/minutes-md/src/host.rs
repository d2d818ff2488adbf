//! Page-side glue: overlay suppression, section expansion, and the copy button.
//!
//! Nothing here touches a real browser. The host implements [`PageActions`]
//! and [`ClipboardSink`] for its page, feeds change notifications into a
//! [`Reconciler`], and drives a [`CopyButton`]. [`SnapshotPage`] implements
//! the same actions over a [`Node`] tree.

use std::fmt::Display;
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::node::Node;
use crate::serialize::MarkdownSerializer;
use crate::style::StyleResolver;

/// Stylesheet injected once: hides the quota overlay and styles the copy button.
pub const OVERLAY_STYLESHEET: &str = r#"
div.ai-quota-exceed-mask, div.linear-gradient-content { display: none !important; }
#floating-copy-button {
    position: absolute; top: 15px; right: 20px; z-index: 9999;
    padding: 6px 12px; font-size: 14px; font-weight: bold; color: #fff;
    background-color: #007AFF; border: none; border-radius: 6px;
    box-shadow: 0 2px 8px rgba(0,0,0,0.2); cursor: pointer;
    transition: all 0.2s ease-in-out;
}
#floating-copy-button:hover { background-color: #0056b3; transform: scale(1.05); }
#floating-copy-button.success { background-color: #28a745; }
#floating-copy-button.error { background-color: #dc3545; }
"#;

pub const COPY_BUTTON_ID: &str = "floating-copy-button";

/// Class of the panel the copy button is attached to
pub const PANEL_CLASS: &str = "detail-right-content";

/// Class of the wrapper around the "expand summary" button
pub const EXPAND_WRAPPER_CLASS: &str = "ai-summary-content-editable-expand-button-wrapper";

/// Attribute set on an expand button once it has been clicked
pub const EXPANDED_ATTRIBUTE: &str = "data-expanded";

/// Label text identifying an expand button
pub const EXPAND_LABEL: &str = "展开";

/// The two idempotent side effects re-run whenever the page changes.
pub trait PageActions {
    /// Click the collapsed-summary expand button if one is present and not
    /// yet clicked. Returns whether a click happened.
    fn expand_sections(&mut self) -> bool;

    /// Attach the copy button if the panel exists and the button does not.
    /// Returns whether the button was added.
    fn install_copy_button(&mut self) -> bool;
}

#[derive(Debug, Clone)]
pub struct ReconcilerOptions {
    /// Quiet period after the last change notification before acting
    pub debounce: Duration,
}

impl Default for ReconcilerOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(200),
        }
    }
}

/// What a [`Reconciler::poll`] did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub ran: bool,
    pub expanded: bool,
    pub button_installed: bool,
}

/// Debounced driver for [`PageActions`].
///
/// Bursts of change notifications collapse into a single pass, run once the
/// page has been quiet for the debounce window.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    options: ReconcilerOptions,
    last_change: Option<Instant>,
}

impl Reconciler {
    pub fn new(options: ReconcilerOptions) -> Self {
        Self {
            options,
            last_change: None,
        }
    }

    /// Record a page change
    pub fn notify(&mut self, now: Instant) {
        self.last_change = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.last_change.is_some()
    }

    /// Run the actions if a change is pending and the page has settled.
    pub fn poll<A: PageActions + ?Sized>(&mut self, now: Instant, actions: &mut A) -> ReconcileOutcome {
        let Some(last_change) = self.last_change else {
            return ReconcileOutcome::default();
        };
        if now.saturating_duration_since(last_change) < self.options.debounce {
            return ReconcileOutcome::default();
        }
        self.last_change = None;

        let outcome = ReconcileOutcome {
            ran: true,
            expanded: actions.expand_sections(),
            button_installed: actions.install_copy_button(),
        };
        if outcome.expanded || outcome.button_installed {
            debug!(
                expanded = outcome.expanded,
                button_installed = outcome.button_installed,
                "Reconciled page"
            );
        }
        outcome
    }
}

/// [`PageActions`] over an in-memory page tree.
#[derive(Debug, Clone)]
pub struct SnapshotPage {
    root: Node,
}

impl SnapshotPage {
    pub fn new(root: Node) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn into_root(self) -> Node {
        self.root
    }
}

impl PageActions for SnapshotPage {
    fn expand_sections(&mut self) -> bool {
        let Some(button) = find_expand_button(&mut self.root) else {
            return false;
        };
        if !button.text_content().contains(EXPAND_LABEL) {
            return false;
        }
        button.set_attr(EXPANDED_ATTRIBUTE, "true");
        info!("Expanded summary sections");
        true
    }

    fn install_copy_button(&mut self) -> bool {
        if find(&self.root, &|n: &Node| n.attr("id") == Some(COPY_BUTTON_ID)).is_some() {
            return false;
        }
        let Some(panel) = find_mut(&mut self.root, &|n: &Node| n.has_class(PANEL_CLASS)) else {
            return false;
        };

        let mut style = panel.inline_style();
        style.insert("position".to_string(), "relative".to_string());
        let style = style
            .iter()
            .map(|(property, value)| format!("{property}: {value}"))
            .collect::<Vec<_>>()
            .join("; ");
        panel.set_attr("style", &style);

        let mut button = Node::element_with_attrs("button", vec![("id", COPY_BUTTON_ID)]);
        button.add_child(Node::text(&CopyButtonOptions::default().idle_label));
        panel.add_child(button);
        info!("Installed copy button");
        true
    }
}

/// `button:not([data-expanded="true"])`
fn is_unexpanded_button(node: &Node) -> bool {
    node.tag_name() == "button" && node.attr(EXPANDED_ATTRIBUTE) != Some("true")
}

/// First `div.<wrapper> > button` not yet clicked, in document order
fn find_expand_button(node: &mut Node) -> Option<&mut Node> {
    if node.tag_name() == "div" && node.has_class(EXPAND_WRAPPER_CLASS) {
        return node
            .children
            .iter_mut()
            .flatten()
            .find(|child| is_unexpanded_button(child));
    }
    node.children.iter_mut().flatten().find_map(find_expand_button)
}

fn find<'a>(node: &'a Node, predicate: &dyn Fn(&Node) -> bool) -> Option<&'a Node> {
    if predicate(node) {
        return Some(node);
    }
    node.children().find_map(|child| find(child, predicate))
}

fn find_mut<'a>(node: &'a mut Node, predicate: &dyn Fn(&Node) -> bool) -> Option<&'a mut Node> {
    if predicate(node) {
        return Some(node);
    }
    node.children
        .iter_mut()
        .flatten()
        .find_map(|child| find_mut(child, predicate))
}

/// Receives the serialized text (the clipboard on a real page).
pub trait ClipboardSink {
    type Error: Display;

    fn write_text(&mut self, text: &str) -> std::result::Result<(), Self::Error>;
}

/// Visible state of the copy button
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CopyState {
    #[default]
    Idle,
    Copied,
    Failed,
}

#[derive(Debug, Clone)]
pub struct CopyButtonOptions {
    pub idle_label: String,
    pub copied_label: String,
    pub failed_label: String,
    /// How long the success/failure feedback stays up
    pub reset_after: Duration,
}

impl Default for CopyButtonOptions {
    fn default() -> Self {
        Self {
            idle_label: "复制为MD".to_string(),
            copied_label: "复制成功!".to_string(),
            failed_label: "复制失败".to_string(),
            reset_after: Duration::from_secs(2),
        }
    }
}

/// Label and feedback state of the floating copy button.
#[derive(Debug, Clone, Default)]
pub struct CopyButton {
    options: CopyButtonOptions,
    state: CopyState,
    changed_at: Option<Instant>,
}

impl CopyButton {
    pub fn new(options: CopyButtonOptions) -> Self {
        Self {
            options,
            state: CopyState::Idle,
            changed_at: None,
        }
    }

    pub fn state(&self) -> CopyState {
        self.state
    }

    pub fn label(&self) -> &str {
        match self.state {
            CopyState::Idle => &self.options.idle_label,
            CopyState::Copied => &self.options.copied_label,
            CopyState::Failed => &self.options.failed_label,
        }
    }

    /// CSS class matching [`OVERLAY_STYLESHEET`]
    pub fn class_name(&self) -> &'static str {
        match self.state {
            CopyState::Idle => "",
            CopyState::Copied => "success",
            CopyState::Failed => "error",
        }
    }

    /// Serialize `container` and hand it to `sink`.
    ///
    /// A missing container is a no-op, as on a page whose summary has not
    /// rendered yet.
    pub fn copy<R, S>(
        &mut self,
        container: Option<&Node>,
        serializer: &MarkdownSerializer<R>,
        sink: &mut S,
        now: Instant,
    ) -> CopyState
    where
        R: StyleResolver,
        S: ClipboardSink + ?Sized,
    {
        let Some(container) = container else {
            return self.state;
        };

        let markdown = serializer.serialize(container);
        self.state = match sink.write_text(&markdown) {
            Ok(()) => {
                info!(chars = markdown.chars().count(), "Copied summary as Markdown");
                CopyState::Copied
            }
            Err(e) => {
                error!("Copy failed: {e}");
                CopyState::Failed
            }
        };
        self.changed_at = Some(now);
        self.state
    }

    /// Return to [`CopyState::Idle`] once the feedback has been shown long enough
    pub fn tick(&mut self, now: Instant) -> CopyState {
        if let Some(changed_at) = self.changed_at {
            if now.saturating_duration_since(changed_at) >= self.options.reset_after {
                self.state = CopyState::Idle;
                self.changed_at = None;
            }
        }
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(expand_label: &str) -> Node {
        let mut wrapper =
            Node::element_with_attrs("div", vec![("class", EXPAND_WRAPPER_CLASS)]);
        let mut button = Node::element("button");
        button.add_child(Node::text(expand_label));
        wrapper.add_child(button);

        let mut panel = Node::element_with_attrs(
            "div",
            vec![("class", PANEL_CLASS), ("style", "color: black")],
        );
        panel.add_child(wrapper);

        let mut body = Node::element("body");
        body.add_child(panel);
        body
    }

    #[derive(Default)]
    struct CountingActions {
        passes: usize,
    }

    impl PageActions for CountingActions {
        fn expand_sections(&mut self) -> bool {
            self.passes += 1;
            false
        }

        fn install_copy_button(&mut self) -> bool {
            false
        }
    }

    #[derive(Default)]
    struct MemoryClipboard {
        text: Option<String>,
        reject: bool,
    }

    impl ClipboardSink for MemoryClipboard {
        type Error = String;

        fn write_text(&mut self, text: &str) -> std::result::Result<(), String> {
            if self.reject {
                return Err("permission denied".to_string());
            }
            self.text = Some(text.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_expand_is_idempotent() {
        let mut page = SnapshotPage::new(page("展开全部"));
        assert!(page.expand_sections());
        assert!(!page.expand_sections());

        let button = find(page.root(), &|n: &Node| n.tag_name() == "button").unwrap();
        assert_eq!(button.attr(EXPANDED_ATTRIBUTE), Some("true"));
    }

    #[test]
    fn test_expand_requires_label() {
        let mut page = SnapshotPage::new(page("收起"));
        assert!(!page.expand_sections());
    }

    #[test]
    fn test_install_copy_button_once() {
        let mut page = SnapshotPage::new(page("展开"));
        assert!(page.install_copy_button());
        assert!(!page.install_copy_button());

        let root = page.into_root();
        let panel = find(&root, &|n: &Node| n.has_class(PANEL_CLASS)).unwrap();
        assert_eq!(panel.style_property("position").as_deref(), Some("relative"));
        assert_eq!(panel.style_property("color").as_deref(), Some("black"));
        let button = find(&root, &|n: &Node| n.attr("id") == Some(COPY_BUTTON_ID)).unwrap();
        assert_eq!(button.text_content(), "复制为MD");
    }

    #[test]
    fn test_install_copy_button_without_panel() {
        let mut page = SnapshotPage::new(Node::element("body"));
        assert!(!page.install_copy_button());
    }

    #[test]
    fn test_reconciler_debounces() {
        let start = Instant::now();
        let mut reconciler = Reconciler::new(ReconcilerOptions {
            debounce: Duration::from_millis(100),
        });
        let mut actions = CountingActions::default();

        assert!(!reconciler.poll(start, &mut actions).ran);

        reconciler.notify(start);
        reconciler.notify(start + Duration::from_millis(50));
        assert!(reconciler.is_pending());
        assert!(!reconciler.poll(start + Duration::from_millis(120), &mut actions).ran);

        let outcome = reconciler.poll(start + Duration::from_millis(150), &mut actions);
        assert!(outcome.ran);
        assert_eq!(actions.passes, 1);
        assert!(!reconciler.is_pending());

        assert!(!reconciler.poll(start + Duration::from_secs(5), &mut actions).ran);
        assert_eq!(actions.passes, 1);
    }

    #[test]
    fn test_reconciler_drives_snapshot_page() {
        let start = Instant::now();
        let mut reconciler = Reconciler::default();
        let mut page = SnapshotPage::new(page("展开"));

        reconciler.notify(start);
        let outcome = reconciler.poll(start + Duration::from_secs(1), &mut page);
        assert_eq!(
            outcome,
            ReconcileOutcome {
                ran: true,
                expanded: true,
                button_installed: true,
            }
        );

        reconciler.notify(start + Duration::from_secs(2));
        let outcome = reconciler.poll(start + Duration::from_secs(3), &mut page);
        assert!(outcome.ran);
        assert!(!outcome.expanded);
        assert!(!outcome.button_installed);
    }

    #[test]
    fn test_copy_button_success_then_reset() {
        let start = Instant::now();
        let mut button = CopyButton::default();
        let mut clipboard = MemoryClipboard::default();
        let serializer = MarkdownSerializer::new();

        let mut div = Node::element("div");
        div.add_child(Node::text("Summary"));

        assert_eq!(button.label(), "复制为MD");
        let state = button.copy(Some(&div), &serializer, &mut clipboard, start);
        assert_eq!(state, CopyState::Copied);
        assert_eq!(button.label(), "复制成功!");
        assert_eq!(button.class_name(), "success");
        assert_eq!(clipboard.text.as_deref(), Some("Summary"));

        assert_eq!(button.tick(start + Duration::from_secs(1)), CopyState::Copied);
        assert_eq!(button.tick(start + Duration::from_secs(2)), CopyState::Idle);
        assert_eq!(button.class_name(), "");
    }

    #[test]
    fn test_copy_button_failure() {
        let start = Instant::now();
        let mut button = CopyButton::default();
        let mut clipboard = MemoryClipboard {
            reject: true,
            ..Default::default()
        };
        let serializer = MarkdownSerializer::new();
        let div = Node::element("div");

        let state = button.copy(Some(&div), &serializer, &mut clipboard, start);
        assert_eq!(state, CopyState::Failed);
        assert_eq!(button.label(), "复制失败");
        assert_eq!(button.class_name(), "error");
    }

    #[test]
    fn test_copy_without_container_is_noop() {
        let mut button = CopyButton::default();
        let mut clipboard = MemoryClipboard::default();
        let serializer = MarkdownSerializer::new();

        let state = button.copy(None, &serializer, &mut clipboard, Instant::now());
        assert_eq!(state, CopyState::Idle);
        assert!(clipboard.text.is_none());
    }

    #[test]
    fn test_stylesheet_hides_overlay() {
        assert!(OVERLAY_STYLESHEET.contains("div.ai-quota-exceed-mask"));
        assert!(OVERLAY_STYLESHEET.contains("display: none !important"));
        assert!(OVERLAY_STYLESHEET.contains(&format!("#{COPY_BUTTON_ID}.success")));
    }
}
