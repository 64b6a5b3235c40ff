//! Logging and debugging facilities for Horizon Sections.
//!
//! Horizon Sections uses the `tracing` crate for instrumentation. To see
//! logs, install a subscriber in your application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_sections=trace")
//!     .init();
//! ```
//!
//! The [`targets`] constants name the subsystems, so a filter such as
//! `horizon_sections::composite=trace` shows only composite re-basing.
//!
//! [`TreeFormatOptions`] and [`TreeStyle`] configure the textual provider
//! tree dumps produced by `horizon_sections::ProviderTreeDebug`.

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core framework target.
    pub const CORE: &str = "horizon_sections_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_sections_core::signal";
    /// Shared provider base (notifications, observer slot, loading).
    pub const PROVIDER: &str = "horizon_sections::provider";
    /// Composite provider target.
    pub const COMPOSITE: &str = "horizon_sections::composite";
    /// Selector provider target.
    pub const SELECTOR: &str = "horizon_sections::selector";
    /// Leaf provider target.
    pub const LEAF: &str = "horizon_sections::leaf";
    /// Root signal hub target.
    pub const ROOT: &str = "horizon_sections::root";
}

/// Span names used throughout Horizon Sections for tracing.
pub mod span_names {
    /// Composite layout recomputation.
    pub const RECOMPUTE: &str = "horizon_sections::recompute";
    /// Coalesced batch update.
    pub const BATCH: &str = "horizon_sections::batch";
    /// Selector switch.
    pub const SELECT: &str = "horizon_sections::select";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Compact single-line representation.
    Compact,
}

impl TreeStyle {
    /// Branch glyph placed before a node.
    pub fn branch(self, is_last: bool) -> &'static str {
        match (self, is_last) {
            (TreeStyle::Ascii, false) => "|-- ",
            (TreeStyle::Ascii, true) => "`-- ",
            (TreeStyle::Unicode, false) => "├── ",
            (TreeStyle::Unicode, true) => "└── ",
            (TreeStyle::Compact, _) => "",
        }
    }

    /// Continuation glyph placed under a node for its descendants.
    pub fn continuation(self, is_last: bool) -> &'static str {
        match (self, is_last) {
            (TreeStyle::Ascii, false) => "|   ",
            (TreeStyle::Unicode, false) => "│   ",
            (TreeStyle::Ascii | TreeStyle::Unicode, true) => "    ",
            (TreeStyle::Compact, _) => "",
        }
    }
}

/// Configuration for provider tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show provider IDs.
    pub show_ids: bool,
    /// Whether to show provider kinds.
    pub show_kinds: bool,
    /// Whether to show per-section item counts.
    pub show_item_counts: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: true,
            show_kinds: true,
            show_item_counts: false,
            max_depth: None,
        }
    }
}

impl TreeFormatOptions {
    /// Create options for detailed debugging output.
    pub fn detailed() -> Self {
        Self {
            show_item_counts: true,
            ..Default::default()
        }
    }

    /// Create options for minimal output.
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_kinds: false,
            show_item_counts: false,
            ..Default::default()
        }
    }

    /// Set the tree style.
    pub fn with_style(mut self, style: TreeStyle) -> Self {
        self.style = style;
        self
    }

    /// Limit the traversal depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}
