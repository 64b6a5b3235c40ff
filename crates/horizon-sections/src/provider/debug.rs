//! Textual dumps of provider trees.

use std::fmt::Write as FmtWrite;

use horizon_sections_core::{TreeFormatOptions, TreeStyle};

use super::traits::{Provider, ProviderId};

/// Renders a provider tree for debugging.
///
/// ```
/// use horizon_sections::{CompositeProvider, LeafProvider, ProviderTreeDebug, TreeFormatOptions};
///
/// let root = CompositeProvider::<u32>::with_title("Root");
/// root.add_child(LeafProvider::<u32>::builder().title("Inbox").sections(vec![vec![1]]).build());
///
/// let dump = ProviderTreeDebug::with_options(TreeFormatOptions::minimal()).format(&*root);
/// assert_eq!(dump, "Root: 1 section\n└── Inbox: 1 section\n");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProviderTreeDebug {
    options: TreeFormatOptions,
}

impl ProviderTreeDebug {
    /// Create a debug renderer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a debug renderer with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Format the tree rooted at `root`.
    pub fn format<P: Provider + ?Sized>(&self, root: &P) -> String {
        let mut output = String::new();
        self.format_node(root, None, 0, "", true, &mut output);
        output
    }

    fn format_node<P: Provider + ?Sized>(
        &self,
        node: &P,
        parent_active: Option<ProviderId>,
        depth: usize,
        prefix: &str,
        is_last: bool,
        output: &mut String,
    ) {
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return;
        }

        let style = self.options.style;
        output.push_str(prefix);
        if depth > 0 {
            match style {
                TreeStyle::Compact => output.push_str("- "),
                _ => output.push_str(style.branch(is_last)),
            }
        }

        let title = node.title();
        output.push_str(title.as_deref().unwrap_or("(untitled)"));
        if self.options.show_kinds {
            write!(output, " <{}>", node.kind()).expect("write to String");
        }
        if self.options.show_ids {
            write!(output, " {}", node.id()).expect("write to String");
        }

        let sections = node.section_count();
        let noun = if sections == 1 { "section" } else { "sections" };
        write!(output, ": {sections} {noun}").expect("write to String");
        if self.options.show_item_counts {
            let counts: Vec<usize> = (0..sections).map(|s| node.item_count(s)).collect();
            write!(output, " {counts:?}").expect("write to String");
        }
        if parent_active == Some(node.id()) {
            output.push_str(" (active)");
        }
        output.push('\n');

        let child_prefix = match (depth, style) {
            (0, _) => String::new(),
            (_, TreeStyle::Compact) => format!("{prefix}  "),
            _ => format!("{prefix}{}", style.continuation(is_last)),
        };
        let active = node.active_child();
        let children = node.children();
        let last = children.len().saturating_sub(1);
        for (index, child) in children.iter().enumerate() {
            self.format_node(&**child, active, depth + 1, &child_prefix, index == last, output);
        }
    }
}
