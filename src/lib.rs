#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]

/*!
Virtualized, compressible tree model with a [ratatui] renderer.

The [`TreeModel`] owns the hierarchy. Children are given as lazy [`TreeElement`] descriptors via [`TreeModel::set_children`].
Collapsing, filtering and compressing chains of single children into one row keep a flat list of visible [`Row`]s up to date.
Every mutation queues a [`TreeChange`] describing the minimal splice of the rows.

Focus, selection and collapsed states are tracked by identity when an identity provider is configured in the [`TreeOptions`].
That way they survive replacing the children with new elements.

The [`Tree`] widget renders the visible rows of a model, the user interaction state (scroll offset) is kept in the [`TreeState`].
*/

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Scrollbar, ScrollbarState, StatefulWidget, Widget};
use unicode_width::UnicodeWidthStr;

mod compress;
mod element;
mod error;
mod filter;
mod flatten;
mod identity;
#[cfg(feature = "json")]
pub mod json;
mod model;
mod navigator;
mod node;
mod options;
mod tree_state;

pub use crate::element::TreeElement;
pub use crate::error::{Result, TreeError};
pub use crate::filter::{FilterResult, TreeFilter};
pub use crate::flatten::{Row, RowKind, RowSplice};
pub use crate::identity::{IdentityProvider, TraitKey};
pub use crate::model::{ChangeCause, TreeChange, TreeModel};
pub use crate::navigator::{Navigator, View};
pub use crate::node::{Node, NodeId};
pub use crate::options::TreeOptions;
pub use crate::tree_state::TreeState;

/// Turns elements into the text of a row.
pub trait RowRenderer<T> {
    fn render_node<'t>(&self, element: &'t T) -> Line<'t>;

    /// Text of a [compressed](RowKind::Compressed) row, the head element first.
    ///
    /// Joins the rendered elements with `/` by default.
    fn render_compressed<'t>(&self, elements: &[&'t T]) -> Line<'t> {
        let mut spans = Vec::new();
        for (index, element) in elements.iter().copied().enumerate() {
            if index > 0 {
                spans.push(Span::raw("/"));
            }
            spans.extend(self.render_node(element).spans);
        }
        Line::from(spans)
    }
}

/// Renders elements with their [`Display`](std::fmt::Display) implementation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DisplayRenderer;

impl<T> RowRenderer<T> for DisplayRenderer
where
    T: std::fmt::Display,
{
    fn render_node<'t>(&self, element: &'t T) -> Line<'t> {
        Line::raw(element.to_string())
    }
}

/// A `Tree` showing the rows of a [`TreeModel`] which can be rendered.
///
/// Only the rows inside of the area are rendered.
/// The focused row is highlighted and kept in view when requested by the [`TreeState`].
///
/// # Example
///
/// ```
/// # use tui_tree_model::{Tree, TreeElement, TreeModel, TreeState};
/// # use ratatui::backend::TestBackend;
/// # use ratatui::Terminal;
/// # use ratatui::widgets::Block;
/// # let mut terminal = Terminal::new(TestBackend::new(32, 32)).unwrap();
/// let mut model = TreeModel::<&str>::default();
/// model.set_children(None, vec![TreeElement::new_leaf("leaf")])?;
/// let mut state = TreeState::default();
///
/// terminal.draw(|frame| {
///     let area = frame.size();
///
///     let tree_widget = Tree::new(&model).block(Block::bordered().title("Tree Widget"));
///
///     frame.render_stateful_widget(tree_widget, area, &mut state);
/// })?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Tree<'a, T, K = (), R = DisplayRenderer> {
    model: &'a TreeModel<T, K>,
    renderer: R,

    block: Option<Block<'a>>,
    scrollbar: Option<Scrollbar<'a>>,
    /// Style used as a base style for the widget
    style: Style,

    /// Style used to render the focused row
    highlight_style: Style,
    /// Style used to render selected rows
    selection_style: Style,
    /// Symbol in front of the focused row (Shift all rows to the right)
    highlight_symbol: &'a str,

    /// Symbol displayed in front of a collapsed row (As in the children are currently not visible)
    node_closed_symbol: &'a str,
    /// Symbol displayed in front of an expanded row. (As in the children are currently visible)
    node_open_symbol: &'a str,
    /// Symbol displayed in front of a row which can not be expanded.
    node_no_children_symbol: &'a str,
}

impl<'a, T, K> Tree<'a, T, K> {
    #[must_use]
    pub const fn new(model: &'a TreeModel<T, K>) -> Self {
        Self {
            model,
            renderer: DisplayRenderer,
            block: None,
            scrollbar: None,
            style: Style::new(),
            highlight_style: Style::new(),
            selection_style: Style::new(),
            highlight_symbol: "",
            node_closed_symbol: "\u{25b6} ", // Arrow to right
            node_open_symbol: "\u{25bc} ",   // Arrow down
            node_no_children_symbol: "  ",
        }
    }
}

impl<'a, T, K, R> Tree<'a, T, K, R> {
    /// Use another [`RowRenderer`] for the text of the rows.
    #[must_use]
    pub fn renderer<Other>(self, renderer: Other) -> Tree<'a, T, K, Other> {
        Tree {
            model: self.model,
            renderer,
            block: self.block,
            scrollbar: self.scrollbar,
            style: self.style,
            highlight_style: self.highlight_style,
            selection_style: self.selection_style,
            highlight_symbol: self.highlight_symbol,
            node_closed_symbol: self.node_closed_symbol,
            node_open_symbol: self.node_open_symbol,
            node_no_children_symbol: self.node_no_children_symbol,
        }
    }

    #[allow(clippy::missing_const_for_fn)]
    #[must_use]
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    /// Show the scrollbar when rendering this widget.
    ///
    /// Experimental: Can change on any release without any additional notice.
    #[allow(clippy::missing_const_for_fn)]
    #[must_use]
    pub fn experimental_scrollbar(mut self, scrollbar: Option<Scrollbar<'a>>) -> Self {
        self.scrollbar = scrollbar;
        self
    }

    #[must_use]
    pub const fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub const fn highlight_style(mut self, style: Style) -> Self {
        self.highlight_style = style;
        self
    }

    #[must_use]
    pub const fn selection_style(mut self, style: Style) -> Self {
        self.selection_style = style;
        self
    }

    #[must_use]
    pub const fn highlight_symbol(mut self, highlight_symbol: &'a str) -> Self {
        self.highlight_symbol = highlight_symbol;
        self
    }

    #[must_use]
    pub const fn node_closed_symbol(mut self, symbol: &'a str) -> Self {
        self.node_closed_symbol = symbol;
        self
    }

    #[must_use]
    pub const fn node_open_symbol(mut self, symbol: &'a str) -> Self {
        self.node_open_symbol = symbol;
        self
    }

    #[must_use]
    pub const fn node_no_children_symbol(mut self, symbol: &'a str) -> Self {
        self.node_no_children_symbol = symbol;
        self
    }
}

impl<'a, T, K, R> Tree<'a, T, K, R>
where
    K: Clone + Eq + core::hash::Hash,
    R: RowRenderer<T>,
{
    fn row_line(&self, row: &Row) -> Line<'a> {
        let model = self.model;
        match row.kind() {
            RowKind::Node => model
                .element(row.head())
                .map_or_else(|_| Line::default(), |element| self.renderer.render_node(element)),
            RowKind::Compressed => self.renderer.render_compressed(&model.row_elements(row)),
        }
    }

    fn row_matches(&self, row: &Row, predicate: impl Fn(NodeId) -> bool) -> bool {
        self.model.row_nodes(row).into_iter().any(predicate)
    }
}

impl<'a, T, K, R> StatefulWidget for Tree<'a, T, K, R>
where
    K: Clone + Eq + core::hash::Hash,
    R: RowRenderer<T>,
{
    type State = TreeState;

    fn render(self, full_area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        buf.set_style(full_area, self.style);

        // Get the inner area inside a possible block, otherwise use the full area
        let area = self.block.as_ref().map_or(full_area, |block| {
            let inner_area = block.inner(full_area);
            block.clone().render(full_area, buf);
            inner_area
        });

        if area.width < 1 || area.height < 1 {
            return;
        }

        let rows = self.model.rows();
        if rows.is_empty() {
            return;
        }
        let available_height = area.height as usize;

        let focused_index = self.model.focused_row_index();
        let ensure_index_in_view = if state.ensure_focus_in_view_on_next_render {
            focused_index
        } else {
            None
        };

        // Ensure last line is still visible
        let mut start = state.offset.min(rows.len().saturating_sub(1));
        if let Some(ensure_index_in_view) = ensure_index_in_view {
            start = start.min(ensure_index_in_view);
        }
        let mut end = start.saturating_add(available_height).min(rows.len());
        if let Some(ensure_index_in_view) = ensure_index_in_view {
            if ensure_index_in_view >= end {
                end = ensure_index_in_view + 1;
                start = end.saturating_sub(available_height);
            }
        }
        let height = end - start;

        state.offset = start;
        state.ensure_focus_in_view_on_next_render = false;

        if let Some(scrollbar) = self.scrollbar.clone() {
            let mut scrollbar_state = ScrollbarState::new(rows.len().saturating_sub(height))
                .position(start)
                .viewport_content_length(height);
            let scrollbar_area = Rect {
                // Inner height to be exactly as the content
                y: area.y,
                height: area.height,
                // Outer width to stay on the right border
                x: full_area.x,
                width: full_area.width,
            };
            scrollbar.render(scrollbar_area, buf, &mut scrollbar_state);
        }

        let blank_symbol = " ".repeat(self.highlight_symbol.width());
        let has_focus = focused_index.is_some();

        #[allow(clippy::cast_possible_truncation)]
        for (offset, row) in rows[start..end].iter().enumerate() {
            let x = area.x;
            let y = area.y + offset as u16;
            let row_area = Rect {
                x,
                y,
                width: area.width,
                height: 1,
            };

            let is_focused = self.row_matches(row, |id| self.model.is_focused(id));
            let is_selected = self.row_matches(row, |id| self.model.is_selected(id));

            let after_highlight_symbol_x = if has_focus {
                let symbol = if is_focused {
                    self.highlight_symbol
                } else {
                    &blank_symbol
                };
                let (x, _) = buf.set_stringn(x, y, symbol, area.width as usize, self.style);
                x
            } else {
                x
            };

            let after_depth_x = {
                let indent_width = row.depth() * 2;
                let (after_indent_x, _) = buf.set_stringn(
                    after_highlight_symbol_x,
                    y,
                    " ".repeat(indent_width),
                    indent_width,
                    self.style,
                );
                let symbol = if !row.is_expandable() {
                    self.node_no_children_symbol
                } else if row.is_collapsed() {
                    self.node_closed_symbol
                } else {
                    self.node_open_symbol
                };
                let max_width = area.width.saturating_sub(after_indent_x - x);
                let (x, _) =
                    buf.set_stringn(after_indent_x, y, symbol, max_width as usize, self.style);
                x
            };

            let max_element_width = area.width.saturating_sub(after_depth_x - x);
            let line = self.row_line(row);
            buf.set_line(after_depth_x, y, &line, max_element_width);

            if is_selected {
                buf.set_style(row_area, self.selection_style);
            }
            if is_focused {
                buf.set_style(row_area, self.highlight_style);
            }
        }
    }
}

impl<'a, T, K, R> Widget for Tree<'a, T, K, R>
where
    K: Clone + Eq + core::hash::Hash,
    R: RowRenderer<T>,
{
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut state = TreeState::default();
        StatefulWidget::render(self, area, buf, &mut state);
    }
}
