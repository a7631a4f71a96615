use std::hash::Hash;

use tracing::trace;

use crate::model::TreeModel;

/// Keeps the user interaction state of a [`Tree`](crate::Tree) which is not part of the [`TreeModel`].
///
/// Focus, selection and collapsed states live in the model as they are tracked by identity.
/// The `TreeState` only knows the scroll offset and moves the focus through the visible rows of a model.
///
/// # Example
///
/// ```
/// # use tui_tree_model::{TreeElement, TreeModel, TreeState};
/// let mut model = TreeModel::<&str>::default();
/// model.set_children(None, ["a", "b"].map(TreeElement::new_leaf))?;
///
/// let mut state = TreeState::default();
/// state.focus_next(&mut model);
/// assert_eq!(model.focus(), [&"a"]);
/// # Ok::<(), tui_tree_model::TreeError>(())
/// ```
#[derive(Debug, Default, Clone)]
pub struct TreeState {
    pub(super) offset: usize,
    pub(super) ensure_focus_in_view_on_next_render: bool,
}

impl TreeState {
    #[must_use]
    pub const fn get_offset(&self) -> usize {
        self.offset
    }

    /// Ensure the focused row is visible on next render
    pub fn scroll_focus_into_view(&mut self) {
        self.ensure_focus_in_view_on_next_render = true;
    }

    /// Scroll the specified amount of lines up
    ///
    /// Returns `true` when the scroll position changed.
    /// Returns `false` when the scrolling has reached the top.
    pub fn scroll_up(&mut self, lines: usize) -> bool {
        let before = self.offset;
        self.offset = self.offset.saturating_sub(lines);
        before != self.offset
    }

    /// Scroll the specified amount of lines down
    ///
    /// In contrast to [`scroll_up()`](Self::scroll_up) this can not return whether the view position changed or not as the actual change is determined on render.
    /// Always returns `true`.
    pub fn scroll_down(&mut self, lines: usize) -> bool {
        self.offset = self.offset.saturating_add(lines);
        true
    }

    /// Focus the row on the given index.
    /// Indices past the end focus the last row.
    ///
    /// Returns `true` when the focus changed.
    ///
    /// This can be useful for mouse clicks.
    pub fn focus_visible_index<T, K>(&mut self, model: &mut TreeModel<T, K>, index: usize) -> bool
    where
        K: Clone + Eq + Hash,
    {
        self.focus_visible_relative(model, |_| index)
    }

    /// Move the focus with the direction/amount by the given function.
    ///
    /// The function gets the index of the currently focused row.
    /// Returns `true` when the focus changed.
    ///
    /// # Example
    ///
    /// ```
    /// # use tui_tree_model::{TreeModel, TreeState};
    /// # let mut model = TreeModel::<usize>::default();
    /// # let mut state = TreeState::default();
    /// // Move the focus two rows down
    /// state.focus_visible_relative(&mut model, |current| {
    ///     current.map_or(0, |current| current.saturating_add(2))
    /// });
    /// ```
    pub fn focus_visible_relative<T, K, F>(
        &mut self,
        model: &mut TreeModel<T, K>,
        change_function: F,
    ) -> bool
    where
        K: Clone + Eq + Hash,
        F: FnOnce(Option<usize>) -> usize,
    {
        self.ensure_focus_in_view_on_next_render = true;
        let current = model.focused_row_index();
        let index = change_function(current).min(model.len().saturating_sub(1));
        let Some(row) = model.row(index) else {
            return false;
        };
        trace!(?current, index, "move focus");
        model.set_focus(&[row.head()]).unwrap_or(false)
    }

    /// Focus the first row.
    ///
    /// Returns `true` when the focus changed.
    pub fn focus_first<T, K>(&mut self, model: &mut TreeModel<T, K>) -> bool
    where
        K: Clone + Eq + Hash,
    {
        self.focus_visible_index(model, 0)
    }

    /// Focus the last row.
    ///
    /// Returns `true` when the focus changed.
    pub fn focus_last<T, K>(&mut self, model: &mut TreeModel<T, K>) -> bool
    where
        K: Clone + Eq + Hash,
    {
        self.focus_visible_index(model, usize::MAX)
    }

    /// Handles the down arrow key.
    /// Focuses the next row, the first one when nothing is focused.
    ///
    /// Returns `true` when the focus changed.
    pub fn focus_next<T, K>(&mut self, model: &mut TreeModel<T, K>) -> bool
    where
        K: Clone + Eq + Hash,
    {
        self.focus_visible_relative(model, |current| {
            current.map_or(0, |current| current.saturating_add(1))
        })
    }

    /// Handles the up arrow key.
    /// Focuses the previous row, the last one when nothing is focused.
    ///
    /// Returns `true` when the focus changed.
    pub fn focus_previous<T, K>(&mut self, model: &mut TreeModel<T, K>) -> bool
    where
        K: Clone + Eq + Hash,
    {
        self.focus_visible_relative(model, |current| {
            current.map_or(usize::MAX, |current| current.saturating_sub(1))
        })
    }

    /// Handles the left arrow key.
    /// Collapses the focused row or moves the focus to its parent row.
    ///
    /// Returns `true` when the focus or the collapsed state changed.
    pub fn collapse_focused<T, K>(&mut self, model: &mut TreeModel<T, K>) -> bool
    where
        K: Clone + Eq + Hash,
    {
        self.ensure_focus_in_view_on_next_render = true;
        let Some(row) = model
            .focused_row_index()
            .and_then(|index| model.row(index))
        else {
            return false;
        };
        if row.is_expandable() && !row.is_collapsed() {
            return model.set_collapsed(row.terminal(), true).unwrap_or(false);
        }
        // The parent of the head is shown by the row above in the hierarchy
        let parent = model.parent(row.head()).ok().flatten();
        parent.is_some_and(|parent| model.set_focus(&[parent]).unwrap_or(false))
    }

    /// Handles the right arrow key.
    /// Expands the focused row.
    ///
    /// Returns `true` if the row was collapsed and has been expanded.
    pub fn expand_focused<T, K>(&mut self, model: &mut TreeModel<T, K>) -> bool
    where
        K: Clone + Eq + Hash,
    {
        self.ensure_focus_in_view_on_next_render = true;
        let Some(row) = model
            .focused_row_index()
            .and_then(|index| model.row(index))
        else {
            return false;
        };
        row.is_collapsed() && model.set_collapsed(row.terminal(), false).unwrap_or(false)
    }

    /// Toggles the collapsed state of the focused row.
    ///
    /// Returns `true` when the row was collapsed or expanded.
    /// Only returns `false` when nothing is focused or the row can not be collapsed.
    pub fn toggle_focused<T, K>(&mut self, model: &mut TreeModel<T, K>) -> bool
    where
        K: Clone + Eq + Hash,
    {
        self.ensure_focus_in_view_on_next_render = true;
        let Some(row) = model
            .focused_row_index()
            .and_then(|index| model.row(index))
        else {
            return false;
        };
        model
            .set_collapsed(row.terminal(), !row.is_collapsed())
            .unwrap_or(false)
    }
}
