use std::fmt;

use crate::error::{Result, TreeError};

type Children<'a, T> = Box<dyn Iterator<Item = TreeElement<'a, T>> + 'a>;

/// Describes one node handed to [`TreeModel::set_children`](crate::TreeModel::set_children).
///
/// Can have zero or more `children`.
/// The children are a lazy iterator which is consumed exactly once by [`set_children`](crate::TreeModel::set_children).
/// They are all validated before anything is inserted.
/// In order to supply different children later call [`set_children`](crate::TreeModel::set_children) again.
///
/// # Collapsing
///
/// Without an explicit [`collapsible`](Self::collapsible) a node is collapsible when it has children or an explicit [`collapsed`](Self::collapsed) state.
/// A directory which children are loaded lazily can be created as `TreeElement::new_leaf(dir).collapsible(true)`.
///
/// When `collapsed` is not given the state of the previous node with the same identity is kept.
/// Without such a node the [`collapse_by_default`](crate::TreeOptions::collapse_by_default) option decides.
///
/// # Example
///
/// ```
/// # use tui_tree_model::TreeElement;
/// let a = TreeElement::new_leaf("Leaf");
/// let b = TreeElement::new("Root", vec![a]).collapsed(true);
/// ```
pub struct TreeElement<'a, T> {
    pub(crate) element: T,
    pub(crate) children: Option<Children<'a, T>>,
    pub(crate) collapsed: Option<bool>,
    pub(crate) collapsible: Option<bool>,
    pub(crate) incompressible: bool,
}

impl<'a, T> TreeElement<'a, T> {
    /// Create a new `TreeElement` without children.
    #[must_use]
    pub const fn new_leaf(element: T) -> Self {
        Self {
            element,
            children: None,
            collapsed: None,
            collapsible: None,
            incompressible: false,
        }
    }

    /// Create a new `TreeElement` with children.
    #[must_use]
    pub fn new<I>(element: T, children: I) -> Self
    where
        I: IntoIterator<Item = Self>,
        I::IntoIter: 'a,
    {
        Self {
            element,
            children: Some(Box::new(children.into_iter())),
            collapsed: None,
            collapsible: None,
            incompressible: false,
        }
    }

    #[must_use]
    pub const fn collapsed(mut self, collapsed: bool) -> Self {
        self.collapsed = Some(collapsed);
        self
    }

    #[must_use]
    pub const fn collapsible(mut self, collapsible: bool) -> Self {
        self.collapsible = Some(collapsible);
        self
    }

    /// Never merge this node into the row of its parent when compressing.
    #[must_use]
    pub const fn incompressible(mut self) -> Self {
        self.incompressible = true;
        self
    }

    #[must_use]
    pub const fn element(&self) -> &T {
        &self.element
    }

    /// Consume the lazy children and check the descriptors.
    pub(crate) fn stage(self) -> Result<Staged<T>> {
        if self.collapsed == Some(true) && self.collapsible == Some(false) {
            return Err(TreeError::InvalidOperation(
                "a non-collapsible element can not start collapsed",
            ));
        }
        let children = match self.children {
            None => Vec::new(),
            Some(children) => children.map(Self::stage).collect::<Result<Vec<_>>>()?,
        };
        let collapsible = self
            .collapsible
            .unwrap_or(self.collapsed.is_some() || !children.is_empty());
        Ok(Staged {
            element: self.element,
            children,
            collapsed: self.collapsed,
            collapsible,
            incompressible: self.incompressible,
        })
    }
}

impl<T: fmt::Debug> fmt::Debug for TreeElement<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeElement")
            .field("element", &self.element)
            .field("has_children", &self.children.is_some())
            .field("collapsed", &self.collapsed)
            .field("collapsible", &self.collapsible)
            .field("incompressible", &self.incompressible)
            .finish()
    }
}

/// A fully consumed and validated [`TreeElement`] ready to be inserted.
#[derive(Debug)]
pub(crate) struct Staged<T> {
    pub element: T,
    pub children: Vec<Staged<T>>,
    pub collapsed: Option<bool>,
    pub collapsible: bool,
    pub incompressible: bool,
}

#[test]
fn children_are_consumed_lazily() {
    use std::cell::Cell;
    let produced = Cell::new(0);
    let element = TreeElement::new(
        "root",
        (0..3).map(|index| {
            produced.set(produced.get() + 1);
            TreeElement::new_leaf(if index == 0 { "a" } else { "b" })
        }),
    );
    assert_eq!(produced.get(), 0);
    let staged = element.stage().unwrap();
    assert_eq!(produced.get(), 3);
    assert_eq!(staged.children.len(), 3);
    assert!(staged.collapsible);
}

#[test]
fn leaf_is_not_collapsible() {
    let staged = TreeElement::new_leaf("leaf").stage().unwrap();
    assert!(!staged.collapsible);
    assert_eq!(staged.collapsed, None);
}

#[test]
fn empty_children_do_not_make_collapsible() {
    let staged = TreeElement::new("dir", Vec::new()).stage().unwrap();
    assert!(!staged.collapsible);
    let staged = TreeElement::new_leaf("dir").collapsible(true).stage().unwrap();
    assert!(staged.collapsible);
}

#[test]
#[should_panic = "non-collapsible"]
fn collapsed_but_not_collapsible_errors() {
    TreeElement::new_leaf("leaf")
        .collapsible(false)
        .collapsed(true)
        .stage()
        .unwrap();
}

#[test]
fn invalid_grandchild_fails_the_whole_element() {
    let element = TreeElement::new(
        "root",
        vec![TreeElement::new(
            "child",
            vec![TreeElement::new_leaf("grandchild")
                .collapsible(false)
                .collapsed(true)],
        )],
    );
    assert!(matches!(
        element.stage(),
        Err(TreeError::InvalidOperation(_))
    ));
}
