//! Show [JSON](Value) in a [`TreeModel`](crate::TreeModel).
//!
//! ```
//! # use tui_tree_model::json::{self, JsonRenderer};
//! # use tui_tree_model::{Tree, TreeModel, TreeOptions};
//! let value = serde_json::json!({"foo": {"bar": [13, 37]}, "test": true});
//! let mut model = TreeModel::new(TreeOptions::default().identity_provider(json::identity));
//! model.set_children(None, json::tree_elements(&value))?;
//! let tree = Tree::new(&model).renderer(JsonRenderer);
//! # let _ = tree;
//! # Ok::<(), tui_tree_model::TreeError>(())
//! ```

use std::borrow::Cow;

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use serde_json::Value;

use crate::{RowRenderer, TreeElement};

/// One step into a JSON value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    ObjectKey(String),
    ArrayIndex(usize),
    /// The root itself when it is not an array or object.
    None,
}

/// A JSON value together with the path to reach it from the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonNode<'value> {
    pub path: Vec<Selector>,
    pub value: &'value Value,
}

impl JsonNode<'_> {
    /// The last step of the path.
    #[must_use]
    pub fn key(&self) -> Option<&Selector> {
        self.path.last()
    }
}

/// Identity provider keying every node by its path.
///
/// The path stays the same when a changed document is shown again, so focus and collapsed states survive.
#[must_use]
pub fn identity(node: &JsonNode) -> Vec<Selector> {
    node.path.clone()
}

/// Select one layer into `root` (depth == 1).
fn select_one<'value>(root: &'value Value, selector: &Selector) -> Option<&'value Value> {
    match (root, selector) {
        (Value::Object(object), Selector::ObjectKey(key)) => object.get(key),
        (Value::Array(array), Selector::ArrayIndex(index)) => array.get(*index),
        (_, Selector::None) => Some(root),
        _ => None,
    }
}

/// Select a part of the input [JSON](Value).
#[must_use]
pub fn select<'value>(root: &'value Value, selector: &[Selector]) -> Option<&'value Value> {
    let mut current = root;
    for select in selector {
        current = select_one(current, select)?;
    }
    Some(current)
}

/// Create [`TreeElement`]s for the top level of the JSON.
///
/// Arrays and objects are the parents of their entries.
/// Their children are created lazily while they are inserted into the model.
/// A root which is neither an array nor an object is a single element with the path `[Selector::None]`.
#[must_use]
pub fn tree_elements(root: &Value) -> Vec<TreeElement<'_, JsonNode<'_>>> {
    match root {
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            vec![TreeElement::new_leaf(JsonNode {
                path: vec![Selector::None],
                value: root,
            })]
        }
        Value::Array(array) => array
            .iter()
            .enumerate()
            .map(|(index, value)| tree_element(vec![Selector::ArrayIndex(index)], value))
            .collect(),
        Value::Object(object) => object
            .iter()
            .map(|(key, value)| tree_element(vec![Selector::ObjectKey(key.clone())], value))
            .collect(),
    }
}

fn tree_element(path: Vec<Selector>, value: &Value) -> TreeElement<'_, JsonNode<'_>> {
    let parent = path.clone();
    let node = JsonNode { path, value };
    match value {
        Value::Array(array) if !array.is_empty() => TreeElement::new(
            node,
            array.iter().enumerate().map(move |(index, value)| {
                let mut path = parent.clone();
                path.push(Selector::ArrayIndex(index));
                tree_element(path, value)
            }),
        ),
        Value::Object(object) if !object.is_empty() => TreeElement::new(
            node,
            object.iter().map(move |(key, value)| {
                let mut path = parent.clone();
                path.push(Selector::ObjectKey(key.clone()));
                tree_element(path, value)
            }),
        ),
        _ => TreeElement::new_leaf(node),
    }
}

const KEY: Style = Style::new().fg(Color::Blue);
const INDEX: Style = Style::new().fg(Color::Cyan);

const NAME_SEPARATOR: Span = Span {
    content: Cow::Borrowed(": "),
    style: Style::new().fg(Color::DarkGray),
};
const PATH_SEPARATOR: Span = Span {
    content: Cow::Borrowed("."),
    style: Style::new().fg(Color::DarkGray),
};

fn get_value_span(value: &Value) -> Span {
    const BOOL: Style = Style::new().fg(Color::Magenta);
    const NULL: Style = Style::new().fg(Color::DarkGray);
    const NUMBER: Style = Style::new().fg(Color::LightBlue);
    const STRING: Style = Style::new().fg(Color::Green);

    match value {
        Value::Array(array) if array.is_empty() => Span::raw("[]"),
        Value::Array(_) => Span::raw("["),
        Value::Object(object) if object.is_empty() => Span::raw("{}"),
        Value::Object(_) => Span::raw("{"),
        Value::Null => Span::styled("null", NULL),
        Value::Bool(true) => Span::styled("true", BOOL),
        Value::Bool(false) => Span::styled("false", BOOL),
        Value::Number(number) => Span::styled(number.to_string(), NUMBER),
        Value::String(string) => Span::styled(string.as_str(), STRING),
    }
}

fn get_key_span(selector: &Selector) -> Option<Span> {
    match selector {
        Selector::ObjectKey(key) => Some(Span::styled(key.as_str(), KEY)),
        Selector::ArrayIndex(index) => Some(Span::styled(index.to_string(), INDEX)),
        Selector::None => None,
    }
}

/// Renders [`JsonNode`]s as `key: value` with colors.
///
/// A compressed chain shows its keys joined with `.` followed by the value of the last node: `foo.bar: [`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct JsonRenderer;

impl<'value> RowRenderer<JsonNode<'value>> for JsonRenderer {
    fn render_node<'t>(&self, node: &'t JsonNode<'value>) -> Line<'t> {
        self.render_compressed(&[node])
    }

    fn render_compressed<'t>(&self, nodes: &[&'t JsonNode<'value>]) -> Line<'t> {
        let Some(last) = nodes.last() else {
            return Line::default();
        };
        let mut spans = Vec::new();
        let keys = nodes
            .iter()
            .copied()
            .filter_map(JsonNode::key)
            .filter_map(get_key_span);
        for key in keys {
            if !spans.is_empty() {
                spans.push(PATH_SEPARATOR);
            }
            spans.push(key);
        }
        if !spans.is_empty() {
            spans.push(NAME_SEPARATOR);
        }
        spans.push(get_value_span(last.value));
        Line::from(spans)
    }
}

#[cfg(test)]
fn key(key: &str) -> Selector {
    Selector::ObjectKey(key.to_owned())
}

#[test]
fn can_not_get_other_value() {
    let root = Value::Bool(false);
    let result = select_one(&root, &Selector::ArrayIndex(2));
    assert_eq!(result, None);
}

#[test]
fn can_get_nth_array_value() {
    let root = Value::Array(vec![Value::String("bla".to_owned()), Value::Bool(true)]);
    let result = select_one(&root, &Selector::ArrayIndex(1));
    assert_eq!(result, Some(&Value::Bool(true)));
}

#[test]
fn can_get_object_value() {
    let root = serde_json::json!({"bla": false, "blubb": true});
    let result = select_one(&root, &key("blubb"));
    assert_eq!(result, Some(&Value::Bool(true)));
}

#[test]
fn can_not_get_object_missing_key() {
    let root = serde_json::json!({"bla": false, "blubb": true});
    let result = select_one(&root, &key("foo"));
    assert_eq!(result, None);
}

#[test]
fn select_follows_the_path() {
    let root = serde_json::json!({"foo": {"bar": [13, 37]}});
    let result = select(&root, &[key("foo"), key("bar"), Selector::ArrayIndex(1)]);
    assert_eq!(result, Some(&serde_json::json!(37)));
}

#[cfg(test)]
mod render_tests {
    use ratatui::buffer::Buffer;
    use ratatui::layout::Rect;
    use ratatui::widgets::StatefulWidget;

    use super::*;
    use crate::{Tree, TreeModel, TreeOptions, TreeState};

    /// Strips colors after render
    #[must_use]
    #[track_caller]
    fn render(width: u16, height: u16, json: &str, compression: bool) -> Buffer {
        let json: Value = serde_json::from_str(json).expect("invalid test JSON");
        let mut model = TreeModel::new(
            TreeOptions::default()
                .identity_provider(identity)
                .compression_enabled(compression),
        );
        model.set_children(None, tree_elements(&json)).unwrap();
        let tree = Tree::new(&model).renderer(JsonRenderer);
        let area = Rect::new(0, 0, width, height);
        let mut buffer = Buffer::empty(area);
        tree.render(area, &mut buffer, &mut TreeState::default());
        buffer.set_style(area, Style::reset());
        buffer
    }

    #[test]
    fn empty_array_renders_nothing() {
        let buffer = render(5, 3, "[]", true);
        let expected = Buffer::with_lines(["     "; 3]);
        assert_eq!(buffer, expected);
    }

    #[test]
    fn empty_object_renders_nothing() {
        let buffer = render(5, 3, "{}", true);
        let expected = Buffer::with_lines(["     "; 3]);
        assert_eq!(buffer, expected);
    }

    #[test]
    fn number() {
        let buffer = render(5, 2, "42", true);
        let expected = Buffer::with_lines(["  42 ", "     "]);
        assert_eq!(buffer, expected);
    }

    #[test]
    fn all_simple_in_array() {
        let json = r#"[null, true, false, [], {}, 42, "lalala"]"#;
        let buffer = render(12, 8, json, true);
        let expected = Buffer::with_lines([
            "  0: null   ",
            "  1: true   ",
            "  2: false  ",
            "  3: []     ",
            "  4: {}     ",
            "  5: 42     ",
            "  6: lalala ",
            "            ",
        ]);
        assert_eq!(buffer, expected);
    }

    #[test]
    fn bigger_example() {
        let json = r#"{"foo": {"bar": [13, 37]}, "test": true}"#;
        let buffer = render(14, 6, json, false);
        let expected = Buffer::with_lines([
            "▼ foo: {      ",
            "  ▼ bar: [    ",
            "      0: 13   ",
            "      1: 37   ",
            "  test: true  ",
            "              ",
        ]);
        assert_eq!(buffer, expected);
    }

    #[test]
    fn bigger_example_compressed() {
        let json = r#"{"foo": {"bar": [13, 37]}, "test": true}"#;
        let buffer = render(14, 5, json, true);
        let expected = Buffer::with_lines([
            "▼ foo.bar: [  ",
            "    0: 13     ",
            "    1: 37     ",
            "  test: true  ",
            "              ",
        ]);
        assert_eq!(buffer, expected);
    }
}
