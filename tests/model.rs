use tui_tree_model::{
    ChangeCause, FilterResult, RowKind, RowSplice, TreeElement, TreeError, TreeModel,
    TreeOptions, TreeState, View,
};

type Model = TreeModel<u32, u32>;

fn model(options: TreeOptions<u32, u32>) -> Model {
    // Show the model's trace output for failing tests
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
    TreeModel::new(
        options
            .identity_provider(|element: &u32| *element)
            .record_changes(true),
    )
}

/// Elements of every row, a compressed row has more than one.
fn rows(model: &Model) -> Vec<Vec<u32>> {
    model
        .rows()
        .iter()
        .map(|row| model.row_elements(row).into_iter().copied().collect())
        .collect()
}

fn flat(model: &Model) -> Vec<u32> {
    rows(model).into_iter().flatten().collect()
}

fn leafs(elements: &[u32]) -> Vec<TreeElement<'static, u32>> {
    elements.iter().copied().map(TreeElement::new_leaf).collect()
}

/// 0 → {10, 11, 12}, 1, 2
fn example(model: &mut Model) {
    model
        .set_children(
            None,
            vec![
                TreeElement::new(0, leafs(&[10, 11, 12])),
                TreeElement::new_leaf(1),
                TreeElement::new_leaf(2),
            ],
        )
        .unwrap();
}

#[test]
fn filter_evens() {
    let mut model = model(TreeOptions::default());
    example(&mut model);
    assert_eq!(flat(&model), [0, 10, 11, 12, 1, 2]);

    model.update_filter(|element: &u32| element % 2 == 0);
    assert_eq!(rows(&model), [[0], [10], [12], [2]]);

    model.update_filter(|_: &u32| true);
    assert_eq!(flat(&model), [0, 10, 11, 12, 1, 2]);
}

#[test]
fn filtered_out_parent_hides_its_children() {
    let mut model = model(TreeOptions::default());
    example(&mut model);
    model.update_filter(|element: &u32| *element != 0);
    assert_eq!(flat(&model), [1, 2]);

    // The children still pass the filter on their own
    let ten = model.find(&10).unwrap();
    assert!(!model.is_revealed(ten).unwrap());

    model.clear_filter();
    assert_eq!(model.len(), 6);
}

#[test]
fn filter_applies_to_inserted_nodes() {
    let mut model = model(TreeOptions::default().filter(|element: &u32| *element < 100));
    model.set_children(None, leafs(&[1, 200, 3])).unwrap();
    assert_eq!(flat(&model), [1, 3]);
    assert_eq!(model.node_count(), 3);
}

#[test]
fn filter_overrides_collapsibility() {
    let mut model = model(TreeOptions::default());
    example(&mut model);
    let zero = model.find(&0).unwrap();
    model.update_filter(|_: &u32| FilterResult::VISIBLE.collapsible(false));
    assert_eq!(
        model.set_collapsed(zero, true),
        Err(TreeError::InvalidOperation("the node is not collapsible"))
    );
    model.clear_filter();
    assert_eq!(model.set_collapsed(zero, true), Ok(true));
}

#[test]
fn non_collapsible_filter_shows_the_children_of_a_collapsed_node() {
    let mut model = model(TreeOptions::default());
    model
        .set_children(None, vec![TreeElement::new(1, leafs(&[2, 3])).collapsed(true)])
        .unwrap();
    assert_eq!(flat(&model), [1]);
    let one = model.find(&1).unwrap();

    model.update_filter(|_: &u32| FilterResult::VISIBLE.collapsible(false));
    assert_eq!(flat(&model), [1, 2, 3]);
    let row = model.row(0).unwrap();
    assert!(!row.is_collapsed());
    assert!(!row.is_expandable());
    assert!(!model.node(one).unwrap().is_collapsed());
    assert_eq!(model.is_revealed(model.find(&3).unwrap()), Ok(true));

    let mut navigator = model.navigator(View::Raw, Some(one)).unwrap();
    navigator.next();
    assert_eq!(navigator.current_element(), Some(&2));

    // The collapsed state applies again without the override
    model.clear_filter();
    assert_eq!(flat(&model), [1]);
    assert!(model.row(0).unwrap().is_collapsed());
}

#[test]
fn collapsible_node_with_all_children_filtered_is_not_expandable() {
    let mut model = model(TreeOptions::default());
    example(&mut model);
    model.update_filter(|element: &u32| *element < 10);
    let zero_row = model.row(0).unwrap();
    assert_eq!(model.row_elements(&zero_row), [&0]);
    assert!(!zero_row.is_expandable());
}

#[test]
fn identity_keeps_focus_across_replace() {
    let mut model = TreeModel::new(TreeOptions::default().identity_provider(|element: &u32| element % 100));
    model.set_children(None, leafs(&[0, 1, 2, 3])).unwrap();
    let one = model.find(&1).unwrap();
    model.set_focus(&[one]).unwrap();
    model.set_selection(&[one]).unwrap();
    assert_eq!(model.focus(), [&1]);

    model.set_children(None, leafs(&[100, 101, 102, 103])).unwrap();
    assert_eq!(model.focus(), [&101]);
    assert_eq!(model.selection(), [&101]);
    assert_ne!(model.find(&1), Some(one));
    assert_eq!(model.node(one).unwrap_err(), TreeError::InvalidNode(one));
}

#[test]
fn focus_without_identity_is_lost_on_replace() {
    let mut model = TreeModel::<u32>::default();
    model.set_children(None, leafs(&[0, 1])).unwrap();
    let first = model.children(None).unwrap()[0];
    model.set_focus(&[first]).unwrap();
    assert_eq!(model.focus(), [&0]);

    model.set_children(None, leafs(&[0, 1])).unwrap();
    assert!(model.focus().is_empty());
    assert!(model.focused_nodes().is_empty());
}

#[test]
fn focus_of_removed_identity_is_dropped() {
    let mut model = model(TreeOptions::default());
    model.set_children(None, leafs(&[1, 2])).unwrap();
    model.set_focus(&[model.find(&2).unwrap()]).unwrap();
    model.set_children(None, leafs(&[1, 3])).unwrap();
    assert!(model.focus().is_empty());
    // Coming back later does not restore it
    model.set_children(None, leafs(&[1, 2])).unwrap();
    assert!(model.focus().is_empty());
}

#[test]
fn filtered_focus_is_kept_but_not_reported() {
    let mut model = model(TreeOptions::default());
    example(&mut model);
    model.set_focus(&[model.find(&11).unwrap()]).unwrap();
    model.update_filter(|element: &u32| element % 2 == 0);
    assert!(model.focus().is_empty());
    model.clear_filter();
    assert_eq!(model.focus(), [&11]);
}

#[test]
fn anchor_follows_identity() {
    let mut model = model(TreeOptions::default());
    model.set_children(None, leafs(&[1, 2])).unwrap();
    assert!(model.set_anchor(model.find(&2)).unwrap());
    model.set_children(None, leafs(&[2, 1])).unwrap();
    assert_eq!(model.anchor(), Some(&2));
    assert!(model.set_anchor(None).unwrap());
    assert_eq!(model.anchor(), None);
}

#[test]
fn invalid_focus_changes_nothing() {
    let mut model = model(TreeOptions::default());
    model.set_children(None, leafs(&[1, 2])).unwrap();
    let one = model.find(&1).unwrap();
    model.set_focus(&[one]).unwrap();
    model.set_children(None, leafs(&[1, 2])).unwrap();
    let stale = one;
    let two = model.find(&2).unwrap();
    assert_eq!(
        model.set_focus(&[two, stale]),
        Err(TreeError::InvalidNode(stale))
    );
    assert_eq!(model.focus(), [&1]);
}

/// 1 → 11 → 111 → {1111, 1112, 1113}
fn chain(model: &mut Model) {
    model
        .set_children(
            None,
            vec![TreeElement::new(
                1,
                vec![TreeElement::new(
                    11,
                    vec![TreeElement::new(111, leafs(&[1111, 1112, 1113]))],
                )],
            )],
        )
        .unwrap();
}

#[test]
fn compression_of_single_child_chains() {
    let mut model = model(TreeOptions::default());
    chain(&mut model);
    assert_eq!(
        rows(&model),
        [vec![1, 11, 111], vec![1111], vec![1112], vec![1113]]
    );
    let head = model.row(0).unwrap();
    assert_eq!(head.kind(), RowKind::Compressed);
    assert_eq!(head.head(), model.find(&1).unwrap());
    assert_eq!(head.terminal(), model.find(&111).unwrap());
    assert_eq!(model.row(1).unwrap().depth(), 1);
    assert_eq!(model.index_of(&11), Some(0));
    assert_eq!(model.index_of(&1112), Some(2));

    let compressed = rows(&model);
    assert!(model.set_compression_enabled(false));
    assert_eq!(flat(&model), [1, 11, 111, 1111, 1112, 1113]);
    assert_eq!(model.row(2).unwrap().depth(), 2);
    assert!(!model.set_compression_enabled(false));
    assert!(model.set_compression_enabled(true));
    assert_eq!(rows(&model), compressed);
}

#[test]
fn collapsing_the_chain_targets_the_terminal() {
    let mut model = model(TreeOptions::default());
    chain(&mut model);
    let terminal = model.row(0).unwrap().terminal();
    assert!(model.set_collapsed(terminal, true).unwrap());
    assert_eq!(rows(&model), [vec![1, 11, 111]]);
    assert!(model.row(0).unwrap().is_collapsed());

    // Collapsing a node in the middle ends the chain there
    assert!(model.set_collapsed(terminal, false).unwrap());
    let eleven = model.find(&11).unwrap();
    assert!(model.set_collapsed(eleven, true).unwrap());
    assert_eq!(rows(&model), [vec![1, 11]]);
}

#[test]
fn incompressible_node_starts_its_own_row() {
    let mut model = model(TreeOptions::default());
    model
        .set_children(
            None,
            vec![TreeElement::new(
                1,
                vec![TreeElement::new(11, leafs(&[111])).incompressible()],
            )],
        )
        .unwrap();
    assert_eq!(rows(&model), [vec![1], vec![11, 111]]);
}

#[test]
fn incremental_rechaining() {
    let mut model = model(TreeOptions::default());
    chain(&mut model);
    assert_eq!(
        rows(&model),
        [vec![1, 11, 111], vec![1111], vec![1112], vec![1113]]
    );
    model.take_changes();

    let parent = model.find(&111);
    model.set_children(parent, leafs(&[112])).unwrap();
    assert_eq!(rows(&model), [vec![1, 11, 111, 112]]);
    let changes = model.take_changes();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].cause, ChangeCause::Children);
    assert_eq!(changes[0].parent, parent);
    assert_eq!(
        changes[0].splice,
        RowSplice {
            start: 0,
            delete_count: 4,
            insert_count: 1,
        }
    );

    let parent = model.find(&112);
    model.set_children(parent, leafs(&[113])).unwrap();
    assert_eq!(rows(&model), [vec![1, 11, 111, 112, 113]]);

    let parent = model.find(&113);
    model.set_children(parent, leafs(&[1131])).unwrap();
    assert_eq!(rows(&model), [vec![1, 11, 111, 112, 113, 1131]]);

    let changes = model.take_changes();
    assert_eq!(changes.len(), 2);
    for change in changes {
        assert_eq!(change.cause, ChangeCause::Children);
        assert_eq!(
            change.splice,
            RowSplice {
                start: 0,
                delete_count: 1,
                insert_count: 1,
            }
        );
    }

    // A second child breaks the chain
    let parent = model.find(&113);
    model.set_children(parent, leafs(&[1131, 1132])).unwrap();
    assert_eq!(
        rows(&model),
        [vec![1, 11, 111, 112, 113], vec![1131], vec![1132]]
    );
}

#[test]
fn collapse_removes_revealed_descendants() {
    let mut model = model(TreeOptions::default().compression_enabled(false));
    model
        .set_children(
            None,
            vec![
                TreeElement::new(1, vec![
                    TreeElement::new(10, leafs(&[100, 101])),
                    TreeElement::new(11, leafs(&[110])).collapsed(true),
                ]),
                TreeElement::new_leaf(2),
            ],
        )
        .unwrap();
    let before = flat(&model);
    assert_eq!(before, [1, 10, 100, 101, 11, 2]);
    model.take_changes();

    let one = model.find(&1).unwrap();
    assert!(model.set_collapsed(one, true).unwrap());
    assert_eq!(flat(&model), [1, 2]);
    assert!(!model.set_collapsed(one, true).unwrap());

    assert!(model.set_collapsed(one, false).unwrap());
    assert_eq!(flat(&model), before);

    let changes = model.take_changes();
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0].cause, ChangeCause::Collapse);
    assert_eq!(changes[0].parent, Some(one));
    // The row of 1 itself changes its collapsed state
    assert_eq!(
        changes[0].splice,
        RowSplice {
            start: 0,
            delete_count: 5,
            insert_count: 1,
        }
    );
    assert_eq!(changes[1].splice.inserted(), 0..5);
}

#[test]
fn collapse_recursive_and_expand_to() {
    let mut model = model(TreeOptions::default().compression_enabled(false));
    model
        .set_children(
            None,
            vec![TreeElement::new(1, vec![TreeElement::new(
                10,
                leafs(&[100, 101]),
            )])],
        )
        .unwrap();
    let one = model.find(&1).unwrap();
    assert!(model.set_collapsed_recursive(one, true).unwrap());
    assert_eq!(flat(&model), [1]);

    let hundred = model.find(&100).unwrap();
    assert!(!model.is_revealed(hundred).unwrap());
    assert!(model.expand_to(hundred).unwrap());
    assert_eq!(flat(&model), [1, 10, 100, 101]);
    assert!(!model.expand_to(hundred).unwrap());

    assert!(model.collapse_all());
    assert_eq!(flat(&model), [1]);
    assert!(!model.collapse_all());
}

#[test]
fn collapsed_state_survives_replace_by_identity() {
    let mut model = model(TreeOptions::default());
    example(&mut model);
    let zero = model.find(&0).unwrap();
    model.set_collapsed(zero, true).unwrap();

    example(&mut model);
    assert_eq!(flat(&model), [0, 1, 2]);

    // An explicit state wins
    model
        .set_children(None, vec![TreeElement::new(0, leafs(&[10])).collapsed(false)])
        .unwrap();
    assert_eq!(flat(&model), [0, 10]);
}

#[test]
fn collapse_by_default() {
    let mut model = model(TreeOptions::default().collapse_by_default(true));
    example(&mut model);
    assert_eq!(flat(&model), [0, 1, 2]);
    // Leaves are not collapsible and stay expanded
    let one = model.find(&1).unwrap();
    assert!(!model.node(one).unwrap().is_collapsed());
}

#[test]
fn lazy_loaded_directory() {
    let mut model = model(TreeOptions::default());
    model
        .set_children(None, vec![TreeElement::new_leaf(1).collapsible(true).collapsed(true)])
        .unwrap();
    let row = model.row(0).unwrap();
    assert!(row.is_expandable());
    assert!(row.is_collapsed());

    let one = model.find(&1).unwrap();
    assert!(model.set_collapsed(one, false).unwrap());
    model.set_children(Some(one), leafs(&[10, 11])).unwrap();
    assert_eq!(flat(&model), [1, 10, 11]);
}

#[test]
fn stale_node_ids_are_invalid() {
    let mut model = model(TreeOptions::default());
    example(&mut model);
    let zero = model.find(&0).unwrap();
    let ten = model.find(&10).unwrap();
    model.set_children(Some(zero), leafs(&[20])).unwrap();

    assert_eq!(model.set_collapsed(ten, true), Err(TreeError::InvalidNode(ten)));
    assert_eq!(
        model.set_children(Some(ten), leafs(&[1])),
        Err(TreeError::InvalidNode(ten))
    );
    assert_eq!(model.element(ten), Err(TreeError::InvalidNode(ten)));
    assert!(model.navigator(View::Raw, Some(ten)).is_err());
    assert_eq!(model.index_of_node(ten), None);
    assert_eq!(flat(&model), [0, 20, 1, 2]);
}

#[test]
fn failed_calls_change_nothing() {
    let mut model = model(TreeOptions::default());
    example(&mut model);
    model.take_changes();
    let before = rows(&model);

    let result = model.set_children(
        None,
        vec![
            TreeElement::new_leaf(5),
            TreeElement::new_leaf(6).collapsible(false).collapsed(true),
        ],
    );
    assert!(matches!(result, Err(TreeError::InvalidOperation(_))));
    assert_eq!(rows(&model), before);
    assert_eq!(model.node_count(), 6);

    let one = model.find(&1).unwrap();
    assert!(matches!(
        model.set_collapsed(one, true),
        Err(TreeError::InvalidOperation(_))
    ));
    assert!(matches!(
        model.set_collapsed_recursive(one, true),
        Err(TreeError::InvalidOperation(_))
    ));
    assert_eq!(rows(&model), before);
    assert!(model.take_changes().is_empty());
}

#[test]
fn structure_accessors() {
    let mut model = model(TreeOptions::default());
    example(&mut model);
    let zero = model.find(&0).unwrap();
    let eleven = model.find(&11).unwrap();
    assert_eq!(model.parent(eleven), Ok(Some(zero)));
    assert_eq!(model.parent(zero), Ok(None));
    assert_eq!(model.index_in_parent(eleven), Ok(1));
    assert_eq!(model.depth(eleven), Ok(1));
    assert_eq!(model.children(Some(zero)).unwrap().len(), 3);
    assert_eq!(model.identity(eleven), Some(&11));
    assert_eq!(model.element(eleven), Ok(&11));
}

#[test]
fn clear_removes_everything() {
    let mut model = model(TreeOptions::default());
    example(&mut model);
    let zero = model.find(&0).unwrap();
    model.set_focus(&[zero]).unwrap();
    model.take_changes();

    model.clear();
    assert!(model.is_empty());
    assert_eq!(model.node_count(), 0);
    assert!(model.focus().is_empty());
    assert_eq!(model.find(&0), None);
    let changes = model.take_changes();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].cause, ChangeCause::Clear);
    assert_eq!(changes[0].splice.delete_count, 6);
}

#[test]
fn changes_are_queued_in_order() {
    let mut model = model(TreeOptions::default());
    example(&mut model);
    model.update_filter(|element: &u32| *element != 1);
    model.set_compression_enabled(false);

    let causes = model
        .take_changes()
        .into_iter()
        .map(|change| change.cause)
        .collect::<Vec<_>>();
    assert_eq!(
        causes,
        [
            ChangeCause::Children,
            ChangeCause::Filter,
            ChangeCause::Compression
        ]
    );
    assert!(model.take_changes().is_empty());
}

#[test]
fn changes_are_not_queued_by_default() {
    let mut model = TreeModel::<u32, u32>::default();
    example(&mut model);
    let mut state = TreeState::default();
    for _ in 0..1000 {
        state.focus_first(&mut model);
        assert!(state.toggle_focused(&mut model));
    }
    model.update_filter(|element: &u32| *element != 1);
    model.set_compression_enabled(false);
    model.clear();
    assert!(model.take_changes().is_empty());
}

#[test]
fn navigator_walks_the_rows() {
    let mut model = model(TreeOptions::default());
    chain(&mut model);
    model.set_children(None, {
        let mut elements = vec![TreeElement::new(
            1,
            vec![TreeElement::new(
                11,
                vec![TreeElement::new(111, leafs(&[1111, 1112]))],
            )],
        )];
        elements.push(TreeElement::new_leaf(2));
        elements
    })
    .unwrap();

    let mut compressed = model.navigator(View::Compressed, None).unwrap();
    let mut seen = Vec::new();
    while let Some(row) = compressed.next() {
        seen.push(row);
    }
    assert_eq!(seen, model.rows());

    let mut raw = model.navigator(View::Raw, None).unwrap();
    let mut elements = Vec::new();
    while raw.next().is_some() {
        elements.push(*raw.current_element().unwrap());
    }
    assert_eq!(elements, [1, 11, 111, 1111, 1112, 2]);

    // Starting inside a chain starts on its row
    let eleven = model.find(&11).unwrap();
    let navigator = model.navigator(View::Compressed, Some(eleven)).unwrap();
    assert_eq!(navigator.current(), model.row(0));
    assert_eq!(navigator.current_element(), Some(&111));
}

#[test]
fn navigator_skips_collapsed_and_filtered() {
    let mut model = model(TreeOptions::default().compression_enabled(false));
    example(&mut model);
    let zero = model.find(&0).unwrap();
    model.update_filter(|element: &u32| *element != 11);

    let mut navigator = model.navigator(View::Raw, Some(zero)).unwrap();
    assert_eq!(navigator.next().map(|row| row.head()), model.find(&10));
    assert_eq!(navigator.next().map(|row| row.head()), model.find(&12));
    assert_eq!(navigator.next().map(|row| row.head()), model.find(&1));
    assert_eq!(navigator.previous().map(|row| row.head()), model.find(&12));

    model.set_collapsed(zero, true).unwrap();
    let mut navigator = model.navigator(View::Raw, None).unwrap();
    assert_eq!(navigator.last().map(|row| row.head()), model.find(&2));
    assert_eq!(navigator.previous().map(|row| row.head()), model.find(&1));
    assert_eq!(navigator.previous().map(|row| row.head()), Some(zero));
    assert_eq!(navigator.previous(), None);
    assert_eq!(navigator.previous().map(|row| row.head()), model.find(&2));

    // Hidden start
    let ten = model.find(&10).unwrap();
    let navigator = model.navigator(View::Raw, Some(ten)).unwrap();
    assert_eq!(navigator.current(), None);
}
