use bt_core::{BtError, NodeBlob, NodeDef, NodeTypeId};
use proptest::prelude::*;

fn leaf(id: u32) -> NodeDef {
    NodeDef::new(id)
}

/// root(1) -> [a(2) -> [b(3), c(3)], d(4), e(2) -> [f(3)]]
fn sample() -> NodeDef {
    NodeDef::new(1).with_children([
        NodeDef::new(2).with_children([leaf(3), leaf(3)]),
        leaf(4),
        NodeDef::new(2).with_child(leaf(3)),
    ])
}

#[test]
fn build_lays_out_nodes_in_preorder_with_end_indices() {
    let blob = NodeBlob::build(&sample()).unwrap();

    assert_eq!(blob.len(), 7);
    let types: Vec<u32> = (0..blob.len()).map(|i| blob.type_id(i).get()).collect();
    assert_eq!(types, vec![1, 2, 3, 3, 4, 2, 3]);

    let ends: Vec<usize> = (0..blob.len()).map(|i| blob.end_index(i)).collect();
    assert_eq!(ends, vec![7, 4, 3, 4, 5, 7, 7]);

    assert_eq!(blob.children(0).collect::<Vec<_>>(), vec![1, 4, 5]);
    assert_eq!(blob.children(1).collect::<Vec<_>>(), vec![2, 3]);
    assert_eq!(blob.children(5).collect::<Vec<_>>(), vec![6]);
    assert_eq!(blob.child_count(4), 0);

    assert_eq!(blob.depths(), vec![0, 1, 2, 2, 1, 1, 2]);
}

#[test]
fn node_data_is_aligned_and_zero_sized_data_is_unallocated() {
    let root = NodeDef::new(1)
        .with_head(0xAABBu16)
        .with_child(NodeDef::new(2).with_head(7u64))
        .with_child(leaf(3));
    let blob = NodeBlob::build(&root).unwrap();

    for i in 0..blob.len() {
        assert_eq!(blob.data_offset(i) % bt_core::DATA_ALIGN, 0);
    }
    assert_eq!(blob.default_node_data::<u16>(0), Ok(0xAABB));
    assert_eq!(blob.default_node_data::<u64>(1), Ok(7));
    assert_eq!(
        blob.default_node_data::<u32>(2),
        Err(BtError::UnallocatedData { index: 2 })
    );
    assert!(matches!(
        blob.default_node_data::<u64>(0),
        Err(BtError::DataOutOfBounds { index: 0, .. })
    ));
}

#[test]
fn from_parts_rejects_broken_layouts() {
    let t = |n: usize| vec![NodeTypeId(1); n];

    // Root does not span the blob.
    let err = NodeBlob::from_parts(t(2), vec![1, 2], vec![0, 0], vec![0, 0], vec![]).unwrap_err();
    assert!(matches!(err, BtError::MalformedBlob(_)));

    // End index not greater than the node's own index.
    let err =
        NodeBlob::from_parts(t(3), vec![3, 1, 3], vec![0; 3], vec![0; 3], vec![]).unwrap_err();
    assert!(matches!(err, BtError::MalformedBlob(_)));

    // Child 2 escapes the range of its parent 1.
    let err = NodeBlob::from_parts(t(4), vec![4, 3, 4, 4], vec![0; 4], vec![0; 4], vec![])
        .unwrap_err();
    assert!(matches!(err, BtError::MalformedBlob(_)));

    // Data span beyond the data region.
    let err = NodeBlob::from_parts(t(1), vec![1], vec![0], vec![16], vec![0]).unwrap_err();
    assert!(matches!(err, BtError::MalformedBlob(_)));

    // Child data placed before its parent's.
    let err = NodeBlob::from_parts(t(2), vec![2, 2], vec![8, 0], vec![1, 1], vec![0, 0])
        .unwrap_err();
    assert!(matches!(err, BtError::MalformedBlob(_)));

    // Sibling data overlapping.
    let err = NodeBlob::from_parts(
        t(3),
        vec![3, 2, 3],
        vec![0, 0, 8],
        vec![0, 16, 1],
        vec![0; 3],
    )
    .unwrap_err();
    assert!(matches!(err, BtError::MalformedBlob(_)));

    // Empty blob.
    let err = NodeBlob::from_parts(vec![], vec![], vec![], vec![], vec![]).unwrap_err();
    assert!(matches!(err, BtError::MalformedBlob(_)));

    assert!(NodeBlob::from_parts(t(3), vec![3, 2, 3], vec![0; 3], vec![0; 3], vec![]).is_ok());
}

fn arb_tree() -> impl Strategy<Value = NodeDef> {
    let leaf = (0u32..8, prop::collection::vec(any::<u8>(), 0..12))
        .prop_map(|(id, data)| NodeDef::new(id).with_data(data));
    leaf.prop_recursive(5, 64, 5, |inner| {
        (0u32..8, prop::collection::vec(inner, 0..5))
            .prop_map(|(id, children)| NodeDef::new(id).with_children(children))
    })
}

fn flatten(def: &NodeDef, out: &mut Vec<(u32, Vec<u8>)>) {
    out.push((def.type_id.get(), def.data.clone()));
    for child in &def.children {
        flatten(child, out);
    }
}

proptest! {
    #[test]
    fn end_indices_partition_every_subtree(def in arb_tree()) {
        let blob = NodeBlob::build(&def).unwrap();
        prop_assert_eq!(blob.len(), def.node_count());
        prop_assert_eq!(blob.end_index(0), blob.len());

        for i in 0..blob.len() {
            let end = blob.end_index(i);
            prop_assert!(end > i);
            // Ends are non-decreasing along each subtree's index range.
            for j in i + 1..end {
                prop_assert!(blob.end_index(j) <= end);
            }
            // Children tile (i + 1 .. end) exactly.
            let mut covered = i + 1;
            for child in blob.children(i) {
                prop_assert_eq!(child, covered);
                covered = blob.end_index(child);
            }
            prop_assert_eq!(covered, end);
        }
    }

    #[test]
    fn build_preserves_types_and_data(def in arb_tree()) {
        let blob = NodeBlob::build(&def).unwrap();
        let mut expected = Vec::new();
        flatten(&def, &mut expected);

        for (i, (type_id, data)) in expected.iter().enumerate() {
            prop_assert_eq!(blob.type_id(i).get(), *type_id);
            prop_assert_eq!(blob.default_data_bytes(i), data.as_slice());
        }
    }
}
