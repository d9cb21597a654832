#![cfg(feature = "serde")]

use bt_core::wire::{self, WireError};
use bt_core::{NodeBlob, NodeDef};

fn blob() -> NodeBlob {
    let root = NodeDef::new(3)
        .with_data(vec![4, 4])
        .with_child(NodeDef::new(7).with_head(1.25f32))
        .with_child(NodeDef::new(2).with_child(NodeDef::new(7).with_head(-3.0f32)));
    NodeBlob::build(&root).unwrap()
}

#[test]
fn msgpack_and_json_preserve_the_blob() {
    let blob = blob();

    let bytes = wire::to_msgpack(&blob).expect("encode");
    assert_eq!(wire::from_msgpack(&bytes).expect("decode"), blob);

    let json = wire::to_json(&blob).expect("json");
    assert_eq!(wire::from_json(&json).expect("json decode"), blob);
}

#[test]
fn hash_is_stable_and_content_sensitive() {
    let a = wire::blob_hash(&blob()).unwrap();
    assert_eq!(a, wire::blob_hash(&blob()).unwrap());

    let other = NodeBlob::build(&NodeDef::new(3)).unwrap();
    assert_ne!(a, wire::blob_hash(&other).unwrap());
}

#[test]
fn decoding_validates_the_layout() {
    let json = r#"{"types":[1,1],"end_indices":[1,2],"offsets":[0,0],"sizes":[0,0],"data":[]}"#;
    assert!(matches!(wire::from_json(json), Err(WireError::Invalid(_))));

    // Child data ahead of its parent's.
    let json = r#"{"types":[3,7],"end_indices":[2,2],"offsets":[8,0],"sizes":[1,1],"data":[0,0]}"#;
    assert!(matches!(wire::from_json(json), Err(WireError::Invalid(_))));

    assert!(matches!(
        wire::from_msgpack(&[0xc1]),
        Err(WireError::Decode(_))
    ));
}
