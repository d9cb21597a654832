use std::sync::Arc;

use bt_core::variable::{BLACKBOARD, CONSTANT, FIRST_CUSTOM_VARIABLE};
use bt_core::{
    AccessMode, BbKey, BlackboardError, BlackboardExt, BlobInstance, BlobVariable, BtError, MapBlackboard,
    NodeBlob, NodeDataBuilder, NodeDef, VariableRegistries,
};

#[derive(Debug, Clone, Copy, bytemuck::Zeroable, bytemuck::Pod)]
#[repr(C)]
struct MoveData {
    speed: BlobVariable<f32>,
    target: BlobVariable<f32>,
    unset: BlobVariable<f32>,
}

const TARGET: BbKey<f32> = BbKey::new(0x51);
const SPEED_COMPONENT: u32 = FIRST_CUSTOM_VARIABLE;

#[derive(Debug)]
struct Stats {
    speed: f32,
}

fn registries() -> VariableRegistries {
    let mut vars = VariableRegistries::new();
    vars.register_builtin::<f32>().unwrap();
    vars.register_component::<f32, Stats>(
        SPEED_COMPONENT,
        |s| &s.speed,
        |s| &mut s.speed,
        AccessMode::ReadWrite,
    )
    .unwrap();
    vars
}

/// Node 0 holds the variables; node 1 carries a plain `f32` head that node variables can point at.
fn instance(speed: impl FnOnce(&mut NodeDataBuilder) -> BlobVariable<f32>) -> BlobInstance {
    let mut data = NodeDataBuilder::new(MoveData {
        speed: BlobVariable::new(CONSTANT, 0),
        target: BlobVariable::new(CONSTANT, 0),
        unset: BlobVariable::new(CONSTANT, 0),
    });
    let speed = speed(&mut data);
    let target = BlobVariable::blackboard(&mut data, TARGET).unwrap();
    data.update::<MoveData>(|d| {
        d.speed = speed;
        d.target = target;
    })
    .unwrap();

    let root = NodeDef::new(1)
        .with_data(data.finish())
        .with_child(NodeDef::new(2).with_head(8.5f32));
    BlobInstance::new(Arc::new(NodeBlob::build(&root).unwrap()))
}

#[test]
fn constant_variables_read_and_write_the_instance_copy() {
    let vars = registries();
    let mut blob = instance(|d| BlobVariable::constant(d, 3.0).unwrap());
    let mut bb = MapBlackboard::new();
    let data: MoveData = blob.node_data(0).unwrap();

    assert_eq!(data.speed.get_data(&vars, 0, &blob, &bb), Ok(3.0));
    *data.speed.get_data_ref(&vars, 0, &mut blob, &mut bb).unwrap() = 4.5;
    assert_eq!(data.speed.get_data(&vars, 0, &blob, &bb), Ok(4.5));

    // Defaults in the shared blob are untouched.
    let fresh = BlobInstance::new(blob.blob().clone());
    assert_eq!(data.speed.get_data(&vars, 0, &fresh, &bb), Ok(3.0));
}

#[test]
fn blackboard_variables_surface_blackboard_errors_unchanged() {
    let vars = registries();
    let mut blob = instance(|d| BlobVariable::constant(d, 1.0).unwrap());
    let mut bb = MapBlackboard::new();
    let data: MoveData = blob.node_data(0).unwrap();

    assert_eq!(
        data.target.get_data(&vars, 0, &blob, &bb),
        Err(BtError::Blackboard(BlackboardError::MissingKey { key: 0x51 }))
    );

    bb.set(TARGET, 12.0);
    assert_eq!(data.target.get_data(&vars, 0, &blob, &bb), Ok(12.0));
    *data.target.get_data_ref(&vars, 0, &mut blob, &mut bb).unwrap() += 1.0;
    assert_eq!(bb.get(TARGET).copied(), Ok(13.0));
    assert_eq!(data.target.variable_id(), BLACKBOARD);
}

#[test]
fn node_variables_read_another_nodes_data() {
    let vars = registries();
    let mut blob = instance(|d| BlobVariable::node(d, 1, 0).unwrap());
    let mut bb = MapBlackboard::new();
    let data: MoveData = blob.node_data(0).unwrap();

    assert_eq!(data.speed.get_data(&vars, 0, &blob, &bb), Ok(8.5));
    *data.speed.get_data_ref(&vars, 0, &mut blob, &mut bb).unwrap() = 2.0;
    assert_eq!(blob.node_data::<f32>(1), Ok(2.0));
}

#[test]
fn component_variables_declare_access() {
    let vars = registries();
    let mut blob = instance(|_| BlobVariable::component(SPEED_COMPONENT));
    let mut bb = MapBlackboard::new();
    let data: MoveData = blob.node_data(0).unwrap();

    assert!(matches!(
        data.speed.get_data(&vars, 0, &blob, &bb),
        Err(BtError::Blackboard(BlackboardError::MissingComponent { .. }))
    ));

    bb.insert_component(Stats { speed: 6.0 });
    assert_eq!(data.speed.get_data(&vars, 0, &blob, &bb), Ok(6.0));
    *data.speed.get_data_ref(&vars, 0, &mut blob, &mut bb).unwrap() = 7.0;
    assert_eq!(bb.component::<Stats>().unwrap().speed, 7.0);

    let access = data.speed.component_access(&vars).unwrap();
    assert_eq!(access.len(), 1);
    assert_eq!(access.access_of::<Stats>(), Some(AccessMode::ReadWrite));
    assert!(data.target.component_access(&vars).unwrap().is_empty());
}

#[test]
fn unallocated_and_unknown_variables_fail_fast() {
    let vars = registries();
    let blob = instance(|d| BlobVariable::constant(d, 1.0).unwrap());
    let bb = MapBlackboard::new();
    let data: MoveData = blob.node_data(0).unwrap();

    assert!(!data.unset.is_allocated());
    assert_eq!(
        data.unset.get_data(&vars, 0, &blob, &bb),
        Err(BtError::UnallocatedVariable {
            index: 0,
            variable_id: CONSTANT
        })
    );

    let unknown = BlobVariable::<f32>::new(99, 4);
    assert!(matches!(
        unknown.get_data(&vars, 0, &blob, &bb),
        Err(BtError::UnknownVariable { variable_id: 99, .. })
    ));

    let other_type = BlobVariable::<u16>::new(CONSTANT, 4);
    assert!(matches!(
        other_type.get_data(&vars, 0, &blob, &bb),
        Err(BtError::UnregisteredVariableType { .. })
    ));
}

#[test]
fn duplicate_strategy_registration_is_rejected() {
    let mut vars = registries();
    assert!(matches!(
        vars.register_builtin::<f32>(),
        Err(BtError::DuplicateVariable { variable_id: CONSTANT, .. })
    ));

    // `ensure_builtin` is the idempotent form.
    vars.ensure_builtin::<f32>().ensure_builtin::<i32>();
    assert!(vars.is_registered::<i32>(BLACKBOARD));
}
