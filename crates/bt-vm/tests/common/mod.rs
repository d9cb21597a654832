#![allow(dead_code)]

use std::sync::Arc;

use bt_core::{
    BbKey, BlackboardExt, BlobInstance, Blackboard, BtError, MapBlackboard, NodeBlob, NodeDef,
    NodeState, NodeTypeId,
};
use bt_vm::{VirtualMachine, VmConfig, VmResult};

/// Node indices in the order they were ticked.
pub const TICKS: BbKey<Vec<usize>> = BbKey::new(0x7E57_0001);
/// Node indices in the order their reset function ran.
pub const RESETS: BbKey<Vec<usize>> = BbKey::new(0x7E57_0002);

/// Leaf replaying a fixed list of states; the last one repeats.
pub const SCRIPTED: NodeTypeId = NodeTypeId(16);
/// Leaf returning whatever state is stored under [`probe_key`] for its index.
pub const PROBE: NodeTypeId = NodeTypeId(17);

#[derive(Debug, Clone, Copy, bytemuck::Zeroable, bytemuck::Pod)]
#[repr(C)]
struct Script {
    states: [u8; 6],
    len: u8,
    cursor: u8,
}

pub fn scripted(states: &[NodeState]) -> NodeDef {
    assert!(!states.is_empty() && states.len() <= 6);
    let mut script = Script {
        states: [0; 6],
        len: states.len() as u8,
        cursor: 0,
    };
    for (slot, state) in script.states.iter_mut().zip(states) {
        *slot = state.bits();
    }
    NodeDef::new(SCRIPTED).with_head(script)
}

pub fn leaf(state: NodeState) -> NodeDef {
    scripted(&[state])
}

pub fn probe() -> NodeDef {
    NodeDef::new(PROBE)
}

pub fn probe_key(index: usize) -> BbKey<NodeState> {
    BbKey::new(0x9000 + index as u64)
}

fn record_reset(
    _vm: &VirtualMachine,
    index: usize,
    _blob: &mut BlobInstance,
    bb: &mut dyn Blackboard,
) -> VmResult<()> {
    bb.get_mut(RESETS).map_err(BtError::from)?.push(index);
    Ok(())
}

fn scripted_tick(
    _vm: &VirtualMachine,
    index: usize,
    blob: &mut BlobInstance,
    bb: &mut dyn Blackboard,
) -> VmResult<NodeState> {
    bb.get_mut(TICKS).map_err(BtError::from)?.push(index);
    let script = blob.node_data_mut::<Script>(index)?;
    let at = usize::from(script.cursor.min(script.len - 1));
    script.cursor = script.cursor.saturating_add(1);
    Ok(NodeState::from_bits(script.states[at])?)
}

fn probe_tick(
    _vm: &VirtualMachine,
    index: usize,
    _blob: &mut BlobInstance,
    bb: &mut dyn Blackboard,
) -> VmResult<NodeState> {
    bb.get_mut(TICKS).map_err(BtError::from)?.push(index);
    Ok(*bb.get(probe_key(index)).map_err(BtError::from)?)
}

pub fn vm() -> VirtualMachine {
    vm_with(VmConfig::default())
}

pub fn vm_with(config: VmConfig) -> VirtualMachine {
    let mut builder = VirtualMachine::builder();
    builder.with_builtin_nodes().unwrap();
    builder
        .register(SCRIPTED, "Scripted", record_reset, scripted_tick)
        .unwrap()
        .register(PROBE, "Probe", record_reset, probe_tick)
        .unwrap();
    builder.config(config);
    builder.build()
}

pub fn blob(def: &NodeDef) -> Arc<NodeBlob> {
    Arc::new(NodeBlob::build(def).unwrap())
}

pub fn instance(def: &NodeDef) -> BlobInstance {
    BlobInstance::new(blob(def))
}

pub fn blackboard() -> MapBlackboard {
    let mut bb = MapBlackboard::new();
    bb.set(TICKS, Vec::new());
    bb.set(RESETS, Vec::new());
    bb
}

/// Ticked node indices since the last call.
pub fn take_ticks(bb: &mut MapBlackboard) -> Vec<usize> {
    std::mem::take(bb.get_mut(TICKS).unwrap())
}

pub fn take_resets(bb: &mut MapBlackboard) -> Vec<usize> {
    std::mem::take(bb.get_mut(RESETS).unwrap())
}
