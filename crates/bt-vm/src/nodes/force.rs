use bt_core::{BlobInstance, Blackboard, NodeDef, NodeState, NodeTypeId};

use crate::error::VmResult;
use crate::vm::{no_reset, VirtualMachine, VirtualMachineBuilder};

pub const ID: NodeTypeId = NodeTypeId(6);

/// Replace any terminal result of `child` with `state`.
pub fn def(state: NodeState, child: NodeDef) -> NodeDef {
    NodeDef::new(ID).with_head(state.bits()).with_child(child)
}

pub(crate) fn register(vm: &mut VirtualMachineBuilder) -> VmResult<()> {
    vm.register(ID, "Force", no_reset, tick)?;
    Ok(())
}

fn tick(
    vm: &VirtualMachine,
    index: usize,
    blob: &mut BlobInstance,
    bb: &mut dyn Blackboard,
) -> VmResult<NodeState> {
    let child = super::only_child(blob, index)?;
    let forced = NodeState::from_bits(blob.node_data::<u8>(index)?)?;
    let state = vm.tick(child, blob, bb)?;
    Ok(if state.is_running() { state } else { forced })
}
