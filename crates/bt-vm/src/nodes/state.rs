use bt_core::{BlobInstance, Blackboard, NodeDef, NodeState, NodeTypeId};

use crate::error::VmResult;
use crate::vm::{no_reset, VirtualMachine, VirtualMachineBuilder};

pub const ID: NodeTypeId = NodeTypeId(7);

/// Leaf that always returns `state`.
pub fn def(state: NodeState) -> NodeDef {
    NodeDef::new(ID).with_head(state.bits())
}

pub(crate) fn register(vm: &mut VirtualMachineBuilder) -> VmResult<()> {
    vm.register(ID, "State", no_reset, tick)?;
    Ok(())
}

fn tick(
    _vm: &VirtualMachine,
    index: usize,
    blob: &mut BlobInstance,
    _bb: &mut dyn Blackboard,
) -> VmResult<NodeState> {
    Ok(NodeState::from_bits(blob.node_data::<u8>(index)?)?)
}
