use bt_core::{BlobInstance, Blackboard, NodeDef, NodeState, NodeTypeId};

use crate::error::VmResult;
use crate::vm::{no_reset, VirtualMachine, VirtualMachineBuilder};

pub const ID: NodeTypeId = NodeTypeId(1);

/// Succeeds once every child succeeded in a single traversal.
///
/// Reactive: all children are re-evaluated from the first one on every tick.
pub fn def(children: impl IntoIterator<Item = NodeDef>) -> NodeDef {
    NodeDef::new(ID).with_children(children)
}

pub(crate) fn register(vm: &mut VirtualMachineBuilder) -> VmResult<()> {
    vm.register(ID, "Sequence", no_reset, tick)?;
    Ok(())
}

fn tick(
    vm: &VirtualMachine,
    index: usize,
    blob: &mut BlobInstance,
    bb: &mut dyn Blackboard,
) -> VmResult<NodeState> {
    super::tick_children_while(vm, index, blob, bb, NodeState::Success)
}
