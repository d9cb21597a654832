use bt_core::{BlobInstance, Blackboard, NodeDef, NodeState, NodeTypeId};

use crate::error::VmResult;
use crate::vm::{no_reset, VirtualMachine, VirtualMachineBuilder};

pub const ID: NodeTypeId = NodeTypeId(5);

pub fn def(child: NodeDef) -> NodeDef {
    NodeDef::new(ID).with_child(child)
}

pub(crate) fn register(vm: &mut VirtualMachineBuilder) -> VmResult<()> {
    vm.register(ID, "Inverter", no_reset, tick)?;
    Ok(())
}

fn tick(
    vm: &VirtualMachine,
    index: usize,
    blob: &mut BlobInstance,
    bb: &mut dyn Blackboard,
) -> VmResult<NodeState> {
    let child = super::only_child(blob, index)?;
    Ok(match vm.tick(child, blob, bb)? {
        NodeState::Success => NodeState::Failure,
        NodeState::Failure => NodeState::Success,
        NodeState::Running => NodeState::Running,
    })
}
