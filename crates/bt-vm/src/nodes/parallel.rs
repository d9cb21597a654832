//! Ticks every running child each tick.
//!
//! Node data holds one state byte per child. A child that completed keeps its result and is not
//! ticked again until the parallel itself is reset.

use bt_core::{BlobInstance, Blackboard, NodeDef, NodeState, NodeTypeId};
use tracing::warn;

use crate::error::{VmError, VmResult};
use crate::vm::{VirtualMachine, VirtualMachineBuilder};

pub const ID: NodeTypeId = NodeTypeId(3);

pub fn def(children: impl IntoIterator<Item = NodeDef>) -> NodeDef {
    let children: Vec<NodeDef> = children.into_iter().collect();
    NodeDef::new(ID)
        .with_data(vec![NodeState::RUNNING_BIT; children.len()])
        .with_children(children)
}

pub(crate) fn register(vm: &mut VirtualMachineBuilder) -> VmResult<()> {
    vm.register(ID, "Parallel", reset, tick)?;
    Ok(())
}

fn reset(
    _vm: &VirtualMachine,
    index: usize,
    blob: &mut BlobInstance,
    _bb: &mut dyn Blackboard,
) -> VmResult<()> {
    blob.node_bytes_mut(index).fill(NodeState::RUNNING_BIT);
    Ok(())
}

fn tick(
    vm: &VirtualMachine,
    index: usize,
    blob: &mut BlobInstance,
    bb: &mut dyn Blackboard,
) -> VmResult<NodeState> {
    let end = blob.end_index(index);

    let mut any_running = false;
    let mut child = index + 1;
    let mut slot = 0;
    while child < end {
        any_running |= child_state(blob, index, slot)?.is_running();
        child = blob.end_index(child);
        slot += 1;
    }
    if !any_running {
        warn!(index, "parallel ticked without a running child");
        return Err(VmError::NoRunningChild { index });
    }

    let mut any_failure = false;
    let mut still_running = false;
    let mut child = index + 1;
    let mut slot = 0;
    while child < end {
        let mut state = child_state(blob, index, slot)?;
        if state.is_running() {
            state = vm.tick(child, blob, bb)?;
            *blob.view_at_mut::<u8>(index, slot)? = state.bits();
        }
        still_running |= state.is_running();
        any_failure |= state == NodeState::Failure;
        child = blob.end_index(child);
        slot += 1;
    }

    Ok(if still_running {
        NodeState::Running
    } else if any_failure {
        NodeState::Failure
    } else {
        NodeState::Success
    })
}

fn child_state(blob: &BlobInstance, index: usize, slot: usize) -> VmResult<NodeState> {
    Ok(NodeState::from_bits(blob.read_at::<u8>(index, slot)?)?)
}
