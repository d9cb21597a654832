use bt_core::{BlobInstance, Blackboard, NodeDef, NodeState, NodeTypeId};

use crate::error::VmResult;
use crate::vm::{no_reset, VirtualMachine, VirtualMachineBuilder};

pub const ID: NodeTypeId = NodeTypeId(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq, bytemuck::Zeroable, bytemuck::Pod)]
#[repr(C)]
pub struct RepeatData {
    /// Completions before finishing with `Success`; `<= 0` repeats forever.
    pub times: i32,
    /// Completions so far in this activation.
    pub count: i32,
    /// Child states (bit set) returned immediately instead of being counted.
    pub break_states: u8,
    _padding: [u8; 3],
}

impl RepeatData {
    pub fn new(times: i32, break_states: u8) -> Self {
        Self {
            times,
            count: 0,
            break_states,
            _padding: [0; 3],
        }
    }
}

/// Repeat `child` `times` times, stopping early on any state in `break_states`.
pub fn def(times: i32, break_states: u8, child: NodeDef) -> NodeDef {
    NodeDef::new(ID)
        .with_head(RepeatData::new(times, break_states))
        .with_child(child)
}

/// Repeat `child` until it fails.
pub fn until_failure(child: NodeDef) -> NodeDef {
    def(0, NodeState::FAILURE_BIT, child)
}

pub(crate) fn register(vm: &mut VirtualMachineBuilder) -> VmResult<()> {
    vm.register(ID, "Repeat", no_reset, tick)?;
    Ok(())
}

fn tick(
    vm: &VirtualMachine,
    index: usize,
    blob: &mut BlobInstance,
    bb: &mut dyn Blackboard,
) -> VmResult<NodeState> {
    let child = super::only_child(blob, index)?;
    let state = vm.tick(child, blob, bb)?;

    let data = blob.node_data_mut::<RepeatData>(index)?;
    if state.is_in(data.break_states) {
        return Ok(state);
    }
    if state.is_completed() {
        data.count += 1;
        if data.times > 0 && data.count >= data.times {
            return Ok(NodeState::Success);
        }
    }
    Ok(NodeState::Running)
}
