//! Built-in node library.
//!
//! Every module exposes its type `ID` and a `def` constructor producing the [`NodeDef`] the
//! node expects; [`register_builtin`] installs them all.
//!
//! [`NodeDef`]: bt_core::NodeDef

use bt_core::{BbKey, BlobInstance, Blackboard, NodeState, NodeTypeId};

use crate::error::{VmError, VmResult};
use crate::vm::{VirtualMachine, VirtualMachineBuilder};

pub mod delay_timer;
pub mod force;
pub mod inverter;
pub mod parallel;
pub mod repeat;
pub mod selector;
pub mod sequence;
pub mod state;

/// Ids below this are reserved for the built-in library.
pub const FIRST_CUSTOM_NODE: NodeTypeId = NodeTypeId(16);

/// Frame delta time read by timers built with their default constructors.
pub const DELTA_TIME: BbKey<f32> = BbKey::new(0xD7);

pub(crate) fn register_builtin(vm: &mut VirtualMachineBuilder) -> VmResult<()> {
    sequence::register(vm)?;
    selector::register(vm)?;
    parallel::register(vm)?;
    repeat::register(vm)?;
    inverter::register(vm)?;
    force::register(vm)?;
    state::register(vm)?;
    delay_timer::register(vm)?;
    Ok(())
}

/// Tick children in order while they return `keep_going`.
///
/// The first child returning anything else decides the result; running siblings after it are
/// aborted.
pub(crate) fn tick_children_while(
    vm: &VirtualMachine,
    index: usize,
    blob: &mut BlobInstance,
    bb: &mut dyn Blackboard,
    keep_going: NodeState,
) -> VmResult<NodeState> {
    let end = blob.end_index(index);
    let mut child = index + 1;
    while child < end {
        let state = vm.tick(child, blob, bb)?;
        child = blob.end_index(child);
        if state != keep_going {
            abort_running(vm, child, end, blob)?;
            return Ok(state);
        }
    }
    Ok(keep_going)
}

fn abort_running(
    vm: &VirtualMachine,
    mut child: usize,
    end: usize,
    blob: &mut BlobInstance,
) -> VmResult<()> {
    while child < end {
        if blob.state(child) == Some(NodeState::Running) {
            vm.abort(child, blob)?;
        }
        child = blob.end_index(child);
    }
    Ok(())
}

/// First child of a decorator.
pub(crate) fn only_child(blob: &BlobInstance, index: usize) -> VmResult<usize> {
    let child = index + 1;
    if child < blob.end_index(index) {
        Ok(child)
    } else {
        Err(VmError::MissingChild { index })
    }
}
