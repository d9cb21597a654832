//! Leaf that runs until an accumulated delay has elapsed.
//!
//! Duration and frame delta are [`BlobVariable`]s, so either may come from the blob, the
//! blackboard, another node or a host component.

use bt_core::{
    BbKey, BlobInstance, BlobVariable, Blackboard, BtResult, ComponentAccessList, NodeBlob,
    NodeDataBuilder, NodeDef, NodeState, NodeTypeId,
};
use bytemuck::Zeroable;

use crate::error::VmResult;
use crate::vm::{no_reset, VirtualMachine, VirtualMachineBuilder};

pub const ID: NodeTypeId = NodeTypeId(8);

#[derive(Debug, Clone, Copy, bytemuck::Zeroable, bytemuck::Pod)]
#[repr(C)]
pub struct DelayTimerData {
    pub duration: BlobVariable<f32>,
    pub delta_time: BlobVariable<f32>,
    pub elapsed: f32,
}

/// Timer with a constant `duration` (seconds) advanced by the blackboard value at `delta_time`.
pub fn def(duration: f32, delta_time: BbKey<f32>) -> BtResult<NodeDef> {
    def_with(|data| {
        Ok((
            BlobVariable::constant(data, duration)?,
            BlobVariable::blackboard(data, delta_time)?,
        ))
    })
}

/// Timer whose `(duration, delta_time)` variables are allocated by `variables`.
pub fn def_with(
    variables: impl FnOnce(&mut NodeDataBuilder) -> BtResult<(BlobVariable<f32>, BlobVariable<f32>)>,
) -> BtResult<NodeDef> {
    let mut data = NodeDataBuilder::new(DelayTimerData::zeroed());
    let (duration, delta_time) = variables(&mut data)?;
    data.update::<DelayTimerData>(|head| {
        head.duration = duration;
        head.delta_time = delta_time;
    })?;
    Ok(NodeDef::new(ID).with_data(data.finish()))
}

pub(crate) fn register(vm: &mut VirtualMachineBuilder) -> VmResult<()> {
    vm.register_with_access(ID, "DelayTimer", no_reset, tick, access)?;
    Ok(())
}

fn tick(
    vm: &VirtualMachine,
    index: usize,
    blob: &mut BlobInstance,
    bb: &mut dyn Blackboard,
) -> VmResult<NodeState> {
    let data: DelayTimerData = blob.node_data(index)?;
    let duration = data.duration.get_data(vm.variables(), index, blob, bb)?;
    let delta_time = data.delta_time.get_data(vm.variables(), index, blob, bb)?;

    let timer = blob.node_data_mut::<DelayTimerData>(index)?;
    timer.elapsed += delta_time;
    Ok(if timer.elapsed >= duration {
        NodeState::Success
    } else {
        NodeState::Running
    })
}

fn access(vm: &VirtualMachine, blob: &NodeBlob, index: usize) -> VmResult<ComponentAccessList> {
    let data: DelayTimerData = blob.default_node_data(index)?;
    let mut access = data.duration.component_access(vm.variables())?;
    access.extend(data.delta_time.component_access(vm.variables())?);
    Ok(access)
}
