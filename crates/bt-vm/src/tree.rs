use std::sync::Arc;

use bt_core::{BlobInstance, Blackboard, NodeBlob, NodeState};

use crate::error::VmResult;
use crate::vm::VirtualMachine;

/// One running instance of a tree: shared blob, private runtime state.
#[derive(Debug, Clone)]
pub struct BehaviorTree {
    instance: BlobInstance,
    last: Option<NodeState>,
}

impl BehaviorTree {
    pub fn new(blob: Arc<NodeBlob>) -> Self {
        Self {
            instance: BlobInstance::new(blob),
            last: None,
        }
    }

    /// Advance the tick counter and tick the root.
    ///
    /// After the root completes, the next call starts a fresh activation.
    pub fn tick(&mut self, vm: &VirtualMachine, bb: &mut dyn Blackboard) -> VmResult<NodeState> {
        self.instance.advance_tick();
        let state = vm.tick(0, &mut self.instance, bb)?;
        self.last = Some(state);
        Ok(state)
    }

    pub fn reset(&mut self, vm: &VirtualMachine, bb: &mut dyn Blackboard) -> VmResult<()> {
        self.last = None;
        vm.reset(0, &mut self.instance, bb)
    }

    /// Root result of the latest tick; `None` before the first tick or after a reset.
    pub fn last_status(&self) -> Option<NodeState> {
        self.last
    }

    pub fn blob(&self) -> &Arc<NodeBlob> {
        self.instance.blob()
    }

    pub fn instance(&self) -> &BlobInstance {
        &self.instance
    }

    pub fn instance_mut(&mut self) -> &mut BlobInstance {
        &mut self.instance
    }
}
