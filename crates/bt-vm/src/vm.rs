use core::fmt;

use bt_core::{
    BlobInstance, Blackboard, BtError, ComponentAccessList, NodeBlob, NodeState, NodeTypeId,
    VariableRegistries,
};
use bt_tools::{emit as trace_emit, TraceEvent};
use tracing::{debug, trace, warn};

use crate::config::VmConfig;
use crate::error::{VmError, VmResult};
use crate::nodes;

pub type ResetFn =
    fn(&VirtualMachine, usize, &mut BlobInstance, &mut dyn Blackboard) -> VmResult<()>;
pub type TickFn =
    fn(&VirtualMachine, usize, &mut BlobInstance, &mut dyn Blackboard) -> VmResult<NodeState>;
/// Static component access of the node at an index, read from the blob's default data.
pub type AccessFn = fn(&VirtualMachine, &NodeBlob, usize) -> VmResult<ComponentAccessList>;

/// Largest node type id accepted by the registry. The dispatch table is dense.
pub const MAX_NODE_TYPE_ID: u32 = u16::MAX as u32;

/// Registered behavior of one node type.
#[derive(Clone, Copy)]
pub struct NodeBehavior {
    pub name: &'static str,
    pub reset: ResetFn,
    pub tick: TickFn,
    pub access: Option<AccessFn>,
}

impl fmt::Debug for NodeBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeBehavior")
            .field("name", &self.name)
            .field("access", &self.access.is_some())
            .finish()
    }
}

/// Reset function for nodes without per-activation state.
pub fn no_reset(
    _vm: &VirtualMachine,
    _index: usize,
    _blob: &mut BlobInstance,
    _bb: &mut dyn Blackboard,
) -> VmResult<()> {
    Ok(())
}

/// Registration phase of a [`VirtualMachine`].
#[derive(Debug, Default)]
pub struct VirtualMachineBuilder {
    behaviors: Vec<Option<NodeBehavior>>,
    variables: VariableRegistries,
    config: VmConfig,
}

impl VirtualMachineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        id: impl Into<NodeTypeId>,
        name: &'static str,
        reset: ResetFn,
        tick: TickFn,
    ) -> VmResult<&mut Self> {
        self.insert(
            id.into(),
            NodeBehavior {
                name,
                reset,
                tick,
                access: None,
            },
        )
    }

    pub fn register_with_access(
        &mut self,
        id: impl Into<NodeTypeId>,
        name: &'static str,
        reset: ResetFn,
        tick: TickFn,
        access: AccessFn,
    ) -> VmResult<&mut Self> {
        self.insert(
            id.into(),
            NodeBehavior {
                name,
                reset,
                tick,
                access: Some(access),
            },
        )
    }

    fn insert(&mut self, id: NodeTypeId, behavior: NodeBehavior) -> VmResult<&mut Self> {
        if id.get() > MAX_NODE_TYPE_ID {
            return Err(VmError::NodeTypeOutOfRange {
                id,
                max: MAX_NODE_TYPE_ID,
            });
        }
        let slot = id.get() as usize;
        if let Some(Some(existing)) = self.behaviors.get(slot) {
            warn!(%id, existing = existing.name, rejected = behavior.name, "duplicate node type");
            return Err(VmError::DuplicateNodeType {
                id,
                existing: existing.name,
            });
        }
        if self.behaviors.len() <= slot {
            self.behaviors.resize(slot + 1, None);
        }
        debug!(%id, name = behavior.name, "registered node type");
        self.behaviors[slot] = Some(behavior);
        Ok(self)
    }

    /// Register the built-in composites, decorators and leaves (ids below
    /// [`nodes::FIRST_CUSTOM_NODE`]) and the built-in `f32` variable strategies they read.
    pub fn with_builtin_nodes(&mut self) -> VmResult<&mut Self> {
        nodes::register_builtin(self)?;
        self.variables.ensure_builtin::<f32>();
        Ok(self)
    }

    pub fn is_registered(&self, id: impl Into<NodeTypeId>) -> bool {
        let id = id.into();
        matches!(self.behaviors.get(id.get() as usize), Some(Some(_)))
    }

    pub fn variables_mut(&mut self) -> &mut VariableRegistries {
        &mut self.variables
    }

    pub fn config(&mut self, config: VmConfig) -> &mut Self {
        self.config = config;
        self
    }

    pub fn build(self) -> VirtualMachine {
        debug!(
            node_types = self.behaviors.iter().flatten().count(),
            max_tick_depth = self.config.max_tick_depth,
            trace = self.config.trace,
            "virtual machine built"
        );
        VirtualMachine {
            behaviors: self.behaviors,
            variables: self.variables,
            config: self.config,
        }
    }
}

/// Stateless dispatcher from node type ids to reset/tick functions.
///
/// Immutable after [`VirtualMachineBuilder::build`]; one machine can drive any number of
/// [`BlobInstance`]s, including from several threads at once.
#[derive(Debug)]
pub struct VirtualMachine {
    behaviors: Vec<Option<NodeBehavior>>,
    variables: VariableRegistries,
    config: VmConfig,
}

impl VirtualMachine {
    pub fn builder() -> VirtualMachineBuilder {
        VirtualMachineBuilder::new()
    }

    /// A machine with only the built-in node library and default config.
    pub fn with_builtin_nodes() -> VmResult<Self> {
        let mut builder = Self::builder();
        builder.with_builtin_nodes()?;
        Ok(builder.build())
    }

    pub fn behavior(&self, id: NodeTypeId) -> Option<&NodeBehavior> {
        self.behaviors.get(id.get() as usize)?.as_ref()
    }

    pub fn name_of(&self, id: NodeTypeId) -> Option<&'static str> {
        self.behavior(id).map(|b| b.name)
    }

    pub fn is_registered(&self, id: impl Into<NodeTypeId>) -> bool {
        self.behavior(id.into()).is_some()
    }

    pub fn variables(&self) -> &VariableRegistries {
        &self.variables
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    fn behavior_at(&self, index: usize, blob: &BlobInstance) -> VmResult<NodeBehavior> {
        if !blob.contains(index) {
            warn!(index, len = blob.len(), "node index out of range");
            return Err(VmError::IndexOutOfRange {
                index,
                len: blob.len(),
            });
        }
        let id = blob.type_id(index);
        self.behavior(id).copied().ok_or_else(|| {
            warn!(index, %id, "unregistered node type");
            VmError::UnknownNodeType { id, index }
        })
    }

    /// Tick the node at `index`.
    ///
    /// A node whose last recorded state is not `Running` is entered fresh: its own default data
    /// is restored and its reset function runs before the tick function. Descendants are
    /// activated the same way when they are ticked in turn.
    pub fn tick(
        &self,
        index: usize,
        blob: &mut BlobInstance,
        bb: &mut dyn Blackboard,
    ) -> VmResult<NodeState> {
        let behavior = self.behavior_at(index, blob)?;
        if blob.state(index) != Some(NodeState::Running) {
            self.activate(index, &behavior, blob, bb)?;
        }

        let depth = blob.enter();
        if depth > self.config.max_tick_depth {
            blob.leave();
            warn!(index, max = self.config.max_tick_depth, "tick depth exceeded");
            return Err(VmError::DepthExceeded {
                index,
                max: self.config.max_tick_depth,
            });
        }
        let result = (behavior.tick)(self, index, blob, bb);
        blob.leave();
        let state = match result {
            Ok(state) => state,
            Err(err) => {
                // Nothing under a failed node may stay running into the next activation.
                let end = blob.end_index(index);
                blob.clear_states(index..end);
                return Err(err);
            }
        };

        blob.set_state(index, state);
        trace!(index, node = behavior.name, ?state, "tick");
        if self.config.trace {
            trace_emit(bb, TraceEvent::tick(blob.tick_count(), index, state))
                .map_err(BtError::from)?;
        }
        Ok(state)
    }

    fn activate(
        &self,
        index: usize,
        behavior: &NodeBehavior,
        blob: &mut BlobInstance,
        bb: &mut dyn Blackboard,
    ) -> VmResult<()> {
        blob.restore_node_data(index);
        (behavior.reset)(self, index, blob, bb)?;

        trace!(index, node = behavior.name, "activate");
        if self.config.trace {
            trace_emit(bb, TraceEvent::reset(blob.tick_count(), index)).map_err(BtError::from)?;
        }
        Ok(())
    }

    /// Restore default data over the whole subtree at `index`, mark it inactive, then run every
    /// node's reset function in pre-order.
    pub fn reset(
        &self,
        index: usize,
        blob: &mut BlobInstance,
        bb: &mut dyn Blackboard,
    ) -> VmResult<()> {
        self.behavior_at(index, blob)?;
        blob.reset_subtree_data(index);
        for node in index..blob.end_index(index) {
            let behavior = self.behavior_at(node, blob)?;
            (behavior.reset)(self, node, blob, bb)?;
        }

        trace!(index, "reset");
        if self.config.trace {
            trace_emit(bb, TraceEvent::reset(blob.tick_count(), index)).map_err(BtError::from)?;
        }
        Ok(())
    }

    /// Mark the subtree at `index` inactive so its next tick starts a fresh activation.
    pub fn abort(&self, index: usize, blob: &mut BlobInstance) -> VmResult<()> {
        if !blob.contains(index) {
            return Err(VmError::IndexOutOfRange {
                index,
                len: blob.len(),
            });
        }
        let end = blob.end_index(index);
        trace!(index, end, "abort");
        blob.clear_states(index..end);
        Ok(())
    }

    /// Union of the component access declared by every node in `blob`.
    pub fn component_access(&self, blob: &NodeBlob) -> VmResult<ComponentAccessList> {
        let mut access = ComponentAccessList::new();
        for index in 0..blob.len() {
            let id = blob.type_id(index);
            let behavior = self
                .behavior(id)
                .ok_or(VmError::UnknownNodeType { id, index })?;
            if let Some(access_fn) = behavior.access {
                access.extend(access_fn(self, blob, index)?);
            }
        }
        Ok(access)
    }
}
