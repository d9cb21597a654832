//! Typed variable handles embedded in node data.
//!
//! A [`BlobVariable<T>`] is two words stored by value inside a node's data: a variable id that
//! selects a resolution strategy from the per-`T` [`VariableRegistry`], and an offset (relative to
//! the owning node's data) of the strategy's payload. Offset `0` is never a valid payload
//! location, so an unset handle fails with [`BtError::UnallocatedVariable`] instead of reading
//! whatever happens to sit at the start of the node.
//!
//! Built-in strategies:
//!
//! | id            | payload                      | value source                        |
//! |---------------|------------------------------|-------------------------------------|
//! | [`CONSTANT`]  | `T`                          | the node's own runtime data         |
//! | [`BLACKBOARD`]| `u64` key                    | `Blackboard` value under that key   |
//! | [`NODE`]      | [`NodeDataRef`]              | another node's runtime data         |
//!
//! Hosts add component-backed strategies with [`VariableRegistries::register_component`].

use std::any::{type_name, Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use bytemuck::{Pod, Zeroable};

use crate::{
    AccessMode, BbKey, Blackboard, BlackboardExt, BlobInstance, BtError, BtResult,
    ComponentAccessList, ComponentType, NodeDataBuilder,
};

pub type VariableId = u32;

pub const CONSTANT: VariableId = 1;
pub const BLACKBOARD: VariableId = 2;
pub const NODE: VariableId = 3;
/// Ids below this are reserved for built-in strategies.
pub const FIRST_CUSTOM_VARIABLE: VariableId = 16;

#[derive(Zeroable, Pod)]
#[repr(C, packed)]
pub struct BlobVariable<T: Pod> {
    variable_id: u32,
    offset: u32,
    _marker: PhantomData<T>,
}

impl<T: Pod> Clone for BlobVariable<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Pod> Copy for BlobVariable<T> {}

impl<T: Pod> fmt::Debug for BlobVariable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variable_id = self.variable_id;
        let offset = self.offset;
        f.debug_struct("BlobVariable")
            .field("type", &type_name::<T>())
            .field("variable_id", &variable_id)
            .field("offset", &offset)
            .finish()
    }
}

impl<T: Pod> PartialEq for BlobVariable<T> {
    fn eq(&self, other: &Self) -> bool {
        self.variable_id() == other.variable_id() && self.offset() == other.offset()
    }
}

impl<T: Pod> Eq for BlobVariable<T> {}

impl<T: Pod> BlobVariable<T> {
    pub const fn new(variable_id: VariableId, offset: u32) -> Self {
        Self {
            variable_id,
            offset,
            _marker: PhantomData,
        }
    }

    pub fn variable_id(&self) -> VariableId {
        self.variable_id
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn is_allocated(&self) -> bool {
        self.offset() != 0
    }

    /// Payload offset, or [`BtError::UnallocatedVariable`] for an unset handle.
    pub fn payload_offset(&self, index: usize) -> BtResult<usize> {
        if !self.is_allocated() {
            return Err(BtError::UnallocatedVariable {
                index,
                variable_id: self.variable_id(),
            });
        }
        Ok(self.offset() as usize)
    }

    /// Embed `value` in the node's data.
    pub fn constant(data: &mut NodeDataBuilder, value: T) -> BtResult<Self> {
        Ok(Self::new(CONSTANT, data.alloc(value)?))
    }

    /// Read the value from the blackboard under `key`.
    pub fn blackboard(data: &mut NodeDataBuilder, key: BbKey<T>) -> BtResult<Self> {
        Ok(Self::new(BLACKBOARD, data.alloc(key.id())?))
    }

    /// Read the value from `data_offset` bytes into node `node_index`'s data.
    pub fn node(data: &mut NodeDataBuilder, node_index: u32, data_offset: u32) -> BtResult<Self> {
        let offset = data.alloc(NodeDataRef {
            node_index,
            data_offset,
        })?;
        Ok(Self::new(NODE, offset))
    }

    /// Handle for a host-registered component strategy; these carry no payload.
    pub const fn component(variable_id: VariableId) -> Self {
        Self::new(variable_id, 0)
    }

    pub fn get_data(
        &self,
        variables: &VariableRegistries,
        index: usize,
        blob: &BlobInstance,
        blackboard: &dyn Blackboard,
    ) -> BtResult<T> {
        variables
            .registry::<T>()?
            .strategy(self.variable_id())?
            .get(self, index, blob, blackboard)
    }

    pub fn get_data_ref<'a>(
        &self,
        variables: &VariableRegistries,
        index: usize,
        blob: &'a mut BlobInstance,
        blackboard: &'a mut dyn Blackboard,
    ) -> BtResult<&'a mut T> {
        variables
            .registry::<T>()?
            .strategy(self.variable_id())?
            .get_ref(self, index, blob, blackboard)
    }

    /// Components that must be accessible before a tick may resolve this variable.
    pub fn component_access(&self, variables: &VariableRegistries) -> BtResult<ComponentAccessList> {
        Ok(variables
            .registry::<T>()?
            .strategy(self.variable_id())?
            .component_access(self))
    }
}

/// Payload of a [`NODE`] variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Zeroable, Pod)]
#[repr(C)]
pub struct NodeDataRef {
    pub node_index: u32,
    pub data_offset: u32,
}

/// One way of resolving a `BlobVariable<T>`.
pub trait VariableStrategy<T: Pod>: Send + Sync {
    fn name(&self) -> &'static str;

    fn get(
        &self,
        variable: &BlobVariable<T>,
        index: usize,
        blob: &BlobInstance,
        blackboard: &dyn Blackboard,
    ) -> BtResult<T>;

    fn get_ref<'a>(
        &self,
        variable: &BlobVariable<T>,
        index: usize,
        blob: &'a mut BlobInstance,
        blackboard: &'a mut dyn Blackboard,
    ) -> BtResult<&'a mut T>;

    fn component_access(&self, _variable: &BlobVariable<T>) -> ComponentAccessList {
        ComponentAccessList::new()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantVariable;

impl<T: Pod> VariableStrategy<T> for ConstantVariable {
    fn name(&self) -> &'static str {
        "constant"
    }

    fn get(
        &self,
        variable: &BlobVariable<T>,
        index: usize,
        blob: &BlobInstance,
        _blackboard: &dyn Blackboard,
    ) -> BtResult<T> {
        blob.read_at(index, variable.payload_offset(index)?)
    }

    fn get_ref<'a>(
        &self,
        variable: &BlobVariable<T>,
        index: usize,
        blob: &'a mut BlobInstance,
        _blackboard: &'a mut dyn Blackboard,
    ) -> BtResult<&'a mut T> {
        blob.view_at_mut(index, variable.payload_offset(index)?)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BlackboardVariable;

impl<T: Pod> VariableStrategy<T> for BlackboardVariable {
    fn name(&self) -> &'static str {
        "blackboard"
    }

    fn get(
        &self,
        variable: &BlobVariable<T>,
        index: usize,
        blob: &BlobInstance,
        blackboard: &dyn Blackboard,
    ) -> BtResult<T> {
        let key: u64 = blob.read_at(index, variable.payload_offset(index)?)?;
        Ok(*blackboard.get(BbKey::<T>::new(key))?)
    }

    fn get_ref<'a>(
        &self,
        variable: &BlobVariable<T>,
        index: usize,
        blob: &'a mut BlobInstance,
        blackboard: &'a mut dyn Blackboard,
    ) -> BtResult<&'a mut T> {
        let key: u64 = blob.read_at(index, variable.payload_offset(index)?)?;
        Ok(blackboard.get_mut(BbKey::<T>::new(key))?)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NodeVariable;

impl<T: Pod> VariableStrategy<T> for NodeVariable {
    fn name(&self) -> &'static str {
        "node"
    }

    fn get(
        &self,
        variable: &BlobVariable<T>,
        index: usize,
        blob: &BlobInstance,
        _blackboard: &dyn Blackboard,
    ) -> BtResult<T> {
        let target: NodeDataRef = blob.read_at(index, variable.payload_offset(index)?)?;
        blob.read_at(target.node_index as usize, target.data_offset as usize)
    }

    fn get_ref<'a>(
        &self,
        variable: &BlobVariable<T>,
        index: usize,
        blob: &'a mut BlobInstance,
        _blackboard: &'a mut dyn Blackboard,
    ) -> BtResult<&'a mut T> {
        let target: NodeDataRef = blob.read_at(index, variable.payload_offset(index)?)?;
        blob.view_at_mut(target.node_index as usize, target.data_offset as usize)
    }
}

/// Resolves a field of host component `C` stored on the blackboard.
pub struct ComponentVariable<C, T> {
    get: fn(&C) -> &T,
    get_mut: fn(&mut C) -> &mut T,
    access: AccessMode,
}

impl<C, T> ComponentVariable<C, T> {
    pub fn new(get: fn(&C) -> &T, get_mut: fn(&mut C) -> &mut T, access: AccessMode) -> Self {
        Self {
            get,
            get_mut,
            access,
        }
    }
}

impl<C: 'static, T: Pod> VariableStrategy<T> for ComponentVariable<C, T> {
    fn name(&self) -> &'static str {
        "component"
    }

    fn get(
        &self,
        _variable: &BlobVariable<T>,
        _index: usize,
        _blob: &BlobInstance,
        blackboard: &dyn Blackboard,
    ) -> BtResult<T> {
        Ok(*(self.get)(blackboard.component::<C>()?))
    }

    fn get_ref<'a>(
        &self,
        _variable: &BlobVariable<T>,
        _index: usize,
        _blob: &'a mut BlobInstance,
        blackboard: &'a mut dyn Blackboard,
    ) -> BtResult<&'a mut T> {
        Ok((self.get_mut)(blackboard.component_mut::<C>()?))
    }

    fn component_access(&self, _variable: &BlobVariable<T>) -> ComponentAccessList {
        [ComponentType::of::<C>(self.access)].into_iter().collect()
    }
}

/// Strategies for one value type, keyed by [`VariableId`].
pub struct VariableRegistry<T: Pod> {
    strategies: BTreeMap<VariableId, Box<dyn VariableStrategy<T>>>,
}

impl<T: Pod> Default for VariableRegistry<T> {
    fn default() -> Self {
        Self {
            strategies: BTreeMap::new(),
        }
    }
}

impl<T: Pod> VariableRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        variable_id: VariableId,
        strategy: impl VariableStrategy<T> + 'static,
    ) -> BtResult<()> {
        if self.strategies.contains_key(&variable_id) {
            return Err(BtError::DuplicateVariable {
                variable_id,
                type_name: type_name::<T>(),
            });
        }
        tracing::debug!(
            variable_id,
            value_type = type_name::<T>(),
            strategy = strategy.name(),
            "registered variable strategy"
        );
        self.strategies.insert(variable_id, Box::new(strategy));
        Ok(())
    }

    pub fn strategy(&self, variable_id: VariableId) -> BtResult<&dyn VariableStrategy<T>> {
        self.strategies
            .get(&variable_id)
            .map(|s| s.as_ref())
            .ok_or(BtError::UnknownVariable {
                variable_id,
                type_name: type_name::<T>(),
            })
    }

    pub fn contains(&self, variable_id: VariableId) -> bool {
        self.strategies.contains_key(&variable_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = VariableId> + '_ {
        self.strategies.keys().copied()
    }
}

/// One [`VariableRegistry`] per value type.
#[derive(Default)]
pub struct VariableRegistries {
    by_type: BTreeMap<TypeId, (&'static str, Box<dyn Any + Send + Sync>)>,
}

impl VariableRegistries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry<T: Pod>(&self) -> BtResult<&VariableRegistry<T>> {
        self.by_type
            .get(&TypeId::of::<T>())
            .and_then(|(_, registry)| registry.downcast_ref::<VariableRegistry<T>>())
            .ok_or(BtError::UnregisteredVariableType {
                type_name: type_name::<T>(),
            })
    }

    pub fn registry_mut<T: Pod>(&mut self) -> &mut VariableRegistry<T> {
        let (_, registry) = self
            .by_type
            .entry(TypeId::of::<T>())
            .or_insert_with(|| (type_name::<T>(), Box::new(VariableRegistry::<T>::new())));
        match registry.downcast_mut::<VariableRegistry<T>>() {
            Some(registry) => registry,
            None => unreachable!("variable registry stored under a foreign TypeId"),
        }
    }

    pub fn register<T: Pod>(
        &mut self,
        variable_id: VariableId,
        strategy: impl VariableStrategy<T> + 'static,
    ) -> BtResult<&mut Self> {
        self.registry_mut::<T>().register(variable_id, strategy)?;
        Ok(self)
    }

    /// Register the constant, blackboard and node strategies for `T`.
    pub fn register_builtin<T: Pod>(&mut self) -> BtResult<&mut Self> {
        self.register::<T>(CONSTANT, ConstantVariable)?
            .register::<T>(BLACKBOARD, BlackboardVariable)?
            .register::<T>(NODE, NodeVariable)
    }

    /// Like [`register_builtin`](Self::register_builtin), skipping strategies already present.
    pub fn ensure_builtin<T: Pod>(&mut self) -> &mut Self {
        let registry = self.registry_mut::<T>();
        if !registry.contains(CONSTANT) {
            registry.strategies.insert(CONSTANT, Box::new(ConstantVariable));
        }
        if !registry.contains(BLACKBOARD) {
            registry
                .strategies
                .insert(BLACKBOARD, Box::new(BlackboardVariable));
        }
        if !registry.contains(NODE) {
            registry.strategies.insert(NODE, Box::new(NodeVariable));
        }
        self
    }

    /// Register a strategy reading a `T` field of host component `C`.
    pub fn register_component<T: Pod, C: 'static>(
        &mut self,
        variable_id: VariableId,
        get: fn(&C) -> &T,
        get_mut: fn(&mut C) -> &mut T,
        access: AccessMode,
    ) -> BtResult<&mut Self> {
        self.register::<T>(variable_id, ComponentVariable::new(get, get_mut, access))
    }

    pub fn is_registered<T: Pod>(&self, variable_id: VariableId) -> bool {
        self.registry::<T>()
            .map(|r| r.contains(variable_id))
            .unwrap_or(false)
    }

    /// Value types with at least one registered strategy.
    pub fn value_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.by_type.values().map(|(name, _)| *name)
    }
}

impl fmt::Debug for VariableRegistries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableRegistries")
            .field("value_types", &self.value_types().collect::<Vec<_>>())
            .finish()
    }
}
