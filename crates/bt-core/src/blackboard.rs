use std::any::{type_name, Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use crate::BlackboardError;

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BbKey<T: 'static> {
    id: u64,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: 'static> Copy for BbKey<T> {}

impl<T: 'static> Clone for BbKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> BbKey<T> {
    pub const fn new(id: u64) -> Self {
        Self {
            id,
            _phantom: PhantomData,
        }
    }

    pub fn id(self) -> u64 {
        self.id
    }
}

/// External key/value and component store read and written by node logic.
///
/// The VM never inspects a blackboard beyond this contract. Values are keyed by `u64`;
/// components are keyed by their Rust type.
pub trait Blackboard {
    fn value(&self, key: u64) -> Option<&(dyn Any + Send)>;

    fn value_mut(&mut self, key: u64) -> Option<&mut (dyn Any + Send)>;

    fn insert_value(&mut self, key: u64, value: Box<dyn Any + Send>);

    fn remove_value(&mut self, key: u64) -> Option<Box<dyn Any + Send>>;

    fn component_by_type(&self, _ty: TypeId) -> Option<&(dyn Any + Send)> {
        None
    }

    fn component_by_type_mut(&mut self, _ty: TypeId) -> Option<&mut (dyn Any + Send)> {
        None
    }
}

/// Typed access on top of [`Blackboard`], usable on `dyn Blackboard` too.
pub trait BlackboardExt: Blackboard {
    fn contains<T: 'static>(&self, key: BbKey<T>) -> bool {
        self.value(key.id).is_some()
    }

    fn get<T: 'static>(&self, key: BbKey<T>) -> Result<&T, BlackboardError> {
        self.try_get(key)?
            .ok_or(BlackboardError::MissingKey { key: key.id })
    }

    /// Like [`get`](Self::get), but a missing key is `Ok(None)`.
    fn try_get<T: 'static>(&self, key: BbKey<T>) -> Result<Option<&T>, BlackboardError> {
        let Some(value) = self.value(key.id) else {
            return Ok(None);
        };
        value
            .downcast_ref::<T>()
            .map(Some)
            .ok_or(BlackboardError::TypeMismatch {
                key: key.id,
                expected: type_name::<T>(),
            })
    }

    fn get_mut<T: 'static>(&mut self, key: BbKey<T>) -> Result<&mut T, BlackboardError> {
        let value = self
            .value_mut(key.id)
            .ok_or(BlackboardError::MissingKey { key: key.id })?;
        value
            .downcast_mut::<T>()
            .ok_or(BlackboardError::TypeMismatch {
                key: key.id,
                expected: type_name::<T>(),
            })
    }

    fn set<T: Send + 'static>(&mut self, key: BbKey<T>, value: T) {
        self.insert_value(key.id, Box::new(value));
    }

    fn remove<T: 'static>(&mut self, key: BbKey<T>) -> Result<Option<T>, BlackboardError> {
        let Some(value) = self.remove_value(key.id) else {
            return Ok(None);
        };
        match value.downcast::<T>() {
            Ok(value) => Ok(Some(*value)),
            Err(value) => {
                // Put it back; a failed typed remove must not lose data.
                self.insert_value(key.id, value);
                Err(BlackboardError::TypeMismatch {
                    key: key.id,
                    expected: type_name::<T>(),
                })
            }
        }
    }

    fn component<C: 'static>(&self) -> Result<&C, BlackboardError> {
        let name = type_name::<C>();
        self.component_by_type(TypeId::of::<C>())
            .ok_or(BlackboardError::MissingComponent { name })?
            .downcast_ref::<C>()
            .ok_or(BlackboardError::ComponentTypeMismatch { name })
    }

    fn component_mut<C: 'static>(&mut self) -> Result<&mut C, BlackboardError> {
        let name = type_name::<C>();
        self.component_by_type_mut(TypeId::of::<C>())
            .ok_or(BlackboardError::MissingComponent { name })?
            .downcast_mut::<C>()
            .ok_or(BlackboardError::ComponentTypeMismatch { name })
    }
}

impl<B: Blackboard + ?Sized> BlackboardExt for B {}

/// Deterministic in-memory blackboard.
#[derive(Default)]
pub struct MapBlackboard {
    values: BTreeMap<u64, Box<dyn Any + Send>>,
    components: BTreeMap<TypeId, Box<dyn Any + Send>>,
}

impl MapBlackboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.components.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.components.is_empty()
    }

    pub fn insert_component<C: Send + 'static>(&mut self, component: C) {
        self.components
            .insert(TypeId::of::<C>(), Box::new(component));
    }

    pub fn remove_component<C: 'static>(&mut self) -> Option<C> {
        let value = self.components.remove(&TypeId::of::<C>())?;
        value.downcast::<C>().ok().map(|b| *b)
    }
}

impl Blackboard for MapBlackboard {
    fn value(&self, key: u64) -> Option<&(dyn Any + Send)> {
        self.values.get(&key).map(|v| v.as_ref())
    }

    fn value_mut(&mut self, key: u64) -> Option<&mut (dyn Any + Send)> {
        self.values.get_mut(&key).map(|v| v.as_mut())
    }

    fn insert_value(&mut self, key: u64, value: Box<dyn Any + Send>) {
        self.values.insert(key, value);
    }

    fn remove_value(&mut self, key: u64) -> Option<Box<dyn Any + Send>> {
        self.values.remove(&key)
    }

    fn component_by_type(&self, ty: TypeId) -> Option<&(dyn Any + Send)> {
        self.components.get(&ty).map(|v| v.as_ref())
    }

    fn component_by_type_mut(&mut self, ty: TypeId) -> Option<&mut (dyn Any + Send)> {
        self.components.get_mut(&ty).map(|v| v.as_mut())
    }
}

impl fmt::Debug for MapBlackboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapBlackboard")
            .field("keys", &self.values.keys().collect::<Vec<_>>())
            .field("components", &self.components.len())
            .finish()
    }
}
