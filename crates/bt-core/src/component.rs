use std::any::{type_name, TypeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

/// A host component type a tick needs access to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentType {
    pub type_id: TypeId,
    pub name: &'static str,
    pub access: AccessMode,
}

impl ComponentType {
    pub fn of<C: 'static>(access: AccessMode) -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            name: type_name::<C>(),
            access,
        }
    }

    pub fn read_only<C: 'static>() -> Self {
        Self::of::<C>(AccessMode::ReadOnly)
    }

    pub fn read_write<C: 'static>() -> Self {
        Self::of::<C>(AccessMode::ReadWrite)
    }
}

/// Static declaration of the components a tree (or a single variable) touches.
///
/// Consumed by host schedulers to order or parallelize work; the VM does not enforce it.
/// Each component appears once; read-write wins over read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentAccessList {
    entries: Vec<ComponentType>,
}

impl ComponentAccessList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, component: ComponentType) {
        match self
            .entries
            .iter_mut()
            .find(|c| c.type_id == component.type_id)
        {
            Some(existing) => existing.access = existing.access.max(component.access),
            None => {
                let at = self
                    .entries
                    .partition_point(|c| c.name < component.name);
                self.entries.insert(at, component);
            }
        }
    }

    pub fn access_of<C: 'static>(&self) -> Option<AccessMode> {
        let id = TypeId::of::<C>();
        self.entries
            .iter()
            .find(|c| c.type_id == id)
            .map(|c| c.access)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentType> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Extend<ComponentType> for ComponentAccessList {
    fn extend<I: IntoIterator<Item = ComponentType>>(&mut self, iter: I) {
        for component in iter {
            self.insert(component);
        }
    }
}

impl FromIterator<ComponentType> for ComponentAccessList {
    fn from_iter<I: IntoIterator<Item = ComponentType>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl<'a> IntoIterator for &'a ComponentAccessList {
    type Item = &'a ComponentType;
    type IntoIter = std::slice::Iter<'a, ComponentType>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for ComponentAccessList {
    type Item = ComponentType;
    type IntoIter = std::vec::IntoIter<ComponentType>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
