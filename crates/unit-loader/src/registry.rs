//! Per-loader registry of defined units

use crate::handle::TypeHandle;
use rustc_hash::FxHashMap;

/// Record of the units one loader has defined, in definition order.
///
/// Entries are never removed.
#[derive(Debug, Default)]
pub struct UnitRegistry {
    /// Units in definition order
    units: Vec<TypeHandle>,
    /// Unit name to index in `units`
    name_to_index: FxHashMap<String, usize>,
}

impl UnitRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a definition.
    ///
    /// Returns the already-registered handle if `handle`'s name is taken; the
    /// registry is left unchanged in that case.
    pub fn register(&mut self, handle: TypeHandle) -> Result<(), TypeHandle> {
        if let Some(&index) = self.name_to_index.get(handle.name()) {
            return Err(self.units[index].clone());
        }
        self.name_to_index
            .insert(handle.name().to_string(), self.units.len());
        self.units.push(handle);
        Ok(())
    }

    /// Get a unit by name
    pub fn get(&self, name: &str) -> Option<&TypeHandle> {
        self.name_to_index.get(name).map(|&index| &self.units[index])
    }

    /// Check whether a unit is registered
    pub fn contains(&self, name: &str) -> bool {
        self.name_to_index.contains_key(name)
    }

    /// Unit names in definition order
    pub fn names(&self) -> Vec<String> {
        self.units.iter().map(|u| u.name().to_string()).collect()
    }

    /// Number of registered units
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether nothing has been registered yet
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Iterate over units in definition order
    pub fn iter(&self) -> impl Iterator<Item = &TypeHandle> {
        self.units.iter()
    }
}
