//! Live handles to defined units and the identity of their loaders

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use unit_format::{flags, FieldDef, UnitBinary, UnitKind};

/// Identity of a loader instance: a display name plus a process-unique id.
///
/// Two loaders may share a display name but never an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoaderIdentity {
    name: Arc<str>,
    id: u64,
}

impl LoaderIdentity {
    /// Create a new identity with a fresh id
    pub fn new(name: &str) -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self {
            name: Arc::from(name),
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw id value
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Display for LoaderIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "loader '{}' @{:x}", self.name, self.id)
    }
}

struct TypeInfo {
    name: String,
    kind: UnitKind,
    flags: u32,
    loader: LoaderIdentity,
    superclass: Option<TypeHandle>,
    interfaces: Vec<TypeHandle>,
    fields: Vec<FieldDef>,
}

/// Handle to a defined unit.
///
/// Cloning is cheap. Equality and hashing are by identity: handles compare
/// equal only when they come from the same definition, so the same compiled
/// unit defined by two loaders yields two unrelated types.
#[derive(Clone)]
pub struct TypeHandle(Arc<TypeInfo>);

impl TypeHandle {
    /// Build a handle from a decoded binary and its already-resolved supertypes.
    ///
    /// `interfaces` must be in the binary's declared order.
    pub fn new(
        binary: UnitBinary,
        loader: LoaderIdentity,
        superclass: Option<TypeHandle>,
        interfaces: Vec<TypeHandle>,
    ) -> Self {
        Self(Arc::new(TypeInfo {
            name: binary.name,
            kind: binary.kind,
            flags: binary.flags,
            loader,
            superclass,
            interfaces,
            fields: binary.fields,
        }))
    }

    /// Fully-qualified unit name
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Class or interface
    pub fn kind(&self) -> UnitKind {
        self.0.kind
    }

    /// Whether this is an interface
    pub fn is_interface(&self) -> bool {
        self.0.kind == UnitKind::Interface
    }

    /// Whether the unit is marked final
    pub fn is_final(&self) -> bool {
        self.0.flags & flags::FINAL != 0
    }

    /// Raw unit flags
    pub fn flags(&self) -> u32 {
        self.0.flags
    }

    /// Identity of the loader that defined this unit
    pub fn defining_loader(&self) -> &LoaderIdentity {
        &self.0.loader
    }

    /// Resolved supertype
    pub fn superclass(&self) -> Option<&TypeHandle> {
        self.0.superclass.as_ref()
    }

    /// Resolved interfaces, in declared order
    pub fn interfaces(&self) -> &[TypeHandle] {
        &self.0.interfaces
    }

    /// Declared fields
    pub fn fields(&self) -> &[FieldDef] {
        &self.0.fields
    }

    /// Look up a declared field by name
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.0.fields.iter().find(|f| f.name == name)
    }

    /// Whether a value of type `other` can be used where `self` is expected.
    pub fn is_assignable_from(&self, other: &TypeHandle) -> bool {
        if self == other {
            return true;
        }
        if other
            .superclass()
            .is_some_and(|sup| self.is_assignable_from(sup))
        {
            return true;
        }
        other
            .interfaces()
            .iter()
            .any(|interface| self.is_assignable_from(interface))
    }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for TypeHandle {}

impl Hash for TypeHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeHandle")
            .field("name", &self.0.name)
            .field("kind", &self.0.kind)
            .field("loader", &self.0.loader)
            .finish()
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

/// Resolved type of a declared field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// Primitive keyword, never loaded
    Primitive(String),
    /// Unit resolved through the owner's defining loader
    Unit(TypeHandle),
}

/// A declared field together with its resolved type
#[derive(Debug, Clone)]
pub struct FieldHandle {
    /// Unit declaring the field
    pub owner: TypeHandle,
    /// Field name
    pub name: String,
    /// Resolved field type
    pub field_type: FieldType,
}
