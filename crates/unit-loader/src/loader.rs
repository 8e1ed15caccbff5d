//! The loader tree
//!
//! Loaders form a tree with a single [`SystemLoader`] at the root. Each
//! [`UnitLoader`] claims one or more namespaces, defines units inside them
//! itself, and delegates everything else to its parent.
//!
//! # Concurrency
//!
//! Every loader tolerates concurrent `is_loaded` / `loaded_names` calls while
//! one `load` is in flight. Concurrent `load` calls on the *same*
//! [`UnitLoader`] are not linearized against each other: callers that share
//! one instance across threads must serialize their loads, or accept that two
//! racing definitions of one name end in a duplicate-definition error for the
//! thread that records second. Circularity is tracked per thread, so a race
//! is never reported as a cycle. The [`SystemLoader`] is meant to be shared
//! and serializes its own loads.

use crate::config::{FieldResolution, LoaderConfig};
use crate::definer::{BinaryDefiner, StandardDefiner};
use crate::error::{ConfigError, LoadError};
use crate::handle::{FieldHandle, FieldType, LoaderIdentity, TypeHandle};
use crate::registry::UnitRegistry;
use crate::search_path::{DirectorySearchPath, Resource, SearchPath};
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use rustc_hash::FxHashSet;
use std::fmt;
use std::io::{BufReader, Read};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::{debug, trace, warn};
use unit_format::{is_primitive_type, is_valid_unit_name, resource_path};

/// Display name of the root loader
pub const SYSTEM_LOADER_NAME: &str = "system";

/// A node in the loader tree.
pub trait Loader: Send + Sync {
    /// Identity used in diagnostics and as the defining loader of handles
    fn identity(&self) -> &LoaderIdentity;

    /// Parent loader; `None` only for the root
    fn parent(&self) -> Option<&dyn Loader>;

    /// This loader's own search path, consulted after the parent chain
    fn search_path(&self) -> Option<&dyn SearchPath>;

    /// Load `name`, defining or delegating as this loader sees fit
    fn load(&self, name: &str) -> Result<TypeHandle, LoadError>;

    /// Handle for `name` if this loader itself defined it
    fn find_defined(&self, name: &str) -> Option<TypeHandle>;

    /// Resolve a dependency: an existing definition if there is one,
    /// otherwise a regular [`load`](Loader::load).
    ///
    /// Used while linking, so force-reload never re-defines a dependency.
    fn resolve(&self, name: &str) -> Result<TypeHandle, LoadError> {
        match self.find_defined(name) {
            Some(handle) => Ok(handle),
            None => self.load(name),
        }
    }

    /// Find a resource, asking the parent chain before this loader's own
    /// search path.
    fn find_resource(&self, resource: &str) -> Option<Resource> {
        self.parent()
            .and_then(|parent| parent.find_resource(resource))
            .or_else(|| self.search_path().and_then(|path| path.find(resource)))
    }

    /// Look up a declared field of `owner` and resolve its type through this
    /// loader, which must be the one that defined `owner`.
    fn declared_field(&self, owner: &TypeHandle, field: &str) -> Result<FieldHandle, LoadError> {
        if owner.defining_loader() != self.identity() {
            return Err(LoadError::ForeignUnit {
                owner: owner.name().to_string(),
                loader: self.identity().clone(),
            });
        }

        let decl = owner.field(field).ok_or_else(|| LoadError::NoSuchField {
            owner: owner.name().to_string(),
            field: field.to_string(),
        })?;

        let field_type = if is_primitive_type(&decl.type_name) {
            FieldType::Primitive(decl.type_name.clone())
        } else {
            FieldType::Unit(self.resolve(&decl.type_name)?)
        };

        Ok(FieldHandle {
            owner: owner.clone(),
            name: decl.name.clone(),
            field_type,
        })
    }
}

/// Display names of `loader` and its ancestors, root first
pub fn ancestry(loader: &dyn Loader) -> Vec<String> {
    let mut names = Vec::new();
    let mut current = Some(loader);
    while let Some(node) = current {
        names.push(node.identity().name().to_string());
        current = node.parent();
    }
    names.reverse();
    names
}

type InProgressKey = (ThreadId, String);

/// Registry plus the names whose definition is under way, per thread
#[derive(Default)]
struct Definitions {
    registry: RwLock<UnitRegistry>,
    in_progress: Mutex<FxHashSet<InProgressKey>>,
}

impl Definitions {
    fn get(&self, name: &str) -> Option<TypeHandle> {
        self.registry.read().get(name).cloned()
    }

    fn contains(&self, name: &str) -> bool {
        self.registry.read().contains(name)
    }

    fn names(&self) -> Vec<String> {
        self.registry.read().names()
    }

    fn begin(&self, name: &str) -> Result<InProgress<'_>, LoadError> {
        let key = (thread::current().id(), name.to_string());
        if !self.in_progress.lock().insert(key.clone()) {
            return Err(LoadError::Circularity(name.to_string()));
        }
        Ok(InProgress {
            in_progress: &self.in_progress,
            key,
        })
    }

    /// Whether the current thread is defining `name` further up its stack
    fn is_in_progress(&self, name: &str) -> bool {
        self.in_progress
            .lock()
            .contains(&(thread::current().id(), name.to_string()))
    }
}

/// Clears an in-progress marker on every exit path
struct InProgress<'a> {
    in_progress: &'a Mutex<FxHashSet<InProgressKey>>,
    key: InProgressKey,
}

impl Drop for InProgress<'_> {
    fn drop(&mut self) {
        self.in_progress.lock().remove(&self.key);
    }
}

fn check_name(name: &str) -> Result<(), LoadError> {
    if is_valid_unit_name(name) {
        Ok(())
    } else {
        Err(LoadError::InvalidName(name.to_string()))
    }
}

/// Read a whole resource into memory. The stream is dropped on every path.
fn read_binary(name: &str, resource: &Resource) -> Result<Vec<u8>, LoadError> {
    let io_error = |source| LoadError::Io {
        name: name.to_string(),
        source,
    };

    let mut reader = BufReader::new(resource.open().map_err(io_error)?);
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).map_err(io_error)?;
    Ok(bytes)
}

/// Load every non-primitive field type of `handle`.
///
/// Names the current thread is still defining (the owner itself, or a unit
/// whose definition led here) are skipped: they are recorded when their own
/// definition completes, or the enclosing load fails.
fn link_field_types(
    loader: &dyn Loader,
    definitions: &Definitions,
    handle: &TypeHandle,
) -> Result<(), LoadError> {
    for type_name in handle.fields().iter().map(|f| f.type_name.as_str()) {
        if is_primitive_type(type_name) || definitions.is_in_progress(type_name) {
            continue;
        }
        loader.resolve(type_name)?;
    }
    Ok(())
}

/// Locate, read, define, link and record `name` on behalf of `loader`.
///
/// `name` is recorded only once everything it needs has loaded; a failure
/// leaves it unrecorded.
fn define_unit(
    loader: &dyn Loader,
    definer: &dyn BinaryDefiner,
    definitions: &Definitions,
    fields: FieldResolution,
    name: &str,
) -> Result<TypeHandle, LoadError> {
    let in_progress = definitions.begin(name)?;

    let resource = loader
        .find_resource(&resource_path(name))
        .ok_or_else(|| LoadError::NotFound(name.to_string()))?;
    trace!(unit = name, location = resource.location(), "reading unit binary");
    let bytes = read_binary(name, &resource)?;

    let handle = definer.define(loader, name, &bytes)?;
    if fields == FieldResolution::Eager {
        link_field_types(loader, definitions, &handle)?;
    }

    if definitions.registry.write().register(handle.clone()).is_err() {
        warn!(unit = name, loader = %loader.identity(), "duplicate unit definition");
        return Err(LoadError::DuplicateDefinition {
            loader: loader.identity().clone(),
            name: name.to_string(),
        });
    }
    debug!(unit = name, loader = %loader.identity(), "defined unit");
    drop(in_progress);

    Ok(handle)
}

/// Root of the loader tree.
///
/// Defines every unit found on its search path, caches it, and never
/// delegates. Loads are serialized so one root can back many loaders on
/// different threads.
pub struct SystemLoader {
    identity: LoaderIdentity,
    search_path: Arc<dyn SearchPath>,
    definer: Arc<dyn BinaryDefiner>,
    definitions: Definitions,
    // Re-entrant: defining a unit loads its supertypes on the same thread
    load_lock: ReentrantMutex<()>,
}

impl SystemLoader {
    /// Create a root loader over `search_path` using the [`StandardDefiner`]
    pub fn new(search_path: impl SearchPath + 'static) -> Self {
        Self::with_definer(Arc::new(search_path), Arc::new(StandardDefiner))
    }

    /// Create a root loader with a host-provided definer
    pub fn with_definer(
        search_path: Arc<dyn SearchPath>,
        definer: Arc<dyn BinaryDefiner>,
    ) -> Self {
        Self {
            identity: LoaderIdentity::new(SYSTEM_LOADER_NAME),
            search_path,
            definer,
            definitions: Definitions::default(),
            load_lock: ReentrantMutex::new(()),
        }
    }

    /// Whether this loader defined `name`
    pub fn is_loaded(&self, name: &str) -> bool {
        self.definitions.contains(name)
    }

    /// Names this loader defined, in definition order
    pub fn loaded_names(&self) -> Vec<String> {
        self.definitions.names()
    }
}

impl Loader for SystemLoader {
    fn identity(&self) -> &LoaderIdentity {
        &self.identity
    }

    fn parent(&self) -> Option<&dyn Loader> {
        None
    }

    fn search_path(&self) -> Option<&dyn SearchPath> {
        Some(self.search_path.as_ref())
    }

    #[tracing::instrument(level = "debug", skip(self), fields(loader = %self.identity))]
    fn load(&self, name: &str) -> Result<TypeHandle, LoadError> {
        check_name(name)?;
        let _guard = self.load_lock.lock();

        if let Some(handle) = self.definitions.get(name) {
            return Ok(handle);
        }

        define_unit(
            self,
            self.definer.as_ref(),
            &self.definitions,
            FieldResolution::Eager,
            name,
        )
    }

    fn find_defined(&self, name: &str) -> Option<TypeHandle> {
        self.definitions.get(name)
    }
}

impl fmt::Debug for SystemLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemLoader")
            .field("identity", &self.identity)
            .field("loaded", &self.definitions.names())
            .finish()
    }
}

/// Namespaced loader that defines units directly from their binaries.
///
/// Names inside the configured namespaces are defined by this loader and
/// recorded in definition order; every other name is delegated to the parent
/// and left unrecorded.
pub struct UnitLoader {
    identity: LoaderIdentity,
    config: LoaderConfig,
    parent: Arc<dyn Loader>,
    search_path: Option<DirectorySearchPath>,
    definer: Arc<dyn BinaryDefiner>,
    definitions: Definitions,
}

impl UnitLoader {
    /// Create a loader using the [`StandardDefiner`]
    pub fn new(config: LoaderConfig, parent: Arc<dyn Loader>) -> Result<Self, ConfigError> {
        Self::with_definer(config, parent, Arc::new(StandardDefiner))
    }

    /// Create a loader with a host-provided definer
    pub fn with_definer(
        config: LoaderConfig,
        parent: Arc<dyn Loader>,
        definer: Arc<dyn BinaryDefiner>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let search_path = (!config.search_path.is_empty())
            .then(|| DirectorySearchPath::new(config.search_path.iter().cloned()));

        Ok(Self {
            identity: LoaderIdentity::new(&config.name),
            config,
            parent,
            search_path,
            definer,
            definitions: Definitions::default(),
        })
    }

    /// The configuration this loader was built with
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Whether this loader itself defined `name`.
    ///
    /// Names that resolve through the parent are never reported.
    pub fn is_loaded(&self, name: &str) -> bool {
        self.definitions.contains(name)
    }

    /// Names this loader defined, in definition order
    pub fn loaded_names(&self) -> Vec<String> {
        self.definitions.names()
    }
}

impl Loader for UnitLoader {
    fn identity(&self) -> &LoaderIdentity {
        &self.identity
    }

    fn parent(&self) -> Option<&dyn Loader> {
        Some(self.parent.as_ref())
    }

    fn search_path(&self) -> Option<&dyn SearchPath> {
        self.search_path.as_ref().map(|path| path as &dyn SearchPath)
    }

    #[tracing::instrument(level = "debug", skip(self), fields(loader = %self.identity))]
    fn load(&self, name: &str) -> Result<TypeHandle, LoadError> {
        check_name(name)?;

        if !self.config.force_reload {
            if let Some(handle) = self.definitions.get(name) {
                trace!("cache hit");
                return Ok(handle);
            }
        }

        if !self.config.owns(name) {
            trace!("delegating to parent");
            return self.parent.load(name);
        }

        define_unit(
            self,
            self.definer.as_ref(),
            &self.definitions,
            self.config.field_resolution,
            name,
        )
    }

    fn find_defined(&self, name: &str) -> Option<TypeHandle> {
        self.definitions.get(name)
    }
}

impl fmt::Debug for UnitLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitLoader")
            .field("identity", &self.identity)
            .field("config", &self.config)
            .field("parent", self.parent.identity())
            .field("loaded", &self.definitions.names())
            .finish()
    }
}
