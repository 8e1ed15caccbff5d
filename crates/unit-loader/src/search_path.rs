//! Search paths: mapping resource paths to byte sources
//!
//! A loader asks its search path for `example/Sub.unit`; the search path
//! answers with a [`Resource`] that can be opened into a byte stream, or with
//! nothing.

use rustc_hash::FxHashMap;
use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use unit_format::{resource_path, UnitBinary};

/// An open byte stream over a unit binary
pub type ByteSource = Box<dyn Read + Send>;

type Opener = Arc<dyn Fn() -> io::Result<ByteSource> + Send + Sync>;

#[derive(Clone)]
enum Origin {
    File(PathBuf),
    Bytes(Arc<[u8]>),
    Custom(Opener),
}

/// A located resource that has not been opened yet
#[derive(Clone)]
pub struct Resource {
    location: String,
    origin: Origin,
}

impl Resource {
    /// Resource backed by a file on disk
    pub fn file(path: PathBuf) -> Self {
        Self {
            location: path.display().to_string(),
            origin: Origin::File(path),
        }
    }

    /// Resource backed by an in-memory buffer
    pub fn bytes(location: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            location: location.into(),
            origin: Origin::Bytes(bytes.into()),
        }
    }

    /// Resource backed by a host-provided opener
    pub fn custom<F>(location: impl Into<String>, opener: F) -> Self
    where
        F: Fn() -> io::Result<ByteSource> + Send + Sync + 'static,
    {
        Self {
            location: location.into(),
            origin: Origin::Custom(Arc::new(opener)),
        }
    }

    /// Where the resource lives (path or pseudo-URL), for diagnostics
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Open the resource for reading
    pub fn open(&self) -> io::Result<ByteSource> {
        match &self.origin {
            Origin::File(path) => Ok(Box::new(File::open(path)?)),
            Origin::Bytes(bytes) => Ok(Box::new(Cursor::new(bytes.clone()))),
            Origin::Custom(opener) => opener(),
        }
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("location", &self.location)
            .finish()
    }
}

/// Something that can find named binary resources
pub trait SearchPath: Send + Sync {
    /// Find `resource` (a `/`-separated relative path)
    fn find(&self, resource: &str) -> Option<Resource>;
}

/// Ordered list of root directories; the first root holding the resource wins
#[derive(Debug, Clone, Default)]
pub struct DirectorySearchPath {
    roots: Vec<PathBuf>,
}

impl DirectorySearchPath {
    /// Create a search path over `roots`, searched in order
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    /// Append a root directory
    pub fn push_root(&mut self, root: impl Into<PathBuf>) {
        self.roots.push(root.into());
    }

    /// Root directories in search order
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Write `unit` under `root` at its resource path, creating directories
    pub fn install(root: &Path, unit: &UnitBinary) -> io::Result<PathBuf> {
        let path = root.join(resource_path(&unit.name));
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, unit.encode())?;
        Ok(path)
    }
}

impl SearchPath for DirectorySearchPath {
    fn find(&self, resource: &str) -> Option<Resource> {
        self.roots
            .iter()
            .map(|root| root.join(resource))
            .find(|path| path.is_file())
            .map(Resource::file)
    }
}

/// In-memory resources keyed by resource path
#[derive(Debug, Clone, Default)]
pub struct MemorySearchPath {
    entries: FxHashMap<String, Arc<[u8]>>,
}

impl MemorySearchPath {
    /// Create an empty in-memory search path
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw bytes under a resource path
    pub fn insert(&mut self, resource: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        self.entries.insert(resource.into(), bytes.into());
    }

    /// Encode `unit` and store it under its resource path
    pub fn insert_unit(&mut self, unit: &UnitBinary) {
        self.insert(resource_path(&unit.name), unit.encode());
    }

    /// Builder form of [`insert_unit`](Self::insert_unit)
    pub fn with_unit(mut self, unit: UnitBinary) -> Self {
        self.insert_unit(&unit);
        self
    }

    /// Number of stored resources
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SearchPath for MemorySearchPath {
    fn find(&self, resource: &str) -> Option<Resource> {
        self.entries
            .get(resource)
            .map(|bytes| Resource::bytes(format!("memory:{resource}"), bytes.clone()))
    }
}
