//! Unit Loader
//!
//! A minimal dynamic loader for compiled units:
//! - Resolves dotted unit names to binaries on a search path
//! - Defines them through an injected [`BinaryDefiner`]
//! - Records which units each loader defined, in definition order
//! - Delegates names outside its namespaces to a parent loader
//!
//! ```no_run
//! use std::sync::Arc;
//! use unit_loader::{DirectorySearchPath, Loader, LoaderConfig, SystemLoader, UnitLoader};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let system: Arc<dyn Loader> = Arc::new(SystemLoader::new(DirectorySearchPath::new(["units"])));
//! let loader = UnitLoader::new(LoaderConfig::new("example"), system)?;
//!
//! let sub = loader.load("example.Sub")?;
//! assert!(loader.is_loaded("example.Sub"));
//! println!("{:?} defined by {}", loader.loaded_names(), sub.defining_loader());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod definer;
pub mod error;
pub mod handle;
pub mod loader;
pub mod logging;
pub mod registry;
pub mod search_path;

pub use config::{FieldResolution, LoaderConfig, DEFAULT_LOADER_NAME};
pub use definer::{BinaryDefiner, StandardDefiner};
pub use error::{ConfigError, LoadError};
pub use handle::{FieldHandle, FieldType, LoaderIdentity, TypeHandle};
pub use loader::{ancestry, Loader, SystemLoader, UnitLoader, SYSTEM_LOADER_NAME};
pub use logging::init_tracing;
pub use registry::UnitRegistry;
pub use search_path::{ByteSource, DirectorySearchPath, MemorySearchPath, Resource, SearchPath};
