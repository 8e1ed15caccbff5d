//! Error taxonomy tests
//!
//! Every failure is terminal for the triggering load and leaves previously
//! defined dependencies in place.

use parking_lot::Mutex;
use std::io::{self, Read};
use std::sync::Arc;
use unit_format::{flags, resource_path, UnitBinary, UnitError};
use unit_loader::{
    BinaryDefiner, LoadError, Loader, LoaderConfig, MemorySearchPath, Resource, SearchPath,
    StandardDefiner, SystemLoader, TypeHandle, UnitLoader,
};

fn create_loader(search_path: MemorySearchPath) -> UnitLoader {
    let system: Arc<dyn Loader> = Arc::new(SystemLoader::new(search_path));
    UnitLoader::new(LoaderConfig::new("example"), system).unwrap()
}

fn units(units: Vec<UnitBinary>) -> MemorySearchPath {
    let mut search_path = MemorySearchPath::new();
    for unit in &units {
        search_path.insert_unit(unit);
    }
    search_path
}

// ===== Lookup Failures =====

#[test]
fn test_missing_unit_not_found() {
    let loader = create_loader(MemorySearchPath::new());

    let err = loader.load("example.Missing").unwrap_err();

    assert!(matches!(&err, LoadError::NotFound(name) if name == "example.Missing"));
    assert!(!err.is_linkage_error());
    assert!(loader.loaded_names().is_empty());
}

#[test]
fn test_delegation_failure_propagated_verbatim() {
    let loader = create_loader(MemorySearchPath::new());

    let err = loader.load("lib.Missing").unwrap_err();

    assert!(matches!(&err, LoadError::NotFound(name) if name == "lib.Missing"));
}

#[test]
fn test_missing_dependency_keeps_earlier_definitions() {
    let loader = create_loader(units(vec![
        UnitBinary::new_interface("example.Present"),
        UnitBinary::new_class("example.Broken")
            .implements("example.Present")
            .implements("example.Absent"),
    ]));

    let err = loader.load("example.Broken").unwrap_err();

    assert!(matches!(&err, LoadError::NotFound(name) if name == "example.Absent"));
    assert_eq!(loader.loaded_names(), vec!["example.Present"]);
    assert!(!loader.is_loaded("example.Broken"));
}

#[test]
fn test_failed_field_link_leaves_owner_unrecorded() {
    let loader = create_loader(units(vec![
        UnitBinary::new_class("example.Sub"),
        UnitBinary::new_class("example.Host")
            .field("sub", "example.Sub")
            .field("missing", "example.Missing"),
    ]));

    for _ in 0..2 {
        let err = loader.load("example.Host").unwrap_err();
        assert!(matches!(&err, LoadError::NotFound(name) if name == "example.Missing"));
        assert!(!loader.is_loaded("example.Host"));
    }
    assert_eq!(loader.loaded_names(), vec!["example.Sub"]);
}

#[test]
fn test_failed_field_link_retry_under_force_reload() {
    let system: Arc<dyn Loader> = Arc::new(SystemLoader::new(units(vec![
        UnitBinary::new_class("example.Host").field("missing", "example.Missing"),
    ])));
    let config = LoaderConfig::new("example").force_reload(true);
    let loader = UnitLoader::new(config, system).unwrap();

    for _ in 0..2 {
        assert!(matches!(
            loader.load("example.Host"),
            Err(LoadError::NotFound(ref name)) if name == "example.Missing"
        ));
    }
    assert!(loader.loaded_names().is_empty());
}

// ===== I/O Failures =====

/// Reader that yields a few bytes and then fails
struct FailingReader {
    served: bool,
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.served {
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "stream reset"));
        }
        self.served = true;
        buf[..4].copy_from_slice(b"UNIT");
        Ok(4)
    }
}

struct FlakySearchPath;

impl SearchPath for FlakySearchPath {
    fn find(&self, resource: &str) -> Option<Resource> {
        (resource == resource_path("example.Flaky")).then(|| {
            Resource::custom("flaky:example/Flaky.unit", || {
                Ok(Box::new(FailingReader { served: false }) as Box<dyn Read + Send>)
            })
        })
    }
}

#[test]
fn test_read_failure_wrapped_with_cause() {
    let system: Arc<dyn Loader> = Arc::new(SystemLoader::new(FlakySearchPath));
    let loader = UnitLoader::new(LoaderConfig::new("example"), system).unwrap();

    let err = loader.load("example.Flaky").unwrap_err();

    match &err {
        LoadError::Io { name, source } => {
            assert_eq!(name, "example.Flaky");
            assert_eq!(source.kind(), io::ErrorKind::ConnectionReset);
        }
        other => panic!("Expected I/O failure, got {other:?}"),
    }
    assert!(std::error::Error::source(&err).is_some());
    assert!(loader.loaded_names().is_empty());
}

// ===== Definition Failures =====

#[test]
fn test_corrupted_binary_is_format_error() {
    let mut search_path = MemorySearchPath::new();
    let mut bytes = UnitBinary::new_class("example.Corrupt").encode();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    search_path.insert(resource_path("example.Corrupt"), bytes);
    let loader = create_loader(search_path);

    let err = loader.load("example.Corrupt").unwrap_err();

    assert!(matches!(
        err,
        LoadError::Format {
            source: UnitError::ChecksumMismatch { .. },
            ..
        }
    ));
}

#[test]
fn test_unverifiable_binary_is_format_error() {
    let loader = create_loader(units(vec![
        UnitBinary::new_interface("example.Bad").extends("example.Sup")
    ]));

    let err = loader.load("example.Bad").unwrap_err();

    assert!(matches!(
        err,
        LoadError::Format {
            source: UnitError::Verify(_),
            ..
        }
    ));
    assert!(err.is_linkage_error());
}

#[test]
fn test_binary_declaring_other_name() {
    let mut search_path = MemorySearchPath::new();
    search_path.insert(
        resource_path("example.Alias"),
        UnitBinary::new_class("example.Real").encode(),
    );
    let loader = create_loader(search_path);

    let err = loader.load("example.Alias").unwrap_err();

    assert!(matches!(
        err,
        LoadError::NameMismatch { ref expected, ref found }
            if expected == "example.Alias" && found == "example.Real"
    ));
}

#[test]
fn test_circular_supertypes() {
    let loader = create_loader(units(vec![
        UnitBinary::new_class("example.A").extends("example.B"),
        UnitBinary::new_class("example.B").extends("example.A"),
    ]));

    let err = loader.load("example.A").unwrap_err();

    assert!(matches!(err, LoadError::Circularity(ref name) if name == "example.A"));
    assert!(loader.loaded_names().is_empty());

    // Markers are cleared, so the same failure repeats instead of sticking
    assert!(matches!(
        loader.load("example.B"),
        Err(LoadError::Circularity(_))
    ));
}

#[test]
fn test_extending_interface_is_incompatible() {
    let loader = create_loader(units(vec![
        UnitBinary::new_interface("example.Any"),
        UnitBinary::new_class("example.Wrong").extends("example.Any"),
    ]));

    let err = loader.load("example.Wrong").unwrap_err();

    assert!(matches!(err, LoadError::IncompatibleChange { .. }));
    assert_eq!(loader.loaded_names(), vec!["example.Any"]);
}

#[test]
fn test_implementing_class_is_incompatible() {
    let loader = create_loader(units(vec![
        UnitBinary::new_class("example.Sup"),
        UnitBinary::new_class("example.Wrong").implements("example.Sup"),
    ]));

    assert!(matches!(
        loader.load("example.Wrong"),
        Err(LoadError::IncompatibleChange { .. })
    ));
}

#[test]
fn test_extending_final_is_incompatible() {
    let loader = create_loader(units(vec![
        UnitBinary::new_class("example.Sealed").with_flags(flags::FINAL),
        UnitBinary::new_class("example.Sub").extends("example.Sealed"),
    ]));

    let err = loader.load("example.Sub").unwrap_err();

    assert!(err.to_string().contains("cannot extend final example.Sealed"));
}

// ===== Field Lookup =====

#[test]
fn test_unknown_field() {
    let loader = create_loader(units(vec![UnitBinary::new_class("example.Foo")]));
    let foo = loader.load("example.Foo").unwrap();

    assert!(matches!(
        loader.declared_field(&foo, "missing"),
        Err(LoadError::NoSuchField { .. })
    ));
}

#[test]
fn test_field_lookup_through_foreign_loader() {
    let loader = create_loader(units(vec![
        UnitBinary::new_class("example.Foo").field("x", "i32")
    ]));
    let foo = loader.load("example.Foo").unwrap();
    let parent = loader.parent().unwrap();

    assert!(matches!(
        parent.declared_field(&foo, "x"),
        Err(LoadError::ForeignUnit { .. })
    ));
}

// ===== Custom Definer =====

/// Definer that records every name it is asked to define
struct RecordingDefiner {
    defined: Mutex<Vec<String>>,
}

impl BinaryDefiner for RecordingDefiner {
    fn define(
        &self,
        loader: &dyn Loader,
        name: &str,
        bytes: &[u8],
    ) -> Result<TypeHandle, LoadError> {
        self.defined.lock().push(name.to_string());
        StandardDefiner.define(loader, name, bytes)
    }
}

#[test]
fn test_cache_hits_skip_definer() {
    let search_path = units(vec![
        UnitBinary::new_interface("example.Any"),
        UnitBinary::new_class("example.Impl").implements("example.Any"),
    ]);
    let system: Arc<dyn Loader> = Arc::new(SystemLoader::new(search_path));
    let definer = Arc::new(RecordingDefiner {
        defined: Mutex::new(Vec::new()),
    });
    let loader =
        UnitLoader::with_definer(LoaderConfig::new("example"), system, definer.clone()).unwrap();

    loader.load("example.Impl").unwrap();
    loader.load("example.Impl").unwrap();
    loader.load("example.Any").unwrap();

    // Definition starts outside-in and completes inside-out
    assert_eq!(*definer.defined.lock(), vec!["example.Impl", "example.Any"]);
    assert_eq!(loader.loaded_names(), vec!["example.Any", "example.Impl"]);
}
