//! The host definition primitive
//!
//! A [`BinaryDefiner`] turns raw unit bytes into a [`TypeHandle`], loading the
//! unit's supertypes through the requesting loader before the handle exists.

use crate::error::LoadError;
use crate::handle::TypeHandle;
use crate::loader::Loader;
use unit_format::{verify_unit, UnitBinary};

/// Host capability that parses, verifies and links a unit binary.
pub trait BinaryDefiner: Send + Sync {
    /// Define `name` from `bytes` on behalf of `loader`.
    ///
    /// Referenced supertypes must be resolved through `loader` so that they
    /// are recorded by the loader that owns their namespace.
    fn define(&self, loader: &dyn Loader, name: &str, bytes: &[u8])
        -> Result<TypeHandle, LoadError>;
}

/// Definer for the [`unit_format`] binary format.
///
/// Dependencies are resolved depth-first: declared interfaces in
/// left-to-right order, then the supertype. Each dependency is defined (and
/// recorded) before the unit that references it.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardDefiner;

impl BinaryDefiner for StandardDefiner {
    #[tracing::instrument(level = "trace", skip(self, loader, bytes), fields(len = bytes.len()))]
    fn define(
        &self,
        loader: &dyn Loader,
        name: &str,
        bytes: &[u8],
    ) -> Result<TypeHandle, LoadError> {
        let format_error = |source| LoadError::Format {
            name: name.to_string(),
            source,
        };

        let binary = UnitBinary::decode(bytes).map_err(format_error)?;
        verify_unit(&binary).map_err(|e| format_error(e.into()))?;

        if binary.name != name {
            return Err(LoadError::NameMismatch {
                expected: name.to_string(),
                found: binary.name,
            });
        }

        let mut interfaces = Vec::with_capacity(binary.interfaces.len());
        for interface in &binary.interfaces {
            let handle = loader.resolve(interface)?;
            if !handle.is_interface() {
                return Err(LoadError::IncompatibleChange {
                    name: name.to_string(),
                    reason: format!("{interface} is a class, expected an interface"),
                });
            }
            interfaces.push(handle);
        }

        let superclass = match &binary.super_name {
            Some(super_name) => {
                let handle = loader.resolve(super_name)?;
                if handle.is_interface() {
                    return Err(LoadError::IncompatibleChange {
                        name: name.to_string(),
                        reason: format!("{super_name} is an interface, expected a class"),
                    });
                }
                if handle.is_final() {
                    return Err(LoadError::IncompatibleChange {
                        name: name.to_string(),
                        reason: format!("cannot extend final {super_name}"),
                    });
                }
                Some(handle)
            }
            None => None,
        };

        Ok(TypeHandle::new(
            binary,
            loader.identity().clone(),
            superclass,
            interfaces,
        ))
    }
}
