//! Structural verification of decoded units

use crate::name::{is_primitive_type, is_valid_unit_name};
use crate::unit::{UnitBinary, UnitKind};
use std::collections::HashSet;

/// Unit verification errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VerifyError {
    /// Malformed unit, supertype, interface or field type name
    #[error("Malformed name '{0}'")]
    MalformedName(String),

    /// Interfaces have no supertype, only super-interfaces
    #[error("Interface '{0}' declares a supertype")]
    InterfaceWithSupertype(String),

    /// Unit names itself as a supertype or interface
    #[error("Unit '{0}' inherits from itself")]
    SelfInheritance(String),

    /// Same interface listed twice
    #[error("Duplicate interface '{interface}' in '{unit}'")]
    DuplicateInterface {
        /// Declaring unit
        unit: String,
        /// Repeated interface name
        interface: String,
    },

    /// Same field name declared twice
    #[error("Duplicate field '{field}' in '{unit}'")]
    DuplicateField {
        /// Declaring unit
        unit: String,
        /// Repeated field name
        field: String,
    },

    /// Field name is empty
    #[error("Empty field name in '{0}'")]
    EmptyFieldName(String),
}

/// Verify a unit's structure
pub fn verify_unit(unit: &UnitBinary) -> Result<(), VerifyError> {
    if !is_valid_unit_name(&unit.name) {
        return Err(VerifyError::MalformedName(unit.name.clone()));
    }

    if let Some(super_name) = &unit.super_name {
        if unit.kind == UnitKind::Interface {
            return Err(VerifyError::InterfaceWithSupertype(unit.name.clone()));
        }
        verify_reference(&unit.name, super_name)?;
    }

    let mut seen = HashSet::new();
    for interface in &unit.interfaces {
        verify_reference(&unit.name, interface)?;
        if !seen.insert(interface.as_str()) {
            return Err(VerifyError::DuplicateInterface {
                unit: unit.name.clone(),
                interface: interface.clone(),
            });
        }
    }

    let mut fields = HashSet::new();
    for field in &unit.fields {
        if field.name.is_empty() {
            return Err(VerifyError::EmptyFieldName(unit.name.clone()));
        }
        if !fields.insert(field.name.as_str()) {
            return Err(VerifyError::DuplicateField {
                unit: unit.name.clone(),
                field: field.name.clone(),
            });
        }
        // Fields may legally reference their own unit
        if !is_primitive_type(&field.type_name) && !is_valid_unit_name(&field.type_name) {
            return Err(VerifyError::MalformedName(field.type_name.clone()));
        }
    }

    Ok(())
}

fn verify_reference(unit: &str, referenced: &str) -> Result<(), VerifyError> {
    if !is_valid_unit_name(referenced) {
        return Err(VerifyError::MalformedName(referenced.to_string()));
    }
    if referenced == unit {
        return Err(VerifyError::SelfInheritance(unit.to_string()));
    }
    Ok(())
}
