//! Unit Binary Format
//!
//! This crate provides the linked binary representation of a loadable unit
//! (a named class or interface), together with:
//! - Little-endian writer/reader primitives
//! - Dotted unit names and their resource paths
//! - Structural verification of decoded units

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod encoder;
pub mod name;
pub mod unit;
pub mod verify;

pub use encoder::{DecodeError, UnitReader, UnitWriter};
pub use name::{is_primitive_type, is_valid_unit_name, resource_path, UNIT_EXTENSION};
pub use unit::{flags, FieldDef, UnitBinary, UnitError, UnitKind, MAGIC, VERSION};
pub use verify::{verify_unit, VerifyError};
