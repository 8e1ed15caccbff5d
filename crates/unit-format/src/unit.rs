//! Unit binary format

use crate::encoder::{DecodeError, UnitReader, UnitWriter};
use crate::verify::VerifyError;
use thiserror::Error;

/// Magic number for unit binaries: "UNIT"
pub const MAGIC: [u8; 4] = *b"UNIT";

/// Current unit format version
pub const VERSION: u32 = 1;

/// Header size: magic (4) + version (4) + flags (4) + checksum (4)
const HEADER_SIZE: usize = 16;

/// Unit encoding/decoding errors
#[derive(Debug, Error)]
pub enum UnitError {
    /// Decode error
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Invalid magic number
    #[error("Invalid magic number: expected UNIT, got {0:?}")]
    InvalidMagic([u8; 4]),

    /// Unsupported version
    #[error("Unsupported version: {0} (current: {VERSION})")]
    UnsupportedVersion(u32),

    /// Checksum mismatch
    #[error("Checksum mismatch: expected {expected:#x}, got {actual:#x}")]
    ChecksumMismatch {
        /// Checksum stored in the header
        expected: u32,
        /// Checksum computed over the body
        actual: u32,
    },

    /// Unknown unit kind tag
    #[error("Invalid unit kind: {0}")]
    InvalidKind(u8),

    /// Supertype presence byte other than 0 or 1
    #[error("Invalid supertype marker: {0}")]
    InvalidSuperMarker(u8),

    /// Bytes left over after the field table
    #[error("{0} trailing bytes after unit body")]
    TrailingBytes(usize),

    /// Structural verification failed
    #[error("Verification failed: {0}")]
    Verify(#[from] VerifyError),
}

/// Unit flags
pub mod flags {
    /// Unit cannot be extended
    pub const FINAL: u32 = 1 << 0;
    /// Unit cannot be instantiated directly
    pub const ABSTRACT: u32 = 1 << 1;
}

/// Whether a unit is a class or an interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// Concrete or abstract class
    Class,
    /// Interface
    Interface,
}

impl UnitKind {
    fn to_u8(self) -> u8 {
        match self {
            UnitKind::Class => 0,
            UnitKind::Interface => 1,
        }
    }

    fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(UnitKind::Class),
            1 => Some(UnitKind::Interface),
            _ => None,
        }
    }
}

/// Declared field: a name and the name of its type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Primitive keyword or unit name
    pub type_name: String,
}

/// A decoded unit binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitBinary {
    /// Magic number (must be "UNIT")
    pub magic: [u8; 4],
    /// Format version
    pub version: u32,
    /// Unit flags
    pub flags: u32,
    /// Class or interface
    pub kind: UnitKind,
    /// Fully-qualified unit name
    pub name: String,
    /// Supertype name (classes only)
    pub super_name: Option<String>,
    /// Directly implemented (or extended, for interfaces) interface names
    pub interfaces: Vec<String>,
    /// Declared fields
    pub fields: Vec<FieldDef>,
}

impl UnitBinary {
    /// Create an empty class unit
    pub fn new_class(name: impl Into<String>) -> Self {
        Self::new(name.into(), UnitKind::Class)
    }

    /// Create an empty interface unit
    pub fn new_interface(name: impl Into<String>) -> Self {
        Self::new(name.into(), UnitKind::Interface)
    }

    fn new(name: String, kind: UnitKind) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            flags: 0,
            kind,
            name,
            super_name: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Set the supertype
    pub fn extends(mut self, super_name: impl Into<String>) -> Self {
        self.super_name = Some(super_name.into());
        self
    }

    /// Append a directly implemented interface
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// Append a declared field
    pub fn field(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            type_name: type_name.into(),
        });
        self
    }

    /// Set flags
    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    /// Whether this unit is an interface
    pub fn is_interface(&self) -> bool {
        self.kind == UnitKind::Interface
    }

    /// Encode the unit to binary format
    ///
    /// Format:
    /// - Header: magic (4 bytes) + version (u32) + flags (u32) + checksum (u32)
    /// - Kind (u8), name
    /// - Supertype: present (u8) + name
    /// - Interface table: count (u32) + names
    /// - Field table: count (u32) + (name, type name) pairs
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = UnitWriter::new();

        writer.emit_bytes(&self.magic);
        writer.emit_u32(self.version);
        writer.emit_u32(self.flags);
        let checksum_offset = writer.reserve_u32();

        writer.emit_u8(self.kind.to_u8());
        writer.emit_string(&self.name);

        match &self.super_name {
            Some(super_name) => {
                writer.emit_u8(1);
                writer.emit_string(super_name);
            }
            None => writer.emit_u8(0),
        }

        writer.emit_u32(self.interfaces.len() as u32);
        for interface in &self.interfaces {
            writer.emit_string(interface);
        }

        writer.emit_u32(self.fields.len() as u32);
        for field in &self.fields {
            writer.emit_string(&field.name);
            writer.emit_string(&field.type_name);
        }

        // CRC32 of everything after the header
        let checksum = crc32fast::hash(&writer.buffer()[HEADER_SIZE..]);
        writer.patch_u32(checksum_offset, checksum);

        writer.into_bytes()
    }

    /// Decode a unit from binary format
    pub fn decode(data: &[u8]) -> Result<Self, UnitError> {
        let mut reader = UnitReader::new(data);

        let magic = reader.read_array::<4>()?;
        if magic != MAGIC {
            return Err(UnitError::InvalidMagic(magic));
        }

        let version = reader.read_u32()?;
        if version != VERSION {
            return Err(UnitError::UnsupportedVersion(version));
        }

        let flags = reader.read_u32()?;
        let stored_checksum = reader.read_u32()?;

        let calculated_checksum = crc32fast::hash(&data[HEADER_SIZE..]);
        if stored_checksum != calculated_checksum {
            return Err(UnitError::ChecksumMismatch {
                expected: stored_checksum,
                actual: calculated_checksum,
            });
        }

        let tag = reader.read_u8()?;
        let kind = UnitKind::from_u8(tag).ok_or(UnitError::InvalidKind(tag))?;
        let name = reader.read_string()?;

        let super_name = match reader.read_u8()? {
            0 => None,
            1 => Some(reader.read_string()?),
            marker => return Err(UnitError::InvalidSuperMarker(marker)),
        };

        let interface_count = reader.read_u32()? as usize;
        let mut interfaces = Vec::with_capacity(interface_count.min(reader.remaining()));
        for _ in 0..interface_count {
            interfaces.push(reader.read_string()?);
        }

        let field_count = reader.read_u32()? as usize;
        let mut fields = Vec::with_capacity(field_count.min(reader.remaining()));
        for _ in 0..field_count {
            let name = reader.read_string()?;
            let type_name = reader.read_string()?;
            fields.push(FieldDef { name, type_name });
        }

        if reader.remaining() > 0 {
            return Err(UnitError::TrailingBytes(reader.remaining()));
        }

        Ok(Self {
            magic,
            version,
            flags,
            kind,
            name,
            super_name,
            interfaces,
            fields,
        })
    }
}
