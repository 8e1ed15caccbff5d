//! Loader error types.

use crate::handle::LoaderIdentity;
use unit_format::UnitError;

/// Errors that can occur while loading, defining or linking a unit.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Name is empty or not a dotted identifier sequence
    #[error("Invalid unit name: '{0}'")]
    InvalidName(String),

    /// No binary for the unit on the search path
    #[error("Unit not found: {0}")]
    NotFound(String),

    /// Reading the unit binary failed
    #[error("I/O failure while reading unit {name}: {source}")]
    Io {
        /// Unit being read
        name: String,
        /// Underlying read failure
        #[source]
        source: std::io::Error,
    },

    /// The binary could not be decoded or failed verification
    #[error("Malformed unit binary for {name}: {source}")]
    Format {
        /// Unit whose binary was rejected
        name: String,
        /// Decode or verification failure
        #[source]
        source: UnitError,
    },

    /// The binary found for a name declares a different name
    #[error("Wrong name: requested {expected}, binary declares {found}")]
    NameMismatch {
        /// Requested name
        expected: String,
        /// Name declared by the binary
        found: String,
    },

    /// A supertype has the wrong kind
    #[error("Incompatible unit change in {name}: {reason}")]
    IncompatibleChange {
        /// Unit being defined
        name: String,
        /// What is wrong with the supertype
        reason: String,
    },

    /// A unit is its own (transitive) supertype
    #[error("Circular supertype chain through {0}")]
    Circularity(String),

    /// The registry already holds a definition of this name
    #[error("{loader} attempted duplicate unit definition for {name}")]
    DuplicateDefinition {
        /// Loader that attempted the redefinition
        loader: LoaderIdentity,
        /// Colliding unit name
        name: String,
    },

    /// Field lookup on a unit that does not declare it
    #[error("No field '{field}' in {owner}")]
    NoSuchField {
        /// Unit that was searched
        owner: String,
        /// Missing field name
        field: String,
    },

    /// Field lookup routed through a loader that did not define the owner
    #[error("{owner} was not defined by {loader}")]
    ForeignUnit {
        /// Unit the field belongs to
        owner: String,
        /// Loader the lookup went through
        loader: LoaderIdentity,
    },
}

impl LoadError {
    /// Whether this is a definition-time (linkage) failure.
    ///
    /// Linkage failures leave the requested unit unusable in the loader that
    /// raised them and are never retried.
    pub fn is_linkage_error(&self) -> bool {
        matches!(
            self,
            LoadError::Format { .. }
                | LoadError::NameMismatch { .. }
                | LoadError::IncompatibleChange { .. }
                | LoadError::Circularity(_)
                | LoadError::DuplicateDefinition { .. }
        )
    }
}

/// Errors raised while reading or validating loader configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read loader config: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse loader config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid loader config: {0}")]
    Invalid(String),
}
