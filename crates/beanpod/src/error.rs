//! Error handling types

use thiserror::Error;

/// Result type alias for container operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the bean repository
#[derive(Error, Debug)]
pub enum Error {
    /// No provider is registered for the requested type, locally or in any
    /// ancestor module
    #[error("no bean registered for type {type_name} in repository [{repository}]")]
    NotFound {
        /// The requested registration type
        type_name: &'static str,
        /// Name of the repository the lookup started from
        repository: String,
    },

    /// The same type key was registered twice, either within one module or
    /// against an ancestor module
    #[error("bean [{type_name}@{module}] already exists in repository [{existing_module}]")]
    Duplicate {
        /// The conflicting registration type
        type_name: &'static str,
        /// Module attempting the new registration
        module: String,
        /// Module that already owns the key
        existing_module: String,
    },

    /// A bean's dependency chain led back to the bean itself
    #[error("circular dependency while resolving {type_name}: {chain}")]
    CircularDependency {
        /// The type whose resolution re-entered itself
        type_name: &'static str,
        /// The in-progress resolution chain, outermost first
        chain: String,
    },

    /// A factory-provided bean was requested during a dry run; the factory's
    /// second construction stage never runs while probing
    #[error("bean {type_name} is not materialised during a dry run")]
    DryRun {
        /// The factory-provided registration type
        type_name: &'static str,
    },

    /// A construction closure failed
    #[error("failed to construct bean: {message}")]
    Construction {
        /// Description of the construction failure
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The stored value for a key did not have the expected concrete type
    #[error("registered bean for {type_name} has an unexpected concrete type")]
    TypeMismatch {
        /// The requested registration type
        type_name: &'static str,
    },

    /// A deferred handle outlived the repository it was created from
    #[error("bean repository has already been dropped")]
    RepositoryGone,
}

impl Error {
    /// Create a not-found error
    pub fn not_found(type_name: &'static str, repository: impl Into<String>) -> Self {
        Self::NotFound {
            type_name,
            repository: repository.into(),
        }
    }

    /// Create a duplicate-registration error
    pub fn duplicate(
        type_name: &'static str,
        module: impl Into<String>,
        existing_module: impl Into<String>,
    ) -> Self {
        Self::Duplicate {
            type_name,
            module: module.into(),
            existing_module: existing_module.into(),
        }
    }

    /// Create a circular-dependency error
    pub fn circular_dependency(type_name: &'static str, chain: impl Into<String>) -> Self {
        Self::CircularDependency {
            type_name,
            chain: chain.into(),
        }
    }

    /// Create a dry-run suppression error
    pub fn dry_run(type_name: &'static str) -> Self {
        Self::DryRun { type_name }
    }

    /// Create a construction error from a message
    pub fn construction(message: impl Into<String>) -> Self {
        Self::Construction {
            message: message.into(),
            source: None,
        }
    }

    /// Create a construction error wrapping a source error
    pub fn construction_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Construction {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a type-mismatch error
    pub fn type_mismatch(type_name: &'static str) -> Self {
        Self::TypeMismatch { type_name }
    }
}
