//! Investigator error types

use thiserror::Error;

use crate::reflect::{ReflectionPermission, TypeInfo};

/// Errors raised by the investigator, the registry and configuration loading
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvestigatorError {
    /// No method matches the name and parameter signature
    #[error("No method {name}({signature}) found on {type_name}")]
    MethodNotFound {
        /// Simple name of the searched type
        type_name: String,
        /// Requested method name
        name: String,
        /// Requested parameter types, comma separated
        signature: String,
    },

    /// Several unrelated interfaces supply a default for the same method
    #[error("Method {name} on {type_name} is ambiguous between {}", .candidates.join(" and "))]
    AmbiguousMethod {
        /// Simple name of the searched type
        type_name: String,
        /// Requested method name
        name: String,
        /// Signatures of the competing defaults
        candidates: Vec<String>,
    },

    /// No constructor of the requested arity could be invoked
    #[error("No constructor of arity {arity} could be invoked on {type_name}{}", format_attempts(.attempts))]
    ConstructorNotFound {
        /// Simple name of the type
        type_name: String,
        /// Requested arity
        arity: usize,
        /// One entry per rejected candidate
        attempts: Vec<String>,
    },

    /// The invoked member itself failed
    #[error("{member} failed: {message}")]
    Invocation {
        /// Member signature, e.g. `Calculator.add(int, int)`
        member: String,
        /// Failure reported by the member body
        message: String,
    },

    /// The subject has no parent beyond the universal root
    #[error("{type_name} has no parent beyond the root type")]
    NoParent {
        /// Simple name of the subject type
        type_name: String,
    },

    /// A non-public member was invoked without elevated access
    #[error("{member} is not accessible without elevation")]
    AccessDenied {
        /// Member signature
        member: String,
    },

    /// The reflection permission policy refused the operation
    #[error("Reflection permission {required} denied on {type_name}")]
    PermissionDenied {
        /// Qualified name of the subject type
        type_name: String,
        /// Permission the operation needed
        required: ReflectionPermission,
    },

    /// The member does not return the expected type
    #[error("{member} returns {found}, expected {expected}")]
    ReturnTypeMismatch {
        /// Member signature
        member: String,
        /// Expected return type
        expected: TypeInfo,
        /// Declared return type
        found: TypeInfo,
    },

    /// Arguments do not fit the member's parameter list
    #[error("{member} cannot accept ({supplied})")]
    ArgumentMismatch {
        /// Member signature
        member: String,
        /// Runtime types of the supplied arguments
        supplied: String,
    },

    /// Abstract classes and interfaces cannot be instantiated
    #[error("Cannot instantiate {type_name}: {reason}")]
    CannotInstantiate {
        /// Simple name of the type
        type_name: String,
        /// Why instantiation is impossible
        reason: String,
    },

    /// An instance member was invoked on a subject without an instance
    #[error("{member} needs an instance but the subject has none")]
    MissingInstance {
        /// Member signature
        member: String,
    },

    /// `load` was called with null
    #[error("Cannot load a null subject")]
    NullSubject,

    /// The introspector does not know the type
    #[error("Unknown type: {0}")]
    UnknownType(String),

    /// A class or interface definition was rejected by the registry
    #[error("Invalid definition of {type_name}: {reason}")]
    InvalidDefinition {
        /// Qualified name from the definition
        type_name: String,
        /// What was wrong with it
        reason: String,
    },

    /// Permissions for the class were sealed
    #[error("Cannot modify sealed permissions of {0}")]
    SealedPermissions(String),

    /// Configuration could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),
}

fn format_attempts(attempts: &[String]) -> String {
    if attempts.is_empty() {
        String::new()
    } else {
        format!(" (tried: {})", attempts.join("; "))
    }
}

/// Investigator result type
pub type InvestigatorResult<T> = Result<T, InvestigatorError>;
