//! Type Investigator
//!
//! Runtime type introspection for values whose types are unknown at compile
//! time. This crate provides:
//! - **Class registry**: a host reflection runtime describing classes,
//!   interfaces, fields, methods and constructors (`class_registry` module)
//! - **Introspector**: the capability trait the investigator consumes
//!   (`introspector` module)
//! - **Investigator**: structural queries and controlled dynamic invocation
//!   against a single loaded subject (`investigator` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use type_investigator::{ClassDefinition, ClassRegistry, Investigator, MethodDefinition, TypeInfo, Value};
//!
//! let mut registry = ClassRegistry::new();
//! let calc = registry.define_class(
//!     ClassDefinition::new("math.Calculator").method(
//!         MethodDefinition::new("add", TypeInfo::Int)
//!             .param(TypeInfo::Int)
//!             .param(TypeInfo::Int)
//!             .body(|ctx| Ok(Value::Int(ctx.int_arg(0)? + ctx.int_arg(1)?))),
//!     ),
//! )?;
//!
//! let instance = registry.instantiate(calc, &[])?;
//! let mut investigator = Investigator::new(&registry)?;
//! investigator.load(instance)?;
//! assert_eq!(investigator.invoke_method_returning_int("add", &[Value::Int(2), Value::Int(3)])?, 5);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// ============================================================================
// Core Modules
// ============================================================================

/// Dynamic values and heap objects
pub mod value;

/// Type descriptors, builders, native bodies and permissions
pub mod reflect;

/// Host reflection runtime
pub mod class_registry;

/// Reflection capability consumed by the investigator
pub mod introspector;

/// The type investigator
pub mod investigator;

/// TOML configuration
pub mod config;

/// Error types
pub mod error;

// ============================================================================
// Re-exports
// ============================================================================

pub use class_registry::{core_class_ids, ClassRegistry};
pub use config::{InvestigatorConfig, NoParentPolicy};
pub use error::{InvestigatorError, InvestigatorResult};
pub use introspector::{Access, TypeIntrospector};
pub use investigator::Investigator;
pub use reflect::{
    CallContext, ClassDefinition, ClassDescriptor, ConstructorDefinition, ConstructorInfo,
    FieldDefinition, FieldInfo, FieldLayout, MethodDefinition, MethodInfo, Modifiers, NativeFn,
    NativeResult, PermissionStore, ReflectionPermission, TypeInfo, Visibility,
};
pub use value::{Object, ObjectRef, Value};

/// Class identifier assigned by the registry
pub type ClassId = usize;
