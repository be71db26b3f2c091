//! Reflection model
//!
//! Descriptors for classes and their members, the definitions used to
//! declare new classes, the native bodies that implement methods and
//! constructors, and the permission flags that gate dynamic invocation.
//!
//! ## Member lookup
//!
//! | Lookup                | Scope      | Parameter match          | Visibility  |
//! |-----------------------|------------|--------------------------|-------------|
//! | `public_method`       | class only | runtime argument types   | public only |
//! | `declared_method`     | class only | exact declared signature | any         |
//! | `public_constructors` | class only | caller filters by arity  | public only |
//!
//! The investigator walks `public_method` up the parent chain, since public
//! methods are inherited.

mod introspection;
mod native;
mod permissions;
mod type_builder;

pub use introspection::{
    signature_of, ClassDescriptor, ConstructorInfo, FieldInfo, FieldLayout, MethodInfo, Modifiers,
    TypeInfo, Visibility,
};
pub use native::{CallContext, NativeFn, NativeResult};
pub use permissions::{ClassPermissionRule, PermissionStore, ReflectionPermission};
pub(crate) use permissions::{check_instantiate, check_invoke};
pub use type_builder::{ClassDefinition, ConstructorDefinition, FieldDefinition, MethodDefinition};
