//! Type Builder
//!
//! Definitions used to declare classes and interfaces on a `ClassRegistry`.
//! A definition is plain data; the registry validates it, assigns the class
//! ID and computes the field layout when it is registered.
//!
//! ```rust,ignore
//! let point = registry.define_class(
//!     ClassDefinition::new("geo.Point")
//!         .field(FieldDefinition::new("x", TypeInfo::Int).as_final())
//!         .constructor(
//!             ConstructorDefinition::new()
//!                 .param(TypeInfo::Int)
//!                 .body(|ctx| ctx.set_field("x", ctx.int_arg(0)?).map(|_| Value::Null)),
//!         ),
//! )?;
//! ```

use super::introspection::{Modifiers, TypeInfo, Visibility};
use super::native::{CallContext, NativeFn, NativeResult};
use crate::value::Value;
use crate::ClassId;

/// Definition for a field
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    /// Field name
    pub name: String,
    /// Type information
    pub type_info: TypeInfo,
    /// Initial value (if any)
    pub initial_value: Option<Value>,
    /// Field modifiers (private by default)
    pub modifiers: Modifiers,
}

impl FieldDefinition {
    /// Create a private instance field
    pub fn new(name: &str, type_info: TypeInfo) -> Self {
        Self {
            name: name.to_string(),
            type_info,
            initial_value: None,
            modifiers: Modifiers {
                visibility: Visibility::Private,
                ..Modifiers::default()
            },
        }
    }

    /// Set the initial value
    pub fn initial_value(mut self, value: impl Into<Value>) -> Self {
        self.initial_value = Some(value.into());
        self
    }

    /// Set the visibility
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.modifiers.visibility = visibility;
        self
    }

    /// Make public
    pub fn public(self) -> Self {
        self.visibility(Visibility::Public)
    }

    /// Mark as static field
    pub fn as_static(mut self) -> Self {
        self.modifiers.is_static = true;
        self
    }

    /// Mark as final
    pub fn as_final(mut self) -> Self {
        self.modifiers.is_final = true;
        self
    }
}

/// Definition for a method
#[derive(Debug, Clone)]
pub struct MethodDefinition {
    /// Method name
    pub name: String,
    /// Return type info
    pub return_type: TypeInfo,
    /// Parameter types
    pub parameters: Vec<TypeInfo>,
    /// Method modifiers (public by default)
    pub modifiers: Modifiers,
    /// Implementation
    pub body: Option<NativeFn>,
}

impl MethodDefinition {
    /// Create a public instance method
    pub fn new(name: &str, return_type: TypeInfo) -> Self {
        Self {
            name: name.to_string(),
            return_type,
            parameters: Vec::new(),
            modifiers: Modifiers::default(),
            body: None,
        }
    }

    /// Add a parameter
    pub fn param(mut self, type_info: TypeInfo) -> Self {
        self.parameters.push(type_info);
        self
    }

    /// Set the implementation
    pub fn body<F>(mut self, f: F) -> Self
    where
        F: Fn(&CallContext<'_>) -> NativeResult + Send + Sync + 'static,
    {
        self.body = Some(NativeFn::new(f));
        self
    }

    /// Set the visibility
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.modifiers.visibility = visibility;
        self
    }

    /// Make private
    pub fn private(self) -> Self {
        self.visibility(Visibility::Private)
    }

    /// Mark as static method
    pub fn as_static(mut self) -> Self {
        self.modifiers.is_static = true;
        self
    }

    /// Mark as final
    pub fn as_final(mut self) -> Self {
        self.modifiers.is_final = true;
        self
    }

    /// Mark as abstract (no body)
    pub fn as_abstract(mut self) -> Self {
        self.modifiers.is_abstract = true;
        self
    }
}

/// Definition for a constructor
#[derive(Debug, Clone, Default)]
pub struct ConstructorDefinition {
    /// Parameter types
    pub parameters: Vec<TypeInfo>,
    /// Constructor modifiers (public by default)
    pub modifiers: Modifiers,
    /// Initializer
    pub body: Option<NativeFn>,
}

impl ConstructorDefinition {
    /// Create a public no-argument constructor
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter
    pub fn param(mut self, type_info: TypeInfo) -> Self {
        self.parameters.push(type_info);
        self
    }

    /// Set the initializer
    pub fn body<F>(mut self, f: F) -> Self
    where
        F: Fn(&CallContext<'_>) -> NativeResult + Send + Sync + 'static,
    {
        self.body = Some(NativeFn::new(f));
        self
    }

    /// Set the visibility
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.modifiers.visibility = visibility;
        self
    }

    /// Make private
    pub fn private(self) -> Self {
        self.visibility(Visibility::Private)
    }
}

/// Complete definition of a class or interface
#[derive(Debug, Clone)]
pub struct ClassDefinition {
    /// Qualified name
    pub name: String,
    /// Parent class (the root type when absent)
    pub parent: Option<ClassId>,
    /// Interfaces implemented (or extended, for interfaces)
    pub interfaces: Vec<ClassId>,
    /// Class modifiers
    pub modifiers: Modifiers,
    /// Declared fields
    pub fields: Vec<FieldDefinition>,
    /// Declared methods
    pub methods: Vec<MethodDefinition>,
    /// Declared constructors
    pub constructors: Vec<ConstructorDefinition>,
}

impl ClassDefinition {
    /// Create a new empty definition
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            interfaces: Vec::new(),
            modifiers: Modifiers::default(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
        }
    }

    /// Set the parent class
    pub fn extends(mut self, parent: ClassId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Add an implemented interface
    pub fn implements(mut self, interface: ClassId) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Mark as abstract
    pub fn as_abstract(mut self) -> Self {
        self.modifiers.is_abstract = true;
        self
    }

    /// Mark as final
    pub fn as_final(mut self) -> Self {
        self.modifiers.is_final = true;
        self
    }

    /// Add a field
    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a method
    pub fn method(mut self, method: MethodDefinition) -> Self {
        self.methods.push(method);
        self
    }

    /// Add a constructor
    pub fn constructor(mut self, constructor: ConstructorDefinition) -> Self {
        self.constructors.push(constructor);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_definition_defaults() {
        let field = FieldDefinition::new("count", TypeInfo::Int);
        assert_eq!(field.modifiers.visibility, Visibility::Private);
        assert!(!field.modifiers.is_final);
        assert!(field.initial_value.is_none());

        let constant = FieldDefinition::new("MAX", TypeInfo::Int)
            .public()
            .as_static()
            .as_final()
            .initial_value(10);
        assert!(constant.modifiers.is_public());
        assert!(constant.modifiers.is_static);
        assert!(constant.modifiers.is_final);
        assert_eq!(constant.initial_value, Some(Value::Int(10)));
    }

    #[test]
    fn test_method_definition_builder() {
        let method = MethodDefinition::new("add", TypeInfo::Int)
            .param(TypeInfo::Int)
            .param(TypeInfo::Int)
            .as_static()
            .body(|ctx| Ok(Value::Int(ctx.int_arg(0)? + ctx.int_arg(1)?)));

        assert_eq!(method.parameters, vec![TypeInfo::Int, TypeInfo::Int]);
        assert!(method.modifiers.is_public());
        assert!(method.modifiers.is_static);
        assert!(method.body.is_some());

        let hidden = MethodDefinition::new("secret", TypeInfo::Str).private();
        assert_eq!(hidden.modifiers.visibility, Visibility::Private);
    }

    #[test]
    fn test_class_definition_builder() {
        let def = ClassDefinition::new("zoo.Dog")
            .extends(4)
            .implements(2)
            .implements(3)
            .as_final()
            .field(FieldDefinition::new("name", TypeInfo::Str))
            .constructor(ConstructorDefinition::new().param(TypeInfo::Str));

        assert_eq!(def.parent, Some(4));
        assert_eq!(def.interfaces, vec![2, 3]);
        assert!(def.modifiers.is_final);
        assert_eq!(def.fields.len(), 1);
        assert_eq!(def.constructors[0].parameters, vec![TypeInfo::Str]);
    }
}
