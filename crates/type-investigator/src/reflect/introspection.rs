//! Class Introspection
//!
//! Runtime descriptors for classes, interfaces and their declared members.
//! Descriptors are produced by a host (see `ClassRegistry`) and read by the
//! investigator through the `TypeIntrospector` trait.

use std::fmt;

use rustc_hash::FxHashMap;

use super::native::NativeFn;
use crate::value::Value;
use crate::ClassId;

/// Runtime type information for parameters, returns, fields and values
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeInfo {
    /// No value
    Void,
    /// Type of the null reference
    Null,
    /// boolean
    Boolean,
    /// 32-bit int
    Int,
    /// 64-bit long
    Long,
    /// 64-bit double
    Double,
    /// String
    Str,
    /// Class or interface type
    Class {
        /// Class ID
        id: ClassId,
        /// Qualified class name
        name: String,
    },
}

impl TypeInfo {
    /// Create a class type info
    pub fn class(name: &str, id: ClassId) -> Self {
        TypeInfo::Class {
            id,
            name: name.to_string(),
        }
    }

    /// Type name as shown in signatures
    pub fn name(&self) -> &str {
        match self {
            TypeInfo::Void => "void",
            TypeInfo::Null => "null",
            TypeInfo::Boolean => "boolean",
            TypeInfo::Int => "int",
            TypeInfo::Long => "long",
            TypeInfo::Double => "double",
            TypeInfo::Str => "String",
            TypeInfo::Class { name, .. } => name,
        }
    }

    /// Class ID for class types
    pub fn class_id(&self) -> Option<ClassId> {
        match self {
            TypeInfo::Class { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// Zero value a field of this type starts with
    pub fn default_value(&self) -> Value {
        match self {
            TypeInfo::Boolean => Value::Bool(false),
            TypeInfo::Int => Value::Int(0),
            TypeInfo::Long => Value::Long(0),
            TypeInfo::Double => Value::Double(0.0),
            TypeInfo::Void | TypeInfo::Null | TypeInfo::Str | TypeInfo::Class { .. } => Value::Null,
        }
    }

    /// Whether an argument whose runtime type is `actual` binds to a
    /// parameter of this type. Matching is exact: no widening, no subtyping,
    /// and null binds to nothing.
    pub fn accepts(&self, actual: &TypeInfo) -> bool {
        match (self, actual) {
            (TypeInfo::Void, _) | (_, TypeInfo::Null) => false,
            (TypeInfo::Class { id: a, .. }, TypeInfo::Class { id: b, .. }) => a == b,
            _ => self == actual,
        }
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Render a parameter list as `int, String, geo.Point`
pub fn signature_of(types: &[TypeInfo]) -> String {
    types
        .iter()
        .map(|t| t.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Whether a parameter list accepts the given runtime argument types
pub(crate) fn params_accept(params: &[TypeInfo], actual: &[TypeInfo]) -> bool {
    params.len() == actual.len() && params.iter().zip(actual).all(|(p, a)| p.accepts(a))
}

/// Member and class visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Accessible from anywhere
    #[default]
    Public,
    /// Accessible from subclasses
    Protected,
    /// Accessible from the declaring package
    Package,
    /// Accessible from the declaring class
    Private,
}

/// Modifier flags for classes and members
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Declared visibility
    pub visibility: Visibility,
    /// Type-level rather than instance-bound
    pub is_static: bool,
    /// Immutable after construction (fields) or not overridable/extendable
    pub is_final: bool,
    /// Cannot be instantiated (classes) or has no body (methods)
    pub is_abstract: bool,
}

impl Modifiers {
    /// Check for public visibility
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

/// Field information for reflection
#[derive(Debug, Clone)]
pub struct FieldInfo {
    /// Field name
    pub name: String,
    /// Field type info
    pub type_info: TypeInfo,
    /// Declaring class ID
    pub declaring_class_id: ClassId,
    /// Field modifiers
    pub modifiers: Modifiers,
    /// Initial value (type default when absent)
    pub initial_value: Option<Value>,
}

impl FieldInfo {
    /// Value a fresh instance holds in this field
    pub fn initial(&self) -> Value {
        self.initial_value
            .clone()
            .unwrap_or_else(|| self.type_info.default_value())
    }
}

/// Method information for reflection
#[derive(Debug, Clone)]
pub struct MethodInfo {
    /// Method name
    pub name: String,
    /// Return type info
    pub return_type: TypeInfo,
    /// Parameter types
    pub parameters: Vec<TypeInfo>,
    /// Declaring class ID
    pub declaring_class_id: ClassId,
    /// Method modifiers
    pub modifiers: Modifiers,
    /// Implementation (absent for abstract methods)
    pub body: Option<NativeFn>,
}

impl MethodInfo {
    /// Check name and exact parameter types
    pub fn has_signature(&self, name: &str, parameters: &[TypeInfo]) -> bool {
        self.name == name && self.parameters == parameters
    }

    /// Check name and whether runtime argument types bind to the parameters
    pub fn accepts(&self, name: &str, arg_types: &[TypeInfo]) -> bool {
        self.name == name && params_accept(&self.parameters, arg_types)
    }

    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// `name(int, int)`
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, signature_of(&self.parameters))
    }
}

/// Constructor information for reflection
#[derive(Debug, Clone)]
pub struct ConstructorInfo {
    /// Parameter types
    pub parameters: Vec<TypeInfo>,
    /// Declaring class ID
    pub declaring_class_id: ClassId,
    /// Constructor modifiers
    pub modifiers: Modifiers,
    /// Initializer run after field slots are allocated
    pub body: Option<NativeFn>,
}

impl ConstructorInfo {
    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Whether runtime argument types bind to the parameters
    pub fn accepts(&self, arg_types: &[TypeInfo]) -> bool {
        params_accept(&self.parameters, arg_types)
    }
}

/// Instance field layout: slot assignment including inherited fields
#[derive(Debug, Clone, Default)]
pub struct FieldLayout {
    /// Field name to slot, as visible from the class (own fields shadow inherited)
    pub slots: FxHashMap<String, usize>,
    /// Initial slot values for a fresh instance
    pub defaults: Vec<Value>,
}

impl FieldLayout {
    /// Slot of a visible field
    pub fn slot(&self, name: &str) -> Option<usize> {
        self.slots.get(name).copied()
    }

    /// Total number of slots
    pub fn len(&self) -> usize {
        self.defaults.len()
    }

    /// Check if the layout has no slots
    pub fn is_empty(&self) -> bool {
        self.defaults.is_empty()
    }
}

/// Type descriptor for a class or interface
#[derive(Debug, Clone)]
pub struct ClassDescriptor {
    /// Class ID (unique identifier)
    pub id: ClassId,
    /// Qualified name, e.g. `geo.Point` or `geo.Shape$Corner`
    pub name: String,
    /// Parent class ID (None for the root type and interfaces)
    pub parent_id: Option<ClassId>,
    /// Class modifiers
    pub modifiers: Modifiers,
    /// Interface rather than class
    pub is_interface: bool,
    /// Directly declared interfaces
    pub interfaces: Vec<ClassId>,
    /// Declared fields
    pub fields: Vec<FieldInfo>,
    /// Declared methods
    pub methods: Vec<MethodInfo>,
    /// Declared constructors
    pub constructors: Vec<ConstructorInfo>,
    /// Instance field layout
    pub layout: FieldLayout,
}

impl ClassDescriptor {
    /// Create a descriptor with no members
    pub fn new(id: ClassId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            parent_id: None,
            modifiers: Modifiers::default(),
            is_interface: false,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            layout: FieldLayout::default(),
        }
    }

    /// Name without package or enclosing classes
    pub fn simple_name(&self) -> &str {
        self.name
            .rsplit(|c: char| c == '.' || c == '$')
            .next()
            .unwrap_or(&self.name)
    }

    /// Package part of the qualified name
    pub fn package(&self) -> Option<&str> {
        self.name.rfind('.').map(|idx| &self.name[..idx])
    }

    /// Type info referring to this class
    pub fn type_info(&self) -> TypeInfo {
        TypeInfo::class(&self.name, self.id)
    }

    /// Declared method by exact signature, any visibility
    pub fn declared_method(&self, name: &str, parameters: &[TypeInfo]) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| m.has_signature(name, parameters))
    }

    /// Declared public method whose parameters accept the argument types
    pub fn public_method(&self, name: &str, arg_types: &[TypeInfo]) -> Option<&MethodInfo> {
        self.methods
            .iter()
            .find(|m| m.modifiers.is_public() && m.accepts(name, arg_types))
    }

    /// Public constructors
    pub fn public_constructors(&self) -> impl Iterator<Item = &ConstructorInfo> {
        self.constructors.iter().filter(|c| c.modifiers.is_public())
    }

    /// Check if a field with this name is declared on the class
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Whether instances can be created directly
    pub fn is_instantiable(&self) -> bool {
        !self.is_interface && !self.modifiers.is_abstract
    }

    /// `Simple.member(params)` for error messages
    pub fn member_signature(&self, member: &str, parameters: &[TypeInfo]) -> String {
        format!("{}.{}({})", self.simple_name(), member, signature_of(parameters))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_info_names() {
        assert_eq!(TypeInfo::Int.name(), "int");
        assert_eq!(TypeInfo::Str.to_string(), "String");
        assert_eq!(TypeInfo::class("geo.Point", 7).name(), "geo.Point");
        assert_eq!(TypeInfo::class("geo.Point", 7).class_id(), Some(7));
        assert_eq!(TypeInfo::Void.name(), "void");
        assert_eq!(TypeInfo::Null.to_string(), "null");
    }

    #[test]
    fn test_accepts_is_exact() {
        assert!(TypeInfo::Int.accepts(&TypeInfo::Int));
        assert!(!TypeInfo::Long.accepts(&TypeInfo::Int));
        assert!(!TypeInfo::Str.accepts(&TypeInfo::Null));
        assert!(!TypeInfo::class("A", 1).accepts(&TypeInfo::Null));
        assert!(TypeInfo::class("A", 1).accepts(&TypeInfo::class("A", 1)));
        assert!(!TypeInfo::class("A", 1).accepts(&TypeInfo::class("B", 2)));
        assert!(!TypeInfo::Void.accepts(&TypeInfo::Void));
    }

    #[test]
    fn test_default_values() {
        assert_eq!(TypeInfo::Int.default_value(), Value::Int(0));
        assert_eq!(TypeInfo::Boolean.default_value(), Value::Bool(false));
        assert_eq!(TypeInfo::Str.default_value(), Value::Null);
    }

    #[test]
    fn test_simple_name_and_package() {
        let cls = ClassDescriptor::new(3, "com.shapes.Circle");
        assert_eq!(cls.simple_name(), "Circle");
        assert_eq!(cls.package(), Some("com.shapes"));

        let nested = ClassDescriptor::new(4, "com.shapes.Polygon$Vertex");
        assert_eq!(nested.simple_name(), "Vertex");

        let bare = ClassDescriptor::new(5, "Object");
        assert_eq!(bare.simple_name(), "Object");
        assert_eq!(bare.package(), None);
    }

    #[test]
    fn test_signature_rendering() {
        assert_eq!(signature_of(&[]), "");
        assert_eq!(
            signature_of(&[TypeInfo::Int, TypeInfo::Str, TypeInfo::class("geo.Point", 2)]),
            "int, String, geo.Point"
        );
        let cls = ClassDescriptor::new(1, "math.Calculator");
        assert_eq!(
            cls.member_signature("add", &[TypeInfo::Int, TypeInfo::Int]),
            "Calculator.add(int, int)"
        );
    }

    #[test]
    fn test_modifiers_default() {
        let mods = Modifiers::default();
        assert!(mods.is_public());
        assert!(!mods.is_static);
        assert!(!mods.is_final);
        assert!(!mods.is_abstract);
    }
}
