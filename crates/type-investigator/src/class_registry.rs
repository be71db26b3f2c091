//! Class registry: the host reflection runtime
//!
//! Owns every class and interface descriptor, assigns class IDs, validates
//! definitions and computes instance field layouts. The registry starts with
//! the core types below and implements [`TypeIntrospector`] over them.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{InvestigatorError, InvestigatorResult};
use crate::introspector::{Access, TypeIntrospector};
use crate::reflect::{
    signature_of, ClassDefinition, ClassDescriptor, ConstructorInfo, FieldDefinition, FieldInfo,
    MethodDefinition, MethodInfo, Modifiers, NativeFn, NativeResult, TypeInfo, Visibility,
};
use crate::value::Value;
use crate::ClassId;

/// Well-known class IDs for core types
pub mod core_class_ids {
    use crate::ClassId;

    /// Object class ID (universal root)
    pub const OBJECT: ClassId = 0;
    /// Comparable interface ID
    pub const COMPARABLE: ClassId = 1;
    /// Number class ID (abstract)
    pub const NUMBER: ClassId = 2;
    /// Boolean class ID (boxes `Value::Bool`)
    pub const BOOLEAN: ClassId = 3;
    /// Integer class ID (boxes `Value::Int`)
    pub const INTEGER: ClassId = 4;
    /// Long class ID (boxes `Value::Long`)
    pub const LONG: ClassId = 5;
    /// Double class ID (boxes `Value::Double`)
    pub const DOUBLE: ClassId = 6;
    /// String class ID (boxes `Value::Str`)
    pub const STRING: ClassId = 7;
}

use core_class_ids::*;

/// Class registry
#[derive(Debug)]
pub struct ClassRegistry {
    /// Classes indexed by ID
    classes: Vec<ClassDescriptor>,
    /// Class name to ID mapping
    name_to_id: FxHashMap<String, ClassId>,
}

impl ClassRegistry {
    /// Create a registry holding the core types
    pub fn new() -> Self {
        let mut registry = Self {
            classes: Vec::new(),
            name_to_id: FxHashMap::default(),
        };
        registry.bootstrap();
        registry
    }

    fn bootstrap(&mut self) {
        let mut object = ClassDescriptor::new(OBJECT, "Object");
        object.constructors.push(implicit_constructor(OBJECT));
        self.insert(object);

        let mut comparable = ClassDescriptor::new(COMPARABLE, "Comparable");
        comparable.is_interface = true;
        comparable.modifiers.is_abstract = true;
        comparable.methods.push(MethodInfo {
            name: "compareTo".to_string(),
            return_type: TypeInfo::Int,
            parameters: vec![TypeInfo::class("Object", OBJECT)],
            declaring_class_id: COMPARABLE,
            modifiers: Modifiers {
                is_abstract: true,
                ..Modifiers::default()
            },
            body: None,
        });
        self.insert(comparable);

        let mut number = ClassDescriptor::new(NUMBER, "Number");
        number.parent_id = Some(OBJECT);
        number.modifiers.is_abstract = true;
        number.constructors.push(implicit_constructor(NUMBER));
        self.insert(number);

        self.insert(boxed_class(BOOLEAN, "Boolean", OBJECT, TypeInfo::Boolean));

        let mut integer = boxed_class(INTEGER, "Integer", NUMBER, TypeInfo::Int);
        integer.methods.push(core_method(
            INTEGER,
            "intValue",
            TypeInfo::Int,
            Vec::new(),
            false,
            NativeFn::new(|ctx| {
                ctx.receiver()
                    .and_then(Value::as_i32)
                    .map(Value::Int)
                    .ok_or_else(|| format!("{}: receiver is not an int", ctx.member()))
            }),
        ));
        integer.methods.push(core_method(
            INTEGER,
            "parseInt",
            TypeInfo::Int,
            vec![TypeInfo::Str],
            true,
            NativeFn::new(|ctx| {
                let text = ctx.str_arg(0)?;
                text.trim()
                    .parse::<i32>()
                    .map(Value::Int)
                    .map_err(|e| format!("For input string {:?}: {}", text, e))
            }),
        ));
        self.insert(integer);

        self.insert(boxed_class(LONG, "Long", NUMBER, TypeInfo::Long));
        self.insert(boxed_class(DOUBLE, "Double", NUMBER, TypeInfo::Double));

        let mut string = boxed_class(STRING, "String", OBJECT, TypeInfo::Str);
        string.methods.push(core_method(
            STRING,
            "length",
            TypeInfo::Int,
            Vec::new(),
            false,
            NativeFn::new(|ctx| {
                let text = ctx
                    .receiver()
                    .and_then(Value::as_str)
                    .ok_or_else(|| format!("{}: receiver is not a String", ctx.member()))?;
                int_length(ctx.member(), text.chars().count())
            }),
        ));
        self.insert(string);
    }

    fn insert(&mut self, class: ClassDescriptor) -> ClassId {
        let id = class.id;
        self.name_to_id.insert(class.name.clone(), id);
        self.classes.push(class);
        id
    }

    /// Validate and register a class
    pub fn define_class(&mut self, def: ClassDefinition) -> InvestigatorResult<ClassId> {
        let class = self.build(def, false)?;
        tracing::debug!(class = %class.name, id = class.id, "registered class");
        Ok(self.insert(class))
    }

    /// Validate and register an interface
    pub fn define_interface(&mut self, def: ClassDefinition) -> InvestigatorResult<ClassId> {
        let class = self.build(def, true)?;
        tracing::debug!(interface = %class.name, id = class.id, "registered interface");
        Ok(self.insert(class))
    }

    fn build(&self, def: ClassDefinition, is_interface: bool) -> InvestigatorResult<ClassDescriptor> {
        let invalid = |reason: String| InvestigatorError::InvalidDefinition {
            type_name: def.name.clone(),
            reason,
        };

        if def.name.is_empty() {
            return Err(invalid("name is empty".to_string()));
        }
        if self.name_to_id.contains_key(&def.name) {
            return Err(invalid("a type with this name is already registered".to_string()));
        }

        let id = self.next_class_id();
        let mut class = ClassDescriptor::new(id, &def.name);
        class.is_interface = is_interface;
        class.modifiers = Modifiers {
            visibility: def.modifiers.visibility,
            is_static: false,
            is_final: def.modifiers.is_final,
            is_abstract: def.modifiers.is_abstract || is_interface,
        };
        if class.modifiers.is_final && class.modifiers.is_abstract {
            return Err(invalid("a type cannot be both final and abstract".to_string()));
        }

        // Parent
        if is_interface {
            if def.parent.is_some() {
                return Err(invalid("an interface cannot extend a class".to_string()));
            }
            if !def.constructors.is_empty() {
                return Err(invalid("an interface cannot declare constructors".to_string()));
            }
        } else {
            let parent_id = def.parent.unwrap_or(OBJECT);
            let parent = self
                .get_class(parent_id)
                .ok_or_else(|| invalid(format!("unknown parent class #{}", parent_id)))?;
            if parent.is_interface {
                return Err(invalid(format!("cannot extend interface {}", parent.name)));
            }
            if parent.modifiers.is_final {
                return Err(invalid(format!("cannot extend final class {}", parent.name)));
            }
            class.parent_id = Some(parent_id);
            class.layout = parent.layout.clone();
        }

        // Interfaces
        let mut seen_interfaces = FxHashSet::default();
        for iface_id in &def.interfaces {
            let iface = self
                .get_class(*iface_id)
                .ok_or_else(|| invalid(format!("unknown interface #{}", iface_id)))?;
            if !iface.is_interface {
                return Err(invalid(format!("{} is not an interface", iface.name)));
            }
            if seen_interfaces.insert(*iface_id) {
                class.interfaces.push(*iface_id);
            }
        }

        // Fields
        for field in def.fields {
            if class.has_field(&field.name) {
                return Err(invalid(format!("duplicate field {}", field.name)));
            }
            let info = field_info(id, field, is_interface);
            if !info.modifiers.is_static {
                let slot = class.layout.defaults.len();
                class.layout.defaults.push(info.initial());
                class.layout.slots.insert(info.name.clone(), slot);
            }
            class.fields.push(info);
        }

        // Methods
        for method in def.methods {
            if class.declared_method(&method.name, &method.parameters).is_some() {
                return Err(invalid(format!(
                    "duplicate method {}({})",
                    method.name,
                    signature_of(&method.parameters)
                )));
            }
            let info = method_info(id, method, is_interface);
            if info.modifiers.is_abstract && !class.modifiers.is_abstract {
                return Err(invalid(format!(
                    "abstract method {} in a concrete class",
                    info.signature()
                )));
            }
            if !info.modifiers.is_abstract && info.body.is_none() && info.return_type != TypeInfo::Void {
                return Err(invalid(format!(
                    "method {} returns {} but has no body",
                    info.signature(),
                    info.return_type
                )));
            }
            class.methods.push(info);
        }

        // Constructors
        for ctor in def.constructors {
            if class.constructors.iter().any(|c| c.parameters == ctor.parameters) {
                return Err(invalid(format!(
                    "duplicate constructor ({})",
                    signature_of(&ctor.parameters)
                )));
            }
            class.constructors.push(ConstructorInfo {
                parameters: ctor.parameters,
                declaring_class_id: id,
                modifiers: ctor.modifiers,
                body: ctor.body,
            });
        }
        if !is_interface && class.constructors.is_empty() {
            class.constructors.push(implicit_constructor(id));
        }

        Ok(class)
    }

    /// Get class by ID
    pub fn get_class(&self, id: ClassId) -> Option<&ClassDescriptor> {
        self.classes.get(id)
    }

    /// Get class by qualified name
    pub fn get_class_by_name(&self, name: &str) -> Option<&ClassDescriptor> {
        self.name_to_id
            .get(name)
            .and_then(|id| self.classes.get(*id))
    }

    /// Get next available class ID
    pub fn next_class_id(&self) -> ClassId {
        self.classes.len()
    }

    /// Iterate over all classes with their IDs
    pub fn iter(&self) -> impl Iterator<Item = (ClassId, &ClassDescriptor)> {
        self.classes.iter().enumerate()
    }

    /// Number of registered types, core types included
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Always false once bootstrapped
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Check if a class is a subclass of another class (or the same class)
    pub fn is_subclass_of(&self, sub_class_id: ClassId, super_class_id: ClassId) -> bool {
        let mut current = Some(sub_class_id);
        while let Some(id) = current {
            if id == super_class_id {
                return true;
            }
            current = self.get_class(id).and_then(|c| c.parent_id);
        }
        false
    }

    /// The class followed by its ancestors, ending at the root
    pub fn hierarchy(&self, class_id: ClassId) -> Vec<&ClassDescriptor> {
        let mut hierarchy = Vec::new();
        let mut current = Some(class_id);
        while let Some(class) = current.and_then(|id| self.get_class(id)) {
            hierarchy.push(class);
            current = class.parent_id;
        }
        hierarchy
    }

    /// Create an instance through the public constructor whose parameters
    /// accept the arguments
    pub fn instantiate(&self, class_id: ClassId, args: &[Value]) -> InvestigatorResult<Value> {
        let class = self.require_class(class_id)?;
        let arg_types = self.types_of(args);
        let ctor = class
            .public_constructors()
            .find(|c| c.accepts(&arg_types))
            .ok_or_else(|| InvestigatorError::ConstructorNotFound {
                type_name: class.simple_name().to_string(),
                arity: args.len(),
                attempts: vec![format!("no public constructor accepts ({})", signature_of(&arg_types))],
            })?;
        self.construct(ctor, args, Access::Public)
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeIntrospector for ClassRegistry {
    fn root_class(&self) -> ClassId {
        OBJECT
    }

    fn class(&self, id: ClassId) -> Option<&ClassDescriptor> {
        self.get_class(id)
    }

    fn class_of(&self, value: &Value) -> Option<ClassId> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(BOOLEAN),
            Value::Int(_) => Some(INTEGER),
            Value::Long(_) => Some(LONG),
            Value::Double(_) => Some(DOUBLE),
            Value::Str(_) => Some(STRING),
            Value::Object(obj) => {
                let id = obj.class_id();
                self.get_class(id).map(|c| c.id)
            }
        }
    }
}

fn int_length(member: &str, len: usize) -> NativeResult {
    i32::try_from(len)
        .map(Value::Int)
        .map_err(|_| format!("{}: length {} exceeds int range", member, len))
}

fn implicit_constructor(class_id: ClassId) -> ConstructorInfo {
    ConstructorInfo {
        parameters: Vec::new(),
        declaring_class_id: class_id,
        modifiers: Modifiers::default(),
        body: None,
    }
}

fn boxed_class(id: ClassId, name: &str, parent: ClassId, value_type: TypeInfo) -> ClassDescriptor {
    let mut class = ClassDescriptor::new(id, name);
    class.parent_id = Some(parent);
    class.modifiers.is_final = true;
    class.interfaces.push(COMPARABLE);
    class.fields.push(FieldInfo {
        name: "value".to_string(),
        type_info: value_type,
        declaring_class_id: id,
        modifiers: Modifiers {
            visibility: Visibility::Private,
            is_final: true,
            ..Modifiers::default()
        },
        initial_value: None,
    });
    class
}

fn core_method(
    class_id: ClassId,
    name: &str,
    return_type: TypeInfo,
    parameters: Vec<TypeInfo>,
    is_static: bool,
    body: NativeFn,
) -> MethodInfo {
    MethodInfo {
        name: name.to_string(),
        return_type,
        parameters,
        declaring_class_id: class_id,
        modifiers: Modifiers {
            is_static,
            is_final: true,
            ..Modifiers::default()
        },
        body: Some(body),
    }
}

fn field_info(class_id: ClassId, field: FieldDefinition, is_interface: bool) -> FieldInfo {
    let mut modifiers = field.modifiers;
    if is_interface {
        modifiers = Modifiers {
            visibility: Visibility::Public,
            is_static: true,
            is_final: true,
            is_abstract: false,
        };
    }
    FieldInfo {
        name: field.name,
        type_info: field.type_info,
        declaring_class_id: class_id,
        modifiers,
        initial_value: field.initial_value,
    }
}

fn method_info(class_id: ClassId, method: MethodDefinition, is_interface: bool) -> MethodInfo {
    let mut modifiers = method.modifiers;
    if is_interface && method.body.is_none() && !modifiers.is_static {
        modifiers.is_abstract = true;
    }
    if modifiers.is_abstract {
        modifiers.is_final = false;
    }
    MethodInfo {
        name: method.name,
        return_type: method.return_type,
        parameters: method.parameters,
        declaring_class_id: class_id,
        modifiers,
        body: if modifiers.is_abstract { None } else { method.body },
    }
}
