//! Type Investigator
//!
//! Wraps a single subject (a type plus an optional live instance) and answers
//! structural and behavioral queries about it.
//!
//! ## Queries
//!
//! | Query                           | Scope                                   |
//! |---------------------------------|-----------------------------------------|
//! | `method_count`                  | declared on the subject type            |
//! | `constructor_count`             | declared on the subject type            |
//! | `field_count`                   | declared on the subject type            |
//! | `implemented_interfaces`        | declared on the subject type            |
//! | `constant_field_count`          | declared final fields                   |
//! | `static_method_count`           | declared static methods                 |
//! | `is_extending`                  | parent other than the root              |
//! | `parent_simple_name`            | parent other than the root              |
//! | `is_parent_abstract`            | parent other than the root              |
//! | `field_names_in_hierarchy`      | subject and ancestors, root excluded    |
//! | `inheritance_chain`             | subject and ancestors, root excluded    |
//!
//! ## Invocation
//!
//! | Operation                       | Lookup                         | Permission       |
//! |---------------------------------|--------------------------------|------------------|
//! | `invoke_method_returning_int`   | public, inherited, by args     | `INVOKE_PUBLIC`  |
//! | `create_instance`               | public constructors, by arity  | `INSTANTIATE`    |
//! | `elevate_and_invoke`            | declared, any visibility       | `INVOKE_PRIVATE` |
//!
//! ## Concurrency
//!
//! `load` takes `&mut self`, so a load can never overlap a query on the same
//! investigator. Sharing one investigator between threads needs a lock held
//! around each load-and-query sequence; otherwise use one per thread.

use std::collections::{BTreeSet, VecDeque};

use rustc_hash::FxHashSet;

use crate::config::{InvestigatorConfig, NoParentPolicy};
use crate::error::{InvestigatorError, InvestigatorResult};
use crate::introspector::{Access, TypeIntrospector};
use crate::reflect::{
    check_instantiate, check_invoke, signature_of, ClassDescriptor, MethodInfo, PermissionStore,
    TypeInfo,
};
use crate::value::{Object, Value};
use crate::ClassId;

/// The currently loaded entity
#[derive(Debug, Clone)]
struct Subject<'r> {
    class: &'r ClassDescriptor,
    instance: Option<Value>,
}

/// Introspects a single loaded subject and invokes its members
pub struct Investigator<'r, R: TypeIntrospector + ?Sized> {
    introspector: &'r R,
    permissions: PermissionStore,
    no_parent_policy: NoParentPolicy,
    subject: Subject<'r>,
    loaded: bool,
}

impl<'r, R: TypeIntrospector + ?Sized> Investigator<'r, R> {
    /// Create an investigator on the default subject: the root type and a
    /// fresh root instance
    pub fn new(introspector: &'r R) -> InvestigatorResult<Self> {
        Self::with_config(introspector, &InvestigatorConfig::default())
    }

    /// Create an investigator with explicit configuration
    pub fn with_config(introspector: &'r R, config: &InvestigatorConfig) -> InvestigatorResult<Self> {
        let root = introspector.require_class(introspector.root_class())?;
        let instance = Value::Object(Object::new(root.id, root.layout.defaults.clone()).into_ref());
        Ok(Self {
            introspector,
            permissions: config.permission_store()?,
            no_parent_policy: config.investigator.no_parent_policy,
            subject: Subject {
                class: root,
                instance: Some(instance),
            },
            loaded: false,
        })
    }

    /// Create an investigator on a type with no instance. Only static
    /// methods can be invoked on such a subject.
    pub fn for_type(introspector: &'r R, class_id: ClassId) -> InvestigatorResult<Self> {
        let mut investigator = Self::new(introspector)?;
        investigator.subject = Subject {
            class: introspector.require_class(class_id)?,
            instance: None,
        };
        investigator.loaded = true;
        Ok(investigator)
    }

    /// Replace the permission store
    pub fn with_permissions(mut self, permissions: PermissionStore) -> Self {
        self.permissions = permissions;
        self
    }

    /// Mutable access to the permission store
    pub fn permissions_mut(&mut self) -> &mut PermissionStore {
        &mut self.permissions
    }

    /// Load a new subject, discarding the previous one
    pub fn load(&mut self, instance: Value) -> InvestigatorResult<()> {
        if instance.is_null() {
            return Err(InvestigatorError::NullSubject);
        }
        let introspector = self.introspector;
        let class_id = introspector
            .class_of(&instance)
            .ok_or_else(|| InvestigatorError::UnknownType(instance.to_string()))?;
        let class = introspector.require_class(class_id)?;

        tracing::debug!(subject = %class.name, "loaded subject");
        self.subject = Subject {
            class,
            instance: Some(instance),
        };
        self.loaded = true;
        Ok(())
    }

    /// Whether `load` (or `for_type`) has replaced the default subject
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Descriptor of the subject type
    pub fn subject_type(&self) -> &'r ClassDescriptor {
        self.subject.class
    }

    /// The subject instance, if any
    pub fn subject_instance(&self) -> Option<&Value> {
        self.subject.instance.as_ref()
    }

    // ===== Declared members =====

    /// Number of methods declared on the subject type
    pub fn method_count(&self) -> usize {
        self.subject.class.methods.len()
    }

    /// Number of constructors declared on the subject type
    pub fn constructor_count(&self) -> usize {
        self.subject.class.constructors.len()
    }

    /// Number of fields declared on the subject type
    pub fn field_count(&self) -> usize {
        self.subject.class.fields.len()
    }

    /// Simple names of the interfaces declared directly on the subject type
    pub fn implemented_interfaces(&self) -> InvestigatorResult<BTreeSet<String>> {
        self.subject
            .class
            .interfaces
            .iter()
            .map(|id| {
                self.introspector
                    .require_class(*id)
                    .map(|iface| iface.simple_name().to_string())
            })
            .collect()
    }

    /// Number of declared fields marked final
    pub fn constant_field_count(&self) -> usize {
        self.subject
            .class
            .fields
            .iter()
            .filter(|f| f.modifiers.is_final)
            .count()
    }

    /// Number of declared methods marked static
    pub fn static_method_count(&self) -> usize {
        self.subject
            .class
            .methods
            .iter()
            .filter(|m| m.modifiers.is_static)
            .count()
    }

    // ===== Inheritance =====

    fn is_root(&self, class: &ClassDescriptor) -> bool {
        class.id == self.introspector.root_class()
    }

    /// Parent other than the root
    fn true_parent(&self) -> InvestigatorResult<Option<&'r ClassDescriptor>> {
        let introspector = self.introspector;
        let parent = introspector.parent_of(self.subject.class)?;
        Ok(parent.filter(|p| !self.is_root(p)))
    }

    /// Whether the subject type extends something other than the root
    pub fn is_extending(&self) -> bool {
        let root = self.introspector.root_class();
        matches!(self.subject.class.parent_id, Some(parent) if parent != root)
    }

    /// Simple name of the parent type, or None when the subject does not
    /// extend anything but the root
    pub fn parent_simple_name(&self) -> InvestigatorResult<Option<String>> {
        Ok(self
            .true_parent()?
            .map(|parent| parent.simple_name().to_string()))
    }

    /// Whether the parent type is abstract. Without a parent below the root
    /// the configured `NoParentPolicy` decides.
    pub fn is_parent_abstract(&self) -> InvestigatorResult<bool> {
        match self.true_parent()? {
            Some(parent) => Ok(parent.modifiers.is_abstract),
            None => match self.no_parent_policy {
                NoParentPolicy::Error => Err(InvestigatorError::NoParent {
                    type_name: self.subject.class.simple_name().to_string(),
                }),
                NoParentPolicy::False => Ok(false),
            },
        }
    }

    /// The subject type followed by its ancestors, stopping before the root.
    /// A root subject yields just itself.
    fn lineage(&self) -> InvestigatorResult<Vec<&'r ClassDescriptor>> {
        let introspector = self.introspector;
        let mut lineage = vec![self.subject.class];
        let mut visited = FxHashSet::default();
        visited.insert(self.subject.class.id);

        let mut current = self.subject.class;
        while let Some(parent) = introspector.parent_of(current)? {
            if self.is_root(parent) {
                break;
            }
            if !visited.insert(parent.id) {
                return Err(InvestigatorError::UnknownType(format!(
                    "cyclic hierarchy at {}",
                    parent.name
                )));
            }
            lineage.push(parent);
            current = parent;
        }
        Ok(lineage)
    }

    /// Declared field names of the subject type and every ancestor below the
    /// root. Names declared at several levels appear once.
    pub fn field_names_in_hierarchy(&self) -> InvestigatorResult<BTreeSet<String>> {
        Ok(self
            .lineage()?
            .into_iter()
            .filter(|class| !self.is_root(class))
            .flat_map(|class| class.fields.iter().map(|f| f.name.clone()))
            .collect())
    }

    /// Simple names from the topmost ancestor below the root down to the
    /// subject type, joined by `delimiter`
    pub fn inheritance_chain(&self, delimiter: &str) -> InvestigatorResult<String> {
        let lineage = self.lineage()?;
        let names: Vec<&str> = lineage.iter().rev().map(|class| class.simple_name()).collect();
        Ok(names.join(delimiter))
    }

    // ===== Invocation =====

    /// Find a public method accepting the argument types on the subject type,
    /// its ancestors (root included), then default methods of their interfaces.
    /// Two defaults from interfaces where neither extends the other are
    /// ambiguous.
    fn find_public_method(&self, name: &str, arg_types: &[TypeInfo]) -> InvestigatorResult<&'r MethodInfo> {
        let introspector = self.introspector;
        let mut chain = self.lineage()?;
        if let Some(last) = chain.last().copied() {
            if let Some(root) = introspector.parent_of(last)? {
                chain.push(root);
            }
        }

        if let Some(method) = chain.iter().copied().find_map(|class| class.public_method(name, arg_types)) {
            tracing::trace!(method = %method.signature(), owner = method.declaring_class_id, "resolved public method");
            return Ok(method);
        }

        // Interfaces are visited breadth-first in declaration order
        let mut pending: VecDeque<ClassId> =
            chain.iter().flat_map(|c| c.interfaces.iter().copied()).collect();
        let mut seen = FxHashSet::default();
        let mut defaults: Vec<&'r MethodInfo> = Vec::new();
        while let Some(id) = pending.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            let iface = introspector.require_class(id)?;
            if let Some(method) = iface
                .public_method(name, arg_types)
                .filter(|m| m.body.is_some())
            {
                defaults.push(method);
            }
            pending.extend(iface.interfaces.iter().copied());
        }

        // A default redeclared by a sub-interface is hidden by it
        let mut visible = Vec::with_capacity(defaults.len());
        for method in &defaults {
            let mut hidden = false;
            for other in &defaults {
                if other.declaring_class_id != method.declaring_class_id
                    && self.interface_extends(other.declaring_class_id, method.declaring_class_id)?
                {
                    hidden = true;
                    break;
                }
            }
            if !hidden {
                visible.push(*method);
            }
        }

        match visible.as_slice() {
            [] => Err(self.method_not_found(name, arg_types)),
            [method] => {
                tracing::trace!(method = %method.signature(), owner = method.declaring_class_id, "resolved default method");
                Ok(*method)
            }
            competing => {
                let mut candidates = Vec::with_capacity(competing.len());
                for method in competing {
                    candidates.push(self.declared_signature(method)?);
                }
                Err(InvestigatorError::AmbiguousMethod {
                    type_name: self.subject.class.simple_name().to_string(),
                    name: name.to_string(),
                    candidates,
                })
            }
        }
    }

    /// Whether interface `sub` extends interface `sup`, directly or not
    fn interface_extends(&self, sub: ClassId, sup: ClassId) -> InvestigatorResult<bool> {
        let introspector = self.introspector;
        let mut pending = vec![sub];
        let mut seen = FxHashSet::default();
        while let Some(id) = pending.pop() {
            if !seen.insert(id) {
                continue;
            }
            let iface = introspector.require_class(id)?;
            if iface.interfaces.contains(&sup) {
                return Ok(true);
            }
            pending.extend(iface.interfaces.iter().copied());
        }
        Ok(false)
    }

    /// `Owner.name(params)` naming the declaring type
    fn declared_signature(&self, method: &MethodInfo) -> InvestigatorResult<String> {
        let owner = self.introspector.require_class(method.declaring_class_id)?;
        Ok(owner.member_signature(&method.name, &method.parameters))
    }

    fn method_not_found(&self, name: &str, types: &[TypeInfo]) -> InvestigatorError {
        InvestigatorError::MethodNotFound {
            type_name: self.subject.class.simple_name().to_string(),
            name: name.to_string(),
            signature: signature_of(types),
        }
    }

    /// Invoke a public method whose parameters exactly match the runtime
    /// argument types and return its int result
    pub fn invoke_method_returning_int(&self, name: &str, args: &[Value]) -> InvestigatorResult<i32> {
        let class = self.subject.class;
        check_invoke(&self.permissions, &class.name, false)?;

        let arg_types = self.introspector.types_of(args);
        let method = self.find_public_method(name, &arg_types)?;
        let member = self.declared_signature(method)?;
        if method.return_type != TypeInfo::Int {
            return Err(InvestigatorError::ReturnTypeMismatch {
                member,
                expected: TypeInfo::Int,
                found: method.return_type.clone(),
            });
        }

        let result = self
            .introspector
            .invoke(method, self.subject.instance.as_ref(), args, Access::Public)?;
        result
            .as_i32()
            .ok_or_else(|| InvestigatorError::ReturnTypeMismatch {
                member,
                expected: TypeInfo::Int,
                found: self.introspector.type_of(&result),
            })
    }

    /// `invoke_method_returning_int` that logs any failure and answers 0
    pub fn invoke_int_or_zero(&self, name: &str, args: &[Value]) -> i32 {
        match self.invoke_method_returning_int(name, args) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(method = name, error = %e, "invocation failed, returning 0");
                0
            }
        }
    }

    /// Create an instance of the subject type through a public constructor
    /// with `arg_count` parameters.
    ///
    /// Candidates whose parameter types do not match the arguments are
    /// skipped and recorded. The first matching candidate decides the
    /// outcome: a failure inside it is returned as is, with no fallback to
    /// other constructors.
    pub fn create_instance(&self, arg_count: usize, args: &[Value]) -> InvestigatorResult<Value> {
        let class = self.subject.class;
        check_instantiate(&self.permissions, &class.name)?;

        let not_found = |attempts: Vec<String>| InvestigatorError::ConstructorNotFound {
            type_name: class.simple_name().to_string(),
            arity: arg_count,
            attempts,
        };

        if args.len() != arg_count {
            return Err(not_found(vec![format!(
                "{} arguments supplied for arity {}",
                args.len(),
                arg_count
            )]));
        }
        if !class.is_instantiable() {
            return Err(InvestigatorError::CannotInstantiate {
                type_name: class.simple_name().to_string(),
                reason: if class.is_interface {
                    "type is an interface".to_string()
                } else {
                    "type is abstract".to_string()
                },
            });
        }

        let arg_types = self.introspector.types_of(args);
        let mut attempts = Vec::new();
        for ctor in class.public_constructors().filter(|c| c.arity() == arg_count) {
            if !ctor.accepts(&arg_types) {
                attempts.push(format!(
                    "{}: argument types ({}) do not match",
                    class.member_signature("<init>", &ctor.parameters),
                    signature_of(&arg_types)
                ));
                continue;
            }
            tracing::trace!(
                constructor = %class.member_signature("<init>", &ctor.parameters),
                "selected constructor"
            );
            return self.introspector.construct(ctor, args, Access::Public);
        }

        Err(not_found(attempts))
    }

    /// Invoke a method declared on the subject type, whatever its
    /// visibility, with access control bypassed. Returns None for `void`
    /// methods.
    pub fn elevate_and_invoke(
        &self,
        name: &str,
        parameter_types: &[TypeInfo],
        args: &[Value],
    ) -> InvestigatorResult<Option<Value>> {
        let class = self.subject.class;
        check_invoke(&self.permissions, &class.name, true)?;

        let method = class
            .declared_method(name, parameter_types)
            .ok_or_else(|| self.method_not_found(name, parameter_types))?;
        tracing::trace!(method = %method.signature(), visibility = ?method.modifiers.visibility, "elevating");

        let result = self
            .introspector
            .invoke(method, self.subject.instance.as_ref(), args, Access::Elevated)?;
        if method.return_type == TypeInfo::Void {
            Ok(None)
        } else {
            Ok(Some(result))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_registry::{core_class_ids, ClassRegistry};
    use crate::reflect::{ClassDefinition, FieldDefinition, MethodDefinition};

    #[test]
    fn test_default_subject_is_root() {
        let registry = ClassRegistry::new();
        let investigator = Investigator::new(&registry).unwrap();

        assert!(!investigator.is_loaded());
        assert_eq!(investigator.subject_type().id, core_class_ids::OBJECT);
        assert!(investigator.subject_instance().is_some());
        assert!(!investigator.is_extending());
        assert_eq!(investigator.parent_simple_name().unwrap(), None);
        assert_eq!(investigator.inheritance_chain("->").unwrap(), "Object");
        assert!(investigator.field_names_in_hierarchy().unwrap().is_empty());
        assert_eq!(investigator.constructor_count(), 1);
    }

    #[test]
    fn test_load_replaces_subject() {
        let registry = ClassRegistry::new();
        let mut investigator = Investigator::new(&registry).unwrap();

        investigator.load(Value::Int(7)).unwrap();
        assert!(investigator.is_loaded());
        assert_eq!(investigator.subject_type().simple_name(), "Integer");

        investigator.load(Value::from("text")).unwrap();
        assert_eq!(investigator.subject_type().simple_name(), "String");
        assert_eq!(investigator.subject_instance(), Some(&Value::from("text")));
    }

    #[test]
    fn test_load_null_fails() {
        let registry = ClassRegistry::new();
        let mut investigator = Investigator::new(&registry).unwrap();
        assert_eq!(investigator.load(Value::Null), Err(InvestigatorError::NullSubject));
        assert!(!investigator.is_loaded());
    }

    #[test]
    fn test_boxed_integer_structure() {
        let registry = ClassRegistry::new();
        let mut investigator = Investigator::new(&registry).unwrap();
        investigator.load(Value::Int(7)).unwrap();

        assert!(investigator.is_extending());
        assert_eq!(investigator.parent_simple_name().unwrap().as_deref(), Some("Number"));
        assert!(investigator.is_parent_abstract().unwrap());
        assert_eq!(investigator.inheritance_chain(".").unwrap(), "Number.Integer");
        assert_eq!(investigator.constant_field_count(), 1);
        assert_eq!(investigator.static_method_count(), 1);
        assert_eq!(investigator.constructor_count(), 0);

        let ifaces = investigator.implemented_interfaces().unwrap();
        assert_eq!(ifaces.into_iter().collect::<Vec<_>>(), vec!["Comparable"]);

        assert_eq!(investigator.invoke_method_returning_int("intValue", &[]), Ok(7));
        assert_eq!(
            investigator.invoke_method_returning_int("parseInt", &[Value::from("40")]),
            Ok(40)
        );
    }

    #[test]
    fn test_no_parent_policy() {
        let registry = ClassRegistry::new();
        let mut investigator = Investigator::new(&registry).unwrap();
        investigator.load(Value::from("s")).unwrap();

        assert_eq!(
            investigator.is_parent_abstract(),
            Err(InvestigatorError::NoParent {
                type_name: "String".to_string()
            })
        );

        let config = InvestigatorConfig::from_toml_str("[investigator]\nno_parent_policy = \"false\"\n").unwrap();
        let mut lenient = Investigator::with_config(&registry, &config).unwrap();
        lenient.load(Value::from("s")).unwrap();
        assert_eq!(lenient.is_parent_abstract(), Ok(false));
    }

    #[test]
    fn test_for_type_without_instance() {
        let mut registry = ClassRegistry::new();
        let util = registry
            .define_class(
                ClassDefinition::new("util.MathUtil")
                    .field(FieldDefinition::new("PI_TIMES_100", TypeInfo::Int).as_static().as_final())
                    .method(
                        MethodDefinition::new("square", TypeInfo::Int)
                            .param(TypeInfo::Int)
                            .as_static()
                            .body(|ctx| {
                                let x = ctx.int_arg(0)?;
                                Ok(Value::Int(x * x))
                            }),
                    )
                    .method(MethodDefinition::new("instanceOnly", TypeInfo::Int).body(|ctx| {
                        ctx.this()?;
                        Ok(Value::Int(1))
                    })),
            )
            .unwrap();

        let investigator = Investigator::for_type(&registry, util).unwrap();
        assert!(investigator.subject_instance().is_none());
        assert_eq!(investigator.invoke_method_returning_int("square", &[Value::Int(9)]), Ok(81));
        assert!(matches!(
            investigator.invoke_method_returning_int("instanceOnly", &[]),
            Err(InvestigatorError::MissingInstance { .. })
        ));
    }

    #[test]
    fn test_invoke_int_return_type_mismatch() {
        let mut registry = ClassRegistry::new();
        let id = registry
            .define_class(
                ClassDefinition::new("Clock")
                    .method(MethodDefinition::new("millis", TypeInfo::Long).body(|_| Ok(Value::Long(5)))),
            )
            .unwrap();
        let mut investigator = Investigator::new(&registry).unwrap();
        investigator.load(registry.instantiate(id, &[]).unwrap()).unwrap();

        assert_eq!(
            investigator.invoke_method_returning_int("millis", &[]),
            Err(InvestigatorError::ReturnTypeMismatch {
                member: "Clock.millis()".to_string(),
                expected: TypeInfo::Int,
                found: TypeInfo::Long,
            })
        );
        assert_eq!(investigator.invoke_int_or_zero("millis", &[]), 0);
    }
}
