//! Reflection capability
//!
//! [`TypeIntrospector`] is everything the investigator needs from a host
//! runtime: descriptor lookup, the runtime type of a value, and invocation
//! with optional access-control bypass. A host only has to supply the three
//! lookup methods; invocation and construction are provided on top of the
//! descriptors' native bodies.

use crate::error::{InvestigatorError, InvestigatorResult};
use crate::reflect::{
    signature_of, CallContext, ClassDescriptor, ConstructorInfo, MethodInfo, TypeInfo,
};
use crate::value::{Object, Value};
use crate::ClassId;

/// Access mode for invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Normal access control: only public members
    Public,
    /// Access control bypassed: any member
    Elevated,
}

impl Access {
    fn permits(self, is_public: bool) -> bool {
        is_public || self == Access::Elevated
    }
}

/// Host reflection facility consumed by the investigator
pub trait TypeIntrospector {
    /// The universal root type every class extends implicitly
    fn root_class(&self) -> ClassId;

    /// Descriptor for a class or interface
    fn class(&self, id: ClassId) -> Option<&ClassDescriptor>;

    /// Runtime class of a value (None for null or unknown objects)
    fn class_of(&self, value: &Value) -> Option<ClassId>;

    /// Runtime type of a value, used to match arguments against parameters
    fn type_of(&self, value: &Value) -> TypeInfo {
        match value {
            Value::Null => TypeInfo::Null,
            Value::Bool(_) => TypeInfo::Boolean,
            Value::Int(_) => TypeInfo::Int,
            Value::Long(_) => TypeInfo::Long,
            Value::Double(_) => TypeInfo::Double,
            Value::Str(_) => TypeInfo::Str,
            Value::Object(obj) => {
                let id = obj.class_id();
                match self.class(id) {
                    Some(class) => class.type_info(),
                    None => TypeInfo::class(&format!("#{}", id), id),
                }
            }
        }
    }

    /// Runtime types of an argument list
    fn types_of(&self, args: &[Value]) -> Vec<TypeInfo> {
        args.iter().map(|arg| self.type_of(arg)).collect()
    }

    /// Descriptor lookup that fails with `UnknownType`
    fn require_class(&self, id: ClassId) -> InvestigatorResult<&ClassDescriptor> {
        self.class(id)
            .ok_or_else(|| InvestigatorError::UnknownType(format!("class #{}", id)))
    }

    /// Parent descriptor, or None for the root type and interfaces
    fn parent_of(&self, class: &ClassDescriptor) -> InvestigatorResult<Option<&ClassDescriptor>> {
        class.parent_id.map(|id| self.require_class(id)).transpose()
    }

    /// Invoke a method against a receiver (ignored for static methods)
    fn invoke(
        &self,
        method: &MethodInfo,
        receiver: Option<&Value>,
        args: &[Value],
        access: Access,
    ) -> InvestigatorResult<Value> {
        let owner = self.require_class(method.declaring_class_id)?;
        let member = owner.member_signature(&method.name, &method.parameters);

        if !access.permits(method.modifiers.is_public()) {
            return Err(InvestigatorError::AccessDenied { member });
        }
        let arg_types = self.types_of(args);
        if !method.accepts(&method.name, &arg_types) {
            return Err(InvestigatorError::ArgumentMismatch {
                member,
                supplied: signature_of(&arg_types),
            });
        }

        let receiver = if method.modifiers.is_static {
            None
        } else {
            match receiver {
                Some(value) if !value.is_null() => Some(value),
                _ => return Err(InvestigatorError::MissingInstance { member }),
            }
        };

        match &method.body {
            Some(body) => {
                let ctx = CallContext::new(&member, receiver, args, &owner.layout);
                body.call(&ctx)
                    .map_err(|message| InvestigatorError::Invocation { member: member.clone(), message })
            }
            None if method.modifiers.is_abstract => Err(InvestigatorError::Invocation {
                member,
                message: "abstract method has no body".to_string(),
            }),
            None if method.return_type == TypeInfo::Void => Ok(Value::Null),
            None => Err(InvestigatorError::Invocation {
                member,
                message: "method has no body".to_string(),
            }),
        }
    }

    /// Allocate an instance and run a constructor on it
    fn construct(
        &self,
        constructor: &ConstructorInfo,
        args: &[Value],
        access: Access,
    ) -> InvestigatorResult<Value> {
        let owner = self.require_class(constructor.declaring_class_id)?;
        let member = owner.member_signature("<init>", &constructor.parameters);

        if !owner.is_instantiable() {
            let reason = if owner.is_interface {
                "type is an interface"
            } else {
                "type is abstract"
            };
            return Err(InvestigatorError::CannotInstantiate {
                type_name: owner.simple_name().to_string(),
                reason: reason.to_string(),
            });
        }
        if !access.permits(constructor.modifiers.is_public()) {
            return Err(InvestigatorError::AccessDenied { member });
        }
        let arg_types = self.types_of(args);
        if !constructor.accepts(&arg_types) {
            return Err(InvestigatorError::ArgumentMismatch {
                member,
                supplied: signature_of(&arg_types),
            });
        }

        let instance = Value::Object(Object::new(owner.id, owner.layout.defaults.clone()).into_ref());
        if let Some(body) = &constructor.body {
            let ctx = CallContext::new(&member, Some(&instance), args, &owner.layout);
            body.call(&ctx)
                .map_err(|message| InvestigatorError::Invocation { member: member.clone(), message })?;
        }
        Ok(instance)
    }
}
