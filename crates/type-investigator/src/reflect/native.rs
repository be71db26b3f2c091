//! Native member bodies
//!
//! Methods and constructors are implemented by Rust closures. The host hands
//! each call a [`CallContext`] with the receiver, the arguments and the field
//! layout of the declaring class, so a body can read and write fields by name.

use std::fmt;
use std::sync::Arc;

use super::introspection::FieldLayout;
use crate::value::{ObjectRef, Value};

/// Result of a native body. `Err` carries the failure message the body raised.
pub type NativeResult = Result<Value, String>;

type NativeHandler = dyn Fn(&CallContext<'_>) -> NativeResult + Send + Sync;

/// Shared, clonable native body
#[derive(Clone)]
pub struct NativeFn(Arc<NativeHandler>);

impl NativeFn {
    /// Wrap a closure
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&CallContext<'_>) -> NativeResult + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Run the body
    pub fn call(&self, ctx: &CallContext<'_>) -> NativeResult {
        (self.0)(ctx)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NativeFn")
    }
}

/// Per-call view passed to a native body
pub struct CallContext<'a> {
    member: &'a str,
    receiver: Option<&'a Value>,
    args: &'a [Value],
    layout: &'a FieldLayout,
}

impl<'a> CallContext<'a> {
    /// Create a context for one call
    pub fn new(
        member: &'a str,
        receiver: Option<&'a Value>,
        args: &'a [Value],
        layout: &'a FieldLayout,
    ) -> Self {
        Self {
            member,
            receiver,
            args,
            layout,
        }
    }

    /// Signature of the member being run
    pub fn member(&self) -> &str {
        self.member
    }

    /// All arguments
    pub fn args(&self) -> &[Value] {
        self.args
    }

    /// Argument by position
    pub fn arg(&self, index: usize) -> Result<&Value, String> {
        self.args
            .get(index)
            .ok_or_else(|| format!("{}: missing argument {}", self.member, index))
    }

    /// Argument as int
    pub fn int_arg(&self, index: usize) -> Result<i32, String> {
        self.arg(index)?
            .as_i32()
            .ok_or_else(|| self.type_error(index, "int"))
    }

    /// Argument as long
    pub fn long_arg(&self, index: usize) -> Result<i64, String> {
        self.arg(index)?
            .as_i64()
            .ok_or_else(|| self.type_error(index, "long"))
    }

    /// Argument as double
    pub fn double_arg(&self, index: usize) -> Result<f64, String> {
        self.arg(index)?
            .as_f64()
            .ok_or_else(|| self.type_error(index, "double"))
    }

    /// Argument as boolean
    pub fn bool_arg(&self, index: usize) -> Result<bool, String> {
        self.arg(index)?
            .as_bool()
            .ok_or_else(|| self.type_error(index, "boolean"))
    }

    /// Argument as string
    pub fn str_arg(&self, index: usize) -> Result<&str, String> {
        self.arg(index)?
            .as_str()
            .ok_or_else(|| self.type_error(index, "String"))
    }

    /// The raw receiver (absent for static members)
    pub fn receiver(&self) -> Option<&Value> {
        self.receiver
    }

    /// The receiving object (`this`)
    pub fn this(&self) -> Result<&ObjectRef, String> {
        self.receiver
            .and_then(Value::as_object)
            .ok_or_else(|| format!("{}: no receiver object", self.member))
    }

    /// Read an instance field visible from the declaring class
    pub fn field(&self, name: &str) -> Result<Value, String> {
        let slot = self.slot(name)?;
        self.this()?
            .get_field(slot)
            .ok_or_else(|| format!("{}: receiver has no slot for field {}", self.member, name))
    }

    /// Write an instance field visible from the declaring class
    pub fn set_field(&self, name: &str, value: impl Into<Value>) -> Result<(), String> {
        let slot = self.slot(name)?;
        self.this()?.set_field(slot, value.into())
    }

    fn slot(&self, name: &str) -> Result<usize, String> {
        self.layout
            .slot(name)
            .ok_or_else(|| format!("{}: unknown field {}", self.member, name))
    }

    fn type_error(&self, index: usize, expected: &str) -> String {
        format!("{}: argument {} is not {}", self.member, index, expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Object;

    fn layout_xy() -> FieldLayout {
        let mut layout = FieldLayout::default();
        layout.slots.insert("x".to_string(), 0);
        layout.slots.insert("y".to_string(), 1);
        layout.defaults = vec![Value::Int(0), Value::Int(0)];
        layout
    }

    #[test]
    fn test_typed_arguments() {
        let layout = FieldLayout::default();
        let args = [Value::Int(2), Value::from("two"), Value::Bool(true)];
        let ctx = CallContext::new("f", None, &args, &layout);

        assert_eq!(ctx.int_arg(0), Ok(2));
        assert_eq!(ctx.str_arg(1), Ok("two"));
        assert_eq!(ctx.bool_arg(2), Ok(true));
        assert!(ctx.long_arg(0).unwrap_err().contains("argument 0 is not long"));
        assert!(ctx.arg(3).unwrap_err().contains("missing argument 3"));
    }

    #[test]
    fn test_field_access_by_name() {
        let layout = layout_xy();
        let receiver = Value::Object(Object::new(1, layout.defaults.clone()).into_ref());
        let ctx = CallContext::new("move", Some(&receiver), &[], &layout);

        ctx.set_field("y", 9).unwrap();
        assert_eq!(ctx.field("y"), Ok(Value::Int(9)));
        assert_eq!(ctx.field("x"), Ok(Value::Int(0)));
        assert!(ctx.field("z").unwrap_err().contains("unknown field z"));
    }

    #[test]
    fn test_static_context_has_no_receiver() {
        let layout = layout_xy();
        let ctx = CallContext::new("util", None, &[], &layout);
        assert!(ctx.this().is_err());
        assert!(ctx.field("x").is_err());
    }

    #[test]
    fn test_native_fn_call() {
        let body = NativeFn::new(|ctx| Ok(Value::Int(ctx.int_arg(0)? * 2)));
        let layout = FieldLayout::default();
        let args = [Value::Int(21)];
        let ctx = CallContext::new("double", None, &args, &layout);
        assert_eq!(body.call(&ctx), Ok(Value::Int(42)));
        assert_eq!(format!("{:?}", body), "NativeFn");
    }
}
