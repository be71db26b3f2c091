//! Dynamic values
//!
//! Every argument, result and subject handled by the investigator is a
//! [`Value`]. Class instances live behind an [`ObjectRef`], a shared handle
//! whose field slots are guarded by a lock so native bodies can mutate them
//! through a shared context.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::ClassId;

/// A dynamically typed value
#[derive(Debug, Clone)]
pub enum Value {
    /// The null reference
    Null,
    /// Boolean
    Bool(bool),
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    Long(i64),
    /// 64-bit float
    Double(f64),
    /// Immutable string
    Str(Arc<str>),
    /// Class instance
    Object(ObjectRef),
}

impl Value {
    /// Create a string value
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into())
    }

    /// Check if this is the null reference
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as i32 if this is an `Int`
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as i64 if this is a `Long`
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Long(l) => Some(*l),
            _ => None,
        }
    }

    /// Get as f64 if this is a `Double`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Get as bool if this is a `Bool`
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as str if this is a `Str`
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get the object handle if this is an `Object`
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }
}

/// Objects compare by identity, everything else by value.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Long(l) => write!(f, "{}L", l),
            Value::Double(d) => write!(f, "{}", d),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Object(obj) => write!(f, "<object of class {}>", obj.class_id()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i)
    }
}

impl From<i64> for Value {
    fn from(l: i64) -> Self {
        Value::Long(l)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.into())
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

/// Class instance with field slots
#[derive(Debug, Clone)]
pub struct Object {
    /// Class ID of the instance
    pub class_id: ClassId,
    /// Instance field slots (inherited slots first)
    pub fields: Vec<Value>,
}

impl Object {
    /// Create a new object with the given field slots
    pub fn new(class_id: ClassId, fields: Vec<Value>) -> Self {
        Self { class_id, fields }
    }

    /// Get a field value by slot
    pub fn get_field(&self, index: usize) -> Option<Value> {
        self.fields.get(index).cloned()
    }

    /// Set a field value by slot
    pub fn set_field(&mut self, index: usize, value: Value) -> Result<(), String> {
        if index < self.fields.len() {
            self.fields[index] = value;
            Ok(())
        } else {
            Err(format!(
                "Field index {} out of bounds (object has {} fields)",
                index,
                self.fields.len()
            ))
        }
    }

    /// Get number of field slots
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Move the object behind a shared handle
    pub fn into_ref(self) -> ObjectRef {
        ObjectRef(Arc::new(Mutex::new(self)))
    }
}

/// Shared handle to a heap object
#[derive(Debug, Clone)]
pub struct ObjectRef(Arc<Mutex<Object>>);

impl ObjectRef {
    /// Class ID of the referenced object
    pub fn class_id(&self) -> ClassId {
        self.0.lock().class_id
    }

    /// Read a field slot
    pub fn get_field(&self, index: usize) -> Option<Value> {
        self.0.lock().get_field(index)
    }

    /// Write a field slot
    pub fn set_field(&self, index: usize, value: Value) -> Result<(), String> {
        self.0.lock().set_field(index, value)
    }

    /// Number of field slots
    pub fn field_count(&self) -> usize {
        self.0.lock().field_count()
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_fields() {
        let mut obj = Object::new(3, vec![Value::Int(0), Value::Null]);
        assert_eq!(obj.field_count(), 2);

        obj.set_field(0, Value::Int(7)).unwrap();
        assert_eq!(obj.get_field(0), Some(Value::Int(7)));
        assert!(obj.set_field(5, Value::Null).is_err());
        assert_eq!(obj.get_field(5), None);
    }

    #[test]
    fn test_object_ref_shares_state() {
        let a = Object::new(1, vec![Value::Int(1)]).into_ref();
        let b = a.clone();

        b.set_field(0, Value::Int(42)).unwrap();
        assert_eq!(a.get_field(0), Some(Value::Int(42)));
        assert!(a.ptr_eq(&b));
        assert_eq!(a.class_id(), 1);
    }

    #[test]
    fn test_value_equality() {
        assert_eq!(Value::Int(5), Value::from(5));
        assert_ne!(Value::Int(5), Value::Long(5));
        assert_eq!(Value::from("hi"), Value::string("hi"));

        let a = Object::new(0, vec![]).into_ref();
        let b = Object::new(0, vec![]).into_ref();
        assert_eq!(Value::Object(a.clone()), Value::Object(a));
        assert_ne!(Value::Object(b), Value::Null);
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Int(3).as_i32(), Some(3));
        assert_eq!(Value::Long(3).as_i32(), None);
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert!(Value::Null.is_null());
        assert_eq!(Value::Double(1.5).to_string(), "1.5");
    }
}
