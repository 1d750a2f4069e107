//! Runtime values flowing between statements.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::fault::Fault;
use crate::type_ref::TypeRef;

/// Shared handle to an instance of a target type.
pub type ObjectRef = Arc<dyn TargetObject>;

/// An instance of a catalog type.
///
/// The default `equals`/`hash_code`/`to_text` follow identity semantics;
/// implementors override them the way a class overrides its object methods,
/// including overrides that misbehave (the contract oracle exists to find those).
pub trait TargetObject: Send + Sync + fmt::Debug {
    /// Name of the runtime type, matching the catalog entry.
    fn type_name(&self) -> &str;

    fn as_any(&self) -> &dyn Any;

    fn equals(&self, other: &Value) -> Result<bool, Fault> {
        Ok(match other {
            Value::Object(o) => std::ptr::eq(
                self as *const Self as *const (),
                Arc::as_ptr(o) as *const (),
            ),
            _ => false,
        })
    }

    fn hash_code(&self) -> Result<i64, Fault> {
        Ok(self as *const Self as *const () as usize as i64)
    }

    fn to_text(&self) -> Result<String, Fault> {
        let addr = self as *const Self as *const () as usize;
        Ok(format!("{}@{:x}", self.type_name(), addr))
    }
}

/// A value produced by a statement or captured as a literal.
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i32),
    Char(char),
    Str(String),
    /// Array with its element type.
    Array(TypeRef, Vec<Value>),
    List(Vec<Value>),
    Object(ObjectRef),
}

impl Value {
    pub fn object<T: TargetObject + 'static>(obj: T) -> Self {
        Value::Object(Arc::new(obj))
    }

    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Runtime type of the value; `None` for `null`.
    pub fn runtime_type(&self) -> Option<TypeRef> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(TypeRef::Bool),
            Value::Int(_) => Some(TypeRef::Int),
            Value::Char(_) => Some(TypeRef::Char),
            Value::Str(_) => Some(TypeRef::Str),
            Value::Array(elem, _) => Some(TypeRef::array_of(elem.clone())),
            Value::List(_) => Some(TypeRef::List),
            Value::Object(o) => Some(TypeRef::object(o.type_name())),
        }
    }

    /// Simple name of the runtime type, or `null`.
    pub fn runtime_type_name(&self) -> String {
        self.runtime_type()
            .map(|t| t.simple_name())
            .unwrap_or_else(|| "null".to_string())
    }

    /// Value equality; object values delegate to their own `equals`.
    pub fn equals_value(&self, other: &Value) -> Result<bool, Fault> {
        match (self, other) {
            (Value::Object(o), _) => o.equals(other),
            (Value::Null, Value::Null) => Ok(true),
            (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
            (Value::Int(a), Value::Int(b)) => Ok(a == b),
            (Value::Char(a), Value::Char(b)) => Ok(a == b),
            (Value::Str(a), Value::Str(b)) => Ok(a == b),
            (Value::Array(ta, a), Value::Array(tb, b)) if ta == tb => elements_equal(a, b),
            (Value::List(a), Value::List(b)) => elements_equal(a, b),
            _ => Ok(false),
        }
    }

    pub fn hash_code(&self) -> Result<i64, Fault> {
        match self {
            Value::Null => Ok(0),
            Value::Bool(b) => Ok(if *b { 1231 } else { 1237 }),
            Value::Int(i) => Ok(*i as i64),
            Value::Char(c) => Ok(*c as i64),
            Value::Str(s) => Ok(string_hash(s) as i64),
            Value::Array(_, items) | Value::List(items) => {
                let mut h: i64 = 1;
                for item in items {
                    h = h.wrapping_mul(31).wrapping_add(item.hash_code()?);
                }
                Ok(h)
            }
            Value::Object(o) => o.hash_code(),
        }
    }

    /// Textual representation; object values delegate to their own `to_text`.
    pub fn to_text(&self) -> Result<String, Fault> {
        match self {
            Value::Null => Ok("null".into()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Int(i) => Ok(i.to_string()),
            Value::Char(c) => Ok(c.to_string()),
            Value::Str(s) => Ok(s.clone()),
            Value::Array(_, items) | Value::List(items) => {
                let parts = items
                    .iter()
                    .map(Value::to_text)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(format!("[{}]", parts.join(", ")))
            }
            Value::Object(o) => o.to_text(),
        }
    }

    // ---- Accessors for operation bodies ----

    pub fn as_int(&self) -> Result<i32, Fault> {
        match self {
            Value::Int(i) => Ok(*i),
            other => Err(mismatch("int", other)),
        }
    }

    pub fn as_bool(&self) -> Result<bool, Fault> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(mismatch("boolean", other)),
        }
    }

    /// String contents; `null` dereferences fail.
    pub fn as_str(&self) -> Result<&str, Fault> {
        match self {
            Value::Str(s) => Ok(s),
            Value::Null => Err(Fault::NullDereference("String argument is null".into())),
            other => Err(mismatch("String", other)),
        }
    }

    /// Downcast an object value; `null` dereferences fail.
    pub fn downcast<T: 'static>(&self) -> Result<&T, Fault> {
        match self {
            Value::Object(o) => o
                .as_any()
                .downcast_ref::<T>()
                .ok_or_else(|| mismatch(std::any::type_name::<T>(), self)),
            Value::Null => Err(Fault::NullDereference(format!(
                "{} receiver is null",
                std::any::type_name::<T>()
            ))),
            other => Err(mismatch(std::any::type_name::<T>(), other)),
        }
    }
}

fn elements_equal(a: &[Value], b: &[Value]) -> Result<bool, Fault> {
    if a.len() != b.len() {
        return Ok(false);
    }
    for (x, y) in a.iter().zip(b) {
        if !x.equals_value(y)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// 31-based polynomial hash over UTF-16 code units.
fn string_hash(s: &str) -> i32 {
    s.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as i32))
}

fn mismatch(expected: &str, got: &Value) -> Fault {
    Fault::IllegalArgument(format!(
        "expected {expected}, got {}",
        got.runtime_type_name()
    ))
}
