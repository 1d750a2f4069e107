//! Static types as seen by the generator.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the universal reference supertype.
pub const OBJECT_TYPE: &str = "Object";

/// A static type: the declared type of a parameter, return value or statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "of")]
pub enum TypeRef {
    Void,
    Bool,
    Int,
    Char,
    Str,
    Array(Box<TypeRef>),
    /// Untyped growable list.
    List,
    /// A named type registered in a catalog (or [`OBJECT_TYPE`]).
    Object(String),
}

impl TypeRef {
    pub fn object(name: impl Into<String>) -> Self {
        TypeRef::Object(name.into())
    }

    pub fn array_of(element: TypeRef) -> Self {
        TypeRef::Array(Box::new(element))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Void)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeRef::Bool | TypeRef::Int | TypeRef::Char)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TypeRef::Array(_))
    }

    /// Reference types may hold `null`.
    pub fn is_reference(&self) -> bool {
        !self.is_void() && !self.is_primitive()
    }

    /// Types a literal can be synthesized for without a constructor.
    pub fn is_literal(&self) -> bool {
        match self {
            TypeRef::Bool | TypeRef::Int | TypeRef::Char | TypeRef::Str | TypeRef::List => true,
            TypeRef::Array(_) => true,
            TypeRef::Void | TypeRef::Object(_) => false,
        }
    }

    /// Name of a catalog type, if this is one.
    pub fn object_name(&self) -> Option<&str> {
        match self {
            TypeRef::Object(name) => Some(name),
            _ => None,
        }
    }

    /// Source-level spelling, e.g. `int[]` or `Counter`.
    pub fn simple_name(&self) -> String {
        match self {
            TypeRef::Void => "void".into(),
            TypeRef::Bool => "boolean".into(),
            TypeRef::Int => "int".into(),
            TypeRef::Char => "char".into(),
            TypeRef::Str => "String".into(),
            TypeRef::Array(inner) => format!("{}[]", inner.simple_name()),
            TypeRef::List => "List".into(),
            TypeRef::Object(name) => name
                .rsplit(|c| c == '.' || c == ':')
                .next()
                .unwrap_or(name)
                .to_string(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Object(name) => f.write_str(name),
            other => f.write_str(&other.simple_name()),
        }
    }
}
