//! Operation descriptors and the invocation capability behind them.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::fault::Fault;
use crate::type_ref::TypeRef;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Constructor,
    Method,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Protected,
    Package,
    Private,
}

/// Immutable description of a constructor or method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationDesc {
    pub kind: OperationKind,
    /// Method name; constructors carry the declaring type's simple name.
    pub name: String,
    pub declaring_type: String,
    pub params: Vec<TypeRef>,
    pub return_type: TypeRef,
    pub is_static: bool,
    pub visibility: Visibility,
}

impl OperationDesc {
    pub fn is_constructor(&self) -> bool {
        self.kind == OperationKind::Constructor
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Instance methods take a receiver before their parameters.
    pub fn needs_receiver(&self) -> bool {
        self.kind == OperationKind::Method && !self.is_static
    }

    pub fn declaring_type_ref(&self) -> TypeRef {
        TypeRef::object(self.declaring_type.clone())
    }

    fn param_list(&self) -> String {
        self.params
            .iter()
            .map(TypeRef::simple_name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Identity key: declaring type, name and parameter types.
    pub fn key(&self) -> String {
        format!("{}.{}({})", self.declaring_type, self.name, self.param_list())
    }
}

impl fmt::Display for OperationDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            OperationKind::Constructor => {
                write!(f, "new {}({})", self.declaring_type, self.param_list())
            }
            OperationKind::Method => write!(
                f,
                "{}{} {}.{}({})",
                if self.is_static { "static " } else { "" },
                self.return_type.simple_name(),
                self.declaring_type,
                self.name,
                self.param_list()
            ),
        }
    }
}

/// The dynamic-invocation seam: how a constructor or method is actually run.
///
/// `receiver` is `Some` exactly for instance methods. Constructors return the
/// new instance; `void` methods return [`Value::Null`].
pub trait Invoke: Send + Sync {
    fn invoke(&self, receiver: Option<&Value>, args: &[Value]) -> Result<Value, Fault>;
}

impl<F> Invoke for F
where
    F: Fn(Option<&Value>, &[Value]) -> Result<Value, Fault> + Send + Sync,
{
    fn invoke(&self, receiver: Option<&Value>, args: &[Value]) -> Result<Value, Fault> {
        self(receiver, args)
    }
}

/// A descriptor paired with its implementation. Cheap to clone.
#[derive(Clone)]
pub struct Operation {
    desc: Arc<OperationDesc>,
    body: Arc<dyn Invoke>,
}

impl Operation {
    pub fn new<F>(desc: OperationDesc, body: F) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        Self::from_invoke(desc, Arc::new(body))
    }

    /// Wrap an existing [`Invoke`] implementation, e.g. a generated adapter.
    pub fn from_invoke(desc: OperationDesc, body: Arc<dyn Invoke>) -> Self {
        Self {
            desc: Arc::new(desc),
            body,
        }
    }

    pub fn desc(&self) -> &OperationDesc {
        &self.desc
    }

    pub fn invoke(&self, receiver: Option<&Value>, args: &[Value]) -> Result<Value, Fault> {
        self.body.invoke(receiver, args)
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Operation").field(&self.desc.key()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_desc() -> OperationDesc {
        OperationDesc {
            kind: OperationKind::Method,
            name: "add".into(),
            declaring_type: "TestClass".into(),
            params: vec![TypeRef::Int, TypeRef::Int],
            return_type: TypeRef::Int,
            is_static: true,
            visibility: Visibility::Public,
        }
    }

    #[test]
    fn test_key_and_display() {
        let desc = add_desc();
        assert_eq!(desc.key(), "TestClass.add(int, int)");
        assert_eq!(desc.to_string(), "static int TestClass.add(int, int)");
        assert!(!desc.needs_receiver());
    }

    #[test]
    fn test_closure_invoke() {
        let op = Operation::new(add_desc(), |_, args| {
            Ok(Value::Int(args[0].as_int()? + args[1].as_int()?))
        });
        let out = op.invoke(None, &[Value::Int(2), Value::Int(3)]).unwrap();
        assert_eq!(out.as_int().unwrap(), 5);
    }
}
