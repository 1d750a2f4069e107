//! Operation catalogs: what the introspection side hands to the generator.
//!
//! A [`Catalog`] resolves type names into [`TypeInfo`] (constructors, methods,
//! supertypes, finality) and answers assignability questions. The
//! [`StaticCatalog`] registry is filled through [`TypeBuilder`]s, either by
//! hand or by generated adapter code.

use std::collections::{BTreeMap, BTreeSet};

use crate::fault::Fault;
use crate::operation::{Operation, OperationDesc, OperationKind, Visibility};
use crate::type_ref::{TypeRef, OBJECT_TYPE};
use crate::value::Value;

/// Everything known about one target type.
#[derive(Debug, Clone)]
pub struct TypeInfo {
    pub name: String,
    /// Direct supertypes (classes or interfaces).
    pub supertypes: Vec<String>,
    pub is_final: bool,
    pub is_abstract: bool,
    pub constructors: Vec<Operation>,
    pub methods: Vec<Operation>,
}

impl TypeInfo {
    pub fn type_ref(&self) -> TypeRef {
        TypeRef::object(self.name.clone())
    }

    pub fn public_constructors(&self) -> impl Iterator<Item = &Operation> {
        self.constructors.iter().filter(|op| op.desc().is_public())
    }

    pub fn public_methods(&self) -> impl Iterator<Item = &Operation> {
        self.methods.iter().filter(|op| op.desc().is_public())
    }
}

pub trait Catalog {
    fn type_info(&self, name: &str) -> Option<&TypeInfo>;

    /// All registered type names, in a stable order.
    fn type_names(&self) -> Vec<String>;

    /// Reflexive, transitive subtype check over declared supertypes.
    fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        if sub == sup || sup == OBJECT_TYPE {
            return true;
        }
        let mut stack = vec![sub.to_string()];
        let mut visited = BTreeSet::new();
        while let Some(current) = stack.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            if let Some(info) = self.type_info(&current) {
                for parent in &info.supertypes {
                    if parent == sup {
                        return true;
                    }
                    stack.push(parent.clone());
                }
            }
        }
        false
    }

    /// Whether a value of static type `source` may be used where `target`
    /// is expected.
    fn is_assignable(&self, target: &TypeRef, source: &TypeRef) -> bool {
        if target == source {
            return true;
        }
        match (target, source) {
            (TypeRef::Object(t), s) if t == OBJECT_TYPE => s.is_reference(),
            (TypeRef::Object(t), TypeRef::Object(s)) => self.is_subtype(s, t),
            _ => false,
        }
    }

    /// Whether a subtype could stand in for `ty`: not primitive, not an
    /// array, and not effectively final.
    fn permits_substitution(&self, ty: &TypeRef) -> bool {
        match ty {
            TypeRef::Object(name) if name == OBJECT_TYPE => true,
            TypeRef::Object(name) => self.type_info(name).map_or(true, |info| !info.is_final),
            TypeRef::List => true,
            TypeRef::Str | TypeRef::Array(_) => false,
            TypeRef::Void | TypeRef::Bool | TypeRef::Int | TypeRef::Char => false,
        }
    }
}

/// In-memory catalog keyed by type name.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    types: BTreeMap<String, TypeInfo>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    pub fn insert(&mut self, info: TypeInfo) {
        self.types.insert(info.name.clone(), info);
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Catalog for StaticCatalog {
    fn type_info(&self, name: &str) -> Option<&TypeInfo> {
        self.types.get(name)
    }

    fn type_names(&self) -> Vec<String> {
        self.types.keys().cloned().collect()
    }
}

#[derive(Default)]
pub struct CatalogBuilder {
    catalog: StaticCatalog,
}

impl CatalogBuilder {
    pub fn add_type(mut self, ty: TypeBuilder) -> Self {
        self.catalog.insert(ty.build());
        self
    }

    pub fn build(self) -> StaticCatalog {
        self.catalog
    }
}

/// Fluent construction of a [`TypeInfo`].
pub struct TypeBuilder {
    info: TypeInfo,
}

impl TypeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: TypeInfo {
                name: name.into(),
                supertypes: Vec::new(),
                is_final: false,
                is_abstract: false,
                constructors: Vec::new(),
                methods: Vec::new(),
            },
        }
    }

    pub fn supertype(mut self, name: impl Into<String>) -> Self {
        self.info.supertypes.push(name.into());
        self
    }

    pub fn final_type(mut self) -> Self {
        self.info.is_final = true;
        self
    }

    pub fn abstract_type(mut self) -> Self {
        self.info.is_abstract = true;
        self
    }

    pub fn constructor<F>(self, params: Vec<TypeRef>, body: F) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        let desc = OperationDesc {
            kind: OperationKind::Constructor,
            name: TypeRef::object(self.info.name.clone()).simple_name(),
            declaring_type: self.info.name.clone(),
            params,
            return_type: self.info.type_ref(),
            is_static: true,
            visibility: Visibility::Public,
        };
        self.operation(desc, body)
    }

    pub fn method<F>(self, name: &str, params: Vec<TypeRef>, returns: TypeRef, body: F) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        let desc = self.method_desc(name, params, returns, false);
        self.operation(desc, body)
    }

    pub fn static_method<F>(
        self,
        name: &str,
        params: Vec<TypeRef>,
        returns: TypeRef,
        body: F,
    ) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        let desc = self.method_desc(name, params, returns, true);
        self.operation(desc, body)
    }

    /// Register an operation with a fully specified descriptor.
    pub fn operation<F>(mut self, desc: OperationDesc, body: F) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        let op = Operation::new(desc, body);
        match op.desc().kind {
            OperationKind::Constructor => self.info.constructors.push(op),
            OperationKind::Method => self.info.methods.push(op),
        }
        self
    }

    fn method_desc(
        &self,
        name: &str,
        params: Vec<TypeRef>,
        returns: TypeRef,
        is_static: bool,
    ) -> OperationDesc {
        OperationDesc {
            kind: OperationKind::Method,
            name: name.to_string(),
            declaring_type: self.info.name.clone(),
            params,
            return_type: returns,
            is_static,
            visibility: Visibility::Public,
        }
    }

    pub fn build(self) -> TypeInfo {
        self.info
    }
}
