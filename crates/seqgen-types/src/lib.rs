//! Shared types for the seqgen workspace.
//!
//! This crate provides the vocabulary both the generator engine and the
//! catalog providers speak:
//!
//! - [`TypeRef`] - static types (primitives, `String`, arrays, `List`, catalog types)
//! - [`Value`] / [`TargetObject`] - runtime values and target-type instances
//! - [`Fault`] - errors raised by invoked operations
//! - [`Operation`] / [`OperationDesc`] / [`Invoke`] - callable operations
//! - [`Catalog`] / [`StaticCatalog`] - type-name to operation-list resolution

pub mod catalog;
pub mod fault;
pub mod operation;
pub mod type_ref;
pub mod value;

pub use catalog::{Catalog, CatalogBuilder, StaticCatalog, TypeBuilder, TypeInfo};
pub use fault::Fault;
pub use operation::{Invoke, Operation, OperationDesc, OperationKind, Visibility};
pub use type_ref::{TypeRef, OBJECT_TYPE};
pub use value::{ObjectRef, TargetObject, Value};
