//! Statements: the atomic typed computations a sequence is made of.
//!
//! A statement is a constant assignment, a constructor call or a method call.
//! Call arguments are [`Argument`]s that either carry a literal or point back
//! at an earlier statement of the same sequence by index, in the same way a
//! transaction command refers to `Result(i)` of a previous command. Values
//! are read at execution time, so a statement always sees the *current*
//! result of the statement it references.

use seqgen_types::{Fault, Operation, OperationDesc, TypeRef, Value};

use crate::invoker::Invoker;
use crate::render::java_literal;

/// Reference to an argument value.
#[derive(Debug, Clone)]
pub enum Argument {
    /// Value captured when the argument was built.
    Literal(Value),
    /// The current result of the statement at this index in the owning sequence.
    Result(usize),
}

impl Argument {
    /// Resolve against the statements that precede the consumer.
    pub fn resolve(&self, prior: &[Statement]) -> Result<Value, Fault> {
        match self {
            Argument::Literal(value) => Ok(value.clone()),
            Argument::Result(idx) => prior
                .get(*idx)
                .and_then(Statement::result)
                .cloned()
                .ok_or_else(|| {
                    Fault::IllegalState(format!("statement {idx} has not produced a value"))
                }),
        }
    }

    fn shifted(&self, offset: usize) -> Argument {
        match self {
            Argument::Literal(value) => Argument::Literal(value.clone()),
            Argument::Result(idx) => Argument::Result(idx + offset),
        }
    }

    fn render(&self, prior: &[Statement]) -> String {
        match self {
            Argument::Literal(value) => java_literal(value),
            Argument::Result(idx) => prior
                .get(*idx)
                .map(|s| s.display_name(*idx))
                .unwrap_or_else(|| format!("v{idx}")),
        }
    }
}

/// The closed set of statement variants.
#[derive(Debug, Clone)]
pub enum StatementKind {
    Constant { value: Value, ty: TypeRef },
    ConstructorCall { op: Operation, args: Vec<Argument> },
    /// For instance methods the first argument is the receiver.
    MethodCall { op: Operation, args: Vec<Argument> },
}

#[derive(Debug, Clone)]
enum Outcome {
    Returned(Value),
    Raised(Fault),
}

/// A call as it actually happened: the values it saw and what came back.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub op: &'a OperationDesc,
    /// Receiver (for instance methods) followed by the parameter values.
    pub args: &'a [Value],
    pub returned: Option<&'a Value>,
    pub fault: Option<&'a Fault>,
}

#[derive(Debug, Clone)]
pub struct Statement {
    kind: StatementKind,
    outcome: Option<Outcome>,
    observed_args: Vec<Value>,
    name: Option<String>,
}

impl Statement {
    pub fn constant(value: Value, ty: TypeRef) -> Self {
        Self::from_kind(StatementKind::Constant { value, ty })
    }

    pub fn constructor_call(op: Operation, args: Vec<Argument>) -> Self {
        Self::from_kind(StatementKind::ConstructorCall { op, args })
    }

    pub fn method_call(op: Operation, args: Vec<Argument>) -> Self {
        Self::from_kind(StatementKind::MethodCall { op, args })
    }

    fn from_kind(kind: StatementKind) -> Self {
        Self {
            kind,
            outcome: None,
            observed_args: Vec::new(),
            name: None,
        }
    }

    pub fn kind(&self) -> &StatementKind {
        &self.kind
    }

    pub fn operation(&self) -> Option<&Operation> {
        match &self.kind {
            StatementKind::Constant { .. } => None,
            StatementKind::ConstructorCall { op, .. } | StatementKind::MethodCall { op, .. } => {
                Some(op)
            }
        }
    }

    pub fn arguments(&self) -> &[Argument] {
        match &self.kind {
            StatementKind::Constant { .. } => &[],
            StatementKind::ConstructorCall { args, .. } | StatementKind::MethodCall { args, .. } => {
                args
            }
        }
    }

    /// Static type of the produced value (`void` for void methods).
    pub fn produced_type(&self) -> &TypeRef {
        match &self.kind {
            StatementKind::Constant { ty, .. } => ty,
            StatementKind::ConstructorCall { op, .. } | StatementKind::MethodCall { op, .. } => {
                &op.desc().return_type
            }
        }
    }

    pub fn is_void(&self) -> bool {
        self.produced_type().is_void()
    }

    /// Raw result slot: `None` before execution or after a raise.
    /// Void methods leave [`Value::Null`] here.
    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            Some(Outcome::Returned(value)) => Some(value),
            _ => None,
        }
    }

    /// The produced value, if this statement produces one.
    pub fn value(&self) -> Option<&Value> {
        if self.is_void() {
            None
        } else {
            self.result()
        }
    }

    pub fn fault(&self) -> Option<&Fault> {
        match &self.outcome {
            Some(Outcome::Raised(fault)) => Some(fault),
            _ => None,
        }
    }

    pub fn is_executed(&self) -> bool {
        self.outcome.is_some()
    }

    /// The invocation record of an executed call statement.
    pub fn invocation(&self) -> Option<Invocation<'_>> {
        let op = self.operation()?;
        let outcome = self.outcome.as_ref()?;
        Some(Invocation {
            op: op.desc(),
            args: &self.observed_args,
            returned: match outcome {
                Outcome::Returned(value) => Some(value),
                Outcome::Raised(_) => None,
            },
            fault: match outcome {
                Outcome::Returned(_) => None,
                Outcome::Raised(fault) => Some(fault),
            },
        })
    }

    /// Run the statement. `prior` are the statements before it in its sequence.
    pub fn execute(&mut self, prior: &[Statement], invoker: &Invoker) -> Result<(), Fault> {
        self.observed_args.clear();
        match self.run(prior, invoker) {
            Ok(value) => {
                self.outcome = Some(Outcome::Returned(value));
                Ok(())
            }
            Err(fault) => {
                self.outcome = Some(Outcome::Raised(fault.clone()));
                Err(fault)
            }
        }
    }

    fn run(&mut self, prior: &[Statement], invoker: &Invoker) -> Result<Value, Fault> {
        let (op, args) = match &self.kind {
            StatementKind::Constant { value, .. } => return Ok(value.clone()),
            StatementKind::ConstructorCall { op, args } | StatementKind::MethodCall { op, args } => {
                (op, args)
            }
        };
        self.observed_args = resolve_all(args, prior)?;
        let values = &self.observed_args;
        if !op.desc().needs_receiver() {
            return invoker.call(op, None, values);
        }
        match values.split_first() {
            Some((Value::Null, _)) => Err(Fault::NullDereference(format!(
                "{} invoked on a null receiver",
                op.desc().key()
            ))),
            Some((receiver, rest)) => invoker.call(op, Some(receiver), rest),
            None => Err(Fault::IllegalState(format!(
                "{} is missing its receiver",
                op.desc().key()
            ))),
        }
    }

    /// Structural signature: operation identity and static types only,
    /// never argument values.
    pub fn signature(&self) -> String {
        match &self.kind {
            StatementKind::Constant { value, .. } => {
                format!("const({})", value.runtime_type_name())
            }
            StatementKind::ConstructorCall { op, .. } => op.desc().to_string(),
            StatementKind::MethodCall { op, .. } => op.desc().key(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    pub(crate) fn display_name(&self, index: usize) -> String {
        self.name.clone().unwrap_or_else(|| format!("v{index}"))
    }

    /// Source text for this statement, without the trailing `;`.
    pub fn render(&self, prior: &[Statement]) -> String {
        let index = prior.len();
        let declare = |expr: String| {
            if self.is_void() {
                expr
            } else {
                format!(
                    "{} {} = {}",
                    self.produced_type().simple_name(),
                    self.display_name(index),
                    expr
                )
            }
        };
        match &self.kind {
            StatementKind::Constant { value, .. } => declare(java_literal(value)),
            StatementKind::ConstructorCall { op, args } => declare(format!(
                "new {}({})",
                op.desc().declaring_type_ref().simple_name(),
                render_args(args, prior)
            )),
            StatementKind::MethodCall { op, args } => {
                let desc = op.desc();
                let (target, params) = if desc.needs_receiver() {
                    match args.split_first() {
                        Some((receiver, rest)) => (receiver.render(prior), rest),
                        None => (String::from("this"), &args[..]),
                    }
                } else {
                    (desc.declaring_type_ref().simple_name(), &args[..])
                };
                declare(format!(
                    "{}.{}({})",
                    target,
                    desc.name,
                    render_args(params, prior)
                ))
            }
        }
    }

    pub(crate) fn reset(&mut self) {
        self.outcome = None;
        self.observed_args.clear();
    }

    /// Copy for appending at `offset` in another sequence: back-references
    /// are shifted, execution state and display name are dropped.
    pub(crate) fn relocated(&self, offset: usize) -> Statement {
        let kind = match &self.kind {
            StatementKind::Constant { value, ty } => StatementKind::Constant {
                value: value.clone(),
                ty: ty.clone(),
            },
            StatementKind::ConstructorCall { op, args } => StatementKind::ConstructorCall {
                op: op.clone(),
                args: args.iter().map(|a| a.shifted(offset)).collect(),
            },
            StatementKind::MethodCall { op, args } => StatementKind::MethodCall {
                op: op.clone(),
                args: args.iter().map(|a| a.shifted(offset)).collect(),
            },
        };
        Self::from_kind(kind)
    }
}

fn resolve_all(args: &[Argument], prior: &[Statement]) -> Result<Vec<Value>, Fault> {
    args.iter().map(|arg| arg.resolve(prior)).collect()
}

fn render_args(args: &[Argument], prior: &[Statement]) -> String {
    args.iter()
        .map(|arg| arg.render(prior))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqgen_types::{OperationKind, Visibility};

    fn static_op(name: &str, params: Vec<TypeRef>, ret: TypeRef) -> OperationDesc {
        OperationDesc {
            kind: OperationKind::Method,
            name: name.into(),
            declaring_type: "TestClass".into(),
            params,
            return_type: ret,
            is_static: true,
            visibility: Visibility::Public,
        }
    }

    fn divide() -> Operation {
        Operation::new(
            static_op("divide", vec![TypeRef::Int, TypeRef::Int], TypeRef::Int),
            |_, args| {
                let (a, b) = (args[0].as_int()?, args[1].as_int()?);
                a.checked_div(b)
                    .map(Value::Int)
                    .ok_or_else(|| Fault::Arithmetic("/ by zero".into()))
            },
        )
    }

    #[test]
    fn test_constant_has_value_before_and_after_execute() {
        let mut stmt = Statement::constant(Value::Int(7), TypeRef::Int);
        assert!(stmt.value().is_none());
        stmt.execute(&[], &Invoker::inline()).unwrap();
        assert_eq!(stmt.value().unwrap().as_int().unwrap(), 7);
        assert_eq!(stmt.signature(), "const(int)");
    }

    #[test]
    fn test_null_constant_signature() {
        let stmt = Statement::constant(Value::Null, TypeRef::Str);
        assert_eq!(stmt.signature(), "const(null)");
    }

    #[test]
    fn test_method_call_reads_back_references() {
        let invoker = Invoker::inline();
        let mut a = Statement::constant(Value::Int(10), TypeRef::Int);
        let mut b = Statement::constant(Value::Int(2), TypeRef::Int);
        a.execute(&[], &invoker).unwrap();
        b.execute(&[], &invoker).unwrap();
        let prior = vec![a, b];
        let mut call = Statement::method_call(
            divide(),
            vec![Argument::Result(0), Argument::Result(1)],
        );
        call.execute(&prior, &invoker).unwrap();
        assert_eq!(call.value().unwrap().as_int().unwrap(), 5);
        let inv = call.invocation().unwrap();
        assert_eq!(inv.args.len(), 2);
        assert!(inv.fault.is_none());
    }

    #[test]
    fn test_raising_call_records_fault() {
        let invoker = Invoker::inline();
        let mut call = Statement::method_call(
            divide(),
            vec![Argument::Literal(Value::Int(1)), Argument::Literal(Value::Int(0))],
        );
        let err = call.execute(&[], &invoker).unwrap_err();
        assert!(matches!(err, Fault::Arithmetic(_)));
        assert!(call.value().is_none());
        assert!(call.invocation().unwrap().fault.is_some());
    }

    #[test]
    fn test_signature_ignores_argument_values() {
        let one = Statement::method_call(
            divide(),
            vec![Argument::Literal(Value::Int(1)), Argument::Literal(Value::Int(2))],
        );
        let other = Statement::method_call(
            divide(),
            vec![Argument::Literal(Value::Int(9)), Argument::Result(0)],
        );
        assert_eq!(one.signature(), other.signature());
        assert_eq!(one.signature(), "TestClass.divide(int, int)");
    }

    #[test]
    fn test_render_static_call() {
        let mut a = Statement::constant(Value::Int(4), TypeRef::Int);
        a.set_name("int0".into());
        let mut call = Statement::method_call(
            divide(),
            vec![Argument::Result(0), Argument::Literal(Value::Int(2))],
        );
        call.set_name("int1".into());
        assert_eq!(a.render(&[]), "int int0 = 4");
        assert_eq!(
            call.render(std::slice::from_ref(&a)),
            "int int1 = TestClass.divide(int0, 2)"
        );
    }

    #[test]
    fn test_relocated_shifts_references() {
        let call = Statement::method_call(
            divide(),
            vec![Argument::Result(0), Argument::Literal(Value::Int(2))],
        );
        let moved = call.relocated(3);
        assert!(matches!(moved.arguments()[0], Argument::Result(3)));
        assert!(matches!(moved.arguments()[1], Argument::Literal(Value::Int(2))));
        assert!(!moved.is_executed());
    }
}
