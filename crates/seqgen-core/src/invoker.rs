//! Invocation of target operations, with panic capture and an optional
//! per-call time budget.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use seqgen_types::{Fault, Operation, Value};
use tracing::warn;

/// Fault kind reported for a panicking operation.
pub const PANIC_FAULT_KIND: &str = "Panic";

#[derive(Debug, Clone, Copy, Default)]
pub struct Invoker {
    timeout: Option<Duration>,
}

impl Invoker {
    /// Calls run on the generating thread.
    pub fn inline() -> Self {
        Self { timeout: None }
    }

    /// Calls run on a helper thread and are abandoned once `timeout` elapses.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn call(
        &self,
        op: &Operation,
        receiver: Option<&Value>,
        args: &[Value],
    ) -> Result<Value, Fault> {
        match self.timeout {
            None => guarded(op, receiver, args),
            Some(budget) => call_with_budget(op, receiver, args, budget),
        }
    }
}

fn guarded(op: &Operation, receiver: Option<&Value>, args: &[Value]) -> Result<Value, Fault> {
    catch_unwind(AssertUnwindSafe(|| op.invoke(receiver, args)))
        .unwrap_or_else(|payload| Err(panic_fault(payload)))
}

fn call_with_budget(
    op: &Operation,
    receiver: Option<&Value>,
    args: &[Value],
    budget: Duration,
) -> Result<Value, Fault> {
    let (tx, rx) = mpsc::channel();
    let op = op.clone();
    let receiver = receiver.cloned();
    let args = args.to_vec();
    let spawned = thread::Builder::new()
        .name("seqgen-call".into())
        .spawn(move || {
            // The receiver may already be gone after a timeout.
            let _ = tx.send(guarded(&op, receiver.as_ref(), &args));
        });
    if let Err(e) = spawned {
        return Err(Fault::raised("SpawnFailure", e.to_string()));
    }
    match rx.recv_timeout(budget) {
        Ok(outcome) => outcome,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            warn!(?budget, "operation exceeded its call budget; detaching");
            Err(Fault::Timeout(budget))
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(Fault::raised(
            PANIC_FAULT_KIND,
            "call thread exited without a result",
        )),
    }
}

fn panic_fault(payload: Box<dyn Any + Send>) -> Fault {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    Fault::raised(PANIC_FAULT_KIND, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqgen_types::{OperationDesc, OperationKind, TypeRef, Visibility};

    fn op(name: &str, body: fn(&[Value]) -> Result<Value, Fault>) -> Operation {
        let desc = OperationDesc {
            kind: OperationKind::Method,
            name: name.into(),
            declaring_type: "T".into(),
            params: vec![],
            return_type: TypeRef::Int,
            is_static: true,
            visibility: Visibility::Public,
        };
        Operation::new(desc, move |_, args| body(args))
    }

    #[test]
    fn test_inline_call() {
        let answer = op("answer", |_| Ok(Value::Int(42)));
        let out = Invoker::inline().call(&answer, None, &[]).unwrap();
        assert_eq!(out.as_int().unwrap(), 42);
    }

    #[test]
    fn test_panic_becomes_fault() {
        let boom = op("boom", |_| panic!("kaboom"));
        let err = Invoker::inline().call(&boom, None, &[]).unwrap_err();
        assert_eq!(err.kind(), PANIC_FAULT_KIND);
        assert!(err.to_string().contains("kaboom"));
    }

    #[test]
    fn test_timeout_is_reported() {
        let slow = op("slow", |_| {
            thread::sleep(Duration::from_millis(500));
            Ok(Value::Null)
        });
        let err = Invoker::with_timeout(Duration::from_millis(20))
            .call(&slow, None, &[])
            .unwrap_err();
        assert!(matches!(err, Fault::Timeout(_)));
    }

    #[test]
    fn test_budgeted_call_returns_value() {
        let quick = op("quick", |_| Ok(Value::Int(1)));
        let out = Invoker::with_timeout(Duration::from_secs(5))
            .call(&quick, None, &[])
            .unwrap();
        assert_eq!(out.as_int().unwrap(), 1);
    }
}
