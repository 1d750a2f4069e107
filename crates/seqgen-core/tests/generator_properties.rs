//! Integration tests for the generation loop.
//!
//! These tests drive whole runs over small hand-built catalogs and check
//! the classification guarantees a run must uphold.

use std::any::Any;
use std::collections::HashSet;
use std::thread;
use std::time::Duration;

use proptest::prelude::*;
use seqgen_core::{
    Argument, Generator, GeneratorConfig, Invoker, Rejection, Sequence, StatementKind,
};
use seqgen_types::{
    Fault, OperationDesc, OperationKind, StaticCatalog, TargetObject, TypeBuilder, TypeRef, Value,
    Visibility,
};

#[derive(Debug)]
struct Plain;

impl TargetObject for Plain {
    fn type_name(&self) -> &str {
        "T"
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// An object whose `equals` rejects even itself.
#[derive(Debug)]
struct Mirror;

impl TargetObject for Mirror {
    fn type_name(&self) -> &str {
        "Mirror"
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn equals(&self, _other: &Value) -> Result<bool, Fault> {
        Ok(false)
    }
}

fn arithmetic_catalog() -> StaticCatalog {
    StaticCatalog::builder()
        .add_type(
            TypeBuilder::new("TestClass")
                .static_method("add", vec![TypeRef::Int, TypeRef::Int], TypeRef::Int, |_, a| {
                    Ok(Value::Int(a[0].as_int()?.wrapping_add(a[1].as_int()?)))
                })
                .static_method("divideByZero", vec![TypeRef::Int], TypeRef::Int, |_, a| {
                    a[0].as_int()?
                        .checked_div(0)
                        .map(Value::Int)
                        .ok_or_else(|| Fault::Arithmetic("/ by zero".into()))
                })
                .static_method("repeat", vec![TypeRef::Str, TypeRef::Int], TypeRef::Str, |_, a| {
                    let times = a[1].as_int()?;
                    if times < 0 {
                        return Err(Fault::IllegalArgument(format!("count is negative: {times}")));
                    }
                    Ok(Value::str(a[0].as_str()?.repeat(times.min(8) as usize)))
                }),
        )
        .build()
}

fn constant_catalog() -> StaticCatalog {
    StaticCatalog::builder()
        .add_type(
            TypeBuilder::new("T")
                .constructor(vec![], |_, _| Ok(Value::object(Plain)))
                .method("f", vec![], TypeRef::Str, |_, _| Ok(Value::str("x"))),
        )
        .build()
}

fn mirror_catalog() -> StaticCatalog {
    StaticCatalog::builder()
        .add_type(TypeBuilder::new("Mirror").static_method(
            "make",
            vec![],
            TypeRef::object("Mirror"),
            |_, _| Ok(Value::object(Mirror)),
        ))
        .build()
}

fn node_catalog() -> StaticCatalog {
    StaticCatalog::builder()
        .add_type(
            TypeBuilder::new("Node")
                .constructor(vec![], |_, _| Ok(Value::object(Plain)))
                .static_method("take", vec![TypeRef::object("Node")], TypeRef::Int, |_, _| {
                    Ok(Value::Int(1))
                }),
        )
        .build()
}

/// `User.useHidden` needs a `Hidden`, which only has a private constructor.
fn hidden_catalog() -> StaticCatalog {
    let private_ctor = OperationDesc {
        kind: OperationKind::Constructor,
        name: "Hidden".into(),
        declaring_type: "Hidden".into(),
        params: vec![],
        return_type: TypeRef::object("Hidden"),
        is_static: true,
        visibility: Visibility::Private,
    };
    StaticCatalog::builder()
        .add_type(
            TypeBuilder::new("Hidden").operation(private_ctor, |_, _| Ok(Value::object(Plain))),
        )
        .add_type(
            TypeBuilder::new("User")
                .static_method("useHidden", vec![TypeRef::object("Hidden")], TypeRef::Int, |_, _| {
                    Ok(Value::Int(0))
                })
                .static_method("ping", vec![], TypeRef::Int, |_, _| Ok(Value::Int(7))),
        )
        .build()
}

/// Every `Chain` needs another `Chain` to be built.
fn chain_catalog() -> StaticCatalog {
    StaticCatalog::builder()
        .add_type(
            TypeBuilder::new("Chain")
                .constructor(vec![TypeRef::object("Chain")], |_, _| Ok(Value::object(Plain)))
                .static_method("length", vec![TypeRef::object("Chain")], TypeRef::Int, |_, _| {
                    Ok(Value::Int(1))
                }),
        )
        .build()
}

fn sleepy_catalog() -> StaticCatalog {
    StaticCatalog::builder()
        .add_type(TypeBuilder::new("Sleepy").static_method("nap", vec![], TypeRef::Int, |_, _| {
            thread::sleep(Duration::from_millis(300));
            Ok(Value::Int(0))
        }))
        .build()
}

fn attempts(max: u64, seed: u64) -> GeneratorConfig {
    GeneratorConfig {
        time_limit_ms: 0,
        max_sequences: max,
        seed: Some(seed),
        ..Default::default()
    }
}

fn signatures(seq: &Sequence) -> Vec<String> {
    seq.statements().iter().map(|s| s.signature()).collect()
}

#[test]
fn test_valid_sequences_are_clean_and_distinct() {
    let report = Generator::new(arithmetic_catalog(), &["TestClass"], attempts(200, 3))
        .unwrap()
        .run();
    assert!(!report.valid.is_empty());

    let mut seen = HashSet::new();
    for seq in &report.valid {
        assert!(!seq.threw_exception());
        assert!(seq.violation().is_none());
        assert!(seen.insert(seq.fingerprint()), "duplicate {}", seq.fingerprint());
    }
}

#[test]
fn test_division_by_zero_never_valid() {
    let report = Generator::new(arithmetic_catalog(), &["TestClass"], attempts(120, 5))
        .unwrap()
        .run();
    assert!(report
        .valid
        .iter()
        .all(|s| !s.fingerprint().contains("divideByZero")));
    let raised: Vec<_> = report
        .invalid
        .iter()
        .filter(|s| s.fingerprint().contains("divideByZero"))
        .collect();
    assert!(!raised.is_empty());
    for seq in raised {
        assert!(seq.threw_exception());
        assert_eq!(seq.rejection(), Some(&Rejection::Exception));
    }
}

#[test]
fn test_broken_equals_is_tagged_on_its_statement() {
    let config = GeneratorConfig {
        repeat_probability: 0.0,
        filters: vec!["ExceptionFilter".into(), "NullFilter".into()],
        ..attempts(10, 11)
    };
    let report = Generator::new(mirror_catalog(), &["Mirror"], config)
        .unwrap()
        .run();
    assert!(report.valid.is_empty());
    assert_eq!(report.invalid.len(), 10);
    for seq in &report.invalid {
        assert_eq!(seq.rejection(), Some(&Rejection::ContractViolation));
        assert_eq!(seq.violated_contract(), Some("EqualsReflexive"));
        let offending = seq.violating_statement().unwrap();
        assert_eq!(offending.produced_type(), &TypeRef::object("Mirror"));
        assert_eq!(seq.violation().map(|v| v.statement), Some(seq.len() - 1));
    }
    assert_eq!(report.stats.contract_violations["EqualsReflexive"], 10);
}

#[test]
fn test_equal_observed_values_kept_once() {
    let config = GeneratorConfig {
        repeat_probability: 0.0,
        ..attempts(20, 2)
    };
    let report = Generator::new(constant_catalog(), &["T"], config)
        .unwrap()
        .run();
    let x_valid = report
        .valid
        .iter()
        .filter(|s| matches!(s.last_value(), Some(Value::Str(v)) if v == "x"))
        .count();
    assert_eq!(x_valid, 1);
    assert_eq!(report.valid.len(), 1);
    assert_eq!(
        report.valid[0].fingerprint(),
        "new T(); T.f()",
        "first accepted sequence constructs then calls"
    );
    assert_eq!(report.invalid.len() as u64, report.stats.executed - 1);
}

#[test]
fn test_full_reuse_extends_prior_sequences() {
    let config = GeneratorConfig {
        reuse_probability: 1.0,
        ..attempts(80, 21)
    };
    let report = Generator::new(arithmetic_catalog(), &["TestClass"], config)
        .unwrap()
        .run();
    let first_valid = report.valid.first().map(|s| s.id()).unwrap();

    let later = report
        .valid
        .iter()
        .map(|s| s.as_ref())
        .chain(report.invalid.iter())
        .filter(|s| s.id() > first_valid);
    for seq in later {
        let sigs = signatures(seq);
        let extends_prior = report
            .valid
            .iter()
            .filter(|prior| prior.id() < seq.id())
            .any(|prior| {
                let prefix = signatures(prior);
                sigs.len() > prefix.len() && sigs[..prefix.len()] == prefix[..]
            });
        assert!(extends_prior, "sequence {} does not extend a prior one", seq.id());
    }
}

#[test]
fn test_accepted_sequences_replay() {
    let report = Generator::new(arithmetic_catalog(), &["TestClass"], attempts(100, 8))
        .unwrap()
        .run();
    for seq in &report.valid {
        let mut replay = Sequence::clone(seq);
        assert!(replay.execute(&Invoker::inline()).is_ok());
        let before = seq.last_value().map(|v| v.to_text().unwrap());
        let after = replay.last_value().map(|v| v.to_text().unwrap());
        assert_eq!(before, after);
    }
}

#[test]
fn test_report_counts_add_up() {
    let report = Generator::new(arithmetic_catalog(), &["TestClass"], attempts(150, 4))
        .unwrap()
        .run();
    let stats = &report.stats;
    assert_eq!(stats.attempts, 150);
    assert_eq!(stats.executed as usize, report.valid.len() + report.invalid.len());
    let rejected = stats.exceptions
        + stats.duplicates
        + stats.filter_rejections.values().sum::<u64>()
        + report
            .invalid
            .iter()
            .filter(|s| s.rejection() == Some(&Rejection::ContractViolation))
            .count() as u64;
    assert_eq!(rejected as usize, report.invalid.len());
}

#[test]
fn test_fresh_object_arguments_are_constructed() {
    let config = GeneratorConfig {
        fresh_value_probability: 1.0,
        null_probability: 0.0,
        repeat_probability: 0.3,
        ..attempts(60, 4)
    };
    let report = Generator::new(node_catalog(), &["Node"], config).unwrap().run();
    assert_eq!(report.stats.executed, 60);

    let all = report.valid.iter().map(|s| &**s).chain(report.invalid.iter());
    for seq in all {
        let mut used = HashSet::new();
        for stmt in seq.statements() {
            if stmt.operation().is_some_and(|op| op.desc().name == "take") {
                let Argument::Result(idx) = &stmt.arguments()[0] else {
                    panic!("object argument held as a literal: {}", seq.fingerprint());
                };
                assert!(matches!(
                    seq.statements()[*idx].kind(),
                    StatementKind::ConstructorCall { .. }
                ));
                assert!(used.insert(*idx), "shared argument in {}", seq.fingerprint());
            }
        }
    }
}

#[test]
fn test_missing_constructor_abandons_attempt() {
    let config = GeneratorConfig {
        null_probability: 0.0,
        ..attempts(40, 6)
    };
    let report = Generator::new(hidden_catalog(), &["User"], config).unwrap().run();

    assert_eq!(report.stats.attempts, 40);
    assert!(report.stats.abandoned.get("no_constructor").copied().unwrap_or(0) > 0);
    assert_eq!(
        report.stats.abandoned_total() + report.stats.executed,
        report.stats.attempts
    );
    assert!(report
        .valid
        .iter()
        .any(|seq| seq.fingerprint().ends_with("User.ping()")));
    let all = report.valid.iter().map(|s| &**s).chain(report.invalid.iter());
    for seq in all {
        assert!(!seq.fingerprint().contains("useHidden"));
    }
}

#[test]
fn test_constructor_depth_limit_abandons_attempt() {
    let config = GeneratorConfig {
        null_probability: 0.0,
        max_constructor_depth: 3,
        ..attempts(20, 9)
    };
    let report = Generator::new(chain_catalog(), &["Chain"], config).unwrap().run();

    assert_eq!(report.stats.abandoned.get("depth_exceeded"), Some(&20));
    assert_eq!(report.stats.executed, 0);
    assert!(report.valid.is_empty());
}

#[test]
fn test_slow_call_times_out() {
    let config = GeneratorConfig {
        call_timeout_ms: Some(20),
        repeat_probability: 0.0,
        ..attempts(3, 1)
    };
    let report = Generator::new(sleepy_catalog(), &["Sleepy"], config).unwrap().run();

    assert!(report.valid.is_empty());
    assert_eq!(report.invalid.len(), 3);
    for seq in &report.invalid {
        assert_eq!(seq.rejection(), Some(&Rejection::Exception));
        let failure = seq.failure().unwrap();
        assert_eq!(failure.fault.kind(), "Timeout");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_valid_fingerprints_unique(seed in any::<u64>()) {
        let report = Generator::new(arithmetic_catalog(), &["TestClass"], attempts(40, seed))
            .unwrap()
            .run();
        let mut seen = HashSet::new();
        for seq in &report.valid {
            prop_assert!(seen.insert(seq.fingerprint()));
            prop_assert!(!seq.threw_exception());
            prop_assert!(seq.violation().is_none());
        }
        prop_assert_eq!(report.stats.seed, seed);
    }
}
