//! Built-in demo catalog.
//!
//! `TestClass` mirrors a small arithmetic/string utility class. The other
//! types exercise receivers, subtyping and every built-in contract:
//!
//! - `Counter`: mutable state behind a lock, value equality
//! - `Shape` (abstract) with final subtypes `Circle` and `Square`
//! - `Mirror`: `equals` rejects itself
//! - `Opaque`: `toString` raises
//! - `Inventory`: null dereference on a missing key, assertion on bad input

use std::any::Any;
use std::collections::BTreeMap;

use parking_lot::Mutex;
use seqgen_types::{Fault, StaticCatalog, TargetObject, TypeBuilder, TypeRef, Value};

/// Targets used when none are given.
pub const DEFAULT_TARGETS: [&str; 1] = ["TestClass"];

pub fn demo_catalog() -> StaticCatalog {
    StaticCatalog::builder()
        .add_type(test_class())
        .add_type(counter())
        .add_type(shape())
        .add_type(circle())
        .add_type(square())
        .add_type(mirror())
        .add_type(opaque())
        .add_type(inventory())
        .build()
}

// ---- TestClass ----

#[derive(Debug)]
pub struct TestClass;

impl TargetObject for TestClass {
    fn type_name(&self) -> &str {
        "TestClass"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn test_class() -> TypeBuilder {
    TypeBuilder::new("TestClass")
        .constructor(vec![], |_, _| Ok(Value::object(TestClass)))
        .static_method("add", vec![TypeRef::Int, TypeRef::Int], TypeRef::Int, |_, a| {
            Ok(Value::Int(a[0].as_int()?.wrapping_add(a[1].as_int()?)))
        })
        .static_method("repeat", vec![TypeRef::Str, TypeRef::Int], TypeRef::Str, |_, a| {
            let s = a[0].as_str()?;
            let times = a[1].as_int()?;
            let times = usize::try_from(times)
                .map_err(|_| Fault::IllegalArgument(format!("count is negative: {times}")))?;
            Ok(Value::str(s.repeat(times)))
        })
        .static_method("divide", vec![TypeRef::Int, TypeRef::Int], TypeRef::Int, |_, a| {
            divide(a[0].as_int()?, a[1].as_int()?)
        })
        .static_method("returnNull", vec![], TypeRef::object("Object"), |_, _| {
            Ok(Value::Null)
        })
        .static_method("echo", vec![TypeRef::Str], TypeRef::Str, |_, a| Ok(a[0].clone()))
        .static_method("echoHello", vec![], TypeRef::Str, |_, _| Ok(Value::str("hello")))
        .static_method("divideByZero", vec![], TypeRef::Int, |_, _| divide(10, 0))
}

fn divide(a: i32, b: i32) -> Result<Value, Fault> {
    if b == 0 {
        return Err(Fault::Arithmetic("/ by zero".into()));
    }
    Ok(Value::Int(a.wrapping_div(b)))
}

// ---- Counter ----

#[derive(Debug)]
pub struct Counter {
    count: Mutex<i32>,
}

impl Counter {
    pub fn new(start: i32) -> Self {
        Self {
            count: Mutex::new(start),
        }
    }

    pub fn get(&self) -> i32 {
        *self.count.lock()
    }

    fn add(&self, n: i32) -> i32 {
        let mut count = self.count.lock();
        *count = count.wrapping_add(n);
        *count
    }
}

impl TargetObject for Counter {
    fn type_name(&self) -> &str {
        "Counter"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn equals(&self, other: &Value) -> Result<bool, Fault> {
        let mine = self.get();
        Ok(match other {
            Value::Object(o) => o
                .as_any()
                .downcast_ref::<Counter>()
                .is_some_and(|c| c.get() == mine),
            _ => false,
        })
    }

    fn hash_code(&self) -> Result<i64, Fault> {
        Ok(self.get() as i64)
    }

    fn to_text(&self) -> Result<String, Fault> {
        Ok(format!("Counter({})", self.get()))
    }
}

fn counter() -> TypeBuilder {
    TypeBuilder::new("Counter")
        .constructor(vec![], |_, _| Ok(Value::object(Counter::new(0))))
        .constructor(vec![TypeRef::Int], |_, a| {
            Ok(Value::object(Counter::new(a[0].as_int()?)))
        })
        .method("increment", vec![], TypeRef::Void, |r, _| {
            receiver::<Counter>(r)?.add(1);
            Ok(Value::Null)
        })
        .method("add", vec![TypeRef::Int], TypeRef::Int, |r, a| {
            Ok(Value::Int(receiver::<Counter>(r)?.add(a[0].as_int()?)))
        })
        .method("get", vec![], TypeRef::Int, |r, _| {
            Ok(Value::Int(receiver::<Counter>(r)?.get()))
        })
        .method("reset", vec![], TypeRef::Void, |r, _| {
            *receiver::<Counter>(r)?.count.lock() = 0;
            Ok(Value::Null)
        })
}

// ---- Shapes ----

#[derive(Debug, PartialEq)]
pub struct Circle {
    pub radius: i32,
}

#[derive(Debug, PartialEq)]
pub struct Square {
    pub side: i32,
}

impl TargetObject for Circle {
    fn type_name(&self) -> &str {
        "Circle"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn equals(&self, other: &Value) -> Result<bool, Fault> {
        Ok(other.downcast::<Circle>().is_ok_and(|c| c == self))
    }

    fn hash_code(&self) -> Result<i64, Fault> {
        Ok(31 + self.radius as i64)
    }

    fn to_text(&self) -> Result<String, Fault> {
        Ok(format!("Circle(r={})", self.radius))
    }
}

impl TargetObject for Square {
    fn type_name(&self) -> &str {
        "Square"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn equals(&self, other: &Value) -> Result<bool, Fault> {
        Ok(other.downcast::<Square>().is_ok_and(|s| s == self))
    }

    fn hash_code(&self) -> Result<i64, Fault> {
        Ok(37 + self.side as i64)
    }

    fn to_text(&self) -> Result<String, Fault> {
        Ok(format!("Square(side={})", self.side))
    }
}

fn area_of(shape: &Value) -> Result<i32, Fault> {
    if let Ok(circle) = shape.downcast::<Circle>() {
        return Ok(circle.radius.wrapping_mul(circle.radius).wrapping_mul(3));
    }
    let square = shape.downcast::<Square>()?;
    Ok(square.side.wrapping_mul(square.side))
}

fn non_negative(what: &str, n: i32) -> Result<i32, Fault> {
    if n < 0 {
        Err(Fault::IllegalArgument(format!("{what} must be >= 0, got {n}")))
    } else {
        Ok(n)
    }
}

fn shape() -> TypeBuilder {
    TypeBuilder::new("Shape")
        .abstract_type()
        .method("area", vec![], TypeRef::Int, |r, _| {
            Ok(Value::Int(area_of(required(r)?)?))
        })
        .method(
            "larger",
            vec![TypeRef::object("Shape")],
            TypeRef::object("Shape"),
            |r, a| {
                let this = required(r)?;
                let other = &a[0];
                if area_of(other)? > area_of(this)? {
                    Ok(other.clone())
                } else {
                    Ok(this.clone())
                }
            },
        )
}

fn circle() -> TypeBuilder {
    TypeBuilder::new("Circle")
        .supertype("Shape")
        .final_type()
        .constructor(vec![TypeRef::Int], |_, a| {
            let radius = non_negative("radius", a[0].as_int()?)?;
            Ok(Value::object(Circle { radius }))
        })
        .method("scale", vec![TypeRef::Int], TypeRef::object("Circle"), |r, a| {
            let circle = receiver::<Circle>(r)?;
            let factor = non_negative("factor", a[0].as_int()?)?;
            let radius = circle
                .radius
                .checked_mul(factor)
                .ok_or_else(|| Fault::Arithmetic("radius overflow".into()))?;
            Ok(Value::object(Circle { radius }))
        })
}

fn square() -> TypeBuilder {
    TypeBuilder::new("Square")
        .supertype("Shape")
        .final_type()
        .constructor(vec![TypeRef::Int], |_, a| {
            let side = non_negative("side", a[0].as_int()?)?;
            Ok(Value::object(Square { side }))
        })
}

// ---- Misbehaving types ----

#[derive(Debug)]
pub struct Mirror;

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

fn mirror() -> TypeBuilder {
    TypeBuilder::new("Mirror")
        .constructor(vec![], |_, _| Ok(Value::object(Mirror)))
        .method("reflect", vec![], TypeRef::object("Mirror"), |r, _| {
            receiver::<Mirror>(r)?;
            Ok(Value::object(Mirror))
        })
}

#[derive(Debug)]
pub struct Opaque {
    label: String,
}

impl TargetObject for Opaque {
    fn type_name(&self) -> &str {
        "Opaque"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn to_text(&self) -> Result<String, Fault> {
        Err(Fault::IllegalState(format!("{} cannot be printed", self.label)))
    }
}

fn opaque() -> TypeBuilder {
    TypeBuilder::new("Opaque")
        .constructor(vec![TypeRef::Str], |_, a| {
            Ok(Value::object(Opaque {
                label: a[0].as_str()?.to_string(),
            }))
        })
        .method("label", vec![], TypeRef::Str, |r, _| {
            Ok(Value::str(receiver::<Opaque>(r)?.label.clone()))
        })
}

#[derive(Debug, Default)]
pub struct Inventory {
    items: Mutex<BTreeMap<String, i32>>,
}

impl TargetObject for Inventory {
    fn type_name(&self) -> &str {
        "Inventory"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn to_text(&self) -> Result<String, Fault> {
        Ok(format!("Inventory{:?}", *self.items.lock()))
    }
}

fn inventory() -> TypeBuilder {
    TypeBuilder::new("Inventory")
        .constructor(vec![], |_, _| Ok(Value::object(Inventory::default())))
        .method("stock", vec![TypeRef::Str], TypeRef::Int, |r, a| {
            let item = a[0].as_str()?.to_string();
            let mut items = receiver::<Inventory>(r)?.items.lock();
            let count = items.entry(item).or_insert(0);
            *count += 1;
            Ok(Value::Int(*count))
        })
        // Looks the entry up without checking it exists.
        .method("count", vec![TypeRef::Str], TypeRef::Int, |r, a| {
            let item = a[0].as_str()?;
            let items = receiver::<Inventory>(r)?.items.lock();
            items
                .get(item)
                .map(|n| Value::Int(*n))
                .ok_or_else(|| Fault::NullDereference(format!("no entry for '{item}'")))
        })
        .method("audit", vec![TypeRef::Int], TypeRef::Bool, |r, a| {
            let expected = a[0].as_int()?;
            if expected < 0 {
                return Err(Fault::AssertionFailure(format!(
                    "audit expects a non-negative total, got {expected}"
                )));
            }
            let total: i32 = receiver::<Inventory>(r)?.items.lock().values().sum();
            Ok(Value::Bool(total == expected))
        })
}

// ---- Helpers ----

fn required(receiver: Option<&Value>) -> Result<&Value, Fault> {
    receiver.ok_or_else(|| Fault::NullDereference("missing receiver".into()))
}

fn receiver<T: 'static>(receiver: Option<&Value>) -> Result<&T, Fault> {
    required(receiver)?.downcast::<T>()
}
