//! Boundary-heavy random literal generation.
//!
//! Produces fresh values for the literal types (`int`, `boolean`, `char`,
//! `String`, arrays, `List`). Integers follow a tiered distribution: ~40%
//! exact boundaries, ~30% near-boundary, ~30% uniform in a small range.
//! Object types are never produced here; they come from constructor calls.

use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use seqgen_types::{TypeRef, Value};

/// Uniform integers are drawn from `-INT_SPAN..=INT_SPAN`.
const INT_SPAN: i32 = 99;

const INT_BOUNDARIES: [i32; 9] = [0, 1, -1, 2, -2, 10, -10, INT_SPAN, -INT_SPAN];

/// Seeded literal generator. It owns the run's only random stream, so the
/// generator loop borrows it through [`ValueGenerator::rng`] as well.
pub struct ValueGenerator {
    rng: StdRng,
    max_collection_len: usize,
    max_string_len: usize,
}

impl ValueGenerator {
    /// Lengths are exclusive upper bounds.
    pub fn new(seed: u64, max_collection_len: usize, max_string_len: usize) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            max_collection_len,
            max_string_len,
        }
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// A fresh random value of type `ty`, or `None` if `ty` has no literal form.
    pub fn generate(&mut self, ty: &TypeRef) -> Option<Value> {
        let value = match ty {
            TypeRef::Void | TypeRef::Object(_) => return None,
            TypeRef::Bool => Value::Bool(self.rng.gen_bool(0.5)),
            TypeRef::Int => Value::Int(self.gen_int()),
            TypeRef::Char => Value::Char(self.gen_char()),
            TypeRef::Str => Value::Str(self.gen_string()),
            TypeRef::Array(elem) => self.gen_array(elem),
            TypeRef::List => self.gen_list(),
        };
        Some(value)
    }

    // ---- Primitive generators ----

    fn gen_int(&mut self) -> i32 {
        let tier: f64 = self.rng.gen();
        if tier < 0.4 {
            INT_BOUNDARIES[self.rng.gen_range(0..INT_BOUNDARIES.len())]
        } else if tier < 0.7 {
            let base = INT_BOUNDARIES[self.rng.gen_range(0..INT_BOUNDARIES.len())];
            let offset = self.rng.gen_range(1..=16);
            if self.rng.gen_bool(0.5) {
                base.saturating_add(offset)
            } else {
                base.saturating_sub(offset)
            }
        } else {
            self.rng.gen_range(-INT_SPAN..=INT_SPAN)
        }
    }

    fn gen_char(&mut self) -> char {
        self.rng.gen_range(0x20u8..=0x7E) as char
    }

    fn gen_string(&mut self) -> String {
        let len = self.gen_len(self.max_string_len);
        (&mut self.rng)
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }

    // ---- Collections ----

    /// Elements without a literal form are left `null`.
    fn gen_array(&mut self, elem: &TypeRef) -> Value {
        let len = self.gen_len(self.max_collection_len);
        let items = (0..len)
            .map(|_| self.generate(elem).unwrap_or(Value::Null))
            .collect();
        Value::Array(elem.clone(), items)
    }

    fn gen_list(&mut self) -> Value {
        let len = self.gen_len(self.max_collection_len);
        Value::List((0..len).map(|_| Value::Int(self.gen_int())).collect())
    }

    /// A length below `bound`, weighted towards empty, singleton and longest.
    fn gen_len(&mut self, bound: usize) -> usize {
        let max = bound.saturating_sub(1);
        if max < 2 {
            return self.rng.gen_range(0..=max);
        }
        let tier: f64 = self.rng.gen();
        if tier < 0.20 {
            0
        } else if tier < 0.35 {
            1
        } else if tier < 0.50 {
            max
        } else {
            self.rng.gen_range(2..=max)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_seed() {
        let mut gen1 = ValueGenerator::new(42, 20, 50);
        let mut gen2 = ValueGenerator::new(42, 20, 50);
        for ty in [
            TypeRef::Int,
            TypeRef::Str,
            TypeRef::array_of(TypeRef::Char),
            TypeRef::List,
        ] {
            let v1 = gen1.generate(&ty).unwrap();
            let v2 = gen2.generate(&ty).unwrap();
            assert!(v1.equals_value(&v2).unwrap(), "same seed diverged for {ty}");
        }
    }

    #[test]
    fn test_ints_stay_near_range() {
        let mut gen = ValueGenerator::new(7, 20, 50);
        let mut saw_boundary = false;
        for _ in 0..500 {
            let v = gen.generate(&TypeRef::Int).unwrap().as_int().unwrap();
            assert!((-INT_SPAN - 16..=INT_SPAN + 16).contains(&v));
            saw_boundary |= v == 0;
        }
        assert!(saw_boundary);
    }

    #[test]
    fn test_chars_are_printable() {
        let mut gen = ValueGenerator::new(8, 20, 50);
        for _ in 0..200 {
            match gen.generate(&TypeRef::Char) {
                Some(Value::Char(c)) => assert!((' '..='~').contains(&c)),
                other => panic!("expected char, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_strings_are_alphanumeric_and_bounded() {
        let mut gen = ValueGenerator::new(9, 20, 50);
        for _ in 0..200 {
            let v = gen.generate(&TypeRef::Str).unwrap();
            let s = v.as_str().unwrap();
            assert!(s.len() < 50);
            assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn test_collections_are_bounded() {
        let mut gen = ValueGenerator::new(10, 5, 50);
        for _ in 0..200 {
            match gen.generate(&TypeRef::array_of(TypeRef::Int)) {
                Some(Value::Array(elem, items)) => {
                    assert_eq!(elem, TypeRef::Int);
                    assert!(items.len() < 5);
                }
                other => panic!("expected array, got {other:?}"),
            }
            match gen.generate(&TypeRef::List) {
                Some(Value::List(items)) => assert!(items.len() < 5),
                other => panic!("expected list, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_object_arrays_hold_nulls() {
        let mut gen = ValueGenerator::new(11, 5, 50);
        for _ in 0..20 {
            if let Some(Value::Array(_, items)) =
                gen.generate(&TypeRef::array_of(TypeRef::object("Shape")))
            {
                assert!(items.iter().all(Value::is_null));
            }
        }
    }

    #[test]
    fn test_no_literal_for_objects_or_void() {
        let mut gen = ValueGenerator::new(12, 5, 50);
        assert!(gen.generate(&TypeRef::object("TestClass")).is_none());
        assert!(gen.generate(&TypeRef::Void).is_none());
        assert!(!TypeRef::object("TestClass").is_literal());
        assert!(TypeRef::List.is_literal());
    }
}
