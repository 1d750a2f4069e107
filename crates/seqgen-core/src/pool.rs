//! The value pool: accepted sequences indexed by the types they produce.
//!
//! The pool never stores raw values. Reusing a value means replaying the
//! statements that produced it, so the pool hands out whole sequences and
//! the caller concatenates them.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rand::Rng;
use seqgen_types::{Catalog, TypeRef};

use crate::sequence::Sequence;

#[derive(Debug, Default)]
pub struct ValuePool {
    sequences: Vec<Arc<Sequence>>,
    by_type: BTreeMap<TypeRef, Vec<usize>>,
}

impl ValuePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Index `seq` under the produced type of every non-void statement.
    pub fn register(&mut self, seq: Arc<Sequence>) {
        let slot = self.sequences.len();
        for statement in seq.statements() {
            let ty = statement.produced_type();
            if ty.is_void() {
                continue;
            }
            let entries = self.by_type.entry(ty.clone()).or_default();
            if entries.last() != Some(&slot) {
                entries.push(slot);
            }
        }
        self.sequences.push(seq);
    }

    /// A uniformly random sequence producing `ty`, or a subtype of it when
    /// `ty` admits substitution.
    pub fn sample_sequence_producing<C, R>(
        &self,
        ty: &TypeRef,
        catalog: &C,
        rng: &mut R,
    ) -> Option<&Arc<Sequence>>
    where
        C: Catalog + ?Sized,
        R: Rng,
    {
        let widen = catalog.permits_substitution(ty);
        let candidates: BTreeSet<usize> = self
            .by_type
            .iter()
            .filter(|(indexed, _)| *indexed == ty || (widen && catalog.is_assignable(ty, indexed)))
            .flat_map(|(_, slots)| slots.iter().copied())
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let pick = rng.gen_range(0..candidates.len());
        candidates
            .into_iter()
            .nth(pick)
            .and_then(|slot| self.sequences.get(slot))
    }

    /// A uniformly random statement index in `seq` whose produced type is
    /// assignable to `ty`.
    pub fn sample_statement_producing<C, R>(
        seq: &Sequence,
        ty: &TypeRef,
        catalog: &C,
        rng: &mut R,
    ) -> Option<usize>
    where
        C: Catalog + ?Sized,
        R: Rng,
    {
        let candidates: Vec<usize> = seq
            .statements()
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.is_void() && catalog.is_assignable(ty, s.produced_type()))
            .map(|(i, _)| i)
            .collect();
        if candidates.is_empty() {
            None
        } else {
            Some(candidates[rng.gen_range(0..candidates.len())])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use seqgen_types::{StaticCatalog, TypeBuilder, Value};

    use crate::statement::Statement;

    fn catalog() -> StaticCatalog {
        StaticCatalog::builder()
            .add_type(TypeBuilder::new("Shape"))
            .add_type(TypeBuilder::new("Circle").supertype("Shape"))
            .add_type(TypeBuilder::new("Token").final_type())
            .build()
    }

    fn seq_of(types: &[TypeRef]) -> Arc<Sequence> {
        let mut seq = Sequence::new();
        for ty in types {
            seq.push(Statement::constant(Value::Null, ty.clone()));
        }
        Arc::new(seq)
    }

    #[test]
    fn test_register_indexes_each_type_once() {
        let mut pool = ValuePool::new();
        pool.register(seq_of(&[TypeRef::Int, TypeRef::Int, TypeRef::Str]));
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.by_type[&TypeRef::Int], vec![0]);
        assert_eq!(pool.by_type[&TypeRef::Str], vec![0]);
    }

    #[test]
    fn test_exact_lookup() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(1);
        let mut pool = ValuePool::new();
        pool.register(seq_of(&[TypeRef::Int]));
        assert!(pool
            .sample_sequence_producing(&TypeRef::Int, &catalog, &mut rng)
            .is_some());
        assert!(pool
            .sample_sequence_producing(&TypeRef::Str, &catalog, &mut rng)
            .is_none());
    }

    #[test]
    fn test_lookup_widens_to_subtypes() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(2);
        let mut pool = ValuePool::new();
        pool.register(seq_of(&[TypeRef::object("Circle")]));
        let found = pool.sample_sequence_producing(&TypeRef::object("Shape"), &catalog, &mut rng);
        assert!(found.is_some());
        let none = pool.sample_sequence_producing(&TypeRef::object("Token"), &catalog, &mut rng);
        assert!(none.is_none());
    }

    #[test]
    fn test_sampling_is_spread_over_candidates() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(3);
        let mut pool = ValuePool::new();
        pool.register(seq_of(&[TypeRef::object("Shape")]));
        pool.register(seq_of(&[TypeRef::object("Circle")]));
        let mut seen = BTreeSet::new();
        for _ in 0..64 {
            let seq = pool
                .sample_sequence_producing(&TypeRef::object("Shape"), &catalog, &mut rng)
                .unwrap();
            seen.insert(seq.statements()[0].produced_type().clone());
        }
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_statement_sampling_respects_assignability() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(4);
        let seq = seq_of(&[TypeRef::Int, TypeRef::object("Circle"), TypeRef::Str]);
        let idx =
            ValuePool::sample_statement_producing(&seq, &TypeRef::object("Shape"), &catalog, &mut rng);
        assert_eq!(idx, Some(1));
        assert_eq!(
            ValuePool::sample_statement_producing(&seq, &TypeRef::Char, &catalog, &mut rng),
            None
        );
    }
}
