use super::context::{Query, query};
use super::selection::{LinearBuilder, Selection, UniqueBuilder};
use crate::engine::structure::set_ops;
use std::sync::Arc;

/// Every structure selected by any query, duplicates removed.
pub fn merge(queries: Vec<Query>) -> Query {
    query(move |ctx| {
        let mut builder = UniqueBuilder::new(ctx.input_structure().clone());
        for q in &queries {
            q(ctx).for_each(|s, _| {
                builder.add(s);
            });
        }
        builder.into_selection()
    })
}

/// Elements selected by every query. The result keeps the grouping of the query with the
/// fewest selected elements, each of its structures cut down to the common elements.
pub fn intersect(queries: Vec<Query>) -> Query {
    query(move |ctx| {
        let input = ctx.input_structure().clone();
        if queries.is_empty() {
            return Selection::empty(input);
        }
        let selections: Vec<Selection> = queries.iter().map(|q| q(ctx)).collect();
        if selections.iter().any(Selection::is_empty) {
            return Selection::empty(input);
        }
        let unions: Vec<_> = selections.iter().map(Selection::union_structure).collect();
        let pivot = (0..unions.len())
            .min_by_key(|&i| unions[i].element_count())
            .unwrap_or(0);

        let mut common = unions[pivot].clone();
        for (i, other) in unions.iter().enumerate() {
            if i == pivot {
                continue;
            }
            common = Arc::new(set_ops::intersect(&common, other));
            if common.is_empty() {
                return Selection::empty(input);
            }
        }

        let mut builder = LinearBuilder::new(input);
        selections[pivot].for_each(|s, _| {
            if set_ops::is_subset(&s, &common) {
                builder.add(s);
            } else {
                builder.add(Arc::new(set_ops::intersect(&s, &common)));
            }
        });
        builder.into_selection()
    })
}

/// Structures of `source` with every element selected by `by` removed.
pub fn subtract(source: Query, by: Query) -> Query {
    query(move |ctx| {
        let selection = source(ctx);
        let mask = by(ctx).union_structure();
        if mask.is_empty() {
            return selection;
        }
        let mut builder = LinearBuilder::new(ctx.input_structure().clone());
        selection.for_each(|s, _| {
            if set_ops::are_intersecting(&s, &mask) {
                builder.add(Arc::new(set_ops::subtract(&s, &mask)));
            } else {
                builder.add(s);
            }
        });
        builder.into_selection()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::structure::Structure;
    use crate::engine::structure::set_ops::are_unit_ids_and_indices_equal;
    use crate::query::context::{atom_name_in, label_asym_id_in, run};
    use crate::query::generators::{AtomsQuery, atoms, none, residues};
    use crate::test_support;

    fn chain(id: &str) -> Query {
        atoms(AtomsQuery::new().chain_test(label_asym_id_in(&[id])))
    }

    fn named(names: &[&str]) -> Query {
        atoms(AtomsQuery::new().atom_test(atom_name_in(names)))
    }

    fn same(a: &Selection, b: &Selection) -> bool {
        a.is_singletons() == b.is_singletons()
            && a.structure_count() == b.structure_count()
            && are_unit_ids_and_indices_equal(&a.union_structure(), &b.union_structure())
    }

    #[test]
    fn single_operand_is_identity() {
        let s = Arc::new(test_support::two_chain_structure(10.0));
        for q in [chain("A"), named(&["CA", "N"]), residues(AtomsQuery::new())] {
            let direct = run(&q, &s);
            assert!(same(&run(&merge(vec![q.clone()]), &s), &direct));
            assert!(same(&run(&intersect(vec![q.clone()]), &s), &direct));
        }
    }

    #[test]
    fn merge_deduplicates_overlap() {
        let s = Arc::new(test_support::two_chain_structure(10.0));
        let merged = run(&merge(vec![chain("A"), named(&["CA"]), chain("A")]), &s);
        assert!(merged.is_singletons());
        assert_eq!(merged.structure_count(), 4);
    }

    #[test]
    fn intersect_keeps_common_elements() {
        let s = Arc::new(test_support::two_chain_structure(10.0));
        let both = run(&intersect(vec![chain("A"), named(&["CA", "C"])]), &s);
        assert_eq!(both.structure_count(), 2);
        assert_eq!(both.union_structure().unit_count(), 1);
        assert!(run(&intersect(vec![chain("A"), chain("B")]), &s).is_empty());
        assert!(run(&intersect(vec![chain("A"), none()]), &s).is_empty());
    }

    #[test]
    fn intersect_cuts_grouped_structures() {
        let s = Arc::new(test_support::two_chain_structure(10.0));
        let cut = run(&intersect(vec![residues(AtomsQuery::new()), named(&["N", "CA", "C"])]), &s);
        assert_eq!(cut.union_structure().element_count(), 6);
        let cut = run(&intersect(vec![named(&["N", "CA"]), residues(AtomsQuery::new())]), &s);
        assert_eq!(cut.structure_count(), 4);
    }

    #[test]
    fn difference_and_intersection_reconstruct_the_operand() {
        let s = Arc::new(test_support::two_chain_structure(10.0));
        let a = named(&["N", "CA"]);
        let b = chain("B");
        let difference = run(&subtract(a.clone(), b.clone()), &s).union_structure();
        let common = run(&intersect(vec![a.clone(), b]), &s).union_structure();
        let restored: Structure = set_ops::union(&[difference.as_ref(), common.as_ref()]);
        assert!(are_unit_ids_and_indices_equal(
            &restored,
            &run(&a, &s).union_structure()
        ));
    }

    #[test]
    fn subtract_drops_fully_covered_structures() {
        let s = Arc::new(test_support::two_chain_structure(10.0));
        let left = run(&subtract(residues(AtomsQuery::new()), chain("A")), &s);
        assert_eq!(left.structure_count(), 1);
        assert!(run(&subtract(chain("A"), none()), &s).structure_count() == 3);
    }
}
