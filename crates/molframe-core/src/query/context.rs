use super::selection::Selection;
use crate::engine::bonds::graph::BondProps;
use crate::engine::structure::{Location, Structure, Unit};
use std::sync::Arc;

pub type Query = Arc<dyn Fn(&mut QueryContext) -> Selection + Send + Sync>;

pub type UnitTest = Arc<dyn Fn(&Unit) -> bool + Send + Sync>;
pub type ElementTest = Arc<dyn Fn(&Location) -> bool + Send + Sync>;
pub type GroupBy = Arc<dyn Fn(&Location) -> u64 + Send + Sync>;
pub type ElementRadius = Arc<dyn Fn(&Location) -> f64 + Send + Sync>;
pub type StructureTest = Arc<dyn Fn(&Structure) -> bool + Send + Sync>;
pub type BondTest = Arc<dyn Fn(&BondLocation) -> bool + Send + Sync>;

pub fn query<F>(f: F) -> Query
where
    F: Fn(&mut QueryContext) -> Selection + Send + Sync + 'static,
{
    Arc::new(f)
}

pub fn element_test<F>(f: F) -> ElementTest
where
    F: Fn(&Location) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}

pub fn bond_test<F>(f: F) -> BondTest
where
    F: Fn(&BondLocation) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Chains whose `label_asym_id` is one of `ids`.
pub fn label_asym_id_in(ids: &[&str]) -> ElementTest {
    let ids: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
    element_test(move |l| ids.iter().any(|id| id == l.label_asym_id()))
}

pub fn auth_asym_id_in(ids: &[&str]) -> ElementTest {
    let ids: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
    element_test(move |l| ids.iter().any(|id| id == l.auth_asym_id()))
}

pub fn comp_id_in(ids: &[&str]) -> ElementTest {
    let ids: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
    element_test(move |l| ids.iter().any(|id| id == l.comp_id()))
}

pub fn atom_name_in(names: &[&str]) -> ElementTest {
    let names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
    element_test(move |l| names.iter().any(|n| n == l.atom_name()))
}

pub fn type_symbol_in(symbols: &[&str]) -> ElementTest {
    let symbols: Vec<String> = symbols.iter().map(|s| s.to_ascii_uppercase()).collect();
    element_test(move |l| symbols.iter().any(|s| s == l.type_symbol()))
}

/// Residues with `start <= seq_id <= end`.
pub fn seq_id_in_range(start: i64, end: i64) -> ElementTest {
    element_test(move |l| l.seq_id().is_some_and(|s| s >= start && s <= end))
}

/// One bond seen from atom `a`. Indices are positions in the owning unit's elements.
#[derive(Debug, Clone)]
pub struct BondLocation {
    pub a: Location,
    pub a_index: usize,
    pub b: Location,
    pub b_index: usize,
    pub props: BondProps,
}

impl BondLocation {
    pub fn is_inter_unit(&self) -> bool {
        self.a.unit.id() != self.b.unit.id()
    }
}

/// Evaluation state of a query: a stack of input structures. Nested queries such as
/// [`super::generators::query_selection`] push a narrowed input and pop it when done.
#[derive(Debug)]
pub struct QueryContext {
    inputs: Vec<Arc<Structure>>,
}

impl QueryContext {
    pub fn new(structure: Arc<Structure>) -> Self {
        Self {
            inputs: vec![structure],
        }
    }

    pub fn input_structure(&self) -> &Arc<Structure> {
        // The constructor pushes one input and pops never remove it.
        &self.inputs[self.inputs.len() - 1]
    }

    pub fn push_input_structure(&mut self, structure: Arc<Structure>) {
        self.inputs.push(structure);
    }

    pub fn pop_input_structure(&mut self) {
        if self.inputs.len() > 1 {
            self.inputs.pop();
        }
    }

    pub fn run(&mut self, query: &Query) -> Selection {
        query(self)
    }
}

/// Evaluates `query` against `structure`.
pub fn run(query: &Query, structure: &Arc<Structure>) -> Selection {
    QueryContext::new(structure.clone()).run(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[test]
    fn input_stack_never_loses_the_root() {
        let root = Arc::new(test_support::two_chain_structure(10.0));
        let inner = Arc::new(Structure::new(vec![root.units()[0].clone()]));
        let mut ctx = QueryContext::new(root.clone());
        ctx.push_input_structure(inner.clone());
        assert!(Arc::ptr_eq(ctx.input_structure(), &inner));
        ctx.pop_input_structure();
        ctx.pop_input_structure();
        assert!(Arc::ptr_eq(ctx.input_structure(), &root));
    }

    #[test]
    fn common_tests_read_location_properties() {
        let structure = test_support::two_chain_structure(10.0);
        let l = Location::at(&structure.units()[1], 1).unwrap();
        assert!(label_asym_id_in(&["A", "B"])(&l));
        assert!(!label_asym_id_in(&["A"])(&l));
        assert!(atom_name_in(&["CA"])(&l));
        assert!(type_symbol_in(&["c"])(&l));
        assert!(comp_id_in(&["ALA"])(&l));
        assert!(seq_id_in_range(1, 1)(&l));
        assert!(!seq_id_in_range(2, 5)(&l));
    }
}
