//! Compact, serializable element references that can be rehydrated against the structure they
//! were taken from.

use super::QueryError;
use super::loci::{Loci, LociElement};
use super::selection::Selection;
use crate::core::collections::sorted::SortedSet;
use crate::engine::structure::{Structure, StructureSubsetBuilder, Unit};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::sync::Arc;

/// [`Structure::hash_code`] written as 16 hex digits, since TOML integers stop at `i64::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StructureHash(pub u64);

impl Serialize for StructureHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{:016x}", self.0))
    }
}

impl<'de> Deserialize<'de> for StructureHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        u64::from_str_radix(&text, 16)
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}

/// One index set shared by several units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleElement {
    /// Unit ids, one sorted list per invariant id, lists ordered by their first id.
    pub grouped_units: Vec<Vec<u32>>,
    /// Isolated positions into the unit's elements.
    #[serde(default)]
    pub set: Vec<usize>,
    /// Inclusive `[first, last]` runs of positions.
    #[serde(default)]
    pub ranges: Vec<(usize, usize)>,
}

impl BundleElement {
    /// Positions below `limit`. Runs are clipped before expansion so malformed bundles cannot
    /// allocate past the referenced units.
    fn indices(&self, limit: usize) -> Vec<usize> {
        let mut out: Vec<usize> = self.set.iter().copied().filter(|&i| i < limit).collect();
        for &(first, last) in &self.ranges {
            if first > last || first >= limit {
                continue;
            }
            out.extend(first..=last.min(limit - 1));
        }
        out.sort_unstable();
        out.dedup();
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    /// Hash of the structure the bundle was taken from. Without one the bundle applies to any
    /// structure, and references to missing units are skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<StructureHash>,
    #[serde(default)]
    pub elements: Vec<BundleElement>,
}

impl Bundle {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn from_loci(loci: &Loci) -> Self {
        let mut order: Vec<(Vec<usize>, Vec<(usize, usize)>)> = Vec::new();
        let mut by_key: HashMap<(Vec<usize>, Vec<(usize, usize)>), Vec<(u32, Vec<u32>)>> =
            HashMap::new();

        for e in loci.elements() {
            if e.indices.is_empty() {
                continue;
            }
            let key = encode_runs(e.indices.as_slice());
            let groups = by_key.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                Vec::new()
            });
            let invariant_id = e.unit.invariant_id();
            match groups.iter_mut().find(|(id, _)| *id == invariant_id) {
                Some((_, ids)) => ids.push(e.unit.id()),
                None => groups.push((invariant_id, vec![e.unit.id()])),
            }
        }

        let elements = order
            .into_iter()
            .filter_map(|key| {
                let groups = by_key.remove(&key)?;
                let mut grouped_units: Vec<Vec<u32>> = groups
                    .into_iter()
                    .map(|(_, mut ids)| {
                        ids.sort_unstable();
                        ids
                    })
                    .collect();
                grouped_units.sort_by_key(|ids| ids[0]);
                let (set, ranges) = key;
                Some(BundleElement {
                    grouped_units,
                    set,
                    ranges,
                })
            })
            .collect();

        Self {
            hash: Some(StructureHash(loci.structure().hash_code())),
            elements,
        }
    }

    pub fn from_selection(selection: &Selection) -> Self {
        Self::from_loci(&selection.to_loci_with_source_units())
    }

    /// Element references only; the structure hash is ignored.
    pub fn are_equal(a: &Bundle, b: &Bundle) -> bool {
        a.elements == b.elements
    }

    fn check_hash(&self, structure: &Structure) -> Result<(), QueryError> {
        match self.hash {
            Some(StructureHash(expected)) if expected != structure.hash_code() => {
                Err(QueryError::IncompatibleBundle {
                    expected,
                    found: structure.hash_code(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Visits every referenced unit of `structure` with its positions, in bundle order.
    fn resolve(
        &self,
        structure: &Structure,
        mut f: impl FnMut(&Arc<Unit>, &[usize]),
    ) -> Result<(), QueryError> {
        self.check_hash(structure)?;
        for element in &self.elements {
            let limit = element
                .grouped_units
                .iter()
                .flatten()
                .filter_map(|&id| structure.unit(id))
                .map(|u| u.len())
                .max()
                .unwrap_or(0);
            let indices = element.indices(limit);
            for &id in element.grouped_units.iter().flatten() {
                let Some(unit) = structure.unit(id) else {
                    if self.hash.is_some() {
                        return Err(QueryError::UnknownUnit(id));
                    }
                    continue;
                };
                let end = indices.partition_point(|&i| i < unit.len());
                if end > 0 {
                    f(unit, &indices[..end]);
                }
            }
        }
        Ok(())
    }

    pub fn to_loci(&self, structure: &Arc<Structure>) -> Result<Loci, QueryError> {
        let mut elements: Vec<LociElement> = Vec::new();
        self.resolve(structure, |unit, indices| {
            elements.push(LociElement::new(
                unit.clone(),
                SortedSet::from_sorted(indices.to_vec()),
            ));
        })?;
        elements.sort_by_key(|e| e.unit.id());
        Ok(Loci::new(structure.clone(), elements))
    }

    pub fn to_structure(&self, parent: &Structure) -> Result<Structure, QueryError> {
        let mut builder = StructureSubsetBuilder::unique(parent);
        self.resolve(parent, |unit, indices| {
            let elements = unit.elements();
            for &i in indices {
                builder.add_to_unit(unit.id(), elements[i]);
            }
        })?;
        Ok(builder.build())
    }
}

/// Splits sorted positions into isolated values and runs longer than two.
fn encode_runs(indices: &[usize]) -> (Vec<usize>, Vec<(usize, usize)>) {
    let mut set = Vec::new();
    let mut ranges = Vec::new();
    let mut i = 0;
    while i < indices.len() {
        let start = i;
        while i + 1 < indices.len() && indices[i + 1] == indices[i] + 1 {
            i += 1;
        }
        if i - start >= 2 {
            ranges.push((indices[start], indices[i]));
        } else {
            set.extend_from_slice(&indices[start..=i]);
        }
        i += 1;
    }
    (set, ranges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::symmetry::operator::{Provenance, SymmetryOperator};
    use crate::engine::structure::StructureBuilder;
    use crate::engine::structure::set_ops::are_unit_ids_and_indices_equal;
    use crate::test_support;
    use nalgebra::{Matrix3, Vector3};

    fn with_copy_of_first_unit() -> Arc<Structure> {
        let base = test_support::two_chain_structure(10.0);
        let mut builder = StructureBuilder::new();
        for unit in base.units() {
            builder.add_existing(unit.clone());
        }
        let op = Arc::new(SymmetryOperator::of_rotation_and_offset(
            "copy",
            &Matrix3::identity(),
            &Vector3::new(0.0, 20.0, 0.0),
            Provenance::default(),
        ));
        builder.add_with_operator(&base.units()[0], op, false);
        Arc::new(builder.build())
    }

    #[test]
    fn runs_longer_than_two_become_ranges() {
        assert_eq!(
            encode_runs(&[0, 1, 2, 5, 7, 8, 10, 11, 12, 13]),
            (vec![5, 7, 8], vec![(0, 2), (10, 13)])
        );
        assert_eq!(encode_runs(&[]), (vec![], vec![]));
    }

    #[test]
    fn units_with_equal_indices_share_an_element() {
        let s = with_copy_of_first_unit();
        let bundle = Bundle::from_loci(&Loci::all(&s));
        assert_eq!(bundle.elements.len(), 1);
        assert_eq!(bundle.elements[0].grouped_units, vec![vec![0, 2], vec![1]]);
        assert_eq!(bundle.elements[0].ranges, vec![(0, 2)]);
        assert!(bundle.elements[0].set.is_empty());
    }

    #[test]
    fn loci_survive_a_bundle_round_trip() {
        let s = with_copy_of_first_unit();
        let loci = Loci::new(
            s.clone(),
            vec![
                LociElement::new(s.units()[0].clone(), SortedSet::from_sorted(vec![0, 2])),
                LociElement::new(s.units()[2].clone(), SortedSet::from_sorted(vec![1])),
            ],
        );
        let bundle = Bundle::from_loci(&loci);
        assert_eq!(bundle.elements.len(), 2);
        let back = bundle.to_loci(&s).unwrap();
        assert!(Loci::are_equal(&loci, &back));

        let structure = bundle.to_structure(&s).unwrap();
        assert!(are_unit_ids_and_indices_equal(&structure, &loci.to_structure()));
    }

    #[test]
    fn bundles_from_other_structures_are_rejected() {
        let s = Arc::new(test_support::two_chain_structure(10.0));
        let other = with_copy_of_first_unit();
        let bundle = Bundle::from_loci(&Loci::all(&s));
        assert!(matches!(
            bundle.to_loci(&other),
            Err(QueryError::IncompatibleBundle { .. })
        ));
        assert!(bundle.to_structure(&other).is_err());
    }

    #[test]
    fn unhashed_bundles_skip_missing_units() {
        let s = Arc::new(test_support::two_chain_structure(10.0));
        let bundle = Bundle {
            hash: None,
            elements: vec![BundleElement {
                grouped_units: vec![vec![1, 7]],
                set: vec![0, 9],
                ranges: vec![],
            }],
        };
        let loci = bundle.to_loci(&s).unwrap();
        assert_eq!(loci.size(), 1);
        assert_eq!(loci.elements()[0].unit.id(), 1);
    }

    #[test]
    fn oversized_runs_are_clipped_to_the_unit() {
        let s = Arc::new(test_support::two_chain_structure(10.0));
        let bundle = Bundle {
            hash: None,
            elements: vec![BundleElement {
                grouped_units: vec![vec![0]],
                set: vec![usize::MAX],
                ranges: vec![(1, usize::MAX), (5, 2)],
            }],
        };
        let loci = bundle.to_loci(&s).unwrap();
        assert_eq!(loci.size(), 2);
        assert_eq!(loci.elements()[0].indices.as_slice(), &[1, 2]);
    }

    #[test]
    fn bundle_round_trips_through_toml() {
        let s = with_copy_of_first_unit();
        let bundle = Bundle::from_loci(&Loci::all(&s));
        let text = toml::to_string(&bundle).unwrap();
        assert!(text.contains(&format!("{:016x}", s.hash_code())));
        let parsed: Bundle = toml::from_str(&text).unwrap();
        assert_eq!(parsed, bundle);
        assert!(Bundle::are_equal(&parsed, &bundle));
        assert!(Bundle::from_loci(&Loci::none(&s)).is_empty());
    }
}
