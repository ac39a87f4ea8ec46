use std::collections::{HashMap, HashSet};

/// Sequence-level facts about entities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entities {
    /// Sequence positions with more than one monomer type, per entity id.
    microheterogeneity: HashMap<String, HashSet<i64>>,
}

impl Entities {
    /// Builds the table from `(entity_id, seq_num, mon_id)` rows.
    pub fn from_sequence<'a>(rows: impl IntoIterator<Item = (&'a str, i64, &'a str)>) -> Self {
        let mut seen: HashMap<(String, i64), HashSet<String>> = HashMap::new();
        for (entity, num, mon) in rows {
            seen.entry((entity.to_string(), num))
                .or_default()
                .insert(mon.to_string());
        }
        let mut microheterogeneity: HashMap<String, HashSet<i64>> = HashMap::new();
        for ((entity, num), monomers) in seen {
            if monomers.len() > 1 {
                microheterogeneity.entry(entity).or_default().insert(num);
            }
        }
        Self { microheterogeneity }
    }

    pub fn has_microheterogeneity(&self, entity_id: &str, seq_id: i64) -> bool {
        self.microheterogeneity
            .get(entity_id)
            .is_some_and(|positions| positions.contains(&seq_id))
    }
}
