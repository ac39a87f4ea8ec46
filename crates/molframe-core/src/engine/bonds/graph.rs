use crate::core::model::topology::{BondFlags, BondOrder};
use std::collections::VecDeque;
use std::ops::Range;

/// Properties carried by one bond.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BondProps {
    pub flags: BondFlags,
    pub order: BondOrder,
    /// Stable source identifier, `-1` for inferred bonds.
    pub key: i32,
}

/// Undirected graph in compressed adjacency form. Every edge is stored once per direction and
/// both copies carry identical properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BondGraph {
    offset: Vec<usize>,
    a: Vec<usize>,
    b: Vec<usize>,
    flags: Vec<BondFlags>,
    order: Vec<BondOrder>,
    key: Vec<i32>,
}

impl BondGraph {
    pub fn empty(vertex_count: usize) -> Self {
        Self {
            offset: vec![0; vertex_count + 1],
            ..Self::default()
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.offset.len().saturating_sub(1)
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.b.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.b.is_empty()
    }

    /// Directed edge slots of `vertex`.
    #[inline]
    pub fn edge_range(&self, vertex: usize) -> Range<usize> {
        self.offset[vertex]..self.offset[vertex + 1]
    }

    pub fn degree(&self, vertex: usize) -> usize {
        self.offset[vertex + 1] - self.offset[vertex]
    }

    pub fn neighbors(&self, vertex: usize) -> &[usize] {
        &self.b[self.edge_range(vertex)]
    }

    #[inline]
    pub fn source(&self, edge: usize) -> usize {
        self.a[edge]
    }

    #[inline]
    pub fn target(&self, edge: usize) -> usize {
        self.b[edge]
    }

    pub fn props(&self, edge: usize) -> BondProps {
        BondProps {
            flags: self.flags[edge],
            order: self.order[edge],
            key: self.key[edge],
        }
    }

    pub fn flags(&self) -> &[BondFlags] {
        &self.flags
    }

    pub fn orders(&self) -> &[BondOrder] {
        &self.order
    }

    pub fn keys(&self) -> &[i32] {
        &self.key
    }

    /// Directed edge slot of `a -> b`, `None` when the vertices are not bonded.
    pub fn edge_index(&self, a: usize, b: usize) -> Option<usize> {
        if a >= self.vertex_count() {
            return None;
        }
        self.edge_range(a).find(|&e| self.b[e] == b)
    }

    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.edge_index(a, b).is_some()
    }

    /// Iterates directed edges `(a, b, props)`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, BondProps)> + '_ {
        (0..self.b.len()).map(move |e| (self.a[e], self.b[e], self.props(e)))
    }

    /// Connected components by breadth-first search.
    pub fn connected_components(&self) -> Components {
        let n = self.vertex_count();
        let mut vertex_component = vec![usize::MAX; n];
        let mut count = 0;
        let mut queue = VecDeque::new();
        for start in 0..n {
            if vertex_component[start] != usize::MAX {
                continue;
            }
            vertex_component[start] = count;
            queue.push_back(start);
            while let Some(v) = queue.pop_front() {
                for &w in self.neighbors(v) {
                    if vertex_component[w] == usize::MAX {
                        vertex_component[w] = count;
                        queue.push_back(w);
                    }
                }
            }
            count += 1;
        }
        Components {
            count,
            vertex_component,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Components {
    pub count: usize,
    pub vertex_component: Vec<usize>,
}

/// Collects undirected edges and lays them out in both directions.
#[derive(Debug, Default)]
pub struct BondGraphBuilder {
    vertex_count: usize,
    a: Vec<usize>,
    b: Vec<usize>,
    props: Vec<BondProps>,
}

impl BondGraphBuilder {
    pub fn new(vertex_count: usize) -> Self {
        Self {
            vertex_count,
            ..Self::default()
        }
    }

    pub fn add(&mut self, a: usize, b: usize, props: BondProps) {
        debug_assert!(a < self.vertex_count && b < self.vertex_count);
        self.a.push(a);
        self.b.push(b);
        self.props.push(props);
    }

    pub fn len(&self) -> usize {
        self.a.len()
    }

    pub fn is_empty(&self) -> bool {
        self.a.is_empty()
    }

    pub fn build(self) -> BondGraph {
        let n = self.vertex_count;
        let mut offset = vec![0usize; n + 1];
        for (&a, &b) in self.a.iter().zip(&self.b) {
            offset[a + 1] += 1;
            offset[b + 1] += 1;
        }
        for i in 0..n {
            offset[i + 1] += offset[i];
        }
        let slots = offset[n];
        let mut fill = offset.clone();
        let mut a_out = vec![0; slots];
        let mut b_out = vec![0; slots];
        let mut flags = vec![BondFlags::NONE; slots];
        let mut order = vec![BondOrder::Single; slots];
        let mut key = vec![-1; slots];

        for ((&a, &b), props) in self.a.iter().zip(&self.b).zip(&self.props) {
            for (from, to) in [(a, b), (b, a)] {
                let slot = fill[from];
                fill[from] += 1;
                a_out[slot] = from;
                b_out[slot] = to;
                flags[slot] = props.flags;
                order[slot] = props.order;
                key[slot] = props.key;
            }
        }

        BondGraph {
            offset,
            a: a_out,
            b: b_out,
            flags,
            order,
            key,
        }
    }
}
