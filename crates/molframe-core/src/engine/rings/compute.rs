//! Smallest-ring search within residues.
//!
//! Each residue is searched independently with a depth-limited breadth-first walk over covalent
//! bonds. A ring closes when the walk reaches an already-marked atom through a new edge; its two
//! predecessor chains are joined at their first common ancestor. Residues with alternate
//! locations are searched once per location, ignoring atoms of other locations.

use crate::core::collections::sorted::SortedSet;
use crate::engine::bonds::graph::BondGraph;
use crate::engine::structure::unit::Unit;
use std::ops::Range;

/// Largest ring found is `2 * MAX_DEPTH` atoms.
const MAX_DEPTH: usize = 5;
const NONE: usize = usize::MAX;

/// Rings of an atomic unit as sorted unit-local indices.
pub fn compute_rings(unit: &Unit, graph: &BondGraph) -> Vec<SortedSet> {
    let residues = residue_ranges(unit);
    let capacity = residues.iter().map(|r| r.len()).max().unwrap_or(0);
    let atomic = &unit.model().atomic;
    let alt_ids: Vec<&str> = unit.elements().iter().map(|e| atomic.alt_id(e)).collect();

    let mut search = RingSearch::new(graph, alt_ids, capacity);
    for range in residues {
        search.process_residue(range);
    }
    search.rings
}

/// Unit-local ranges of consecutive elements sharing a residue.
pub(crate) fn residue_ranges(unit: &Unit) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    let mut current = None;
    for (i, element) in unit.elements().iter().enumerate() {
        let residue = unit.residue_index(element);
        if residue != current {
            if i > start {
                ranges.push(start..i);
            }
            start = i;
            current = residue;
        }
    }
    if unit.len() > start {
        ranges.push(start..unit.len());
    }
    ranges
}

struct RingSearch<'a> {
    graph: &'a BondGraph,
    alt_ids: Vec<&'a str>,
    start: usize,
    end: usize,
    is_ring_atom: Vec<bool>,
    marked: Vec<u32>,
    pred: Vec<usize>,
    depth: Vec<usize>,
    color: Vec<u32>,
    queue: Vec<usize>,
    current_color: u32,
    current_alt: &'a str,
    has_alt: bool,
    current_rings: Vec<SortedSet>,
    rings: Vec<SortedSet>,
}

impl<'a> RingSearch<'a> {
    fn new(graph: &'a BondGraph, alt_ids: Vec<&'a str>, capacity: usize) -> Self {
        Self {
            graph,
            alt_ids,
            start: 0,
            end: 0,
            is_ring_atom: vec![false; capacity],
            marked: vec![0; capacity],
            pred: vec![NONE; capacity],
            depth: vec![0; capacity],
            color: vec![0; capacity],
            queue: Vec::with_capacity(capacity),
            current_color: 0,
            current_alt: "",
            has_alt: false,
            current_rings: Vec::new(),
            rings: Vec::new(),
        }
    }

    fn count(&self) -> usize {
        self.end - self.start
    }

    fn reset(&mut self) {
        let n = self.count();
        self.is_ring_atom[..n].fill(false);
        self.pred[..n].fill(NONE);
        self.marked[..n].fill(0);
        self.color[..n].fill(0);
        self.depth[..n].fill(0);
        self.current_color = 0;
        self.current_alt = "";
        self.has_alt = false;
    }

    fn reset_depth(&mut self) {
        let n = self.count();
        self.depth[..n].fill(n + 1);
    }

    /// Atoms with one bond cannot start a ring, nor can ring atoms with exactly two.
    fn is_start(&self, i: usize) -> bool {
        let degree = self.graph.degree(self.start + i);
        !(degree <= 1 || (self.is_ring_atom[i] && degree == 2))
    }

    fn process_residue(&mut self, range: Range<usize>) {
        if range.len() < 3 {
            return;
        }
        self.start = range.start;
        self.end = range.end;
        self.current_rings.clear();

        let mut alt_ids: Vec<&'a str> = Vec::new();
        for i in range.clone() {
            let alt = self.alt_ids[i];
            if !alt.is_empty() && !alt_ids.contains(&alt) {
                alt_ids.push(alt);
            }
        }

        let mut mark = 1;
        if alt_ids.is_empty() {
            self.reset();
            for i in 0..self.count() {
                if !self.is_start(i) {
                    continue;
                }
                self.reset_depth();
                mark = self.find_rings(i, mark);
            }
        } else {
            for alt in alt_ids {
                self.reset();
                self.has_alt = true;
                self.current_alt = alt;
                for i in 0..self.count() {
                    if !self.is_start(i) {
                        continue;
                    }
                    let own = self.alt_ids[self.start + i];
                    if !own.is_empty() && own != alt {
                        continue;
                    }
                    self.reset_depth();
                    mark = self.find_rings(i, mark);
                }
            }
        }
        self.rings.append(&mut self.current_rings);
    }

    fn find_rings(&mut self, from: usize, mark: u32) -> u32 {
        let graph = self.graph;
        self.marked[from] = mark;
        self.depth[from] = 0;
        self.queue.clear();
        self.queue.push(from);

        let mut head = 0;
        while head < self.queue.len() {
            let top = self.queue[head];
            head += 1;
            let d = self.depth[top];
            for edge in graph.edge_range(self.start + top) {
                let b = graph.target(edge);
                if b < self.start || b >= self.end || !graph.flags()[edge].is_covalent() {
                    continue;
                }
                if self.has_alt {
                    let alt = self.alt_ids[b];
                    if !alt.is_empty() && alt != self.current_alt {
                        continue;
                    }
                }
                let other = b - self.start;
                if self.marked[other] == mark {
                    if self.pred[other] != top
                        && self.pred[top] != other
                        && self.add_ring(top, other)
                    {
                        return mark + 1;
                    }
                    continue;
                }
                let new_depth = self.depth[other].min(d + 1);
                if new_depth > MAX_DEPTH {
                    continue;
                }
                self.depth[other] = new_depth;
                self.marked[other] = mark;
                self.queue.push(other);
                self.pred[other] = top;
            }
        }
        mark + 1
    }

    /// Joins the predecessor chains of `a` and `b` into a ring. Only accepts `b > a` so each
    /// closure is seen once, and rejects duplicates and supersets of known rings.
    fn add_ring(&mut self, a: usize, b: usize) -> bool {
        if b < a {
            return false;
        }
        self.current_color += 1;
        let color = self.current_color;

        let mut current = a;
        for _ in 0..MAX_DEPTH {
            self.color[current] = color;
            current = self.pred[current];
            if current == NONE {
                break;
            }
        }

        let mut right = Vec::with_capacity(MAX_DEPTH);
        let mut target = None;
        current = b;
        for _ in 0..MAX_DEPTH {
            if self.color[current] == color {
                target = Some(current);
                break;
            }
            right.push(current);
            current = self.pred[current];
            if current == NONE {
                break;
            }
        }
        let Some(target) = target else {
            return false;
        };

        let mut left = Vec::with_capacity(MAX_DEPTH);
        current = a;
        for _ in 0..MAX_DEPTH {
            left.push(current);
            if current == target {
                break;
            }
            current = self.pred[current];
            if current == NONE {
                break;
            }
        }

        if left.len() + right.len() < 3 {
            return false;
        }
        let mut ring: Vec<usize> = Vec::with_capacity(left.len() + right.len());
        for &v in left.iter().chain(right.iter().rev()) {
            ring.push(self.start + v);
            self.is_ring_atom[v] = true;
        }
        let ring = SortedSet::from_unsorted(ring);

        for existing in &self.current_rings {
            if ring.len() == existing.len() && ring.are_equal(existing) {
                return false;
            }
            if ring.len() > existing.len() && existing.is_subset_of(&ring) {
                return false;
            }
        }
        self.current_rings.push(ring);
        true
    }
}
