//! Target description shared with the synthesis pass.
//!
//! The [`PropertySet`] carries the device's coupling map and basis gates
//! into [`HighLevelSynthesis`](crate::HighLevelSynthesis), plus arbitrary
//! typed values for callers chaining several passes.
//!
//! # Examples
//!
//! ```
//! use arvak_hls::{BasisGates, CouplingMap, PropertySet};
//!
//! let props = PropertySet::new().with_target(CouplingMap::linear(5), BasisGates::new(["cx", "u"]));
//!
//! let cm = props.coupling_map.as_ref().unwrap();
//! assert!(cm.is_connected(0, 1));
//! assert!(!cm.is_connected(0, 2));
//! assert!(props.basis_gates.as_ref().unwrap().contains("cx"));
//! ```
//!
//! ## Custom properties
//!
//! Passes leave typed results behind for the passes after them:
//!
//! ```
//! use arvak_hls::{HighLevelSynthesis, Pass, PropertySet, SynthesisSummary};
//! use arvak_ir::{Circuit, HighLevelOperation};
//!
//! let mut circuit = Circuit::with_size("mcx", 4, 0);
//! circuit.high_level(HighLevelOperation::mcx(3), arvak_ir::qubits(0..4)).unwrap();
//!
//! let mut props = PropertySet::new();
//! HighLevelSynthesis::default().run(&mut circuit, &mut props).unwrap();
//! assert_eq!(props.get::<SynthesisSummary>().unwrap().high_level_ops, 1);
//! ```

use petgraph::graph::UnGraph;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::collections::VecDeque;

/// Target device coupling map.
///
/// Edges are undirected. On construction through the factory methods an
/// all-pairs distance matrix is precomputed with BFS.
///
/// ## Deserialization
///
/// After deserialization, call [`rebuild_caches()`](Self::rebuild_caches)
/// to restore the adjacency list and the distance matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouplingMap {
    /// Connected qubit pairs.
    edges: Vec<(usize, usize)>,
    /// Number of physical qubits.
    num_qubits: usize,
    /// Adjacency list for fast lookup.
    #[serde(skip)]
    adjacency: FxHashMap<usize, Vec<usize>>,
    /// `dist_matrix[from][to]`, or `usize::MAX` if unreachable.
    #[serde(skip)]
    dist_matrix: Vec<Vec<usize>>,
}

impl CouplingMap {
    /// Create a coupling map without edges.
    pub fn new(num_qubits: usize) -> Self {
        Self {
            edges: vec![],
            num_qubits,
            adjacency: FxHashMap::default(),
            dist_matrix: vec![],
        }
    }

    /// Add an undirected edge. Duplicates and self-loops are ignored.
    pub fn add_edge(&mut self, q1: usize, q2: usize) {
        if q1 == q2
            || self
                .edges
                .iter()
                .any(|&(a, b)| (a == q1 && b == q2) || (a == q2 && b == q1))
        {
            return;
        }
        self.num_qubits = self.num_qubits.max(q1.max(q2) + 1);
        self.edges.push((q1, q2));
        self.adjacency.entry(q1).or_default().push(q2);
        self.adjacency.entry(q2).or_default().push(q1);
        self.dist_matrix.clear();
    }

    /// Build from an edge list and precompute distances.
    pub fn from_edges(num_qubits: usize, edges: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let mut map = Self::new(num_qubits);
        for (a, b) in edges {
            map.add_edge(a, b);
        }
        map.precompute_distances();
        map
    }

    /// All-pairs shortest paths using BFS from each node.
    fn precompute_distances(&mut self) {
        let n = self.num_qubits;
        self.dist_matrix = vec![vec![usize::MAX; n]; n];

        for src in 0..n {
            self.dist_matrix[src][src] = 0;
            let mut queue = VecDeque::from([src]);
            while let Some(current) = queue.pop_front() {
                for &neighbor in self.adjacency.get(&current).into_iter().flatten() {
                    if self.dist_matrix[src][neighbor] == usize::MAX {
                        self.dist_matrix[src][neighbor] = self.dist_matrix[src][current] + 1;
                        queue.push_back(neighbor);
                    }
                }
            }
        }
    }

    /// Rebuild the adjacency list and distance matrix from the edge list.
    pub fn rebuild_caches(&mut self) {
        self.adjacency.clear();
        for &(q1, q2) in &self.edges {
            self.adjacency.entry(q1).or_default().push(q2);
            self.adjacency.entry(q2).or_default().push(q1);
        }
        self.precompute_distances();
    }

    /// Check if two qubits are directly connected.
    #[inline]
    pub fn is_connected(&self, q1: usize, q2: usize) -> bool {
        self.adjacency
            .get(&q1)
            .is_some_and(|neighbors| neighbors.contains(&q2))
    }

    /// Number of physical qubits.
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// The coupling edges.
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    /// Neighbors of a qubit.
    pub fn neighbors(&self, qubit: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency
            .get(&qubit)
            .map(|v| v.iter().copied())
            .into_iter()
            .flatten()
    }

    /// A linear chain 0-1-2-...
    pub fn linear(n: usize) -> Self {
        Self::from_edges(n, (1..n).map(|i| (i - 1, i)))
    }

    /// A fully connected map.
    pub fn full(n: usize) -> Self {
        Self::from_edges(n, (0..n).flat_map(|i| ((i + 1)..n).map(move |j| (i, j))))
    }

    /// A star with qubit 0 at the center.
    pub fn star(n: usize) -> Self {
        Self::from_edges(n, (1..n).map(|i| (0, i)))
    }

    /// Shortest-path distance, `None` if unreachable.
    pub fn distance(&self, from: usize, to: usize) -> Option<usize> {
        if from == to {
            return Some(0);
        }
        if let Some(d) = self.dist_matrix.get(from).and_then(|row| row.get(to)) {
            return (*d != usize::MAX).then_some(*d);
        }
        self.distance_bfs(from, to)
    }

    fn distance_bfs(&self, from: usize, to: usize) -> Option<usize> {
        let mut visited = FxHashMap::default();
        let mut queue = VecDeque::from([(from, 0usize)]);
        visited.insert(from, 0usize);

        while let Some((current, dist)) = queue.pop_front() {
            for &neighbor in self.adjacency.get(&current).into_iter().flatten() {
                if neighbor == to {
                    return Some(dist + 1);
                }
                if let std::collections::hash_map::Entry::Vacant(e) = visited.entry(neighbor) {
                    e.insert(dist + 1);
                    queue.push_back((neighbor, dist + 1));
                }
            }
        }
        None
    }

    /// The subgraph induced by `qubits`, relabelled so `qubits[i]` becomes `i`.
    ///
    /// The result may be disconnected.
    pub fn reduce(&self, qubits: &[usize]) -> CouplingMap {
        let position: FxHashMap<usize, usize> =
            qubits.iter().enumerate().map(|(i, &q)| (q, i)).collect();
        let edges = self.edges.iter().filter_map(|(a, b)| {
            let (pa, pb) = (position.get(a)?, position.get(b)?);
            Some((*pa, *pb))
        });
        Self::from_edges(qubits.len(), edges)
    }

    /// The map as an undirected petgraph graph; node `i` carries weight `i`.
    pub fn graph(&self) -> UnGraph<usize, ()> {
        let mut graph = UnGraph::with_capacity(self.num_qubits, self.edges.len());
        let nodes: Vec<_> = (0..self.num_qubits).map(|i| graph.add_node(i)).collect();
        for &(a, b) in &self.edges {
            graph.add_edge(nodes[a], nodes[b], ());
        }
        graph
    }
}

/// Basis gates for the target device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasisGates {
    /// Gate names in the basis.
    gates: Vec<String>,
}

impl BasisGates {
    /// Create a basis from gate names.
    pub fn new(gates: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            gates: gates.into_iter().map(Into::into).collect(),
        }
    }

    /// Check if a gate is in the basis.
    pub fn contains(&self, gate: &str) -> bool {
        self.gates.iter().any(|g| g == gate)
    }

    /// The gate names.
    pub fn gates(&self) -> &[String] {
        &self.gates
    }

    /// `U` plus `CX`: the leaves every standard gate unrolls to.
    pub fn minimal() -> Self {
        Self::new(["u", "cx", "measure", "reset", "barrier"])
    }

    /// Every standard gate.
    pub fn universal() -> Self {
        Self::new([
            "id", "x", "y", "z", "h", "s", "sdg", "t", "tdg", "sx", "sxdg", "rx", "ry", "rz", "p",
            "u", "cx", "cy", "cz", "ch", "swap", "iswap", "crx", "cry", "crz", "cp", "rxx", "ryy",
            "rzz", "ccx", "cswap", "measure", "reset", "barrier",
        ])
    }
}

/// Properties shared between compilation passes.
///
/// # Standard Properties
///
/// | Field | Type | Description |
/// |-------|------|-------------|
/// | `coupling_map` | [`CouplingMap`] | Device connectivity graph |
/// | `basis_gates` | [`BasisGates`] | Native gate set for the target |
///
/// Passes record their results as typed custom properties, e.g. the
/// [`SynthesisSummary`](crate::hls::SynthesisSummary) left by
/// [`HighLevelSynthesis`](crate::HighLevelSynthesis).
#[derive(Debug, Default)]
pub struct PropertySet {
    /// Target coupling map. When set, synthesis plugins receive the physical
    /// qubits of each operation.
    pub coupling_map: Option<CouplingMap>,

    /// Gates the synthesized circuit may contain. `None` accepts every
    /// standard gate.
    pub basis_gates: Option<BasisGates>,

    custom: FxHashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl PropertySet {
    /// Create an empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the coupling map and basis gates.
    #[must_use]
    pub fn with_target(mut self, coupling_map: CouplingMap, basis_gates: BasisGates) -> Self {
        self.coupling_map = Some(coupling_map);
        self.basis_gates = Some(basis_gates);
        self
    }

    /// Set only the basis gates.
    #[must_use]
    pub fn with_basis_gates(mut self, basis_gates: BasisGates) -> Self {
        self.basis_gates = Some(basis_gates);
        self
    }

    /// Insert a custom property.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) {
        self.custom.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Get a custom property.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.custom
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }
}
