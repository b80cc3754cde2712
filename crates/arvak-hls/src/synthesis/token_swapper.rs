//! Permutation routing on a coupling graph.
//!
//! Each trial grows a BFS tree from a random root and settles the nodes in
//! reverse BFS order. Moving the wanted token to the deepest unsettled node
//! walks a shortest path through the unsettled nodes, which always stay
//! connected, so every trial succeeds on a connected graph. The trial with
//! the fewest swaps wins; ties go to the earlier trial.

use petgraph::algo::{astar, connected_components};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::{Bfs, NodeFiltered};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::debug;

use arvak_ir::{Circuit, QubitId};

use crate::error::HlsResult;
use crate::property::CouplingMap;
use crate::synthesis::permutation::validate_pattern;

/// Trials run when the caller does not say.
pub const DEFAULT_TRIALS: usize = 5;

/// Graph size from which trials run on the rayon pool.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 50;

fn route(graph: &UnGraph<usize, ()>, pattern: &[usize], seed: u64) -> Vec<(usize, usize)> {
    let n = pattern.len();
    let mut rng = SmallRng::seed_from_u64(seed);
    let root = NodeIndex::new(rng.gen_range(0..n));

    let mut order = Vec::with_capacity(n);
    let mut bfs = Bfs::new(graph, root);
    while let Some(node) = bfs.next(graph) {
        order.push(node);
    }

    // token_at[p] is the input qubit whose state sits on position p.
    let mut token_at: Vec<usize> = (0..n).collect();
    let mut position_of: Vec<usize> = (0..n).collect();
    let mut alive = vec![true; n];
    let mut swaps = Vec::new();

    for &goal in order.iter().rev() {
        let token = pattern[goal.index()];
        let start = NodeIndex::new(position_of[token]);
        if start != goal {
            let alive_nodes = NodeFiltered::from_fn(graph, |node: NodeIndex| alive[node.index()]);
            let path = astar(&alive_nodes, start, |node| node == goal, |_| 1usize, |_| 0)
                .map(|(_, path)| path)
                .unwrap_or_default();
            for step in path.windows(2) {
                let (a, b) = (step[0].index(), step[1].index());
                swaps.push((a, b));
                token_at.swap(a, b);
                position_of[token_at[a]] = a;
                position_of[token_at[b]] = b;
            }
        }
        alive[goal.index()] = false;
    }
    swaps
}

/// Route `pattern` with swaps along the edges of `coupling`, which must be
/// labelled with the operation's own qubits `0..n`. `None` means full
/// connectivity.
///
/// Returns `None` when the graph does not connect the qubits.
pub fn synth_permutation_token_swapper(
    pattern: &[usize],
    coupling: Option<&CouplingMap>,
    trials: usize,
    seed: u64,
    parallel_threshold: usize,
) -> HlsResult<Option<Circuit>> {
    validate_pattern(pattern)?;
    let n = pattern.len();
    let mut circuit = Circuit::with_size("permutation_token_swapper", n, 0);
    if pattern.iter().enumerate().all(|(i, &p)| i == p) {
        return Ok(Some(circuit));
    }

    let full;
    let coupling = match coupling {
        Some(map) => map,
        None => {
            full = CouplingMap::full(n);
            &full
        }
    };
    let graph = coupling.graph();
    if graph.node_count() != n || connected_components(&graph) != 1 {
        debug!(qubits = n, "coupling graph does not connect the permutation");
        return Ok(None);
    }

    let mut master = SmallRng::seed_from_u64(seed);
    let seeds: Vec<u64> = (0..trials.max(1)).map(|_| master.r#gen()).collect();
    let best = if n >= parallel_threshold {
        seeds
            .par_iter()
            .enumerate()
            .map(|(i, &s)| (i, route(&graph, pattern, s)))
            .min_by_key(|(i, swaps)| (swaps.len(), *i))
    } else {
        seeds
            .iter()
            .enumerate()
            .map(|(i, &s)| (i, route(&graph, pattern, s)))
            .min_by_key(|(i, swaps)| (swaps.len(), *i))
    };

    if let Some((trial, swaps)) = best {
        debug!(trial, swaps = swaps.len(), "token swapper picked trial");
        for (a, b) in swaps {
            circuit.swap(QubitId(a), QubitId(b))?;
        }
    }
    Ok(Some(circuit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arvak_ir::HighLevelOperation;
    use arvak_ir::operator::equivalent;

    fn reference(pattern: &[usize]) -> Circuit {
        Circuit::from_operation(HighLevelOperation::permutation(pattern.to_vec()).unwrap().into())
    }

    fn on_edges(circuit: &Circuit, coupling: &CouplingMap) -> bool {
        circuit
            .instructions()
            .iter()
            .all(|inst| coupling.is_connected(inst.qubits[0].index(), inst.qubits[1].index()))
    }

    #[test]
    fn test_routes_on_a_line() {
        let line = CouplingMap::linear(5);
        let pattern = [4, 2, 0, 1, 3];
        let circuit = synth_permutation_token_swapper(&pattern, Some(&line), 4, 11, 50)
            .unwrap()
            .unwrap();
        assert!(on_edges(&circuit, &line));
        assert!(equivalent(&circuit, &reference(&pattern), false).unwrap());
    }

    #[test]
    fn test_full_connectivity_by_default() {
        let pattern = [2, 0, 3, 1];
        let circuit = synth_permutation_token_swapper(&pattern, None, 3, 0, 50)
            .unwrap()
            .unwrap();
        assert!(equivalent(&circuit, &reference(&pattern), false).unwrap());
    }

    #[test]
    fn test_same_seed_same_circuit() {
        let star = CouplingMap::star(6);
        let pattern = [5, 3, 1, 0, 2, 4];
        let a = synth_permutation_token_swapper(&pattern, Some(&star), 5, 3, 50).unwrap();
        let b = synth_permutation_token_swapper(&pattern, Some(&star), 5, 3, 50).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parallel_trials_match_sequential() {
        let line = CouplingMap::linear(6);
        let pattern = [1, 5, 0, 4, 2, 3];
        let sequential = synth_permutation_token_swapper(&pattern, Some(&line), 8, 21, 100)
            .unwrap()
            .unwrap();
        let parallel = synth_permutation_token_swapper(&pattern, Some(&line), 8, 21, 1)
            .unwrap()
            .unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_disconnected_graph_declines() {
        let split = CouplingMap::from_edges(4, [(0, 1), (2, 3)]);
        let result = synth_permutation_token_swapper(&[1, 2, 3, 0], Some(&split), 2, 0, 50);
        assert!(result.unwrap().is_none());

        let identity = synth_permutation_token_swapper(&[0, 1, 2, 3], Some(&split), 2, 0, 50);
        assert!(identity.unwrap().unwrap().is_empty());
    }

    #[test]
    fn test_more_trials_never_hurt() {
        let line = CouplingMap::linear(7);
        let pattern = [6, 5, 4, 3, 2, 1, 0];
        let one = synth_permutation_token_swapper(&pattern, Some(&line), 1, 5, 50)
            .unwrap()
            .unwrap();
        let many = synth_permutation_token_swapper(&pattern, Some(&line), 10, 5, 50)
            .unwrap()
            .unwrap();
        assert!(many.len() <= one.len());
    }
}
