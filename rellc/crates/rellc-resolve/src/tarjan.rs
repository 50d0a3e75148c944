//! Tarjan SCC decomposition (spec §4.2, §9: "run Tarjan SCC once over the
//! name-dependency graph").

use rellc_ast::DeclId;
use rustc_hash::FxHashMap;

#[cfg(test)]
use rellc_util::IndexVec;

struct State {
    index_counter: u32,
    index: FxHashMap<DeclId, u32>,
    lowlink: FxHashMap<DeclId, u32>,
    on_stack: FxHashMap<DeclId, bool>,
    stack: Vec<DeclId>,
    sccs: Vec<Vec<DeclId>>,
}

/// Decomposes `edges` (an adjacency list keyed by dependency, pointing at
/// every declaration that depends on it — see `DependencyResolver`) into
/// strongly connected components, returned in topological order: for an
/// edge `u -> v`, the component containing `u` comes no later than the
/// component containing `v` (spec §8, testable property 6).
///
/// Tarjan's algorithm naturally yields components in *reverse*
/// topological order of the condensation graph, so the caller-visible
/// order here is the raw Tarjan output reversed.
pub fn tarjan_scc(nodes: &[DeclId], edges: &FxHashMap<DeclId, Vec<DeclId>>) -> Vec<Vec<DeclId>> {
    let mut state = State {
        index_counter: 0,
        index: FxHashMap::default(),
        lowlink: FxHashMap::default(),
        on_stack: FxHashMap::default(),
        stack: Vec::new(),
        sccs: Vec::new(),
    };
    for &node in nodes {
        if !state.index.contains_key(&node) {
            strong_connect(node, edges, &mut state);
        }
    }
    state.sccs.reverse();
    state.sccs
}

fn strong_connect(v: DeclId, edges: &FxHashMap<DeclId, Vec<DeclId>>, state: &mut State) {
    state.index.insert(v, state.index_counter);
    state.lowlink.insert(v, state.index_counter);
    state.index_counter += 1;
    state.stack.push(v);
    state.on_stack.insert(v, true);

    if let Some(successors) = edges.get(&v) {
        for &w in successors {
            if !state.index.contains_key(&w) {
                strong_connect(w, edges, state);
                let w_low = state.lowlink[&w];
                let v_low = state.lowlink[&v];
                state.lowlink.insert(v, v_low.min(w_low));
            } else if *state.on_stack.get(&w).unwrap_or(&false) {
                let w_idx = state.index[&w];
                let v_low = state.lowlink[&v];
                state.lowlink.insert(v, v_low.min(w_idx));
            }
        }
    }

    if state.lowlink[&v] == state.index[&v] {
        let mut component = Vec::new();
        loop {
            let w = state.stack.pop().expect("Tarjan stack underflow: SCC root without members");
            state.on_stack.insert(w, false);
            component.push(w);
            if w == v {
                break;
            }
        }
        state.sccs.push(component);
    }
}

/// A handful of `DeclId`s for tests, allocated the same way
/// `DependencyResolver` allocates them.
#[cfg(test)]
fn ids(n: u32) -> Vec<DeclId> {
    let mut v: IndexVec<DeclId, ()> = IndexVec::new();
    (0..n).map(|_| v.push(())).collect()
}
