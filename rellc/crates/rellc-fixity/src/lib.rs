//! rellc-fixity — the operator-precedence poset (spec §4.1).
//!
//! A `Poset` is a union-find of equivalence classes with a DAG of `<`
//! edges between them. It has nothing to do with types or checking; it
//! exists purely so `rellc-resolve` can hand the fixity resolver (an
//! external collaborator) a consistent operator ordering.

use rellc_ast::Op;
use rellc_util::diagnostic::{Diagnostic, Handler, E_FIXITY_SELF_REFERENCE, W_PRECEDENCE_CYCLE};
use rellc_util::Loc;
use rellc_util::Idx;
use rustc_hash::FxHashMap;
use std::collections::HashSet;

rellc_util::define_idx!(
    /// An equivalence class of operators that share a priority (spec §4.1).
    Class
);

/// The ordering a fixity declaration asserts between two classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ord {
    Lt,
    Eq,
    Gt,
}

/// Union-find over operators plus a DAG of `<` edges between the
/// resulting classes (spec §4.1).
#[derive(Debug, Default)]
pub struct Poset {
    parent: Vec<Class>,
    members: FxHashMap<Class, Vec<Op>>,
    op_class: FxHashMap<Op, Class>,
    /// Adjacency: `edges[c]` contains every class known to be `< c`.
    edges: FxHashMap<Class, HashSet<Class>>,
}

impl Poset {
    pub fn new() -> Self {
        Self::default()
    }

    fn new_class(&mut self, op: Op) -> Class {
        let class = Class(self.parent.len() as u32);
        self.parent.push(class);
        self.members.insert(class, vec![op]);
        self.op_class.insert(op, class);
        class
    }

    /// Returns the representative class for `op`, creating a singleton
    /// class if `op` hasn't been seen yet (spec §4.1: `eqClass`).
    pub fn eq_class(&mut self, op: Op) -> Class {
        if let Some(&class) = self.op_class.get(&op) {
            return self.find(class);
        }
        self.new_class(op)
    }

    fn find(&mut self, class: Class) -> Class {
        let mut root = class;
        while self.parent[root.index()] != root {
            root = self.parent[root.index()];
        }
        // Path compression.
        let mut cur = class;
        while self.parent[cur.index()] != root {
            let next = self.parent[cur.index()];
            self.parent[cur.index()] = root;
            cur = next;
        }
        root
    }

    fn union(&mut self, a: Class, b: Class) -> Class {
        let (a, b) = (self.find(a), self.find(b));
        if a == b {
            return a;
        }
        self.parent[b.index()] = a;
        let moved = self.members.remove(&b).unwrap_or_default();
        self.members.entry(a).or_default().extend(moved);
        // Re-home any edges pointing at the now-absorbed class `b`.
        let incoming: Vec<Class> = self
            .edges
            .iter()
            .filter_map(|(&to, froms)| froms.contains(&b).then_some(to))
            .collect();
        for to in incoming {
            if let Some(froms) = self.edges.get_mut(&to) {
                froms.remove(&b);
                froms.insert(a);
            }
        }
        if let Some(froms) = self.edges.remove(&b) {
            self.edges.entry(a).or_default().extend(froms);
        }
        a
    }

    /// Would adding the edge `lower < higher` create a cycle, given the
    /// edges already present?
    fn reaches(&self, from: Class, to: Class) -> bool {
        let mut stack = vec![from];
        let mut seen = HashSet::new();
        while let Some(c) = stack.pop() {
            if c == to {
                return true;
            }
            if !seen.insert(c) {
                continue;
            }
            if let Some(froms) = self.edges.get(&c) {
                stack.extend(froms.iter().copied());
            }
        }
        false
    }

    /// Merges classes (`Eq`) or records a directed `<` edge (`Lt`/`Gt`).
    /// A conflicting edge is dropped with a non-fatal [`W_PRECEDENCE_CYCLE`]
    /// warning (spec §4.1: "lenient"). `left` related to itself is a fatal
    /// [`E_FIXITY_SELF_REFERENCE`].
    pub fn add_relation(&mut self, left: Op, right: Op, ord: Ord, loc: Loc, handler: &mut Handler) {
        let lc = self.eq_class(left);
        let rc = self.eq_class(right);

        if lc == rc && left == right {
            handler.fatal([Diagnostic::error(
                E_FIXITY_SELF_REFERENCE,
                "an operator cannot be related to itself",
                loc,
            )]);
            return;
        }

        match ord {
            Ord::Eq => {
                self.union(lc, rc);
            }
            Ord::Lt => self.add_lt(lc, rc, loc, handler),
            Ord::Gt => self.add_lt(rc, lc, loc, handler),
        }
    }

    /// Records `lower < higher`; drops it with a warning if `higher` is
    /// already known to be `< lower` (a cycle).
    fn add_lt(&mut self, lower: Class, higher: Class, loc: Loc, handler: &mut Handler) {
        if lower == higher {
            return;
        }
        if self.reaches(lower, higher) {
            handler.non_fatal(Diagnostic::warning(
                W_PRECEDENCE_CYCLE,
                format!("precedence relation would create a cycle between classes {lower:?} and {higher:?}"),
                loc,
            ));
            return;
        }
        self.edges.entry(higher).or_default().insert(lower);
    }

    /// Topologically sorts every known class, grouping ties (classes with
    /// no ordering relation between them) into the same inner vector
    /// (spec §4.1: `ordered`).
    pub fn ordered(&self) -> Vec<Vec<Class>> {
        let classes: HashSet<Class> = self.members.keys().copied().collect();
        let mut remaining = classes;
        let mut out = Vec::new();
        while !remaining.is_empty() {
            let mut ready: Vec<Class> = remaining
                .iter()
                .copied()
                .filter(|c| {
                    self.edges
                        .get(c)
                        .map(|froms| froms.iter().all(|f| !remaining.contains(f)))
                        .unwrap_or(true)
                })
                .collect();
            if ready.is_empty() {
                // Should not happen: add_relation rejects cycles eagerly.
                ready = remaining.iter().copied().collect();
            }
            ready.sort_by_key(|c| c.0);
            for c in &ready {
                remaining.remove(c);
            }
            out.push(ready);
        }
        out
    }

    /// Enumerates the operators belonging to `class` (spec §4.1: `items`).
    pub fn items(&self, class: Class) -> &[Op] {
        self.members.get(&class).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rellc_ast::name::Id;
    use rellc_ast::Name;

    fn op(text: &str, id: u32) -> Op {
        Some(Name::user(text, Id(id), Loc::DUMMY))
    }

    #[test]
    fn fresh_operator_gets_singleton_class() {
        let mut p = Poset::new();
        let c = p.eq_class(op("+", 0));
        assert_eq!(p.items(c), &[op("+", 0)]);
    }

    #[test]
    fn eq_relation_merges_classes() {
        let mut p = Poset::new();
        let mut h = Handler::new();
        p.add_relation(op("+", 0), op("-", 1), Ord::Eq, Loc::DUMMY, &mut h);
        let c1 = p.eq_class(op("+", 0));
        let c2 = p.eq_class(op("-", 1));
        assert_eq!(c1, c2);
        assert!(!h.has_fatal());
    }

    #[test]
    fn self_reference_is_fatal() {
        let mut p = Poset::new();
        let mut h = Handler::new();
        let plus = op("+", 0);
        p.add_relation(plus, plus, Ord::Lt, Loc::DUMMY, &mut h);
        assert!(h.has_fatal());
    }

    #[test]
    fn conflicting_edge_is_a_non_fatal_cycle_warning() {
        let mut p = Poset::new();
        let mut h = Handler::new();
        p.add_relation(op("+", 0), op("*", 1), Ord::Lt, Loc::DUMMY, &mut h);
        p.add_relation(op("*", 1), op("+", 0), Ord::Lt, Loc::DUMMY, &mut h);
        assert!(!h.has_fatal());
        assert_eq!(h.diagnostics().len(), 1);
        assert_eq!(h.diagnostics()[0].code, W_PRECEDENCE_CYCLE);
    }

    #[test]
    fn ordered_respects_surviving_edges() {
        let mut p = Poset::new();
        let mut h = Handler::new();
        // application (None) < (+) < (*)
        p.add_relation(op("+", 0), None, Ord::Gt, Loc::DUMMY, &mut h);
        p.add_relation(op("*", 1), op("+", 0), Ord::Gt, Loc::DUMMY, &mut h);
        let groups = p.ordered();
        let app_class = p.eq_class(None);
        let plus_pos = groups.iter().position(|g| g.contains(&app_class)).unwrap();
        let plus_class = p.eq_class(op("+", 0));
        let star_class = p.eq_class(op("*", 1));
        let plus_pos2 = groups.iter().position(|g| g.contains(&plus_class)).unwrap();
        let star_pos = groups.iter().position(|g| g.contains(&star_class)).unwrap();
        assert!(plus_pos <= plus_pos2);
        assert!(plus_pos2 < star_pos);
    }
}
