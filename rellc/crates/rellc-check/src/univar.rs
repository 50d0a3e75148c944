//! Unification-variable state and scope tracking (spec §4.3).
//!
//! A single mutable table, keyed by [`UniVarId`], holding either the
//! scope a variable was created at (unsolved) or its solution (solved).
//! This is the one piece of genuinely shared mutable state in the
//! checker (spec §5).

use rellc_ast::types::{Row, SkolemId, TypeVar, UniVarId};
use rellc_ast::Type;
use rellc_util::diagnostic::{Diagnostic, Handler, E_SELF_REFERENTIAL};
use rellc_util::{Fresh, IndexVec, InternalError, Loc};

/// Non-negative nesting depth, incremented on `forallScope` entry (spec
/// §3, "Scope").
pub type Scope = u32;

#[derive(Clone, Debug)]
enum Cell {
    Unsolved(Scope),
    Solved(Type),
}

#[derive(Debug)]
pub struct UnificationTable {
    cells: IndexVec<UniVarId, Cell>,
    current_scope: Scope,
    type_var_fresh: Fresh,
    skolem_fresh: Fresh,
}

/// How a `solveUniVar` cycle check came out (spec §4.3).
#[derive(Debug, PartialEq, Eq)]
enum Cycle {
    None,
    /// `a := b; b := a` through bare univar aliasing only.
    Direct,
    /// `a := F(..., a, ...)` through a real type constructor.
    Indirect,
}

/// What happened when solving a univar. Callers must check for
/// [`SolveOutcome::IndirectCycle`] and report `E_SELF_REFERENTIAL`
/// themselves (spec §7) — the table records a placeholder skolem so its
/// own invariants stay intact, but reporting is the checker's job.
#[derive(Debug, PartialEq, Eq)]
pub enum SolveOutcome {
    Solved,
    DirectCycleSkolemized,
    IndirectCycle,
}

impl Default for UnificationTable {
    fn default() -> Self {
        Self::new()
    }
}

impl UnificationTable {
    pub fn new() -> Self {
        Self { cells: IndexVec::new(), current_scope: 0, type_var_fresh: Fresh::new(), skolem_fresh: Fresh::new() }
    }

    pub fn current_scope(&self) -> Scope {
        self.current_scope
    }

    /// `freshUniVar` (spec §4.3).
    pub fn fresh_univar(&mut self) -> UniVarId {
        self.cells.push(Cell::Unsolved(self.current_scope))
    }

    pub fn fresh_skolem(&mut self) -> SkolemId {
        SkolemId(self.skolem_fresh.next())
    }

    pub fn fresh_type_var(&mut self) -> TypeVar {
        TypeVar(self.type_var_fresh.next())
    }

    pub fn is_solved(&self, u: UniVarId) -> bool {
        matches!(self.cells[u], Cell::Solved(_))
    }

    pub fn solution(&self, u: UniVarId) -> Option<&Type> {
        match &self.cells[u] {
            Cell::Solved(t) => Some(t),
            Cell::Unsolved(_) => None,
        }
    }

    /// `withUniVar`: run `f` against the current solution, if any.
    pub fn with_univar<T>(&self, u: UniVarId, f: impl FnOnce(&Type) -> T) -> Option<T> {
        self.solution(u).map(f)
    }

    /// `overrideUniVar`: `solveUniVar` with the already-solved check
    /// bypassed, used by substitution passes walking through solutions.
    pub fn override_univar(&mut self, u: UniVarId, t: Type) -> SolveOutcome {
        self.solve_univar_inner(u, t, true)
    }

    /// `solveUniVar(u, t)` (spec §4.3). Panics via [`InternalError`] if
    /// `u` is already solved — callers that legitimately re-solve a
    /// solved variable must use [`Self::override_univar`] instead.
    /// Returns [`SolveOutcome::IndirectCycle`] when `t` is
    /// self-referential through a real type constructor; the caller must
    /// report `E_SELF_REFERENTIAL` and abort the enclosing group (spec
    /// §7) — the table itself leaves a placeholder skolem in place so its
    /// own invariants hold regardless.
    pub fn solve_univar(&mut self, u: UniVarId, t: Type) -> SolveOutcome {
        self.solve_univar_inner(u, t, false)
    }

    /// `solveUniVar(u, t)` plus the self-referential-type check the
    /// checker must perform on every call site (spec §4.3 step 4, §7):
    /// reports `E_SELF_REFERENTIAL` and returns `false` when `t` is
    /// indirectly self-referential through `u`. A direct cycle collapses
    /// silently to a skolem and still returns `true`.
    pub fn solve_univar_reporting(&mut self, u: UniVarId, t: Type, loc: Loc, handler: &mut Handler) -> bool {
        match self.solve_univar(u, t) {
            SolveOutcome::IndirectCycle => {
                handler.fatal([Diagnostic::error(E_SELF_REFERENTIAL, "self-referential type", loc)]);
                false
            }
            SolveOutcome::Solved | SolveOutcome::DirectCycleSkolemized => true,
        }
    }

    fn solve_univar_inner(&mut self, u: UniVarId, t: Type, allow_override: bool) -> SolveOutcome {
        let creation_scope = match &self.cells[u] {
            Cell::Solved(_) if !allow_override => InternalError::ResolveAlreadySolved(u.0).panic(),
            Cell::Solved(_) => self.current_scope,
            Cell::Unsolved(s) => *s,
        };

        self.lower_scopes(&t, creation_scope);

        match self.detect_cycle(u, &t) {
            Cycle::Indirect => {
                self.cells[u] = Cell::Solved(Type::Skolem(self.fresh_skolem()));
                SolveOutcome::IndirectCycle
            }
            Cycle::Direct => {
                let skolem = self.fresh_skolem();
                self.cells[u] = Cell::Solved(Type::Skolem(skolem));
                SolveOutcome::DirectCycleSkolemized
            }
            Cycle::None => {
                self.cells[u] = Cell::Solved(t);
                SolveOutcome::Solved
            }
        }
    }

    /// Did solving `target` to `t` produce a cycle, and if so, was it a
    /// bare-alias (`Direct`) or structural (`Indirect`) one?
    fn detect_cycle(&self, target: UniVarId, t: &Type) -> Cycle {
        match t {
            Type::UniVar(v) => {
                if *v == target {
                    Cycle::Direct
                } else {
                    match &self.cells[*v] {
                        Cell::Solved(inner) => self.detect_cycle(target, inner),
                        Cell::Unsolved(_) => Cycle::None,
                    }
                }
            }
            Type::Name(_) | Type::Var(_) | Type::Skolem(_) => Cycle::None,
            Type::Forall(_, body) | Type::Exists(_, body) => {
                if self.occurs(target, body) {
                    Cycle::Indirect
                } else {
                    Cycle::None
                }
            }
            Type::Function(a, b) | Type::Application(a, b) => {
                if self.occurs(target, a) || self.occurs(target, b) {
                    Cycle::Indirect
                } else {
                    Cycle::None
                }
            }
            Type::Record(row) | Type::Variant(row) => {
                if self.occurs_row(target, row) {
                    Cycle::Indirect
                } else {
                    Cycle::None
                }
            }
        }
    }

    /// Does `target` occur anywhere in `t`, following solved-univar
    /// chains transparently?
    fn occurs(&self, target: UniVarId, t: &Type) -> bool {
        match t {
            Type::UniVar(v) => {
                *v == target
                    || match &self.cells[*v] {
                        Cell::Solved(inner) => self.occurs(target, inner),
                        Cell::Unsolved(_) => false,
                    }
            }
            Type::Name(_) | Type::Var(_) | Type::Skolem(_) => false,
            Type::Forall(_, body) | Type::Exists(_, body) => self.occurs(target, body),
            Type::Function(a, b) | Type::Application(a, b) => self.occurs(target, a) || self.occurs(target, b),
            Type::Record(row) | Type::Variant(row) => self.occurs_row(target, row),
        }
    }

    fn occurs_row(&self, target: UniVarId, row: &Row) -> bool {
        row.fields.values().any(|f| self.occurs(target, f))
            || row.extension.as_deref().map(|e| self.occurs(target, e)).unwrap_or(false)
    }

    /// Pushes `t`'s unsolved univars' scopes down to `min(s, their own)`
    /// so nothing created outside `s` can later escape through `t`
    /// (spec §4.3 step 2).
    fn lower_scopes(&mut self, t: &Type, s: Scope) {
        match t {
            Type::UniVar(v) => match self.cells[*v].clone() {
                Cell::Unsolved(s2) => self.cells[*v] = Cell::Unsolved(s.min(s2)),
                Cell::Solved(inner) => self.lower_scopes(&inner, s),
            },
            Type::Name(_) | Type::Var(_) | Type::Skolem(_) => {}
            Type::Forall(_, body) | Type::Exists(_, body) => self.lower_scopes(body, s),
            Type::Function(a, b) | Type::Application(a, b) => {
                self.lower_scopes(a, s);
                self.lower_scopes(b, s);
            }
            Type::Record(row) | Type::Variant(row) => {
                for f in row.fields.values() {
                    self.lower_scopes(f, s);
                }
                if let Some(e) = &row.extension {
                    self.lower_scopes(e, s);
                }
            }
        }
    }

    /// Resolves every already-solved `UniVar` in `t` to its solution,
    /// transitively, leaving unsolved univars and skolems untouched.
    pub fn zonk(&self, t: &Type) -> Type {
        match t {
            Type::UniVar(v) => match &self.cells[*v] {
                Cell::Solved(inner) => self.zonk(inner),
                Cell::Unsolved(_) => t.clone(),
            },
            Type::Name(_) | Type::Var(_) | Type::Skolem(_) => t.clone(),
            Type::Forall(v, body) => Type::forall(*v, self.zonk(body)),
            Type::Exists(v, body) => Type::exists(*v, self.zonk(body)),
            Type::Function(a, b) => Type::function(self.zonk(a), self.zonk(b)),
            Type::Application(a, b) => Type::application(self.zonk(a), self.zonk(b)),
            Type::Record(row) => Type::record(self.zonk_row(row)),
            Type::Variant(row) => Type::variant(self.zonk_row(row)),
        }
    }

    fn zonk_row(&self, row: &Row) -> Row {
        Row {
            fields: row.fields.iter().map(|(k, v)| (*k, self.zonk(v))).collect(),
            extension: row.extension.as_deref().map(|e| Box::new(self.zonk(e))),
        }
    }

    /// Replaces every occurrence of `UniVar(target)` in `t` with
    /// `replacement`, used by `forallScope` once a univar has been
    /// generalized to a bound type variable.
    pub fn replace_univar(&self, t: &Type, target: UniVarId, replacement: &Type) -> Type {
        match t {
            Type::UniVar(v) if *v == target => replacement.clone(),
            Type::UniVar(_) | Type::Name(_) | Type::Var(_) | Type::Skolem(_) => t.clone(),
            Type::Forall(v, body) => Type::forall(*v, self.replace_univar(body, target, replacement)),
            Type::Exists(v, body) => Type::exists(*v, self.replace_univar(body, target, replacement)),
            Type::Function(a, b) => {
                Type::function(self.replace_univar(a, target, replacement), self.replace_univar(b, target, replacement))
            }
            Type::Application(a, b) => {
                Type::application(self.replace_univar(a, target, replacement), self.replace_univar(b, target, replacement))
            }
            Type::Record(row) => Type::record(self.replace_univar_row(row, target, replacement)),
            Type::Variant(row) => Type::variant(self.replace_univar_row(row, target, replacement)),
        }
    }

    fn replace_univar_row(&self, row: &Row, target: UniVarId, replacement: &Type) -> Row {
        Row {
            fields: row.fields.iter().map(|(k, v)| (*k, self.replace_univar(v, target, replacement))).collect(),
            extension: row.extension.as_deref().map(|e| Box::new(self.replace_univar(e, target, replacement))),
        }
    }

    /// `forallScope(action)` (spec §4.3): the generalization rule.
    pub fn forall_scope(&mut self, action: impl FnOnce(&mut Self) -> Type) -> Type {
        let start = self.enter_scope();
        let out = action(self);
        self.exit_scope_and_generalize(start, out)
    }

    /// The entry half of `forallScope`, split out so callers that need
    /// more than `&mut UnificationTable` alone while running `action`
    /// (the checker also threads `sigs`/`builtins`/the diagnostic
    /// handler through `infer`/`check`) can replicate `forallScope`
    /// without the table having to know about those other fields.
    pub fn enter_scope(&mut self) -> u32 {
        let start = self.cells.len() as u32;
        self.current_scope += 1;
        start
    }

    /// The exit half of `forallScope`: decrements the scope, zonks
    /// `out`, and generalizes every univar allocated since `start` that
    /// is still unsolved, strictly deeper than the restored scope, and
    /// occurs in `out`.
    pub fn exit_scope_and_generalize(&mut self, start: u32, out: Type) -> Type {
        self.current_scope -= 1;
        let end = self.cells.len() as u32;
        let mut out = self.zonk(&out);

        for raw in start..end {
            let uv = UniVarId(raw);
            if let Cell::Unsolved(scope) = self.cells[uv] {
                if scope > self.current_scope && self.occurs(uv, &out) {
                    let tv = self.fresh_type_var();
                    out = self.replace_univar(&out, uv, &Type::Var(tv));
                    self.cells[uv] = Cell::Solved(Type::Var(tv));
                    out = Type::forall(tv, out);
                }
                // else: scope == current_scope, leaked by reference; leave it.
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_univar_starts_unsolved_at_current_scope() {
        let mut t = UnificationTable::new();
        let u = t.fresh_univar();
        assert!(!t.is_solved(u));
    }

    #[test]
    fn solve_then_resolve_without_override_panics() {
        let mut t = UnificationTable::new();
        let u = t.fresh_univar();
        t.solve_univar(u, Type::Name(rellc_ast::Name::Builtin(rellc_ast::Builtin::Bool)));
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            t.solve_univar(u, Type::Name(rellc_ast::Name::Builtin(rellc_ast::Builtin::Int)));
        }));
        assert!(result.is_err());
    }

    #[test]
    fn override_univar_does_not_panic_when_already_solved() {
        let mut t = UnificationTable::new();
        let u = t.fresh_univar();
        t.solve_univar(u, Type::Name(rellc_ast::Name::Builtin(rellc_ast::Builtin::Bool)));
        t.override_univar(u, Type::Name(rellc_ast::Name::Builtin(rellc_ast::Builtin::Int)));
        assert_eq!(t.solution(u), Some(&Type::Name(rellc_ast::Name::Builtin(rellc_ast::Builtin::Int))));
    }

    #[test]
    fn solve_univar_reporting_flags_an_indirect_cycle() {
        let mut t = UnificationTable::new();
        let mut handler = Handler::new();
        let u = t.fresh_univar();
        let bool_ty = Type::Name(rellc_ast::Name::Builtin(rellc_ast::Builtin::Bool));
        let cyclic = Type::function(Type::UniVar(u), bool_ty);
        assert!(!t.solve_univar_reporting(u, cyclic, Loc::DUMMY, &mut handler));
        assert!(handler.has_fatal());
    }

    #[test]
    fn direct_alias_cycle_collapses_to_skolem() {
        let mut t = UnificationTable::new();
        let a = t.fresh_univar();
        let b = t.fresh_univar();
        t.solve_univar(b, Type::UniVar(a));
        t.override_univar(a, Type::UniVar(b));
        match t.solution(a) {
            Some(Type::Skolem(_)) => {}
            other => panic!("expected a direct cycle to collapse to a skolem, got {other:?}"),
        }
    }

    #[test]
    fn zonk_resolves_transitively_through_solved_chain() {
        let mut t = UnificationTable::new();
        let a = t.fresh_univar();
        let b = t.fresh_univar();
        t.solve_univar(a, Type::UniVar(b));
        t.solve_univar(b, Type::Name(rellc_ast::Name::Builtin(rellc_ast::Builtin::Nat)));
        let zonked = t.zonk(&Type::UniVar(a));
        assert_eq!(zonked, Type::Name(rellc_ast::Name::Builtin(rellc_ast::Builtin::Nat)));
    }

    #[test]
    fn forall_scope_generalizes_a_univar_that_leaks_only_via_the_result() {
        let mut t = UnificationTable::new();
        let out = t.forall_scope(|table| {
            let u = table.fresh_univar();
            Type::UniVar(u)
        });
        assert!(out.is_quantifier());
    }

    #[test]
    fn forall_scope_leaves_outer_scope_univars_alone() {
        let mut t = UnificationTable::new();
        let outer = t.fresh_univar();
        let out = t.forall_scope(|_table| Type::UniVar(outer));
        assert_eq!(out, Type::UniVar(outer));
    }

    /// Strips the outer `Forall` chain a generalization produces,
    /// returning the bound variables in binding order plus the body.
    fn peel_foralls(mut ty: Type) -> (Vec<rellc_ast::types::TypeVar>, Type) {
        let mut vars = Vec::new();
        while let Type::Forall(v, body) = ty {
            vars.push(v);
            ty = *body;
        }
        (vars, ty)
    }

    fn var_occurs(v: rellc_ast::types::TypeVar, ty: &Type) -> bool {
        match ty {
            Type::Var(found) => *found == v,
            Type::Function(a, b) | Type::Application(a, b) => var_occurs(v, a) || var_occurs(v, b),
            Type::Forall(bound, body) | Type::Exists(bound, body) => *bound != v && var_occurs(v, body),
            Type::Record(row) | Type::Variant(row) => {
                row.fields.values().any(|f| var_occurs(v, f)) || row.extension.as_deref().is_some_and(|e| var_occurs(v, e))
            }
            _ => false,
        }
    }

    /// spec §8 invariant 5: `forallScope` never introduces a `Forall`
    /// whose bound variable does not occur in the body. Allocates a
    /// random number of univars inside the scope, threads a random
    /// subset of them into the returned type, and checks every binder
    /// the scope adds actually occurs under it.
    #[test]
    fn forall_scope_never_binds_a_variable_absent_from_the_body() {
        use proptest::prelude::*;

        proptest!(|(total in 1usize..6, keep_mask in proptest::collection::vec(any::<bool>(), 1..6))| {
            let mut t = UnificationTable::new();
            let out = t.forall_scope(|table| {
                let univars: Vec<_> = (0..total).map(|_| table.fresh_univar()).collect();
                let mut ty = Type::Name(rellc_ast::Name::Builtin(rellc_ast::Builtin::Nat));
                for (i, u) in univars.iter().enumerate() {
                    if keep_mask.get(i).copied().unwrap_or(false) {
                        ty = Type::function(Type::UniVar(*u), ty);
                    }
                }
                ty
            });
            let (bound, body) = peel_foralls(out);
            for v in bound {
                assert!(var_occurs(v, &body));
            }
        });
    }
}
