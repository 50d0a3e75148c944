//! Polytype instantiation (spec §4.4) and `Var`-aware substitution (spec
//! §4.5).

use crate::univar::UnificationTable;
use rellc_ast::types::{Row, TypeVar};
use rellc_ast::Type;
use std::collections::HashSet;

/// The polarity a quantified variable is instantiated at: `Out` on the
/// producing side of a subtype judgement, `In` on the consuming side,
/// `Inv` where a position is neither (spec §4.4).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variance {
    In,
    Out,
    Inv,
}

impl Variance {
    pub fn flip(self) -> Self {
        match self {
            Variance::In => Variance::Out,
            Variance::Out => Variance::In,
            Variance::Inv => Variance::Inv,
        }
    }
}

/// What a single quantifier elimination produces: a fresh metavariable
/// to be solved later, or a fresh rigid constant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Polarity {
    UniVar,
    Skolem,
}

/// The quantifier-elimination table (spec §4.4).
fn polarity_for(is_exists: bool, variance: Variance) -> Polarity {
    match (is_exists, variance) {
        (false, Variance::Out) => Polarity::UniVar, // Forall/Out
        (false, Variance::In) => Polarity::Skolem,  // Forall/In
        (false, Variance::Inv) => Polarity::Skolem, // Forall/Inv
        (true, Variance::Out) => Polarity::Skolem,  // Exists/Out
        (true, Variance::In) => Polarity::UniVar,   // Exists/In
        (true, Variance::Inv) => Polarity::Skolem,  // Exists/Inv
    }
}

/// `substitute(variance, v, body)` (spec §4.5): replaces every
/// occurrence of `Var(v)` with one freshly-allocated univar or skolem —
/// the same one for every occurrence — chosen per [`polarity_for`].
/// Binders that shadow `v` stop the substitution from descending further.
fn substitute(table: &mut UnificationTable, polarity: Polarity, v: TypeVar, body: &Type) -> Type {
    let replacement = match polarity {
        Polarity::UniVar => Type::UniVar(table.fresh_univar()),
        Polarity::Skolem => Type::Skolem(table.fresh_skolem()),
    };
    substitute_var(v, &replacement, body)
}

fn substitute_var(v: TypeVar, replacement: &Type, body: &Type) -> Type {
    match body {
        Type::Var(tv) if *tv == v => replacement.clone(),
        Type::Var(_) | Type::Name(_) | Type::Skolem(_) | Type::UniVar(_) => body.clone(),
        Type::Forall(tv, inner) => {
            if *tv == v {
                body.clone()
            } else {
                Type::forall(*tv, substitute_var(v, replacement, inner))
            }
        }
        Type::Exists(tv, inner) => {
            if *tv == v {
                body.clone()
            } else {
                Type::exists(*tv, substitute_var(v, replacement, inner))
            }
        }
        Type::Function(a, b) => Type::function(substitute_var(v, replacement, a), substitute_var(v, replacement, b)),
        Type::Application(a, b) => {
            Type::application(substitute_var(v, replacement, a), substitute_var(v, replacement, b))
        }
        Type::Record(row) => Type::record(substitute_var_row(v, replacement, row)),
        Type::Variant(row) => Type::variant(substitute_var_row(v, replacement, row)),
    }
}

fn substitute_var_row(v: TypeVar, replacement: &Type, row: &Row) -> Row {
    Row {
        fields: row.fields.iter().map(|(k, t)| (*k, substitute_var(v, replacement, t))).collect(),
        extension: row.extension.as_deref().map(|e| Box::new(substitute_var(v, replacement, e))),
    }
}

/// `mono(variance, type)` (spec §4.4): strips every outer `Forall`/
/// `Exists`, instantiating each per [`polarity_for`] and flipping
/// `variance` whenever the quantifier just eliminated was an `Exists`.
/// Also resolves the way through an already-solved `UniVar` along the
/// way, so a caller that dispatches on the result always sees the
/// current solution's shape rather than a stale metavariable. The
/// result carries no outer quantifier and no solved `UniVar` — only
/// `Name`, `Skolem`, an unsolved `UniVar`, `Application`, `Function`,
/// `Variant`, or `Record` at the top.
pub fn mono(table: &mut UnificationTable, mut variance: Variance, mut ty: Type) -> Type {
    loop {
        match ty {
            Type::Forall(v, body) => {
                let polarity = polarity_for(false, variance);
                ty = substitute(table, polarity, v, &body);
            }
            Type::Exists(v, body) => {
                let polarity = polarity_for(true, variance);
                ty = substitute(table, polarity, v, &body);
                variance = variance.flip();
            }
            Type::UniVar(u) => match table.solution(u) {
                Some(solved) => ty = solved.clone(),
                None => return Type::UniVar(u),
            },
            other => return other,
        }
    }
}

/// A `Var` reaching `mono` unbound is a type error, not an internal bug
/// (spec §4.4, §3 invariant 1). Scans `t` for the first `Var` not bound
/// by a `Forall`/`Exists` lexically enclosing it within `t`.
pub fn first_free_var(t: &Type) -> Option<TypeVar> {
    fn go(t: &Type, bound: &mut HashSet<TypeVar>) -> Option<TypeVar> {
        match t {
            Type::Var(v) => (!bound.contains(v)).then_some(*v),
            Type::Name(_) | Type::Skolem(_) | Type::UniVar(_) => None,
            Type::Forall(v, body) | Type::Exists(v, body) => {
                let inserted = bound.insert(*v);
                let result = go(body, bound);
                if inserted {
                    bound.remove(v);
                }
                result
            }
            Type::Function(a, b) | Type::Application(a, b) => go(a, bound).or_else(|| go(b, bound)),
            Type::Record(row) | Type::Variant(row) => {
                for f in row.fields.values() {
                    if let Some(v) = go(f, bound) {
                        return Some(v);
                    }
                }
                row.extension.as_deref().and_then(|e| go(e, bound))
            }
        }
    }
    go(t, &mut HashSet::new())
}

/// `substituteTy(from, to, body)` (spec §4.5): structural whole-type
/// replacement, safe only for non-`Var` `from` (a `Var` would need
/// binder-aware handling, which is [`substitute_var`]'s job instead).
/// Resolves already-solved univars transparently as it walks.
pub fn substitute_ty(table: &UnificationTable, from: &Type, to: &Type, body: &Type) -> Type {
    debug_assert!(!matches!(from, Type::Var(_)), "substitute_ty is not binder-aware; use substitute for Var");
    let resolved = match body {
        Type::UniVar(v) => table.solution(*v).cloned().unwrap_or_else(|| body.clone()),
        _ => body.clone(),
    };
    if &resolved == from {
        return to.clone();
    }
    match &resolved {
        Type::Name(_) | Type::Var(_) | Type::Skolem(_) | Type::UniVar(_) => resolved,
        Type::Forall(v, b) => Type::forall(*v, substitute_ty(table, from, to, b)),
        Type::Exists(v, b) => Type::exists(*v, substitute_ty(table, from, to, b)),
        Type::Function(a, b) => Type::function(substitute_ty(table, from, to, a), substitute_ty(table, from, to, b)),
        Type::Application(a, b) => {
            Type::application(substitute_ty(table, from, to, a), substitute_ty(table, from, to, b))
        }
        Type::Record(row) => Type::record(substitute_ty_row(table, from, to, row)),
        Type::Variant(row) => Type::variant(substitute_ty_row(table, from, to, row)),
    }
}

fn substitute_ty_row(table: &UnificationTable, from: &Type, to: &Type, row: &Row) -> Row {
    Row {
        fields: row.fields.iter().map(|(k, t)| (*k, substitute_ty(table, from, to, t))).collect(),
        extension: row.extension.as_deref().map(|e| Box::new(substitute_ty(table, from, to, e))),
    }
}
