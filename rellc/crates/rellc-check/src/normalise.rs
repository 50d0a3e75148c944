//! Post-inference normalisation (spec §4.9).
//!
//! Run once per top-level declaration group after `inferDecls` finishes
//! with it, turning whatever unification state is left over into
//! quantifiers so the exported type mentions no `UniVar`/`Skolem`.
//! `forallScope`'s generalization is scope-sensitive; this pass isn't —
//! anything still unsolved or still rigid at this point belongs to the
//! type itself, not to some enclosing region that's about to exit.
//!
//! Only ever run at the module top level. Nested callers would need
//! their own scope scheme for skolems (mirroring the one `UnificationTable`
//! already has for univars) before generalizing skolems there would be
//! sound — see DESIGN.md.

use crate::univar::UnificationTable;
use rellc_ast::types::{Row, SkolemId, UniVarId};
use rellc_ast::Type;
use rellc_util::diagnostic::{Diagnostic, Handler, E_DANGLING_UNIVAR, E_SKOLEM_ESCAPE};
use rellc_util::Loc;

/// `normalise(ty)`: `uniVarsToForall`, then `skolemsToExists`, then a
/// final walk that rejects anything still standing as an internal
/// error (it shouldn't — the two generalization passes above cover
/// every remaining occurrence — but the check matches spec step 3's
/// intent of never silently exporting unification state).
pub fn normalise(table: &mut UnificationTable, ty: Type, loc: Loc, handler: &mut Handler) -> Type {
    let mut ty = table.zonk(&ty);

    for uv in free_univars(&ty) {
        let tv = table.fresh_type_var();
        ty = table.replace_univar(&ty, uv, &Type::Var(tv));
        ty = Type::forall(tv, ty);
    }

    for sk in free_skolems(&ty) {
        let tv = table.fresh_type_var();
        ty = replace_skolem(&ty, sk, &Type::Var(tv));
        ty = Type::exists(tv, ty);
    }

    ty = table.zonk(&ty);

    if let Some(uv) = free_univars(&ty).into_iter().next() {
        handler.fatal([Diagnostic::error(E_DANGLING_UNIVAR, format!("unification variable {uv:?} escaped normalisation"), loc)]);
    }
    if let Some(sk) = free_skolems(&ty).into_iter().next() {
        handler.fatal([Diagnostic::error(E_SKOLEM_ESCAPE, format!("skolem {sk:?} escaped normalisation"), loc)]);
    }

    ty
}

fn free_univars(t: &Type) -> Vec<UniVarId> {
    let mut found = Vec::new();
    collect_univars(t, &mut found);
    found
}

fn collect_univars(t: &Type, found: &mut Vec<UniVarId>) {
    match t {
        Type::UniVar(v) => {
            if !found.contains(v) {
                found.push(*v);
            }
        }
        Type::Name(_) | Type::Var(_) | Type::Skolem(_) => {}
        Type::Forall(_, body) | Type::Exists(_, body) => collect_univars(body, found),
        Type::Function(a, b) | Type::Application(a, b) => {
            collect_univars(a, found);
            collect_univars(b, found);
        }
        Type::Record(row) | Type::Variant(row) => collect_univars_row(row, found),
    }
}

fn collect_univars_row(row: &Row, found: &mut Vec<UniVarId>) {
    for f in row.fields.values() {
        collect_univars(f, found);
    }
    if let Some(e) = &row.extension {
        collect_univars(e, found);
    }
}

fn free_skolems(t: &Type) -> Vec<SkolemId> {
    let mut found = Vec::new();
    collect_skolems(t, &mut found);
    found
}

fn collect_skolems(t: &Type, found: &mut Vec<SkolemId>) {
    match t {
        Type::Skolem(s) => {
            if !found.contains(s) {
                found.push(*s);
            }
        }
        Type::Name(_) | Type::Var(_) | Type::UniVar(_) => {}
        Type::Forall(_, body) | Type::Exists(_, body) => collect_skolems(body, found),
        Type::Function(a, b) | Type::Application(a, b) => {
            collect_skolems(a, found);
            collect_skolems(b, found);
        }
        Type::Record(row) | Type::Variant(row) => collect_skolems_row(row, found),
    }
}

fn collect_skolems_row(row: &Row, found: &mut Vec<SkolemId>) {
    for f in row.fields.values() {
        collect_skolems(f, found);
    }
    if let Some(e) = &row.extension {
        collect_skolems(e, found);
    }
}

fn replace_skolem(t: &Type, target: SkolemId, replacement: &Type) -> Type {
    match t {
        Type::Skolem(s) if *s == target => replacement.clone(),
        Type::Skolem(_) | Type::UniVar(_) | Type::Name(_) | Type::Var(_) => t.clone(),
        Type::Forall(v, body) => Type::forall(*v, replace_skolem(body, target, replacement)),
        Type::Exists(v, body) => Type::exists(*v, replace_skolem(body, target, replacement)),
        Type::Function(a, b) => Type::function(replace_skolem(a, target, replacement), replace_skolem(b, target, replacement)),
        Type::Application(a, b) => Type::application(replace_skolem(a, target, replacement), replace_skolem(b, target, replacement)),
        Type::Record(row) => Type::record(replace_skolem_row(row, target, replacement)),
        Type::Variant(row) => Type::variant(replace_skolem_row(row, target, replacement)),
    }
}

fn replace_skolem_row(row: &Row, target: SkolemId, replacement: &Type) -> Row {
    Row {
        fields: row.fields.iter().map(|(k, v)| (*k, replace_skolem(v, target, replacement))).collect(),
        extension: row.extension.as_deref().map(|e| Box::new(replace_skolem(e, target, replacement))),
    }
}
