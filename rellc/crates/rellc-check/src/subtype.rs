//! Subtype and supertype judgements (spec §4.7).

use crate::mono::{mono, Variance};
use crate::rows::{deep_lookup, diff, RowKind};
use crate::univar::UnificationTable;
use rellc_ast::types::Row;
use rellc_ast::{Builtins, Type};
use rellc_util::diagnostic::{Diagnostic, Handler, E_CANNOT_UNIFY, E_NOT_SUBTYPE, E_ROW_MISSING_LABEL};
use rellc_util::Loc;

/// `subtype(a, b)` (spec §4.7): asserts `a ≤ b`, solving unification
/// variables as a side effect. Returns `false` (and reports via
/// `handler`) on failure; callers abort the enclosing declaration group
/// per spec §7.
pub fn subtype(table: &mut UnificationTable, builtins: &Builtins, a: &Type, b: &Type, loc: Loc, handler: &mut Handler) -> bool {
    if a == b {
        return true;
    }
    if let Type::UniVar(u) = a {
        if !table.is_solved(*u) {
            return table.solve_univar_reporting(*u, b.clone(), loc, handler);
        }
    }
    if let Type::UniVar(u) = b {
        if !table.is_solved(*u) {
            return table.solve_univar_reporting(*u, a.clone(), loc, handler);
        }
    }

    let lhs = mono(table, Variance::In, a.clone());
    let rhs = mono(table, Variance::Out, b.clone());

    match (&lhs, &rhs) {
        (Type::Name(n1), Type::Name(n2)) if n1 == n2 => true,
        (Type::Name(n1), Type::Name(n2)) => {
            if builtins.is_direct_subtype(*n1, *n2) {
                true
            } else {
                handler.fatal([Diagnostic::error(E_NOT_SUBTYPE, format!("`{n1}` is not a subtype of `{n2}`"), loc)]);
                false
            }
        }
        (Type::Function(in_l, out_l), Type::Function(in_r, out_r)) => {
            subtype(table, builtins, in_r, in_l, loc, handler) && subtype(table, builtins, out_l, out_r, loc, handler)
        }
        // Invariant in both the head and the argument position (spec §4.7):
        // neither slot may consult the subtype-relations lattice, so each is
        // checked as a subtype in both directions rather than once covariantly.
        (Type::Application(h1, a1), Type::Application(h2, a2)) => {
            subtype(table, builtins, h1, h2, loc, handler)
                && subtype(table, builtins, h2, h1, loc, handler)
                && subtype(table, builtins, a1, a2, loc, handler)
                && subtype(table, builtins, a2, a1, loc, handler)
        }
        (Type::Record(lhs_row), Type::Record(rhs_row)) => subtype_row(table, builtins, RowKind::Record, lhs_row, rhs_row, loc, handler),
        (Type::Variant(lhs_row), Type::Variant(rhs_row)) => {
            subtype_row(table, builtins, RowKind::Variant, lhs_row, rhs_row, loc, handler)
        }
        _ => {
            handler.fatal([Diagnostic::error(E_NOT_SUBTYPE, format!("`{lhs:?}` is not a subtype of `{rhs:?}`"), loc)]);
            false
        }
    }
}

fn subtype_row(
    table: &mut UnificationTable,
    builtins: &Builtins,
    kind: RowKind,
    lhs: &Row,
    rhs: &Row,
    loc: Loc,
    handler: &mut Handler,
) -> bool {
    for (label, lhs_ty) in &lhs.fields {
        let rhs_whole = kind.wrap(rhs.clone());
        let found = deep_lookup(table, kind, *label, rhs_whole);
        match found {
            Some(rhs_ty) => {
                if !subtype(table, builtins, lhs_ty, &rhs_ty, loc, handler) {
                    return false;
                }
            }
            None => {
                handler.fatal([Diagnostic::error(E_ROW_MISSING_LABEL, format!("row has no label `{label}`"), loc)]);
                return false;
            }
        }
    }
    if let Some(lhs_ext) = &lhs.extension {
        let labels: Vec<_> = lhs.fields.keys().copied().collect();
        let remainder = diff(table, kind, rhs, &labels);
        return subtype(table, builtins, lhs_ext, &kind.wrap(remainder), loc, handler);
    }
    true
}

/// `supertype(a, b)` (spec §4.7): computes a least common supertype,
/// used to join `if`/`case`/`match`/list-item branches. Always wrapped
/// in `forallScope` so fresh univars minted while joining get
/// generalized before the caller sees the result.
pub fn supertype(table: &mut UnificationTable, builtins: &Builtins, a: &Type, b: &Type, loc: Loc, handler: &mut Handler) -> Type {
    table.forall_scope(|table| supertype_inner(table, builtins, a, b, loc, handler))
}

fn supertype_inner(
    table: &mut UnificationTable,
    builtins: &Builtins,
    a: &Type,
    b: &Type,
    loc: Loc,
    handler: &mut Handler,
) -> Type {
    if a == b {
        return a.clone();
    }
    if let Type::UniVar(u) = a {
        if !table.is_solved(*u) {
            table.solve_univar_reporting(*u, b.clone(), loc, handler);
            return b.clone();
        }
    }
    if let Type::UniVar(u) = b {
        if !table.is_solved(*u) {
            table.solve_univar_reporting(*u, a.clone(), loc, handler);
            return a.clone();
        }
    }

    let lhs = mono(table, Variance::Inv, a.clone());
    let rhs = mono(table, Variance::Inv, b.clone());

    match (&lhs, &rhs) {
        (Type::Name(n1), Type::Name(n2)) if n1 == n2 => lhs,
        (Type::Name(n1), Type::Name(n2)) => {
            if builtins.is_direct_subtype(*n1, *n2) {
                rhs
            } else if builtins.is_direct_subtype(*n2, *n1) {
                lhs
            } else {
                handler.fatal([Diagnostic::error(E_CANNOT_UNIFY, format!("cannot unify `{n1}` and `{n2}`"), loc)]);
                lhs
            }
        }
        (Type::Function(in_l, out_l), Type::Function(in_r, out_r)) => Type::function(
            supertype_inner(table, builtins, in_l, in_r, loc, handler),
            supertype_inner(table, builtins, out_l, out_r, loc, handler),
        ),
        (Type::Application(h1, a1), Type::Application(h2, a2)) => Type::application(
            supertype_inner(table, builtins, h1, h2, loc, handler),
            supertype_inner(table, builtins, a1, a2, loc, handler),
        ),
        (Type::Record(lhs_row), Type::Record(rhs_row)) => {
            RowKind::Record.wrap(supertype_row(table, builtins, RowKind::Record, lhs_row, rhs_row, loc, handler))
        }
        (Type::Variant(lhs_row), Type::Variant(rhs_row)) => {
            RowKind::Variant.wrap(supertype_row(table, builtins, RowKind::Variant, lhs_row, rhs_row, loc, handler))
        }
        _ => {
            handler.fatal([Diagnostic::error(E_CANNOT_UNIFY, format!("cannot unify `{lhs:?}` and `{rhs:?}`"), loc)]);
            lhs
        }
    }
}

fn supertype_row(
    table: &mut UnificationTable,
    builtins: &Builtins,
    kind: RowKind,
    lhs: &Row,
    rhs: &Row,
    loc: Loc,
    handler: &mut Handler,
) -> Row {
    let lhs = crate::rows::compress(table, kind, lhs);
    let rhs = crate::rows::compress(table, kind, rhs);
    let mut fields = std::collections::BTreeMap::new();
    for label in lhs.fields.keys().chain(rhs.fields.keys()).collect::<std::collections::BTreeSet<_>>() {
        let joined = match (lhs.fields.get(label), rhs.fields.get(label)) {
            (Some(l), Some(r)) => supertype_inner(table, builtins, l, r, loc, handler),
            (Some(l), None) => l.clone(),
            (None, Some(r)) => r.clone(),
            (None, None) => unreachable!(),
        };
        fields.insert(*label, joined);
    }
    let extension = match (&lhs.extension, &rhs.extension) {
        (Some(l), Some(r)) => Some(Box::new(supertype_inner(table, builtins, l, r, loc, handler))),
        (Some(l), None) => Some(l.clone()),
        (None, Some(r)) => Some(r.clone()),
        (None, None) => None,
    };
    Row { fields, extension }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rellc_ast::{Builtin, Name};
    use rellc_util::Loc;

    fn builtins() -> Builtins {
        Builtins {
            bool_: Name::Builtin(Builtin::Bool),
            list: Name::Builtin(Builtin::List),
            int: Name::Builtin(Builtin::Int),
            nat: Name::Builtin(Builtin::Nat),
            text: Name::Builtin(Builtin::Text),
            char_: Name::Builtin(Builtin::Char),
            lens: Name::Builtin(Builtin::Lens),
            subtype_relations: vec![(Name::Builtin(Builtin::Nat), Name::Builtin(Builtin::Int))],
        }
    }

    fn nat() -> Type {
        Type::Name(Name::Builtin(Builtin::Nat))
    }

    fn int() -> Type {
        Type::Name(Name::Builtin(Builtin::Int))
    }

    #[test]
    fn equal_names_are_subtypes() {
        let mut table = UnificationTable::new();
        let mut handler = Handler::new();
        assert!(subtype(&mut table, &builtins(), &nat(), &nat(), Loc::DUMMY, &mut handler));
        assert!(!handler.has_fatal());
    }

    #[test]
    fn configured_relation_allows_nat_as_int() {
        let mut table = UnificationTable::new();
        let mut handler = Handler::new();
        assert!(subtype(&mut table, &builtins(), &nat(), &int(), Loc::DUMMY, &mut handler));
    }

    #[test]
    fn unrelated_names_are_fatal() {
        let mut table = UnificationTable::new();
        let mut handler = Handler::new();
        let text = Type::Name(Name::Builtin(Builtin::Text));
        assert!(!subtype(&mut table, &builtins(), &nat(), &text, Loc::DUMMY, &mut handler));
        assert!(handler.has_fatal());
    }

    #[test]
    fn subtype_solves_unsolved_univar_to_other_side() {
        let mut table = UnificationTable::new();
        let mut handler = Handler::new();
        let u = table.fresh_univar();
        assert!(subtype(&mut table, &builtins(), &Type::UniVar(u), &nat(), Loc::DUMMY, &mut handler));
        assert_eq!(table.solution(u), Some(&nat()));
    }

    #[test]
    fn application_is_invariant_in_both_positions() {
        let mut table = UnificationTable::new();
        let mut handler = Handler::new();
        let list = Type::Name(Name::Builtin(Builtin::List));
        // List<Nat> <= List<Int> must fail: Nat <= Int holds, but invariant
        // position means the subtype-relations lattice is not consulted.
        let lhs = Type::application(list.clone(), nat());
        let rhs = Type::application(list, int());
        assert!(!subtype(&mut table, &builtins(), &lhs, &rhs, Loc::DUMMY, &mut handler));
    }

    #[test]
    fn application_subtype_succeeds_when_both_positions_are_equal() {
        let mut table = UnificationTable::new();
        let mut handler = Handler::new();
        let list = Type::Name(Name::Builtin(Builtin::List));
        let lhs = Type::application(list.clone(), nat());
        let rhs = Type::application(list, nat());
        assert!(subtype(&mut table, &builtins(), &lhs, &rhs, Loc::DUMMY, &mut handler));
    }

    #[test]
    fn function_subtype_is_contravariant_in_argument() {
        let mut table = UnificationTable::new();
        let mut handler = Handler::new();
        // (Int -> Nat) <= (Nat -> Int): argument flips, result keeps direction.
        let lhs = Type::function(int(), nat());
        let rhs = Type::function(nat(), int());
        assert!(subtype(&mut table, &builtins(), &lhs, &rhs, Loc::DUMMY, &mut handler));
        assert!(!handler.has_fatal());
    }

    #[test]
    fn supertype_of_nat_and_int_is_int() {
        let mut table = UnificationTable::new();
        let mut handler = Handler::new();
        let result = supertype(&mut table, &builtins(), &nat(), &int(), Loc::DUMMY, &mut handler);
        assert_eq!(result, int());
        assert!(!handler.has_fatal());
    }

    #[test]
    fn supertype_unsolved_univar_solves_to_other_side() {
        let mut table = UnificationTable::new();
        let mut handler = Handler::new();
        let u = table.fresh_univar();
        let result = supertype(&mut table, &builtins(), &Type::UniVar(u), &nat(), Loc::DUMMY, &mut handler);
        assert_eq!(result, nat());
    }
}
