//! Row operations: compression, deep lookup, and diffing (spec §4.6).

use crate::mono::{mono, Variance};
use crate::univar::UnificationTable;
use rellc_ast::types::Row;
use rellc_ast::Type;
use rellc_util::Symbol;

/// Whether a row is the spine of a `Record` or a `Variant`; `compress`
/// and `deepLookup` only merge across matching kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowKind {
    Record,
    Variant,
}

impl RowKind {
    pub(crate) fn wrap(self, row: Row) -> Type {
        match self {
            RowKind::Record => Type::record(row),
            RowKind::Variant => Type::variant(row),
        }
    }

    fn unwrap(self, ty: &Type) -> Option<&Row> {
        match (self, ty) {
            (RowKind::Record, Type::Record(row)) => Some(row),
            (RowKind::Variant, Type::Variant(row)) => Some(row),
            _ => None,
        }
    }
}

/// `compress(kind, row)` (spec §4.6): walks the extension chain, folding
/// in fields from any nested row of the same `kind` it finds along the
/// way. Stops at a mismatched kind, a skolem, a concrete non-row type,
/// or an unsolved univar — whichever comes first.
pub fn compress(table: &mut UnificationTable, kind: RowKind, row: &Row) -> Row {
    let mut fields = row.fields.clone();
    let mut extension = row.extension.clone();

    loop {
        let Some(ext) = extension.take() else { break };
        let resolved = mono(table, Variance::Inv, *ext);
        match kind.unwrap(&resolved) {
            Some(inner) => {
                for (label, ty) in &inner.fields {
                    fields.entry(*label).or_insert_with(|| ty.clone());
                }
                extension = inner.extension.clone();
            }
            None => {
                extension = Some(Box::new(resolved));
                break;
            }
        }
    }

    Row { fields, extension }
}

/// `deepLookup(kind, label, type)` (spec §4.6): `mono Inv` the type,
/// recurse through matching rows looking for `label`. An unsolved
/// univar in extension position is solved to a fresh singleton row so
/// open-ended rows can absorb a lookup that hasn't been seen yet.
pub fn deep_lookup(table: &mut UnificationTable, kind: RowKind, label: Symbol, ty: Type) -> Option<Type> {
    let resolved = mono(table, Variance::Inv, ty);
    match kind.unwrap(&resolved) {
        Some(row) => {
            if let Some(field_ty) = row.fields.get(&label) {
                return Some(field_ty.clone());
            }
            match &row.extension {
                Some(ext) => deep_lookup(table, kind, label, (**ext).clone()),
                None => None,
            }
        }
        None => match resolved {
            Type::UniVar(u) => {
                let field_ty = Type::UniVar(table.fresh_univar());
                let rest = Type::UniVar(table.fresh_univar());
                let mut fields = std::collections::BTreeMap::new();
                fields.insert(label, field_ty.clone());
                table.solve_univar(u, kind.wrap(Row::open(fields, rest)));
                Some(field_ty)
            }
            _ => None,
        },
    }
}

/// `diff(kind, lhs, rhsFields)` (spec §4.6): `compress(kind, lhs)` with
/// every label in `rhsFields` removed, extension untouched.
pub fn diff(table: &mut UnificationTable, kind: RowKind, lhs: &Row, rhs_fields: &[Symbol]) -> Row {
    let mut compressed = compress(table, kind, lhs);
    for label in rhs_fields {
        compressed.fields.remove(label);
    }
    compressed
}

#[cfg(test)]
mod tests {
    use super::*;
    use rellc_ast::{Builtin, Name};
    use std::collections::BTreeMap;

    fn nat() -> Type {
        Type::Name(Name::Builtin(Builtin::Nat))
    }

    fn sym(s: &str) -> Symbol {
        Symbol::intern(s)
    }

    #[test]
    fn compress_merges_open_extension_of_matching_kind() {
        let mut table = UnificationTable::new();
        let mut outer_fields = BTreeMap::new();
        outer_fields.insert(sym("x"), nat());
        let mut inner_fields = BTreeMap::new();
        inner_fields.insert(sym("y"), nat());
        let inner = Row::closed(inner_fields);
        let row = Row::open(outer_fields, Type::record(inner));

        let compressed = compress(&mut table, RowKind::Record, &row);
        assert!(compressed.fields.contains_key(&sym("x")));
        assert!(compressed.fields.contains_key(&sym("y")));
        assert!(compressed.is_closed());
    }

    #[test]
    fn compress_stops_at_unsolved_univar_extension() {
        let mut table = UnificationTable::new();
        let u = table.fresh_univar();
        let mut fields = BTreeMap::new();
        fields.insert(sym("x"), nat());
        let row = Row::open(fields, Type::UniVar(u));

        let compressed = compress(&mut table, RowKind::Record, &row);
        assert!(!compressed.is_closed());
    }

    #[test]
    fn compress_is_idempotent() {
        let mut table = UnificationTable::new();
        let mut outer_fields = BTreeMap::new();
        outer_fields.insert(sym("x"), nat());
        let mut inner_fields = BTreeMap::new();
        inner_fields.insert(sym("y"), nat());
        let row = Row::open(outer_fields, Type::record(Row::closed(inner_fields)));

        let once = compress(&mut table, RowKind::Record, &row);
        let twice = compress(&mut table, RowKind::Record, &once);
        assert_eq!(once, twice);
    }

    #[test]
    fn deep_lookup_finds_present_field() {
        let mut table = UnificationTable::new();
        let mut fields = BTreeMap::new();
        fields.insert(sym("x"), nat());
        let row = Type::record(Row::closed(fields));
        let found = deep_lookup(&mut table, RowKind::Record, sym("x"), row);
        assert_eq!(found, Some(nat()));
    }

    #[test]
    fn deep_lookup_solves_open_univar_to_singleton_row() {
        let mut table = UnificationTable::new();
        let u = table.fresh_univar();
        let found = deep_lookup(&mut table, RowKind::Record, sym("x"), Type::UniVar(u));
        assert!(found.is_some());
        assert!(table.is_solved(u));
    }

    #[test]
    fn diff_removes_rhs_labels() {
        let mut table = UnificationTable::new();
        let mut fields = BTreeMap::new();
        fields.insert(sym("x"), nat());
        fields.insert(sym("y"), nat());
        let row = Row::closed(fields);
        let result = diff(&mut table, RowKind::Record, &row, &[sym("x")]);
        assert!(!result.fields.contains_key(&sym("x")));
        assert!(result.fields.contains_key(&sym("y")));
    }

    /// Builds `{ layer[0].. | { layer[1].. | { ... | layer[n-1].. } } }`
    /// out of arbitrary label subsets, closing the chain at the last
    /// layer (spec §8 invariant 4: `compress` is idempotent).
    fn chain_from_layers(layers: &[Vec<&'static str>]) -> Row {
        let mut row = Row::closed(layers.last().map_or_else(BTreeMap::new, |last| {
            last.iter().map(|label| (sym(label), nat())).collect()
        }));
        for layer in layers[..layers.len().saturating_sub(1)].iter().rev() {
            let fields = layer.iter().map(|label| (sym(label), nat())).collect();
            row = Row::open(fields, Type::record(row));
        }
        row
    }

    #[test]
    fn compress_is_idempotent_over_arbitrary_layer_chains() {
        use proptest::prelude::*;

        proptest!(|(layers in proptest::collection::vec(
            proptest::sample::subsequence(vec!["a", "b", "c", "d", "e"], 0..=5),
            1..=5,
        ))| {
            let mut table = UnificationTable::new();
            let row = chain_from_layers(&layers);
            let once = compress(&mut table, RowKind::Record, &row);
            let twice = compress(&mut table, RowKind::Record, &once);
            assert_eq!(once, twice);
        });
    }
}
