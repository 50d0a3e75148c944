//! Checker configuration (spec §6, "Configuration — `Builtins<Name>`").

use crate::name::Name;

/// The names of the built-in types the checker needs to recognize
/// specially (literal types, `if`'s `Bool`, list sugar), plus a
/// non-transitively-closed list of direct subtype edges used by
/// `subtype`/`supertype` (spec §4.7).
///
/// Spec §6 writes this as `Builtins<Name>`; made concrete (non-generic)
/// here since this crate has exactly one `Name` type, so the extra type
/// parameter would never vary.
#[derive(Clone, Debug)]
pub struct Builtins {
    pub bool_: Name,
    pub list: Name,
    pub int: Name,
    pub nat: Name,
    pub text: Name,
    pub char_: Name,
    pub lens: Name,
    /// Direct subtype edges `(from, to)`, not transitively closed (spec
    /// §6).
    pub subtype_relations: Vec<(Name, Name)>,
}

impl Builtins {
    /// Does `subtype_relations` contain a direct edge from `from` to `to`?
    pub fn is_direct_subtype(&self, from: Name, to: Name) -> bool {
        self.subtype_relations.iter().any(|(f, t)| *f == from && *t == to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::{Builtin, Id};
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

    #[test]
    fn direct_subtype_edge_is_found() {
        let b = builtins();
        assert!(b.is_direct_subtype(Name::Builtin(Builtin::Nat), Name::Builtin(Builtin::Int)));
    }

    #[test]
    fn relation_is_not_transitively_closed() {
        let mut b = builtins();
        b.subtype_relations.push((Name::Builtin(Builtin::Int), Name::user("Num", Id(9), Loc::DUMMY)));
        // Nat <: Int and Int <: Num are both direct, but Nat <: Num is not.
        assert!(!b.is_direct_subtype(Name::Builtin(Builtin::Nat), Name::user("Num", Id(9), Loc::DUMMY)));
    }
}
