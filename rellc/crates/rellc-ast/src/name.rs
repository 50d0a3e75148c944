//! Names (spec §3, "Names").
//!
//! A `Name` is `(text, Id)`; two names compare equal on that pair alone —
//! the `Loc` is carried only for diagnostics and is explicitly excluded
//! from `PartialEq`/`Hash`/`Ord`, mirroring how `faxc-par`'s `Symbol`
//! carries no position of its own.

use rellc_util::{define_idx, Loc, Symbol};
use std::fmt;
use std::hash::{Hash, Hasher};

define_idx!(
    /// Process-unique id minted by the (external) name resolver's fresh
    /// name generator, or by the checker itself for synthesized names.
    Id
);

/// Built-in type and value constructors, each a distinguished variant so
/// they never collide with a generated [`Id`] (spec §3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Builtin {
    Bool,
    List,
    Int,
    Nat,
    Text,
    Char,
    Lens,
    Type,
    True,
    Cons,
    Nil,
}

impl Builtin {
    pub fn text(self) -> &'static str {
        match self {
            Builtin::Bool => "Bool",
            Builtin::List => "List",
            Builtin::Int => "Int",
            Builtin::Nat => "Nat",
            Builtin::Text => "Text",
            Builtin::Char => "Char",
            Builtin::Lens => "Lens",
            Builtin::Type => "Type",
            Builtin::True => "True",
            Builtin::Cons => "Cons",
            Builtin::Nil => "Nil",
        }
    }
}

/// A name: either a user-defined identifier, a positional wildcard, or a
/// built-in.
#[derive(Clone, Copy, Debug)]
pub enum Name {
    User { text: Symbol, id: Id, loc: Loc },
    /// `_` patterns are distinct names keyed by where they appear, not by
    /// text, since many wildcards with the same spelling coexist.
    Wildcard { index: u32, loc: Loc },
    Builtin(Builtin),
}

impl Name {
    pub fn user(text: &str, id: Id, loc: Loc) -> Self {
        Name::User { text: Symbol::intern(text), id, loc }
    }

    pub fn wildcard(index: u32, loc: Loc) -> Self {
        Name::Wildcard { index, loc }
    }

    pub fn loc(self) -> Loc {
        match self {
            Name::User { loc, .. } => loc,
            Name::Wildcard { loc, .. } => loc,
            Name::Builtin(_) => Loc::DUMMY,
        }
    }

    pub fn text(self) -> String {
        match self {
            Name::User { text, .. } => text.to_string(),
            Name::Wildcard { index, .. } => format!("_{index}"),
            Name::Builtin(b) => b.text().to_string(),
        }
    }

    pub fn with_loc(self, loc: Loc) -> Self {
        match self {
            Name::User { text, id, .. } => Name::User { text, id, loc },
            Name::Wildcard { index, .. } => Name::Wildcard { index, loc },
            Name::Builtin(b) => Name::Builtin(b),
        }
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Name::User { text: t1, id: i1, .. }, Name::User { text: t2, id: i2, .. }) => {
                t1 == t2 && i1 == i2
            }
            (Name::Wildcard { index: a, .. }, Name::Wildcard { index: b, .. }) => a == b,
            (Name::Builtin(a), Name::Builtin(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Name::User { text, id, .. } => {
                0u8.hash(state);
                text.hash(state);
                id.hash(state);
            }
            Name::Wildcard { index, .. } => {
                1u8.hash(state);
                index.hash(state);
            }
            Name::Builtin(b) => {
                2u8.hash(state);
                b.hash(state);
            }
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

define_idx!(
    /// Synthetic id assigned to a post-resolution declaration (spec §3).
    /// A single `DeclId` may own several names when a pattern binds more
    /// than one (e.g. a tuple binding).
    DeclId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_names_compare_on_text_and_id_not_loc() {
        let a = Name::user("x", Id(0), Loc::DUMMY);
        let b = Name::user("x", Id(0), Loc::new(rellc_util::FileId(7), 1, 2));
        assert_eq!(a, b);
    }

    #[test]
    fn same_text_different_id_is_distinct() {
        let a = Name::user("x", Id(0), Loc::DUMMY);
        let b = Name::user("x", Id(1), Loc::DUMMY);
        assert_ne!(a, b);
    }

    #[test]
    fn wildcards_compare_by_index() {
        let a = Name::wildcard(0, Loc::DUMMY);
        let b = Name::wildcard(0, Loc::new(rellc_util::FileId(1), 0, 0));
        let c = Name::wildcard(1, Loc::DUMMY);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn builtins_never_collide_with_user_names() {
        let builtin = Name::Builtin(Builtin::Bool);
        let user = Name::user("Bool", Id(0), Loc::DUMMY);
        assert_ne!(builtin, user);
    }
}
